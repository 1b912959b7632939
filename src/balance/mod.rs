//! Team balancing for ten-player sessions
//!
//! Exhaustively enumerates every 5v5 partition, ranks them by rating sum
//! difference and picks uniformly among the most balanced candidates.

pub mod balancer;
pub mod enumerator;

// Re-export commonly used types
pub use balancer::{TeamBalancer, TopKBalancer, DEFAULT_TOP_K};
pub use enumerator::{enumerate_candidates, validate_players, verify_partition};

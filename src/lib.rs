//! Squad Balancer - team balancing and rating engine for 5v5 custom games
//!
//! Splits ten rated players into two teams of five by picking uniformly
//! among the most even partitions, updates ratings with a team Elo rule,
//! seeds new players from a reported rank tier, and guarantees each match
//! result is applied at most once.

pub mod analysis;
pub mod balance;
pub mod config;
pub mod error;
pub mod matches;
pub mod metrics;
pub mod rating;
pub mod service;
pub mod types;

// Re-export commonly used types and traits
pub use error::{BalancerError, Result};
pub use types::*;

// Re-export key components
pub use balance::{TeamBalancer, TopKBalancer};
pub use matches::{FinalizationGuard, InMemoryMatchStore, MatchStore};
pub use rating::{apply_result, seed_rating, EloTeamCalculator, RatingCalculator};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

//! Match lifecycle: pending records and the once-only finalization guard
//!
//! The guard owns no state of its own. Atomicity comes from the injected
//! [`MatchStore`], which must expose a conditional pending-to-final transition.

pub mod guard;
pub mod store;

// Re-export commonly used types
pub use guard::FinalizationGuard;
pub use store::{InMemoryMatchStore, MatchStore, MatchTransition, TransitionOutcome};

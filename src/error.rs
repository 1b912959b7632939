//! Error types for the balancing and rating engine
//!
//! Core operations return [`BalancerError`] so callers can tell an expected
//! duplicate finalization apart from bad input or a storage failure. The
//! service and binaries wrap these in `anyhow` at their edges.

use crate::types::{MatchId, MatchState, PlayerId};

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, BalancerError>;

/// Error kinds raised by the engine and its reference stores
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BalancerError {
    /// Malformed or wrong-cardinality input; the caller must fix it
    #[error("Invalid input: {reason}")]
    InvalidInput { reason: String },

    /// A match was already moved out of `pending`; surface as "already recorded"
    #[error("Match {match_id} is already {state}")]
    AlreadyFinalized { match_id: MatchId, state: MatchState },

    /// A computed split broke its partition invariant. Indicates a bug.
    #[error("Invariant violation: {reason}")]
    InvariantViolation { reason: String },

    #[error("Match not found: {match_id}")]
    MatchNotFound { match_id: MatchId },

    #[error("Player not found: {player_id}")]
    PlayerNotFound { player_id: PlayerId },

    #[error("Storage error: {message}")]
    Storage { message: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },
}

impl BalancerError {
    pub(crate) fn invalid_input(reason: impl Into<String>) -> Self {
        BalancerError::InvalidInput {
            reason: reason.into(),
        }
    }

    pub(crate) fn storage(message: impl Into<String>) -> Self {
        BalancerError::Storage {
            message: message.into(),
        }
    }

    /// Whether this error is the expected outcome of a lost finalization race
    pub fn is_already_finalized(&self) -> bool {
        matches!(self, BalancerError::AlreadyFinalized { .. })
    }
}

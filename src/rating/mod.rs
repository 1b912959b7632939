//! Rating system: Elo team updates, tier seeding and rating storage
//!
//! The calculator and seeder are pure functions over caller data; the
//! storage module holds the reference in-memory store used by the service.

pub mod calculator;
pub mod elo;
pub mod storage;
pub mod tier;

// Re-export commonly used types
pub use calculator::{team_average, RatingCalculationResult, RatingCalculator};
pub use elo::{apply_result, expected_win, EloTeamCalculator, DEFAULT_K_FACTOR};
pub use storage::{InMemoryRatingStorage, LinkOutcome, RatingEntry, RatingStorage};
pub use tier::{seed_rating, Division, RankTier, UNRANKED_RATING};

//! Read-only analysis over finalized matches
//!
//! How well ratings predict winners, and a player's rating progression.

pub mod accuracy;
pub mod history;

pub use accuracy::{AccuracyReport, CalibrationBucket, StabilizationPoint};
pub use history::{player_history, HistoryEntry};

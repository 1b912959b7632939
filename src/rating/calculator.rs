//! Rating calculator trait
//!
//! This module defines the interface for turning a decided match into
//! per-player rating changes.

use crate::error::Result;
use crate::types::{RatedPlayer, RatingChange, Team};
use serde::{Deserialize, Serialize};

/// Result of a rating calculation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatingCalculationResult {
    pub winner: Team,
    /// Average team A rating the calculation was based on
    pub avg_a: f64,
    /// Average team B rating the calculation was based on
    pub avg_b: f64,
    /// Team-level magnitude, before any per-player floor truncation
    pub magnitude: u32,
    /// Rating changes for all players, team A first
    pub rating_changes: Vec<RatingChange>,
}

/// Trait for calculating rating changes after a match
pub trait RatingCalculator: Send + Sync {
    /// Calculate rating changes for both teams given the winner
    ///
    /// # Arguments
    /// * `team_a` - Team A players with their pre-match ratings
    /// * `team_b` - Team B players with their pre-match ratings
    /// * `winner` - The side that won
    fn calculate_rating_changes(
        &self,
        team_a: &[RatedPlayer],
        team_b: &[RatedPlayer],
        winner: Team,
    ) -> Result<RatingCalculationResult>;

    /// Probability that a team with `team_avg` beats one with `opponent_avg`
    fn expected_score(&self, team_avg: f64, opponent_avg: f64) -> f64;

    /// Current volatility constant
    fn k_factor(&self) -> f64;
}

/// Mean rating of a team, 0.0 for an empty team
pub fn team_average(team: &[RatedPlayer]) -> f64 {
    if team.is_empty() {
        return 0.0;
    }

    team.iter().map(|p| f64::from(p.rating)).sum::<f64>() / team.len() as f64
}

//! Elo rating updates for team matches
//!
//! Every member of a team receives the same delta: the winners gain the
//! magnitude and the losers lose it. The magnitude grows when the underdog
//! wins and shrinks when the favourite wins.

use crate::error::{BalancerError, Result};
use crate::rating::calculator::{team_average, RatingCalculationResult, RatingCalculator};
use crate::types::{RatedPlayer, RatingChange, Team};
use skillratings::elo::EloRating;
use std::collections::HashSet;
use tracing::debug;

/// Default volatility constant
pub const DEFAULT_K_FACTOR: f64 = 32.0;

/// Expected score of a side rated `team_avg` against `opponent_avg`
///
/// `1 / (1 + 10^((opponent_avg - team_avg) / 400))`
pub fn expected_win(team_avg: f64, opponent_avg: f64) -> f64 {
    let (expected, _) = skillratings::elo::expected_score(
        &EloRating { rating: team_avg },
        &EloRating {
            rating: opponent_avg,
        },
    );
    expected
}

/// Rating magnitude for a decided match
///
/// Computed as `round(k * (1 - expected score of the winner))`, which equals
/// `round(k * (1 - E_a))` when A wins and `round(k * E_a)` when B wins.
/// Evaluating it from the winner's side makes the result exactly
/// anti-symmetric in the team order. Never negative.
pub fn apply_result(team_a_avg: f64, team_b_avg: f64, winner: Team, k_factor: f64) -> u32 {
    let (winner_avg, loser_avg) = match winner {
        Team::A => (team_a_avg, team_b_avg),
        Team::B => (team_b_avg, team_a_avg),
    };

    let magnitude = (k_factor * (1.0 - expected_win(winner_avg, loser_avg))).round();
    if !magnitude.is_finite() || magnitude <= 0.0 {
        return 0;
    }

    magnitude.min(f64::from(u32::MAX)) as u32
}

/// Elo calculator with a tunable K-factor
#[derive(Debug, Clone)]
pub struct EloTeamCalculator {
    k_factor: f64,
}

impl EloTeamCalculator {
    /// Create a calculator; the K-factor must be finite and positive
    pub fn new(k_factor: f64) -> Result<Self> {
        if !k_factor.is_finite() || k_factor <= 0.0 {
            return Err(BalancerError::Configuration {
                message: format!("K-factor must be a positive number, got {}", k_factor),
            });
        }

        Ok(Self { k_factor })
    }
}

impl Default for EloTeamCalculator {
    fn default() -> Self {
        Self {
            k_factor: DEFAULT_K_FACTOR,
        }
    }
}

impl RatingCalculator for EloTeamCalculator {
    fn calculate_rating_changes(
        &self,
        team_a: &[RatedPlayer],
        team_b: &[RatedPlayer],
        winner: Team,
    ) -> Result<RatingCalculationResult> {
        if team_a.is_empty() || team_b.is_empty() {
            return Err(BalancerError::invalid_input(
                "Both teams need at least one player",
            ));
        }

        let team_a_ids: HashSet<&str> = team_a.iter().map(|p| p.id.as_str()).collect();
        if let Some(player) = team_b.iter().find(|p| team_a_ids.contains(p.id.as_str())) {
            return Err(BalancerError::invalid_input(format!(
                "Player {} is on both teams",
                player.id
            )));
        }

        let avg_a = team_average(team_a);
        let avg_b = team_average(team_b);
        let magnitude = apply_result(avg_a, avg_b, winner, self.k_factor);

        let signed = |team: Team| {
            if team == winner {
                i64::from(magnitude)
            } else {
                -i64::from(magnitude)
            }
        };

        let rating_changes = team_a
            .iter()
            .map(|p| (p, signed(Team::A)))
            .chain(team_b.iter().map(|p| (p, signed(Team::B))))
            .map(|(p, delta)| RatingChange::apply(p.id.clone(), p.rating, delta))
            .collect();

        debug!(
            "Elo update: avg_a={:.1}, avg_b={:.1}, winner={}, k={}, magnitude={}",
            avg_a, avg_b, winner, self.k_factor, magnitude
        );

        Ok(RatingCalculationResult {
            winner,
            avg_a,
            avg_b,
            magnitude,
            rating_changes,
        })
    }

    fn expected_score(&self, team_avg: f64, opponent_avg: f64) -> f64 {
        expected_win(team_avg, opponent_avg)
    }

    fn k_factor(&self) -> f64 {
        self.k_factor
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn team(prefix: &str, ratings: &[u32]) -> Vec<RatedPlayer> {
        ratings
            .iter()
            .enumerate()
            .map(|(i, r)| RatedPlayer::new(format!("{}{}", prefix, i), *r))
            .collect()
    }

    #[test]
    fn test_expected_win_equal_ratings() {
        assert!((expected_win(1000.0, 1000.0) - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_even_match_magnitude() {
        assert_eq!(apply_result(1000.0, 1000.0, Team::A, 32.0), 16);
        assert_eq!(apply_result(1000.0, 1000.0, Team::B, 32.0), 16);
    }

    #[test]
    fn test_favourite_and_underdog_wins() {
        let expected = expected_win(1200.0, 1000.0);
        assert!((expected - 0.76).abs() < 0.01);

        // Higher-rated team A wins
        assert_eq!(apply_result(1200.0, 1000.0, Team::A, 32.0), 8);
        // Lower-rated team B wins
        assert_eq!(apply_result(1200.0, 1000.0, Team::B, 32.0), 24);
    }

    #[test]
    fn test_zero_k_factor_gives_zero_magnitude() {
        assert_eq!(apply_result(900.0, 1400.0, Team::A, 0.0), 0);
        assert_eq!(apply_result(900.0, 1400.0, Team::A, -10.0), 0);
        assert_eq!(apply_result(900.0, 1400.0, Team::A, f64::NAN), 0);
    }

    #[test]
    fn test_invalid_k_factor_rejected() {
        assert!(EloTeamCalculator::new(0.0).is_err());
        assert!(EloTeamCalculator::new(f64::INFINITY).is_err());
        assert!(EloTeamCalculator::new(24.0).is_ok());
    }

    #[test]
    fn test_team_changes_are_uniform() {
        let calculator = EloTeamCalculator::default();
        let team_a = team("a", &[1200; 5]);
        let team_b = team("b", &[1000; 5]);

        let result = calculator
            .calculate_rating_changes(&team_a, &team_b, Team::B)
            .unwrap();

        assert_eq!(result.magnitude, 24);
        assert_eq!(result.avg_a, 1200.0);
        assert_eq!(result.avg_b, 1000.0);
        assert_eq!(result.rating_changes.len(), 10);
        for change in &result.rating_changes[..5] {
            assert_eq!(change.delta, -24);
            assert_eq!(change.new_rating, 1176);
        }
        for change in &result.rating_changes[5..] {
            assert_eq!(change.delta, 24);
            assert_eq!(change.new_rating, 1024);
        }
    }

    #[test]
    fn test_losing_players_floor_at_zero() {
        let calculator = EloTeamCalculator::default();
        let team_a = team("a", &[5, 0, 400, 400, 400]);
        let team_b = team("b", &[250; 5]);

        let result = calculator
            .calculate_rating_changes(&team_a, &team_b, Team::B)
            .unwrap();
        assert!(result.magnitude > 5);

        let low = &result.rating_changes[0];
        assert_eq!(low.new_rating, 0);
        assert_eq!(low.delta, -5);

        let zero = &result.rating_changes[1];
        assert_eq!(zero.new_rating, 0);
        assert_eq!(zero.delta, 0);
    }

    #[test]
    fn test_overlapping_teams_rejected() {
        let calculator = EloTeamCalculator::default();
        let team_a = team("x", &[1000; 5]);
        let team_b = team("x", &[1000; 5]);
        assert!(matches!(
            calculator.calculate_rating_changes(&team_a, &team_b, Team::A),
            Err(BalancerError::InvalidInput { .. })
        ));
        assert!(calculator
            .calculate_rating_changes(&team_a, &[], Team::A)
            .is_err());
    }

    proptest! {
        #[test]
        fn prop_anti_symmetric(x in 0.0f64..4000.0, y in 0.0f64..4000.0, k in 0.0f64..200.0) {
            prop_assert_eq!(
                apply_result(x, y, Team::A, k),
                apply_result(y, x, Team::B, k)
            );
        }

        #[test]
        fn prop_monotonic_in_k_factor(
            x in 0.0f64..4000.0,
            y in 0.0f64..4000.0,
            k in 0.0f64..200.0,
            extra in 0.0f64..200.0,
            a_wins in any::<bool>(),
        ) {
            let winner = if a_wins { Team::A } else { Team::B };
            prop_assert!(apply_result(x, y, winner, k) <= apply_result(x, y, winner, k + extra));
        }

        #[test]
        fn prop_underdog_gains_at_least_as_much(x in 0.0f64..4000.0, y in 0.0f64..4000.0) {
            prop_assume!(x < y);
            prop_assert!(apply_result(x, y, Team::A, 32.0) >= apply_result(x, y, Team::B, 32.0));
        }
    }
}

//! Rating accuracy: how often the higher-rated team actually wins
//!
//! Matches are expected in finalization order. Records without a result
//! are skipped.

use crate::rating::elo::expected_win;
use crate::types::{MatchRecord, MatchResult, Team};
use serde::{Deserialize, Serialize};

/// Average-difference ranges used for calibration: (lower, upper, label)
const CALIBRATION_RANGES: [(f64, f64, &str); 4] = [
    (0.0, 50.0, "0-49"),
    (50.0, 100.0, "50-99"),
    (100.0, 200.0, "100-199"),
    (200.0, f64::INFINITY, "200+"),
];

/// Rating delta of one match in sequence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StabilizationPoint {
    /// 1-based position in finalization order
    pub match_number: usize,
    pub rating_delta: u32,
}

/// Expected vs actual win rate of the higher-rated team within a range
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalibrationBucket {
    pub range: String,
    pub matches: usize,
    /// Percentage of matches won by the higher-rated team
    pub actual_win_rate: f64,
    /// Mean Elo expectation of the higher-rated team, as a percentage
    pub expected_win_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccuracyReport {
    pub matches_analyzed: usize,
    /// Percentage of decisive matches won by the higher-average team
    pub overall_accuracy: f64,
    /// Same, over the most recent `recent_matches_count` decisive matches
    pub recent_accuracy: f64,
    pub recent_matches_count: usize,
    pub avg_delta_first_half: f64,
    pub avg_delta_second_half: f64,
    pub stabilization: Vec<StabilizationPoint>,
    pub calibration: Vec<CalibrationBucket>,
}

impl AccuracyReport {
    /// Build the report from finalized matches, oldest first
    pub fn from_matches(matches: &[MatchRecord], recent_window: usize) -> Self {
        let results: Vec<&MatchResult> = matches.iter().filter_map(|m| m.result.as_ref()).collect();

        // Matches where the averages differ, so there is a favourite
        let predictions: Vec<bool> = results
            .iter()
            .filter_map(|r| favourite(r).map(|team| team == r.winner))
            .collect();
        let recent_start = predictions.len().saturating_sub(recent_window);
        let recent = &predictions[recent_start..];

        let stabilization: Vec<StabilizationPoint> = results
            .iter()
            .enumerate()
            .map(|(i, r)| StabilizationPoint {
                match_number: i + 1,
                rating_delta: r.rating_delta,
            })
            .collect();
        let deltas: Vec<u32> = results.iter().map(|r| r.rating_delta).collect();
        let (first_half, second_half) = deltas.split_at(deltas.len() / 2);

        Self {
            matches_analyzed: results.len(),
            overall_accuracy: percentage(&predictions),
            recent_accuracy: percentage(recent),
            recent_matches_count: recent.len(),
            avg_delta_first_half: mean(first_half),
            avg_delta_second_half: mean(second_half),
            stabilization,
            calibration: calibrate(&results),
        }
    }
}

/// The side with the strictly higher pre-match average
fn favourite(result: &MatchResult) -> Option<Team> {
    if result.pre_match_avg_a > result.pre_match_avg_b {
        Some(Team::A)
    } else if result.pre_match_avg_b > result.pre_match_avg_a {
        Some(Team::B)
    } else {
        None
    }
}

fn calibrate(results: &[&MatchResult]) -> Vec<CalibrationBucket> {
    CALIBRATION_RANGES
        .iter()
        .filter_map(|(lower, upper, label)| {
            let in_range: Vec<&&MatchResult> = results
                .iter()
                .filter(|r| {
                    let diff = (r.pre_match_avg_a - r.pre_match_avg_b).abs();
                    diff >= *lower && diff < *upper
                })
                .collect();
            if in_range.is_empty() {
                return None;
            }

            let mut wins = 0usize;
            let mut expected_total = 0.0;
            for result in &in_range {
                // Even matches count team A as the higher side
                let higher = favourite(result).unwrap_or(Team::A);
                let (higher_avg, lower_avg) = match higher {
                    Team::A => (result.pre_match_avg_a, result.pre_match_avg_b),
                    Team::B => (result.pre_match_avg_b, result.pre_match_avg_a),
                };
                if result.winner == higher {
                    wins += 1;
                }
                expected_total += expected_win(higher_avg, lower_avg);
            }

            let count = in_range.len();
            Some(CalibrationBucket {
                range: label.to_string(),
                matches: count,
                actual_win_rate: wins as f64 / count as f64 * 100.0,
                expected_win_rate: expected_total / count as f64 * 100.0,
            })
        })
        .collect()
}

fn percentage(outcomes: &[bool]) -> f64 {
    if outcomes.is_empty() {
        return 0.0;
    }
    outcomes.iter().filter(|correct| **correct).count() as f64 / outcomes.len() as f64 * 100.0
}

fn mean(values: &[u32]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().map(|v| f64::from(*v)).sum::<f64>() / values.len() as f64
}

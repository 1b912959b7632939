//! Candidate enumeration and partition checks
//!
//! Every way of choosing five of the ten players for team A is generated as
//! a 10-bit mask with five bits set. Each unordered partition therefore shows
//! up twice (a set and its complement); both copies score the same, so the
//! duplication does not affect ranking.

use crate::error::{BalancerError, Result};
use crate::types::{RatedPlayer, TeamSplit, SESSION_SIZE, TEAM_SIZE};
use std::collections::HashSet;
use tracing::{debug, error};

/// Check that the input is exactly ten players with distinct ids
pub fn validate_players(players: &[RatedPlayer]) -> Result<()> {
    if players.len() != SESSION_SIZE {
        return Err(BalancerError::invalid_input(format!(
            "Expected exactly {} players, got {}",
            SESSION_SIZE,
            players.len()
        )));
    }

    let mut seen = HashSet::with_capacity(players.len());
    for player in players {
        if !seen.insert(player.id.as_str()) {
            return Err(BalancerError::invalid_input(format!(
                "Duplicate player id: {}",
                player.id
            )));
        }
    }

    Ok(())
}

/// Enumerate all C(10,5) = 252 candidate splits, most balanced first
///
/// The sort is stable, so candidates with equal `diff` keep enumeration
/// order; nothing downstream relies on that order.
pub fn enumerate_candidates(players: &[RatedPlayer]) -> Result<Vec<TeamSplit>> {
    validate_players(players)?;

    let mut candidates = Vec::with_capacity(252);
    for mask in 0u32..(1 << SESSION_SIZE) {
        if mask.count_ones() as usize != TEAM_SIZE {
            continue;
        }

        let (team_a, team_b): (Vec<_>, Vec<_>) = players
            .iter()
            .enumerate()
            .partition(|&(i, _)| mask & (1 << i) != 0);

        candidates.push(TeamSplit::new(
            team_a.into_iter().map(|(_, p)| p.clone()).collect(),
            team_b.into_iter().map(|(_, p)| p.clone()).collect(),
        ));
    }

    candidates.sort_by_key(|c| c.diff);

    debug!(
        "Enumerated {} candidate splits (best diff {}, worst diff {})",
        candidates.len(),
        candidates.first().map(|c| c.diff).unwrap_or_default(),
        candidates.last().map(|c| c.diff).unwrap_or_default()
    );

    Ok(candidates)
}

/// Verify that a split is a proper 5/5 partition of exactly `players`
///
/// A failure here means the balancer produced a malformed split; it is
/// logged and returned as [`BalancerError::InvariantViolation`].
pub fn verify_partition(players: &[RatedPlayer], split: &TeamSplit) -> Result<()> {
    let violation = |reason: String| {
        error!("Team split invariant violated: {}", reason);
        Err(BalancerError::InvariantViolation { reason })
    };

    if split.team_a.len() != TEAM_SIZE || split.team_b.len() != TEAM_SIZE {
        return violation(format!(
            "team sizes are {} and {}, expected {} each",
            split.team_a.len(),
            split.team_b.len(),
            TEAM_SIZE
        ));
    }

    let team_a: HashSet<&str> = split.team_a.iter().map(|p| p.id.as_str()).collect();
    let team_b: HashSet<&str> = split.team_b.iter().map(|p| p.id.as_str()).collect();

    if let Some(shared) = team_a.intersection(&team_b).next() {
        return violation(format!("player {} is on both teams", shared));
    }

    let input: HashSet<&str> = players.iter().map(|p| p.id.as_str()).collect();
    let covered: HashSet<&str> = team_a.union(&team_b).copied().collect();
    if covered != input {
        return violation("teams do not cover exactly the input players".to_string());
    }

    let recomputed = TeamSplit::new(split.team_a.clone(), split.team_b.clone());
    if recomputed.sum_a != split.sum_a
        || recomputed.sum_b != split.sum_b
        || recomputed.diff != split.diff
    {
        return violation("rating sums do not match team members".to_string());
    }

    Ok(())
}

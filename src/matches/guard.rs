//! Once-only match finalization
//!
//! Two confirmation controls can fire for the same match at once, or one
//! can be double-clicked. The guard only hands back rating changes when its
//! conditional transition in the store succeeded, so at most one caller ever
//! applies deltas for a match.

use crate::error::{BalancerError, Result};
use crate::matches::store::{MatchStore, MatchTransition, TransitionOutcome};
use crate::rating::calculator::RatingCalculator;
use crate::types::{
    CommunityId, MatchId, MatchRecord, MatchResult, MatchState, PlayerId, RatedPlayer, Rating, Team, TeamSplit,
};
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

/// Guards the `pending -> finalized | cancelled` transition of match records
#[derive(Clone)]
pub struct FinalizationGuard {
    store: Arc<dyn MatchStore>,
    calculator: Arc<dyn RatingCalculator>,
}

impl FinalizationGuard {
    pub fn new(store: Arc<dyn MatchStore>, calculator: Arc<dyn RatingCalculator>) -> Self {
        Self { store, calculator }
    }

    pub fn store(&self) -> Arc<dyn MatchStore> {
        self.store.clone()
    }

    /// Record a proposed split as a new pending match in a community
    pub fn propose(&self, community_id: &CommunityId, split: &TeamSplit) -> Result<MatchRecord> {
        let record = MatchRecord::pending(Uuid::new_v4(), community_id.clone(), split);
        self.store.insert(record.clone())?;

        info!(
            "Match {} proposed in '{}' (diff {})",
            record.match_id, community_id, split.diff
        );
        Ok(record)
    }

    /// Lock in the winner of a pending match and compute its rating changes
    ///
    /// `ratings` holds the current rating of every participant. The returned
    /// result is what the caller must persist; it is only returned to the
    /// caller whose transition succeeded. Everyone else gets
    /// [`BalancerError::AlreadyFinalized`].
    pub fn finalize(
        &self,
        match_id: &MatchId,
        winner: Team,
        ratings: &HashMap<PlayerId, Rating>,
    ) -> Result<MatchResult> {
        let record = self.pending_record(match_id)?;

        let team_a = rated_team(&record.team_a, ratings)?;
        let team_b = rated_team(&record.team_b, ratings)?;
        let calculation = self
            .calculator
            .calculate_rating_changes(&team_a, &team_b, winner)?;

        let result = MatchResult {
            winner,
            pre_match_avg_a: calculation.avg_a,
            pre_match_avg_b: calculation.avg_b,
            rating_delta: calculation.magnitude,
            rating_changes: calculation.rating_changes,
            finalized_at: Utc::now(),
        };

        match self
            .store
            .transition(match_id, MatchTransition::Finalize(result.clone()))?
        {
            TransitionOutcome::Applied => {
                info!(
                    "Match {} finalized: {} won, magnitude {} (avg {:.1} vs {:.1})",
                    match_id,
                    winner,
                    result.rating_delta,
                    result.pre_match_avg_a,
                    result.pre_match_avg_b
                );
                Ok(result)
            }
            TransitionOutcome::Rejected { current } => {
                warn!(
                    "Duplicate finalization of match {} rejected (already {})",
                    match_id, current
                );
                Err(BalancerError::AlreadyFinalized {
                    match_id: *match_id,
                    state: current,
                })
            }
        }
    }

    /// Cancel a pending match; fails if it was already finalized or cancelled
    pub fn cancel(&self, match_id: &MatchId) -> Result<()> {
        match self.store.transition(match_id, MatchTransition::Cancel)? {
            TransitionOutcome::Applied => {
                info!("Match {} cancelled", match_id);
                Ok(())
            }
            TransitionOutcome::Rejected { current } => {
                warn!(
                    "Cancellation of match {} rejected (already {})",
                    match_id, current
                );
                Err(BalancerError::AlreadyFinalized {
                    match_id: *match_id,
                    state: current,
                })
            }
        }
    }

    /// Fetch a record and fail fast if it is not pending. The store's
    /// conditional transition remains the authoritative check.
    fn pending_record(&self, match_id: &MatchId) -> Result<MatchRecord> {
        let record = self
            .store
            .get(match_id)?
            .ok_or(BalancerError::MatchNotFound {
                match_id: *match_id,
            })?;

        if record.state != MatchState::Pending {
            warn!(
                "Finalization of match {} rejected (already {})",
                match_id, record.state
            );
            return Err(BalancerError::AlreadyFinalized {
                match_id: *match_id,
                state: record.state,
            });
        }

        Ok(record)
    }
}

fn rated_team(ids: &[PlayerId], ratings: &HashMap<PlayerId, Rating>) -> Result<Vec<RatedPlayer>> {
    ids.iter()
        .map(|id| {
            ratings
                .get(id)
                .map(|rating| RatedPlayer::new(id.clone(), *rating))
                .ok_or_else(|| BalancerError::PlayerNotFound {
                    player_id: id.clone(),
                })
        })
        .collect()
}

//! Match record storage with an atomic conditional transition
//!
//! Any backing store works (row lock, version check, in-memory map) as long
//! as [`MatchStore::transition`] checks the `pending` state and applies the
//! change as one atomic step.

use crate::error::{BalancerError, Result};
use crate::types::{CommunityId, MatchId, MatchRecord, MatchResult, MatchState};
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Mutex;

/// Requested move out of the `pending` state
#[derive(Debug, Clone, PartialEq)]
pub enum MatchTransition {
    Finalize(MatchResult),
    Cancel,
}

impl MatchTransition {
    pub fn target_state(&self) -> MatchState {
        match self {
            MatchTransition::Finalize(_) => MatchState::Finalized,
            MatchTransition::Cancel => MatchState::Cancelled,
        }
    }
}

/// Outcome of a conditional transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionOutcome {
    /// The match was pending and now holds the requested state
    Applied,
    /// The match had already left `pending`; nothing was changed
    Rejected { current: MatchState },
}

/// Trait for match record persistence
#[cfg_attr(test, mockall::automock)]
pub trait MatchStore: Send + Sync {
    /// Store a new record; ids must be unique
    fn insert(&self, record: MatchRecord) -> Result<()>;

    /// Get a record by id
    fn get(&self, match_id: &MatchId) -> Result<Option<MatchRecord>>;

    /// Atomically apply `transition` if and only if the match is pending
    ///
    /// Fails with [`BalancerError::MatchNotFound`] for unknown ids.
    fn transition(
        &self,
        match_id: &MatchId,
        transition: MatchTransition,
    ) -> Result<TransitionOutcome>;

    /// Finalized matches of one community, oldest finalization first
    fn finalized_matches(&self, community_id: &CommunityId) -> Result<Vec<MatchRecord>>;

    /// Number of records in any state
    fn match_count(&self) -> Result<usize>;
}

/// In-memory match store guarded by a single mutex
#[derive(Debug, Default)]
pub struct InMemoryMatchStore {
    matches: Mutex<HashMap<MatchId, MatchRecord>>,
}

impl InMemoryMatchStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<MatchId, MatchRecord>>> {
        self.matches
            .lock()
            .map_err(|_| BalancerError::storage("Failed to acquire match store lock"))
    }
}

impl MatchStore for InMemoryMatchStore {
    fn insert(&self, record: MatchRecord) -> Result<()> {
        let mut matches = self.lock()?;

        if matches.contains_key(&record.match_id) {
            return Err(BalancerError::invalid_input(format!(
                "Match {} already exists",
                record.match_id
            )));
        }

        matches.insert(record.match_id, record);
        Ok(())
    }

    fn get(&self, match_id: &MatchId) -> Result<Option<MatchRecord>> {
        Ok(self.lock()?.get(match_id).cloned())
    }

    fn transition(
        &self,
        match_id: &MatchId,
        transition: MatchTransition,
    ) -> Result<TransitionOutcome> {
        let mut matches = self.lock()?;
        let record = matches
            .get_mut(match_id)
            .ok_or(BalancerError::MatchNotFound {
                match_id: *match_id,
            })?;

        if record.state != MatchState::Pending {
            return Ok(TransitionOutcome::Rejected {
                current: record.state,
            });
        }

        record.state = transition.target_state();
        record.updated_at = Utc::now();
        if let MatchTransition::Finalize(result) = transition {
            record.result = Some(result);
        }

        Ok(TransitionOutcome::Applied)
    }

    fn finalized_matches(&self, community_id: &CommunityId) -> Result<Vec<MatchRecord>> {
        let mut finalized: Vec<MatchRecord> = self
            .lock()?
            .values()
            .filter(|record| record.is_finalized() && &record.community_id == community_id)
            .cloned()
            .collect();

        finalized.sort_by_key(|record| {
            (
                record.result.as_ref().map(|r| r.finalized_at),
                record.created_at,
            )
        });

        Ok(finalized)
    }

    fn match_count(&self) -> Result<usize> {
        Ok(self.lock()?.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{RatedPlayer, Team, TeamSplit};
    use uuid::Uuid;

    fn pending_record() -> MatchRecord {
        pending_record_in("guild-1")
    }

    fn pending_record_in(community_id: &str) -> MatchRecord {
        let split = TeamSplit::new(
            (0..5).map(|i| RatedPlayer::new(format!("a{}", i), 1000)).collect(),
            (0..5).map(|i| RatedPlayer::new(format!("b{}", i), 1000)).collect(),
        );
        MatchRecord::pending(Uuid::new_v4(), community_id, &split)
    }

    fn result(winner: Team) -> MatchResult {
        MatchResult {
            winner,
            pre_match_avg_a: 1000.0,
            pre_match_avg_b: 1000.0,
            rating_delta: 16,
            rating_changes: vec![],
            finalized_at: Utc::now(),
        }
    }

    #[test]
    fn test_duplicate_insert_rejected() {
        let store = InMemoryMatchStore::new();
        let record = pending_record();
        store.insert(record.clone()).unwrap();
        assert!(store.insert(record).is_err());
        assert_eq!(store.match_count().unwrap(), 1);
    }

    #[test]
    fn test_transition_applies_once() {
        let store = InMemoryMatchStore::new();
        let record = pending_record();
        let id = record.match_id;
        store.insert(record).unwrap();

        let first = store
            .transition(&id, MatchTransition::Finalize(result(Team::A)))
            .unwrap();
        assert_eq!(first, TransitionOutcome::Applied);

        let second = store
            .transition(&id, MatchTransition::Finalize(result(Team::B)))
            .unwrap();
        assert_eq!(
            second,
            TransitionOutcome::Rejected {
                current: MatchState::Finalized
            }
        );

        let stored = store.get(&id).unwrap().unwrap();
        assert_eq!(stored.result.unwrap().winner, Team::A);
    }

    #[test]
    fn test_cancel_blocks_finalize() {
        let store = InMemoryMatchStore::new();
        let record = pending_record();
        let id = record.match_id;
        store.insert(record).unwrap();

        assert_eq!(
            store.transition(&id, MatchTransition::Cancel).unwrap(),
            TransitionOutcome::Applied
        );
        assert_eq!(
            store
                .transition(&id, MatchTransition::Finalize(result(Team::A)))
                .unwrap(),
            TransitionOutcome::Rejected {
                current: MatchState::Cancelled
            }
        );
        assert!(store.get(&id).unwrap().unwrap().result.is_none());
    }

    #[test]
    fn test_unknown_match() {
        let store = InMemoryMatchStore::new();
        let id = Uuid::new_v4();
        assert_eq!(
            store.transition(&id, MatchTransition::Cancel),
            Err(BalancerError::MatchNotFound { match_id: id })
        );
    }

    #[test]
    fn test_finalized_matches_in_order() {
        let store = InMemoryMatchStore::new();
        let mut ids = Vec::new();
        for _ in 0..3 {
            let record = pending_record();
            ids.push(record.match_id);
            store.insert(record).unwrap();
        }
        let elsewhere = pending_record_in("guild-2");
        let elsewhere_id = elsewhere.match_id;
        store.insert(elsewhere).unwrap();
        store
            .transition(&elsewhere_id, MatchTransition::Finalize(result(Team::A)))
            .unwrap();

        store
            .transition(&ids[2], MatchTransition::Finalize(result(Team::A)))
            .unwrap();
        store
            .transition(&ids[0], MatchTransition::Finalize(result(Team::B)))
            .unwrap();
        store.transition(&ids[1], MatchTransition::Cancel).unwrap();

        let finalized: Vec<MatchId> = store
            .finalized_matches(&"guild-1".to_string())
            .unwrap()
            .iter()
            .map(|r| r.match_id)
            .collect();
        assert_eq!(finalized.len(), 2);
        assert!(finalized.contains(&ids[0]));
        assert!(finalized.contains(&ids[2]));
        assert_eq!(
            store.finalized_matches(&"guild-2".to_string()).unwrap().len(),
            1
        );
    }
}

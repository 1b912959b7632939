//! Application state and the operations the HTTP API delegates to
//!
//! `AppState` wires the core (balancer, finalization guard, Elo calculator)
//! to the rating and match stores, and records metrics around each call.

use crate::analysis::{player_history, AccuracyReport, HistoryEntry};
use crate::balance::{TeamBalancer, TopKBalancer};
use crate::config::AppConfig;
use crate::error::{BalancerError, Result};
use crate::matches::{FinalizationGuard, InMemoryMatchStore, MatchStore};
use crate::metrics::MetricsCollector;
use crate::rating::{
    Division, EloTeamCalculator, InMemoryRatingStorage, LinkOutcome, RankTier, RatingEntry,
    RatingStorage,
};
use crate::types::{
    CommunityId, MatchId, MatchRecord, MatchResult, PlayerId, RatedPlayer, Rating, Team, TeamSplit,
};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, error, info};

/// Service-level errors
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Service initialization error: {message}")]
    Initialization { message: String },
}

/// A freshly balanced split and the pending match recorded for it
#[derive(Debug, Clone)]
pub struct GeneratedMatch {
    pub record: MatchRecord,
    pub split: TeamSplit,
}

/// Shared state behind every request handler
pub struct AppState {
    config: AppConfig,
    ratings: Arc<dyn RatingStorage>,
    guard: FinalizationGuard,
    balancer: TopKBalancer,
    metrics: Arc<MetricsCollector>,
    started_at: Instant,
}

impl AppState {
    /// Build the state on the in-memory reference stores
    pub fn new(config: AppConfig) -> std::result::Result<Self, ServiceError> {
        Self::with_stores(
            config,
            Arc::new(InMemoryRatingStorage::new()),
            Arc::new(InMemoryMatchStore::new()),
        )
    }

    /// Build the state on caller-provided stores
    pub fn with_stores(
        config: AppConfig,
        ratings: Arc<dyn RatingStorage>,
        matches: Arc<dyn MatchStore>,
    ) -> std::result::Result<Self, ServiceError> {
        let balancer = TopKBalancer::new(config.balancing.top_k).map_err(|e| {
            ServiceError::Configuration {
                message: e.to_string(),
            }
        })?;
        let calculator = EloTeamCalculator::new(config.rating.k_factor).map_err(|e| {
            ServiceError::Configuration {
                message: e.to_string(),
            }
        })?;
        let metrics = MetricsCollector::new().map_err(|e| ServiceError::Initialization {
            message: format!("Failed to create metrics collector: {}", e),
        })?;

        info!(
            "Service state initialized (top_k={}, k_factor={})",
            config.balancing.top_k, config.rating.k_factor
        );

        Ok(Self {
            config,
            ratings,
            guard: FinalizationGuard::new(matches, Arc::new(calculator)),
            balancer,
            metrics: Arc::new(metrics),
            started_at: Instant::now(),
        })
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn ratings(&self) -> Arc<dyn RatingStorage> {
        self.ratings.clone()
    }

    pub fn matches(&self) -> Arc<dyn MatchStore> {
        self.guard.store()
    }

    pub fn metrics(&self) -> Arc<MetricsCollector> {
        self.metrics.clone()
    }

    pub fn uptime(&self) -> Duration {
        self.started_at.elapsed()
    }

    /// Link a player's reported rank, seeding a rating if they have none
    pub fn link_player(
        &self,
        community_id: &CommunityId,
        player_id: &PlayerId,
        display_name: Option<String>,
        tier: Option<RankTier>,
        division: Option<Division>,
    ) -> Result<LinkOutcome> {
        require_community(community_id)?;
        if player_id.trim().is_empty() {
            return Err(BalancerError::invalid_input("Player id cannot be empty"));
        }

        let outcome =
            self.ratings
                .link_player(community_id, player_id, display_name, tier, division)?;
        self.metrics.record_link(outcome.seeded);
        Ok(outcome)
    }

    pub fn player(&self, community_id: &CommunityId, player_id: &PlayerId) -> Result<RatingEntry> {
        self.ratings
            .get_rating(community_id, player_id)?
            .ok_or_else(|| BalancerError::PlayerNotFound {
                player_id: player_id.clone(),
            })
    }

    pub fn set_rating(
        &self,
        community_id: &CommunityId,
        player_id: &PlayerId,
        rating: Rating,
    ) -> Result<RatingEntry> {
        self.ratings.set_rating(community_id, player_id, rating)
    }

    pub fn leaderboard(&self, community_id: &CommunityId, limit: usize) -> Result<Vec<RatingEntry>> {
        self.ratings.leaderboard(community_id, limit)
    }

    /// Balance ten players linked in a community and record the split as a
    /// pending match of that community
    pub fn generate_teams(
        &self,
        community_id: &CommunityId,
        player_ids: &[PlayerId],
    ) -> Result<GeneratedMatch> {
        require_community(community_id)?;
        let entries = self.ratings.get_ratings(community_id, player_ids)?;

        let missing: Vec<&str> = player_ids
            .iter()
            .filter(|id| !entries.contains_key(*id))
            .map(String::as_str)
            .collect();
        if !missing.is_empty() {
            return Err(BalancerError::PlayerNotFound {
                player_id: missing.join(", "),
            });
        }

        let players: Vec<RatedPlayer> = player_ids
            .iter()
            .filter_map(|id| entries.get(id))
            .map(|entry| RatedPlayer::new(entry.player_id.clone(), entry.rating))
            .collect();

        let split = self.balancer.balance(&players)?;
        let record = self.guard.propose(community_id, &split)?;
        self.metrics.record_split(split.diff);

        Ok(GeneratedMatch { record, split })
    }

    pub fn get_match(&self, match_id: &MatchId) -> Result<MatchRecord> {
        self.guard
            .store()
            .get(match_id)?
            .ok_or(BalancerError::MatchNotFound {
                match_id: *match_id,
            })
    }

    /// Finalize a match and move every participant's stored rating by the
    /// team delta
    ///
    /// The magnitude is computed from the ratings read here. The deltas are
    /// applied to whatever each rating holds at write time, so results of
    /// overlapping matches and overrides in between all accumulate.
    pub fn record_result(&self, match_id: &MatchId, winner: Team) -> Result<MatchResult> {
        let record = self.get_match(match_id)?;
        let participants: Vec<PlayerId> = record
            .team_a
            .iter()
            .chain(record.team_b.iter())
            .cloned()
            .collect();
        let ratings: HashMap<PlayerId, Rating> = self
            .ratings
            .get_ratings(&record.community_id, &participants)?
            .into_iter()
            .map(|(id, entry)| (id, entry.rating))
            .collect();

        let result = match self.guard.finalize(match_id, winner, &ratings) {
            Ok(result) => result,
            Err(e) => {
                if e.is_already_finalized() {
                    self.metrics.record_finalize(None);
                }
                return Err(e);
            }
        };
        self.metrics.record_finalize(Some(result.rating_delta));

        let deltas = team_deltas(&record, &result);
        match self.ratings.apply_deltas(&record.community_id, &deltas) {
            Ok(applied) => {
                debug!(
                    "Applied {} rating changes for match {}",
                    applied.len(),
                    match_id
                );
            }
            Err(e) => {
                error!(
                    "Match {} is finalized but its rating deltas were not applied: {} (deltas: {:?})",
                    match_id, e, deltas
                );
                return Err(e);
            }
        }

        Ok(result)
    }

    pub fn cancel_match(&self, match_id: &MatchId) -> Result<()> {
        match self.guard.cancel(match_id) {
            Ok(()) => {
                self.metrics.record_cancel(true);
                Ok(())
            }
            Err(e) => {
                if e.is_already_finalized() {
                    self.metrics.record_cancel(false);
                }
                Err(e)
            }
        }
    }

    pub fn accuracy_report(&self, community_id: &CommunityId) -> Result<AccuracyReport> {
        let finalized = self.guard.store().finalized_matches(community_id)?;
        Ok(AccuracyReport::from_matches(
            &finalized,
            self.config.rating.recent_window,
        ))
    }

    pub fn player_history(
        &self,
        community_id: &CommunityId,
        player_id: &PlayerId,
        limit: usize,
    ) -> Result<Vec<HistoryEntry>> {
        // Unknown players get a 404 rather than an empty history
        self.player(community_id, player_id)?;
        let finalized = self.guard.store().finalized_matches(community_id)?;
        Ok(player_history(player_id, &finalized, limit))
    }
}

fn require_community(community_id: &CommunityId) -> Result<()> {
    if community_id.trim().is_empty() {
        return Err(BalancerError::invalid_input("Community id cannot be empty"));
    }
    Ok(())
}

/// `+magnitude` for every winner, `-magnitude` for every loser
fn team_deltas(record: &MatchRecord, result: &MatchResult) -> Vec<(PlayerId, i64)> {
    let magnitude = i64::from(result.rating_delta);
    let winners = record
        .players(result.winner)
        .iter()
        .map(|id| (id.clone(), magnitude));
    let losers = record
        .players(result.winner.opponent())
        .iter()
        .map(|id| (id.clone(), -magnitude));
    winners.chain(losers).collect()
}

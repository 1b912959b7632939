//! Rating storage interface and implementations
//!
//! The engine never persists ratings itself. This module defines the
//! interface callers persist through, plus the in-memory implementation the
//! HTTP service runs on.

use crate::error::{BalancerError, Result};
use crate::rating::tier::{seed_rating, Division, RankTier};
use crate::types::{CommunityId, PlayerId, Rating, RatingChange};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{debug, info};

/// Storage entry for a player's rating within one community
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatingEntry {
    pub community_id: CommunityId,
    pub player_id: PlayerId,
    pub display_name: Option<String>,
    pub rating: Rating,
    /// Highest reported tier at link time, kept for display
    pub tier: Option<RankTier>,
    pub division: Option<Division>,
    pub games_played: u64,
    pub last_updated: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl RatingEntry {
    /// Create a new rating entry for a new player
    pub fn new(
        community_id: impl Into<CommunityId>,
        player_id: impl Into<PlayerId>,
        initial_rating: Rating,
    ) -> Self {
        let now = Utc::now();
        Self {
            community_id: community_id.into(),
            player_id: player_id.into(),
            display_name: None,
            rating: initial_rating,
            tier: None,
            division: None,
            games_played: 0,
            last_updated: now,
            created_at: now,
        }
    }

    /// Record a match result and increment games played
    pub fn apply_match(&mut self, new_rating: Rating) {
        self.rating = new_rating;
        self.games_played += 1;
        self.last_updated = Utc::now();
    }
}

/// Result of linking an external account to a player
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkOutcome {
    pub entry: RatingEntry,
    /// True when the rating was seeded from the tier by this call
    pub seeded: bool,
}

/// Trait for rating storage operations
///
/// Every rating is keyed by community and player; the same player id in two
/// communities refers to two independent entries.
pub trait RatingStorage: Send + Sync {
    /// Get a player's rating entry
    fn get_rating(
        &self,
        community_id: &CommunityId,
        player_id: &PlayerId,
    ) -> Result<Option<RatingEntry>>;

    /// Get ratings for multiple players; unknown ids are absent from the map
    fn get_ratings(
        &self,
        community_id: &CommunityId,
        player_ids: &[PlayerId],
    ) -> Result<HashMap<PlayerId, RatingEntry>>;

    /// Link a player's reported rank, seeding a rating only if they have none
    ///
    /// An existing rating is never overwritten; the reported tier and display
    /// name are refreshed either way.
    fn link_player(
        &self,
        community_id: &CommunityId,
        player_id: &PlayerId,
        display_name: Option<String>,
        tier: Option<RankTier>,
        division: Option<Division>,
    ) -> Result<LinkOutcome>;

    /// Administrative override of a player's rating
    fn set_rating(
        &self,
        community_id: &CommunityId,
        player_id: &PlayerId,
        rating: Rating,
    ) -> Result<RatingEntry>;

    /// Apply the signed team deltas of one finalized match atomically
    ///
    /// Each delta is added to the rating stored at the time of the call, not
    /// to the snapshot the match was rated from, and the result is floored
    /// at zero. Returns the changes actually applied. Fails without touching
    /// anything if any player is unknown.
    fn apply_deltas(
        &self,
        community_id: &CommunityId,
        deltas: &[(PlayerId, i64)],
    ) -> Result<Vec<RatingChange>>;

    /// Players of a community sorted by rating, highest first, ties by id
    fn leaderboard(&self, community_id: &CommunityId, limit: usize) -> Result<Vec<RatingEntry>>;

    /// Total number of rating entries across all communities
    fn get_player_count(&self) -> Result<usize>;
}

type CommunityRatings = HashMap<CommunityId, HashMap<PlayerId, RatingEntry>>;

/// In-memory rating storage implementation
#[derive(Debug, Default)]
pub struct InMemoryRatingStorage {
    ratings: RwLock<CommunityRatings>,
}

impl InMemoryRatingStorage {
    /// Create a new in-memory rating storage
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace an entry directly
    pub fn insert(&self, entry: RatingEntry) -> Result<()> {
        self.write()?
            .entry(entry.community_id.clone())
            .or_default()
            .insert(entry.player_id.clone(), entry);
        Ok(())
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, CommunityRatings>> {
        self.ratings
            .read()
            .map_err(|_| BalancerError::storage("Failed to acquire ratings read lock"))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, CommunityRatings>> {
        self.ratings
            .write()
            .map_err(|_| BalancerError::storage("Failed to acquire ratings write lock"))
    }
}

fn player_not_found(player_id: &PlayerId) -> BalancerError {
    BalancerError::PlayerNotFound {
        player_id: player_id.clone(),
    }
}

impl RatingStorage for InMemoryRatingStorage {
    fn get_rating(
        &self,
        community_id: &CommunityId,
        player_id: &PlayerId,
    ) -> Result<Option<RatingEntry>> {
        Ok(self
            .read()?
            .get(community_id)
            .and_then(|players| players.get(player_id))
            .cloned())
    }

    fn get_ratings(
        &self,
        community_id: &CommunityId,
        player_ids: &[PlayerId],
    ) -> Result<HashMap<PlayerId, RatingEntry>> {
        let ratings = self.read()?;
        let Some(players) = ratings.get(community_id) else {
            return Ok(HashMap::new());
        };

        Ok(player_ids
            .iter()
            .filter_map(|id| players.get(id).map(|entry| (id.clone(), entry.clone())))
            .collect())
    }

    fn link_player(
        &self,
        community_id: &CommunityId,
        player_id: &PlayerId,
        display_name: Option<String>,
        tier: Option<RankTier>,
        division: Option<Division>,
    ) -> Result<LinkOutcome> {
        let mut ratings = self.write()?;
        let players = ratings.entry(community_id.clone()).or_default();

        let seeded = !players.contains_key(player_id);
        let entry = players.entry(player_id.clone()).or_insert_with(|| {
            let rating = seed_rating(tier, division);
            info!(
                "Seeding rating for '{}' in '{}' from {:?} {:?}: {}",
                player_id, community_id, tier, division, rating
            );
            RatingEntry::new(community_id.clone(), player_id.clone(), rating)
        });

        if !seeded {
            debug!(
                "Player '{}' already rated at {} in '{}', keeping existing value",
                player_id, entry.rating, community_id
            );
        }

        if display_name.is_some() {
            entry.display_name = display_name;
        }
        entry.tier = tier;
        entry.division = division;

        Ok(LinkOutcome {
            entry: entry.clone(),
            seeded,
        })
    }

    fn set_rating(
        &self,
        community_id: &CommunityId,
        player_id: &PlayerId,
        rating: Rating,
    ) -> Result<RatingEntry> {
        let mut ratings = self.write()?;
        let entry = ratings
            .get_mut(community_id)
            .and_then(|players| players.get_mut(player_id))
            .ok_or_else(|| player_not_found(player_id))?;

        info!(
            "Rating override for '{}' in '{}': {} -> {}",
            player_id, community_id, entry.rating, rating
        );
        entry.rating = rating;
        entry.last_updated = Utc::now();

        Ok(entry.clone())
    }

    fn apply_deltas(
        &self,
        community_id: &CommunityId,
        deltas: &[(PlayerId, i64)],
    ) -> Result<Vec<RatingChange>> {
        let mut ratings = self.write()?;
        let Some(players) = ratings.get_mut(community_id) else {
            return match deltas.first() {
                Some((player_id, _)) => Err(player_not_found(player_id)),
                None => Ok(Vec::new()),
            };
        };

        if let Some((missing, _)) = deltas.iter().find(|(id, _)| !players.contains_key(id)) {
            return Err(player_not_found(missing));
        }

        let mut applied = Vec::with_capacity(deltas.len());
        for (player_id, delta) in deltas {
            if let Some(entry) = players.get_mut(player_id) {
                let change = RatingChange::apply(player_id.clone(), entry.rating, *delta);
                entry.apply_match(change.new_rating);
                applied.push(change);
            }
        }

        Ok(applied)
    }

    fn leaderboard(&self, community_id: &CommunityId, limit: usize) -> Result<Vec<RatingEntry>> {
        let mut entries: Vec<RatingEntry> = self
            .read()?
            .get(community_id)
            .map(|players| players.values().cloned().collect())
            .unwrap_or_default();

        entries.sort_by(|a, b| {
            b.rating
                .cmp(&a.rating)
                .then_with(|| a.player_id.cmp(&b.player_id))
        });
        entries.truncate(limit);

        Ok(entries)
    }

    fn get_player_count(&self) -> Result<usize> {
        Ok(self.read()?.values().map(HashMap::len).sum())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const GUILD: &str = "guild-1";

    fn guild() -> CommunityId {
        GUILD.to_string()
    }

    fn storage_with(players: &[(&str, Rating)]) -> InMemoryRatingStorage {
        let storage = InMemoryRatingStorage::new();
        for (id, rating) in players {
            storage.insert(RatingEntry::new(GUILD, *id, *rating)).unwrap();
        }
        storage
    }

    fn rating_of(storage: &InMemoryRatingStorage, id: &str) -> RatingEntry {
        storage
            .get_rating(&guild(), &id.to_string())
            .unwrap()
            .unwrap()
    }

    #[test]
    fn test_rating_entry_apply_match() {
        let mut entry = RatingEntry::new(GUILD, "player1", 1000);
        entry.apply_match(1016);
        assert_eq!(entry.rating, 1016);
        assert_eq!(entry.games_played, 1);
    }

    #[test]
    fn test_link_seeds_new_player_from_tier() {
        let storage = InMemoryRatingStorage::new();
        let outcome = storage
            .link_player(
                &guild(),
                &"p1".to_string(),
                Some("Player One".to_string()),
                Some(RankTier::Gold),
                Some(Division::I),
            )
            .unwrap();

        assert!(outcome.seeded);
        assert_eq!(outcome.entry.rating, 475);
        assert_eq!(outcome.entry.community_id, GUILD);
        assert_eq!(outcome.entry.display_name.as_deref(), Some("Player One"));
    }

    #[test]
    fn test_link_unranked_uses_default() {
        let storage = InMemoryRatingStorage::new();
        let outcome = storage
            .link_player(&guild(), &"p1".to_string(), None, None, None)
            .unwrap();
        assert_eq!(outcome.entry.rating, 1000);
    }

    #[test]
    fn test_link_never_overwrites_existing_rating() {
        let storage = storage_with(&[("p1", 1234)]);
        let outcome = storage
            .link_player(
                &guild(),
                &"p1".to_string(),
                None,
                Some(RankTier::Challenger),
                None,
            )
            .unwrap();

        assert!(!outcome.seeded);
        assert_eq!(outcome.entry.rating, 1234);
        assert_eq!(outcome.entry.tier, Some(RankTier::Challenger));
    }

    #[test]
    fn test_communities_are_independent() {
        let storage = storage_with(&[("p1", 1234)]);
        let other = "guild-2".to_string();

        let outcome = storage
            .link_player(&other, &"p1".to_string(), None, Some(RankTier::Iron), None)
            .unwrap();
        assert!(outcome.seeded);
        assert_eq!(outcome.entry.rating, 100);

        storage
            .apply_deltas(&other, &[("p1".to_string(), 20)])
            .unwrap();
        assert_eq!(rating_of(&storage, "p1").rating, 1234);
        assert_eq!(
            storage
                .get_rating(&other, &"p1".to_string())
                .unwrap()
                .unwrap()
                .rating,
            120
        );

        assert_eq!(storage.leaderboard(&other, 10).unwrap().len(), 1);
        assert!(storage
            .get_ratings(&"guild-3".to_string(), &["p1".to_string()])
            .unwrap()
            .is_empty());
        assert_eq!(storage.get_player_count().unwrap(), 2);
    }

    #[test]
    fn test_set_rating_requires_existing_player() {
        let storage = storage_with(&[("p1", 900)]);
        assert_eq!(
            storage
                .set_rating(&guild(), &"p1".to_string(), 950)
                .unwrap()
                .rating,
            950
        );
        assert!(matches!(
            storage.set_rating(&guild(), &"ghost".to_string(), 950),
            Err(BalancerError::PlayerNotFound { .. })
        ));
        assert!(matches!(
            storage.set_rating(&"guild-2".to_string(), &"p1".to_string(), 950),
            Err(BalancerError::PlayerNotFound { .. })
        ));
    }

    #[test]
    fn test_apply_deltas_is_all_or_nothing() {
        let storage = storage_with(&[("p1", 1000), ("p2", 1000)]);
        let deltas = vec![("p1".to_string(), 16), ("ghost".to_string(), -16)];

        assert!(storage.apply_deltas(&guild(), &deltas).is_err());
        let p1 = rating_of(&storage, "p1");
        assert_eq!(p1.rating, 1000);
        assert_eq!(p1.games_played, 0);

        let applied = storage.apply_deltas(&guild(), &deltas[..1]).unwrap();
        assert_eq!(applied, vec![RatingChange::apply("p1".to_string(), 1000, 16)]);
        let p1 = rating_of(&storage, "p1");
        assert_eq!(p1.rating, 1016);
        assert_eq!(p1.games_played, 1);
    }

    #[test]
    fn test_apply_deltas_accumulates_on_current_rating() {
        let storage = storage_with(&[("p1", 1000)]);
        let win = [("p1".to_string(), 16)];

        storage.apply_deltas(&guild(), &win).unwrap();
        storage.apply_deltas(&guild(), &win).unwrap();
        assert_eq!(rating_of(&storage, "p1").rating, 1032);

        // An override between two results is kept, not reverted
        storage.set_rating(&guild(), &"p1".to_string(), 1500).unwrap();
        storage.apply_deltas(&guild(), &win).unwrap();
        let p1 = rating_of(&storage, "p1");
        assert_eq!(p1.rating, 1516);
        assert_eq!(p1.games_played, 3);
    }

    #[test]
    fn test_apply_deltas_floors_at_zero() {
        let storage = storage_with(&[("p1", 10)]);
        let applied = storage
            .apply_deltas(&guild(), &[("p1".to_string(), -24)])
            .unwrap();

        assert_eq!(applied[0].new_rating, 0);
        assert_eq!(applied[0].delta, -10);
        assert_eq!(rating_of(&storage, "p1").rating, 0);
    }

    #[test]
    fn test_get_ratings_skips_unknown() {
        let storage = storage_with(&[("p1", 1000), ("p2", 800)]);
        let found = storage
            .get_ratings(&guild(), &["p1".to_string(), "p9".to_string()])
            .unwrap();
        assert_eq!(found.len(), 1);
        assert!(found.contains_key("p1"));
    }

    #[test]
    fn test_leaderboard_order_and_limit() {
        let storage = storage_with(&[("b", 1200), ("a", 1200), ("c", 1500), ("d", 300)]);
        let board = storage.leaderboard(&guild(), 3).unwrap();
        let ids: Vec<&str> = board.iter().map(|e| e.player_id.as_str()).collect();
        assert_eq!(ids, vec!["c", "a", "b"]);
        assert_eq!(storage.get_player_count().unwrap(), 4);
    }
}

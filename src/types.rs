//! Common types used throughout the balancing and rating engine

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Opaque, stable identifier for a player
pub type PlayerId = String;

/// Opaque identifier of the community (server, guild, league) a rating
/// belongs to. A player holds an independent rating in each community.
pub type CommunityId = String;

/// Unique identifier for a proposed match
pub type MatchId = Uuid;

/// Integer skill rating (MMR). Never negative, no fixed ceiling.
pub type Rating = u32;

/// Number of players on each side of a split
pub const TEAM_SIZE: usize = 5;

/// Number of players required to balance a session
pub const SESSION_SIZE: usize = TEAM_SIZE * 2;

/// A player together with the rating used for balancing
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RatedPlayer {
    pub id: PlayerId,
    pub rating: Rating,
}

impl RatedPlayer {
    pub fn new(id: impl Into<PlayerId>, rating: Rating) -> Self {
        Self {
            id: id.into(),
            rating,
        }
    }
}

/// One side of a match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Team {
    A,
    B,
}

impl Team {
    /// The other side
    pub fn opponent(self) -> Team {
        match self {
            Team::A => Team::B,
            Team::B => Team::A,
        }
    }
}

impl std::fmt::Display for Team {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Team::A => write!(f, "Team A"),
            Team::B => write!(f, "Team B"),
        }
    }
}

/// A proposed partition of ten players into two teams of five
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamSplit {
    pub team_a: Vec<RatedPlayer>,
    pub team_b: Vec<RatedPlayer>,
    /// Sum of team A ratings
    pub sum_a: u64,
    /// Sum of team B ratings
    pub sum_b: u64,
    /// `|sum_a - sum_b|`
    pub diff: u64,
}

impl TeamSplit {
    /// Build a split from its two sides, deriving the sums and difference
    pub fn new(team_a: Vec<RatedPlayer>, team_b: Vec<RatedPlayer>) -> Self {
        let sum_a = team_a.iter().map(|p| u64::from(p.rating)).sum::<u64>();
        let sum_b = team_b.iter().map(|p| u64::from(p.rating)).sum::<u64>();
        Self {
            team_a,
            team_b,
            sum_a,
            sum_b,
            diff: sum_a.abs_diff(sum_b),
        }
    }

    pub fn team_a_ids(&self) -> Vec<PlayerId> {
        self.team_a.iter().map(|p| p.id.clone()).collect()
    }

    pub fn team_b_ids(&self) -> Vec<PlayerId> {
        self.team_b.iter().map(|p| p.id.clone()).collect()
    }
}

/// Rating change applied to one player after a finalized match
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RatingChange {
    pub player_id: PlayerId,
    pub old_rating: Rating,
    pub new_rating: Rating,
    /// Signed change actually applied, after the zero floor
    pub delta: i64,
}

impl RatingChange {
    /// Apply a signed team delta to one player, truncating at zero
    pub fn apply(player_id: PlayerId, old_rating: Rating, team_delta: i64) -> Self {
        let new_rating = (i64::from(old_rating) + team_delta).clamp(0, i64::from(Rating::MAX));
        let new_rating = new_rating as Rating;
        Self {
            player_id,
            old_rating,
            new_rating,
            delta: i64::from(new_rating) - i64::from(old_rating),
        }
    }
}

/// Lifecycle of a match record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchState {
    Pending,
    Finalized,
    Cancelled,
}

impl std::fmt::Display for MatchState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MatchState::Pending => write!(f, "pending"),
            MatchState::Finalized => write!(f, "finalized"),
            MatchState::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// Outcome locked in when a match is finalized
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    pub winner: Team,
    /// Average team A rating at decision time
    pub pre_match_avg_a: f64,
    /// Average team B rating at decision time
    pub pre_match_avg_b: f64,
    /// Magnitude awarded to winners and taken from losers
    pub rating_delta: u32,
    pub rating_changes: Vec<RatingChange>,
    pub finalized_at: DateTime<Utc>,
}

impl MatchResult {
    /// Pre-match rating of a participant
    pub fn rating_at_match(&self, player_id: &str) -> Option<Rating> {
        self.rating_changes
            .iter()
            .find(|c| c.player_id == player_id)
            .map(|c| c.old_rating)
    }
}

/// A proposed match and, once decided, its result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchRecord {
    pub match_id: MatchId,
    pub community_id: CommunityId,
    pub team_a: Vec<PlayerId>,
    pub team_b: Vec<PlayerId>,
    pub state: MatchState,
    pub result: Option<MatchResult>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl MatchRecord {
    /// Create a pending record for a split
    pub fn pending(
        match_id: MatchId,
        community_id: impl Into<CommunityId>,
        split: &TeamSplit,
    ) -> Self {
        let now = Utc::now();
        Self {
            match_id,
            community_id: community_id.into(),
            team_a: split.team_a_ids(),
            team_b: split.team_b_ids(),
            state: MatchState::Pending,
            result: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_finalized(&self) -> bool {
        self.state == MatchState::Finalized
    }

    /// Side a player was on, if they took part
    pub fn team_of(&self, player_id: &str) -> Option<Team> {
        if self.team_a.iter().any(|id| id == player_id) {
            Some(Team::A)
        } else if self.team_b.iter().any(|id| id == player_id) {
            Some(Team::B)
        } else {
            None
        }
    }

    pub fn players(&self, team: Team) -> &[PlayerId] {
        match team {
            Team::A => &self.team_a,
            Team::B => &self.team_b,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn split() -> TeamSplit {
        TeamSplit::new(
            (0..5).map(|i| RatedPlayer::new(format!("a{}", i), 1000)).collect(),
            (0..5).map(|i| RatedPlayer::new(format!("b{}", i), 900)).collect(),
        )
    }

    #[test]
    fn test_split_derives_sums() {
        let split = split();
        assert_eq!(split.sum_a, 5000);
        assert_eq!(split.sum_b, 4500);
        assert_eq!(split.diff, 500);
    }

    #[test]
    fn test_rating_change_floors_at_zero() {
        let change = RatingChange::apply("p".to_string(), 10, -24);
        assert_eq!(change.new_rating, 0);
        assert_eq!(change.delta, -10);

        let change = RatingChange::apply("p".to_string(), 1000, 16);
        assert_eq!(change.new_rating, 1016);
        assert_eq!(change.delta, 16);
    }

    #[test]
    fn test_pending_record_from_split() {
        let record = MatchRecord::pending(Uuid::new_v4(), "guild-1", &split());
        assert_eq!(record.state, MatchState::Pending);
        assert_eq!(record.community_id, "guild-1");
        assert!(!record.is_finalized());
        assert_eq!(record.team_of("a3"), Some(Team::A));
        assert_eq!(record.team_of("b0"), Some(Team::B));
        assert_eq!(record.team_of("zz"), None);
        assert_eq!(record.players(Team::B).len(), TEAM_SIZE);
    }

    #[test]
    fn test_team_serializes_as_letter() {
        assert_eq!(serde_json::to_string(&Team::A).unwrap(), "\"A\"");
        assert_eq!(
            serde_json::from_str::<MatchState>("\"finalized\"").unwrap(),
            MatchState::Finalized
        );
        assert_eq!(Team::A.opponent(), Team::B);
    }
}

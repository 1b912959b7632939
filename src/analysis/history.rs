//! Per-player rating progression across finalized matches

use crate::types::{MatchId, MatchRecord, Rating};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One finalized match from a player's point of view
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub match_id: MatchId,
    pub finalized_at: DateTime<Utc>,
    /// Rating the player held going into the match
    pub rating_at_match: Rating,
    /// Signed change actually applied
    pub rating_change: i64,
    pub won: bool,
}

/// Finalized matches a player took part in, newest first, at most `limit`
pub fn player_history(player_id: &str, matches: &[MatchRecord], limit: usize) -> Vec<HistoryEntry> {
    let mut entries: Vec<HistoryEntry> = matches
        .iter()
        .filter_map(|record| {
            let result = record.result.as_ref()?;
            let team = record.team_of(player_id)?;
            let change = result
                .rating_changes
                .iter()
                .find(|c| c.player_id == player_id)?;

            Some(HistoryEntry {
                match_id: record.match_id,
                finalized_at: result.finalized_at,
                rating_at_match: change.old_rating,
                rating_change: change.delta,
                won: team == result.winner,
            })
        })
        .collect();

    entries.sort_by(|a, b| b.finalized_at.cmp(&a.finalized_at));
    entries.truncate(limit);
    entries
}

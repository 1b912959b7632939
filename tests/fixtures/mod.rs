//! Shared fixtures for integration tests
#![allow(dead_code)]

use axum::body::Body;
use axum::http::{Request, Response};
use serde_json::Value;
use squad_balancer::config::AppConfig;
use squad_balancer::service::AppState;
use squad_balancer::types::{CommunityId, PlayerId, RatedPlayer, Rating};
use std::sync::Arc;

/// Ten players with spread-out ratings
pub const SPREAD_RATINGS: [Rating; 10] = [1520, 1480, 1310, 1290, 1105, 1100, 990, 940, 875, 610];

/// Community every seeded fixture player is linked in
pub const COMMUNITY: &str = "guild-1";

pub fn community() -> CommunityId {
    COMMUNITY.to_string()
}

/// Route under the fixture community, e.g. `community_uri("/leaderboard")`
pub fn community_uri(path: &str) -> String {
    format!("/communities/{}{}", COMMUNITY, path)
}

pub fn player_ids(count: usize) -> Vec<PlayerId> {
    (0..count).map(|i| format!("player{}", i)).collect()
}

pub fn roster(ratings: &[Rating]) -> Vec<RatedPlayer> {
    player_ids(ratings.len())
        .into_iter()
        .zip(ratings)
        .map(|(id, rating)| RatedPlayer::new(id, *rating))
        .collect()
}

/// Service state with the given players already linked and rated
pub fn seeded_state(ratings: &[Rating]) -> (Arc<AppState>, Vec<PlayerId>) {
    let state = AppState::new(AppConfig::default()).expect("default config is valid");
    let ids = player_ids(ratings.len());

    let storage = state.ratings();
    for (id, rating) in ids.iter().zip(ratings) {
        storage
            .link_player(&community(), id, None, None, None)
            .expect("link succeeds");
        storage
            .set_rating(&community(), id, *rating)
            .expect("player exists");
    }

    (Arc::new(state), ids)
}

pub fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .expect("valid request")
}

pub fn get_request(uri: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .body(Body::empty())
        .expect("valid request")
}

pub async fn read_json(response: Response<Body>) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("readable body");
    serde_json::from_slice(&bytes).expect("JSON body")
}

//! HTTP API
//!
//! JSON endpoints over [`AppState`], plus `/health` and `/metrics`.
//!
//! Player, leaderboard, generation and analysis routes live under
//! `/communities/{community_id}`. Match routes are global since each match
//! record carries its community.

use crate::error::BalancerError;
use crate::rating::{Division, RankTier};
use crate::service::app::AppState;
use crate::service::health::{HealthCheck, HealthStatus};
use crate::types::{CommunityId, MatchId, PlayerId, Rating, Team};
use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, error};

const DEFAULT_LEADERBOARD_LIMIT: usize = 20;
const DEFAULT_HISTORY_LIMIT: usize = 50;

/// Error returned by handlers, mapped to a status code and JSON body
#[derive(Debug)]
pub enum ApiError {
    Balancer(BalancerError),
    Internal(anyhow::Error),
}

impl From<BalancerError> for ApiError {
    fn from(err: BalancerError) -> Self {
        ApiError::Balancer(err)
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        ApiError::Internal(err)
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Balancer(BalancerError::InvalidInput { .. }) => StatusCode::BAD_REQUEST,
            ApiError::Balancer(
                BalancerError::PlayerNotFound { .. } | BalancerError::MatchNotFound { .. },
            ) => StatusCode::NOT_FOUND,
            ApiError::Balancer(BalancerError::AlreadyFinalized { .. }) => StatusCode::CONFLICT,
            ApiError::Balancer(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            ApiError::Balancer(e) => e.to_string(),
            ApiError::Internal(e) => format!("{:#}", e),
        };

        if status == StatusCode::INTERNAL_SERVER_ERROR {
            error!("Request failed: {}", message);
        } else {
            debug!("Request rejected ({}): {}", status, message);
        }

        (status, Json(json!({ "error": message }))).into_response()
    }
}

type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Deserialize)]
pub struct LinkRequest {
    pub player_id: PlayerId,
    pub display_name: Option<String>,
    pub tier: Option<String>,
    pub division: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SetRatingRequest {
    pub rating: i64,
}

#[derive(Debug, Deserialize)]
pub struct GenerateRequest {
    pub player_ids: Vec<PlayerId>,
}

#[derive(Debug, Deserialize)]
pub struct ResultRequest {
    pub winner: String,
}

#[derive(Debug, Deserialize)]
pub struct LimitQuery {
    pub limit: Option<usize>,
}

/// Create the router with every API endpoint
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(root_handler))
        .route("/health", get(health_handler))
        .route("/metrics", get(metrics_handler))
        .nest("/communities/{community_id}", community_routes())
        .route("/matches/{id}", get(match_handler))
        .route("/matches/{id}/result", post(result_handler))
        .route("/matches/{id}/cancel", post(cancel_handler))
        .with_state(state)
}

fn community_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/players/link", post(link_handler))
        .route("/players/{id}", get(player_handler))
        .route("/players/{id}/rating", put(set_rating_handler))
        .route("/players/{id}/history", get(history_handler))
        .route("/leaderboard", get(leaderboard_handler))
        .route("/teams/generate", post(generate_handler))
        .route("/analysis/accuracy", get(accuracy_handler))
}

async fn root_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(json!({
        "service": state.config().service.name,
        "version": crate::VERSION,
    }))
}

async fn health_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let health = HealthCheck::check(&state);
    let status = match health.status {
        HealthStatus::Healthy | HealthStatus::Degraded => StatusCode::OK,
        HealthStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
    };
    (status, Json(health))
}

async fn metrics_handler(State(state): State<Arc<AppState>>) -> ApiResult<Response> {
    let metrics = state.metrics();
    let body = metrics.render()?;
    Ok(([(header::CONTENT_TYPE, metrics.content_type())], body).into_response())
}

async fn link_handler(
    State(state): State<Arc<AppState>>,
    Path(community_id): Path<CommunityId>,
    Json(request): Json<LinkRequest>,
) -> ApiResult<Response> {
    let tier = request
        .tier
        .as_deref()
        .map(str::parse::<RankTier>)
        .transpose()?;
    let division = request
        .division
        .as_deref()
        .map(str::parse::<Division>)
        .transpose()?;

    let outcome = state.link_player(
        &community_id,
        &request.player_id,
        request.display_name,
        tier,
        division,
    )?;
    let status = if outcome.seeded {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };

    Ok((
        status,
        Json(json!({
            "community_id": outcome.entry.community_id,
            "player_id": outcome.entry.player_id,
            "rating": outcome.entry.rating,
            "seeded": outcome.seeded,
            "player": outcome.entry,
        })),
    )
        .into_response())
}

async fn player_handler(
    State(state): State<Arc<AppState>>,
    Path((community_id, player_id)): Path<(CommunityId, PlayerId)>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(state.player(&community_id, &player_id)?))
}

async fn set_rating_handler(
    State(state): State<Arc<AppState>>,
    Path((community_id, player_id)): Path<(CommunityId, PlayerId)>,
    Json(request): Json<SetRatingRequest>,
) -> ApiResult<impl IntoResponse> {
    let rating = Rating::try_from(request.rating).map_err(|_| {
        BalancerError::invalid_input(format!(
            "Rating must be between 0 and {}, got {}",
            Rating::MAX,
            request.rating
        ))
    })?;
    Ok(Json(state.set_rating(&community_id, &player_id, rating)?))
}

async fn history_handler(
    State(state): State<Arc<AppState>>,
    Path((community_id, player_id)): Path<(CommunityId, PlayerId)>,
    Query(query): Query<LimitQuery>,
) -> ApiResult<impl IntoResponse> {
    let limit = query.limit.unwrap_or(DEFAULT_HISTORY_LIMIT);
    let history = state.player_history(&community_id, &player_id, limit)?;
    Ok(Json(json!({
        "community_id": community_id,
        "player_id": player_id,
        "matches": history,
    })))
}

async fn leaderboard_handler(
    State(state): State<Arc<AppState>>,
    Path(community_id): Path<CommunityId>,
    Query(query): Query<LimitQuery>,
) -> ApiResult<impl IntoResponse> {
    let limit = query.limit.unwrap_or(DEFAULT_LEADERBOARD_LIMIT);
    Ok(Json(state.leaderboard(&community_id, limit)?))
}

async fn generate_handler(
    State(state): State<Arc<AppState>>,
    Path(community_id): Path<CommunityId>,
    Json(request): Json<GenerateRequest>,
) -> ApiResult<impl IntoResponse> {
    let generated = state.generate_teams(&community_id, &request.player_ids)?;
    let split = generated.split;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "match_id": generated.record.match_id,
            "community_id": generated.record.community_id,
            "state": generated.record.state,
            "team_a": split.team_a,
            "team_b": split.team_b,
            "sum_a": split.sum_a,
            "sum_b": split.sum_b,
            "diff": split.diff,
        })),
    ))
}

async fn match_handler(
    State(state): State<Arc<AppState>>,
    Path(match_id): Path<MatchId>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(state.get_match(&match_id)?))
}

async fn result_handler(
    State(state): State<Arc<AppState>>,
    Path(match_id): Path<MatchId>,
    Json(request): Json<ResultRequest>,
) -> ApiResult<impl IntoResponse> {
    let winner = match request.winner.trim().to_ascii_uppercase().as_str() {
        "A" => Team::A,
        "B" => Team::B,
        other => {
            return Err(BalancerError::invalid_input(format!(
                "Winner must be \"A\" or \"B\", got \"{}\"",
                other
            ))
            .into())
        }
    };

    let result = state.record_result(&match_id, winner)?;
    Ok(Json(json!({
        "match_id": match_id,
        "result": result,
    })))
}

async fn cancel_handler(
    State(state): State<Arc<AppState>>,
    Path(match_id): Path<MatchId>,
) -> ApiResult<impl IntoResponse> {
    state.cancel_match(&match_id)?;
    Ok(Json(state.get_match(&match_id)?))
}

async fn accuracy_handler(
    State(state): State<Arc<AppState>>,
    Path(community_id): Path<CommunityId>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(state.accuracy_report(&community_id)?))
}

use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::api::state::AppState;
use crate::api::ApiError;

/// Reject requests relayed by a reverse proxy; store writes are local operations.
pub(crate) fn require_local(headers: &HeaderMap) -> Result<(), ApiError> {
    if headers.contains_key("x-forwarded-for") || headers.contains_key("cf-connecting-ip") {
        return Err(ApiError::Forbidden(
            "Only available on localhost".to_string(),
        ));
    }
    Ok(())
}

#[derive(Debug, Serialize)]
pub struct RefreshResponse {
    pub players: usize,
    pub own_ranking: u32,
    pub completed_at: DateTime<Utc>,
}

/// Re-fetch all games and replace the served leaderboard.
pub async fn refresh(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<RefreshResponse>, ApiError> {
    require_local(&headers)?;

    let board = state.reload().await?;

    Ok(Json(RefreshResponse {
        players: board.ranked_opponents().len(),
        own_ranking: board.own_ranking(),
        completed_at: Utc::now(),
    }))
}

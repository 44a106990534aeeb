use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::api::routes::refresh::require_local;
use crate::api::state::AppState;
use crate::api::ApiError;

#[derive(Debug, Deserialize)]
pub struct DisplayNameRequest {
    pub display_name: String,
}

#[derive(Debug, Serialize)]
pub struct DisplayNameResponse {
    pub own_id: String,
    pub display_name: String,
    pub own_ranking: u32,
}

/// Change the signed-in player's nickname and serve the reloaded board.
pub async fn update_display_name(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<DisplayNameRequest>,
) -> Result<Json<DisplayNameResponse>, ApiError> {
    require_local(&headers)?;

    let board = state.rename(&body.display_name).await?;
    let display_name = board
        .opponent(board.own_id().as_str())
        .map(|me| me.display_name().to_string())
        .unwrap_or_default();

    Ok(Json(DisplayNameResponse {
        own_id: board.own_id().to_string(),
        display_name,
        own_ranking: board.own_ranking(),
    }))
}

use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::api::state::AppState;
use crate::api::{ApiError, Pagination, PaginationMeta};
use crate::models::Opponent;

#[derive(Debug, Deserialize)]
pub struct LeaderboardParams {
    pub q: Option<String>,
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

#[derive(Debug, Serialize)]
pub struct LeaderboardResponse {
    pub own_id: String,
    pub own_ranking: u32,
    pub query: String,
    pub opponents: Vec<Opponent>,
    pub pagination: PaginationMeta,
}

pub async fn get_leaderboard(
    State(state): State<AppState>,
    Query(params): Query<LeaderboardParams>,
) -> Result<Json<LeaderboardResponse>, ApiError> {
    let board = state.current().await?;
    let query = params.q.unwrap_or_default();
    let matches = board.filtered_opponents(query.trim());

    let pagination = Pagination::new(params.page, params.page_size);
    let meta = PaginationMeta::new(&pagination, matches.len() as u32);

    Ok(Json(LeaderboardResponse {
        own_id: board.own_id().to_string(),
        own_ranking: board.own_ranking(),
        query,
        opponents: pagination.slice(&matches).to_vec(),
        pagination: meta,
    }))
}

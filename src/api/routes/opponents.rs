use axum::extract::{Path, Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::api::state::AppState;
use crate::api::ApiError;
use crate::leaderboard::Navigation;
use crate::models::Opponent;

#[derive(Debug, Serialize)]
pub struct OpponentResponse {
    #[serde(flatten)]
    pub opponent: Opponent,
    /// Today's result against this opponent, if already played
    pub prior_result: Option<i64>,
}

pub async fn get_opponent(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<OpponentResponse>, ApiError> {
    let board = state.current().await?;
    let opponent = board
        .opponent(&id)
        .cloned()
        .ok_or_else(|| ApiError::NotFound(format!("opponent {}", id)))?;

    Ok(Json(OpponentResponse {
        prior_result: board.prior_result(&id),
        opponent,
    }))
}

#[derive(Debug, Deserialize)]
pub struct PlayParams {
    /// Answer to the replay prompt
    #[serde(default)]
    pub confirm: bool,
}

#[derive(Debug, Serialize)]
pub struct PlayResponse {
    #[serde(flatten)]
    pub navigation: Navigation,
    /// Editor route to open, when the game may start
    pub route: Option<String>,
}

pub async fn play(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(params): Query<PlayParams>,
) -> Result<Json<PlayResponse>, ApiError> {
    let board = state.current().await?;
    let navigation = board.decide_navigation(&id);
    let route = board.confirm(&id, navigation, params.confirm);

    Ok(Json(PlayResponse { navigation, route }))
}

#[cfg(test)]
mod tests {
    use crate::api::build_router;
    use crate::api::routes::test_support::{get_json, sample_days, setup_state};
    use axum::http::StatusCode;

    #[tokio::test]
    async fn test_get_opponent() {
        let tmp = tempfile::tempdir().unwrap();
        let app = build_router(setup_state(&tmp, &mut sample_days()));

        let (status, json) = get_json(app, "/api/opponents/zoe").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["webcomId"], "zoe");
        assert_eq!(json["prior_result"], 1);
    }

    #[tokio::test]
    async fn test_never_connected_opponent_not_found() {
        let tmp = tempfile::tempdir().unwrap();
        let app = build_router(setup_state(&tmp, &mut sample_days()));

        let (status, json) = get_json(app, "/api/opponents/ghost").await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json["error"]["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn test_play_self_blocked() {
        let tmp = tempfile::tempdir().unwrap();
        let app = build_router(setup_state(&tmp, &mut sample_days()));

        let (status, json) = get_json(app, "/api/opponents/me/play?confirm=true").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["decision"], "blocked");
        assert!(json["route"].is_null());
    }

    #[tokio::test]
    async fn test_play_replay_needs_confirmation() {
        let tmp = tempfile::tempdir().unwrap();
        let state = setup_state(&tmp, &mut sample_days());

        let (_, json) = get_json(build_router(state.clone()), "/api/opponents/zoe/play").await;
        assert_eq!(json["decision"], "requires_confirmation");
        assert_eq!(json["prior_result"], 1);
        assert!(json["route"].is_null());

        let (_, json) = get_json(build_router(state), "/api/opponents/zoe/play?confirm=true").await;
        assert_eq!(json["route"], "/code/online/zoe");
    }

    #[tokio::test]
    async fn test_play_yesterday_opponent_proceeds() {
        let tmp = tempfile::tempdir().unwrap();
        let app = build_router(setup_state(&tmp, &mut sample_days()));

        let (_, json) = get_json(app, "/api/opponents/bob/play").await;

        assert_eq!(json["decision"], "proceed_direct");
        assert_eq!(json["route"], "/code/online/bob");
    }
}

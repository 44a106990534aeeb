pub mod leaderboard;
pub mod opponents;
pub mod profile;
pub mod refresh;

use axum::Json;
use serde_json::{json, Value};

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

//! Opponent model - one row of the online leaderboard.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::WebcomId;

/// Public identity a player chose when connecting.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDisplay {
    /// Nickname shown on the leaderboard
    #[serde(default)]
    pub display_name: String,

    /// Avatar reference, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,

    /// Any other metadata the backend attaches
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl UserDisplay {
    pub fn new(display_name: impl Into<String>) -> Self {
        Self {
            display_name: display_name.into(),
            avatar: None,
            extra: BTreeMap::new(),
        }
    }
}

/// A player as seen from the leaderboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Opponent {
    /// Unique identifier
    pub webcom_id: WebcomId,

    /// Latest known identity; `None` if the player never connected
    pub user_display: Option<UserDisplay>,

    /// Accumulated score
    pub points: i64,

    /// 1-based rank, 0 until the ranking pass ran
    pub ranking: u32,

    /// Most recent day this player recorded games, 0 if never
    pub last_seen: i64,
}

impl Opponent {
    pub fn new(
        webcom_id: WebcomId,
        user_display: Option<UserDisplay>,
        points: i64,
        last_seen: i64,
    ) -> Self {
        Self {
            webcom_id,
            user_display,
            points,
            ranking: 0,
            last_seen,
        }
    }

    /// Name to show and search on; empty for never-connected players.
    pub fn display_name(&self) -> &str {
        self.user_display
            .as_ref()
            .map(|u| u.display_name.as_str())
            .unwrap_or("")
    }

    pub fn is_connected(&self) -> bool {
        self.user_display.is_some()
    }
}

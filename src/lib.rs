//! # CodingBall Ranking
//!
//! Online opponents leaderboard for a block-based football coding game.
//!
//! ## Architecture
//!
//! - **models**: Core data structures (daily game recaps, opponents, ids)
//! - **calculate**: Score aggregation, ranking and name search
//! - **leaderboard**: Ranked board and the play/replay decision
//! - **source**: Data source contract and the store-backed implementation
//! - **storage**: Local JSONL game store
//! - **api**: REST API endpoints
//! - **config**: Configuration loading and validation

pub mod api;
pub mod calculate;
pub mod config;
pub mod leaderboard;
pub mod models;
pub mod source;
pub mod storage;

pub use leaderboard::{Leaderboard, Navigation};
pub use models::*;

use std::time::Duration;

/// Parse a human-friendly duration string (e.g., "6h", "30m", "90s").
pub fn parse_duration(s: &str) -> Option<Duration> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }

    let (num_str, multiplier) = if let Some(n) = s.strip_suffix('h') {
        (n, 3600)
    } else if let Some(n) = s.strip_suffix('m') {
        (n, 60)
    } else if let Some(n) = s.strip_suffix('s') {
        (n, 1)
    } else {
        (s, 1)
    };

    let num: u64 = num_str.parse().ok()?;
    Some(Duration::from_secs(num.checked_mul(multiplier)?))
}

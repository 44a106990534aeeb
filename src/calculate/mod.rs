//! Leaderboard calculation engine.
//!
//! Turns the raw per-day game recaps into a ranked leaderboard:
//! - Score aggregation across all days and pairings
//! - Removal of players who never connected
//! - Sorting and competition ranking
//! - Diacritic-insensitive name search
//!
//! Everything here is pure and synchronous; the passes must run in that order.

mod aggregate;
mod ranking;
mod search;

pub use aggregate::{aggregate_scores, drop_never_connected, Aggregation};
pub use ranking::{compute_rankings, leaderboard_order};
pub use search::{filter_by_name, normalize_search_text};

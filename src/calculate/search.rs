//! Name search over the leaderboard.

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

use crate::models::Opponent;

/// Case-fold and strip diacritics so "Café" and "cafe" compare equal.
pub fn normalize_search_text(text: &str) -> String {
    text.to_lowercase()
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .collect()
}

/// Opponents whose display name contains `query`, in their original order.
///
/// An empty query matches everyone.
pub fn filter_by_name(opponents: &[Opponent], query: &str) -> Vec<Opponent> {
    if query.is_empty() {
        return opponents.to_vec();
    }

    let needle = normalize_search_text(query);
    opponents
        .iter()
        .filter(|o| normalize_search_text(o.display_name()).contains(&needle))
        .cloned()
        .collect()
}

//! Leaderboard ordering and competition ranks.

use std::cmp::Ordering;

use crate::models::{Opponent, WebcomId};

/// Leaderboard order: points, then most recently seen, then id, all descending.
pub fn leaderboard_order(a: &Opponent, b: &Opponent) -> Ordering {
    b.points
        .cmp(&a.points)
        .then_with(|| b.last_seen.cmp(&a.last_seen))
        .then_with(|| b.webcom_id.cmp(&a.webcom_id))
}

/// Sort `opponents` into leaderboard order and assign "1224" ranks.
///
/// Players with equal points share a rank; the next distinct score skips
/// ahead by the size of the tied group. Returns the rank of `own_id`, or 0
/// if that player is not on the board.
pub fn compute_rankings(opponents: &mut [Opponent], own_id: &WebcomId) -> u32 {
    opponents.sort_by(leaderboard_order);

    let mut previous_points: Option<i64> = None;
    let mut current_rank = 0u32;
    let mut tied_count = 1u32;

    for opponent in opponents.iter_mut() {
        if previous_points != Some(opponent.points) {
            current_rank += tied_count;
            tied_count = 1;
            previous_points = Some(opponent.points);
        } else {
            tied_count += 1;
        }
        opponent.ranking = current_rank;
    }

    opponents
        .iter()
        .find(|o| &o.webcom_id == own_id)
        .map(|o| o.ranking)
        .unwrap_or(0)
}

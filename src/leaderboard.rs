//! Ranked leaderboard and the play/replay decision built on top of it.

use serde::Serialize;
use tracing::info;

use crate::calculate::{aggregate_scores, compute_rankings, drop_never_connected, filter_by_name};
use crate::models::{DailyGames, DayAndGames, Opponent, WebcomId};

/// What the caller should do when the player picks an opponent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum Navigation {
    /// Playing against yourself is not allowed
    Blocked,
    /// No game against this opponent today, go straight to the editor
    ProceedDirect,
    /// Already played today; ask before replaying
    RequiresConfirmation { prior_result: i64 },
}

/// Result of one full aggregation + filter + ranking pass.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Leaderboard {
    own_id: WebcomId,
    own_ranking: u32,
    ranked_opponents: Vec<Opponent>,
    my_games_today: DailyGames,
    search_term: String,
    filtered_opponents: Vec<Opponent>,
}

impl Leaderboard {
    /// Build the leaderboard from scratch.
    ///
    /// `today` is the current UTC day-timestamp, used to pick the signed-in
    /// player's games of the day.
    pub fn build(days: &[DayAndGames], own_id: &WebcomId, today: i64) -> Self {
        let aggregation = aggregate_scores(days, own_id, today);
        let mut ranked_opponents = drop_never_connected(aggregation.opponents);
        let own_ranking = compute_rankings(&mut ranked_opponents, own_id);

        info!(
            "Ranked {} players, own ranking {}",
            ranked_opponents.len(),
            own_ranking
        );

        Self {
            own_id: own_id.clone(),
            own_ranking,
            filtered_opponents: ranked_opponents.clone(),
            ranked_opponents,
            my_games_today: aggregation.my_games_today,
            search_term: String::new(),
        }
    }

    pub fn own_id(&self) -> &WebcomId {
        &self.own_id
    }

    /// Rank of the signed-in player, 0 if not on the board.
    pub fn own_ranking(&self) -> u32 {
        self.own_ranking
    }

    /// All connected players in leaderboard order.
    pub fn ranked_opponents(&self) -> &[Opponent] {
        &self.ranked_opponents
    }

    pub fn opponent(&self, id: &str) -> Option<&Opponent> {
        self.ranked_opponents
            .iter()
            .find(|o| o.webcom_id.as_str() == id)
    }

    /// Players whose name matches `query`, without touching the stored search.
    pub fn filtered_opponents(&self, query: &str) -> Vec<Opponent> {
        filter_by_name(&self.ranked_opponents, query)
    }

    pub fn search_term(&self) -> &str {
        &self.search_term
    }

    /// Store a new search term and return the recomputed filtered view.
    pub fn set_search_term(&mut self, term: &str) -> &[Opponent] {
        self.search_term = term.to_string();
        self.filtered_opponents = filter_by_name(&self.ranked_opponents, term);
        &self.filtered_opponents
    }

    /// Filtered view for the current search term.
    pub fn current_view(&self) -> &[Opponent] {
        &self.filtered_opponents
    }

    /// Today's result against `opponent_id`, if the signed-in player already played.
    pub fn prior_result(&self, opponent_id: &str) -> Option<i64> {
        self.my_games_today.get(opponent_id).copied()
    }

    pub fn decide_navigation(&self, opponent_id: &str) -> Navigation {
        if opponent_id == self.own_id.as_str() {
            return Navigation::Blocked;
        }
        match self.prior_result(opponent_id) {
            Some(prior_result) => Navigation::RequiresConfirmation { prior_result },
            None => Navigation::ProceedDirect,
        }
    }

    /// Resolve a decision into the editor route to open, if any.
    ///
    /// `confirmed` is the player's answer to the replay prompt and is only
    /// consulted when the decision asked for one.
    pub fn confirm(&self, opponent_id: &str, decision: Navigation, confirmed: bool) -> Option<String> {
        match decision {
            Navigation::Blocked => None,
            Navigation::ProceedDirect => Some(editor_route(opponent_id)),
            Navigation::RequiresConfirmation { .. } if confirmed => Some(editor_route(opponent_id)),
            Navigation::RequiresConfirmation { .. } => None,
        }
    }
}

/// Block editor route for an online game against `opponent_id`.
pub fn editor_route(opponent_id: &str) -> String {
    format!("/code/online/{}", opponent_id)
}

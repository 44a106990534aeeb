//! Score aggregation over the daily game recaps.

use std::collections::HashMap;

use tracing::debug;

use crate::models::{opponent_points, DailyGames, DayAndGames, Opponent, WebcomId};

/// Output of the aggregation pass.
#[derive(Debug, Clone, Default)]
pub struct Aggregation {
    /// Every id encountered, including never-connected placeholders
    pub opponents: HashMap<WebcomId, Opponent>,

    /// The acting user's own results for today, keyed by opponent
    pub my_games_today: DailyGames,
}

/// Sum points for every player appearing in `days`.
///
/// Each recorded game credits the acting user with the result code and the
/// opponent with `2 - code`. A player's display and `last_seen` come from the
/// most recent day on which they recorded games themselves. Players only ever
/// seen as a target keep `user_display = None` and `last_seen = 0`.
pub fn aggregate_scores(days: &[DayAndGames], own_id: &WebcomId, today: i64) -> Aggregation {
    let mut opponents: HashMap<WebcomId, Opponent> = HashMap::new();
    let mut my_games_today: Option<DailyGames> = None;

    for day in days {
        let day_ts = day.day_timestamp;

        // First record for today wins, even if it holds nothing of ours
        if day_ts == today && my_games_today.is_none() {
            my_games_today = Some(
                day.games
                    .get(own_id)
                    .and_then(|recap| recap.daily_games.clone())
                    .unwrap_or_default(),
            );
        }

        for (user_id, recap) in &day.games {
            let user = opponents
                .entry(user_id.clone())
                .or_insert_with(|| Opponent::new(user_id.clone(), recap.user_display.clone(), 0, day_ts));
            if day_ts > user.last_seen {
                user.last_seen = day_ts;
                user.user_display = recap.user_display.clone();
            }

            let Some(daily_games) = &recap.daily_games else {
                continue;
            };

            let mut own_delta = 0;
            for (opponent_id, &result) in daily_games {
                let delta = opponent_points(result);
                opponents
                    .entry(opponent_id.clone())
                    .and_modify(|opp| opp.points += delta)
                    .or_insert_with(|| Opponent::new(opponent_id.clone(), None, delta, 0));
                own_delta += result;
            }

            if let Some(user) = opponents.get_mut(user_id) {
                user.points += own_delta;
            }
        }
    }

    debug!(
        "Aggregated {} days into {} players",
        days.len(),
        opponents.len()
    );

    Aggregation {
        opponents,
        my_games_today: my_games_today.unwrap_or_default(),
    }
}

/// Drop players who were challenged but never connected.
///
/// Must run after [`aggregate_scores`]: their games still count towards the
/// acting users' totals, they just don't get a leaderboard row.
pub fn drop_never_connected(opponents: HashMap<WebcomId, Opponent>) -> Vec<Opponent> {
    opponents
        .into_values()
        .filter(Opponent::is_connected)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{UserDailyRecap, UserDisplay, DRAW, LOSS, WIN};

    fn recap(name: &str) -> UserDailyRecap {
        UserDailyRecap::new(Some(UserDisplay::new(name)))
    }

    fn points(agg: &Aggregation, id: &str) -> i64 {
        agg.opponents[id].points
    }

    #[test]
    fn test_two_day_example() {
        let days = vec![
            DayAndGames::new(1000).with_recap("A", recap("A").with_game("B", WIN)),
            DayAndGames::new(1001).with_recap("A", recap("A").with_game("B", LOSS)),
        ];

        let agg = aggregate_scores(&days, &"A".into(), 1001);

        assert_eq!(points(&agg, "A"), 2);
        assert_eq!(points(&agg, "B"), 2);
        assert_eq!(agg.opponents["A"].last_seen, 1001);
        assert_eq!(agg.opponents["B"].last_seen, 0);
        assert!(agg.opponents["B"].user_display.is_none());
    }

    #[test]
    fn test_every_game_hands_out_two_points() {
        let days = vec![DayAndGames::new(7)
            .with_recap("A", recap("A").with_game("B", WIN).with_game("C", DRAW))
            .with_recap("B", recap("B").with_game("C", LOSS))];

        let agg = aggregate_scores(&days, &"A".into(), 7);
        let total: i64 = agg.opponents.values().map(|o| o.points).sum();
        assert_eq!(total, 2 * 3);
    }

    #[test]
    fn test_most_recent_day_wins_display() {
        let days = vec![
            DayAndGames::new(20).with_recap("A", recap("New name")),
            DayAndGames::new(10).with_recap("A", recap("Old name")),
        ];

        let agg = aggregate_scores(&days, &"x".into(), 0);
        let a = &agg.opponents["A"];
        assert_eq!(a.last_seen, 20);
        assert_eq!(a.display_name(), "New name");
    }

    #[test]
    fn test_placeholder_gets_display_when_later_seen_acting() {
        let days = vec![
            DayAndGames::new(10).with_recap("A", recap("A").with_game("B", DRAW)),
            DayAndGames::new(11).with_recap("B", recap("Bee")),
        ];

        let agg = aggregate_scores(&days, &"A".into(), 11);
        let b = &agg.opponents["B"];
        assert_eq!(b.points, 1);
        assert_eq!(b.last_seen, 11);
        assert_eq!(b.display_name(), "Bee");
    }

    #[test]
    fn test_my_games_today_captured() {
        let days = vec![
            DayAndGames::new(10).with_recap("me", recap("me").with_game("B", WIN)),
            DayAndGames::new(11).with_recap("me", recap("me").with_game("C", DRAW)),
        ];

        let agg = aggregate_scores(&days, &"me".into(), 11);
        assert_eq!(agg.my_games_today.len(), 1);
        assert_eq!(agg.my_games_today[&WebcomId::from("C")], DRAW);
    }

    #[test]
    fn test_my_games_today_ignores_other_users() {
        let days = vec![DayAndGames::new(11).with_recap("other", recap("o").with_game("me", WIN))];
        let agg = aggregate_scores(&days, &"me".into(), 11);
        assert!(agg.my_games_today.is_empty());
    }

    #[test]
    fn test_my_games_today_from_first_record_of_the_day() {
        let days = vec![
            DayAndGames::new(11).with_recap("other", recap("o").with_game("B", WIN)),
            DayAndGames::new(11).with_recap("me", recap("me").with_game("C", DRAW)),
        ];

        let agg = aggregate_scores(&days, &"me".into(), 11);
        assert!(agg.my_games_today.is_empty());
        // both records still count towards the scores
        assert_eq!(points(&agg, "me"), 1);
        assert_eq!(points(&agg, "C"), 1);
    }

    #[test]
    fn test_missing_daily_games_counts_as_no_games() {
        let days = vec![DayAndGames::new(3).with_recap("A", recap("A"))];
        let agg = aggregate_scores(&days, &"A".into(), 3);
        assert_eq!(points(&agg, "A"), 0);
        assert!(agg.my_games_today.is_empty());
    }

    #[test]
    fn test_empty_input() {
        let agg = aggregate_scores(&[], &"A".into(), 3);
        assert!(agg.opponents.is_empty());
        assert!(agg.my_games_today.is_empty());
    }

    #[test]
    fn test_drop_never_connected_keeps_their_contribution() {
        let days = vec![DayAndGames::new(5).with_recap("A", recap("A").with_game("ghost", LOSS))];

        let agg = aggregate_scores(&days, &"A".into(), 5);
        let kept = drop_never_connected(agg.opponents);

        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].webcom_id.as_str(), "A");
        assert_eq!(kept[0].points, 2);
    }
}

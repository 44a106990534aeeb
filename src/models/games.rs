//! Daily game recaps as stored by the realtime backend.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use super::{UserDisplay, WebcomId};

/// Milliseconds in one UTC day.
pub const MS_PER_DAY: i64 = 86_400_000;

/// Result code: the acting user won.
pub const WIN: i64 = 0;
/// Result code: draw.
pub const DRAW: i64 = 1;
/// Result code: the acting user lost.
pub const LOSS: i64 = 2;

/// Points credited to the opponent for a game recorded with `result_code`.
///
/// The acting user is credited `result_code` itself, so every game hands
/// out exactly two points in total.
pub fn opponent_points(result_code: i64) -> i64 {
    2 - result_code
}

/// Truncate an instant (epoch milliseconds) to its UTC midnight.
pub fn utc_day_timestamp(millis: i64) -> i64 {
    millis.div_euclid(MS_PER_DAY) * MS_PER_DAY
}

/// Calendar date of a day-timestamp, if it is representable.
pub fn date_of_day_timestamp(day_timestamp: i64) -> Option<NaiveDate> {
    DateTime::<Utc>::from_timestamp_millis(day_timestamp).map(|dt| dt.date_naive())
}

/// Results of one user's games for a day, keyed by opponent id.
pub type DailyGames = BTreeMap<WebcomId, i64>;

/// What a single user did on a given day.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDailyRecap {
    /// Identity snapshot as of that day
    #[serde(default)]
    pub user_display: Option<UserDisplay>,

    /// Games played that day; absent or malformed means no games
    #[serde(default, deserialize_with = "lenient_daily_games")]
    pub daily_games: Option<DailyGames>,
}

impl UserDailyRecap {
    pub fn new(user_display: Option<UserDisplay>) -> Self {
        Self {
            user_display,
            daily_games: None,
        }
    }

    /// Record a game against `opponent` with the given result code.
    pub fn with_game(mut self, opponent: impl Into<WebcomId>, result_code: i64) -> Self {
        self.daily_games
            .get_or_insert_with(DailyGames::new)
            .insert(opponent.into(), result_code);
        self
    }
}

/// All recaps for one UTC day.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DayAndGames {
    /// UTC midnight of the day, in epoch milliseconds
    #[serde(deserialize_with = "numeric_or_string")]
    pub day_timestamp: i64,

    /// Recaps keyed by acting user id
    #[serde(default)]
    pub games: BTreeMap<WebcomId, UserDailyRecap>,
}

impl DayAndGames {
    pub fn new(day_timestamp: i64) -> Self {
        Self {
            day_timestamp,
            games: BTreeMap::new(),
        }
    }

    pub fn with_recap(mut self, user: impl Into<WebcomId>, recap: UserDailyRecap) -> Self {
        self.games.insert(user.into(), recap);
        self
    }
}

/// Backend keys days by their timestamp, so it may come back as a string.
fn numeric_or_string<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Int(i64),
        Float(f64),
        Text(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Int(v) => Ok(v),
        Raw::Float(v) => Ok(v as i64),
        Raw::Text(s) => s
            .trim()
            .parse::<i64>()
            .map_err(|e| serde::de::Error::custom(format!("invalid day timestamp {:?}: {}", s, e))),
    }
}

fn lenient_daily_games<'de, D>(deserializer: D) -> Result<Option<DailyGames>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    let Some(Value::Object(entries)) = value else {
        return Ok(None);
    };

    // Results that are not a known code are dropped like any other garbage
    let games = entries
        .into_iter()
        .filter_map(|(opponent, result)| {
            result
                .as_i64()
                .filter(|code| (WIN..=LOSS).contains(code))
                .map(|code| (WebcomId::from(opponent), code))
        })
        .collect();
    Ok(Some(games))
}

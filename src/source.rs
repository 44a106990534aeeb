//! Online data source feeding the leaderboard.
//!
//! The realtime backend itself is out of reach here; this module defines the
//! contract the leaderboard consumes and a store-backed implementation that
//! also enforces the retention window on old days.

use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::Utc;
use thiserror::Error;
use tracing::info;

use crate::leaderboard::Leaderboard;
use crate::models::{utc_day_timestamp, DayAndGames, UserDisplay, WebcomId, MS_PER_DAY};
use crate::storage::{read_games, write_games, StorageConfig, StorageError};

/// Days of history kept by default.
pub const DEFAULT_RETENTION_DAYS: u32 = 15;

/// Errors raised while fetching games.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Not signed in")]
    NotSignedIn,

    #[error("Invalid display name: {0:?}")]
    InvalidDisplayName(String),

    #[error("Source unavailable: {0}")]
    Unavailable(String),
}

/// Wall clock, injectable for tests.
pub trait Clock: Send + Sync {
    /// Current instant in epoch milliseconds.
    fn now_millis(&self) -> i64;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> i64 {
        Utc::now().timestamp_millis()
    }
}

/// Clock frozen at a given instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub i64);

impl Clock for FixedClock {
    fn now_millis(&self) -> i64 {
        self.0
    }
}

/// Where the leaderboard gets its data from.
#[async_trait]
pub trait OnlineDataSource: Send + Sync {
    /// Every retained day of games.
    async fn fetch_all_games(&self) -> Result<Vec<DayAndGames>, SourceError>;

    /// Today's UTC day-timestamp.
    fn current_utc_day_timestamp(&self) -> i64;

    /// Identity of the signed-in player.
    fn own_id(&self) -> &WebcomId;

    /// Change the signed-in player's nickname.
    ///
    /// Callers reload afterwards to see the new name on the leaderboard.
    async fn update_display_name(&self, nickname: &str) -> Result<(), SourceError>;
}

/// Data source backed by the local JSONL game store.
pub struct JsonlDataSource {
    storage: StorageConfig,
    own_id: WebcomId,
    retention_days: u32,
    clock: Arc<dyn Clock>,
    // Held across every read-modify-write of the store
    store_lock: Mutex<()>,
}

impl JsonlDataSource {
    pub fn new(storage: StorageConfig, own_id: WebcomId) -> Self {
        Self {
            storage,
            own_id,
            retention_days: DEFAULT_RETENTION_DAYS,
            clock: Arc::new(SystemClock),
            store_lock: Mutex::new(()),
        }
    }

    pub fn with_retention_days(mut self, days: u32) -> Self {
        self.retention_days = days;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Oldest day-timestamp still inside the retention window.
    pub fn retention_cutoff(&self) -> i64 {
        let today = utc_day_timestamp(self.clock.now_millis());
        today - i64::from(self.retention_days.saturating_sub(1)) * MS_PER_DAY
    }

    fn lock_store(&self) -> MutexGuard<'_, ()> {
        // The guarded data is the file on disk; a panicked holder leaves it intact
        self.store_lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Remove days that fell out of the retention window from the store.
    ///
    /// Returns the retained days and how many were dropped.
    pub fn prune(&self) -> Result<(Vec<DayAndGames>, usize), SourceError> {
        let _guard = self.lock_store();
        let cutoff = self.retention_cutoff();
        let all = read_games(&self.storage)?;
        let total = all.len();

        let mut kept: Vec<DayAndGames> = all
            .into_iter()
            .filter(|d| d.day_timestamp >= cutoff)
            .collect();
        let removed = total - kept.len();

        if removed > 0 {
            write_games(&self.storage, &mut kept)?;
            info!("Removed {} days older than the retention window", removed);
        }

        Ok((kept, removed))
    }

    /// Store `nickname` as the signed-in player's display for today.
    ///
    /// Avatar and other metadata carry over from the latest known display.
    pub fn rename(&self, nickname: &str) -> Result<(), SourceError> {
        if self.own_id.is_empty() {
            return Err(SourceError::NotSignedIn);
        }
        let nickname = nickname.trim();
        if nickname.is_empty() {
            return Err(SourceError::InvalidDisplayName(nickname.to_string()));
        }

        let _guard = self.lock_store();
        let today = utc_day_timestamp(self.clock.now_millis());
        let mut days = read_games(&self.storage)?;

        let latest_display = days
            .iter()
            .filter_map(|d| {
                let display = d.games.get(&self.own_id)?.user_display.as_ref()?;
                Some((d.day_timestamp, display))
            })
            .max_by_key(|(ts, _)| *ts)
            .map(|(_, display)| display.clone());

        let idx = match days.iter().position(|d| d.day_timestamp == today) {
            Some(idx) => idx,
            None => {
                days.push(DayAndGames::new(today));
                days.len() - 1
            }
        };
        let recap = days[idx].games.entry(self.own_id.clone()).or_default();
        let mut display = recap
            .user_display
            .take()
            .or(latest_display)
            .unwrap_or_else(|| UserDisplay::new(""));
        display.display_name = nickname.to_string();
        recap.user_display = Some(display);

        write_games(&self.storage, &mut days)?;
        info!("Display name of {} set to {:?}", self.own_id, nickname);
        Ok(())
    }
}

#[async_trait]
impl OnlineDataSource for JsonlDataSource {
    async fn fetch_all_games(&self) -> Result<Vec<DayAndGames>, SourceError> {
        if self.own_id.is_empty() {
            return Err(SourceError::NotSignedIn);
        }
        let (days, _) = self.prune()?;
        Ok(days)
    }

    fn current_utc_day_timestamp(&self) -> i64 {
        utc_day_timestamp(self.clock.now_millis())
    }

    fn own_id(&self) -> &WebcomId {
        &self.own_id
    }

    async fn update_display_name(&self, nickname: &str) -> Result<(), SourceError> {
        self.rename(nickname)
    }
}

/// Fetch everything from `source` and build a fresh leaderboard.
///
/// Fetch errors are returned as-is; the leaderboard is only built from a
/// complete data set.
pub async fn load_leaderboard(source: &dyn OnlineDataSource) -> Result<Leaderboard, SourceError> {
    let days = source.fetch_all_games().await?;
    let today = source.current_utc_day_timestamp();
    Ok(Leaderboard::build(&days, source.own_id(), today))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{UserDailyRecap, UserDisplay, WIN};
    use crate::storage::append_day;
    use tempfile::TempDir;

    const TODAY: i64 = 19_000 * MS_PER_DAY;

    fn day(offset_days: i64) -> DayAndGames {
        DayAndGames::new(TODAY - offset_days * MS_PER_DAY).with_recap(
            "me",
            UserDailyRecap::new(Some(UserDisplay::new("Me"))).with_game("bob", WIN),
        )
    }

    fn source(temp_dir: &TempDir, own_id: &str) -> JsonlDataSource {
        JsonlDataSource::new(StorageConfig::new(temp_dir.path().to_path_buf()), own_id.into())
            .with_clock(Arc::new(FixedClock(TODAY + 5 * 3_600_000)))
    }

    #[test]
    fn test_current_day_is_truncated() {
        let temp_dir = TempDir::new().unwrap();
        assert_eq!(source(&temp_dir, "me").current_utc_day_timestamp(), TODAY);
    }

    #[test]
    fn test_retention_cutoff_keeps_fifteen_days() {
        let temp_dir = TempDir::new().unwrap();
        let src = source(&temp_dir, "me");
        assert_eq!(src.retention_cutoff(), TODAY - 14 * MS_PER_DAY);
    }

    #[tokio::test]
    async fn test_fetch_prunes_old_days() {
        let temp_dir = TempDir::new().unwrap();
        let src = source(&temp_dir, "me");
        let storage = StorageConfig::new(temp_dir.path().to_path_buf());
        for offset in [20, 15, 14, 0] {
            append_day(&storage, &day(offset)).unwrap();
        }

        let days = src.fetch_all_games().await.unwrap();
        let stamps: Vec<_> = days.iter().map(|d| d.day_timestamp).collect();
        assert_eq!(stamps, vec![TODAY - 14 * MS_PER_DAY, TODAY]);

        // Store was rewritten too
        assert_eq!(read_games(&storage).unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_fetch_without_identity_fails() {
        let temp_dir = TempDir::new().unwrap();
        let src = source(&temp_dir, "");
        assert!(matches!(
            src.fetch_all_games().await,
            Err(SourceError::NotSignedIn)
        ));
    }

    #[tokio::test]
    async fn test_load_leaderboard_uses_today() {
        let temp_dir = TempDir::new().unwrap();
        let src = source(&temp_dir, "bob");
        let storage = StorageConfig::new(temp_dir.path().to_path_buf());
        append_day(&storage, &day(0)).unwrap();

        let board = load_leaderboard(&src).await.unwrap();

        // bob never connected, so only "me" is ranked
        assert_eq!(board.ranked_opponents().len(), 1);
        assert_eq!(board.own_ranking(), 0);
    }

    #[tokio::test]
    async fn test_load_leaderboard_empty_store() {
        let temp_dir = TempDir::new().unwrap();
        let board = load_leaderboard(&source(&temp_dir, "me")).await.unwrap();
        assert!(board.ranked_opponents().is_empty());
        assert_eq!(board.own_ranking(), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_loads_share_one_store() {
        let temp_dir = TempDir::new().unwrap();
        let storage = StorageConfig::new(temp_dir.path().to_path_buf());
        let mut days: Vec<DayAndGames> = (0..400).map(day).collect();
        write_games(&storage, &mut days).unwrap();
        let src = Arc::new(source(&temp_dir, "me"));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let src = Arc::clone(&src);
                tokio::spawn(async move { load_leaderboard(src.as_ref()).await })
            })
            .collect();

        for handle in handles {
            let board = handle.await.unwrap().unwrap();
            assert_eq!(board.ranked_opponents().len(), 1);
        }
        assert_eq!(read_games(&storage).unwrap().len(), 15);
    }

    #[tokio::test]
    async fn test_rename_shows_after_reload() {
        let temp_dir = TempDir::new().unwrap();
        let src = source(&temp_dir, "me");
        let storage = StorageConfig::new(temp_dir.path().to_path_buf());
        let mut display = UserDisplay::new("Me");
        display.avatar = Some("robot".to_string());
        append_day(
            &storage,
            &DayAndGames::new(TODAY - MS_PER_DAY)
                .with_recap("me", UserDailyRecap::new(Some(display)).with_game("bob", WIN)),
        )
        .unwrap();

        src.update_display_name("  Zizou ").await.unwrap();
        let board = load_leaderboard(&src).await.unwrap();

        let me = board.opponent("me").unwrap();
        assert_eq!(me.display_name(), "Zizou");
        assert_eq!(me.last_seen, TODAY);
        assert_eq!(me.user_display.as_ref().unwrap().avatar.as_deref(), Some("robot"));
        assert_eq!(board.filtered_opponents("zizou").len(), 1);
    }

    #[tokio::test]
    async fn test_rename_keeps_todays_games() {
        let temp_dir = TempDir::new().unwrap();
        let src = source(&temp_dir, "me");
        let storage = StorageConfig::new(temp_dir.path().to_path_buf());
        append_day(&storage, &day(0)).unwrap();

        src.rename("Renamed").unwrap();

        let stored = read_games(&storage).unwrap();
        assert_eq!(stored.len(), 1);
        let recap = &stored[0].games[&WebcomId::from("me")];
        assert_eq!(recap.user_display.as_ref().unwrap().display_name, "Renamed");
        assert_eq!(recap.daily_games.as_ref().unwrap()[&WebcomId::from("bob")], WIN);
    }

    #[test]
    fn test_rename_rejects_blank_name() {
        let temp_dir = TempDir::new().unwrap();
        assert!(matches!(
            source(&temp_dir, "me").rename("   "),
            Err(SourceError::InvalidDisplayName(_))
        ));
        assert!(matches!(
            source(&temp_dir, "").rename("Name"),
            Err(SourceError::NotSignedIn)
        ));
    }

    #[tokio::test]
    async fn test_prior_result_from_store() {
        let temp_dir = TempDir::new().unwrap();
        let src = source(&temp_dir, "me");
        let storage = StorageConfig::new(temp_dir.path().to_path_buf());
        append_day(&storage, &day(0)).unwrap();

        let board = load_leaderboard(&src).await.unwrap();
        assert_eq!(board.prior_result("bob"), Some(WIN));
    }
}

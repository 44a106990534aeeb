use std::sync::Arc;

use tokio::sync::{Mutex, RwLock};
use tracing::info;

use crate::api::ApiError;
use crate::leaderboard::Leaderboard;
use crate::source::{load_leaderboard, OnlineDataSource};

#[derive(Clone)]
pub struct AppState {
    pub source: Arc<dyn OnlineDataSource>,
    pub leaderboard: Arc<RwLock<Option<Leaderboard>>>,
    /// Loads run one at a time, whoever starts them
    reload_lock: Arc<Mutex<()>>,
}

impl AppState {
    pub fn new(source: Arc<dyn OnlineDataSource>) -> Self {
        Self {
            source,
            leaderboard: Arc::new(RwLock::new(None)),
            reload_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Rebuild from the source and replace whatever was loaded before.
    pub async fn reload(&self) -> Result<Leaderboard, ApiError> {
        let _guard = self.reload_lock.lock().await;
        self.load_and_swap().await
    }

    /// Current leaderboard, loading it on first use.
    pub async fn current(&self) -> Result<Leaderboard, ApiError> {
        if let Some(board) = self.leaderboard.read().await.as_ref() {
            return Ok(board.clone());
        }

        let _guard = self.reload_lock.lock().await;
        // Another caller may have finished loading while we waited
        if let Some(board) = self.leaderboard.read().await.as_ref() {
            return Ok(board.clone());
        }
        self.load_and_swap().await
    }

    /// Change the signed-in player's nickname, then reload.
    pub async fn rename(&self, nickname: &str) -> Result<Leaderboard, ApiError> {
        let _guard = self.reload_lock.lock().await;
        self.source.update_display_name(nickname).await?;
        self.load_and_swap().await
    }

    // Callers hold `reload_lock`
    async fn load_and_swap(&self) -> Result<Leaderboard, ApiError> {
        let board = load_leaderboard(self.source.as_ref()).await?;
        *self.leaderboard.write().await = Some(board.clone());
        info!("Leaderboard reloaded");
        Ok(board)
    }
}

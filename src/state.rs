//! Shared engine state handed to every command.

use crate::config::{EngineConfig, SETTINGS_FILE};
use crate::db;
use crate::db::pool::DbPool;
use crate::error::AppError;
use crate::services::GraphLocks;
use std::path::Path;
use std::sync::Arc;

/// Database pool, configuration and graph locks.
///
/// Cheap to clone; clones share the pool and the locks.
#[derive(Debug, Clone)]
pub struct AppState {
    pub pool: DbPool,
    pub config: Arc<EngineConfig>,
    pub graph_locks: Arc<GraphLocks>,
}

impl AppState {
    pub fn new(pool: DbPool, config: EngineConfig) -> Self {
        Self {
            pool,
            config: Arc::new(config),
            graph_locks: Arc::new(GraphLocks::new()),
        }
    }

    /// Load settings from `data_dir` and open (migrating if needed) the database there.
    pub async fn open(data_dir: &Path) -> Result<Self, AppError> {
        let config = EngineConfig::load(&data_dir.join(SETTINGS_FILE))?;
        let db_path = db::get_db_path(data_dir, &config.db_file_name);
        let pool = db::initialize_with(&db_path, &config).await?;

        log::info!("Engine state ready at {}", data_dir.display());
        Ok(Self::new(pool, config))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_open_uses_settings_file() {
        let dir = tempdir().unwrap();
        std::fs::write(
            dir.path().join(SETTINGS_FILE),
            r#"{"dbFileName": "custom.db", "maxMessageLength": 20}"#,
        )
        .unwrap();

        let state = AppState::open(dir.path()).await.unwrap();
        assert_eq!(state.config.max_message_length, 20);
        assert!(dir.path().join("custom.db").exists());
    }

    #[tokio::test]
    async fn test_open_creates_data_dir() {
        let dir = tempdir().unwrap();
        let data_dir = dir.path().join("nested/data");

        let state = AppState::open(&data_dir).await.unwrap();
        assert_eq!(*state.config, EngineConfig::default());
    }
}

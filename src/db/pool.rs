//! SQLite connection pool with WAL mode.
//!
//! WAL lets list queries run while an approver's decision is being written.
//! Foreign keys are switched on because project and skill deletion rely on
//! `ON DELETE CASCADE`.

use crate::config::EngineConfig;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::{Pool, Sqlite};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

/// Type alias for the SQLite connection pool.
pub type DbPool = Pool<Sqlite>;

/// Create a connection pool using default engine settings.
pub async fn create_pool(db_path: &Path) -> Result<DbPool, sqlx::Error> {
    create_pool_with(db_path, &EngineConfig::default()).await
}

/// Create a connection pool sized and timed from `config`.
///
/// The busy timeout is what makes concurrent writers queue up behind each
/// other instead of failing with `SQLITE_BUSY`.
pub async fn create_pool_with(db_path: &Path, config: &EngineConfig) -> Result<DbPool, sqlx::Error> {
    let db_url = format!("sqlite:{}", db_path.display());

    let connect_options = SqliteConnectOptions::from_str(&db_url)?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .synchronous(SqliteSynchronous::Normal)
        .foreign_keys(true)
        .busy_timeout(Duration::from_secs(config.busy_timeout_secs));

    let pool = SqlitePoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(1)
        .acquire_timeout(Duration::from_secs(10))
        .connect_with(connect_options)
        .await?;

    let mode: (String,) = sqlx::query_as("PRAGMA journal_mode")
        .fetch_one(&pool)
        .await?;

    debug_assert!(
        mode.0.to_lowercase() == "wal",
        "WAL mode should be enabled, got: {}",
        mode.0
    );

    log::debug!(
        "Opened SQLite pool at {} ({} connections)",
        db_path.display(),
        config.max_connections
    );

    Ok(pool)
}

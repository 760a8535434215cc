//! Database layer for SQLite storage.
//!
//! This module handles:
//! - Connection pool management with WAL mode
//! - Schema migrations

pub mod pool;

use crate::config::EngineConfig;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Database-related errors.
#[derive(Debug, Error)]
pub enum DbError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(String),
}

/// Get the path to the SQLite database file inside `data_dir`.
pub fn get_db_path(data_dir: &Path, file_name: &str) -> PathBuf {
    data_dir.join(file_name)
}

/// Schema migrations in application order.
const MIGRATIONS: &[(&str, &str)] = &[
    (
        "0001_initial_schema",
        include_str!("migrations/0001_initial_schema.sql"),
    ),
    (
        "0002_rejection_visibility",
        include_str!("migrations/0002_rejection_visibility.sql"),
    ),
];

/// Initialize the database with default settings.
pub async fn initialize(db_path: &Path) -> Result<pool::DbPool, DbError> {
    initialize_with(db_path, &EngineConfig::default()).await
}

/// Initialize the database: create the file if needed and run migrations.
///
/// # Arguments
/// * `db_path` - Path to the SQLite database file
/// * `config` - Pool sizing and timeouts
///
/// # Returns
/// A connection pool configured with WAL mode
pub async fn initialize_with(db_path: &Path, config: &EngineConfig) -> Result<pool::DbPool, DbError> {
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| {
            DbError::Migration(format!("Failed to create database directory: {}", e))
        })?;
    }

    let pool = pool::create_pool_with(db_path, config).await?;

    run_migrations(&pool).await?;

    Ok(pool)
}

/// Run all pending database migrations.
///
/// Each migration runs in its own transaction together with its
/// `_migrations` bookkeeping row, so a failed migration leaves no partial schema.
async fn run_migrations(pool: &pool::DbPool) -> Result<(), DbError> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS _migrations (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL UNIQUE,
            applied_at INTEGER NOT NULL DEFAULT (strftime('%s', 'now'))
        )
        "#,
    )
    .execute(pool)
    .await?;

    for (name, migration_sql) in MIGRATIONS {
        let applied: Option<(i64,)> = sqlx::query_as("SELECT id FROM _migrations WHERE name = ?")
            .bind(name)
            .fetch_optional(pool)
            .await?;

        if applied.is_some() {
            continue;
        }

        let mut tx = pool.begin().await?;
        for statement in parse_sql_statements(migration_sql) {
            sqlx::query(&statement)
                .execute(&mut *tx)
                .await
                .map_err(|e| DbError::Migration(format!("{}: {}", name, e)))?;
        }
        sqlx::query("INSERT INTO _migrations (name) VALUES (?)")
            .bind(name)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        log::info!("Applied migration {}", name);
    }

    Ok(())
}

/// Parse SQL statements from a migration file.
///
/// This handles:
/// - Comments (lines starting with --)
/// - Semicolons inside parentheses (e.g., `strftime('%s', 'now')`)
/// - Multi-line statements
fn parse_sql_statements(sql: &str) -> Vec<String> {
    let mut statements = Vec::new();
    let mut current_statement = String::new();
    let mut paren_depth: i32 = 0;

    for line in sql.lines() {
        let trimmed = line.trim();

        // Skip comment-only lines
        if trimmed.starts_with("--") {
            continue;
        }

        // Remove inline comments
        let line_without_comment = if let Some(idx) = line.find("--") {
            &line[..idx]
        } else {
            line
        };

        for ch in line_without_comment.chars() {
            match ch {
                '(' => {
                    paren_depth += 1;
                    current_statement.push(ch);
                }
                ')' => {
                    paren_depth = paren_depth.saturating_sub(1);
                    current_statement.push(ch);
                }
                ';' if paren_depth == 0 => {
                    // End of statement
                    let stmt = current_statement.trim().to_string();
                    if !stmt.is_empty() {
                        statements.push(stmt);
                    }
                    current_statement.clear();
                }
                _ => {
                    current_statement.push(ch);
                }
            }
        }

        // Add a space between lines to preserve formatting
        if !current_statement.is_empty() {
            current_statement.push(' ');
        }
    }

    // Handle any remaining statement without trailing semicolon
    let final_stmt = current_statement.trim().to_string();
    if !final_stmt.is_empty() {
        statements.push(final_stmt);
    }

    statements
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_initialize_creates_database() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("test.db");

        let pool = initialize(&db_path).await.unwrap();

        // Verify the database file was created
        assert!(db_path.exists());

        // Verify tables were created
        let tables: Vec<(String,)> = sqlx::query_as(
            "SELECT name FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%' AND name != '_migrations' ORDER BY name",
        )
        .fetch_all(&pool)
        .await
        .unwrap();

        let table_names: Vec<&str> = tables.iter().map(|(n,)| n.as_str()).collect();
        assert!(table_names.contains(&"projects"));
        assert!(table_names.contains(&"skills"));
        assert!(table_names.contains(&"skill_dependencies"));
        assert!(table_names.contains(&"user_performed_skills"));
        assert!(table_names.contains(&"user_tags"));
        assert!(table_names.contains(&"project_roles"));
        assert!(table_names.contains(&"approval_requests"));
        assert!(table_names.contains(&"approver_workload_rules"));
    }

    #[test]
    fn test_parse_sql_statements_keeps_parenthesized_semicolons() {
        let sql = "-- header\nCREATE TABLE a (x INTEGER DEFAULT (strftime('%s;', 'now')));\nCREATE INDEX i ON a(x); -- trailing\n";
        let statements = parse_sql_statements(sql);
        assert_eq!(statements.len(), 2);
        assert!(statements[0].starts_with("CREATE TABLE a"));
        assert!(statements[1].starts_with("CREATE INDEX i"));
    }

    #[tokio::test]
    async fn test_migrations_are_idempotent() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("test.db");

        // Initialize twice
        let _pool1 = initialize(&db_path).await.unwrap();
        let pool2 = initialize(&db_path).await.unwrap();

        // Should still have exactly one record per migration
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM _migrations")
            .fetch_one(&pool2)
            .await
            .unwrap();
        assert_eq!(count.0, MIGRATIONS.len() as i64);
    }
}

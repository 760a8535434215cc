//! Engine configuration.
//!
//! Settings are persisted as a JSON document. Missing fields fall back to
//! their defaults so older settings files keep loading after new options
//! are added.

use crate::error::AppError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default settings filename.
pub const SETTINGS_FILE: &str = "settings.json";

/// Default SQLite database filename.
pub const DEFAULT_DB_FILE: &str = "skills-workflow.db";

/// Lower/upper length bounds for display names.
pub const NAME_MIN_LEN: usize = 3;
pub const NAME_MAX_LEN: usize = 100;

/// Lower/upper length bounds for project and skill identifiers.
pub const ID_MIN_LEN: usize = 3;
pub const ID_MAX_LEN: usize = 50;

/// Configuration for the workflow engine.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct EngineConfig {
    /// SQLite database filename, relative to the data directory.
    pub db_file_name: String,

    /// Maximum pooled SQLite connections.
    pub max_connections: u32,

    /// How long a writer waits on a locked database, in seconds.
    pub busy_timeout_secs: u64,

    /// Page size used when the caller does not ask for one.
    pub default_page_size: u32,

    /// Largest page size a caller may request.
    pub max_page_size: u32,

    /// Maximum length of submission and rejection messages.
    pub max_message_length: usize,

    /// Upper bound for a skill's point increment.
    pub max_point_increment: i64,

    /// Upper bound for a skill's required repetitions.
    pub max_num_perform_to_completion: i64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            db_file_name: DEFAULT_DB_FILE.to_string(),
            max_connections: 5,
            busy_timeout_secs: 30,
            default_page_size: 10,
            max_page_size: 200,
            max_message_length: 500,
            max_point_increment: 10_000,
            max_num_perform_to_completion: 10_000,
        }
    }
}

impl EngineConfig {
    /// Load settings from a JSON file, using defaults if the file does not exist.
    pub fn load(path: &Path) -> Result<Self, AppError> {
        if !path.exists() {
            log::debug!("No settings at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let raw = std::fs::read_to_string(path).map_err(|e| {
            AppError::internal(format!("Failed to read settings {}: {}", path.display(), e))
        })?;
        let config: Self = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Persist settings as pretty JSON.
    pub fn save(&self, path: &Path) -> Result<(), AppError> {
        self.validate()?;
        let raw = serde_json::to_string_pretty(self)?;
        std::fs::write(path, raw).map_err(|e| {
            AppError::internal(format!("Failed to save settings {}: {}", path.display(), e))
        })
    }

    /// Reject settings that would make the engine unusable.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.max_connections == 0 {
            return Err(AppError::validation_field(
                "maxConnections must be at least 1",
                "maxConnections",
            ));
        }
        if self.default_page_size == 0 || self.default_page_size > self.max_page_size {
            return Err(AppError::validation_field(
                format!(
                    "defaultPageSize must be between 1 and maxPageSize ({})",
                    self.max_page_size
                ),
                "defaultPageSize",
            ));
        }
        if self.db_file_name.trim().is_empty() {
            return Err(AppError::validation_field(
                "dbFileName must not be empty",
                "dbFileName",
            ));
        }
        Ok(())
    }
}

//! Settings commands for engine configuration.
//!
//! Settings live in `settings.json` inside the data directory. Saved
//! settings take effect the next time the state is opened.

use crate::config::{EngineConfig, SETTINGS_FILE};
use crate::error::AppError;
use crate::state::AppState;
use std::path::Path;

/// Get the settings the engine is running with.
pub async fn get_settings(state: &AppState) -> Result<EngineConfig, AppError> {
    Ok(state.config.as_ref().clone())
}

/// Validate and persist settings to `data_dir`.
pub async fn update_settings(data_dir: &Path, settings: EngineConfig) -> Result<(), AppError> {
    settings.save(&data_dir.join(SETTINGS_FILE))?;
    log::info!("Saved settings to {}", data_dir.display());
    Ok(())
}

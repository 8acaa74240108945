mod config;
pub mod database;
mod local;

pub use config::{AudioConfig, BreathingConfig, Config, SceneConfig, SessionConfig};
pub use database::Database;
pub use local::{LocalStore, MemoryStore};

use std::path::PathBuf;

use crate::error::ConfigError;

/// Returns `~/.config/breatheroom[-dev]/` based on BREATHEROOM_ENV.
///
/// Set BREATHEROOM_ENV=dev to use development data directory.
///
/// # Errors
/// Returns an error if creating the data directory fails.
pub fn data_dir() -> Result<PathBuf, ConfigError> {
    let base_dir = dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config");

    let env = std::env::var("BREATHEROOM_ENV").unwrap_or_else(|_| "production".to_string());

    let dir = if env == "dev" {
        base_dir.join("breatheroom-dev")
    } else {
        base_dir.join("breatheroom")
    };

    std::fs::create_dir_all(&dir).map_err(|e| ConfigError::DataDir(format!("{}: {e}", dir.display())))?;
    Ok(dir)
}

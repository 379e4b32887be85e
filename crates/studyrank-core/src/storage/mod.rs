pub mod config;
pub mod database;

pub use config::Config;
pub use database::{Database, SessionLog, UserRecord};

use std::path::PathBuf;

use crate::error::Result;

/// Returns `~/.config/studyrank[-dev]/` based on STUDYRANK_ENV.
///
/// Set STUDYRANK_ENV=dev to use a separate development data directory.
///
/// # Errors
/// Returns an error if creating the config directory fails.
pub fn data_dir() -> Result<PathBuf> {
    let base_dir = dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config");

    let env = std::env::var("STUDYRANK_ENV").unwrap_or_else(|_| "production".to_string());

    let dir = if env == "dev" {
        base_dir.join("studyrank-dev")
    } else {
        base_dir.join("studyrank")
    };

    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}

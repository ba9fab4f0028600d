mod config;
pub mod repository;

pub use config::{
    AggregatorConfig, EngineConfig, GuaranteedConfig, ScoringConfig, TierFitConfig, TierTable,
    TriggerConfig,
};
pub use repository::{InMemoryRepository, Snapshot, WeaveRepository};

use std::path::PathBuf;

use crate::error::Result;

/// Returns `~/.config/weave[-dev]/` based on WEAVE_ENV.
///
/// Set WEAVE_ENV=dev to use development data directory.
///
/// # Errors
/// Returns an error if creating the config directory fails.
pub fn data_dir() -> Result<PathBuf> {
    let base_dir = dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config");

    let env = std::env::var("WEAVE_ENV").unwrap_or_else(|_| "production".to_string());

    let dir = if env == "dev" {
        base_dir.join("weave-dev")
    } else {
        base_dir.join("weave")
    };

    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}

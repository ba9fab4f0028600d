pub mod config;
pub mod health;
pub mod score;
pub mod suggest;
pub mod tier_fit;

use chrono::{DateTime, FixedOffset, Local};
use std::path::Path;
use weave_core::{EngineConfig, InMemoryRepository};

pub type CliResult = Result<(), Box<dyn std::error::Error>>;

/// Load and validate a JSON snapshot.
pub fn load_snapshot(path: &Path) -> Result<InMemoryRepository, Box<dyn std::error::Error>> {
    InMemoryRepository::load_json(path)
        .map_err(|e| format!("failed to load snapshot {}: {e}", path.display()).into())
}

/// `--config` when given (defaults if the file doesn't exist yet), otherwise
/// the user config.
pub fn load_config(path: Option<&Path>) -> Result<EngineConfig, Box<dyn std::error::Error>> {
    match path {
        Some(p) if p.exists() => Ok(EngineConfig::load_from(p)?),
        Some(_) => Ok(EngineConfig::default()),
        None => Ok(EngineConfig::load_or_default()),
    }
}

/// `--at` as RFC 3339, or the local clock.
pub fn resolve_now(at: Option<&str>) -> Result<DateTime<FixedOffset>, Box<dyn std::error::Error>> {
    match at {
        Some(s) => DateTime::parse_from_rfc3339(s).map_err(|e| format!("invalid --at '{s}': {e}").into()),
        None => Ok(Local::now().fixed_offset()),
    }
}

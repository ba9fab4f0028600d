use clap::Subcommand;
use std::path::Path;
use weave_core::EngineConfig;

use super::{load_config, CliResult};

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Get a config value
    Get {
        /// Config key (e.g. "scoring.baseline_score", "aggregator.max_guaranteed")
        key: String,
    },
    /// Set a config value
    Set {
        /// Config key
        key: String,
        /// New value
        value: String,
    },
    /// Show the full config
    Show,
    /// Print the config file path
    Path,
    /// Reset config to defaults
    Reset,
}

fn save(config: &EngineConfig, path: Option<&Path>) -> CliResult {
    match path {
        Some(p) => config.save_to(p)?,
        None => config.save()?,
    }
    Ok(())
}

pub fn run(action: ConfigAction, config_path: Option<&Path>) -> CliResult {
    match action {
        ConfigAction::Get { key } => {
            let config = load_config(config_path)?;
            match config.get(&key) {
                Some(value) => println!("{value}"),
                None => return Err(format!("unknown key: {key}").into()),
            }
        }
        ConfigAction::Set { key, value } => {
            let mut config = load_config(config_path)?;
            config.set(&key, &value)?;
            save(&config, config_path)?;
            println!("ok");
        }
        ConfigAction::Show => {
            let config = load_config(config_path)?;
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
        ConfigAction::Path => match config_path {
            Some(p) => println!("{}", p.display()),
            None => println!("{}", EngineConfig::path()?.display()),
        },
        ConfigAction::Reset => {
            save(&EngineConfig::default(), config_path)?;
            println!("config reset to defaults");
        }
    }
    Ok(())
}

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Overrides the platform data directory when set.
    pub data_dir: Option<PathBuf>,
    pub log_filter: String,
    /// Display name attributed to synthesized messages and log entries.
    pub system_actor_name: String,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        RuntimeConfig {
            data_dir: None,
            log_filter: "info".to_string(),
            system_actor_name: "system".to_string(),
        }
    }
}

impl RuntimeConfig {
    pub fn from_raw(raw: &str) -> RuntimeConfig {
        match serde_json::from_str(raw) {
            Ok(config) => config,
            Err(err) => {
                tracing::warn!("Invalid config file, falling back to defaults: {}", err);
                RuntimeConfig::default()
            }
        }
    }
}

/// Will always return a config, falling back to defaults on
/// missing/invalid files.
pub fn load_config_from_file(config_path: &Path) -> RuntimeConfig {
    match std::fs::read_to_string(config_path) {
        Ok(raw_config) => RuntimeConfig::from_raw(&raw_config),
        Err(err) => {
            if err.kind() == std::io::ErrorKind::NotFound {
                tracing::info!("No config file found, using defaults");
            } else {
                tracing::warn!("Failed to read config file: {}", err);
            }
            RuntimeConfig::default()
        }
    }
}

pub fn save_config_to_file(config: &RuntimeConfig, config_path: &Path) -> Result<(), ConfigError> {
    let raw_config = serde_json::to_string_pretty(config)?;
    std::fs::write(config_path, raw_config)?;
    Ok(())
}

//! Sync Configuration
//!
//! Endpoint settings stored as `sync_config.json` in the data directory.
//! `HABIT_API_URL` overrides the stored URL.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::domain::{DomainError, DomainResult};

pub const CONFIG_FILE: &str = "sync_config.json";
pub const API_URL_ENV: &str = "HABIT_API_URL";
pub const DEFAULT_TIMEOUT_SECS: u64 = 15;

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Base URL of the key-value endpoint; `POST` goes here, everything else
    /// to `<api_url>/<passcode>`
    pub api_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl SyncConfig {
    pub fn new(api_url: &str) -> DomainResult<Self> {
        Ok(Self {
            api_url: validate_url(api_url)?,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        })
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }
}

fn validate_url(raw: &str) -> DomainResult<String> {
    let raw = raw.trim();
    let url = reqwest::Url::parse(raw)
        .map_err(|e| DomainError::Validation(format!("Invalid API URL '{}': {}", raw, e)))?;
    match url.scheme() {
        "http" | "https" => Ok(raw.trim_end_matches('/').to_string()),
        other => Err(DomainError::Validation(format!(
            "API URL must use http or https, got '{}'",
            other
        ))),
    }
}

fn config_path(data_dir: &Path) -> PathBuf {
    data_dir.join(CONFIG_FILE)
}

/// Stored configuration, if any. An unreadable file counts as absent.
pub fn get_sync_config(data_dir: &Path) -> Option<SyncConfig> {
    let path = config_path(data_dir);
    let content = fs::read_to_string(&path).ok()?;
    match serde_json::from_str(&content) {
        Ok(config) => Some(config),
        Err(e) => {
            log::warn!("Ignoring unreadable {}: {}", path.display(), e);
            None
        }
    }
}

pub fn save_sync_config(data_dir: &Path, config: &SyncConfig) -> DomainResult<()> {
    fs::create_dir_all(data_dir).map_err(|e| DomainError::Storage(e.to_string()))?;
    let json = serde_json::to_string_pretty(config).map_err(|e| DomainError::Storage(e.to_string()))?;
    fs::write(config_path(data_dir), json).map_err(|e| DomainError::Storage(e.to_string()))?;
    log::info!("Sync endpoint set to {}", config.api_url);
    Ok(())
}

/// Stored configuration with the environment override applied
pub fn resolve_sync_config(data_dir: &Path) -> DomainResult<SyncConfig> {
    let env_url = std::env::var(API_URL_ENV).ok().filter(|v| !v.trim().is_empty());
    resolve_with(get_sync_config(data_dir), env_url)
}

fn resolve_with(stored: Option<SyncConfig>, env_url: Option<String>) -> DomainResult<SyncConfig> {
    match (stored, env_url) {
        (Some(mut config), Some(url)) => {
            config.api_url = validate_url(&url)?;
            Ok(config)
        }
        (None, Some(url)) => SyncConfig::new(&url),
        (Some(config), None) => Ok(config),
        (None, None) => Err(DomainError::Validation(format!(
            "API URL is not defined; set {} or run `config <url>`",
            API_URL_ENV
        ))),
    }
}

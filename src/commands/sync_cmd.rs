//! Remote Sync Commands
//!
//! Save, open and delete whole lists against the remote store. A command
//! holds the session for its full duration, so anything issued meanwhile is
//! rejected as busy.

use std::path::Path;

use crate::config::{get_sync_config, save_sync_config, SyncConfig};
use crate::domain::{DomainError, Habit, Passcode};
use crate::AppState;

use super::session_guard;

fn remote_unavailable() -> String {
    DomainError::Validation("API URL is not defined; run `config <url>` first".to_string()).to_string()
}

/// Send the current list to the remote store. Returns the passcode it was
/// stored under.
pub async fn save_habits(state: &AppState) -> Result<String, String> {
    let remote = state.remote.as_deref().ok_or_else(remote_unavailable)?;
    let mut session = session_guard(state)?;
    let passcode = session.save(remote).await.map_err(|e| {
        log::error!("Saving habits failed: {}", e);
        e.to_string()
    })?;
    Ok(passcode.to_string())
}

/// Load the list stored under `passcode` and make it the current session.
/// Refused while the current list has changes the remote store has not seen.
pub async fn open_list(state: &AppState, passcode: &str) -> Result<Vec<Habit>, String> {
    let passcode = Passcode::parse(passcode).map_err(|e| e.to_string())?;
    let remote = state.remote.as_deref().ok_or_else(remote_unavailable)?;
    let mut session = session_guard(state)?;
    session.open(remote, passcode).await.map_err(|e| {
        log::warn!("Opening habit list failed: {}", e);
        e.to_string()
    })?;
    Ok(session.habits().as_slice().to_vec())
}

/// Delete the opened list remotely, then locally
pub async fn delete_list(state: &AppState) -> Result<(), String> {
    let remote = state.remote.as_deref().ok_or_else(remote_unavailable)?;
    let mut session = session_guard(state)?;
    session.delete_remote(remote).await.map_err(|e| {
        log::error!("Deleting habit list failed: {}", e);
        e.to_string()
    })
}

/// Store the endpoint URL. Takes effect on next start.
pub fn configure_sync(data_dir: &Path, api_url: &str) -> Result<SyncConfig, String> {
    let mut config = SyncConfig::new(api_url).map_err(|e| e.to_string())?;
    if let Some(existing) = get_sync_config(data_dir) {
        config.timeout_secs = existing.timeout_secs;
    }
    save_sync_config(data_dir, &config).map_err(|e| e.to_string())?;
    Ok(config)
}

//! Habit Reminder
//!
//! Habit lists kept on the device and synced to a remote key-value store
//! under a six-digit passcode.
//!
//! Layered architecture:
//! - domain: habits, lists, passcodes and the error taxonomy
//! - codec: base64(JSON) form of a habit
//! - repository: local mirror + remote store abstractions and backends
//! - sync: HTTP implementation of the remote store
//! - session: the explicit context for the list being edited
//! - commands: handlers a UI calls

use std::path::Path;
use std::sync::Arc;

use tokio::sync::Mutex;

pub mod codec;
pub mod commands;
pub mod config;
pub mod domain;
pub mod repository;
pub mod session;
pub mod sync;

use domain::DomainResult;
use repository::{FileStorage, LocalMirror, RemoteStore, StorageMirror};
use session::HabitSession;

/// Application state shared across commands
pub struct AppState {
    pub session: Mutex<HabitSession>,
    /// `None` until an endpoint is configured; local editing still works
    pub remote: Option<Arc<dyn RemoteStore>>,
}

impl AppState {
    /// Resume whatever session the mirror holds
    pub fn new(mirror: Arc<dyn LocalMirror>, remote: Option<Arc<dyn RemoteStore>>) -> Self {
        Self {
            session: Mutex::new(HabitSession::restore(mirror)),
            remote,
        }
    }

    /// File-backed mirror in `data_dir`, HTTP remote from the stored or
    /// environment configuration
    pub fn init(data_dir: &Path) -> DomainResult<Self> {
        let mirror: Arc<dyn LocalMirror> = Arc::new(StorageMirror::new(FileStorage::in_dir(data_dir)?));

        let remote: Option<Arc<dyn RemoteStore>> = match config::resolve_sync_config(data_dir) {
            Ok(config) => {
                log::info!("Using habit store at {}", config.api_url);
                Some(Arc::new(sync::SyncClient::new(&config)?))
            }
            Err(e) => {
                log::warn!("Remote sync disabled: {}", e);
                None
            }
        };

        Ok(Self::new(mirror, remote))
    }
}

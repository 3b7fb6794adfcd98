//! Browser localStorage backend (wasm32 only)

use super::storage::{Storage, StorageWrite};
use crate::domain::{DomainError, DomainResult};

/// Looks up `window.localStorage` on every call, so the handle itself holds
/// no JS values.
#[derive(Debug, Clone, Copy, Default)]
pub struct WebStorage;

impl WebStorage {
    fn local_storage() -> DomainResult<web_sys::Storage> {
        let window = web_sys::window()
            .ok_or_else(|| DomainError::Storage("No window available".to_string()))?;
        window
            .local_storage()
            .map_err(|e| DomainError::Storage(format!("localStorage unavailable: {:?}", e)))?
            .ok_or_else(|| DomainError::Storage("localStorage disabled".to_string()))
    }
}

impl Storage for WebStorage {
    fn get(&self, key: &str) -> DomainResult<Option<String>> {
        Self::local_storage()?
            .get_item(key)
            .map_err(|e| DomainError::Storage(format!("Failed to read '{}': {:?}", key, e)))
    }

    // localStorage has no transactions; writes go in order and readers treat
    // the list record as authoritative for the passcode.
    fn apply(&self, writes: Vec<StorageWrite>) -> DomainResult<()> {
        let storage = Self::local_storage()?;
        for write in writes {
            match write {
                StorageWrite::Set(key, value) => storage
                    .set_item(&key, &value)
                    .map_err(|e| DomainError::Storage(format!("Failed to write '{}': {:?}", key, e)))?,
                StorageWrite::Remove(key) => storage
                    .remove_item(&key)
                    .map_err(|e| DomainError::Storage(format!("Failed to remove '{}': {:?}", key, e)))?,
            }
        }
        Ok(())
    }
}

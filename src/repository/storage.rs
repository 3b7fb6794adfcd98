//! Key-Value Storage Backends
//!
//! String-keyed storage in the shape of browser `localStorage`, with one
//! addition: a batch of writes is applied as a unit.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, RwLock};

use crate::domain::{DomainError, DomainResult};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageWrite {
    Set(String, String),
    Remove(String),
}

pub trait Storage: Send + Sync {
    fn get(&self, key: &str) -> DomainResult<Option<String>>;

    /// Apply every write or none of them
    fn apply(&self, writes: Vec<StorageWrite>) -> DomainResult<()>;
}

/// In-process storage. Clones share the same map.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    entries: Arc<RwLock<HashMap<String, String>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self
            .entries
            .read()
            .map(|entries| entries.keys().cloned().collect())
            .unwrap_or_default();
        keys.sort();
        keys
    }
}

impl Storage for MemoryStorage {
    fn get(&self, key: &str) -> DomainResult<Option<String>> {
        let entries = self
            .entries
            .read()
            .map_err(|e| DomainError::Storage(e.to_string()))?;
        Ok(entries.get(key).cloned())
    }

    fn apply(&self, writes: Vec<StorageWrite>) -> DomainResult<()> {
        let mut entries = self
            .entries
            .write()
            .map_err(|e| DomainError::Storage(e.to_string()))?;
        for write in writes {
            match write {
                StorageWrite::Set(key, value) => {
                    entries.insert(key, value);
                }
                StorageWrite::Remove(key) => {
                    entries.remove(&key);
                }
            }
        }
        Ok(())
    }
}

/// All keys in one JSON document on disk. Each batch is written to a
/// sibling temp file and renamed over the document.
#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileStorage {
    pub const FILE_NAME: &'static str = "habit_storage.json";

    /// Storage document inside `data_dir`, which is created if missing
    pub fn in_dir(data_dir: &Path) -> DomainResult<Self> {
        fs::create_dir_all(data_dir)
            .map_err(|e| DomainError::Storage(format!("Failed to create {}: {}", data_dir.display(), e)))?;
        Ok(Self::new(data_dir.join(Self::FILE_NAME)))
    }

    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn tmp_path(&self) -> PathBuf {
        self.path.with_extension("json.tmp")
    }

    fn read_all(&self) -> DomainResult<BTreeMap<String, String>> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }
        let content = fs::read_to_string(&self.path)
            .map_err(|e| DomainError::Storage(format!("Failed to read {}: {}", self.path.display(), e)))?;
        if content.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        serde_json::from_str(&content)
            .map_err(|e| DomainError::Storage(format!("Corrupt storage file {}: {}", self.path.display(), e)))
    }

    fn write_all(&self, entries: &BTreeMap<String, String>) -> DomainResult<()> {
        let json = serde_json::to_string_pretty(entries)
            .map_err(|e| DomainError::Storage(e.to_string()))?;
        let tmp = self.tmp_path();
        fs::write(&tmp, json)
            .map_err(|e| DomainError::Storage(format!("Failed to write {}: {}", tmp.display(), e)))?;
        fs::rename(&tmp, &self.path)
            .map_err(|e| DomainError::Storage(format!("Failed to replace {}: {}", self.path.display(), e)))
    }
}

impl Storage for FileStorage {
    fn get(&self, key: &str) -> DomainResult<Option<String>> {
        let _guard = self.lock.lock().map_err(|e| DomainError::Storage(e.to_string()))?;
        Ok(self.read_all()?.remove(key))
    }

    fn apply(&self, writes: Vec<StorageWrite>) -> DomainResult<()> {
        let _guard = self.lock.lock().map_err(|e| DomainError::Storage(e.to_string()))?;
        let mut entries = self.read_all()?;
        for write in writes {
            match write {
                StorageWrite::Set(key, value) => {
                    entries.insert(key, value);
                }
                StorageWrite::Remove(key) => {
                    entries.remove(&key);
                }
            }
        }
        self.write_all(&entries)
    }
}

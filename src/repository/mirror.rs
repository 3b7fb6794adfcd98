//! Local Mirror
//!
//! Keeps the list being edited on the device under the same keys the web
//! client uses:
//! - `habits`: draft list `{passcode, habits: [encoded...]}`
//! - `habitData`: list opened from the remote store, same shape
//! - `habitPasscode`: the passcode on its own
//!
//! Only one of `habits` / `habitData` exists at a time, and its embedded
//! passcode wins over `habitPasscode`. A record without a usable passcode
//! falls back to `habitPasscode`, and `habitPasscode` alone stands for an
//! empty draft.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::storage::{Storage, StorageWrite};
use super::traits::{ListOrigin, LocalMirror, MirrorSnapshot};
use crate::codec;
use crate::domain::{DomainError, DomainResult, HabitList, Passcode};

pub const HABITS_KEY: &str = "habits";
pub const HABIT_DATA_KEY: &str = "habitData";
pub const PASSCODE_KEY: &str = "habitPasscode";

#[derive(Debug, Serialize)]
struct StoredList<'a> {
    passcode: &'a Passcode,
    habits: Vec<String>,
}

/// Records written by other clients may omit the passcode, or be a bare array
/// of entries with the passcode kept only under `habitPasscode`. Entries stay
/// raw so that a malformed one is skipped, not fatal.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum StoredRecord {
    Full {
        #[serde(default)]
        passcode: Option<Value>,
        habits: Vec<Value>,
    },
    Bare(Vec<Value>),
}

fn slot_key(origin: ListOrigin) -> &'static str {
    match origin {
        ListOrigin::Draft => HABITS_KEY,
        ListOrigin::Remote => HABIT_DATA_KEY,
    }
}

/// `LocalMirror` over any key-value `Storage`
pub struct StorageMirror<S: Storage> {
    storage: S,
}

impl<S: Storage> StorageMirror<S> {
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    fn stored_passcode(&self) -> DomainResult<Option<Passcode>> {
        match self.storage.get(PASSCODE_KEY)? {
            Some(raw) => Passcode::parse(&raw)
                .map(Some)
                .map_err(|e| DomainError::Storage(format!("Corrupt '{}' entry: {}", PASSCODE_KEY, e))),
            None => Ok(None),
        }
    }

    fn fallback_passcode(&self, key: &str) -> DomainResult<Passcode> {
        self.stored_passcode()?.ok_or_else(|| {
            DomainError::Storage(format!("'{}' entries stored without a passcode", key))
        })
    }

    fn read_slot(&self, origin: ListOrigin) -> DomainResult<Option<MirrorSnapshot>> {
        let key = slot_key(origin);
        let Some(raw) = self.storage.get(key)? else {
            return Ok(None);
        };

        let record: StoredRecord = serde_json::from_str(&raw)
            .map_err(|e| DomainError::Storage(format!("Corrupt '{}' record: {}", key, e)))?;

        let (embedded, entries) = match record {
            StoredRecord::Full { passcode, habits } => (passcode, habits),
            StoredRecord::Bare(entries) => (None, entries),
        };

        let embedded = embedded.filter(|value| !value.is_null()).map(|value| match value {
            Value::String(raw) => Passcode::parse(&raw),
            other => Err(DomainError::Validation(format!("passcode {} is not a string", other))),
        });
        let passcode = match embedded {
            Some(Ok(passcode)) => {
                if let Ok(Some(separate)) = self.stored_passcode() {
                    if separate != passcode {
                        log::warn!(
                            "'{}' holds {} but '{}' holds {}, using the list record",
                            key,
                            passcode,
                            PASSCODE_KEY,
                            separate
                        );
                    }
                }
                passcode
            }
            Some(Err(e)) => {
                log::warn!("'{}' has an unusable passcode ({}), trying '{}'", key, e, PASSCODE_KEY);
                self.fallback_passcode(key)?
            }
            None => self.fallback_passcode(key)?,
        };

        Ok(Some(MirrorSnapshot {
            passcode,
            habits: codec::decode_all(&entries),
            origin,
        }))
    }
}

impl<S: Storage> LocalMirror for StorageMirror<S> {
    fn load(&self) -> DomainResult<Option<MirrorSnapshot>> {
        if let Some(snapshot) = self.read_slot(ListOrigin::Remote)? {
            return Ok(Some(snapshot));
        }
        if let Some(snapshot) = self.read_slot(ListOrigin::Draft)? {
            return Ok(Some(snapshot));
        }
        // Passcode drawn for a list that has no habits yet
        Ok(self.stored_passcode()?.map(|passcode| MirrorSnapshot {
            passcode,
            habits: HabitList::new(),
            origin: ListOrigin::Draft,
        }))
    }

    fn save(&self, habits: &HabitList, passcode: &Passcode, origin: ListOrigin) -> DomainResult<()> {
        let record = StoredList {
            passcode,
            habits: codec::encode_all(habits),
        };
        let json = serde_json::to_string(&record).map_err(|e| DomainError::Storage(e.to_string()))?;
        let other = match origin {
            ListOrigin::Draft => ListOrigin::Remote,
            ListOrigin::Remote => ListOrigin::Draft,
        };

        self.storage.apply(vec![
            StorageWrite::Set(slot_key(origin).to_string(), json),
            StorageWrite::Remove(slot_key(other).to_string()),
            StorageWrite::Set(PASSCODE_KEY.to_string(), passcode.to_string()),
        ])?;
        log::debug!("Mirrored {} habits for {}", habits.len(), passcode);
        Ok(())
    }

    fn clear(&self) -> DomainResult<()> {
        self.storage.apply(vec![
            StorageWrite::Remove(HABITS_KEY.to_string()),
            StorageWrite::Remove(HABIT_DATA_KEY.to_string()),
            StorageWrite::Remove(PASSCODE_KEY.to_string()),
        ])?;
        log::debug!("Local mirror cleared");
        Ok(())
    }
}

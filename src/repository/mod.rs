//! Repository Layer
//!
//! Data access abstractions and implementations.

mod mirror;
mod storage;
mod traits;
#[cfg(target_arch = "wasm32")]
mod web_storage;


pub use mirror::{StorageMirror, HABITS_KEY, HABIT_DATA_KEY, PASSCODE_KEY};
pub use storage::{FileStorage, MemoryStorage, Storage, StorageWrite};
pub use traits::{ListOrigin, LocalMirror, MirrorSnapshot, RemoteStore, MAX_PASSCODE_DRAWS};
#[cfg(target_arch = "wasm32")]
pub use web_storage::WebStorage;

/// Mirror kept in process memory
pub type MemoryMirror = StorageMirror<MemoryStorage>;
/// Mirror kept in a JSON file in the data directory
pub type FileMirror = StorageMirror<FileStorage>;

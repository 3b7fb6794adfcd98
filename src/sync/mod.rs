//! Sync Layer
//!
//! Talks to the remote passcode-keyed store.

mod client;
mod wire;

pub use client::SyncClient;
pub use wire::{HabitPayload, RemoteRecord};

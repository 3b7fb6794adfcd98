//! Repository Layer - Core Traits
//!
//! Defines the abstract interfaces for data access: the on-device mirror of
//! the list being edited, and the remote passcode-keyed store.

use async_trait::async_trait;

use crate::domain::{DomainError, DomainResult, HabitList, Passcode};

/// How many passcodes `claim_passcode` draws before giving up
pub const MAX_PASSCODE_DRAWS: usize = 5;

/// Where the list being edited came from. Decides the storage slot and
/// whether saving creates or replaces the remote record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListOrigin {
    /// Started on this device, never stored remotely
    Draft,
    /// Opened from the remote store by passcode
    Remote,
}

/// Everything the mirror holds about one session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MirrorSnapshot {
    pub passcode: Passcode,
    pub habits: HabitList,
    pub origin: ListOrigin,
}

/// On-device cache of the current list and its passcode.
///
/// `save` overwrites the whole snapshot; a mirror never holds half of one.
pub trait LocalMirror: Send + Sync {
    /// `None` means a fresh session, not an error
    fn load(&self) -> DomainResult<Option<MirrorSnapshot>>;

    fn save(&self, habits: &HabitList, passcode: &Passcode, origin: ListOrigin) -> DomainResult<()>;

    fn clear(&self) -> DomainResult<()>;
}

/// Remote key-value store addressed by passcode. Every write carries the
/// full list; there are no partial updates and no version checks.
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
pub trait RemoteStore: Send + Sync {
    /// Store `habits` under a passcode the caller already chose
    async fn create_at(&self, passcode: &Passcode, habits: &HabitList) -> DomainResult<()>;

    async fn fetch(&self, passcode: &Passcode) -> DomainResult<HabitList>;

    /// Overwrite the record unconditionally (last writer wins)
    async fn replace(&self, passcode: &Passcode, habits: &HabitList) -> DomainResult<()>;

    async fn remove(&self, passcode: &Passcode) -> DomainResult<()>;

    /// Whether a record exists under `passcode`. Also used to confirm a
    /// create whose response never arrived.
    async fn is_taken(&self, passcode: &Passcode) -> DomainResult<bool> {
        match self.fetch(passcode).await {
            Ok(_) => Ok(true),
            Err(DomainError::NotFound(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Return `preferred` if it is free, otherwise draw fresh passcodes until
    /// one is.
    async fn claim_passcode(&self, preferred: Option<Passcode>) -> DomainResult<Passcode> {
        let mut candidate = preferred.unwrap_or_else(Passcode::generate);
        for _ in 0..MAX_PASSCODE_DRAWS {
            if !self.is_taken(&candidate).await? {
                return Ok(candidate);
            }
            log::warn!("Passcode {} already in use, drawing another", candidate);
            candidate = Passcode::generate();
        }
        Err(DomainError::Remote(format!(
            "No free passcode after {} attempts",
            MAX_PASSCODE_DRAWS
        )))
    }

    /// Store `habits` under a freshly drawn passcode and return it
    async fn create(&self, habits: &HabitList) -> DomainResult<Passcode> {
        let passcode = self.claim_passcode(None).await?;
        self.create_at(&passcode, habits).await?;
        Ok(passcode)
    }
}

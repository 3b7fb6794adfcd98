//! Domain Layer - Core Entity Trait
//!
//! This trait defines the basic contract for all domain entities,
//! plus the error taxonomy shared by every layer above the domain.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Core trait for all domain entities
pub trait Entity: Sized + Send + Sync + Clone {
    /// The type of the entity's unique identifier
    type Id: Copy + Eq + std::hash::Hash + Send + Sync;

    /// Returns the entity's unique identifier
    fn id(&self) -> Self::Id;
}

/// Common result type for domain operations
pub type DomainResult<T> = Result<T, DomainError>;

/// Domain-level errors
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
pub enum DomainError {
    /// An encoded habit entry could not be read
    #[error("Malformed habit entry: {0}")]
    Decode(String),
    /// User input rejected before anything was mutated
    #[error("Invalid input: {0}")]
    Validation(String),
    /// No remote record exists for the passcode
    #[error("No habit list found for passcode {0}")]
    NotFound(String),
    #[error("Remote store error: {0}")]
    Remote(String),
    /// A create may or may not have been stored remotely
    #[error("Could not confirm that habits were saved under passcode {passcode}: {reason}")]
    Unconfirmed { passcode: String, reason: String },
    #[error("Local storage error: {0}")]
    Storage(String),
    #[error("A sync operation is already in progress")]
    Busy,
}

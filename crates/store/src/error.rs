use thiserror::Error;

use crate::Version;

/// Errors that can occur when reading or mutating keyed state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// The expected version did not match the stored version.
    #[error("Concurrency conflict for {key}: expected version {expected}, found {actual}")]
    ConcurrencyConflict {
        key: String,
        expected: Version,
        actual: Version,
    },

    /// No row exists for the key.
    #[error("Record not found: {0}")]
    NotFound(String),

    /// A row already exists for the key.
    #[error("Record already exists: {0}")]
    AlreadyExists(String),

    /// The entity lock could not be acquired in time.
    #[error("Could not acquire lock for {entity} '{key}' within {waited_ms} ms")]
    LockTimeout {
        entity: String,
        key: String,
        waited_ms: u128,
    },
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;

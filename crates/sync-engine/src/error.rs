// crates/sync-engine/src/error.rs
//! Error types for sync operations

use thiserror::Error;

/// Result type for sync operations
pub type SyncResult<T> = Result<T, SyncError>;

/// Errors that can occur during layout synchronization
#[derive(Debug, Error)]
pub enum SyncError {
    /// Layout failed structural validation; never retried
    #[error("Layout validation failed: {0}")]
    Validation(String),

    /// Storage layer failure
    #[error("Storage error: {0}")]
    Storage(#[from] tradedeck_storage::StorageError),

    /// The pending save was cancelled before it ran
    #[error("Pending save was cancelled")]
    Cancelled,

    /// Persistence of engine-local state (device id, status) failed
    #[error("State persistence error: {0}")]
    Persistence(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

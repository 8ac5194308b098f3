// crates/storage/src/error.rs
//! Error types for the storage layer

use thiserror::Error;
use tradedeck_resilience::{Classified, ErrorKind};

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// An error reported by a remote store implementation.
///
/// Carries its own retryability classification so callers never have
/// to pattern-match message text.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct StoreError {
    kind: ErrorKind,
    message: String,
}

impl StoreError {
    /// Creates a store error with an explicit classification
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Transient failure worth retrying (network, timeout, 5xx)
    pub fn retryable(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Retryable, message)
    }

    /// Definite failure (4xx, schema rejection); never retried
    pub fn permanent(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Permanent, message)
    }

    /// No network path at all
    pub fn offline() -> Self {
        Self::new(ErrorKind::Offline, "device is offline")
    }

    /// Returns the failure classification
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Returns the error message
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl Classified for StoreError {
    fn kind(&self) -> ErrorKind {
        self.kind
    }
}

/// Errors that can occur in the local storage layer
#[derive(Debug, Error)]
pub enum StorageError {
    /// Remote store failure
    #[error("Remote store error: {0}")]
    Remote(#[from] StoreError),

    /// Local persistence quota exhausted; the queue was cleared
    #[error("Offline queue storage quota exceeded; queue cleared")]
    QuotaExceeded,

    /// Queue file could not be read or written
    #[error("Queue persistence error: {0}")]
    QueueIo(#[from] std::io::Error),

    /// Queue contents could not be serialized
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// All retry attempts exhausted
    #[error("Save failed after {attempts} attempts: {last_error}")]
    RetriesExhausted { attempts: usize, last_error: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_error_classification() {
        assert_eq!(StoreError::retryable("timeout").kind(), ErrorKind::Retryable);
        assert_eq!(StoreError::permanent("bad id").kind(), ErrorKind::Permanent);
        assert_eq!(StoreError::offline().kind(), ErrorKind::Offline);
    }

    #[test]
    fn test_quota_error_display() {
        let err = StorageError::QuotaExceeded;
        assert!(err.to_string().contains("quota"));
    }
}

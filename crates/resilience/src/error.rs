// crates/resilience/src/error.rs
//! Error classification for retry decisions

use thiserror::Error;

/// Result type for retry operations
pub type RetryResult<T> = Result<T, RetryError>;

/// Structured failure classification.
///
/// Replaces pattern-matching on error message text: the layer that
/// produced an error knows whether it is worth retrying and says so.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Transient failure (network, timeout, 5xx); retry with backoff
    Retryable,
    /// Definite failure (bad request, auth); retrying will not help
    Permanent,
    /// No network path at all; route to the offline queue instead
    Offline,
}

/// An error whose retryability is known
pub trait Classified {
    /// Returns the failure classification
    fn kind(&self) -> ErrorKind;
}

/// Errors produced by the retry driver itself
#[derive(Debug, Error)]
pub enum RetryError {
    /// All retry attempts exhausted
    #[error("All {attempts} attempts exhausted: {last_error}")]
    AttemptsExhausted { attempts: usize, last_error: String },

    /// The operation failed with a non-retryable error
    #[error("Permanent failure: {0}")]
    Permanent(String),

    /// The operation reported the device offline
    #[error("Offline")]
    Offline,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attempts_exhausted_display() {
        let err = RetryError::AttemptsExhausted {
            attempts: 4,
            last_error: "connection reset".to_string(),
        };
        assert!(err.to_string().contains("4"));
        assert!(err.to_string().contains("connection reset"));
    }

    #[test]
    fn test_permanent_display() {
        let err = RetryError::Permanent("bad request".to_string());
        assert!(err.to_string().contains("bad request"));
    }
}

// crates/resilience/src/lib.rs
//! Resilience primitives for unreliable persistence paths
//!
//! Provides the retry policy used by the storage layer:
//! exponential backoff with a delay ceiling and random jitter, driven
//! by a structured error classification instead of message-text
//! pattern matching.

mod error;
mod retry;

pub use error::{Classified, ErrorKind, RetryError, RetryResult};
pub use retry::{retry, RetryPolicy};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_exports_accessible() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_retries(), 3);
        assert_ne!(ErrorKind::Retryable, ErrorKind::Permanent);
    }
}

// crates/resilience/src/retry.rs
//! Retry with exponential backoff and jitter

use crate::error::{Classified, ErrorKind, RetryError};
use rand::Rng;
use std::future::Future;
use std::time::Duration;

/// Retry policy configuration
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Retries after the initial attempt
    max_retries: usize,
    /// Base delay; attempt `n` waits `base * 2^n`
    base_delay: Duration,
    /// Ceiling on the computed delay, before jitter
    max_delay: Duration,
    /// Upper bound of the uniform random jitter added to each delay
    jitter: Duration,
}

impl RetryPolicy {
    /// Creates a policy with the given retry count
    pub fn new(max_retries: usize) -> Self {
        Self {
            max_retries,
            base_delay: Duration::from_millis(1000),
            max_delay: Duration::from_secs(30),
            jitter: Duration::from_millis(500),
        }
    }

    /// Sets the base delay
    pub fn with_base_delay(mut self, delay: Duration) -> Self {
        self.base_delay = delay;
        self
    }

    /// Sets the delay ceiling
    pub fn with_max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    /// Sets the jitter bound; zero disables jitter
    pub fn with_jitter(mut self, jitter: Duration) -> Self {
        self.jitter = jitter;
        self
    }

    /// Returns the configured retry count
    pub fn max_retries(&self) -> usize {
        self.max_retries
    }

    /// Backoff for a zero-based attempt index, jitter included.
    ///
    /// Jitter keeps a fleet of clients that failed together from
    /// retrying in lockstep.
    pub fn delay_for_attempt(&self, attempt: usize) -> Duration {
        let exp = 2u64.saturating_pow(attempt.min(u32::MAX as usize) as u32);
        let backoff = self
            .base_delay
            .saturating_mul(exp.min(u32::MAX as u64) as u32)
            .min(self.max_delay);

        if self.jitter.is_zero() {
            backoff
        } else {
            let jitter_ms = rand::thread_rng().gen_range(0..=self.jitter.as_millis() as u64);
            backoff + Duration::from_millis(jitter_ms)
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3)
    }
}

/// Drives an async operation under a retry policy.
///
/// Retryable errors back off and retry up to `max_retries` times, for
/// `max_retries + 1` attempts total. Permanent and offline errors
/// return immediately.
pub async fn retry<F, Fut, T, E>(policy: &RetryPolicy, mut operation: F) -> Result<T, RetryError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Classified + std::fmt::Display,
{
    let mut attempt = 0;
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(e) => match e.kind() {
                ErrorKind::Permanent => return Err(RetryError::Permanent(e.to_string())),
                ErrorKind::Offline => return Err(RetryError::Offline),
                ErrorKind::Retryable => {
                    if attempt >= policy.max_retries() {
                        return Err(RetryError::AttemptsExhausted {
                            attempts: attempt + 1,
                            last_error: e.to_string(),
                        });
                    }
                    let delay = policy.delay_for_attempt(attempt);
                    log::debug!(
                        "Retryable failure (attempt {}): {}; backing off {:?}",
                        attempt + 1,
                        e,
                        delay
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            },
        }
    }
}

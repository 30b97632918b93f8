//! Retry utilities with exponential backoff for resilient API calls.

use std::time::Duration;
use tokio::time::sleep;

use super::rate_limit::random_jitter;
use crate::config::RateLimitConfig;
use crate::sources::SourceError;

/// Configuration for retry behavior
#[derive(Debug, Clone, Copy)]
pub struct RetryConfig {
    /// Retries allowed after the first attempt
    pub max_retries: u32,
    /// Backoff unit; retry `n` (0-based) waits `backoff_base * 2^n`
    pub backoff_base: Duration,
    /// Upper bound of the uniform jitter added to each backoff
    pub max_jitter: Duration,
    /// Cap on the exponential part of the delay
    pub max_delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            backoff_base: Duration::from_secs(1),
            max_jitter: Duration::from_secs(1),
            max_delay: Duration::from_secs(60),
        }
    }
}

impl RetryConfig {
    pub fn from_config(config: &RateLimitConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            backoff_base: Duration::from_millis(config.backoff_base_ms),
            max_jitter: Duration::from_millis(config.backoff_jitter_ms),
            ..Self::default()
        }
    }

    pub fn max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn backoff_base(mut self, base: Duration) -> Self {
        self.backoff_base = base;
        self
    }

    pub fn max_jitter(mut self, jitter: Duration) -> Self {
        self.max_jitter = jitter;
        self
    }

    /// Exponential part of the delay before retry `retry` (0-based), without jitter
    pub fn backoff_delay(&self, retry: u32) -> Duration {
        let factor = 2f64.powi(retry.min(31) as i32);
        let secs = self.backoff_base.as_secs_f64() * factor;
        Duration::from_secs_f64(secs.min(self.max_delay.as_secs_f64()))
    }
}

/// Transient errors that should trigger a retry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransientError {
    /// Server answered 429
    RateLimit,
    /// Request timed out
    Timeout,
    /// Connection or transport failure
    Network,
}

impl TransientError {
    /// Check if a SourceError represents a transient error
    pub fn from_source_error(err: &SourceError) -> Option<Self> {
        match err {
            SourceError::RateLimit => Some(TransientError::RateLimit),
            SourceError::Timeout(_) => Some(TransientError::Timeout),
            SourceError::Network(_) => Some(TransientError::Network),
            _ => None,
        }
    }
}

/// Execute an async operation with retry logic
///
/// Transient failures are retried up to `max_retries` times, waiting
/// `backoff_base * 2^n + jitter` before retry `n`. Permanent failures and the
/// last transient failure are returned as-is.
pub async fn with_retry<T, F, Fut>(config: RetryConfig, operation: F) -> Result<T, SourceError>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T, SourceError>>,
{
    let mut retries = 0;
    let mut operation = operation;

    loop {
        match operation().await {
            Ok(result) => {
                if retries > 0 {
                    tracing::info!(
                        "Operation succeeded after {} transient failures",
                        retries
                    );
                }
                return Ok(result);
            }
            Err(error) => {
                let Some(transient) = TransientError::from_source_error(&error) else {
                    // Permanent error - return immediately
                    return Err(error);
                };

                if retries >= config.max_retries {
                    tracing::warn!(
                        "Operation failed after {} attempts: {}",
                        retries + 1,
                        error
                    );
                    return Err(error);
                }

                let delay = config.backoff_delay(retries) + random_jitter(config.max_jitter);
                tracing::warn!(
                    "Transient error ({:?}) on attempt {}, retrying in {:.2?}",
                    transient,
                    retries + 1,
                    delay
                );

                sleep(delay).await;
                retries += 1;
            }
        }
    }
}

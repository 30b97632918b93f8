//! Minimum-spacing rate limiter shared by every outbound request.

use rand::Rng;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::{sleep, Instant};

use crate::config::RateLimitConfig;

/// Serializes outbound calls in time: consecutive `acquire`s are at least
/// `base_delay + jitter` apart, with jitter drawn uniformly from `[0, max_jitter)`.
///
/// One limiter is meant to be shared (behind an `Arc`) by every build that
/// talks to the same API, so concurrent builds split one pacing budget.
#[derive(Debug)]
pub struct RateLimiter {
    base_delay: Duration,
    max_jitter: Duration,
    last_request: Mutex<Option<Instant>>,
}

impl RateLimiter {
    pub fn new(base_delay: Duration, max_jitter: Duration) -> Self {
        Self {
            base_delay,
            max_jitter,
            last_request: Mutex::new(None),
        }
    }

    pub fn from_config(config: &RateLimitConfig) -> Self {
        Self::new(
            Duration::from_millis(config.base_delay_ms),
            Duration::from_millis(config.jitter_ms),
        )
    }

    pub fn base_delay(&self) -> Duration {
        self.base_delay
    }

    /// Wait until the spacing since the previous request has elapsed, then
    /// record now as the latest request time.
    ///
    /// The lock is held across the wait so callers are released one at a time.
    pub async fn acquire(&self) {
        let mut last = self.last_request.lock().await;
        let required = self.base_delay + random_jitter(self.max_jitter);

        if let Some(previous) = *last {
            let elapsed = previous.elapsed();
            if elapsed < required {
                let wait = required - elapsed;
                tracing::trace!("rate limiter waiting {:?}", wait);
                sleep(wait).await;
            }
        }

        *last = Some(Instant::now());
    }
}

/// Uniform jitter in `[0, max)`; zero when `max` is zero
pub(crate) fn random_jitter(max: Duration) -> Duration {
    if max.is_zero() {
        return Duration::ZERO;
    }
    let secs = rand::thread_rng().gen_range(0.0..max.as_secs_f64());
    Duration::from_secs_f64(secs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test(start_paused = true)]
    async fn test_first_request_is_immediate() {
        let limiter = RateLimiter::new(Duration::from_millis(500), Duration::ZERO);
        let start = Instant::now();
        limiter.acquire().await;
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_sequential_requests_are_spaced() {
        let base = Duration::from_millis(500);
        let limiter = RateLimiter::new(base, Duration::from_millis(100));
        let n = 5;

        let start = Instant::now();
        for _ in 0..n {
            limiter.acquire().await;
        }
        let elapsed = start.elapsed();

        assert!(elapsed >= base * (n - 1));
        // jitter is bounded
        assert!(elapsed < (base + Duration::from_millis(100)) * (n - 1) + Duration::from_millis(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_callers_share_spacing() {
        let base = Duration::from_millis(200);
        let limiter = Arc::new(RateLimiter::new(base, Duration::ZERO));

        let start = Instant::now();
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let limiter = Arc::clone(&limiter);
                tokio::spawn(async move {
                    limiter.acquire().await;
                    Instant::now()
                })
            })
            .collect();

        let mut stamps = Vec::new();
        for handle in handles {
            stamps.push(handle.await.unwrap());
        }
        stamps.sort();

        for pair in stamps.windows(2) {
            assert!(pair[1] - pair[0] >= base);
        }
        assert!(start.elapsed() >= base * 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_wait_after_idle_period() {
        let base = Duration::from_millis(500);
        let limiter = RateLimiter::new(base, Duration::ZERO);

        limiter.acquire().await;
        sleep(Duration::from_secs(1)).await;

        let start = Instant::now();
        limiter.acquire().await;
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[test]
    fn test_random_jitter_bounds() {
        assert_eq!(random_jitter(Duration::ZERO), Duration::ZERO);
        for _ in 0..100 {
            assert!(random_jitter(Duration::from_millis(100)) < Duration::from_millis(100));
        }
    }
}

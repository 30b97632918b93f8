//! Rate-limited, retrying client for the bibliographic API.

use std::sync::Arc;

use super::http::{HttpClient, Transport};
use super::rate_limit::RateLimiter;
use super::retry::{with_retry, RetryConfig};
use crate::config::Config;
use crate::sources::SourceError;

/// Every outbound call passes through the shared [`RateLimiter`] (including
/// retry attempts), then through the retry policy.
#[derive(Debug, Clone)]
pub struct RateLimitedClient {
    transport: Arc<dyn Transport>,
    limiter: Arc<RateLimiter>,
    retry: RetryConfig,
}

impl RateLimitedClient {
    pub fn new(transport: Arc<dyn Transport>, limiter: Arc<RateLimiter>, retry: RetryConfig) -> Self {
        Self {
            transport,
            limiter,
            retry,
        }
    }

    /// Build the reqwest-backed client described by the configuration
    pub fn from_config(config: &Config) -> Result<Self, SourceError> {
        let transport = HttpClient::from_config(&config.pubmed)?;
        Ok(Self::new(
            Arc::new(transport),
            Arc::new(RateLimiter::from_config(&config.rate_limits)),
            RetryConfig::from_config(&config.rate_limits),
        ))
    }

    /// GET `url` and return the body of a 2xx response
    ///
    /// 429 and transport failures are retried with backoff; any other status
    /// fails immediately with [`SourceError::Http`].
    pub async fn request(&self, url: &str) -> Result<String, SourceError> {
        with_retry(self.retry, || async move {
            self.limiter.acquire().await;
            tracing::debug!("GET {}", url);

            let response = self.transport.get(url).await?;
            match response.status {
                200..=299 => Ok(response.body),
                429 => Err(SourceError::RateLimit),
                status => Err(SourceError::Http(status)),
            }
        })
        .await
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::utils::http::HttpResponse;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::time::Duration;
    use tokio::time::Instant;

    /// Transport that replays a script and records when each call arrived
    #[derive(Debug, Default)]
    pub(crate) struct ScriptedTransport {
        script: Mutex<VecDeque<Result<HttpResponse, SourceError>>>,
        calls: Mutex<Vec<Instant>>,
    }

    impl ScriptedTransport {
        pub(crate) fn new(script: Vec<Result<HttpResponse, SourceError>>) -> Self {
            Self {
                script: Mutex::new(script.into()),
                calls: Mutex::new(Vec::new()),
            }
        }

        pub(crate) fn calls(&self) -> Vec<Instant> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Transport for ScriptedTransport {
        async fn get(&self, _url: &str) -> Result<HttpResponse, SourceError> {
            self.calls.lock().unwrap().push(Instant::now());
            self.script
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(HttpResponse::new(200, "ok")))
        }
    }

    fn client_for(transport: Arc<ScriptedTransport>, base_delay: Duration) -> RateLimitedClient {
        RateLimitedClient::new(
            transport,
            Arc::new(RateLimiter::new(base_delay, Duration::ZERO)),
            RetryConfig::default().max_jitter(Duration::ZERO),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn test_succeeds_on_third_attempt_with_growing_backoff() {
        let transport = Arc::new(ScriptedTransport::new(vec![
            Err(SourceError::Network("connection reset".to_string())),
            Err(SourceError::Network("connection reset".to_string())),
            Ok(HttpResponse::new(200, "payload")),
        ]));
        let client = client_for(transport.clone(), Duration::from_millis(10));

        let body = client.request("http://example.test/x").await.unwrap();
        assert_eq!(body, "payload");

        let calls = transport.calls();
        assert_eq!(calls.len(), 3);
        let first_gap = calls[1] - calls[0];
        let second_gap = calls[2] - calls[1];
        assert!(first_gap >= Duration::from_secs(1));
        assert!(second_gap >= Duration::from_secs(2));
        assert!(second_gap > first_gap);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rate_limited_status_is_retried() {
        let transport = Arc::new(ScriptedTransport::new(vec![
            Ok(HttpResponse::new(429, "")),
            Ok(HttpResponse::new(200, "done")),
        ]));
        let client = client_for(transport.clone(), Duration::from_millis(10));

        assert_eq!(client.request("http://example.test").await.unwrap(), "done");
        assert_eq!(transport.calls().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_non_retryable_status_fails_immediately() {
        let transport = Arc::new(ScriptedTransport::new(vec![Ok(HttpResponse::new(500, ""))]));
        let client = client_for(transport.clone(), Duration::from_millis(10));

        let err = client.request("http://example.test").await.unwrap_err();
        assert!(matches!(err, SourceError::Http(500)));
        assert_eq!(transport.calls().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhausted_retries_return_failure() {
        let transport = Arc::new(ScriptedTransport::new(
            (0..10).map(|_| Ok(HttpResponse::new(429, ""))).collect(),
        ));
        let client = client_for(transport.clone(), Duration::from_millis(10));

        let err = client.request("http://example.test").await.unwrap_err();
        assert!(matches!(err, SourceError::RateLimit));
        assert_eq!(transport.calls().len(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_sequential_requests_respect_base_delay() {
        let base = Duration::from_millis(500);
        let transport = Arc::new(ScriptedTransport::default());
        let client = client_for(transport.clone(), base);
        let n: u32 = 6;

        let start = Instant::now();
        for _ in 0..n {
            client.request("http://example.test").await.unwrap();
        }

        assert!(start.elapsed() >= base * (n - 1));
        for pair in transport.calls().windows(2) {
            assert!(pair[1] - pair[0] >= base);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_attempt_still_counts_for_spacing() {
        let base = Duration::from_millis(500);
        let transport = Arc::new(ScriptedTransport::new(vec![Ok(HttpResponse::new(404, ""))]));
        let client = client_for(transport.clone(), base);

        assert!(client.request("http://example.test/a").await.is_err());
        client.request("http://example.test/b").await.unwrap();

        let calls = transport.calls();
        assert!(calls[1] - calls[0] >= base);
    }
}

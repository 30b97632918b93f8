//! HTTP transport utilities.

use async_trait::async_trait;
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;

use crate::config::PubMedConfig;
use crate::sources::SourceError;

/// Status and body of a completed HTTP exchange
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Something that can perform a GET and hand back status and body
///
/// Non-2xx statuses are returned as responses, not errors; only transport
/// failures (connect, timeout, body read) are errors.
#[async_trait]
pub trait Transport: Send + Sync + std::fmt::Debug {
    async fn get(&self, url: &str) -> Result<HttpResponse, SourceError>;
}

/// Shared HTTP client with sensible defaults
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Arc<Client>,
}

impl HttpClient {
    /// Create a new HTTP client with default settings
    pub fn new() -> Result<Self, SourceError> {
        Self::with_settings(
            concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")),
            Duration::from_secs(30),
            Duration::from_secs(10),
        )
    }

    /// Create a client using the PubMed timeouts
    pub fn from_config(config: &PubMedConfig) -> Result<Self, SourceError> {
        Self::with_settings(
            concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")),
            config.request_timeout(),
            config.connect_timeout(),
        )
    }

    /// Create a new HTTP client with a custom user agent and timeouts
    pub fn with_settings(
        user_agent: &str,
        timeout: Duration,
        connect_timeout: Duration,
    ) -> Result<Self, SourceError> {
        let client = Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .connect_timeout(connect_timeout)
            .pool_idle_timeout(Duration::from_secs(90))
            .build()
            .map_err(|e| SourceError::Other(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client: Arc::new(client),
        })
    }
}

#[async_trait]
impl Transport for HttpClient {
    async fn get(&self, url: &str) -> Result<HttpResponse, SourceError> {
        let response = self.client.get(url).send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;
        Ok(HttpResponse { status, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_success_range() {
        assert!(HttpResponse::new(200, "").is_success());
        assert!(HttpResponse::new(204, "").is_success());
        assert!(!HttpResponse::new(429, "").is_success());
        assert!(!HttpResponse::new(500, "").is_success());
    }

    #[tokio::test]
    async fn test_transport_returns_error_statuses_as_responses() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/limited")
            .with_status(429)
            .with_body("slow down")
            .create_async()
            .await;

        let client = HttpClient::new().unwrap();
        let response = client
            .get(&format!("{}/limited", server.url()))
            .await
            .unwrap();

        assert_eq!(response.status, 429);
        assert_eq!(response.body, "slow down");
        mock.assert_async().await;
    }
}

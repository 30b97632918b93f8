//! Utility modules supporting outbound API access.
//!
//! - [`HttpClient`]: reqwest-backed [`Transport`] with sensible timeouts
//! - [`RateLimiter`]: minimum spacing plus jitter between outbound calls
//! - [`RetryConfig`] / [`with_retry`]: exponential backoff on transient errors
//! - [`RateLimitedClient`]: the three combined; the only way sources reach the network
//!
//! # Rate-limited requests
//!
//! ```rust,no_run
//! use citegraph::config::Config;
//! use citegraph::utils::RateLimitedClient;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let client = RateLimitedClient::from_config(&Config::default())?;
//! let _body = client
//!     .request("https://eutils.ncbi.nlm.nih.gov/entrez/eutils/einfo.fcgi?retmode=json")
//!     .await?;
//! # Ok(())
//! # }
//! ```

mod client;
mod http;
mod rate_limit;
mod retry;

pub use client::RateLimitedClient;
pub use http::{HttpClient, HttpResponse, Transport};
pub use rate_limit::RateLimiter;
pub use retry::{with_retry, RetryConfig, TransientError};

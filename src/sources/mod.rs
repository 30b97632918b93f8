//! Bibliographic sources the graph builder crawls.
//!
//! A source turns a publication identifier into descriptive metadata and the
//! two directed relationship sets ("cites" and "cited-by"). The transport
//! behind it (HTTP, request shape, encoding) stays an implementation detail.
//!
//! - [`PubMedSource`]: NCBI E-utilities (`esummary` + `elink`), paced by a
//!   shared [`RateLimitedClient`](crate::utils::RateLimitedClient)
//! - [`MockSource`]: in-memory corpus for tests and offline demos

mod pubmed;

pub mod mock;

pub use mock::MockSource;
pub use pubmed::PubMedSource;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::models::Publication;

/// Related identifiers of one publication
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relationships {
    /// Works this publication cites
    pub references: Vec<String>,
    /// Works citing this publication
    pub citations: Vec<String>,
}

impl Relationships {
    pub fn new(references: Vec<String>, citations: Vec<String>) -> Self {
        Self {
            references,
            citations,
        }
    }

    /// Total number of related identifiers
    pub fn len(&self) -> usize {
        self.references.len() + self.citations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.references.is_empty() && self.citations.is_empty()
    }
}

/// The CitationSource trait defines the interface the graph builder crawls.
///
/// Failures are reported as [`SourceError`]; the builder treats them as
/// "unknown" data for that node and never aborts a build because of them.
#[async_trait]
pub trait CitationSource: Send + Sync + std::fmt::Debug {
    /// Unique identifier for this source (e.g. "pubmed")
    fn id(&self) -> &str;

    /// Human-readable name of this source
    fn name(&self) -> &str;

    /// Fetch descriptive metadata; `Ok(None)` when the source has no record
    async fn get_details(&self, id: &str) -> Result<Option<Publication>, SourceError>;

    /// Fetch the references and citing works of a publication
    async fn get_relationships(&self, id: &str) -> Result<Relationships, SourceError>;
}

/// Errors that can occur when interacting with a source
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// Connection or transport failure
    #[error("Network error: {0}")]
    Network(String),

    /// Request timed out
    #[error("Request timed out: {0}")]
    Timeout(String),

    /// Rate limit exceeded (HTTP 429)
    #[error("Rate limit exceeded")]
    RateLimit,

    /// Non-success HTTP status that is not retried
    #[error("HTTP status {0}")]
    Http(u16),

    /// Parsing error (JSON)
    #[error("Parse error: {0}")]
    Parse(String),

    /// Invalid request parameters
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Publication not found
    #[error("Publication not found: {0}")]
    NotFound(String),

    /// Error reported inside an API payload
    #[error("API error: {0}")]
    Api(String),

    /// Other error
    #[error("Error: {0}")]
    Other(String),
}

impl From<reqwest::Error> for SourceError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            SourceError::Timeout(err.to_string())
        } else {
            SourceError::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for SourceError {
    fn from(err: serde_json::Error) -> Self {
        SourceError::Parse(format!("JSON: {}", err))
    }
}

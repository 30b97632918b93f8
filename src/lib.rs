//! # citegraph
//!
//! Builds a citation graph around a seed publication by crawling the PubMed
//! E-utilities API, then computes structural analytics over the result.
//!
//! ## Architecture
//!
//! The library is organized into several modules:
//!
//! - [`models`]: Core data structures (Publication, CitationGraph, report views)
//! - [`sources`]: Bibliographic sources behind the [`CitationSource`] trait
//! - [`utils`]: HTTP transport, rate limiting and retry with backoff
//! - [`graph`]: Graph store, breadth-first builder and the service facade
//! - [`analytics`]: Centrality, clustering, path and structure metrics
//! - [`config`]: Configuration management

pub mod analytics;
pub mod config;
pub mod graph;
pub mod models;
pub mod sources;
pub mod utils;

// Re-export commonly used types
pub use analytics::{AnalyticsEngine, AnalyticsResult, NodeAnalytics};
pub use graph::{GraphError, GraphService, GraphStore};
pub use models::{CitationGraph, GraphStatus, Publication, RelationshipType};
pub use sources::{CitationSource, Relationships, SourceError};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

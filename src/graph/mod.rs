//! Graph lifecycle: storage, budgeted crawling and the facade adapters call.
//!
//! - [`GraphStore`]: graphs keyed by id, each behind its own lock
//! - [`GraphBuilder`]: breadth-first crawl from the seed under a node budget
//! - [`GraphService`]: the operations exposed to the CLI or any other adapter

mod builder;
mod service;
mod store;

pub use builder::GraphBuilder;
pub use service::GraphService;
pub use store::{GraphHandle, GraphStore};

use crate::models::GraphStatus;

/// Errors surfaced by graph operations
#[derive(Debug, thiserror::Error)]
pub enum GraphError {
    /// No graph is stored under this id
    #[error("Graph not found: {0}")]
    NotFound(String),

    /// A graph is already stored under this id
    #[error("Graph already exists: {0}")]
    AlreadyExists(String),

    /// Analytics requested before the build reached a terminal state
    #[error("Graph {graph_id} is not ready (status: {status})")]
    NotReady {
        graph_id: String,
        status: GraphStatus,
    },

    /// Lifecycle transition not allowed from the current state
    #[error("Graph {graph_id} cannot change state from {status}")]
    InvalidState {
        graph_id: String,
        status: GraphStatus,
    },

    /// The publication is not a node of the graph
    #[error("Node {node_id} not found in graph {graph_id}")]
    NodeNotFound { graph_id: String, node_id: String },

    /// An edge would reference a node the graph does not hold
    #[error("Edge {source_id} -> {target_id} has an endpoint missing from graph {graph_id}")]
    MissingEndpoint {
        graph_id: String,
        source_id: String,
        target_id: String,
    },
}

impl GraphError {
    /// Whether the error means "no such graph or node"
    pub fn is_not_found(&self) -> bool {
        matches!(self, GraphError::NotFound(_) | GraphError::NodeNotFound { .. })
    }
}

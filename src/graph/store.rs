//! In-memory registry of citation graphs.

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use super::GraphError;
use crate::models::{CitationGraph, GraphData, GraphStatusReport, GraphSummary};

/// Shared handle to one stored graph
///
/// The builder takes the write lock only for the duration of one node
/// attachment, so readers always see whole nodes and edges.
pub type GraphHandle = Arc<RwLock<CitationGraph>>;

/// Graphs keyed by id
///
/// The map and every graph have their own lock: looking up one graph never
/// waits on a build of another.
#[derive(Debug, Default)]
pub struct GraphStore {
    graphs: RwLock<HashMap<String, GraphHandle>>,
}

impl GraphStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new graph in the `initializing` state
    pub async fn create(&self, id: &str, seed_id: &str) -> Result<GraphHandle, GraphError> {
        let mut graphs = self.graphs.write().await;
        if graphs.contains_key(id) {
            return Err(GraphError::AlreadyExists(id.to_string()));
        }

        let handle = Arc::new(RwLock::new(CitationGraph::new(id, seed_id)));
        graphs.insert(id.to_string(), handle.clone());
        tracing::debug!(graph_id = id, seed = seed_id, "graph registered");
        Ok(handle)
    }

    pub async fn get(&self, id: &str) -> Result<GraphHandle, GraphError> {
        self.graphs
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| GraphError::NotFound(id.to_string()))
    }

    pub async fn get_status(&self, id: &str) -> Result<GraphStatusReport, GraphError> {
        let handle = self.get(id).await?;
        let graph = handle.read().await;
        Ok(graph.status_report())
    }

    pub async fn get_data(&self, id: &str) -> Result<GraphData, GraphError> {
        let handle = self.get(id).await?;
        let graph = handle.read().await;
        Ok(graph.data())
    }

    /// Summaries of every stored graph, oldest first
    pub async fn list(&self) -> Vec<GraphSummary> {
        let handles: Vec<GraphHandle> = self.graphs.read().await.values().cloned().collect();

        let mut summaries = Vec::with_capacity(handles.len());
        for handle in handles {
            summaries.push(handle.read().await.summary());
        }
        summaries.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.graph_id.cmp(&b.graph_id))
        });
        summaries
    }

    /// Remove a graph; a build still holding its handle finishes on the detached copy
    pub async fn delete(&self, id: &str) -> Result<(), GraphError> {
        match self.graphs.write().await.remove(id) {
            Some(_) => {
                tracing::debug!(graph_id = id, "graph deleted");
                Ok(())
            }
            None => Err(GraphError::NotFound(id.to_string())),
        }
    }

    pub async fn len(&self) -> usize {
        self.graphs.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.graphs.read().await.is_empty()
    }
}

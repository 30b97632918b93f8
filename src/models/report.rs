//! Serializable views of a graph handed to the adapter layer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{GraphStatus, RelationshipType};

/// One entry of the graph listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphSummary {
    pub graph_id: String,
    pub seed_id: String,
    pub status: GraphStatus,
    pub total_articles: usize,
    pub created_at: DateTime<Utc>,
}

/// Progress of a graph build
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphStatusReport {
    pub graph_id: String,
    pub status: GraphStatus,
    pub total_articles: usize,
    pub processed_articles: usize,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub limit_reached: bool,
}

/// Final counts of a finished build
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildResult {
    pub graph_id: String,
    pub status: GraphStatus,
    pub total_articles: usize,
    pub total_relationships: usize,
    /// Edges tagged `cites`
    pub references: usize,
    /// Edges tagged `cited_by`
    pub citations: usize,
    pub limit_reached: bool,
}

/// Node of the visualisation view
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeView {
    pub id: String,
    pub title: String,
    pub authors: Vec<String>,
    pub journal: String,
    pub pub_date: String,
    pub is_seed: bool,
    pub placeholder: bool,
}

/// Edge of the visualisation view
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeView {
    pub source: String,
    pub target: String,
    #[serde(rename = "type")]
    pub kind: RelationshipType,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphMetadata {
    pub graph_id: String,
    pub seed_id: String,
    pub status: GraphStatus,
    pub total_articles: usize,
    pub total_relationships: usize,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub limit_reached: bool,
}

/// Full graph snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphData {
    pub nodes: Vec<NodeView>,
    pub edges: Vec<EdgeView>,
    pub metadata: GraphMetadata,
}

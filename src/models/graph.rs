//! Citation graph model: publications as nodes, typed relationships as edges.
//!
//! Uses petgraph's `DiGraph` for storage, with an identifier index on the side.

use chrono::{DateTime, Utc};
use petgraph::graph::{DiGraph, EdgeIndex, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::report::{
    BuildResult, EdgeView, GraphData, GraphMetadata, GraphStatusReport, GraphSummary, NodeView,
};
use super::Publication;
use crate::graph::GraphError;

/// Direction tag of a relationship edge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationshipType {
    /// Source publication references the target
    Cites,
    /// Source publication is a citing work of the target
    CitedBy,
}

impl RelationshipType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RelationshipType::Cites => "cites",
            RelationshipType::CitedBy => "cited_by",
        }
    }
}

impl std::fmt::Display for RelationshipType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle of a graph build
///
/// `Initializing -> Building -> {Completed, CompletedWithLimit}`; terminal
/// states are never left.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GraphStatus {
    Initializing,
    Building,
    Completed,
    CompletedWithLimit,
}

impl GraphStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            GraphStatus::Initializing => "initializing",
            GraphStatus::Building => "building",
            GraphStatus::Completed => "completed",
            GraphStatus::CompletedWithLimit => "completed_with_limit",
        }
    }

    /// Whether the build has finished (the graph is immutable from here on)
    pub fn is_terminal(&self) -> bool {
        matches!(self, GraphStatus::Completed | GraphStatus::CompletedWithLimit)
    }
}

impl std::fmt::Display for GraphStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A citation graph built around one seed publication
#[derive(Debug, Clone)]
pub struct CitationGraph {
    id: String,
    seed_id: String,
    created_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
    status: GraphStatus,
    processed_articles: usize,
    limit_reached: bool,
    requested_depth: Option<usize>,
    graph: DiGraph<Publication, RelationshipType>,
    index: HashMap<String, NodeIndex>,
}

impl CitationGraph {
    /// Create an empty graph in the `initializing` state
    pub fn new(id: impl Into<String>, seed_id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            seed_id: seed_id.into(),
            created_at: Utc::now(),
            completed_at: None,
            status: GraphStatus::Initializing,
            processed_articles: 0,
            limit_reached: false,
            requested_depth: None,
            graph: DiGraph::new(),
            index: HashMap::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn seed_id(&self) -> &str {
        &self.seed_id
    }

    pub fn status(&self) -> GraphStatus {
        self.status
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    pub fn processed_articles(&self) -> usize {
        self.processed_articles
    }

    pub fn limit_reached(&self) -> bool {
        self.limit_reached
    }

    pub fn requested_depth(&self) -> Option<usize> {
        self.requested_depth
    }

    /// Number of publications (the `total_articles` of the reports)
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Number of relationship edges
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Number of edges carrying the given tag
    pub fn count_relationships(&self, kind: RelationshipType) -> usize {
        self.graph.edge_weights().filter(|k| **k == kind).count()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    pub fn publication(&self, id: &str) -> Option<&Publication> {
        self.index.get(id).map(|idx| &self.graph[*idx])
    }

    /// Publications in insertion order
    pub fn publications(&self) -> impl Iterator<Item = &Publication> {
        self.graph.node_weights()
    }

    /// Edges as `(source id, target id, tag)` in insertion order
    pub fn relationships(&self) -> impl Iterator<Item = (&str, &str, RelationshipType)> {
        self.graph.edge_references().map(move |e| {
            (
                self.graph[e.source()].id.as_str(),
                self.graph[e.target()].id.as_str(),
                *e.weight(),
            )
        })
    }

    /// Underlying petgraph storage
    pub fn inner(&self) -> &DiGraph<Publication, RelationshipType> {
        &self.graph
    }

    /// Identifiers of the publications this one points at
    pub fn successors(&self, id: &str) -> Vec<String> {
        self.neighbor_ids(id, Direction::Outgoing)
    }

    /// Identifiers of the publications pointing at this one
    pub fn predecessors(&self, id: &str) -> Vec<String> {
        self.neighbor_ids(id, Direction::Incoming)
    }

    fn neighbor_ids(&self, id: &str, direction: Direction) -> Vec<String> {
        let Some(&idx) = self.index.get(id) else {
            return Vec::new();
        };
        let mut seen = Vec::new();
        // petgraph walks adjacency newest-first
        let mut neighbors: Vec<NodeIndex> = self.graph.neighbors_directed(idx, direction).collect();
        neighbors.reverse();
        for n in neighbors {
            let neighbor_id = &self.graph[n].id;
            if !seen.contains(neighbor_id) {
                seen.push(neighbor_id.clone());
            }
        }
        seen
    }

    /// Attach a publication as a node; an already-present identifier is left untouched
    pub fn add_publication(&mut self, publication: Publication) -> NodeIndex {
        if let Some(&idx) = self.index.get(&publication.id) {
            return idx;
        }
        let id = publication.id.clone();
        let idx = self.graph.add_node(publication);
        self.index.insert(id, idx);
        idx
    }

    /// Insert a typed edge between two attached publications
    ///
    /// Idempotent per `(source, target, kind)`: returns `Ok(false)` when the
    /// edge already exists.
    pub fn add_relationship(
        &mut self,
        source: &str,
        target: &str,
        kind: RelationshipType,
    ) -> Result<bool, GraphError> {
        let (Some(&from), Some(&to)) = (self.index.get(source), self.index.get(target)) else {
            return Err(GraphError::MissingEndpoint {
                graph_id: self.id.clone(),
                source_id: source.to_string(),
                target_id: target.to_string(),
            });
        };

        if self.find_edge(from, to, kind).is_some() {
            return Ok(false);
        }
        self.graph.add_edge(from, to, kind);
        Ok(true)
    }

    fn find_edge(&self, from: NodeIndex, to: NodeIndex, kind: RelationshipType) -> Option<EdgeIndex> {
        self.graph
            .edges_connecting(from, to)
            .find(|e| *e.weight() == kind)
            .map(|e| e.id())
    }

    /// Move from `initializing` to `building`
    pub fn begin_build(&mut self, requested_depth: Option<usize>) -> Result<(), GraphError> {
        if self.status != GraphStatus::Initializing {
            return Err(GraphError::InvalidState {
                graph_id: self.id.clone(),
                status: self.status,
            });
        }
        self.status = GraphStatus::Building;
        self.requested_depth = requested_depth;
        Ok(())
    }

    pub fn set_processed_articles(&mut self, processed: usize) {
        self.processed_articles = processed;
    }

    /// Enter the terminal state and stamp the completion time
    pub fn complete(&mut self, limit_reached: bool) -> Result<(), GraphError> {
        if self.status != GraphStatus::Building {
            return Err(GraphError::InvalidState {
                graph_id: self.id.clone(),
                status: self.status,
            });
        }
        self.limit_reached = limit_reached;
        self.status = if limit_reached {
            GraphStatus::CompletedWithLimit
        } else {
            GraphStatus::Completed
        };
        self.completed_at = Some(Utc::now());
        Ok(())
    }

    pub fn summary(&self) -> GraphSummary {
        GraphSummary {
            graph_id: self.id.clone(),
            seed_id: self.seed_id.clone(),
            status: self.status,
            total_articles: self.node_count(),
            created_at: self.created_at,
        }
    }

    pub fn status_report(&self) -> GraphStatusReport {
        GraphStatusReport {
            graph_id: self.id.clone(),
            status: self.status,
            total_articles: self.node_count(),
            processed_articles: self.processed_articles,
            created_at: self.created_at,
            completed_at: self.completed_at,
            limit_reached: self.limit_reached,
        }
    }

    pub fn build_result(&self) -> BuildResult {
        BuildResult {
            graph_id: self.id.clone(),
            status: self.status,
            total_articles: self.node_count(),
            total_relationships: self.edge_count(),
            references: self.count_relationships(RelationshipType::Cites),
            citations: self.count_relationships(RelationshipType::CitedBy),
            limit_reached: self.limit_reached,
        }
    }

    /// Consistent snapshot of nodes, edges and metadata for visualisation
    pub fn data(&self) -> GraphData {
        let nodes = self
            .publications()
            .map(|p| NodeView {
                id: p.id.clone(),
                title: p.title.clone(),
                authors: p.authors.clone(),
                journal: p.journal.clone(),
                pub_date: p.pub_date.clone(),
                is_seed: p.id == self.seed_id,
                placeholder: p.placeholder,
            })
            .collect();

        let edges = self
            .relationships()
            .map(|(source, target, kind)| EdgeView {
                source: source.to_string(),
                target: target.to_string(),
                kind,
            })
            .collect::<Vec<_>>();

        GraphData {
            nodes,
            metadata: GraphMetadata {
                graph_id: self.id.clone(),
                seed_id: self.seed_id.clone(),
                status: self.status,
                total_articles: self.node_count(),
                total_relationships: edges.len(),
                created_at: self.created_at,
                completed_at: self.completed_at,
                limit_reached: self.limit_reached,
            },
            edges,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn graph_with(ids: &[&str]) -> CitationGraph {
        let mut graph = CitationGraph::new("g", ids[0]);
        for id in ids {
            graph.add_publication(Publication::new(*id, format!("Article {}", id)));
        }
        graph
    }

    #[test]
    fn test_relationship_insert_is_idempotent() {
        let mut graph = graph_with(&["1", "2"]);

        assert!(graph.add_relationship("1", "2", RelationshipType::Cites).unwrap());
        assert!(!graph.add_relationship("1", "2", RelationshipType::Cites).unwrap());
        assert_eq!(graph.edge_count(), 1);
    }

    #[test]
    fn test_distinct_types_are_distinct_edges() {
        let mut graph = graph_with(&["1", "2"]);

        graph.add_relationship("1", "2", RelationshipType::Cites).unwrap();
        graph.add_relationship("1", "2", RelationshipType::CitedBy).unwrap();
        assert_eq!(graph.edge_count(), 2);
        assert_eq!(graph.successors("1"), vec!["2".to_string()]);
    }

    #[test]
    fn test_relationship_requires_both_endpoints() {
        let mut graph = graph_with(&["1"]);

        let err = graph
            .add_relationship("1", "404", RelationshipType::Cites)
            .unwrap_err();
        assert!(matches!(err, GraphError::MissingEndpoint { .. }));
        assert_eq!(graph.edge_count(), 0);
    }

    #[test]
    fn test_publication_is_not_overwritten() {
        let mut graph = graph_with(&["1"]);
        graph.add_publication(Publication::placeholder("1"));

        assert_eq!(graph.node_count(), 1);
        assert_eq!(graph.publication("1").unwrap().title, "Article 1");
    }

    #[test]
    fn test_lifecycle() {
        let mut graph = CitationGraph::new("g", "1");
        assert_eq!(graph.status(), GraphStatus::Initializing);
        assert!(graph.complete(false).is_err());

        graph.begin_build(Some(3)).unwrap();
        assert_eq!(graph.status(), GraphStatus::Building);
        assert!(graph.begin_build(None).is_err());

        graph.complete(true).unwrap();
        assert_eq!(graph.status(), GraphStatus::CompletedWithLimit);
        assert!(graph.status().is_terminal());
        assert!(graph.completed_at().is_some());
        assert!(graph.begin_build(None).is_err());
    }

    #[test]
    fn test_neighbor_lists() {
        let mut graph = graph_with(&["1", "2", "3", "4"]);
        graph.add_relationship("1", "2", RelationshipType::Cites).unwrap();
        graph.add_relationship("1", "3", RelationshipType::Cites).unwrap();
        graph.add_relationship("4", "1", RelationshipType::CitedBy).unwrap();

        assert_eq!(graph.successors("1"), vec!["2", "3"]);
        assert_eq!(graph.predecessors("1"), vec!["4"]);
        assert!(graph.successors("404").is_empty());
    }

    #[test]
    fn test_data_view_marks_seed() {
        let mut graph = graph_with(&["1", "2"]);
        graph.add_relationship("1", "2", RelationshipType::Cites).unwrap();

        let data = graph.data();
        assert_eq!(data.nodes.len(), 2);
        assert!(data.nodes.iter().find(|n| n.id == "1").unwrap().is_seed);
        assert!(!data.nodes.iter().find(|n| n.id == "2").unwrap().is_seed);
        assert_eq!(data.edges[0].kind, RelationshipType::Cites);
        assert_eq!(data.metadata.total_relationships, 1);
    }
}

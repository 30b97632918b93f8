//! Core data models for publications, citation graphs and their reports.

mod graph;
mod publication;
mod report;

pub use graph::{CitationGraph, GraphStatus, RelationshipType};
pub use publication::{Publication, PublicationBuilder};
pub use report::{
    BuildResult, EdgeView, GraphData, GraphMetadata, GraphStatusReport, GraphSummary, NodeView,
};

//! Analytics result types.
//!
//! Every facet is optional: a facet that failed to compute is `None` (or an
//! empty map for a single centrality measure) while the rest of the result
//! stays usable.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Per-node score keyed by publication id
pub type Scores = BTreeMap<String, f64>;

/// Full analysis of one graph snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsResult {
    pub graph_id: String,
    pub generated_at: DateTime<Utc>,
    pub basic_statistics: Option<BasicStatistics>,
    pub centrality_measures: CentralityMeasures,
    pub clustering_analysis: Option<ClusteringAnalysis>,
    pub path_analysis: Option<PathAnalysis>,
    pub network_structure: Option<NetworkStructure>,
    pub research_insights: Option<ResearchInsights>,
    pub summary: Option<Summary>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BasicStatistics {
    pub total_nodes: usize,
    pub total_edges: usize,
    pub density: f64,
    /// Mean of in-degree plus out-degree
    pub average_degree: f64,
    pub max_degree: usize,
    pub min_degree: usize,
    /// Weak connectivity
    pub is_connected: bool,
    pub number_of_components: usize,
    pub largest_component_size: usize,
}

/// One map per measure; a measure that failed is left empty
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CentralityMeasures {
    pub degree_centrality: Scores,
    pub betweenness_centrality: Scores,
    pub closeness_centrality: Scores,
    pub eigenvector_centrality: Scores,
    pub pagerank: Scores,
    pub hubs: Scores,
    pub authorities: Scores,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusteringAnalysis {
    /// Average local clustering of the undirected projection
    pub global_clustering: f64,
    pub local_clustering: Scores,
    pub average_local_clustering: f64,
    /// Community label per node; empty without a detector
    pub communities: BTreeMap<String, usize>,
    pub number_of_communities: usize,
    pub community_sizes: BTreeMap<usize, usize>,
    pub modularity: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathAnalysis {
    pub strongly_connected: bool,
    /// Size of the strong component the metrics below are taken over
    pub largest_component_size: usize,
    pub average_shortest_path: Option<f64>,
    pub diameter: Option<usize>,
    pub radius: Option<usize>,
    pub eccentricity: BTreeMap<String, usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkStructure {
    pub degree_distribution: Option<DegreeDistribution>,
    pub assortativity: Option<f64>,
    pub reciprocity: Option<f64>,
    pub transitivity: Option<f64>,
    pub node_types: NodeTypes,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DegreeDistribution {
    pub mean: f64,
    pub median: f64,
    /// Population standard deviation
    pub std: f64,
    pub min: usize,
    pub max: usize,
}

/// Hubs cite far more than average, authorities are cited far more than average
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeTypes {
    pub hubs: Vec<String>,
    pub authorities: Vec<String>,
    pub avg_out_degree: f64,
    pub avg_in_degree: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedNode {
    pub id: String,
    pub score: f64,
}

/// A node citing many works while being cited little
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmergingNode {
    pub id: String,
    pub out_degree: usize,
    pub in_degree: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResearchInsights {
    pub top_influential_papers: Vec<RankedNode>,
    pub bridge_papers: Vec<RankedNode>,
    pub emerging_topics: Vec<EmergingNode>,
    pub isolated_nodes: Vec<String>,
    pub well_connected_clusters: Vec<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyMetrics {
    pub total_articles: usize,
    pub total_connections: usize,
    pub network_density: f64,
    pub is_connected: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub key_metrics: KeyMetrics,
    pub most_influential_paper: Option<RankedNode>,
    pub most_bridging_paper: Option<RankedNode>,
    pub clustering_coefficient: Option<f64>,
    pub research_communities: Option<usize>,
}

/// Degree breakdown, neighbourhood and scores of one publication
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeAnalytics {
    pub node_id: String,
    pub degree: usize,
    pub in_degree: usize,
    pub out_degree: usize,
    /// Same as `successors`: neighbours along edge direction
    pub neighbors: Vec<String>,
    pub predecessors: Vec<String>,
    pub successors: Vec<String>,
    pub degree_centrality_score: Option<f64>,
    pub betweenness_centrality_score: Option<f64>,
    pub closeness_centrality_score: Option<f64>,
    pub eigenvector_centrality_score: Option<f64>,
    pub pagerank_score: Option<f64>,
    pub hubs_score: Option<f64>,
    pub authorities_score: Option<f64>,
}

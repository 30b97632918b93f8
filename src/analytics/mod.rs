//! Structural analytics over a finished citation graph.
//!
//! Every facet (basic statistics, each centrality measure, clustering, paths,
//! structure, insights, summary) is computed on its own. A facet that fails
//! is logged and reported as `None` or an empty map; the remaining facets are
//! unaffected.
//!
//! ```rust
//! use citegraph::analytics::AnalyticsEngine;
//! use citegraph::config::AnalyticsConfig;
//! use citegraph::models::{CitationGraph, Publication, RelationshipType};
//!
//! let mut graph = CitationGraph::new("g", "1");
//! graph.add_publication(Publication::new("1", "Seed"));
//! graph.add_publication(Publication::new("2", "Reference"));
//! graph.add_relationship("1", "2", RelationshipType::Cites).unwrap();
//!
//! let result = AnalyticsEngine::new(AnalyticsConfig::default()).analyze(&graph);
//! assert_eq!(result.basic_statistics.unwrap().total_edges, 1);
//! ```

pub mod centrality;
pub mod clustering;
#[cfg(feature = "louvain")]
pub mod louvain;
pub mod paths;
pub mod structure;

mod insights;
mod projection;
mod types;

pub use clustering::{CommunityDetector, NoCommunityDetection, Partition};
#[cfg(feature = "louvain")]
pub use louvain::Louvain;
pub use projection::Projection;
pub use types::{
    AnalyticsResult, BasicStatistics, CentralityMeasures, ClusteringAnalysis, DegreeDistribution,
    EmergingNode, KeyMetrics, NetworkStructure, NodeAnalytics, NodeTypes, PathAnalysis,
    RankedNode, ResearchInsights, Scores, Summary,
};

use chrono::Utc;
use std::sync::Arc;
use std::time::Instant;

use crate::config::AnalyticsConfig;
use crate::graph::GraphError;
use crate::models::CitationGraph;

/// Why a single facet could not be computed
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AnalyticsError {
    #[error("graph has no nodes")]
    EmptyGraph,

    #[error("{measure} did not converge within {iterations} iterations")]
    NoConvergence {
        measure: &'static str,
        iterations: usize,
    },

    #[error("degenerate graph: {0}")]
    Degenerate(String),
}

/// Score vectors aligned with projection node order; `None` when the measure failed
#[derive(Debug, Default)]
struct CentralityScores {
    degree: Option<Vec<f64>>,
    betweenness: Option<Vec<f64>>,
    closeness: Option<Vec<f64>>,
    eigenvector: Option<Vec<f64>>,
    pagerank: Option<Vec<f64>>,
    hubs: Option<Vec<f64>>,
    authorities: Option<Vec<f64>>,
}

impl CentralityScores {
    fn to_measures(&self, p: &Projection) -> CentralityMeasures {
        let map = |scores: &Option<Vec<f64>>| {
            scores
                .as_deref()
                .map(|s| p.scores_map(s))
                .unwrap_or_default()
        };
        CentralityMeasures {
            degree_centrality: map(&self.degree),
            betweenness_centrality: map(&self.betweenness),
            closeness_centrality: map(&self.closeness),
            eigenvector_centrality: map(&self.eigenvector),
            pagerank: map(&self.pagerank),
            hubs: map(&self.hubs),
            authorities: map(&self.authorities),
        }
    }
}

/// Computes [`AnalyticsResult`]s and [`NodeAnalytics`] from graph snapshots
#[derive(Debug, Clone)]
pub struct AnalyticsEngine {
    config: AnalyticsConfig,
    detector: Arc<dyn CommunityDetector>,
}

impl AnalyticsEngine {
    pub fn new(config: AnalyticsConfig) -> Self {
        let detector = default_detector(config.community_detection);
        Self { config, detector }
    }

    /// Replace the community detector
    pub fn with_detector(mut self, detector: impl CommunityDetector + 'static) -> Self {
        self.detector = Arc::new(detector);
        self
    }

    /// Analyse the current state of `graph`
    pub fn analyze(&self, graph: &CitationGraph) -> AnalyticsResult {
        let started = Instant::now();
        let p = Projection::from_graph(graph);

        let scores = self.centrality(&p);
        let basic_statistics = facet("basic_statistics", basic_statistics(&p));
        let clustering_analysis = facet(
            "clustering",
            clustering::analyze(&p, self.detector.as_ref()),
        );
        let path_analysis = facet("paths", paths::analyze(&p));
        let network_structure = facet("structure", structure::analyze(&p));
        let research_insights = Some(insights::analyze(
            &p,
            scores.pagerank.as_deref(),
            scores.betweenness.as_deref(),
        ));
        let summary = facet(
            "summary",
            summarize(&p, &scores, clustering_analysis.as_ref()),
        );

        tracing::info!(
            graph_id = graph.id(),
            nodes = p.node_count(),
            edges = p.arc_count(),
            "analytics generated in {:.2?}",
            started.elapsed()
        );

        AnalyticsResult {
            graph_id: graph.id().to_string(),
            generated_at: Utc::now(),
            basic_statistics,
            centrality_measures: scores.to_measures(&p),
            clustering_analysis,
            path_analysis,
            network_structure,
            research_insights,
            summary,
        }
    }

    /// Degrees, neighbourhood and fresh centrality scores of one node
    pub fn node_analytics(
        &self,
        graph: &CitationGraph,
        node_id: &str,
    ) -> Result<NodeAnalytics, GraphError> {
        let p = Projection::from_graph(graph);
        let v = p.index_of(node_id).ok_or_else(|| GraphError::NodeNotFound {
            graph_id: graph.id().to_string(),
            node_id: node_id.to_string(),
        })?;

        let scores = self.centrality(&p);
        let score = |s: &Option<Vec<f64>>| s.as_ref().and_then(|s| s.get(v).copied());
        let successors = p.ids_of(p.successors(v));

        Ok(NodeAnalytics {
            node_id: node_id.to_string(),
            degree: p.degree(v),
            in_degree: p.in_degree(v),
            out_degree: p.out_degree(v),
            neighbors: successors.clone(),
            predecessors: p.ids_of(p.predecessors(v)),
            successors,
            degree_centrality_score: score(&scores.degree),
            betweenness_centrality_score: score(&scores.betweenness),
            closeness_centrality_score: score(&scores.closeness),
            eigenvector_centrality_score: score(&scores.eigenvector),
            pagerank_score: score(&scores.pagerank),
            hubs_score: score(&scores.hubs),
            authorities_score: score(&scores.authorities),
        })
    }

    fn centrality(&self, p: &Projection) -> CentralityScores {
        let config = &self.config;
        let (hubs, authorities) = facet("hits", centrality::hits(p, config.hits_max_iter)).unzip();

        CentralityScores {
            degree: Some(centrality::degree(p)),
            betweenness: Some(centrality::betweenness(
                p,
                config.betweenness_sample_size,
                config.sample_seed,
            )),
            closeness: Some(centrality::closeness(p)),
            eigenvector: facet(
                "eigenvector",
                centrality::eigenvector(p, config.eigenvector_max_iter),
            ),
            pagerank: facet(
                "pagerank",
                centrality::pagerank(p, config.pagerank_damping, config.pagerank_max_iter),
            ),
            hubs,
            authorities,
        }
    }
}

#[cfg(feature = "louvain")]
fn default_detector(enabled: bool) -> Arc<dyn CommunityDetector> {
    if enabled {
        Arc::new(Louvain::new())
    } else {
        Arc::new(NoCommunityDetection)
    }
}

#[cfg(not(feature = "louvain"))]
fn default_detector(_enabled: bool) -> Arc<dyn CommunityDetector> {
    Arc::new(NoCommunityDetection)
}

/// Keep a facet's value or log why it is missing
fn facet<T>(name: &str, result: Result<T, AnalyticsError>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::warn!(facet = name, "analytics facet unavailable: {}", e);
            None
        }
    }
}

fn basic_statistics(p: &Projection) -> Result<BasicStatistics, AnalyticsError> {
    let degrees = p.degrees();
    let (Some(&min_degree), Some(&max_degree)) = (degrees.iter().min(), degrees.iter().max())
    else {
        return Err(AnalyticsError::EmptyGraph);
    };
    let components = p.weak_components();

    Ok(BasicStatistics {
        total_nodes: p.node_count(),
        total_edges: p.arc_count(),
        density: p.density(),
        average_degree: degrees.iter().sum::<usize>() as f64 / degrees.len() as f64,
        max_degree,
        min_degree,
        is_connected: components.len() == 1,
        number_of_components: components.len(),
        largest_component_size: components.iter().map(Vec::len).max().unwrap_or(0),
    })
}

fn summarize(
    p: &Projection,
    scores: &CentralityScores,
    clustering: Option<&ClusteringAnalysis>,
) -> Result<Summary, AnalyticsError> {
    if p.is_empty() {
        return Err(AnalyticsError::EmptyGraph);
    }

    Ok(Summary {
        key_metrics: KeyMetrics {
            total_articles: p.node_count(),
            total_connections: p.arc_count(),
            network_density: p.density(),
            is_connected: p.weak_components().len() == 1,
        },
        most_influential_paper: scores
            .pagerank
            .as_deref()
            .and_then(|s| insights::best(p, s)),
        most_bridging_paper: scores
            .betweenness
            .as_deref()
            .and_then(|s| insights::best(p, s)),
        clustering_coefficient: clustering.map(|c| c.global_clustering),
        research_communities: clustering.map(|c| c.number_of_communities),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Publication, RelationshipType};

    fn citation_graph(ids: &[&str], cites: &[(&str, &str)]) -> CitationGraph {
        let mut graph = CitationGraph::new("g", ids.first().copied().unwrap_or("seed"));
        for id in ids {
            graph.add_publication(Publication::new(*id, format!("Article {}", id)));
        }
        for (source, target) in cites {
            graph
                .add_relationship(source, target, RelationshipType::Cites)
                .unwrap();
        }
        graph
    }

    fn seven_node_graph() -> CitationGraph {
        citation_graph(
            &["1", "2", "3", "4", "5", "6", "7"],
            &[
                ("1", "2"),
                ("1", "3"),
                ("4", "1"),
                ("5", "1"),
                ("6", "2"),
                ("2", "6"),
                ("3", "6"),
            ],
        )
    }

    fn engine() -> AnalyticsEngine {
        AnalyticsEngine::new(AnalyticsConfig::default())
    }

    /// Detector that returns a malformed partition
    #[derive(Debug)]
    struct BrokenDetector;

    impl CommunityDetector for BrokenDetector {
        fn name(&self) -> &str {
            "broken"
        }

        fn detect(&self, _graph: &Projection) -> Option<Partition> {
            Some(Partition {
                labels: vec![0],
                modularity: None,
            })
        }
    }

    #[test]
    fn test_seven_node_graph() {
        let result = engine().analyze(&seven_node_graph());

        let basic = result.basic_statistics.unwrap();
        assert_eq!(basic.total_nodes, 7);
        assert_eq!(basic.total_edges, 7);
        assert!(!basic.is_connected);
        assert_eq!(basic.number_of_components, 2);
        assert_eq!(basic.largest_component_size, 6);
        assert_eq!(basic.max_degree, 4);
        assert_eq!(basic.min_degree, 0);

        let structure = result.network_structure.unwrap();
        assert!(structure.degree_distribution.is_some());
        assert!(structure.reciprocity.is_some());

        let centrality = &result.centrality_measures;
        assert_eq!(centrality.pagerank.len(), 7);
        assert_eq!(centrality.betweenness_centrality.len(), 7);
        assert_eq!(centrality.hubs.len(), 7);

        let insights = result.research_insights.unwrap();
        assert_eq!(insights.isolated_nodes, vec!["7"]);
        assert_eq!(insights.top_influential_papers.len(), 5);

        let summary = result.summary.unwrap();
        assert_eq!(summary.key_metrics.total_articles, 7);
        assert_eq!(summary.most_influential_paper.unwrap().id, "6");
        assert!(summary.research_communities.unwrap() >= 2);
    }

    #[test]
    fn test_node_analytics_of_seed() {
        let node = engine().node_analytics(&seven_node_graph(), "1").unwrap();

        assert_eq!(node.in_degree, 2);
        assert_eq!(node.out_degree, 2);
        assert_eq!(node.degree, 4);
        assert_eq!(node.successors, vec!["2", "3"]);
        assert_eq!(node.neighbors, node.successors);
        assert_eq!(node.predecessors, vec!["4", "5"]);
        assert!(node.pagerank_score.is_some());
        assert!((node.degree_centrality_score.unwrap() - 4.0 / 6.0).abs() < 1e-12);
    }

    #[test]
    fn test_node_analytics_unknown_node() {
        let err = engine()
            .node_analytics(&seven_node_graph(), "404")
            .unwrap_err();
        assert!(matches!(err, GraphError::NodeNotFound { .. }));
    }

    #[test]
    fn test_single_node_graph() {
        let result = engine().analyze(&citation_graph(&["1"], &[]));

        let basic = result.basic_statistics.unwrap();
        assert_eq!(basic.density, 0.0);
        assert!(basic.is_connected);

        let paths = result.path_analysis.unwrap();
        assert_eq!(paths.diameter, None);
        assert_eq!(paths.average_shortest_path, None);
        assert_eq!(paths.radius, None);

        let clustering = result.clustering_analysis.unwrap();
        assert_eq!(clustering.global_clustering, 0.0);

        // HITS is undefined without edges; the other measures still exist
        assert!(result.centrality_measures.hubs.is_empty());
        assert_eq!(result.centrality_measures.pagerank.len(), 1);
        assert_eq!(result.summary.unwrap().key_metrics.network_density, 0.0);
    }

    #[test]
    fn test_failing_facet_is_isolated() {
        let result = engine()
            .with_detector(BrokenDetector)
            .analyze(&seven_node_graph());

        assert!(result.clustering_analysis.is_none());
        assert!(result.basic_statistics.is_some());
        assert!(result.path_analysis.is_some());
        let summary = result.summary.unwrap();
        assert!(summary.clustering_coefficient.is_none());
        assert!(summary.research_communities.is_none());
    }

    #[test]
    fn test_detection_can_be_disabled() {
        let config = AnalyticsConfig {
            community_detection: false,
            ..AnalyticsConfig::default()
        };
        let result = AnalyticsEngine::new(config).analyze(&seven_node_graph());

        let clustering = result.clustering_analysis.unwrap();
        assert!(clustering.communities.is_empty());
        assert_eq!(clustering.number_of_communities, 0);
    }

    #[test]
    fn test_empty_graph_yields_empty_facets() {
        let result = engine().analyze(&CitationGraph::new("g", "1"));

        assert!(result.basic_statistics.is_none());
        assert!(result.summary.is_none());
        assert!(result.centrality_measures.pagerank.is_empty());
    }
}

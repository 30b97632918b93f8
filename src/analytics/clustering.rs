//! Clustering coefficients and pluggable community detection.

use std::collections::{BTreeMap, HashSet};

use super::projection::Projection;
use super::types::ClusteringAnalysis;
use super::AnalyticsError;

/// Community assignment produced by a [`CommunityDetector`]
#[derive(Debug, Clone, PartialEq)]
pub struct Partition {
    /// Community label per node, numbered from 0 in order of first appearance
    pub labels: Vec<usize>,
    pub modularity: Option<f64>,
}

impl Partition {
    pub fn community_count(&self) -> usize {
        self.labels.iter().collect::<HashSet<_>>().len()
    }
}

/// Community detection over the undirected projection
///
/// Optional capability: the engine works with [`NoCommunityDetection`], and the
/// Louvain detector is only compiled with the `louvain` feature.
pub trait CommunityDetector: Send + Sync + std::fmt::Debug {
    fn name(&self) -> &str;

    /// `None` when no partition is available
    fn detect(&self, graph: &Projection) -> Option<Partition>;
}

/// Detector that never finds communities
#[derive(Debug, Default, Clone, Copy)]
pub struct NoCommunityDetection;

impl CommunityDetector for NoCommunityDetection {
    fn name(&self) -> &str {
        "none"
    }

    fn detect(&self, _graph: &Projection) -> Option<Partition> {
        None
    }
}

/// Number of undirected triangles through each node
pub fn triangles(p: &Projection) -> Vec<usize> {
    let n = p.node_count();
    let neighbor_sets: Vec<HashSet<usize>> = (0..n)
        .map(|v| p.neighbors(v).iter().copied().collect())
        .collect();

    (0..n)
        .map(|v| {
            let nbrs = p.neighbors(v);
            let mut count = 0;
            for (i, &a) in nbrs.iter().enumerate() {
                for &b in &nbrs[i + 1..] {
                    if neighbor_sets[a].contains(&b) {
                        count += 1;
                    }
                }
            }
            count
        })
        .collect()
}

/// Local clustering coefficient of every node (0 below degree 2)
pub fn local_clustering(p: &Projection) -> Vec<f64> {
    triangles(p)
        .into_iter()
        .enumerate()
        .map(|(v, t)| {
            let d = p.neighbors(v).len();
            if d < 2 {
                0.0
            } else {
                2.0 * t as f64 / (d * (d - 1)) as f64
            }
        })
        .collect()
}

/// Coefficients plus the detector's partition, if any
pub fn analyze(
    p: &Projection,
    detector: &dyn CommunityDetector,
) -> Result<ClusteringAnalysis, AnalyticsError> {
    if p.is_empty() {
        return Err(AnalyticsError::EmptyGraph);
    }

    let local = local_clustering(p);
    let average = local.iter().sum::<f64>() / local.len() as f64;

    let (communities, community_sizes, number_of_communities, modularity) =
        match detector.detect(p) {
            Some(partition) if partition.labels.len() != p.node_count() => {
                return Err(AnalyticsError::Degenerate(format!(
                    "{} labelled {} of {} nodes",
                    detector.name(),
                    partition.labels.len(),
                    p.node_count()
                )));
            }
            Some(partition) => {
                let mut sizes: BTreeMap<usize, usize> = BTreeMap::new();
                for &label in &partition.labels {
                    *sizes.entry(label).or_default() += 1;
                }
                let assignment = (0..p.node_count())
                    .map(|v| (p.id(v).to_string(), partition.labels[v]))
                    .collect();
                tracing::debug!(
                    detector = detector.name(),
                    communities = sizes.len(),
                    "community detection finished"
                );
                (assignment, sizes.clone(), sizes.len(), partition.modularity)
            }
            None => (BTreeMap::new(), BTreeMap::new(), 0, None),
        };

    Ok(ClusteringAnalysis {
        global_clustering: average,
        local_clustering: p.scores_map(&local),
        average_local_clustering: average,
        communities,
        number_of_communities,
        community_sizes,
        modularity,
    })
}

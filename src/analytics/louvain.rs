//! Louvain modularity optimisation on the undirected projection.

use std::collections::BTreeMap;

use super::clustering::{CommunityDetector, Partition};
use super::projection::Projection;

/// Moves smaller than this do not count as an improvement
const MIN_GAIN: f64 = 1e-12;

/// Deterministic Louvain detector (resolution 1, unit edge weights)
///
/// Nodes are visited in node order on every pass, so the same graph always
/// yields the same partition.
#[derive(Debug, Clone)]
pub struct Louvain {
    max_levels: usize,
    max_passes: usize,
}

impl Default for Louvain {
    fn default() -> Self {
        Self {
            max_levels: 32,
            max_passes: 1000,
        }
    }
}

impl Louvain {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Symmetric weighted graph; `adj[i]` maps neighbour to weight, self-loops included
#[derive(Debug, Clone)]
struct Weighted {
    adj: Vec<BTreeMap<usize, f64>>,
}

impl Weighted {
    fn from_projection(p: &Projection) -> Self {
        let adj = (0..p.node_count())
            .map(|v| p.neighbors(v).iter().map(|&w| (w, 1.0)).collect())
            .collect();
        Self { adj }
    }

    fn len(&self) -> usize {
        self.adj.len()
    }

    /// Weighted degree; a self-loop counts twice
    fn degree(&self, v: usize) -> f64 {
        self.adj[v]
            .iter()
            .map(|(&w, &weight)| if w == v { 2.0 * weight } else { weight })
            .sum()
    }

    fn total_weight(&self) -> f64 {
        (0..self.len()).map(|v| self.degree(v)).sum::<f64>() / 2.0
    }

    /// Collapse every community into one node
    fn aggregate(&self, labels: &[usize], communities: usize) -> Self {
        let mut adj: Vec<BTreeMap<usize, f64>> = vec![BTreeMap::new(); communities];
        for (v, nbrs) in self.adj.iter().enumerate() {
            for (&w, &weight) in nbrs {
                let (cv, cw) = (labels[v], labels[w]);
                if cv == cw {
                    // each internal edge is seen from both ends, a self-loop once
                    let share = if v == w { weight } else { weight / 2.0 };
                    *adj[cv].entry(cv).or_default() += share;
                } else {
                    *adj[cv].entry(cw).or_default() += weight;
                }
            }
        }
        Self { adj }
    }
}

impl Louvain {
    /// Local moving phase; returns compact labels and whether any node moved
    fn one_level(&self, graph: &Weighted, m: f64) -> (Vec<usize>, bool) {
        let n = graph.len();
        let degrees: Vec<f64> = (0..n).map(|v| graph.degree(v)).collect();
        let mut community: Vec<usize> = (0..n).collect();
        let mut totals = degrees.clone();
        let mut moved_any = false;

        for _ in 0..self.max_passes {
            let mut moved = false;
            for v in 0..n {
                let current = community[v];
                let k = degrees[v];
                totals[current] -= k;

                let mut links: BTreeMap<usize, f64> = BTreeMap::new();
                for (&w, &weight) in &graph.adj[v] {
                    if w != v {
                        *links.entry(community[w]).or_default() += weight;
                    }
                }

                let gain = |c: usize, link: f64| link - totals[c] * k / (2.0 * m);
                let mut best = current;
                let mut best_gain = gain(current, links.get(&current).copied().unwrap_or(0.0));
                for (&c, &link) in &links {
                    let g = gain(c, link);
                    if g > best_gain + MIN_GAIN {
                        best = c;
                        best_gain = g;
                    }
                }

                totals[best] += k;
                if best != current {
                    community[v] = best;
                    moved = true;
                    moved_any = true;
                }
            }
            if !moved {
                break;
            }
        }

        (renumber(&community), moved_any)
    }
}

/// Relabel from 0 in order of first appearance
fn renumber(labels: &[usize]) -> Vec<usize> {
    let mut mapping: BTreeMap<usize, usize> = BTreeMap::new();
    labels
        .iter()
        .map(|label| {
            let next = mapping.len();
            *mapping.entry(*label).or_insert(next)
        })
        .collect()
}

/// Newman modularity of a partition of the unweighted undirected projection
pub fn modularity(p: &Projection, labels: &[usize]) -> Option<f64> {
    let graph = Weighted::from_projection(p);
    let m = graph.total_weight();
    if m == 0.0 {
        return None;
    }

    let communities = labels.iter().max().map_or(0, |c| c + 1);
    let mut internal = vec![0.0; communities];
    let mut degree_sum = vec![0.0; communities];
    for v in 0..graph.len() {
        degree_sum[labels[v]] += graph.degree(v);
        for &w in graph.adj[v].keys() {
            if labels[w] == labels[v] {
                internal[labels[v]] += 0.5;
            }
        }
    }

    Some(
        internal
            .iter()
            .zip(&degree_sum)
            .map(|(l, d)| l / m - (d / (2.0 * m)).powi(2))
            .sum(),
    )
}

impl CommunityDetector for Louvain {
    fn name(&self) -> &str {
        "louvain"
    }

    fn detect(&self, p: &Projection) -> Option<Partition> {
        let n = p.node_count();
        if n == 0 {
            return None;
        }

        let mut graph = Weighted::from_projection(p);
        let m = graph.total_weight();
        if m == 0.0 {
            return Some(Partition {
                labels: (0..n).collect(),
                modularity: None,
            });
        }

        let mut labels: Vec<usize> = (0..n).collect();
        for _ in 0..self.max_levels {
            let (level, moved) = self.one_level(&graph, m);
            if !moved {
                break;
            }
            for label in labels.iter_mut() {
                *label = level[*label];
            }
            let communities = level.iter().max().map_or(0, |c| c + 1);
            graph = graph.aggregate(&level, communities);
        }

        let labels = renumber(&labels);
        let modularity = modularity(p, &labels);
        Some(Partition { labels, modularity })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::projection::tests::{fixture, seven_nodes};

    fn two_triangles() -> Projection {
        fixture(
            &["a", "b", "c", "x", "y", "z"],
            &[
                ("a", "b"),
                ("b", "c"),
                ("c", "a"),
                ("x", "y"),
                ("y", "z"),
                ("z", "x"),
                ("c", "x"),
            ],
        )
    }

    #[test]
    fn test_splits_two_triangles() {
        let partition = Louvain::new().detect(&two_triangles()).unwrap();

        assert_eq!(partition.labels, vec![0, 0, 0, 1, 1, 1]);
        assert_eq!(partition.community_count(), 2);
        let q = partition.modularity.unwrap();
        assert!((q - 5.0 / 14.0).abs() < 1e-9);
    }

    #[test]
    fn test_is_deterministic() {
        let a = Louvain::new().detect(&seven_nodes()).unwrap();
        let b = Louvain::new().detect(&seven_nodes()).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.labels.len(), 7);
        // the isolated node keeps its own community
        assert!(a.labels[..6].iter().all(|l| *l != a.labels[6]));
    }

    #[test]
    fn test_edgeless_graph_is_all_singletons() {
        let partition = Louvain::new().detect(&fixture(&["a", "b"], &[])).unwrap();
        assert_eq!(partition.labels, vec![0, 1]);
        assert!(partition.modularity.is_none());
    }

    #[test]
    fn test_modularity_of_single_community_is_zero() {
        let p = two_triangles();
        let q = modularity(&p, &[0; 6]).unwrap();
        assert!(q.abs() < 1e-12);
    }
}

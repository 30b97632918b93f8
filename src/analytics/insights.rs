//! Research-oriented heuristics derived from structure and centrality.

use super::projection::Projection;
use super::types::{EmergingNode, RankedNode, ResearchInsights};

const TOP_N: usize = 5;
const MAX_CLUSTERS: usize = 3;
const MIN_CLUSTER_SIZE: usize = 3;

/// Emerging work cites more than this many publications...
const EMERGING_MIN_OUT: usize = 2;
/// ...while being cited at most this often
const EMERGING_MAX_IN: usize = 1;

pub fn analyze(
    p: &Projection,
    pagerank: Option<&[f64]>,
    betweenness: Option<&[f64]>,
) -> ResearchInsights {
    let isolated_nodes = (0..p.node_count())
        .filter(|&v| p.degree(v) == 0)
        .map(|v| p.id(v).to_string())
        .collect();

    let well_connected_clusters = p
        .weak_components()
        .into_iter()
        .filter(|c| c.len() >= MIN_CLUSTER_SIZE)
        .take(MAX_CLUSTERS)
        .map(|c| p.ids_of(&c))
        .collect();

    ResearchInsights {
        top_influential_papers: pagerank.map(|s| top_ranked(p, s, TOP_N)).unwrap_or_default(),
        bridge_papers: betweenness
            .map(|s| top_ranked(p, s, TOP_N))
            .unwrap_or_default(),
        emerging_topics: emerging(p),
        isolated_nodes,
        well_connected_clusters,
    }
}

/// Highest scores first; ties keep node order
pub fn top_ranked(p: &Projection, scores: &[f64], limit: usize) -> Vec<RankedNode> {
    let mut ranked: Vec<(usize, f64)> = scores.iter().copied().enumerate().collect();
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
    ranked
        .into_iter()
        .take(limit)
        .map(|(v, score)| RankedNode {
            id: p.id(v).to_string(),
            score,
        })
        .collect()
}

/// The single highest score; the first node wins a tie
pub fn best(p: &Projection, scores: &[f64]) -> Option<RankedNode> {
    top_ranked(p, scores, 1).into_iter().next()
}

fn emerging(p: &Projection) -> Vec<EmergingNode> {
    let mut candidates: Vec<EmergingNode> = (0..p.node_count())
        .filter(|&v| p.out_degree(v) > EMERGING_MIN_OUT && p.in_degree(v) <= EMERGING_MAX_IN)
        .map(|v| EmergingNode {
            id: p.id(v).to_string(),
            out_degree: p.out_degree(v),
            in_degree: p.in_degree(v),
        })
        .collect();
    candidates.sort_by(|a, b| b.out_degree.cmp(&a.out_degree));
    candidates.truncate(TOP_N);
    candidates
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::projection::tests::{fixture, seven_nodes};

    #[test]
    fn test_isolated_and_clusters() {
        let insights = analyze(&seven_nodes(), None, None);

        assert_eq!(insights.isolated_nodes, vec!["7"]);
        assert_eq!(insights.well_connected_clusters.len(), 1);
        assert_eq!(insights.well_connected_clusters[0].len(), 6);
        assert!(insights.top_influential_papers.is_empty());
        assert!(insights.bridge_papers.is_empty());
    }

    #[test]
    fn test_top_ranked_is_stable_on_ties() {
        let p = fixture(&["a", "b", "c"], &[]);
        let ranked = top_ranked(&p, &[0.2, 0.5, 0.5], 2);

        assert_eq!(ranked[0].id, "b");
        assert_eq!(ranked[1].id, "c");
        assert_eq!(best(&p, &[0.1, 0.1, 0.0]).unwrap().id, "a");
    }

    #[test]
    fn test_emerging_nodes() {
        let p = fixture(
            &["e", "f", "a", "b", "c", "d"],
            &[
                ("e", "a"),
                ("e", "b"),
                ("e", "c"),
                ("e", "d"),
                ("f", "a"),
                ("f", "b"),
                ("f", "c"),
                ("a", "f"),
                ("b", "f"),
            ],
        );
        let insights = analyze(&p, None, None);

        // f is cited twice, so only e qualifies
        assert_eq!(
            insights.emerging_topics,
            vec![EmergingNode {
                id: "e".to_string(),
                out_degree: 4,
                in_degree: 0,
            }]
        );
    }

    #[test]
    fn test_at_most_three_clusters() {
        let p = fixture(
            &["a1", "a2", "a3", "b1", "b2", "b3", "c1", "c2", "c3", "d1", "d2", "d3"],
            &[
                ("a1", "a2"),
                ("a2", "a3"),
                ("b1", "b2"),
                ("b2", "b3"),
                ("c1", "c2"),
                ("c2", "c3"),
                ("d1", "d2"),
                ("d2", "d3"),
            ],
        );
        let insights = analyze(&p, None, None);

        assert_eq!(insights.well_connected_clusters.len(), 3);
        assert_eq!(insights.well_connected_clusters[0], vec!["a1", "a2", "a3"]);
    }
}

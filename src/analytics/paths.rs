//! Distance metrics restricted to the largest strongly connected component.

use std::collections::{BTreeMap, VecDeque};

use super::projection::Projection;
use super::types::PathAnalysis;
use super::AnalyticsError;

pub fn analyze(p: &Projection) -> Result<PathAnalysis, AnalyticsError> {
    if p.is_empty() {
        return Err(AnalyticsError::EmptyGraph);
    }

    let components = p.strong_components();
    let strongly_connected = components.len() == 1;
    let largest = components
        .into_iter()
        .reduce(|best, c| if c.len() > best.len() { c } else { best })
        .unwrap_or_default();

    if largest.len() <= 1 {
        return Ok(PathAnalysis {
            strongly_connected,
            largest_component_size: largest.len(),
            average_shortest_path: None,
            diameter: None,
            radius: None,
            eccentricity: BTreeMap::new(),
        });
    }

    let mut member = vec![false; p.node_count()];
    for &v in &largest {
        member[v] = true;
    }

    let s = largest.len();
    let mut total = 0usize;
    let mut eccentricity = BTreeMap::new();
    for &v in &largest {
        let distances = bfs_within(p, v, &member);
        let mut farthest = 0;
        for &w in &largest {
            // the component is strongly connected, so every member is reached
            let d = distances[w].ok_or_else(|| {
                AnalyticsError::Degenerate(format!(
                    "{} unreachable from {} inside a strong component",
                    p.id(w),
                    p.id(v)
                ))
            })?;
            total += d;
            farthest = farthest.max(d);
        }
        eccentricity.insert(p.id(v).to_string(), farthest);
    }

    let diameter = eccentricity.values().copied().max();
    let radius = eccentricity.values().copied().min();

    Ok(PathAnalysis {
        strongly_connected,
        largest_component_size: s,
        average_shortest_path: Some(total as f64 / (s * (s - 1)) as f64),
        diameter,
        radius,
        eccentricity,
    })
}

/// Hop counts from `source` along arcs that stay inside `member`
fn bfs_within(p: &Projection, source: usize, member: &[bool]) -> Vec<Option<usize>> {
    let mut distances = vec![None; p.node_count()];
    let mut queue = VecDeque::from([source]);
    distances[source] = Some(0);

    while let Some(v) = queue.pop_front() {
        let next = distances[v].map_or(0, |d| d + 1);
        for &w in p.successors(v) {
            if member[w] && distances[w].is_none() {
                distances[w] = Some(next);
                queue.push_back(w);
            }
        }
    }
    distances
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::projection::tests::{fixture, seven_nodes};

    #[test]
    fn test_strongly_connected_cycle() {
        let p = fixture(&["a", "b", "c"], &[("a", "b"), ("b", "c"), ("c", "a")]);
        let paths = analyze(&p).unwrap();

        assert!(paths.strongly_connected);
        assert_eq!(paths.largest_component_size, 3);
        assert_eq!(paths.diameter, Some(2));
        assert_eq!(paths.radius, Some(2));
        assert!((paths.average_shortest_path.unwrap() - 1.5).abs() < 1e-12);
    }

    #[test]
    fn test_uses_largest_strong_component() {
        let paths = analyze(&seven_nodes()).unwrap();

        assert!(!paths.strongly_connected);
        assert_eq!(paths.largest_component_size, 2);
        assert_eq!(paths.diameter, Some(1));
        assert_eq!(paths.average_shortest_path, Some(1.0));
        assert_eq!(paths.eccentricity.len(), 2);
        assert_eq!(paths.eccentricity.get("2"), Some(&1));
    }

    #[test]
    fn test_acyclic_graph_has_null_metrics() {
        let p = fixture(&["a", "b"], &[("a", "b")]);
        let paths = analyze(&p).unwrap();

        assert_eq!(paths.average_shortest_path, None);
        assert_eq!(paths.diameter, None);
        assert_eq!(paths.radius, None);
        assert!(paths.eccentricity.is_empty());
    }

    #[test]
    fn test_single_node_has_null_metrics() {
        let paths = analyze(&fixture(&["solo"], &[])).unwrap();

        assert!(paths.strongly_connected);
        assert_eq!(paths.diameter, None);
        assert_eq!(paths.average_shortest_path, None);
        assert_eq!(paths.radius, None);
    }
}

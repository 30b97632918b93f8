//! Degree distribution, mixing and hub/authority tagging.

use super::clustering::triangles;
use super::projection::Projection;
use super::types::{DegreeDistribution, NetworkStructure, NodeTypes};
use super::AnalyticsError;

/// Above this multiple of the mean out/in-degree a node is a hub/authority
const PROMINENCE_FACTOR: f64 = 1.5;

/// Structure facet; the scalar properties are `None` on degenerate input
pub fn analyze(p: &Projection) -> Result<NetworkStructure, AnalyticsError> {
    if p.is_empty() {
        return Err(AnalyticsError::EmptyGraph);
    }

    Ok(NetworkStructure {
        degree_distribution: degree_distribution(&p.degrees()).ok(),
        assortativity: log_failure("assortativity", assortativity(p)),
        reciprocity: log_failure("reciprocity", reciprocity(p)),
        transitivity: log_failure("transitivity", transitivity(p)),
        node_types: node_types(p),
    })
}

fn log_failure(property: &str, value: Result<f64, AnalyticsError>) -> Option<f64> {
    value
        .map_err(|e| tracing::debug!("{} unavailable: {}", property, e))
        .ok()
}

pub fn degree_distribution(degrees: &[usize]) -> Result<DegreeDistribution, AnalyticsError> {
    let (Some(&min), Some(&max)) = (degrees.iter().min(), degrees.iter().max()) else {
        return Err(AnalyticsError::EmptyGraph);
    };

    let n = degrees.len() as f64;
    let mean = degrees.iter().sum::<usize>() as f64 / n;
    let variance = degrees
        .iter()
        .map(|&d| (d as f64 - mean).powi(2))
        .sum::<f64>()
        / n;

    let mut sorted = degrees.to_vec();
    sorted.sort_unstable();
    let mid = sorted.len() / 2;
    let median = if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) as f64 / 2.0
    } else {
        sorted[mid] as f64
    };

    Ok(DegreeDistribution {
        mean,
        median,
        std: variance.sqrt(),
        min,
        max,
    })
}

/// Pearson correlation of source out-degree and target in-degree over arcs
pub fn assortativity(p: &Projection) -> Result<f64, AnalyticsError> {
    let pairs: Vec<(f64, f64)> = p
        .arcs()
        .map(|(u, v)| (p.out_degree(u) as f64, p.in_degree(v) as f64))
        .collect();
    if pairs.is_empty() {
        return Err(AnalyticsError::Degenerate(
            "assortativity needs at least one edge".to_string(),
        ));
    }

    let m = pairs.len() as f64;
    let mean_x = pairs.iter().map(|(x, _)| x).sum::<f64>() / m;
    let mean_y = pairs.iter().map(|(_, y)| y).sum::<f64>() / m;

    let mut cov = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;
    for (x, y) in &pairs {
        cov += (x - mean_x) * (y - mean_y);
        var_x += (x - mean_x).powi(2);
        var_y += (y - mean_y).powi(2);
    }

    let denominator = (var_x * var_y).sqrt();
    if denominator < 1e-12 {
        return Err(AnalyticsError::Degenerate(
            "degree variance is zero".to_string(),
        ));
    }
    Ok(cov / denominator)
}

/// Share of arcs whose reverse arc also exists
pub fn reciprocity(p: &Projection) -> Result<f64, AnalyticsError> {
    let total = p.arc_count();
    if total == 0 {
        return Err(AnalyticsError::Degenerate(
            "reciprocity is undefined without edges".to_string(),
        ));
    }
    let mutual = p.arcs().filter(|&(u, v)| p.has_arc(v, u)).count();
    Ok(mutual as f64 / total as f64)
}

/// Triangle share of connected triads in the undirected projection
pub fn transitivity(p: &Projection) -> Result<f64, AnalyticsError> {
    let triangles: usize = triangles(p).iter().sum();
    let triads: usize = (0..p.node_count())
        .map(|v| {
            let d = p.neighbors(v).len();
            d * d.saturating_sub(1)
        })
        .sum();

    if triads == 0 {
        return Ok(0.0);
    }
    // each triangle is counted at all three corners and each triad twice
    Ok(2.0 * triangles as f64 / triads as f64)
}

pub fn node_types(p: &Projection) -> NodeTypes {
    let n = p.node_count().max(1) as f64;
    let avg_out_degree = (0..p.node_count()).map(|v| p.out_degree(v)).sum::<usize>() as f64 / n;
    let avg_in_degree = (0..p.node_count()).map(|v| p.in_degree(v)).sum::<usize>() as f64 / n;

    let hubs = (0..p.node_count())
        .filter(|&v| p.out_degree(v) as f64 > avg_out_degree * PROMINENCE_FACTOR)
        .map(|v| p.id(v).to_string())
        .collect();
    let authorities = (0..p.node_count())
        .filter(|&v| p.in_degree(v) as f64 > avg_in_degree * PROMINENCE_FACTOR)
        .map(|v| p.id(v).to_string())
        .collect();

    NodeTypes {
        hubs,
        authorities,
        avg_out_degree,
        avg_in_degree,
    }
}

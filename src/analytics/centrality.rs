//! Centrality measures over the directed projection.
//!
//! All functions return one score per node, aligned with node order.

use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::VecDeque;

use super::projection::Projection;
use super::AnalyticsError;

/// Degree centrality: total degree over `n - 1`
pub fn degree(p: &Projection) -> Vec<f64> {
    let n = p.node_count();
    if n <= 1 {
        return vec![1.0; n];
    }
    let scale = 1.0 / (n - 1) as f64;
    (0..n).map(|v| p.degree(v) as f64 * scale).collect()
}

/// Brandes betweenness over directed shortest paths
///
/// Exact when `sample_size >= n`. Otherwise accumulates from `sample_size`
/// source nodes drawn with a seeded RNG and extrapolates by `n / k`.
pub fn betweenness(p: &Projection, sample_size: usize, seed: u64) -> Vec<f64> {
    let n = p.node_count();
    let mut scores = vec![0.0; n];
    if n == 0 {
        return scores;
    }

    let k = sample_size.clamp(1, n);
    let sources: Vec<usize> = if k >= n {
        (0..n).collect()
    } else {
        let mut rng = StdRng::seed_from_u64(seed);
        rand::seq::index::sample(&mut rng, n, k).into_vec()
    };

    let mut stack = Vec::with_capacity(n);
    let mut queue = VecDeque::with_capacity(n);
    let mut preds: Vec<Vec<usize>> = vec![Vec::new(); n];
    let mut sigma = vec![0.0f64; n];
    let mut dist = vec![-1i64; n];
    let mut delta = vec![0.0f64; n];

    for &s in &sources {
        stack.clear();
        for v in 0..n {
            preds[v].clear();
            sigma[v] = 0.0;
            dist[v] = -1;
            delta[v] = 0.0;
        }
        sigma[s] = 1.0;
        dist[s] = 0;
        queue.push_back(s);

        while let Some(v) = queue.pop_front() {
            stack.push(v);
            for &w in p.successors(v) {
                if dist[w] < 0 {
                    dist[w] = dist[v] + 1;
                    queue.push_back(w);
                }
                if dist[w] == dist[v] + 1 {
                    sigma[w] += sigma[v];
                    preds[w].push(v);
                }
            }
        }

        while let Some(w) = stack.pop() {
            for &v in &preds[w] {
                delta[v] += sigma[v] / sigma[w] * (1.0 + delta[w]);
            }
            if w != s {
                scores[w] += delta[w];
            }
        }
    }

    if n > 2 {
        let scale = 1.0 / ((n - 1) * (n - 2)) as f64 * (n as f64 / k as f64);
        scores.iter_mut().for_each(|x| *x *= scale);
    }
    scores
}

/// Closeness over incoming distances, scaled by the reachable fraction
pub fn closeness(p: &Projection) -> Vec<f64> {
    let n = p.node_count();
    let mut scores = vec![0.0; n];
    if n <= 1 {
        return scores;
    }

    let mut dist = vec![usize::MAX; n];
    let mut queue = VecDeque::with_capacity(n);
    for (u, score) in scores.iter_mut().enumerate() {
        dist.iter_mut().for_each(|d| *d = usize::MAX);
        dist[u] = 0;
        queue.push_back(u);

        let mut total = 0usize;
        let mut reached = 1usize;
        while let Some(v) = queue.pop_front() {
            for &w in p.predecessors(v) {
                if dist[w] == usize::MAX {
                    dist[w] = dist[v] + 1;
                    total += dist[w];
                    reached += 1;
                    queue.push_back(w);
                }
            }
        }

        if total > 0 {
            let r = (reached - 1) as f64;
            *score = (r / total as f64) * (r / (n - 1) as f64);
        }
    }
    scores
}

/// Eigenvector centrality of the undirected projection
///
/// Power iteration on `A + I` (the shift keeps bipartite components from
/// oscillating), normalised to unit Euclidean length.
pub fn eigenvector(p: &Projection, max_iter: usize) -> Result<Vec<f64>, AnalyticsError> {
    let n = p.node_count();
    if n == 0 {
        return Err(AnalyticsError::EmptyGraph);
    }
    let tolerance = n as f64 * 1e-6;

    let mut x = vec![1.0 / n as f64; n];
    for _ in 0..max_iter {
        let mut next: Vec<f64> = (0..n)
            .map(|v| x[v] + p.neighbors(v).iter().map(|&w| x[w]).sum::<f64>())
            .collect();

        let norm = next.iter().map(|v| v * v).sum::<f64>().sqrt();
        if norm == 0.0 {
            return Err(AnalyticsError::Degenerate(
                "eigenvector iterate vanished".to_string(),
            ));
        }
        next.iter_mut().for_each(|v| *v /= norm);

        let change: f64 = next.iter().zip(&x).map(|(a, b)| (a - b).abs()).sum();
        x = next;
        if change < tolerance {
            return Ok(x);
        }
    }

    Err(AnalyticsError::NoConvergence {
        measure: "eigenvector",
        iterations: max_iter,
    })
}

/// PageRank with uniform teleport and uniform redistribution of dangling mass
pub fn pagerank(p: &Projection, damping: f64, max_iter: usize) -> Result<Vec<f64>, AnalyticsError> {
    let n = p.node_count();
    if n == 0 {
        return Ok(Vec::new());
    }
    let tolerance = 1e-6;
    let uniform = 1.0 / n as f64;

    let mut x = vec![uniform; n];
    for _ in 0..max_iter {
        let dangling: f64 = (0..n).filter(|&v| p.out_degree(v) == 0).map(|v| x[v]).sum();

        let mut next = vec![(1.0 - damping) * uniform + damping * dangling * uniform; n];
        for (u, &rank) in x.iter().enumerate() {
            let out = p.out_degree(u);
            if out > 0 {
                let share = damping * rank / out as f64;
                for &v in p.successors(u) {
                    next[v] += share;
                }
            }
        }

        let err: f64 = next.iter().zip(&x).map(|(a, b)| (a - b).abs()).sum();
        x = next;
        if err < n as f64 * tolerance {
            return Ok(x);
        }
    }

    Err(AnalyticsError::NoConvergence {
        measure: "pagerank",
        iterations: max_iter,
    })
}

/// HITS hub and authority scores, each summing to one
pub fn hits(p: &Projection, max_iter: usize) -> Result<(Vec<f64>, Vec<f64>), AnalyticsError> {
    let n = p.node_count();
    if n == 0 {
        return Err(AnalyticsError::EmptyGraph);
    }
    if p.arc_count() == 0 {
        return Err(AnalyticsError::Degenerate(
            "HITS is undefined without edges".to_string(),
        ));
    }
    let tolerance = 1e-8;

    let mut hubs = vec![1.0 / n as f64; n];
    let mut authorities = vec![0.0; n];
    let mut converged = false;
    for _ in 0..max_iter {
        let last = hubs.clone();

        authorities = vec![0.0; n];
        for (u, &h) in last.iter().enumerate() {
            for &v in p.successors(u) {
                authorities[v] += h;
            }
        }
        hubs = (0..n)
            .map(|u| p.successors(u).iter().fold(0.0, |acc, &v| acc + authorities[v]))
            .collect();

        scale_by_max(&mut hubs)?;
        scale_by_max(&mut authorities)?;

        let err: f64 = hubs.iter().zip(&last).map(|(a, b)| (a - b).abs()).sum();
        if err < tolerance {
            converged = true;
            break;
        }
    }
    if !converged {
        return Err(AnalyticsError::NoConvergence {
            measure: "hits",
            iterations: max_iter,
        });
    }

    scale_by_sum(&mut hubs)?;
    scale_by_sum(&mut authorities)?;
    Ok((hubs, authorities))
}

fn scale_by_max(values: &mut [f64]) -> Result<(), AnalyticsError> {
    let max = values.iter().copied().fold(0.0f64, f64::max);
    if max <= 0.0 {
        return Err(AnalyticsError::Degenerate("HITS scores vanished".to_string()));
    }
    values.iter_mut().for_each(|v| *v /= max);
    Ok(())
}

fn scale_by_sum(values: &mut [f64]) -> Result<(), AnalyticsError> {
    let sum: f64 = values.iter().sum();
    if sum <= 0.0 {
        return Err(AnalyticsError::Degenerate("HITS scores vanished".to_string()));
    }
    values.iter_mut().for_each(|v| *v /= sum);
    Ok(())
}

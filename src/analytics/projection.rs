//! Simple directed view of a citation graph used by every analytics facet.

use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::unionfind::UnionFind;
use petgraph::visit::EdgeRef;
use std::collections::{BTreeMap, HashSet};

use crate::models::CitationGraph;

/// One arc per ordered pair of distinct publications
///
/// Relationship tags and self-loops are dropped. Nodes are numbered in graph
/// insertion order and every adjacency list keeps first-insertion order, so
/// every derived ranking breaks ties by node order.
#[derive(Debug, Clone)]
pub struct Projection {
    ids: Vec<String>,
    successors: Vec<Vec<usize>>,
    predecessors: Vec<Vec<usize>>,
    neighbors: Vec<Vec<usize>>,
    arcs: usize,
}

impl Projection {
    pub fn new<I>(ids: Vec<String>, arcs: I) -> Self
    where
        I: IntoIterator<Item = (usize, usize)>,
    {
        let n = ids.len();
        let mut successors = vec![Vec::new(); n];
        let mut predecessors = vec![Vec::new(); n];
        let mut neighbors: Vec<Vec<usize>> = vec![Vec::new(); n];
        let mut seen = HashSet::new();
        let mut count = 0;

        for (u, v) in arcs {
            if u == v || u >= n || v >= n || !seen.insert((u, v)) {
                continue;
            }
            successors[u].push(v);
            predecessors[v].push(u);
            if !seen.contains(&(v, u)) {
                neighbors[u].push(v);
                neighbors[v].push(u);
            }
            count += 1;
        }

        Self {
            ids,
            successors,
            predecessors,
            neighbors,
            arcs: count,
        }
    }

    pub fn from_graph(graph: &CitationGraph) -> Self {
        let inner = graph.inner();
        let ids = inner.node_weights().map(|p| p.id.clone()).collect();
        let arcs = inner
            .edge_references()
            .map(|e| (e.source().index(), e.target().index()));
        Self::new(ids, arcs)
    }

    pub fn node_count(&self) -> usize {
        self.ids.len()
    }

    pub fn arc_count(&self) -> usize {
        self.arcs
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn id(&self, node: usize) -> &str {
        &self.ids[node]
    }

    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.ids.iter().position(|candidate| candidate == id)
    }

    pub fn successors(&self, node: usize) -> &[usize] {
        &self.successors[node]
    }

    pub fn predecessors(&self, node: usize) -> &[usize] {
        &self.predecessors[node]
    }

    /// Neighbours in the undirected projection
    pub fn neighbors(&self, node: usize) -> &[usize] {
        &self.neighbors[node]
    }

    pub fn out_degree(&self, node: usize) -> usize {
        self.successors[node].len()
    }

    pub fn in_degree(&self, node: usize) -> usize {
        self.predecessors[node].len()
    }

    /// In-degree plus out-degree
    pub fn degree(&self, node: usize) -> usize {
        self.in_degree(node) + self.out_degree(node)
    }

    pub fn degrees(&self) -> Vec<usize> {
        (0..self.node_count()).map(|v| self.degree(v)).collect()
    }

    pub fn density(&self) -> f64 {
        let n = self.node_count();
        if n <= 1 {
            return 0.0;
        }
        self.arcs as f64 / (n * (n - 1)) as f64
    }

    pub fn arcs(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.successors
            .iter()
            .enumerate()
            .flat_map(|(u, succ)| succ.iter().map(move |&v| (u, v)))
    }

    pub fn has_arc(&self, u: usize, v: usize) -> bool {
        self.successors[u].contains(&v)
    }

    /// Weakly connected components, ordered by their first node
    pub fn weak_components(&self) -> Vec<Vec<usize>> {
        let mut sets = UnionFind::new(self.node_count());
        for (u, v) in self.arcs() {
            sets.union(u, v);
        }

        let mut by_root: BTreeMap<usize, usize> = BTreeMap::new();
        let mut components: Vec<Vec<usize>> = Vec::new();
        for v in 0..self.node_count() {
            let root = sets.find(v);
            let slot = *by_root.entry(root).or_insert_with(|| {
                components.push(Vec::new());
                components.len() - 1
            });
            components[slot].push(v);
        }
        components
    }

    /// Strongly connected components, each sorted by node order
    pub fn strong_components(&self) -> Vec<Vec<usize>> {
        let mut digraph: DiGraph<(), ()> = DiGraph::with_capacity(self.node_count(), self.arcs);
        for _ in 0..self.node_count() {
            digraph.add_node(());
        }
        for (u, v) in self.arcs() {
            digraph.add_edge(NodeIndex::new(u), NodeIndex::new(v), ());
        }

        tarjan_scc(&digraph)
            .into_iter()
            .map(|component| {
                let mut nodes: Vec<usize> = component.into_iter().map(|n| n.index()).collect();
                nodes.sort_unstable();
                nodes
            })
            .collect()
    }

    /// Attach ids to a score vector aligned with node order
    pub fn scores_map(&self, scores: &[f64]) -> BTreeMap<String, f64> {
        self.ids.iter().cloned().zip(scores.iter().copied()).collect()
    }

    pub fn ids_of(&self, nodes: &[usize]) -> Vec<String> {
        nodes.iter().map(|&v| self.ids[v].clone()).collect()
    }
}

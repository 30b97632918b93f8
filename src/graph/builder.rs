//! Budgeted breadth-first crawl around a seed publication.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;

use super::{GraphError, GraphHandle};
use crate::config::CrawlConfig;
use crate::models::{BuildResult, Publication, RelationshipType};
use crate::sources::{CitationSource, Relationships, SourceError};

/// Edge waiting for its far endpoint to be attached
type PendingEdge = (String, String, RelationshipType);

/// Crawls a [`CitationSource`] into a stored graph
///
/// Only the seed is expanded: its references become `cites` edges out of the
/// seed and its citing works become `cited_by` edges into it. Every other
/// node is attached with its metadata and contributes nothing further, so a
/// requested depth other than 1 has no effect.
#[derive(Debug, Clone)]
pub struct GraphBuilder {
    source: Arc<dyn CitationSource>,
    config: CrawlConfig,
}

impl GraphBuilder {
    pub fn new(source: Arc<dyn CitationSource>, config: CrawlConfig) -> Self {
        Self { source, config }
    }

    pub fn source(&self) -> &Arc<dyn CitationSource> {
        &self.source
    }

    /// Node budget of one build
    pub fn max_articles(&self) -> usize {
        self.config.max_articles
    }

    /// Run the crawl to a terminal state
    ///
    /// Fails only when the graph is not `initializing`; source failures are
    /// logged and leave a placeholder node behind.
    pub async fn build(
        &self,
        handle: &GraphHandle,
        max_depth: Option<usize>,
    ) -> Result<BuildResult, GraphError> {
        let (graph_id, seed_id) = {
            let mut graph = handle.write().await;
            graph.begin_build(max_depth)?;
            (graph.id().to_string(), graph.seed_id().to_string())
        };

        let budget = self.config.max_articles;
        let node_pause = self.config.node_pause();
        if let Some(depth) = max_depth.filter(|d| *d != 1) {
            tracing::debug!(
                graph_id = %graph_id,
                "requested depth {} ignored, expanding direct neighbours only",
                depth
            );
        }
        tracing::info!(
            graph_id = %graph_id,
            seed = %seed_id,
            source = self.source.id(),
            max_articles = budget,
            "starting graph build"
        );

        let mut frontier: VecDeque<(String, usize)> = VecDeque::from([(seed_id.clone(), 0)]);
        let mut processed: HashSet<String> = HashSet::new();
        let mut pending: HashMap<String, Vec<PendingEdge>> = HashMap::new();

        while processed.len() < budget {
            let Some((id, depth)) = frontier.pop_front() else {
                break;
            };
            if !processed.insert(id.clone()) {
                continue;
            }

            let (details, relationships) = tokio::join!(
                self.source.get_details(&id),
                self.source.get_relationships(&id)
            );
            let publication = self.publication_or_placeholder(&id, details);

            let mut graph = handle.write().await;
            graph.add_publication(publication);
            graph.set_processed_articles(processed.len());

            for (source_id, target_id, kind) in pending.remove(&id).unwrap_or_default() {
                if let Err(e) = graph.add_relationship(&source_id, &target_id, kind) {
                    tracing::error!("skipping edge: {}", e);
                }
            }

            match relationships {
                Ok(relationships) if depth == 0 => {
                    let queued = expand_seed(&id, relationships, &mut pending);
                    tracing::info!(
                        graph_id = %graph_id,
                        neighbours = queued.len(),
                        "expanding seed {}",
                        id
                    );
                    for neighbour in queued {
                        if !processed.contains(&neighbour) {
                            frontier.push_back((neighbour, depth + 1));
                        }
                    }
                }
                Ok(_) => {}
                Err(e) => {
                    tracing::warn!(graph_id = %graph_id, "relationships of {} unavailable: {}", id, e);
                }
            }
            drop(graph);

            tracing::debug!(
                graph_id = %graph_id,
                processed = processed.len(),
                queued = frontier.len(),
                "processed {}",
                id
            );

            if !node_pause.is_zero() {
                tokio::time::sleep(node_pause).await;
            }
        }

        let limit_reached =
            processed.len() >= budget && frontier.iter().any(|(id, _)| !processed.contains(id));

        let mut graph = handle.write().await;
        graph.set_processed_articles(processed.len());
        graph.complete(limit_reached)?;
        let result = graph.build_result();

        tracing::info!(
            graph_id = %graph_id,
            status = %result.status,
            articles = result.total_articles,
            relationships = result.total_relationships,
            "graph build finished"
        );
        Ok(result)
    }

    fn publication_or_placeholder(
        &self,
        id: &str,
        details: Result<Option<Publication>, SourceError>,
    ) -> Publication {
        match details {
            Ok(Some(mut publication)) => {
                publication.id = id.to_string();
                publication
            }
            Ok(None) => {
                tracing::warn!("no metadata for {}, attaching placeholder", id);
                Publication::placeholder(id)
            }
            Err(e) => {
                tracing::warn!("metadata of {} unavailable, attaching placeholder: {}", id, e);
                Publication::placeholder(id)
            }
        }
    }
}

/// Queue the seed's edges under the neighbour that completes them
///
/// Returns the neighbours in discovery order: references first, then citing works.
fn expand_seed(
    seed_id: &str,
    relationships: Relationships,
    pending: &mut HashMap<String, Vec<PendingEdge>>,
) -> Vec<String> {
    let mut neighbours = Vec::new();

    let references = relationships
        .references
        .into_iter()
        .map(|r| (r, RelationshipType::Cites));
    let citations = relationships
        .citations
        .into_iter()
        .map(|c| (c, RelationshipType::CitedBy));

    for (neighbour, kind) in references.chain(citations) {
        if neighbour == seed_id || neighbour.is_empty() {
            continue;
        }
        let edge = match kind {
            RelationshipType::Cites => (seed_id.to_string(), neighbour.clone(), kind),
            RelationshipType::CitedBy => (neighbour.clone(), seed_id.to_string(), kind),
        };
        pending.entry(neighbour.clone()).or_default().push(edge);
        neighbours.push(neighbour);
    }

    neighbours
}

//! Facade exposing graph operations to the adapter layer.

use std::sync::Arc;
use tokio::task::JoinHandle;

use super::{GraphBuilder, GraphError, GraphHandle, GraphStore};
use crate::analytics::{AnalyticsEngine, AnalyticsResult, NodeAnalytics};
use crate::config::Config;
use crate::models::{BuildResult, GraphData, GraphStatusReport, GraphSummary};
use crate::sources::CitationSource;

/// Entry point for creating, building, querying and analysing graphs
///
/// Cheap to clone; clones share the same store, source and analytics engine.
#[derive(Debug, Clone)]
pub struct GraphService {
    store: Arc<GraphStore>,
    builder: GraphBuilder,
    engine: Arc<AnalyticsEngine>,
}

impl GraphService {
    pub fn new(store: Arc<GraphStore>, builder: GraphBuilder, engine: AnalyticsEngine) -> Self {
        Self {
            store,
            builder,
            engine: Arc::new(engine),
        }
    }

    /// Service with an empty store crawling `source`
    pub fn from_config(config: &Config, source: Arc<dyn CitationSource>) -> Self {
        Self::new(
            Arc::new(GraphStore::new()),
            GraphBuilder::new(source, config.crawl.clone()),
            AnalyticsEngine::new(config.analytics.clone()),
        )
    }

    pub async fn create_graph(&self, id: &str, seed_id: &str) -> Result<GraphSummary, GraphError> {
        let handle = self.store.create(id, seed_id).await?;
        let graph = handle.read().await;
        tracing::info!(graph_id = id, seed = seed_id, "graph created");
        Ok(graph.summary())
    }

    /// Create a graph under a freshly generated id
    pub async fn create_graph_auto(&self, seed_id: &str) -> Result<GraphSummary, GraphError> {
        let id = uuid::Uuid::new_v4().to_string();
        self.create_graph(&id, seed_id).await
    }

    /// Crawl the graph to completion and return its final counts
    pub async fn build_graph(
        &self,
        id: &str,
        max_depth: Option<usize>,
    ) -> Result<BuildResult, GraphError> {
        let handle = self.store.get(id).await?;
        self.builder.build(&handle, max_depth).await
    }

    /// Run [`GraphService::build_graph`] on a background task
    pub fn spawn_build(
        &self,
        id: &str,
        max_depth: Option<usize>,
    ) -> JoinHandle<Result<BuildResult, GraphError>> {
        let service = self.clone();
        let id = id.to_string();
        tokio::spawn(async move {
            let result = service.build_graph(&id, max_depth).await;
            if let Err(e) = &result {
                tracing::error!(graph_id = %id, "background build failed: {}", e);
            }
            result
        })
    }

    pub async fn get_status(&self, id: &str) -> Result<GraphStatusReport, GraphError> {
        self.store.get_status(id).await
    }

    pub async fn get_data(&self, id: &str) -> Result<GraphData, GraphError> {
        self.store.get_data(id).await
    }

    pub async fn list_graphs(&self) -> Vec<GraphSummary> {
        self.store.list().await
    }

    pub async fn delete_graph(&self, id: &str) -> Result<(), GraphError> {
        self.store.delete(id).await
    }

    /// Analytics of a finished graph, recomputed on every call
    pub async fn get_analytics(&self, id: &str) -> Result<AnalyticsResult, GraphError> {
        let handle = self.ready_graph(id).await?;
        let graph = handle.read().await;
        Ok(self.engine.analyze(&graph))
    }

    /// Scores and neighbourhood of one publication, at any build status
    pub async fn get_node_analytics(
        &self,
        id: &str,
        node_id: &str,
    ) -> Result<NodeAnalytics, GraphError> {
        let handle = self.store.get(id).await?;
        let graph = handle.read().await;
        self.engine.node_analytics(&graph, node_id)
    }

    async fn ready_graph(&self, id: &str) -> Result<GraphHandle, GraphError> {
        let handle = self.store.get(id).await?;
        let status = handle.read().await.status();
        if !status.is_terminal() {
            return Err(GraphError::NotReady {
                graph_id: id.to_string(),
                status,
            });
        }
        Ok(handle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::GraphStatus;
    use crate::sources::MockSource;
    use std::time::Duration;

    fn service(source: MockSource) -> GraphService {
        let mut config = Config::default();
        config.crawl.node_pause_ms = 0;
        GraphService::from_config(&config, Arc::new(source))
    }

    fn small_corpus() -> MockSource {
        MockSource::new()
            .with_article("1")
            .with_article("2")
            .with_article("3")
            .with_relationships("1", &["2"], &["3"])
    }

    #[tokio::test]
    async fn test_create_build_and_query() {
        let service = service(small_corpus());
        let summary = service.create_graph("g", "1").await.unwrap();
        assert_eq!(summary.status, GraphStatus::Initializing);

        let result = service.build_graph("g", Some(1)).await.unwrap();
        assert_eq!(result.total_articles, 3);

        let status = service.get_status("g").await.unwrap();
        assert_eq!(status.status, GraphStatus::Completed);
        assert_eq!(status.processed_articles, 3);
        assert!(status.completed_at.is_some());

        let analytics = service.get_analytics("g").await.unwrap();
        assert_eq!(analytics.basic_statistics.unwrap().total_nodes, 3);

        let node = service.get_node_analytics("g", "1").await.unwrap();
        assert_eq!(node.in_degree, 1);
        assert_eq!(node.out_degree, 1);
    }

    #[tokio::test]
    async fn test_analytics_before_completion_is_not_ready() {
        let service = service(small_corpus());
        service.create_graph("g", "1").await.unwrap();

        let err = service.get_analytics("g").await.unwrap_err();
        assert!(matches!(
            err,
            GraphError::NotReady {
                status: GraphStatus::Initializing,
                ..
            }
        ));
        // nothing is attached before the build starts
        assert!(matches!(
            service.get_node_analytics("g", "1").await,
            Err(GraphError::NodeNotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_unknown_node_is_reported() {
        let service = service(small_corpus());
        service.create_graph("g", "1").await.unwrap();
        service.build_graph("g", None).await.unwrap();

        let err = service.get_node_analytics("g", "404").await.unwrap_err();
        assert!(matches!(err, GraphError::NodeNotFound { ref node_id, .. } if node_id == "404"));
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_building_a_deleted_graph_fails() {
        let service = service(small_corpus());
        service.create_graph("g", "1").await.unwrap();
        service.delete_graph("g").await.unwrap();

        let err = service.build_graph("g", None).await.unwrap_err();
        assert!(matches!(err, GraphError::NotFound(id) if id == "g"));
    }

    #[tokio::test]
    async fn test_auto_ids_are_unique() {
        let service = service(small_corpus());
        let a = service.create_graph_auto("1").await.unwrap();
        let b = service.create_graph_auto("1").await.unwrap();

        assert_ne!(a.graph_id, b.graph_id);
        assert_eq!(service.list_graphs().await.len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_status_is_readable_during_background_build() {
        let source = small_corpus().with_latency(Duration::from_secs(1));
        let service = service(source);
        service.create_graph("g", "1").await.unwrap();

        let build = service.spawn_build("g", None);
        tokio::time::sleep(Duration::from_millis(1500)).await;

        let status = service.get_status("g").await.unwrap();
        assert_eq!(status.status, GraphStatus::Building);
        assert_eq!(status.total_articles, 1);

        let data = service.get_data("g").await.unwrap();
        for edge in &data.edges {
            assert!(data.nodes.iter().any(|n| n.id == edge.source));
            assert!(data.nodes.iter().any(|n| n.id == edge.target));
        }

        // node analytics answer mid-build, unlike whole-graph analytics
        let seed = service.get_node_analytics("g", "1").await.unwrap();
        assert_eq!(seed.degree, 0);
        assert!(matches!(
            service.get_analytics("g").await,
            Err(GraphError::NotReady { .. })
        ));

        let result = build.await.unwrap().unwrap();
        assert_eq!(result.status, GraphStatus::Completed);
        assert_eq!(service.get_status("g").await.unwrap().total_articles, 3);
    }
}

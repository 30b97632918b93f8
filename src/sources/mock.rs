//! Mock source for testing purposes.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use crate::models::Publication;
use crate::sources::{CitationSource, Relationships, SourceError};

/// An in-memory citation corpus that answers from predefined records.
///
/// Unknown identifiers have no details and no relationships. Identifiers
/// registered with [`MockSource::fail_details`] or
/// [`MockSource::fail_relationships`] answer with a network error instead.
#[derive(Debug, Default)]
pub struct MockSource {
    publications: Mutex<HashMap<String, Publication>>,
    relationships: Mutex<HashMap<String, Relationships>>,
    failing_details: Mutex<HashSet<String>>,
    failing_relationships: Mutex<HashSet<String>>,
    latency: Option<Duration>,
    detail_calls: AtomicUsize,
    relationship_calls: AtomicUsize,
}

impl MockSource {
    /// Create an empty mock source.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a publication with a generated title.
    pub fn with_article(self, id: &str) -> Self {
        self.with_publication(make_publication(id))
    }

    pub fn with_publication(self, publication: Publication) -> Self {
        self.add_publication(publication);
        self
    }

    /// Set the references and citing works returned for `id`.
    pub fn with_relationships(self, id: &str, references: &[&str], citations: &[&str]) -> Self {
        self.set_relationships(
            id,
            Relationships::new(
                references.iter().map(|s| s.to_string()).collect(),
                citations.iter().map(|s| s.to_string()).collect(),
            ),
        );
        self
    }

    /// Sleep this long inside every call.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    pub fn add_publication(&self, publication: Publication) {
        let mut guard = lock(&self.publications);
        guard.insert(publication.id.clone(), publication);
    }

    pub fn set_relationships(&self, id: &str, relationships: Relationships) {
        let mut guard = lock(&self.relationships);
        guard.insert(id.to_string(), relationships);
    }

    /// Make metadata lookups for `id` fail.
    pub fn fail_details(self, id: &str) -> Self {
        lock(&self.failing_details).insert(id.to_string());
        self
    }

    /// Make relationship lookups for `id` fail.
    pub fn fail_relationships(self, id: &str) -> Self {
        lock(&self.failing_relationships).insert(id.to_string());
        self
    }

    /// Number of `get_details` calls served so far.
    pub fn detail_calls(&self) -> usize {
        self.detail_calls.load(Ordering::SeqCst)
    }

    /// Number of `get_relationships` calls served so far.
    pub fn relationship_calls(&self) -> usize {
        self.relationship_calls.load(Ordering::SeqCst)
    }

    async fn simulate_latency(&self) {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
    }
}

#[async_trait]
impl CitationSource for MockSource {
    fn id(&self) -> &str {
        "mock"
    }

    fn name(&self) -> &str {
        "Mock Source"
    }

    async fn get_details(&self, id: &str) -> Result<Option<Publication>, SourceError> {
        self.detail_calls.fetch_add(1, Ordering::SeqCst);
        self.simulate_latency().await;

        if lock(&self.failing_details).contains(id) {
            return Err(SourceError::Network(format!("mock failure for {}", id)));
        }
        let guard = lock(&self.publications);
        Ok(guard.get(id).cloned())
    }

    async fn get_relationships(&self, id: &str) -> Result<Relationships, SourceError> {
        self.relationship_calls.fetch_add(1, Ordering::SeqCst);
        self.simulate_latency().await;

        if lock(&self.failing_relationships).contains(id) {
            return Err(SourceError::Network(format!("mock failure for {}", id)));
        }
        let guard = lock(&self.relationships);
        Ok(guard.get(id).cloned().unwrap_or_default())
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Helper function to create a mock publication for testing.
pub fn make_publication(id: &str) -> Publication {
    crate::models::PublicationBuilder::new(id, format!("Article {}", id))
        .authors(["Doe J"])
        .journal("Journal of Tests")
        .pub_date("2024 Jan")
        .build()
}

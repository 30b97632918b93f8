//! PubMed source implementation using the E-utilities JSON API.

use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;

use crate::config::{Config, PubMedConfig};
use crate::models::{Publication, PublicationBuilder};
use crate::sources::{CitationSource, Relationships, SourceError};
use crate::utils::RateLimitedClient;

/// `elink` link name for the works a publication cites
const REFERENCES_LINK: &str = "pubmed_pubmed_refs";
/// `elink` link name for the works citing a publication
const CITED_IN_LINK: &str = "pubmed_pubmed_citedin";

/// PubMed research source
///
/// Metadata comes from `esummary`, relationships from `elink`. All calls go
/// through one [`RateLimitedClient`], which may be shared with other sources.
#[derive(Debug, Clone)]
pub struct PubMedSource {
    client: RateLimitedClient,
    base_url: String,
    tool: String,
    email: Option<String>,
    api_key: Option<String>,
}

impl PubMedSource {
    /// Create a source on top of an existing (possibly shared) client
    pub fn new(client: RateLimitedClient, config: &PubMedConfig) -> Self {
        Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            tool: config.tool.clone(),
            email: config.email.clone(),
            api_key: config.api_key.clone(),
        }
    }

    /// Create a source with its own reqwest-backed client
    pub fn from_config(config: &Config) -> Result<Self, SourceError> {
        Ok(Self::new(RateLimitedClient::from_config(config)?, &config.pubmed))
    }

    /// Query parameters NCBI asks every E-utilities caller to send
    fn identity_params(&self) -> String {
        let mut params = vec![("tool", self.tool.as_str())];
        if let Some(email) = &self.email {
            params.push(("email", email));
        }
        if let Some(api_key) = &self.api_key {
            params.push(("api_key", api_key));
        }

        params
            .iter()
            .filter(|(_, v)| !v.is_empty())
            .map(|(k, v)| format!("&{}={}", k, urlencoding::encode(v)))
            .collect()
    }

    fn build_summary_url(&self, id: &str) -> String {
        format!(
            "{}/esummary.fcgi?db=pubmed&id={}&retmode=json{}",
            self.base_url,
            urlencoding::encode(id),
            self.identity_params()
        )
    }

    fn build_link_url(&self, id: &str, link_name: &str) -> String {
        format!(
            "{}/elink.fcgi?dbfrom=pubmed&db=pubmed&id={}&linkname={}&retmode=json{}",
            self.base_url,
            urlencoding::encode(id),
            link_name,
            self.identity_params()
        )
    }

    /// Parse an `esummary` JSON response for one PMID
    fn parse_summary_response(json: &str, id: &str) -> Result<Option<Publication>, SourceError> {
        #[derive(Debug, Deserialize)]
        struct ESummaryResponse {
            #[serde(default)]
            result: Option<HashMap<String, serde_json::Value>>,
            #[serde(default)]
            error: Option<String>,
        }

        #[derive(Debug, Default, Deserialize)]
        #[serde(default)]
        struct DocSum {
            title: String,
            authors: Vec<AuthorEntry>,
            fulljournalname: String,
            source: String,
            pubdate: String,
            #[serde(rename = "abstract")]
            abstract_text: String,
            elocationid: String,
            articleids: Vec<ArticleId>,
            history: Vec<HistoryEntry>,
            error: Option<String>,
        }

        #[derive(Debug, Deserialize)]
        #[serde(untagged)]
        enum AuthorEntry {
            Named { name: String },
            Plain(String),
        }

        #[derive(Debug, Default, Deserialize)]
        #[serde(default)]
        struct ArticleId {
            idtype: String,
            value: String,
        }

        #[derive(Debug, Default, Deserialize)]
        #[serde(default)]
        struct HistoryEntry {
            date: String,
        }

        let response: ESummaryResponse = serde_json::from_str(json)?;
        if let Some(error) = response.error {
            return Err(SourceError::Api(error));
        }

        let Some(doc) = response.result.and_then(|mut r| r.remove(id)) else {
            return Ok(None);
        };
        let doc: DocSum = serde_json::from_value(doc)?;
        if let Some(error) = doc.error {
            tracing::debug!("esummary has no record for PMID {}: {}", id, error);
            return Ok(None);
        }

        let authors = doc.authors.into_iter().map(|author| match author {
            AuthorEntry::Named { name } => name,
            AuthorEntry::Plain(name) => name,
        });

        let journal = if doc.fulljournalname.is_empty() {
            doc.source
        } else {
            doc.fulljournalname
        };

        let doi = doc
            .articleids
            .iter()
            .find(|aid| aid.idtype == "doi")
            .map(|aid| aid.value.clone())
            .or_else(|| {
                doc.elocationid
                    .strip_prefix("doi:")
                    .map(|doi| doi.trim().to_string())
            })
            .unwrap_or_default();

        // History dates are "YYYY/MM/DD HH:MM", so the lexical max is the latest
        let last_updated = doc
            .history
            .into_iter()
            .map(|h| h.date)
            .max()
            .unwrap_or_default();

        Ok(Some(
            PublicationBuilder::new(id, doc.title)
                .authors(authors)
                .journal(journal)
                .pub_date(doc.pubdate)
                .abstract_text(doc.abstract_text)
                .doi(doi)
                .last_updated(last_updated)
                .build(),
        ))
    }

    /// Parse an `elink` JSON response into linked PMIDs
    fn parse_link_response(json: &str, link_name: &str) -> Result<Vec<String>, SourceError> {
        #[derive(Debug, Deserialize)]
        struct ELinkResponse {
            #[serde(default)]
            linksets: Vec<LinkSet>,
        }

        #[derive(Debug, Deserialize)]
        struct LinkSet {
            #[serde(default)]
            linksetdbs: Vec<LinkSetDb>,
        }

        #[derive(Debug, Deserialize)]
        struct LinkSetDb {
            #[serde(default)]
            linkname: String,
            #[serde(default)]
            links: Vec<LinkId>,
        }

        #[derive(Debug, Deserialize)]
        #[serde(untagged)]
        enum LinkId {
            Text(String),
            Number(u64),
        }

        let response: ELinkResponse = serde_json::from_str(json)?;

        let links = response
            .linksets
            .into_iter()
            .next()
            .and_then(|set| {
                set.linksetdbs
                    .into_iter()
                    .find(|db| db.linkname.is_empty() || db.linkname == link_name)
            })
            .map(|db| {
                db.links
                    .into_iter()
                    .map(|link| match link {
                        LinkId::Text(id) => id,
                        LinkId::Number(id) => id.to_string(),
                    })
                    .collect()
            })
            .unwrap_or_default();

        Ok(links)
    }

    async fn fetch_links(&self, id: &str, link_name: &str) -> Result<Vec<String>, SourceError> {
        let url = self.build_link_url(id, link_name);
        let json = self.client.request(&url).await?;
        Self::parse_link_response(&json, link_name)
    }
}

#[async_trait]
impl CitationSource for PubMedSource {
    fn id(&self) -> &str {
        "pubmed"
    }

    fn name(&self) -> &str {
        "PubMed"
    }

    async fn get_details(&self, id: &str) -> Result<Option<Publication>, SourceError> {
        let url = self.build_summary_url(id);
        let json = self.client.request(&url).await?;
        let publication = Self::parse_summary_response(&json, id)?;

        if let Some(p) = &publication {
            tracing::debug!(
                pmid = id,
                journal = %p.journal,
                authors = p.authors.len(),
                "fetched details: {}",
                p.title
            );
        }
        Ok(publication)
    }

    async fn get_relationships(&self, id: &str) -> Result<Relationships, SourceError> {
        let (references, citations) = tokio::join!(
            self.fetch_links(id, REFERENCES_LINK),
            self.fetch_links(id, CITED_IN_LINK)
        );

        let relationships = match (references, citations) {
            (Ok(references), Ok(citations)) => Relationships::new(references, citations),
            (Err(e), Err(_)) => return Err(e),
            (Ok(references), Err(e)) => {
                tracing::warn!("citations of PMID {} unavailable: {}", id, e);
                Relationships::new(references, Vec::new())
            }
            (Err(e), Ok(citations)) => {
                tracing::warn!("references of PMID {} unavailable: {}", id, e);
                Relationships::new(Vec::new(), citations)
            }
        };

        tracing::debug!(
            pmid = id,
            references = relationships.references.len(),
            citations = relationships.citations.len(),
            "fetched relationships"
        );
        Ok(relationships)
    }
}

//! Publication model representing one node of a citation graph.

use serde::{Deserialize, Serialize};

/// A publication fetched from a bibliographic source
///
/// Once attached to a [`CitationGraph`](super::CitationGraph) a publication is
/// never edited in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Publication {
    /// Stable external key (PMID for PubMed)
    pub id: String,

    /// Title
    pub title: String,

    /// Authors in source order
    pub authors: Vec<String>,

    /// Full journal name
    pub journal: String,

    /// Publication date as reported by the source (e.g. "2020 Feb 28")
    pub pub_date: String,

    /// Abstract text
    pub r#abstract: String,

    /// External identifier (DOI)
    pub doi: Option<String>,

    /// Latest update marker reported by the source
    pub last_updated: Option<String>,

    /// True when metadata could not be fetched and only the identifier is known
    #[serde(default)]
    pub placeholder: bool,
}

impl Publication {
    /// Create a publication with the required fields
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            authors: Vec::new(),
            journal: String::new(),
            pub_date: String::new(),
            r#abstract: String::new(),
            doi: None,
            last_updated: None,
            placeholder: false,
        }
    }

    /// Stand-in node for an identifier whose metadata fetch failed
    pub fn placeholder(id: impl Into<String>) -> Self {
        let id = id.into();
        let title = format!("PMID: {}", id);
        Self {
            placeholder: true,
            ..Self::new(id, title)
        }
    }
}

/// Builder for [`Publication`]
#[derive(Debug, Clone)]
pub struct PublicationBuilder {
    publication: Publication,
}

impl PublicationBuilder {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            publication: Publication::new(id, title),
        }
    }

    pub fn authors<I, S>(mut self, authors: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.publication.authors = authors.into_iter().map(Into::into).collect();
        self
    }

    pub fn journal(mut self, journal: impl Into<String>) -> Self {
        self.publication.journal = journal.into();
        self
    }

    pub fn pub_date(mut self, pub_date: impl Into<String>) -> Self {
        self.publication.pub_date = pub_date.into();
        self
    }

    pub fn abstract_text(mut self, text: impl Into<String>) -> Self {
        self.publication.r#abstract = text.into();
        self
    }

    /// Set the DOI; empty strings leave it unset
    pub fn doi(mut self, doi: impl Into<String>) -> Self {
        let doi = doi.into();
        self.publication.doi = (!doi.is_empty()).then_some(doi);
        self
    }

    pub fn last_updated(mut self, marker: impl Into<String>) -> Self {
        let marker = marker.into();
        self.publication.last_updated = (!marker.is_empty()).then_some(marker);
        self
    }

    pub fn build(self) -> Publication {
        self.publication
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placeholder() {
        let publication = Publication::placeholder("32284615");
        assert_eq!(publication.id, "32284615");
        assert_eq!(publication.title, "PMID: 32284615");
        assert!(publication.placeholder);
        assert!(publication.authors.is_empty());
    }

    #[test]
    fn test_builder() {
        let publication = PublicationBuilder::new("1", "Seed Article")
            .authors(["Author A", "Author B"])
            .journal("Test Journal")
            .pub_date("2020 Feb 28")
            .doi("")
            .build();

        assert_eq!(publication.authors, vec!["Author A", "Author B"]);
        assert_eq!(publication.doi, None);
        assert_eq!(publication.pub_date, "2020 Feb 28");
        assert!(!publication.placeholder);
    }
}

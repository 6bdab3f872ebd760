/*
 * vocabulary.rs
 * Copyright (c) 2025 Austrian Centre for Digital Humanities
 */

//! Vocabulary lookups for `map[N]`.
//!
//! A bare table name maps values through a static table of the format. A
//! predicate (`map="/skos:prefLabel"`) treats the value as the URL of a
//! vocabulary concept: the concept document is fetched once, and the value is
//! replaced by the objects of that predicate about the concept.

use crate::format::ValueMaps;
use crate::value::{LangValue, MapSpec};
use oaipmh_graph::rdf::{format_from_media_type, read_statements};
use oaipmh_graph::{Dataset, GraphError, Statement};
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

/// Media types requested from vocabulary servers, in order of preference.
const ACCEPT_RDF: &str =
    "text/turtle, application/n-triples;q=0.9, application/rdf+xml;q=0.8, application/ld+json;q=0.5";

/// Errors fetching a vocabulary document.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Request to {url} failed: {message}")]
    Http { url: String, message: String },

    #[error("{url} answered with HTTP status {status}")]
    Status { url: String, status: u16 },

    #[error("{url} returned unsupported content type '{content_type}'")]
    UnsupportedContentType { url: String, content_type: String },

    #[error("Cannot parse {url}: {source}")]
    Parse {
        url: String,
        #[source]
        source: GraphError,
    },

    #[error("Vocabulary lookups are disabled ({url})")]
    Disabled { url: String },
}

/// Retrieves the statements of a vocabulary document.
pub trait VocabularyFetcher: Send + Sync {
    fn fetch(&self, url: &str) -> Result<Vec<Statement>, FetchError>;
}

/// A fetcher that never reaches the network; every lookup fails.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullFetcher;

impl VocabularyFetcher for NullFetcher {
    fn fetch(&self, url: &str) -> Result<Vec<Statement>, FetchError> {
        Err(FetchError::Disabled {
            url: url.to_string(),
        })
    }
}

/// Fetches vocabulary documents over HTTP with content negotiation.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::blocking::Client,
}

impl HttpFetcher {
    pub fn new(timeout: Duration) -> Result<Self, FetchError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("oaipmh/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| FetchError::Http {
                url: String::new(),
                message: e.to_string(),
            })?;
        Ok(Self { client })
    }
}

impl VocabularyFetcher for HttpFetcher {
    fn fetch(&self, url: &str) -> Result<Vec<Statement>, FetchError> {
        let http = |e: reqwest::Error| FetchError::Http {
            url: url.to_string(),
            message: e.to_string(),
        };
        let response = self
            .client
            .get(url)
            .header(ACCEPT, ACCEPT_RDF)
            .send()
            .map_err(http)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        let format =
            format_from_media_type(&content_type).ok_or_else(|| FetchError::UnsupportedContentType {
                url: url.to_string(),
                content_type: content_type.clone(),
            })?;

        let body = response.bytes().map_err(http)?;
        read_statements(body.as_ref(), format, Some(url)).map_err(|source| FetchError::Parse {
            url: url.to_string(),
            source,
        })
    }
}

/// Resolves `map[N]` lookups, caching remote documents for the lifetime of
/// the mapper.
///
/// Failed fetches are cached too, so an unreachable vocabulary costs one
/// request per URL rather than one per value.
pub struct VocabularyMapper {
    fetcher: Arc<dyn VocabularyFetcher>,
    documents: Mutex<HashMap<String, Option<Arc<Dataset>>>>,
}

impl std::fmt::Debug for VocabularyMapper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VocabularyMapper")
            .field("documents", &self.cached_documents())
            .finish()
    }
}

impl VocabularyMapper {
    pub fn new(fetcher: Arc<dyn VocabularyFetcher>) -> Self {
        Self {
            fetcher,
            documents: Mutex::new(HashMap::new()),
        }
    }

    /// Map one value. A miss yields no values. Remote maps return every
    /// value of the predicate in the fetched document.
    pub fn resolve(&self, key: &str, spec: &MapSpec, tables: &ValueMaps) -> Vec<LangValue> {
        match spec {
            MapSpec::Table(name) => tables
                .get(name)
                .and_then(|table| table.get(key))
                .map(|mapped| vec![LangValue::new(mapped.as_str())])
                .unwrap_or_default(),
            MapSpec::Remote(predicate) => {
                let Some(document) = self.document(key) else {
                    return Vec::new();
                };
                // Values about any subject, the document may use a canonical URI.
                let mut values: Vec<LangValue> = document
                    .iter()
                    .filter(|statement| statement.predicate == *predicate)
                    .map(|statement| LangValue::from(statement.object.clone()))
                    .collect();
                values.sort_by(|a, b| a.value.cmp(&b.value).then_with(|| a.lang.cmp(&b.lang)));
                values
            }
        }
    }

    /// Number of remote documents fetched (or failed) so far.
    pub fn cached_documents(&self) -> usize {
        self.documents
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    fn document(&self, url: &str) -> Option<Arc<Dataset>> {
        // Held across the fetch so each URL is requested once.
        let mut documents = self.documents.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(entry) = documents.get(url) {
            return entry.clone();
        }

        let entry = match self.fetcher.fetch(url) {
            Ok(statements) => {
                debug!(url, statements = statements.len(), "fetched vocabulary document");
                Some(Arc::new(statements.into_iter().collect::<Dataset>()))
            }
            Err(e) => {
                warn!(url, error = %e, "vocabulary lookup failed");
                None
            }
        };
        documents.insert(url.to_string(), entry.clone());
        entry
    }
}

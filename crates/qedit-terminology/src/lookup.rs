//! The lookup contract consumed by the editor

use crate::error::LookupResult;
use async_trait::async_trait;
use qedit_core::Coding;
use std::time::Duration;
use tracing::{trace, warn};

/// How a Bioportal query is interpreted
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum SearchKind {
    /// Free text match against labels and synonyms
    Text,
    /// Resolve the best matching concept, then list its descendants
    #[default]
    Concept,
}

/// Per-request lookup options
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct LookupOptions {
    /// Ontology acronyms; empty means the client's configured set
    pub ontologies: Vec<String>,
    pub kind: SearchKind,
    /// UMLS semantic type ids (`T047`, ...); text searches only
    pub semantic_types: Vec<String>,
    pub require_exact_match: bool,
}

impl LookupOptions {
    pub fn ontologies<I, S>(mut self, ontologies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ontologies = ontologies.into_iter().map(Into::into).collect();
        self
    }

    pub fn text(mut self) -> Self {
        self.kind = SearchKind::Text;
        self
    }

    pub fn semantic_types<I, S>(mut self, semantic_types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.semantic_types = semantic_types.into_iter().map(Into::into).collect();
        self
    }

    pub fn exact(mut self) -> Self {
        self.require_exact_match = true;
        self
    }
}

/// A terminology service that suggests codings for a query
#[async_trait]
pub trait TerminologyLookup: Send + Sync {
    /// Short service name used in logs
    fn name(&self) -> &'static str;

    /// Query the service, surfacing failures
    async fn search(&self, query: &str, options: &LookupOptions) -> LookupResult<Vec<Coding>>;

    /// Query the service; any failure becomes an empty result
    async fn lookup(&self, query: &str, options: &LookupOptions) -> Vec<Coding> {
        let query = query.trim();
        if query.is_empty() {
            return Vec::new();
        }
        match self.search(query, options).await {
            Ok(codings) => {
                trace!(service = self.name(), query, count = codings.len(), "Lookup finished");
                codings
            }
            Err(e) => {
                warn!(service = self.name(), "Lookup for '{}' failed: {}", query, e);
                Vec::new()
            }
        }
    }
}

pub(crate) fn http_client(timeout: Duration) -> LookupResult<reqwest::Client> {
    Ok(reqwest::Client::builder().timeout(timeout).build()?)
}

/// Check the status, then decode the body as JSON
pub(crate) async fn read_json<T: serde::de::DeserializeOwned>(
    response: reqwest::Response,
) -> LookupResult<T> {
    let status = response.status();
    if !status.is_success() {
        return Err(crate::LookupError::Status {
            status: status.as_u16(),
            url: response.url().to_string(),
        });
    }
    response
        .json::<T>()
        .await
        .map_err(|e| crate::LookupError::decode(e.to_string()))
}

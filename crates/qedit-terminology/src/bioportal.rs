//! Bioportal search client
//!
//! Bioportal names its ontologies by acronym; codings use FHIR system URIs.
//! [`ontology_system`] and [`system_ontology`] translate between the two.

use crate::error::{LookupError, LookupResult};
use crate::lookup::{LookupOptions, SearchKind, TerminologyLookup, http_client, read_json};
use async_trait::async_trait;
use qedit_core::Coding;
use qedit_core::config::TerminologyConfig;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

/// FHIR system and version behind a Bioportal ontology
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OntologySystem {
    pub system: &'static str,
    pub version: &'static str,
}

const SNOMEDCT: &str = "SNOMEDCT";

/// Ontologies the editor knows how to map into codings
pub const ONTOLOGIES: [(&str, OntologySystem); 7] = [
    (
        "SNOMEDCT",
        OntologySystem {
            system: "http://snomed.info/sct",
            version: "20220301",
        },
    ),
    (
        "ICD10CM",
        OntologySystem {
            system: "http://hl7.org/fhir/sid/icd-10-cm",
            version: "",
        },
    ),
    (
        "ICD9CM",
        OntologySystem {
            system: "http://hl7.org/fhir/sid/icd-9-cm",
            version: "",
        },
    ),
    (
        "ICD10",
        OntologySystem {
            system: "http://hl7.org/fhir/sid/icd-10",
            version: "",
        },
    ),
    (
        "LOINC",
        OntologySystem {
            system: "http://loinc.org",
            version: "",
        },
    ),
    (
        "RXNORM",
        OntologySystem {
            system: "http://www.nlm.nih.gov/research/umls/rxnorm",
            version: "03072022",
        },
    ),
    (
        "HL7",
        OntologySystem {
            system: "",
            version: "2021AB",
        },
    ),
];

const UNKNOWN: OntologySystem = OntologySystem {
    system: "unknown",
    version: "unknown",
};

/// Fields requested for every search hit
const INCLUDE: &str = "prefLabel,synonym,definition,notation";

pub fn ontology_system(acronym: &str) -> Option<OntologySystem> {
    ONTOLOGIES
        .iter()
        .find(|(name, _)| *name == acronym)
        .map(|(_, system)| *system)
}

/// Reverse mapping; ontologies without a system URI are unreachable
pub fn system_ontology(system: &str) -> Option<&'static str> {
    if system.is_empty() {
        return None;
    }
    ONTOLOGIES
        .iter()
        .find(|(_, s)| s.system == system)
        .map(|(name, _)| *name)
}

#[derive(Debug, Deserialize)]
struct SearchPage {
    #[serde(default)]
    collection: Vec<SearchHit>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchHit {
    #[serde(rename = "@id")]
    id: Option<String>,
    notation: Option<String>,
    pref_label: Option<String>,
    #[serde(default)]
    links: HitLinks,
}

#[derive(Debug, Default, Deserialize)]
struct HitLinks {
    ontology: Option<String>,
    descendants: Option<String>,
}

fn last_segment(url: &str) -> Option<&str> {
    url.rsplit('/').next().filter(|s| !s.is_empty())
}

impl SearchHit {
    /// Convert a hit into a coding; `id_fallback` lets concept listings use
    /// the class IRI when no notation is present
    fn into_coding(self, id_fallback: bool) -> Option<Coding> {
        let acronym = self.links.ontology.as_deref().and_then(last_segment)?;
        let mapped = ontology_system(acronym).unwrap_or(UNKNOWN);
        let code = match self.notation {
            Some(code) => code,
            None if id_fallback => self.id.as_deref().and_then(last_segment)?.to_string(),
            None => String::new(),
        };
        Some(
            Coding::new(mapped.system, code, self.pref_label.unwrap_or_default())
                .with_version(mapped.version),
        )
    }
}

/// Client for the Bioportal REST API
#[derive(Debug, Clone)]
pub struct BioportalClient {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    ontologies: Vec<String>,
}

impl BioportalClient {
    pub fn new(
        base_url: impl Into<String>,
        api_key: Option<String>,
        timeout: Duration,
    ) -> LookupResult<Self> {
        Ok(Self {
            client: http_client(timeout)?,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
            ontologies: Vec::new(),
        })
    }

    pub fn from_config(config: &TerminologyConfig) -> LookupResult<Self> {
        let bioportal = &config.bioportal;
        Ok(Self::new(
            bioportal.base_url.clone(),
            bioportal.api_key.clone(),
            Duration::from_secs(config.timeout_secs),
        )?
        .with_ontologies(bioportal.ontologies.clone()))
    }

    /// Ontologies searched when a request names none
    pub fn with_ontologies(mut self, ontologies: Vec<String>) -> Self {
        self.ontologies = ontologies;
        self
    }

    fn api_key(&self) -> LookupResult<&str> {
        self.api_key.as_deref().ok_or(LookupError::MissingApiKey)
    }

    fn ontologies_param(&self, requested: &[String]) -> String {
        if !requested.is_empty() {
            requested.join(",")
        } else if !self.ontologies.is_empty() {
            self.ontologies.join(",")
        } else {
            ONTOLOGIES
                .iter()
                .map(|(name, _)| *name)
                .collect::<Vec<_>>()
                .join(",")
        }
    }

    /// Codings whose labels or synonyms match `text`
    pub async fn search_text(
        &self,
        text: &str,
        ontologies: &[String],
        semantic_types: &[String],
        require_exact_match: bool,
    ) -> LookupResult<Vec<Coding>> {
        let exact = require_exact_match.to_string();
        let ontologies = self.ontologies_param(ontologies);
        let semantic_types = semantic_types.join(",");
        let mut query = vec![
            ("q", text),
            ("display_context", "false"),
            ("require_exact_match", exact.as_str()),
            ("ontologies", ontologies.as_str()),
            ("apikey", self.api_key()?),
            ("include", INCLUDE),
        ];
        if !semantic_types.is_empty() {
            query.push(("semantic_types", semantic_types.as_str()));
        }
        let response = self
            .client
            .get(format!("{}/search", self.base_url))
            .query(&query)
            .send()
            .await?;
        let page: SearchPage = read_json(response).await?;
        debug!(hits = page.collection.len(), "Bioportal text search");
        Ok(page
            .collection
            .into_iter()
            .filter_map(|hit| hit.into_coding(false))
            .collect())
    }

    /// Descendants of the best concept match for `concept`
    pub async fn search_concept(
        &self,
        concept: &str,
        ontologies: &[String],
    ) -> LookupResult<Vec<Coding>> {
        let api_key = self.api_key()?;
        let ontologies = self.ontologies_param(ontologies);
        let response = self
            .client
            .get(format!("{}/search", self.base_url))
            .query(&[
                ("q", concept),
                ("ontologies", ontologies.as_str()),
                ("apikey", api_key),
            ])
            .send()
            .await?;
        let page: SearchPage = read_json(response).await?;

        let Some(descendants) = page
            .collection
            .into_iter()
            .next()
            .and_then(|hit| hit.links.descendants)
        else {
            debug!("No concept match for '{}'", concept);
            return Ok(Vec::new());
        };

        let response = self
            .client
            .get(&descendants)
            .query(&[("apikey", api_key), ("include", INCLUDE)])
            .send()
            .await?;
        let page: SearchPage = read_json(response).await?;
        Ok(page
            .collection
            .into_iter()
            .filter_map(|hit| hit.into_coding(true))
            .collect())
    }
}

#[async_trait]
impl TerminologyLookup for BioportalClient {
    fn name(&self) -> &'static str {
        "bioportal"
    }

    async fn search(&self, query: &str, options: &LookupOptions) -> LookupResult<Vec<Coding>> {
        match options.kind {
            SearchKind::Text => {
                self.search_text(
                    query,
                    &options.ontologies,
                    &options.semantic_types,
                    options.require_exact_match,
                )
                .await
            }
            // SNOMED CT concepts are resolved within SNOMED CT alone
            SearchKind::Concept if options.ontologies.iter().any(|o| o == SNOMEDCT) => {
                self.search_concept(query, &[SNOMEDCT.to_string()]).await
            }
            SearchKind::Concept => self.search_concept(query, &options.ontologies).await,
        }
    }
}

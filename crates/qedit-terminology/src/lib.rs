//! qedit terminology
//!
//! Coding suggestions for the editor from external terminology services.
//! Nothing here mutates a document: results feed suggestion lists, and any
//! service failure degrades to an empty result.

pub mod bioportal;
pub mod cache;
pub mod error;
pub mod lookup;
pub mod suggestions;
pub mod ucum;

pub use bioportal::{BioportalClient, ONTOLOGIES, OntologySystem, ontology_system, system_ontology};
pub use cache::CachedLookup;
pub use error::{LookupError, LookupResult};
pub use lookup::{LookupOptions, SearchKind, TerminologyLookup};
pub use suggestions::{RequestToken, SuggestionList};
pub use ucum::{UCUM_SYSTEM, UcumClient};

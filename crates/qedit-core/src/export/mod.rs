//! Questionnaire export and import
//!
//! - `fhir_types` - serde wire types for the FHIR Questionnaire resource
//! - `generator` - deterministic tree to JSON serializer
//! - `import` - the inverse, JSON to tree

pub mod fhir_types;
pub mod generator;
pub mod import;

pub use fhir_types::{Questionnaire, QuestionnaireItem};
pub use generator::{generate, generate_json, generate_value};
pub use import::{import_questionnaire, import_value};

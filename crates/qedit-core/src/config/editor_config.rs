//! Configuration structure for qedit
//!
//! Sections:
//! - `editor`: defaults for new documents and items
//! - `validation`: which checks the validation engine runs
//! - `generator`: output formatting
//! - `terminology`: endpoints and caching of the lookup collaborators
//!
//! ## Example Configuration (qedit.yaml)
//!
//! ```yaml
//! editor:
//!   defaultLanguage: nb-NO
//!   defaultItemType: string
//!
//! validation:
//!   translations: true
//!   codes: true
//!
//! generator:
//!   pretty: true
//!
//! terminology:
//!   debounceMs: 300
//!   bioportal:
//!     baseUrl: https://data.bioontology.org
//!     ontologies: [SNOMEDCT, LOINC]
//! ```

use crate::error::QeditError;
use crate::model::ItemType;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Environment variable that supplies the Bioportal API key
pub const BIOPORTAL_API_KEY_ENV: &str = "QEDIT_BIOPORTAL_API_KEY";

pub const DEFAULT_BIOPORTAL_URL: &str = "https://data.bioontology.org";
pub const DEFAULT_UCUM_URL: &str = "https://clinicaltables.nlm.nih.gov/api/ucum/v3";

/// Root configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct EditorConfig {
    /// JSON Schema reference, ignored by the loader
    #[serde(rename = "$schema", skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,

    pub editor: EditorSection,
    pub validation: ValidationConfig,
    pub generator: GeneratorConfig,
    pub terminology: TerminologyConfig,
}

/// Defaults for new documents
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct EditorSection {
    /// Base language of new questionnaires
    #[schemars(description = "Base language code of new questionnaires")]
    pub default_language: String,

    /// FHIR item type code given to new items
    #[schemars(description = "Item type of newly added items, e.g. 'string' or 'group'")]
    pub default_item_type: String,
}

impl Default for EditorSection {
    fn default() -> Self {
        Self {
            default_language: "en-US".to_string(),
            default_item_type: ItemType::String.code().to_string(),
        }
    }
}

impl EditorSection {
    pub fn item_type(&self) -> Result<ItemType, QeditError> {
        self.default_item_type
            .parse()
            .map_err(|e: String| QeditError::config_error(format!("editor.defaultItemType: {e}")))
    }
}

/// Validation engine switches
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct ValidationConfig {
    #[schemars(description = "Check that every additional language translates every item")]
    pub translations: bool,

    #[schemars(description = "Flag codings without code or system")]
    pub codes: bool,

    /// Restrict translation checks to these languages instead of the
    /// document's own list
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schemars(description = "Languages to check instead of the document's additional languages")]
    pub languages: Option<Vec<String>>,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            translations: true,
            codes: true,
            languages: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct GeneratorConfig {
    #[schemars(description = "Pretty-print generated JSON")]
    pub pretty: bool,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self { pretty: true }
    }
}

/// Terminology collaborators
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct TerminologyConfig {
    pub bioportal: BioportalConfig,
    pub ucum: UcumConfig,

    #[schemars(description = "Trailing debounce window for lookups in milliseconds")]
    pub debounce_ms: u64,

    #[schemars(description = "HTTP timeout in seconds")]
    pub timeout_secs: u64,

    #[schemars(description = "Memoize lookup results per query")]
    pub cache: bool,
}

impl Default for TerminologyConfig {
    fn default() -> Self {
        Self {
            bioportal: BioportalConfig::default(),
            ucum: UcumConfig::default(),
            debounce_ms: 300,
            timeout_secs: 10,
            cache: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct BioportalConfig {
    pub base_url: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    #[schemars(description = "API key; falls back to QEDIT_BIOPORTAL_API_KEY")]
    pub api_key: Option<String>,

    #[schemars(description = "Ontology acronyms searched by default")]
    pub ontologies: Vec<String>,
}

impl Default for BioportalConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BIOPORTAL_URL.to_string(),
            api_key: None,
            ontologies: vec!["SNOMEDCT".to_string()],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct UcumConfig {
    pub base_url: String,
}

impl Default for UcumConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_UCUM_URL.to_string(),
        }
    }
}

impl EditorConfig {
    /// Load configuration from file
    ///
    /// The format is chosen by extension: `.json`, `.toml`, `.yaml`/`.yml`.
    pub fn load(path: &Path) -> Result<Self, QeditError> {
        let content = fs::read_to_string(path).map_err(|e| QeditError::io_error(path, e))?;
        let ext = path.extension().and_then(|e| e.to_str());

        let config: Self = match ext {
            Some("json") => serde_json::from_str(&content)
                .map_err(|e| QeditError::config_error(e.to_string()))?,
            Some("toml") => {
                toml::from_str(&content).map_err(|e| QeditError::config_error(e.to_string()))?
            }
            Some("yaml") | Some("yml") => serde_yaml::from_str(&content)
                .map_err(|e| QeditError::config_error(e.to_string()))?,
            _ => {
                return Err(QeditError::config_error(
                    "Unsupported file extension (expected .json, .toml, .yaml or .yml)",
                ));
            }
        };
        config.validate()?;
        Ok(config)
    }

    /// Reject values serde accepts but the editor cannot use
    pub fn validate(&self) -> Result<(), QeditError> {
        self.editor.item_type()?;
        if self.editor.default_language.trim().is_empty() {
            return Err(QeditError::config_error("editor.defaultLanguage is empty"));
        }
        Ok(())
    }

    /// Fill the Bioportal key from the environment when the file has none
    pub fn apply_env(mut self) -> Self {
        if self.terminology.bioportal.api_key.is_none()
            && let Ok(key) = std::env::var(BIOPORTAL_API_KEY_ENV)
            && !key.is_empty()
        {
            self.terminology.bioportal.api_key = Some(key);
        }
        self
    }

    /// JSON Schema of the configuration file
    pub fn json_schema() -> serde_json::Value {
        serde_json::to_value(schemars::schema_for!(EditorConfig)).unwrap_or_default()
    }
}

//! Configuration system for qedit
//!
//! - JSON, TOML and YAML configuration files
//! - Auto-discovery by traversing up directories
//! - Strong typing with serde and JSON Schema generation via schemars
//! - Built-in defaults when no file exists
//!
//! ## Configuration Discovery
//!
//! When no explicit config path is provided, the loader searches for
//! `.qeditrc.json`, `.qeditrc.toml`, `qedit.yaml`, `qedit.yml` and
//! `qedit.json` starting from the current directory and moving up the
//! directory tree.
//!
//! ## Example Configuration
//!
//! ```json
//! {
//!   "editor": { "defaultLanguage": "nb-NO" },
//!   "validation": { "translations": true, "codes": true },
//!   "terminology": {
//!     "bioportal": { "ontologies": ["SNOMEDCT", "LOINC"] },
//!     "debounceMs": 250
//!   }
//! }
//! ```

mod editor_config;
mod loader;

pub use editor_config::{
    BIOPORTAL_API_KEY_ENV, BioportalConfig, DEFAULT_BIOPORTAL_URL, DEFAULT_UCUM_URL, EditorConfig,
    EditorSection, GeneratorConfig, TerminologyConfig, UcumConfig, ValidationConfig,
};
pub use loader::{CONFIG_FILE_NAMES, ConfigLoader};

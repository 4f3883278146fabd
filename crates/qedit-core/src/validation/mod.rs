//! Validation engine
//!
//! Two independent read-only passes over a tree snapshot:
//!
//! - [`validate_orphans`]: broken `enableWhen` references, incomplete codings
//!   and extensions missing their companion value
//! - [`validate_translations`]: gaps in the additional-language overlay
//!
//! Neither pass fails; both accumulate [`ValidationError`]s ordered by a
//! pre-order walk from the root. Validation is not a precondition of any
//! dispatched action, so a document may hold problems while it is edited.

mod orphan;
mod translation;

pub use orphan::validate_orphans;
pub use translation::validate_translations;

use crate::config::ValidationConfig;
use crate::model::{TranslatableProperty, Tree};
use serde::{Serialize, Serializer};
use std::fmt;

/// Field of an item a violation points at
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorProperty {
    EnableWhen,
    Code,
    /// Extension with this URL
    Extension(String),
    /// Missing overlay entry for this property
    Translation(TranslatableProperty),
}

impl fmt::Display for ErrorProperty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorProperty::EnableWhen => f.write_str("enableWhen"),
            ErrorProperty::Code => f.write_str("code"),
            ErrorProperty::Extension(url) => write!(f, "extension[{url}]"),
            ErrorProperty::Translation(property) => write!(f, "{property}"),
        }
    }
}

impl Serialize for ErrorProperty {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// What kind of problem was found
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ErrorCode {
    /// enableWhen points at a linkId that does not exist
    MissingReference,
    /// enableWhen points at the item itself
    SelfReference,
    /// enableWhen points into the item's own subtree
    DescendantReference,
    /// `exists` operator with a non-boolean answer
    ExistsNeedsBoolean,
    /// Coding answer that none of the referenced item's options offers
    AnswerNotInOptions,
    /// Coding without code or system
    IncompleteCoding,
    /// Extension without the value that gives it meaning
    MissingCompanion,
    /// Base-language string without an overlay entry
    MissingTranslation,
}

/// One addressable violation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationError {
    pub link_id: String,
    pub error_property: ErrorProperty,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub index: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    pub code: ErrorCode,
    pub message: String,
}

impl ValidationError {
    pub(crate) fn new(
        link_id: &str,
        error_property: ErrorProperty,
        code: ErrorCode,
        message: impl Into<String>,
    ) -> Self {
        Self {
            link_id: link_id.to_string(),
            error_property,
            index: None,
            language: None,
            code,
            message: message.into(),
        }
    }

    pub(crate) fn at(mut self, index: usize) -> Self {
        self.index = Some(index);
        self
    }

    pub(crate) fn in_language(mut self, language: &str) -> Self {
        self.language = Some(language.to_string());
        self
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.link_id, self.error_property)?;
        if let Some(index) = self.index {
            write!(f, "[{index}]")?;
        }
        if let Some(language) = &self.language {
            write!(f, " ({language})")?;
        }
        write!(f, ": {}", self.message)
    }
}

/// Results of both passes
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationReport {
    pub orphans: Vec<ValidationError>,
    pub translations: Vec<ValidationError>,
}

impl ValidationReport {
    pub fn is_clean(&self) -> bool {
        self.orphans.is_empty() && self.translations.is_empty()
    }

    pub fn len(&self) -> usize {
        self.orphans.len() + self.translations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Every violation, orphans first
    pub fn iter(&self) -> impl Iterator<Item = &ValidationError> {
        self.orphans.iter().chain(self.translations.iter())
    }
}

/// Run both passes
pub fn validate(tree: &Tree, config: &ValidationConfig) -> ValidationReport {
    let report = ValidationReport {
        orphans: validate_orphans(tree, config),
        translations: validate_translations(tree, config),
    };
    tracing::debug!(
        orphans = report.orphans.len(),
        translations = report.translations.len(),
        "Validated questionnaire"
    );
    report
}

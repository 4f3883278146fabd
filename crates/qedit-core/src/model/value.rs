//! Terminology bindings and typed values
//!
//! [`TypedValue`] is the single representation behind every FHIR `[x]`
//! choice the editor touches: `enableWhen.answer[x]`, `answerOption.value[x]`
//! and `extension.value[x]`. The variant decides which suffixed field the
//! generator writes (`valueCoding`, `answerBoolean`, ...).

use serde::{Deserialize, Serialize};
use serde_json::Number;

/// A (system, code, display, version) terminology binding
///
/// `id` is a client-local disambiguator. It keeps list entries stable while
/// the user edits them and is never written to the generated document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Coding {
    #[serde(skip)]
    pub id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub display: Option<String>,
}

impl Coding {
    /// Create a coding with system, code and display
    pub fn new(
        system: impl Into<String>,
        code: impl Into<String>,
        display: impl Into<String>,
    ) -> Self {
        Self {
            id: None,
            system: non_empty(system.into()),
            version: None,
            code: non_empty(code.into()),
            display: non_empty(display.into()),
        }
    }

    /// Create a coding carrying only a code
    pub fn from_code(code: impl Into<String>) -> Self {
        Self {
            code: non_empty(code.into()),
            ..Self::default()
        }
    }

    /// Set the code system version
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = non_empty(version.into());
        self
    }

    /// Whether a non-empty code is present
    pub fn has_code(&self) -> bool {
        self.code.as_deref().is_some_and(|c| !c.trim().is_empty())
    }

    /// Whether a non-empty system is present
    pub fn has_system(&self) -> bool {
        self.system.as_deref().is_some_and(|s| !s.trim().is_empty())
    }

    /// Same concept: equal system and code (display and version ignored)
    pub fn same_concept(&self, other: &Coding) -> bool {
        self.system == other.system && self.code == other.code
    }
}

/// Quantity value with unit
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Quantity {
    pub value: Option<Number>,
    pub unit: Option<String>,
    pub system: Option<String>,
    pub code: Option<String>,
}

/// Concept with codings and free text
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CodeableConcept {
    pub coding: Vec<Coding>,
    pub text: Option<String>,
}

/// A value for one of the FHIR `[x]` choice elements
#[derive(Debug, Clone, PartialEq)]
pub enum TypedValue {
    Boolean(bool),
    Integer(i64),
    /// Decimal kept as the exact JSON number so output is byte-stable
    Decimal(Number),
    Date(String),
    DateTime(String),
    Time(String),
    String(String),
    Code(String),
    Uri(String),
    Markdown(String),
    Coding(Coding),
    CodeableConcept(CodeableConcept),
    Quantity(Quantity),
    Reference(String),
}

/// The declared kind of a [`TypedValue`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Boolean,
    Integer,
    Decimal,
    Date,
    DateTime,
    Time,
    String,
    Code,
    Uri,
    Markdown,
    Coding,
    CodeableConcept,
    Quantity,
    Reference,
}

impl ValueKind {
    /// Every kind, in the order the importer probes them
    pub const ALL: [ValueKind; 14] = [
        ValueKind::Boolean,
        ValueKind::Integer,
        ValueKind::Decimal,
        ValueKind::Date,
        ValueKind::DateTime,
        ValueKind::Time,
        ValueKind::String,
        ValueKind::Code,
        ValueKind::Uri,
        ValueKind::Markdown,
        ValueKind::Coding,
        ValueKind::CodeableConcept,
        ValueKind::Quantity,
        ValueKind::Reference,
    ];

    /// FHIR type suffix used in `value[x]` / `answer[x]` field names
    pub fn suffix(self) -> &'static str {
        match self {
            ValueKind::Boolean => "Boolean",
            ValueKind::Integer => "Integer",
            ValueKind::Decimal => "Decimal",
            ValueKind::Date => "Date",
            ValueKind::DateTime => "DateTime",
            ValueKind::Time => "Time",
            ValueKind::String => "String",
            ValueKind::Code => "Code",
            ValueKind::Uri => "Uri",
            ValueKind::Markdown => "Markdown",
            ValueKind::Coding => "Coding",
            ValueKind::CodeableConcept => "CodeableConcept",
            ValueKind::Quantity => "Quantity",
            ValueKind::Reference => "Reference",
        }
    }

    /// Look a kind up by its suffix
    pub fn from_suffix(suffix: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.suffix() == suffix)
    }
}

impl TypedValue {
    /// The declared kind of this value
    pub fn kind(&self) -> ValueKind {
        match self {
            TypedValue::Boolean(_) => ValueKind::Boolean,
            TypedValue::Integer(_) => ValueKind::Integer,
            TypedValue::Decimal(_) => ValueKind::Decimal,
            TypedValue::Date(_) => ValueKind::Date,
            TypedValue::DateTime(_) => ValueKind::DateTime,
            TypedValue::Time(_) => ValueKind::Time,
            TypedValue::String(_) => ValueKind::String,
            TypedValue::Code(_) => ValueKind::Code,
            TypedValue::Uri(_) => ValueKind::Uri,
            TypedValue::Markdown(_) => ValueKind::Markdown,
            TypedValue::Coding(_) => ValueKind::Coding,
            TypedValue::CodeableConcept(_) => ValueKind::CodeableConcept,
            TypedValue::Quantity(_) => ValueKind::Quantity,
            TypedValue::Reference(_) => ValueKind::Reference,
        }
    }

    /// Human-visible text carried by the value, if it has one
    ///
    /// Used to decide what needs a translation: string-like values translate
    /// their content, codings translate their display.
    pub fn display_text(&self) -> Option<&str> {
        let text = match self {
            TypedValue::String(s) | TypedValue::Markdown(s) => Some(s.as_str()),
            TypedValue::Coding(c) => c.display.as_deref(),
            _ => None,
        };
        text.filter(|t| !t.trim().is_empty())
    }

    pub fn as_coding(&self) -> Option<&Coding> {
        match self {
            TypedValue::Coding(c) => Some(c),
            _ => None,
        }
    }
}

/// Empty strings mean "not set" throughout the model
pub(crate) fn non_empty(value: String) -> Option<String> {
    if value.is_empty() { None } else { Some(value) }
}

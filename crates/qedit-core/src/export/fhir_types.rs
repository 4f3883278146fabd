//! FHIR wire types for the Questionnaire resource
//!
//! Only the elements the editor reads and writes are modelled. Choice
//! elements (`value[x]`, `answer[x]`) are carried as flattened JSON maps and
//! converted with [`write_choice`] / [`read_choice`], since their field name
//! depends on the value's type.

use crate::model::extension::TRANSLATION_URL;
use crate::model::{CodeableConcept, Coding, Quantity, TypedValue, ValueKind};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

// ============================================================================
// Questionnaire
// ============================================================================

/// FHIR Questionnaire resource
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Questionnaire {
    /// Resource type (always "Questionnaire")
    pub resource_type: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Base language of the resource
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extension: Vec<FhirExtension>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(rename = "_title", skip_serializing_if = "Option::is_none")]
    pub title_element: Option<PrimitiveElement>,

    /// draft | active | retired | unknown
    #[serde(default = "default_status")]
    pub status: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub subject_type: Vec<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub publisher: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(rename = "_description", skip_serializing_if = "Option::is_none")]
    pub description_element: Option<PrimitiveElement>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub purpose: Option<String>,

    #[serde(rename = "_purpose", skip_serializing_if = "Option::is_none")]
    pub purpose_element: Option<PrimitiveElement>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub item: Vec<QuestionnaireItem>,
}

fn default_status() -> String {
    crate::model::metadata::DEFAULT_STATUS.to_string()
}

/// One `Questionnaire.item`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct QuestionnaireItem {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extension: Vec<FhirExtension>,

    #[serde(default)]
    pub link_id: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub definition: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub code: Vec<FhirCoding>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub prefix: Option<String>,

    #[serde(rename = "_prefix", skip_serializing_if = "Option::is_none")]
    pub prefix_element: Option<PrimitiveElement>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,

    #[serde(rename = "_text", skip_serializing_if = "Option::is_none")]
    pub text_element: Option<PrimitiveElement>,

    #[serde(rename = "type")]
    pub item_type: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub enable_when: Vec<FhirEnableWhen>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub enable_behavior: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub required: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub repeats: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub read_only: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_length: Option<u32>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub answer_option: Vec<FhirAnswerOption>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub item: Vec<QuestionnaireItem>,
}

/// Coding as it appears in `Questionnaire.item.code`
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FhirCoding {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub display: Option<String>,

    #[serde(rename = "_display", skip_serializing_if = "Option::is_none")]
    pub display_element: Option<PrimitiveElement>,
}

/// Extension carrier for a primitive element (`_text`, `_title`, ...)
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PrimitiveElement {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extension: Vec<FhirExtension>,
}

/// FHIR Extension with its `value[x]` flattened
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct FhirExtension {
    pub url: String,

    #[serde(flatten)]
    pub value: Map<String, Value>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extension: Vec<FhirExtension>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FhirEnableWhen {
    pub question: String,
    pub operator: String,
    #[serde(flatten)]
    pub answer: Map<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FhirAnswerOption {
    #[serde(flatten)]
    pub value: Map<String, Value>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub initial_selected: Option<bool>,
}

// ============================================================================
// Translations
// ============================================================================

impl FhirExtension {
    /// `{url, value<Kind>}` extension
    pub fn with_value(url: impl Into<String>, value: &TypedValue) -> Self {
        let mut map = Map::new();
        write_choice(&mut map, "value", value, &[]);
        Self {
            url: url.into(),
            value: map,
            extension: Vec::new(),
        }
    }

    /// The translation extension for one language
    pub fn translation(language: &str, content: &str) -> Self {
        Self {
            url: TRANSLATION_URL.to_string(),
            value: Map::new(),
            extension: vec![
                Self::with_value("lang", &TypedValue::Code(language.to_string())),
                Self::with_value("content", &TypedValue::String(content.to_string())),
            ],
        }
    }

    /// Read `(language, content)` if this is a well-formed translation extension
    pub fn as_translation(&self) -> Option<(String, String)> {
        if self.url != TRANSLATION_URL {
            return None;
        }
        let part = |name: &str| {
            self.extension
                .iter()
                .find(|e| e.url == name)
                .and_then(|e| e.value.values().next())
                .and_then(Value::as_str)
                .map(String::from)
        };
        Some((part("lang")?, part("content")?))
    }
}

impl PrimitiveElement {
    /// `None` when there is nothing to carry
    pub fn from_translations(translations: &[(&str, &str)]) -> Option<Self> {
        if translations.is_empty() {
            return None;
        }
        Some(Self {
            extension: translations
                .iter()
                .map(|(language, content)| FhirExtension::translation(language, content))
                .collect(),
        })
    }

    pub fn translations(&self) -> Vec<(String, String)> {
        self.extension
            .iter()
            .filter_map(FhirExtension::as_translation)
            .collect()
    }
}

/// Translations carried by an optional `_element`
pub fn element_translations(element: Option<&PrimitiveElement>) -> Vec<(String, String)> {
    element.map(PrimitiveElement::translations).unwrap_or_default()
}

// ============================================================================
// Choice values
// ============================================================================

/// Insert `value` under `<prefix><Kind>` into `map`
///
/// Translations of the value's text are attached the FHIR way: inside the
/// coding as `_display` for codings, as a `_<prefix><Kind>` sibling for
/// string-like values.
pub fn write_choice(
    map: &mut Map<String, Value>,
    prefix: &str,
    value: &TypedValue,
    translations: &[(&str, &str)],
) {
    let key = format!("{prefix}{}", value.kind().suffix());
    let mut json = value_to_json(value);
    let element = PrimitiveElement::from_translations(translations)
        .and_then(|element| serde_json::to_value(element).ok());

    let mut sibling = None;
    if let Some(element) = element {
        match &mut json {
            Value::Object(coding) if value.kind() == ValueKind::Coding => {
                coding.insert("_display".to_string(), element);
            }
            _ => sibling = Some((format!("_{key}"), element)),
        }
    }
    map.insert(key, json);
    if let Some((key, element)) = sibling {
        map.insert(key, element);
    }
}

/// Find and decode the `<prefix>[x]` entry of `map`
///
/// Returns the value and any translations attached to it.
pub fn read_choice(
    map: &Map<String, Value>,
    prefix: &str,
) -> Result<Option<(TypedValue, Vec<(String, String)>)>, String> {
    for (key, json) in map {
        let Some(kind) = key.strip_prefix(prefix).and_then(ValueKind::from_suffix) else {
            continue;
        };
        let value = value_from_json(kind, json)?;

        let element = if kind == ValueKind::Coding {
            json.get("_display")
        } else {
            map.get(&format!("_{key}"))
        };
        let translations = match element {
            Some(element) => serde_json::from_value::<PrimitiveElement>(element.clone())
                .map_err(|e| format!("{key}: {e}"))?
                .translations(),
            None => Vec::new(),
        };
        return Ok(Some((value, translations)));
    }
    Ok(None)
}

/// JSON form of a typed value
pub fn value_to_json(value: &TypedValue) -> Value {
    match value {
        TypedValue::Boolean(b) => Value::Bool(*b),
        TypedValue::Integer(n) => Value::from(*n),
        TypedValue::Decimal(n) => Value::Number(n.clone()),
        TypedValue::Date(s)
        | TypedValue::DateTime(s)
        | TypedValue::Time(s)
        | TypedValue::String(s)
        | TypedValue::Code(s)
        | TypedValue::Uri(s)
        | TypedValue::Markdown(s) => Value::String(s.clone()),
        TypedValue::Coding(coding) => coding_to_json(coding),
        TypedValue::CodeableConcept(cc) => {
            let mut map = Map::new();
            if !cc.coding.is_empty() {
                map.insert(
                    "coding".to_string(),
                    Value::Array(cc.coding.iter().map(coding_to_json).collect()),
                );
            }
            if let Some(text) = &cc.text {
                map.insert("text".to_string(), Value::String(text.clone()));
            }
            Value::Object(map)
        }
        TypedValue::Quantity(q) => {
            let mut map = Map::new();
            if let Some(value) = &q.value {
                map.insert("value".to_string(), Value::Number(value.clone()));
            }
            for (key, field) in [("unit", &q.unit), ("system", &q.system), ("code", &q.code)] {
                if let Some(field) = field {
                    map.insert(key.to_string(), Value::String(field.clone()));
                }
            }
            Value::Object(map)
        }
        TypedValue::Reference(reference) => json!({ "reference": reference }),
    }
}

fn coding_to_json(coding: &Coding) -> Value {
    serde_json::to_value(coding).unwrap_or_else(|_| Value::Object(Map::new()))
}

/// Decode a typed value of a known kind
pub fn value_from_json(kind: ValueKind, json: &Value) -> Result<TypedValue, String> {
    let expected = |what: &str| format!("value{}: expected {what}", kind.suffix());
    let string = || {
        json.as_str()
            .map(String::from)
            .ok_or_else(|| expected("a string"))
    };

    Ok(match kind {
        ValueKind::Boolean => TypedValue::Boolean(json.as_bool().ok_or_else(|| expected("a boolean"))?),
        ValueKind::Integer => TypedValue::Integer(json.as_i64().ok_or_else(|| expected("an integer"))?),
        ValueKind::Decimal => match json {
            Value::Number(n) => TypedValue::Decimal(n.clone()),
            _ => return Err(expected("a number")),
        },
        ValueKind::Date => TypedValue::Date(string()?),
        ValueKind::DateTime => TypedValue::DateTime(string()?),
        ValueKind::Time => TypedValue::Time(string()?),
        ValueKind::String => TypedValue::String(string()?),
        ValueKind::Code => TypedValue::Code(string()?),
        ValueKind::Uri => TypedValue::Uri(string()?),
        ValueKind::Markdown => TypedValue::Markdown(string()?),
        ValueKind::Coding => TypedValue::Coding(coding_from_json(json).ok_or_else(|| expected("an object"))?),
        ValueKind::CodeableConcept => {
            let object = json.as_object().ok_or_else(|| expected("an object"))?;
            let coding = match object.get("coding") {
                Some(Value::Array(codings)) => codings.iter().filter_map(coding_from_json).collect(),
                Some(_) => return Err(expected("a coding array")),
                None => Vec::new(),
            };
            TypedValue::CodeableConcept(CodeableConcept {
                coding,
                text: str_field(object, "text"),
            })
        }
        ValueKind::Quantity => {
            let object = json.as_object().ok_or_else(|| expected("an object"))?;
            TypedValue::Quantity(Quantity {
                value: object.get("value").and_then(Value::as_number).cloned(),
                unit: str_field(object, "unit"),
                system: str_field(object, "system"),
                code: str_field(object, "code"),
            })
        }
        ValueKind::Reference => TypedValue::Reference(
            json.get("reference")
                .and_then(Value::as_str)
                .map(String::from)
                .ok_or_else(|| expected("a reference"))?,
        ),
    })
}

fn coding_from_json(json: &Value) -> Option<Coding> {
    let object = json.as_object()?;
    Some(Coding {
        id: None,
        system: str_field(object, "system"),
        version: str_field(object, "version"),
        code: str_field(object, "code"),
        display: str_field(object, "display"),
    })
}

fn str_field(object: &Map<String, Value>, key: &str) -> Option<String> {
    object
        .get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(String::from)
}

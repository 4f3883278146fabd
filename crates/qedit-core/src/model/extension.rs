//! Extension registry
//!
//! Every item property that is not universally present (units, regex rules,
//! min length, custom validation messages, UI hints) lives in the item's
//! extension set, keyed by canonical URL. There is exactly one value per URL;
//! setting replaces in place and removing an absent URL is a no-op.
//!
//! Known extensions are typed variants of [`Extension`]; anything else is kept
//! verbatim as [`Extension::Other`] so import/export never drops data.

use super::item::Item;
use super::value::{CodeableConcept, Coding, TypedValue, ValueKind};
use indexmap::IndexMap;

pub const UNIT_URL: &str = "http://hl7.org/fhir/StructureDefinition/questionnaire-unit";
pub const REGEX_URL: &str = "http://hl7.org/fhir/StructureDefinition/regex";
pub const MIN_LENGTH_URL: &str = "http://hl7.org/fhir/StructureDefinition/minLength";
pub const VALIDATION_TEXT_URL: &str = "http://ehelse.no/fhir/StructureDefinition/validationtext";
pub const ENTRY_FORMAT_URL: &str = "http://hl7.org/fhir/StructureDefinition/entryFormat";
pub const HIDDEN_URL: &str = "http://hl7.org/fhir/StructureDefinition/questionnaire-hidden";
pub const MAX_DECIMAL_PLACES_URL: &str = "http://hl7.org/fhir/StructureDefinition/maxDecimalPlaces";
pub const ITEM_CONTROL_URL: &str =
    "http://hl7.org/fhir/StructureDefinition/questionnaire-itemControl";

/// Core translation extension, attached to primitive elements (`_text`, ...)
pub const TRANSLATION_URL: &str = "http://hl7.org/fhir/StructureDefinition/translation";
/// Document-level declaration of a language the document is translated into
pub const ADDITIONAL_LANGUAGE_URL: &str =
    "http://hl7.org/fhir/tools/StructureDefinition/additional-language";

/// One extension attached to an item
#[derive(Debug, Clone, PartialEq)]
pub enum Extension {
    /// Unit of measure for quantity/decimal items (`valueCoding`)
    Unit(Coding),
    /// Regular expression the answer must match (`valueString`)
    Regex(String),
    /// Minimum answer length (`valueInteger`)
    MinLength(i64),
    /// Message shown when validation fails (`valueString`)
    ValidationText(String),
    /// Placeholder/entry hint (`valueString`)
    EntryFormat(String),
    /// Hide the item from the filler (`valueBoolean`)
    Hidden(bool),
    /// Maximum decimal places for decimal answers (`valueInteger`)
    MaxDecimalPlaces(i64),
    /// Rendering control hint (`valueCodeableConcept`)
    ItemControl(CodeableConcept),
    /// Any extension without a typed variant
    Other {
        url: String,
        value: Option<TypedValue>,
        extension: Vec<Extension>,
    },
}

impl Extension {
    /// Build an extension from its URL and payload
    ///
    /// Known URLs whose payload has the declared value kind become typed
    /// variants. Everything else, including a known URL carrying an unexpected
    /// kind, is kept as [`Extension::Other`].
    pub fn from_parts(url: &str, value: Option<TypedValue>, extension: Vec<Extension>) -> Self {
        if extension.is_empty() {
            let typed = match (url, value.clone()) {
                (UNIT_URL, Some(TypedValue::Coding(c))) => Some(Extension::Unit(c)),
                (REGEX_URL, Some(TypedValue::String(s))) => Some(Extension::Regex(s)),
                (MIN_LENGTH_URL, Some(TypedValue::Integer(n))) => Some(Extension::MinLength(n)),
                (VALIDATION_TEXT_URL, Some(TypedValue::String(s))) => {
                    Some(Extension::ValidationText(s))
                }
                (ENTRY_FORMAT_URL, Some(TypedValue::String(s))) => Some(Extension::EntryFormat(s)),
                (HIDDEN_URL, Some(TypedValue::Boolean(b))) => Some(Extension::Hidden(b)),
                (MAX_DECIMAL_PLACES_URL, Some(TypedValue::Integer(n))) => {
                    Some(Extension::MaxDecimalPlaces(n))
                }
                (ITEM_CONTROL_URL, Some(TypedValue::CodeableConcept(cc))) => {
                    Some(Extension::ItemControl(cc))
                }
                _ => None,
            };
            if let Some(typed) = typed {
                return typed;
            }
        }
        Extension::Other {
            url: url.to_string(),
            value,
            extension,
        }
    }

    /// Canonical URL identifying this extension
    pub fn url(&self) -> &str {
        match self {
            Extension::Unit(_) => UNIT_URL,
            Extension::Regex(_) => REGEX_URL,
            Extension::MinLength(_) => MIN_LENGTH_URL,
            Extension::ValidationText(_) => VALIDATION_TEXT_URL,
            Extension::EntryFormat(_) => ENTRY_FORMAT_URL,
            Extension::Hidden(_) => HIDDEN_URL,
            Extension::MaxDecimalPlaces(_) => MAX_DECIMAL_PLACES_URL,
            Extension::ItemControl(_) => ITEM_CONTROL_URL,
            Extension::Other { url, .. } => url,
        }
    }

    /// The declared value kind of a known extension, `None` for `Other`
    pub fn declared_kind(&self) -> Option<ValueKind> {
        match self {
            Extension::Unit(_) => Some(ValueKind::Coding),
            Extension::Regex(_) | Extension::ValidationText(_) | Extension::EntryFormat(_) => {
                Some(ValueKind::String)
            }
            Extension::MinLength(_) | Extension::MaxDecimalPlaces(_) => Some(ValueKind::Integer),
            Extension::Hidden(_) => Some(ValueKind::Boolean),
            Extension::ItemControl(_) => Some(ValueKind::CodeableConcept),
            Extension::Other { .. } => None,
        }
    }

    /// The payload as a typed value
    pub fn value(&self) -> Option<TypedValue> {
        match self {
            Extension::Unit(c) => Some(TypedValue::Coding(c.clone())),
            Extension::Regex(s) | Extension::ValidationText(s) | Extension::EntryFormat(s) => {
                Some(TypedValue::String(s.clone()))
            }
            Extension::MinLength(n) | Extension::MaxDecimalPlaces(n) => {
                Some(TypedValue::Integer(*n))
            }
            Extension::Hidden(b) => Some(TypedValue::Boolean(*b)),
            Extension::ItemControl(cc) => Some(TypedValue::CodeableConcept(cc.clone())),
            Extension::Other { value, .. } => value.clone(),
        }
    }

    /// Nested extensions (only `Other` can carry them)
    pub fn nested(&self) -> &[Extension] {
        match self {
            Extension::Other { extension, .. } => extension,
            _ => &[],
        }
    }

    /// User-facing text that needs a translation in every additional language
    pub fn translatable_text(&self) -> Option<&str> {
        let text = match self {
            Extension::ValidationText(s) | Extension::EntryFormat(s) => Some(s.as_str()),
            Extension::Unit(c) => c.display.as_deref(),
            _ => None,
        };
        text.filter(|t| !t.trim().is_empty())
    }

    /// Whether the extension lacks the value that gives it meaning
    ///
    /// A unit or item-control extension without a code, or an unknown
    /// extension with neither a value nor nested extensions, is incomplete.
    pub fn missing_companion(&self) -> bool {
        match self {
            Extension::Unit(c) => !c.has_code(),
            Extension::ItemControl(cc) => !cc.coding.iter().any(Coding::has_code),
            Extension::Regex(s) => s.trim().is_empty(),
            Extension::Other {
                value, extension, ..
            } => match value {
                Some(TypedValue::Coding(c)) => !c.has_code(),
                Some(_) => false,
                None => extension.is_empty(),
            },
            _ => false,
        }
    }
}

/// Extensions of one item, keyed by URL, in insertion order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtensionSet {
    entries: IndexMap<String, Extension>,
}

impl ExtensionSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, url: &str) -> Option<&Extension> {
        self.entries.get(url)
    }

    /// Insert or replace by URL; a replaced entry keeps its position
    pub fn set(&mut self, extension: Extension) -> Option<Extension> {
        self.entries.insert(extension.url().to_string(), extension)
    }

    /// Remove by URL, preserving the order of the remaining entries
    pub fn remove(&mut self, url: &str) -> Option<Extension> {
        self.entries.shift_remove(url)
    }

    pub fn contains(&self, url: &str) -> bool {
        self.entries.contains_key(url)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Extension> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<Extension> for ExtensionSet {
    fn from_iter<T: IntoIterator<Item = Extension>>(iter: T) -> Self {
        let mut set = ExtensionSet::new();
        for extension in iter {
            set.set(extension);
        }
        set
    }
}

/// Look up an item's extension by URL
pub fn get<'a>(item: &'a Item, url: &str) -> Option<&'a Extension> {
    item.extensions.get(url)
}

/// Return a copy of `item` with `extension` set (replace by URL, append if new)
///
/// The caller commits the returned item through the dispatcher.
pub fn set(item: &Item, extension: Extension) -> Item {
    let mut next = item.clone();
    next.extensions.set(extension);
    next
}

/// Return a copy of `item` without the extension at `url`
///
/// Removing a URL that is not present returns an identical item.
pub fn remove(item: &Item, url: &str) -> Item {
    let mut next = item.clone();
    next.extensions.remove(url);
    next
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::item::ItemType;

    fn item() -> Item {
        Item::new("q1", ItemType::Quantity)
    }

    #[test]
    fn test_from_parts_typed_variants() {
        let unit = Extension::from_parts(
            UNIT_URL,
            Some(TypedValue::Coding(Coding::from_code("mg"))),
            vec![],
        );
        assert!(matches!(unit, Extension::Unit(_)));

        let min = Extension::from_parts(MIN_LENGTH_URL, Some(TypedValue::Integer(3)), vec![]);
        assert_eq!(min, Extension::MinLength(3));
    }

    #[test]
    fn test_from_parts_kind_mismatch_falls_back() {
        let ext = Extension::from_parts(
            MIN_LENGTH_URL,
            Some(TypedValue::String("three".into())),
            vec![],
        );
        assert!(matches!(ext, Extension::Other { .. }));
        assert_eq!(ext.url(), MIN_LENGTH_URL);
    }

    #[test]
    fn test_set_replaces_in_place() {
        let mut set = ExtensionSet::new();
        set.set(Extension::Regex("^a$".into()));
        set.set(Extension::MinLength(2));
        set.set(Extension::Regex("^b$".into()));

        let urls: Vec<&str> = set.iter().map(Extension::url).collect();
        assert_eq!(urls, vec![REGEX_URL, MIN_LENGTH_URL]);
        assert_eq!(set.get(REGEX_URL), Some(&Extension::Regex("^b$".into())));
    }

    #[test]
    fn test_registry_set_and_remove_round_trip() {
        let original = item();
        let with_unit = set(&original, Extension::Unit(Coding::from_code("mg")));
        assert!(get(&with_unit, UNIT_URL).is_some());
        assert!(get(&original, UNIT_URL).is_none());

        let back = remove(&with_unit, UNIT_URL);
        assert_eq!(back, original);
    }

    #[test]
    fn test_remove_absent_is_noop() {
        let original = item();
        assert_eq!(remove(&original, REGEX_URL), original);
    }

    #[test]
    fn test_missing_companion() {
        assert!(Extension::Unit(Coding::default()).missing_companion());
        assert!(!Extension::Unit(Coding::from_code("kg")).missing_companion());
        assert!(
            Extension::Other {
                url: "urn:x".into(),
                value: None,
                extension: vec![]
            }
            .missing_companion()
        );
        assert!(!Extension::MinLength(1).missing_companion());
    }

    #[test]
    fn test_translatable_text() {
        assert_eq!(
            Extension::ValidationText("Must be a number".into()).translatable_text(),
            Some("Must be a number")
        );
        assert_eq!(Extension::Regex("^x$".into()).translatable_text(), None);
        let unit = Extension::Unit(Coding::new("http://unitsofmeasure.org", "kg", "kilogram"));
        assert_eq!(unit.translatable_text(), Some("kilogram"));
    }
}

//! Additional-language overlay
//!
//! A sparse per-language map layered over base-language content. A missing
//! entry means "fall back to the base language", never "empty string".

use super::metadata::MetadataField;
use std::collections::BTreeMap;
use std::fmt;

/// Which string of an item a translation replaces
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TranslatableProperty {
    Text,
    Prefix,
    /// Display of the coding with this client-local id
    CodeDisplay(String),
    /// User-facing text of the extension at this URL
    ExtensionText(String),
    /// Display of the answer option at this position
    AnswerOption(usize),
}

impl fmt::Display for TranslatableProperty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TranslatableProperty::Text => f.write_str("text"),
            TranslatableProperty::Prefix => f.write_str("prefix"),
            TranslatableProperty::CodeDisplay(id) => write!(f, "code[{id}].display"),
            TranslatableProperty::ExtensionText(url) => write!(f, "extension[{url}]"),
            TranslatableProperty::AnswerOption(i) => write!(f, "answerOption[{i}]"),
        }
    }
}

/// Translations for one additional language
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Translation {
    metadata: BTreeMap<MetadataField, String>,
    items: BTreeMap<String, BTreeMap<TranslatableProperty, String>>,
}

impl Translation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, link_id: &str, property: &TranslatableProperty) -> Option<&str> {
        self.items
            .get(link_id)
            .and_then(|props| props.get(property))
            .map(String::as_str)
    }

    /// Set or clear one item translation; empty strings clear
    pub fn set(&mut self, link_id: &str, property: TranslatableProperty, value: Option<String>) {
        match value.filter(|v| !v.is_empty()) {
            Some(value) => {
                self.items
                    .entry(link_id.to_string())
                    .or_default()
                    .insert(property, value);
            }
            None => {
                if let Some(props) = self.items.get_mut(link_id) {
                    props.remove(&property);
                    if props.is_empty() {
                        self.items.remove(link_id);
                    }
                }
            }
        }
    }

    /// All translations of one item
    pub fn item(&self, link_id: &str) -> Option<&BTreeMap<TranslatableProperty, String>> {
        self.items.get(link_id)
    }

    /// Drop every translation of one item
    pub fn remove_item(&mut self, link_id: &str) {
        self.items.remove(link_id);
    }

    /// Copy the translations of `from` onto `to` (used when duplicating)
    pub fn copy_item(&mut self, from: &str, to: &str) {
        if let Some(props) = self.items.get(from).cloned() {
            self.items.insert(to.to_string(), props);
        }
    }

    /// Link ids that have at least one translation
    pub fn link_ids(&self) -> impl Iterator<Item = &str> {
        self.items.keys().map(String::as_str)
    }

    pub fn metadata(&self, field: MetadataField) -> Option<&str> {
        self.metadata.get(&field).map(String::as_str)
    }

    pub fn set_metadata(&mut self, field: MetadataField, value: Option<String>) {
        match value.filter(|v| !v.is_empty()) {
            Some(value) => {
                self.metadata.insert(field, value);
            }
            None => {
                self.metadata.remove(&field);
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.metadata.is_empty() && self.items.is_empty()
    }
}

//! The closed set of edits the dispatcher accepts

use crate::model::{
    AnswerOption, Coding, EnableBehavior, EnableWhen, Extension, ItemType, MetadataField, Parent,
    TranslatableProperty, Tree,
};
use std::fmt;

/// Primitive item property addressed by [`Action::UpdateItemProperty`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ItemProperty {
    Text,
    Prefix,
    Definition,
    Required,
    Repeats,
    ReadOnly,
    MaxLength,
    Type,
}

impl fmt::Display for ItemProperty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ItemProperty::Text => "text",
            ItemProperty::Prefix => "prefix",
            ItemProperty::Definition => "definition",
            ItemProperty::Required => "required",
            ItemProperty::Repeats => "repeats",
            ItemProperty::ReadOnly => "readOnly",
            ItemProperty::MaxLength => "maxLength",
            ItemProperty::Type => "type",
        };
        f.write_str(name)
    }
}

/// New value for an item property
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    Text(String),
    Flag(bool),
    Number(u32),
    Type(ItemType),
    /// Remove the property
    Unset,
}

/// Field of one coding addressed by [`Action::UpdateItemCodeProperty`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CodingProperty {
    System,
    Code,
    Display,
    Version,
}

/// A single edit
///
/// Every variant carries exactly the data it needs. Index-bearing structural
/// actions clamp out-of-range indices; element-addressing actions
/// (`UpdateItemCodeProperty`, `DeleteItemCode`, ...) reject them.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    // structural
    AddItem {
        parent: Parent,
        index: usize,
    },
    DeleteItem {
        link_id: String,
    },
    MoveItem {
        link_id: String,
        new_parent: Parent,
        new_index: usize,
    },
    DuplicateItem {
        link_id: String,
    },

    // primitive properties
    UpdateItemProperty {
        link_id: String,
        property: ItemProperty,
        value: PropertyValue,
    },

    // code list
    /// Replace the code list; missing or repeated coding ids are reissued
    SetItemCodes {
        link_id: String,
        codes: Vec<Coding>,
    },
    UpdateItemCodeProperty {
        link_id: String,
        index: usize,
        property: CodingProperty,
        value: String,
    },
    DeleteItemCode {
        link_id: String,
        index: usize,
    },

    // extensions
    SetItemExtension {
        link_id: String,
        extension: Extension,
    },
    RemoveItemExtension {
        link_id: String,
        url: String,
    },

    // conditional display
    SetEnableWhen {
        link_id: String,
        conditions: Vec<EnableWhen>,
    },
    AddEnableWhen {
        link_id: String,
        condition: EnableWhen,
    },
    UpdateEnableWhen {
        link_id: String,
        index: usize,
        condition: EnableWhen,
    },
    DeleteEnableWhen {
        link_id: String,
        index: usize,
    },
    SetEnableBehavior {
        link_id: String,
        behavior: Option<EnableBehavior>,
    },

    // answers
    SetAnswerOptions {
        link_id: String,
        options: Vec<AnswerOption>,
    },

    // document
    SetMetadata {
        field: MetadataField,
        value: Option<String>,
    },
    AddLanguage {
        language: String,
    },
    RemoveLanguage {
        language: String,
    },
    UpdateTranslation {
        language: String,
        link_id: String,
        property: TranslatableProperty,
        value: Option<String>,
    },
    UpdateMetadataTranslation {
        language: String,
        field: MetadataField,
        value: Option<String>,
    },
    ReplaceDocument {
        tree: Box<Tree>,
    },
    /// Checkpoint for the host boundary; no structural effect
    Save,
}

impl Action {
    /// Short name for logs
    pub fn name(&self) -> &'static str {
        match self {
            Action::AddItem { .. } => "AddItem",
            Action::DeleteItem { .. } => "DeleteItem",
            Action::MoveItem { .. } => "MoveItem",
            Action::DuplicateItem { .. } => "DuplicateItem",
            Action::UpdateItemProperty { .. } => "UpdateItemProperty",
            Action::SetItemCodes { .. } => "SetItemCodes",
            Action::UpdateItemCodeProperty { .. } => "UpdateItemCodeProperty",
            Action::DeleteItemCode { .. } => "DeleteItemCode",
            Action::SetItemExtension { .. } => "SetItemExtension",
            Action::RemoveItemExtension { .. } => "RemoveItemExtension",
            Action::SetEnableWhen { .. } => "SetEnableWhen",
            Action::AddEnableWhen { .. } => "AddEnableWhen",
            Action::UpdateEnableWhen { .. } => "UpdateEnableWhen",
            Action::DeleteEnableWhen { .. } => "DeleteEnableWhen",
            Action::SetEnableBehavior { .. } => "SetEnableBehavior",
            Action::SetAnswerOptions { .. } => "SetAnswerOptions",
            Action::SetMetadata { .. } => "SetMetadata",
            Action::AddLanguage { .. } => "AddLanguage",
            Action::RemoveLanguage { .. } => "RemoveLanguage",
            Action::UpdateTranslation { .. } => "UpdateTranslation",
            Action::UpdateMetadataTranslation { .. } => "UpdateMetadataTranslation",
            Action::ReplaceDocument { .. } => "ReplaceDocument",
            Action::Save => "Save",
        }
    }

    /// Convenience constructor for the common text edit
    pub fn set_text(link_id: impl Into<String>, text: impl Into<String>) -> Self {
        Action::UpdateItemProperty {
            link_id: link_id.into(),
            property: ItemProperty::Text,
            value: PropertyValue::Text(text.into()),
        }
    }
}

//! Questionnaire items

use super::extension::ExtensionSet;
use super::translation::TranslatableProperty;
use super::value::{Coding, TypedValue};
use std::fmt;
use std::str::FromStr;

/// Item type (FHIR `Questionnaire.item.type`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ItemType {
    Group,
    Display,
    Boolean,
    Decimal,
    Integer,
    Date,
    DateTime,
    Time,
    String,
    Text,
    Url,
    Choice,
    OpenChoice,
    Attachment,
    Reference,
    Quantity,
}

impl ItemType {
    pub const ALL: [ItemType; 16] = [
        ItemType::Group,
        ItemType::Display,
        ItemType::Boolean,
        ItemType::Decimal,
        ItemType::Integer,
        ItemType::Date,
        ItemType::DateTime,
        ItemType::Time,
        ItemType::String,
        ItemType::Text,
        ItemType::Url,
        ItemType::Choice,
        ItemType::OpenChoice,
        ItemType::Attachment,
        ItemType::Reference,
        ItemType::Quantity,
    ];

    /// FHIR code for this type
    pub fn code(self) -> &'static str {
        match self {
            ItemType::Group => "group",
            ItemType::Display => "display",
            ItemType::Boolean => "boolean",
            ItemType::Decimal => "decimal",
            ItemType::Integer => "integer",
            ItemType::Date => "date",
            ItemType::DateTime => "dateTime",
            ItemType::Time => "time",
            ItemType::String => "string",
            ItemType::Text => "text",
            ItemType::Url => "url",
            ItemType::Choice => "choice",
            ItemType::OpenChoice => "open-choice",
            ItemType::Attachment => "attachment",
            ItemType::Reference => "reference",
            ItemType::Quantity => "quantity",
        }
    }

    /// Display items are leaves; every other type may nest children
    pub fn can_have_children(self) -> bool {
        self != ItemType::Display
    }

    /// Whether answers of this type are limited by `maxLength`
    pub fn supports_max_length(self) -> bool {
        matches!(
            self,
            ItemType::String
                | ItemType::Text
                | ItemType::Url
                | ItemType::OpenChoice
                | ItemType::Decimal
                | ItemType::Integer
        )
    }

    /// Whether the item offers answer options
    pub fn has_answer_options(self) -> bool {
        matches!(self, ItemType::Choice | ItemType::OpenChoice)
    }
}

impl fmt::Display for ItemType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for ItemType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ItemType::ALL
            .into_iter()
            .find(|t| t.code() == s)
            .ok_or_else(|| format!("unknown item type '{s}'"))
    }
}

/// Comparison applied by an `enableWhen` condition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EnableWhenOperator {
    Exists,
    Equal,
    NotEqual,
    Greater,
    Less,
    GreaterOrEqual,
    LessOrEqual,
}

impl EnableWhenOperator {
    pub const ALL: [EnableWhenOperator; 7] = [
        EnableWhenOperator::Exists,
        EnableWhenOperator::Equal,
        EnableWhenOperator::NotEqual,
        EnableWhenOperator::Greater,
        EnableWhenOperator::Less,
        EnableWhenOperator::GreaterOrEqual,
        EnableWhenOperator::LessOrEqual,
    ];

    pub fn code(self) -> &'static str {
        match self {
            EnableWhenOperator::Exists => "exists",
            EnableWhenOperator::Equal => "=",
            EnableWhenOperator::NotEqual => "!=",
            EnableWhenOperator::Greater => ">",
            EnableWhenOperator::Less => "<",
            EnableWhenOperator::GreaterOrEqual => ">=",
            EnableWhenOperator::LessOrEqual => "<=",
        }
    }
}

impl FromStr for EnableWhenOperator {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EnableWhenOperator::ALL
            .into_iter()
            .find(|op| op.code() == s)
            .ok_or_else(|| format!("unknown enableWhen operator '{s}'"))
    }
}

/// How multiple `enableWhen` conditions combine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EnableBehavior {
    All,
    Any,
}

impl EnableBehavior {
    pub fn code(self) -> &'static str {
        match self {
            EnableBehavior::All => "all",
            EnableBehavior::Any => "any",
        }
    }
}

impl FromStr for EnableBehavior {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "all" => Ok(EnableBehavior::All),
            "any" => Ok(EnableBehavior::Any),
            other => Err(format!("unknown enableBehavior '{other}'")),
        }
    }
}

/// Conditional-display rule
///
/// `question` is a weak reference: it is not checked when written, only by
/// the validation engine.
#[derive(Debug, Clone, PartialEq)]
pub struct EnableWhen {
    pub question: String,
    pub operator: EnableWhenOperator,
    pub answer: TypedValue,
}

impl EnableWhen {
    pub fn new(question: impl Into<String>, operator: EnableWhenOperator, answer: TypedValue) -> Self {
        Self {
            question: question.into(),
            operator,
            answer,
        }
    }
}

/// One permitted answer of a choice item
#[derive(Debug, Clone, PartialEq)]
pub struct AnswerOption {
    pub value: TypedValue,
    pub initial_selected: Option<bool>,
}

impl AnswerOption {
    pub fn new(value: TypedValue) -> Self {
        Self {
            value,
            initial_selected: None,
        }
    }
}

/// One question, group or display node
#[derive(Debug, Clone, PartialEq)]
pub struct Item {
    pub link_id: String,
    pub item_type: ItemType,
    pub text: Option<String>,
    pub prefix: Option<String>,
    pub definition: Option<String>,
    pub required: Option<bool>,
    pub repeats: Option<bool>,
    pub read_only: Option<bool>,
    pub max_length: Option<u32>,
    pub code: Vec<Coding>,
    pub extensions: ExtensionSet,
    pub enable_when: Vec<EnableWhen>,
    pub enable_behavior: Option<EnableBehavior>,
    pub answer_options: Vec<AnswerOption>,
}

impl Item {
    /// Create an empty item
    pub fn new(link_id: impl Into<String>, item_type: ItemType) -> Self {
        Self {
            link_id: link_id.into(),
            item_type,
            text: None,
            prefix: None,
            definition: None,
            required: None,
            repeats: None,
            read_only: None,
            max_length: None,
            code: Vec::new(),
            extensions: ExtensionSet::new(),
            enable_when: Vec::new(),
            enable_behavior: None,
            answer_options: Vec::new(),
        }
    }

    /// Builder helper used heavily by tests and the importer
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = super::value::non_empty(text.into());
        self
    }

    /// Base-language strings that should exist in every additional language
    pub fn translatable_properties(&self) -> Vec<(TranslatableProperty, &str)> {
        let mut out = Vec::new();
        if let Some(text) = self.text.as_deref().filter(|t| !t.trim().is_empty()) {
            out.push((TranslatableProperty::Text, text));
        }
        if let Some(prefix) = self.prefix.as_deref().filter(|t| !t.trim().is_empty()) {
            out.push((TranslatableProperty::Prefix, prefix));
        }
        for coding in &self.code {
            if let (Some(id), Some(display)) = (
                coding.id.as_deref(),
                coding.display.as_deref().filter(|t| !t.trim().is_empty()),
            ) {
                out.push((TranslatableProperty::CodeDisplay(id.to_string()), display));
            }
        }
        for extension in self.extensions.iter() {
            if let Some(text) = extension.translatable_text() {
                out.push((
                    TranslatableProperty::ExtensionText(extension.url().to_string()),
                    text,
                ));
            }
        }
        for (index, option) in self.answer_options.iter().enumerate() {
            if let Some(text) = option.value.display_text() {
                out.push((TranslatableProperty::AnswerOption(index), text));
            }
        }
        out
    }
}

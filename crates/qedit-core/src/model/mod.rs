//! In-memory questionnaire model
//!
//! - `tree` - the forest of items plus metadata and the translation overlay
//! - `item` - one question/group/display node
//! - `extension` - URL-keyed extension registry
//! - `value` - codings and typed `[x]` values
//! - `translation` - additional-language overlay
//! - `metadata` - document-level fields
//! - `ids` - identifier generation

pub mod extension;
pub mod ids;
pub mod item;
pub mod metadata;
pub mod translation;
pub mod tree;
pub mod value;

pub use extension::{Extension, ExtensionSet};
pub use ids::{IdGenerator, SequentialIds, UuidGenerator};
pub use item::{AnswerOption, EnableBehavior, EnableWhen, EnableWhenOperator, Item, ItemType};
pub use metadata::{Metadata, MetadataField};
pub use translation::{TranslatableProperty, Translation};
pub use tree::{Descendants, InvariantViolation, Parent, Tree};
pub use value::{CodeableConcept, Coding, Quantity, TypedValue, ValueKind};

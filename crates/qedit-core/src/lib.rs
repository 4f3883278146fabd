//! qedit core
//!
//! Document tree engine for FHIR Questionnaire editors. This crate provides
//! the in-memory questionnaire model, the action dispatcher that is its only
//! mutation path, the validation engine, the Questionnaire generator and
//! importer, and the host messaging session.

pub mod config;
pub mod dispatch;
pub mod error;
pub mod export;
pub mod messaging;
pub mod model;
pub mod result;
pub mod validation;

// Re-export commonly used types
pub use config::{ConfigLoader, EditorConfig, ValidationConfig};
pub use dispatch::{
    Action, CodingProperty, Dispatcher, ItemProperty, Outcome, PropertyValue, Rejection,
    Transition, reduce,
};
pub use error::{ErrorKind, QeditError};
pub use export::{generate, generate_json, generate_value, import_questionnaire, import_value};
pub use messaging::{EditorMessage, EditorSession, HostMessage, ReadyType};
pub use model::{
    AnswerOption, Coding, EnableBehavior, EnableWhen, EnableWhenOperator, Extension,
    IdGenerator, Item, ItemType, Metadata, MetadataField, Parent, SequentialIds,
    TranslatableProperty, Translation, Tree, TypedValue, UuidGenerator,
};
pub use result::{Result, ResultExt};
pub use validation::{ErrorCode, ErrorProperty, ValidationError, ValidationReport, validate};

/// Initialize the tracing subscriber for logging
///
/// Logs go to stderr so stdout stays free for documents and host messages.
pub fn init_tracing() {
    use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("qedit=info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_thread_ids(false)
                .with_file(true)
                .with_line_number(true),
        )
        .init();
}

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");

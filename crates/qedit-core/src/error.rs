//! Error types for questionnaire document operations

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for qedit operations
///
/// Editing itself never fails: dispatcher rejections are reported as
/// [`crate::dispatch::Rejection`] values and validation problems as
/// [`crate::validation::ValidationError`] lists. This type covers the
/// boundaries where real failures happen (import, config, I/O, messaging).
#[derive(Debug, Error)]
pub enum QeditError {
    /// Input document could not be read into a tree
    #[error("Import error: {message}")]
    ImportError { message: String },

    /// Configuration loading or validation errors
    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    /// File system I/O errors
    #[error("IO error for path '{path}': {source}")]
    IoError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// JSON (de)serialization errors
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Malformed or unexpected host message
    #[error("Message error: {message}")]
    MessageError { message: String },

    /// Generic internal errors
    #[error("Internal error: {message}")]
    InternalError { message: String },
}

/// Error kind enumeration for categorizing errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    Import,
    Config,
    Io,
    Json,
    Message,
    Internal,
}

impl QeditError {
    /// Get the error kind for this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            QeditError::ImportError { .. } => ErrorKind::Import,
            QeditError::ConfigError { .. } => ErrorKind::Config,
            QeditError::IoError { .. } => ErrorKind::Io,
            QeditError::JsonError(_) => ErrorKind::Json,
            QeditError::MessageError { .. } => ErrorKind::Message,
            QeditError::InternalError { .. } => ErrorKind::Internal,
        }
    }

    /// Check if this error is recoverable (the editing session can go on)
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::Import | ErrorKind::Json | ErrorKind::Message
        )
    }

    /// Create an import error
    pub fn import_error(message: impl Into<String>) -> Self {
        Self::ImportError {
            message: message.into(),
        }
    }

    /// Create a configuration error
    pub fn config_error(message: impl Into<String>) -> Self {
        Self::ConfigError {
            message: message.into(),
        }
    }

    /// Create an IO error with path context
    pub fn io_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::IoError {
            path: path.into(),
            source,
        }
    }

    /// Create a message error
    pub fn message_error(message: impl Into<String>) -> Self {
        Self::MessageError {
            message: message.into(),
        }
    }

    /// Create an internal error
    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::InternalError {
            message: message.into(),
        }
    }
}

/// Convert from std::io::Error
impl From<std::io::Error> for QeditError {
    fn from(err: std::io::Error) -> Self {
        Self::IoError {
            path: PathBuf::new(),
            source: err,
        }
    }
}

//! Errors from terminology services

use qedit_core::config::BIOPORTAL_API_KEY_ENV;
use thiserror::Error;

/// Result type returned by terminology clients.
pub type LookupResult<T> = Result<T, LookupError>;

/// Failures talking to a terminology service
///
/// These never reach the editing core: [`crate::TerminologyLookup::lookup`]
/// logs them and yields an empty suggestion list.
#[derive(Debug, Error)]
pub enum LookupError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("service returned status {status} for {url}")]
    Status { status: u16, url: String },

    #[error("unexpected response: {0}")]
    Decode(String),

    #[error("no Bioportal API key configured (set {BIOPORTAL_API_KEY_ENV})")]
    MissingApiKey,
}

impl LookupError {
    pub(crate) fn decode(message: impl Into<String>) -> Self {
        Self::Decode(message.into())
    }
}

//! Crate-wide `Result` and the skip-on-bad-document helper

use crate::error::QeditError;

pub type Result<T> = std::result::Result<T, QeditError>;

pub trait ResultExt<T> {
    /// Turn a per-document failure (bad import, unparsable JSON, malformed
    /// message) into `Ok(None)` after logging it; configuration, I/O and
    /// internal errors still propagate
    fn recoverable(self) -> Result<Option<T>>;
}

impl<T> ResultExt<T> for Result<T> {
    fn recoverable(self) -> Result<Option<T>> {
        match self {
            Ok(value) => Ok(Some(value)),
            Err(err) if err.is_recoverable() => {
                tracing::warn!(kind = ?err.kind(), "Skipping document: {}", err);
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recoverable_passes_through_fatal() {
        let fatal: Result<u8> = Err(QeditError::config_error("no"));
        assert!(fatal.recoverable().is_err());

        let soft: Result<u8> = Err(QeditError::import_error("no"));
        assert!(matches!(soft.recoverable(), Ok(None)));
    }
}

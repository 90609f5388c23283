//! Reporter-specific error types

use shared::SharedError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReporterError {
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Report store operation failed: {0}")]
    Store(#[from] std::io::Error),

    #[error("Shared component error")]
    Shared(#[from] SharedError),
}

impl ReporterError {
    /// Convenience constructor for configuration failures
    pub fn config(message: impl Into<String>) -> Self {
        ReporterError::Configuration {
            message: message.into(),
        }
    }
}

pub type ReporterResult<T> = Result<T, ReporterError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn configuration_error_display() {
        let err = ReporterError::config("missing backend API key");
        assert_eq!(
            err.to_string(),
            "Configuration error: missing backend API key"
        );
    }

    #[test]
    fn io_error_converts_to_store() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err: ReporterError = io.into();
        assert!(matches!(err, ReporterError::Store(_)));
    }
}

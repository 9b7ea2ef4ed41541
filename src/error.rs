use std::fmt;
use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("io: {0}")]
    Io(#[from] io::Error),
    #[error("settings json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("settings toml: {0}")]
    Toml(#[from] toml::de::Error),
    #[error(transparent)]
    Config(#[from] ConfigError),
}

pub type AppResult<T> = Result<T, AppError>;

/// Programmer errors caught when a controller is built.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("debounce delay must be >= 0 ms, got {0}")]
    NegativeDelay(i64),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Network,
    /// Non-2xx style response from a remote source.
    Status(u16),
    Validation,
    Timeout,
    /// The operation panicked instead of answering.
    Panicked,
    Other,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::Network => f.write_str("network error"),
            ErrorKind::Status(code) => write!(f, "status {code}"),
            ErrorKind::Validation => f.write_str("validation failed"),
            ErrorKind::Timeout => f.write_str("timed out"),
            ErrorKind::Panicked => f.write_str("operation panicked"),
            ErrorKind::Other => f.write_str("operation failed"),
        }
    }
}

/// Failure reported by a pluggable operation. Always lands in the store as
/// `Failure`, never propagates out of the controller.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}: {message}")]
pub struct OperationError {
    pub kind: ErrorKind,
    pub message: String,
}

impl OperationError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Network, message)
    }

    pub fn status(code: u16, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Status(code), message)
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation, message)
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Timeout, message)
    }

    pub fn panicked(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Panicked, message)
    }

    pub fn other(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Other, message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn operation_error_display_includes_kind() {
        let err = OperationError::status(404, "no such user");
        assert_eq!(err.to_string(), "status 404: no such user");

        let err = OperationError::validation("Please enter a valid email");
        assert_eq!(
            err.to_string(),
            "validation failed: Please enter a valid email"
        );
    }

    #[test]
    fn config_error_converts_into_app_error() {
        let err: AppError = ConfigError::NegativeDelay(-5).into();
        assert!(matches!(err, AppError::Config(ConfigError::NegativeDelay(-5))));
        assert_eq!(err.to_string(), "debounce delay must be >= 0 ms, got -5");
    }
}

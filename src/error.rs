//! This module defines all error types used throughout the application.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Main error type for the application
#[derive(Error, Debug)]
pub enum Error {
    /// IO errors (file not found, permission denied, etc.)
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// The provider rejected the address as malformed or unknown (HTTP 400)
    #[error("Invalid wallet address: {0}")]
    InvalidAddress(String),

    /// The provider rejected the API key (HTTP 401)
    #[error("Provider rejected the API key")]
    InvalidCredential,

    /// Any other provider or transport failure, with the raw diagnostic
    #[error("Provider error{}: {message}", .status.map(|s| format!(" (HTTP {})", s)).unwrap_or_default())]
    Provider {
        status: Option<u16>,
        message: String,
    },

    /// Provider body did not match the expected shape
    #[error("Malformed provider response: {0}")]
    MalformedResponse(String),

    /// Destination heuristic ran on a transaction without usable outputs
    #[error("Transaction {0} has no outputs with an address")]
    NoOutputs(String),

    /// Local JSON/TOML parsing errors (exports, fixtures)
    #[error("Parser error: {0}")]
    Parser(String),

    /// Configuration file parsing errors
    #[error("Configuration parse error in {file:?}: {message}")]
    ConfigParse { file: PathBuf, message: String },

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Missing configuration
    #[error("Missing configuration: {0}")]
    MissingConfig(String),

    /// Traversal exceeded the configured deadline
    #[error("Traversal timed out after {0}s")]
    Timeout(u64),

    /// Generic error with custom message
    #[error("{0}")]
    Custom(String),

    /// Wrapped anyhow errors
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create a custom error with a message
    pub fn custom(msg: impl Into<String>) -> Self {
        Self::Custom(msg.into())
    }

    /// Create a provider error carrying an HTTP status
    pub fn provider(status: Option<u16>, msg: impl Into<String>) -> Self {
        Self::Provider {
            status,
            message: msg.into(),
        }
    }

    /// Create a malformed response error
    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::MalformedResponse(msg.into())
    }

    /// Create a parser error
    pub fn parser(msg: impl Into<String>) -> Self {
        Self::Parser(msg.into())
    }

    /// Errors the user can fix by changing the input, as opposed to provider outages
    pub fn is_user_input(&self) -> bool {
        matches!(
            self,
            Error::InvalidAddress(_) | Error::InvalidCredential | Error::MissingConfig(_)
        )
    }
}

// Implement From traits for common external error types

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Error::ConfigParse {
            file: PathBuf::from("unknown"),
            message: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Parser(format!("JSON error: {}", err))
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        let kind = if err.is_timeout() {
            "request timed out"
        } else if err.is_connect() {
            "connection failed"
        } else {
            "request failed"
        };
        Error::Provider {
            status: err.status().map(|s| s.as_u16()),
            message: format!("{}: {}", kind, err),
        }
    }
}

// Helper macros for creating errors

/// Create a custom error with formatting
#[macro_export]
macro_rules! custom_error {
    ($($arg:tt)*) => {
        $crate::error::Error::Custom(format!($($arg)*))
    };
}

/// Bail with a custom error message
#[macro_export]
macro_rules! bail {
    ($($arg:tt)*) => {
        return Err($crate::custom_error!($($arg)*))
    };
}

/// Ensure a condition is true or return error
#[macro_export]
macro_rules! ensure {
    ($cond:expr, $($arg:tt)*) => {
        if !($cond) {
            $crate::bail!($($arg)*);
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = Error::custom("test error");
        assert_eq!(err.to_string(), "test error");

        let err = Error::provider(Some(503), "Service Unavailable");
        assert_eq!(
            err.to_string(),
            "Provider error (HTTP 503): Service Unavailable"
        );

        let err = Error::provider(None, "connection failed");
        assert_eq!(err.to_string(), "Provider error: connection failed");
    }

    #[test]
    fn test_user_input_errors() {
        assert!(Error::InvalidCredential.is_user_input());
        assert!(Error::InvalidAddress("bc1q".into()).is_user_input());
        assert!(!Error::NoOutputs("tx".into()).is_user_input());
        assert!(!Error::provider(Some(500), "boom").is_user_input());
    }

    #[test]
    fn test_ensure_macro() {
        fn check(depth: u32) -> Result<()> {
            crate::ensure!(depth > 0, "depth must be at least 1, got {}", depth);
            Ok(())
        }

        assert!(check(1).is_ok());
        assert_eq!(
            check(0).unwrap_err().to_string(),
            "depth must be at least 1, got 0"
        );
    }
}

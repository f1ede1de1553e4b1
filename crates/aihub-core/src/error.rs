//! Error types for the AI Hub core library
//!
//! The terminal failure of an API call is always a [`ClassifiedError`]; this
//! module wraps it together with the few failures that happen outside the
//! request pipeline (configuration, input validation, cancellation).

use thiserror::Error;

use crate::http::error::{ClassifiedError, ErrorKind};

/// Main error type for AI Hub operations
#[derive(Error, Debug)]
pub enum Error {
    /// A call reached the API (or tried to) and failed with a classified error
    #[error(transparent)]
    Api(#[from] ClassifiedError),

    /// Client configuration is unusable (missing key, bad base URL, ...)
    #[error("Configuration error: {message}")]
    Configuration {
        message: String,
        field: Option<String>,
        #[source]
        source: Option<anyhow::Error>,
    },

    /// Caller-supplied input rejected before any request was sent
    #[error("Validation error: {field} - {message}")]
    Validation {
        field: String,
        message: String,
        expected: Option<String>,
    },

    /// JSON parsing and serialization errors
    #[error("JSON error: {message}")]
    Json {
        message: String,
        #[source]
        source: serde_json::Error,
    },

    /// IO errors
    #[error("IO error: {message}")]
    Io {
        message: String,
        #[source]
        source: std::io::Error,
    },

    /// The caller cancelled the call through its cancellation token
    #[error("Request cancelled by caller")]
    Cancelled,
}

/// Convenience type alias for Results using our Error type
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create a configuration error for a named field
    pub fn configuration(field: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Configuration {
            message: message.into(),
            field: Some(field.into()),
            source: None,
        }
    }

    /// Create a validation error for a named field
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Validation {
            field: field.into(),
            message: message.into(),
            expected: None,
        }
    }

    /// The taxonomy kind, when this is an API failure
    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            Error::Api(err) => Some(err.kind),
            _ => None,
        }
    }

    /// Borrow the classified API error, if any
    pub fn as_api(&self) -> Option<&ClassifiedError> {
        match self {
            Error::Api(err) => Some(err),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Json {
            message: err.to_string(),
            source: err,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io {
            message: err.to_string(),
            source: err,
        }
    }
}

//! Error types and handling for the CLI
//!
//! This module provides error types and utilities for handling
//! various failure modes in the CLI application.

use aihub_core::ErrorKind;
use std::io;
use std::path::PathBuf;

/// Result type alias for CLI operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for CLI operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// IO error (file operations, etc.)
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Error from aihub-core
    #[error("{0}")]
    Core(#[from] aihub_core::Error),

    /// File not found
    #[error("File not found: {}", path.display())]
    FileNotFound { path: PathBuf },

    /// Invalid file format
    #[error("Invalid file format for {}: expected {} format", path.display(), expected)]
    InvalidFormat { path: PathBuf, expected: String },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid argument value
    #[error("Invalid arguments: {0}")]
    InvalidArgs(String),

    /// API key missing
    #[error("API key required. Set OPENAI_API_KEY in the environment, a .env file, or the config file")]
    ApiKeyMissing,

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML serialization/deserialization error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Generic error with context
    #[error("{message}")]
    Other { message: String },
}

impl Error {
    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create an invalid arguments error
    pub fn invalid_args(message: impl Into<String>) -> Self {
        Self::InvalidArgs(message.into())
    }

    /// Create a generic error with message
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other {
            message: message.into(),
        }
    }

    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Io(_) => 1,
            Self::Core(core) => match core {
                aihub_core::Error::Configuration { .. } => 5,
                aihub_core::Error::Validation { .. } => 6,
                aihub_core::Error::Cancelled => 130,
                _ => 2,
            },
            Self::FileNotFound { .. } => 3,
            Self::InvalidFormat { .. } => 4,
            Self::Config(_) => 5,
            Self::InvalidArgs(_) => 6,
            Self::ApiKeyMissing => 9,
            Self::Json(_) => 12,
            Self::Yaml(_) => 13,
            Self::Other { .. } => 99,
        }
    }

    /// Check if this error should display usage help
    pub fn should_show_help(&self) -> bool {
        matches!(self, Self::InvalidArgs(_))
    }

    /// Suggestion shown under the error message
    pub fn hint(&self) -> Option<String> {
        let core = match self {
            Self::Core(core) => core,
            Self::ApiKeyMissing => return Some("Run 'aihub config paths' to see where configuration is read from.".to_string()),
            _ => return None,
        };

        match core {
            aihub_core::Error::Validation { field, expected, .. } => Some(match expected {
                Some(expected) => format!("Check the value of '{}' (expected {}).", field, expected),
                None => format!("Check the value of '{}'.", field),
            }),
            aihub_core::Error::Configuration { field: Some(field), .. } => {
                Some(format!("Check the '{}' setting.", field))
            }
            aihub_core::Error::Api(api) => kind_hint(api.kind).map(str::to_string),
            _ => None,
        }
    }
}

fn kind_hint(kind: ErrorKind) -> Option<&'static str> {
    match kind {
        ErrorKind::Authentication => Some("Check your OpenAI API key (OPENAI_API_KEY)."),
        ErrorKind::RateLimit => Some("You exceeded the request limit. Try again later."),
        ErrorKind::RetryExhausted => {
            Some("The API kept failing. Try again later or raise OPENAI_MAX_RETRIES.")
        }
        ErrorKind::Timeout => Some("The API did not answer in time. Consider raising OPENAI_TIMEOUT."),
        ErrorKind::ConnectionFailure => {
            Some("Check your network connection and OPENAI_BASE_URL.")
        }
        ErrorKind::NotFound => Some("Check the endpoint path and the model name."),
        ErrorKind::BadRequest => Some("Check the request parameters."),
        ErrorKind::ServerError | ErrorKind::GenericApi | ErrorKind::GenericClient => None,
    }
}

/// Format an error for display to the user
pub fn format_error(error: &Error, use_color: bool) -> String {
    use colored::Colorize;

    let mut text = if use_color {
        format!("{} {}", "Error:".red().bold(), error)
    } else {
        format!("Error: {}", error)
    };

    if let Some(hint) = error.hint() {
        if use_color {
            text.push_str(&format!("\n{} {}", "Hint:".yellow().bold(), hint.yellow()));
        } else {
            text.push_str(&format!("\nHint: {}", hint));
        }
    }

    text
}

//! Failure taxonomy and response classification
//!
//! Every failed call ends in exactly one [`ClassifiedError`]. HTTP error
//! responses are mapped by status code; transport failures (timeouts,
//! refused connections, ...) are mapped by failure type.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::http::status::reason_phrase;
use crate::http::transport::{TransportError, TransportResponse};

/// Longest raw-body excerpt kept in a message when the error body is not JSON
pub const BODY_EXCERPT_LIMIT: usize = 200;

/// Closed set of failure classifications
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    /// 401 / 403
    Authentication,
    /// 400
    BadRequest,
    /// 404
    NotFound,
    /// 429
    RateLimit,
    /// 5xx
    ServerError,
    /// The transport gave up waiting for the server
    Timeout,
    /// The transport could not reach the server
    ConnectionFailure,
    /// The retry budget was spent without a success
    RetryExhausted,
    /// Any HTTP error status without a dedicated kind
    GenericApi,
    /// Unexpected transport failure
    GenericClient,
}

impl ErrorKind {
    /// Map an HTTP error status to its kind. First match wins.
    pub fn from_status(status: u16) -> Self {
        match status {
            401 | 403 => ErrorKind::Authentication,
            400 => ErrorKind::BadRequest,
            404 => ErrorKind::NotFound,
            429 => ErrorKind::RateLimit,
            s if s >= 500 => ErrorKind::ServerError,
            _ => ErrorKind::GenericApi,
        }
    }

    /// Client-input errors are raised on the first attempt and never retried
    pub fn is_client_input(&self) -> bool {
        matches!(
            self,
            ErrorKind::Authentication | ErrorKind::BadRequest | ErrorKind::NotFound
        )
    }

    /// Transient errors that get the exponential backoff treatment
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            ErrorKind::RateLimit
                | ErrorKind::ServerError
                | ErrorKind::Timeout
                | ErrorKind::ConnectionFailure
                | ErrorKind::GenericClient
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Authentication => "authentication",
            ErrorKind::BadRequest => "bad_request",
            ErrorKind::NotFound => "not_found",
            ErrorKind::RateLimit => "rate_limit",
            ErrorKind::ServerError => "server_error",
            ErrorKind::Timeout => "timeout",
            ErrorKind::ConnectionFailure => "connection_failure",
            ErrorKind::RetryExhausted => "retry_exhausted",
            ErrorKind::GenericApi => "api_error",
            ErrorKind::GenericClient => "client_error",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Terminal, taxonomy-tagged failure of an API call
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{message}")]
pub struct ClassifiedError {
    pub kind: ErrorKind,
    pub message: String,
    pub status_code: Option<u16>,
    /// The `error` object of the API's JSON error envelope, or transport detail
    pub details: Option<Value>,
    /// For `RetryExhausted`, the last classified error of the attempt loop
    #[source]
    pub source: Option<Box<ClassifiedError>>,
}

impl ClassifiedError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            status_code: None,
            details: None,
            source: None,
        }
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status_code = Some(status);
        self
    }

    pub fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }

    /// Wrap the last failure of a spent retry budget
    pub fn retry_exhausted(last: ClassifiedError, max_retries: u32, url: &str) -> Self {
        Self {
            kind: ErrorKind::RetryExhausted,
            message: format!("Maximum retries ({}) exceeded for {}", max_retries, url),
            status_code: None,
            details: None,
            source: Some(Box::new(last)),
        }
    }

    /// The wrapped original failure, if this error wraps one
    pub fn original(&self) -> Option<&ClassifiedError> {
        self.source.as_deref()
    }

    /// The innermost error of the wrap chain
    pub fn root_cause(&self) -> &ClassifiedError {
        let mut current = self;
        while let Some(inner) = current.source.as_deref() {
            current = inner;
        }
        current
    }

    /// `message` from the API error envelope, when one was returned
    pub fn api_message(&self) -> Option<&str> {
        self.details
            .as_ref()
            .and_then(|d| d.get("message"))
            .and_then(Value::as_str)
    }
}

/// Classify a non-success HTTP response. Pure: same input, same output.
pub fn classify_response(response: &TransportResponse) -> ClassifiedError {
    let status = response.status;
    let reason = response
        .reason
        .as_deref()
        .or_else(|| reason_phrase(status))
        .unwrap_or("Unknown Error");

    let mut message = format!("{} - {}", status, reason);
    let mut details = None;

    match serde_json::from_str::<Value>(&response.body) {
        Ok(json) => {
            if let Some(error) = json.get("error") {
                let api_message = match error {
                    Value::String(s) => s.as_str(),
                    other => other.get("message").and_then(Value::as_str).unwrap_or("N/A"),
                };
                message.push_str(&format!(" | API details: {}", api_message));
                details = Some(error.clone());
            }
        }
        Err(_) => {
            message.push_str(&format!(" | Non-JSON response body: {}", excerpt(&response.body)));
        }
    }

    ClassifiedError {
        kind: ErrorKind::from_status(status),
        message,
        status_code: Some(status),
        details,
        source: None,
    }
}

/// Classify a failure that produced no HTTP response
pub fn classify_transport_error(error: &TransportError, url: &str) -> ClassifiedError {
    let (kind, message, detail) = match error {
        TransportError::Timeout(detail) => (
            ErrorKind::Timeout,
            format!("Timed out waiting for the API at {}", url),
            detail,
        ),
        TransportError::Connect(detail) => (
            ErrorKind::ConnectionFailure,
            format!("Connection error for {}", url),
            detail,
        ),
        TransportError::Other(detail) => (
            ErrorKind::GenericClient,
            format!("Unexpected request error for {}", url),
            detail,
        ),
    };

    ClassifiedError::new(kind, message).with_details(Value::String(detail.clone()))
}

fn excerpt(body: &str) -> String {
    match body.char_indices().nth(BODY_EXCERPT_LIMIT) {
        Some((cut, _)) => format!("{}...", &body[..cut]),
        None => body.to_string(),
    }
}

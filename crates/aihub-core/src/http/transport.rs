//! Transport seam between the request pipeline and the network
//!
//! The pipeline only ever talks to a [`Transport`]. Production code uses
//! [`ReqwestTransport`]; tests substitute a scripted implementation.

use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use reqwest::Client as ReqwestClient;
use serde_json::Value;

use crate::{Error, Result};

/// Query-string parameters for GET requests
pub type QueryParams = BTreeMap<String, String>;

/// HTTP methods used by the API client
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HttpMethod::Get => write!(f, "GET"),
            HttpMethod::Post => write!(f, "POST"),
        }
    }
}

/// One outgoing request, fully resolved
#[derive(Debug, Clone, PartialEq)]
pub struct TransportRequest {
    pub method: HttpMethod,
    pub url: String,
    pub query: Option<QueryParams>,
    /// `None` sends no payload at all; `Some(json!({}))` sends `{}`
    pub body: Option<Value>,
    pub timeout: Duration,
}

/// Raw response as received from the wire
#[derive(Debug, Clone, PartialEq)]
pub struct TransportResponse {
    pub status: u16,
    pub reason: Option<String>,
    pub body: String,
}

impl TransportResponse {
    /// Build a response without a reason phrase
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            reason: None,
            body: body.into(),
        }
    }

    /// Whether the status is in the 2xx range
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Failures that prevented an HTTP response from being received
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    #[error("request timed out: {0}")]
    Timeout(String),

    #[error("connection failed: {0}")]
    Connect(String),

    #[error("request failed: {0}")]
    Other(String),
}

impl From<reqwest::Error> for TransportError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            TransportError::Timeout(error.to_string())
        } else if error.is_connect() {
            TransportError::Connect(error.to_string())
        } else {
            TransportError::Other(error.to_string())
        }
    }
}

/// Executes a single HTTP exchange
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: TransportRequest) -> std::result::Result<TransportResponse, TransportError>;
}

/// `reqwest`-backed transport
///
/// The underlying client is built once; authentication headers are installed
/// as default headers so every request on the connection pool carries them.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: ReqwestClient,
}

impl ReqwestTransport {
    /// Build a transport with the given default headers and timeout
    pub fn new(default_headers: HeaderMap, timeout: Duration) -> Result<Self> {
        let client = ReqwestClient::builder()
            .timeout(timeout)
            .default_headers(default_headers)
            .build()
            .map_err(|e| Error::Configuration {
                message: format!("Failed to create HTTP client: {}", e),
                field: None,
                source: Some(e.into()),
            })?;

        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: TransportRequest) -> std::result::Result<TransportResponse, TransportError> {
        let mut builder = match request.method {
            HttpMethod::Get => self.client.get(&request.url),
            HttpMethod::Post => self
                .client
                .post(&request.url)
                .header(CONTENT_TYPE, HeaderValue::from_static("application/json")),
        };

        builder = builder.timeout(request.timeout);

        if let Some(query) = &request.query {
            builder = builder.query(query);
        }

        if let Some(body) = &request.body {
            let payload = serde_json::to_vec(body)
                .map_err(|e| TransportError::Other(format!("failed to encode body: {}", e)))?;
            builder = builder.body(payload);
        }

        let response = builder.send().await?;
        let status = response.status();
        let body = response.text().await?;

        Ok(TransportResponse {
            status: status.as_u16(),
            reason: status.canonical_reason().map(str::to_string),
            body,
        })
    }
}

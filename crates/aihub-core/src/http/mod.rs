//! Request-execution pipeline
//!
//! This module provides the authenticated API client with:
//! - Client-side token-bucket rate limiting
//! - Classification of error responses into a closed taxonomy
//! - Retry with pure exponential backoff
//! - Per-client usage metrics
//! - Lifecycle events through a pluggable observer

pub mod auth;
pub mod client;
pub mod error;
pub mod metrics;
pub mod observer;
pub mod rate_limit;
pub mod retry;
pub mod status;
pub mod transport;

pub use auth::BearerAuth;
pub use client::{HttpClient, NON_JSON_SUCCESS_MESSAGE};
pub use error::{classify_response, classify_transport_error, ClassifiedError, ErrorKind};
pub use metrics::{MetricsCollector, StatusRecord, UsageSnapshot};
pub use observer::{RecordingObserver, RequestEvent, RequestObserver, TracingObserver};
pub use rate_limit::RateLimiter;
pub use retry::{AttemptOutcome, RetryDecision, RetryPolicy};
pub use transport::{
    HttpMethod, QueryParams, ReqwestTransport, Transport, TransportError, TransportRequest, TransportResponse,
};

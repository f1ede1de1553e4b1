//! Usage metrics for an API client
//!
//! One record per logical call (not per attempt), written when the call
//! finally succeeds or finally fails.

use std::fmt;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use serde::{Serialize, Serializer};

use crate::http::error::{ClassifiedError, ErrorKind};

/// Terminal status of one logical call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusRecord {
    /// An HTTP response was received
    Http(u16),
    Timeout,
    Connection,
    /// Any other failure that produced no HTTP response
    Exception,
    Cancelled,
}

impl StatusRecord {
    /// Status to record for a terminal classified error
    pub fn for_error(error: &ClassifiedError) -> Self {
        let root = error.root_cause();
        match (root.status_code, root.kind) {
            (Some(status), _) => StatusRecord::Http(status),
            (None, ErrorKind::Timeout) => StatusRecord::Timeout,
            (None, ErrorKind::ConnectionFailure) => StatusRecord::Connection,
            (None, _) => StatusRecord::Exception,
        }
    }
}

impl fmt::Display for StatusRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatusRecord::Http(status) => write!(f, "{}", status),
            StatusRecord::Timeout => f.write_str("timeout"),
            StatusRecord::Connection => f.write_str("connection"),
            StatusRecord::Exception => f.write_str("exception"),
            StatusRecord::Cancelled => f.write_str("cancelled"),
        }
    }
}

impl Serialize for StatusRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            StatusRecord::Http(status) => serializer.serialize_u16(*status),
            other => serializer.collect_str(other),
        }
    }
}

/// Immutable copy of a client's counters
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct UsageSnapshot {
    pub total_requests: u64,
    pub successful_requests: u64,
    pub failed_requests: u64,
    #[serde(rename = "total_elapsed_secs", serialize_with = "as_secs_f64")]
    pub total_elapsed: Duration,
    pub status_history: Vec<StatusRecord>,
}

impl UsageSnapshot {
    /// Mean elapsed time per recorded call
    pub fn average_latency(&self) -> Option<Duration> {
        u32::try_from(self.total_requests)
            .ok()
            .filter(|count| *count > 0)
            .map(|count| self.total_elapsed / count)
    }
}

fn as_secs_f64<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64(duration.as_secs_f64())
}

/// Thread-safe metrics collector owned by one client
#[derive(Debug, Default)]
pub struct MetricsCollector {
    inner: Mutex<UsageSnapshot>,
}

impl MetricsCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_success(&self, elapsed: Duration, status: u16) {
        let mut metrics = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        metrics.total_requests += 1;
        metrics.successful_requests += 1;
        metrics.total_elapsed += elapsed;
        metrics.status_history.push(StatusRecord::Http(status));
    }

    pub fn record_failure(&self, elapsed: Duration, status: StatusRecord) {
        let mut metrics = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        metrics.total_requests += 1;
        metrics.failed_requests += 1;
        metrics.total_elapsed += elapsed;
        metrics.status_history.push(status);
    }

    pub fn snapshot(&self) -> UsageSnapshot {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

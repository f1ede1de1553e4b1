//! Lifecycle events of the request pipeline
//!
//! The client reports what it does through a [`RequestObserver`] instead of
//! writing to a fixed logger. [`TracingObserver`] is the default and forwards
//! everything to `tracing`; [`RecordingObserver`] keeps the events in memory.

use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use crate::http::error::ErrorKind;
use crate::http::retry::AttemptOutcome;

/// Something that happened while executing one logical call
#[derive(Debug, Clone, PartialEq)]
pub enum RequestEvent {
    /// The rate limiter held the call back
    RateLimited { wait: Duration },
    /// An attempt failed; the policy decides what follows
    AttemptFailed {
        outcome: AttemptOutcome,
        max_attempts: u32,
    },
    /// The client is about to sleep before the next attempt
    BackoffScheduled { attempt: u32, delay: Duration },
    /// The call returned a value
    Succeeded {
        attempts: u32,
        status: u16,
        elapsed: Duration,
    },
    /// The call raised a classified error
    Failed { attempts: u32, kind: ErrorKind },
    /// The caller cancelled the call
    Cancelled { attempts: u32 },
}

/// Receives pipeline events. Implementations must be cheap and must not block.
pub trait RequestObserver: Send + Sync {
    fn on_event(&self, event: &RequestEvent);
}

/// Forwards events to `tracing`
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl RequestObserver for TracingObserver {
    fn on_event(&self, event: &RequestEvent) {
        match event {
            RequestEvent::RateLimited { wait } => {
                tracing::info!(wait_ms = wait.as_millis() as u64, "Rate limit reached, request delayed");
            }
            RequestEvent::AttemptFailed { outcome, max_attempts } => {
                let kind = outcome.error.as_ref().map(|e| e.kind.as_str()).unwrap_or("unknown");
                tracing::warn!(
                    attempt = outcome.attempt + 1,
                    max_attempts = *max_attempts,
                    status = outcome.status,
                    kind,
                    elapsed_ms = outcome.elapsed.as_millis() as u64,
                    "Request attempt failed"
                );
            }
            RequestEvent::BackoffScheduled { attempt, delay } => {
                tracing::info!(
                    attempt = attempt + 1,
                    delay_ms = delay.as_millis() as u64,
                    "Waiting before next attempt"
                );
            }
            RequestEvent::Succeeded { attempts, status, elapsed } => {
                tracing::debug!(
                    attempts = *attempts,
                    status = *status,
                    elapsed_ms = elapsed.as_millis() as u64,
                    "Request succeeded"
                );
            }
            RequestEvent::Failed { attempts, kind } => {
                tracing::error!(attempts = *attempts, kind = kind.as_str(), "Request failed");
            }
            RequestEvent::Cancelled { attempts } => {
                tracing::warn!(attempts = *attempts, "Request cancelled");
            }
        }
    }
}

/// Keeps every event in memory, in order
#[derive(Debug, Default)]
pub struct RecordingObserver {
    events: Mutex<Vec<RequestEvent>>,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<RequestEvent> {
        self.events.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Backoff delays in the order they were scheduled
    pub fn backoff_delays(&self) -> Vec<Duration> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                RequestEvent::BackoffScheduled { delay, .. } => Some(delay),
                _ => None,
            })
            .collect()
    }

    /// Number of failed attempts observed
    pub fn failed_attempts(&self) -> usize {
        self.events()
            .iter()
            .filter(|event| matches!(event, RequestEvent::AttemptFailed { .. }))
            .count()
    }

    pub fn clear(&self) {
        self.events.lock().unwrap_or_else(PoisonError::into_inner).clear();
    }
}

impl RequestObserver for RecordingObserver {
    fn on_event(&self, event: &RequestEvent) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event.clone());
    }
}

//! Client-side rate limiting using a token bucket
//!
//! The bucket holds at most `max_requests_per_second` tokens (a one-second
//! burst window) and is refilled lazily on every acquire from the elapsed
//! time. A caller that finds the bucket empty sleeps until one token would be
//! available, then leaves the bucket drained.

use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::{sleep, Instant};
use tokio_util::sync::CancellationToken;

use crate::{Error, Result};

/// Token bucket state
#[derive(Debug)]
struct TokenBucket {
    /// Current number of tokens, always within `[0, capacity]`
    tokens: f64,
    /// Maximum number of tokens (equal to the refill rate)
    capacity: f64,
    /// Tokens added per second
    refill_rate: f64,
    /// Last refill time
    last_refill: Instant,
}

impl TokenBucket {
    fn new(rate: f64) -> Self {
        Self {
            tokens: rate,
            capacity: rate,
            refill_rate: rate,
            last_refill: Instant::now(),
        }
    }

    /// Refill tokens based on elapsed time
    fn refill(&mut self, now: Instant) {
        let elapsed = now.saturating_duration_since(self.last_refill).as_secs_f64();
        let new_tokens = elapsed * self.refill_rate;

        if new_tokens > 0.0 {
            self.tokens = (self.tokens + new_tokens).min(self.capacity);
            self.last_refill = now;
        }
    }

    /// Take one token, or report how long to wait for one
    fn try_consume(&mut self, now: Instant) -> Option<Duration> {
        self.refill(now);

        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            None
        } else {
            // Rates near zero need waits longer than a Duration can hold
            let seconds = (1.0 - self.tokens) / self.refill_rate;
            Some(Duration::try_from_secs_f64(seconds).unwrap_or(Duration::MAX))
        }
    }

    /// The token earned while waiting is spent immediately
    fn drain(&mut self, now: Instant) {
        self.tokens = 0.0;
        self.last_refill = now;
    }
}

/// Per-client rate limiter
///
/// Access to the bucket is serialised, so one limiter can be shared by
/// concurrent callers of the same client; waiting callers queue on the lock.
#[derive(Debug)]
pub struct RateLimiter {
    bucket: Mutex<TokenBucket>,
    rate: f64,
}

impl RateLimiter {
    /// Create a limiter allowing `max_requests_per_second` requests per second
    pub fn new(max_requests_per_second: f64) -> Self {
        Self {
            bucket: Mutex::new(TokenBucket::new(max_requests_per_second)),
            rate: max_requests_per_second,
        }
    }

    /// Configured rate in requests per second
    pub fn rate(&self) -> f64 {
        self.rate
    }

    /// Wait for a token and consume it. Returns how long the caller waited.
    pub async fn acquire(&self) -> Duration {
        let mut bucket = self.bucket.lock().await;

        match bucket.try_consume(Instant::now()) {
            None => Duration::ZERO,
            Some(wait) => {
                tracing::debug!(wait_ms = wait.as_millis() as u64, "Rate limit reached, waiting for a token");
                sleep(wait).await;
                bucket.drain(Instant::now());
                wait
            }
        }
    }

    /// Like [`acquire`](Self::acquire), but gives up when `cancel` fires.
    /// A cancelled wait consumes no token.
    pub async fn acquire_with_cancel(&self, cancel: &CancellationToken) -> Result<Duration> {
        let mut bucket = tokio::select! {
            _ = cancel.cancelled() => return Err(Error::Cancelled),
            guard = self.bucket.lock() => guard,
        };

        match bucket.try_consume(Instant::now()) {
            None => Ok(Duration::ZERO),
            Some(wait) => {
                tracing::debug!(wait_ms = wait.as_millis() as u64, "Rate limit reached, waiting for a token");
                tokio::select! {
                    _ = cancel.cancelled() => return Err(Error::Cancelled),
                    _ = sleep(wait) => {}
                }
                bucket.drain(Instant::now());
                Ok(wait)
            }
        }
    }

    /// Tokens currently available, after a refill
    pub async fn available_tokens(&self) -> f64 {
        let mut bucket = self.bucket.lock().await;
        bucket.refill(Instant::now());
        bucket.tokens
    }
}

//! Client configuration
//!
//! A [`ClientConfig`] is built once and handed to the client; the client
//! never mutates it.

use std::fmt;
use std::time::Duration;

use url::Url;

use crate::http::auth::redact_key;
use crate::http::retry::RetryPolicy;
use crate::{Error, Result};

/// Default API origin
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
/// Default per-attempt timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
/// Default number of retries after the first attempt
pub const DEFAULT_MAX_RETRIES: u32 = 2;
/// Default backoff factor
pub const DEFAULT_BACKOFF_FACTOR: Duration = Duration::from_millis(10);
/// Default client-side request rate
pub const DEFAULT_MAX_REQUESTS_PER_SECOND: f64 = 3.0;

/// Settings for one API client
#[derive(Clone, PartialEq)]
pub struct ClientConfig {
    /// Secret API key, sent as a bearer token
    pub api_key: String,
    /// API origin; endpoints are joined onto it with `/`
    pub base_url: String,
    /// Timeout for each individual attempt
    pub timeout: Duration,
    /// Retries after the first attempt
    pub max_retries: u32,
    /// Attempt `n` waits `backoff_factor * 2^n` before retrying
    pub backoff_factor: Duration,
    /// Client-side token bucket rate (and burst size)
    pub max_requests_per_second: f64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
            max_retries: DEFAULT_MAX_RETRIES,
            backoff_factor: DEFAULT_BACKOFF_FACTOR,
            max_requests_per_second: DEFAULT_MAX_REQUESTS_PER_SECOND,
        }
    }
}

impl ClientConfig {
    /// Default settings with the given API key
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            ..Default::default()
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_backoff_factor(mut self, backoff_factor: Duration) -> Self {
        self.backoff_factor = backoff_factor;
        self
    }

    /// Backoff factor given in (fractional) seconds
    pub fn with_backoff_secs(self, seconds: f64) -> Self {
        let factor = Duration::try_from_secs_f64(seconds).unwrap_or(Duration::ZERO);
        self.with_backoff_factor(factor)
    }

    pub fn with_max_requests_per_second(mut self, rate: f64) -> Self {
        self.max_requests_per_second = rate;
        self
    }

    /// Retry policy derived from these settings
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_retries, self.backoff_factor)
    }

    /// Full URL for an endpoint such as `chat/completions`
    pub fn endpoint_url(&self, endpoint: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            endpoint.trim_start_matches('/')
        )
    }

    /// Check every setting; the client refuses to start on the first failure
    pub fn validate(&self) -> Result<()> {
        if self.api_key.trim().is_empty() {
            return Err(Error::configuration(
                "api_key",
                "API key must not be empty. Set OPENAI_API_KEY",
            ));
        }

        let url = Url::parse(&self.base_url).map_err(|e| Error::Configuration {
            message: format!("Invalid base URL '{}': {}", self.base_url, e),
            field: Some("base_url".to_string()),
            source: Some(e.into()),
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(Error::configuration(
                "base_url",
                format!("Base URL must use http or https, got '{}'", url.scheme()),
            ));
        }

        if self.timeout.is_zero() {
            return Err(Error::configuration("timeout", "Timeout cannot be zero"));
        }

        if self.backoff_factor.is_zero() {
            return Err(Error::configuration("backoff_factor", "Backoff factor must be positive"));
        }

        if !self.max_requests_per_second.is_finite() || self.max_requests_per_second <= 0.0 {
            return Err(Error::configuration(
                "max_requests_per_second",
                "Request rate must be a positive number",
            ));
        }

        Ok(())
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("api_key", &redact_key(&self.api_key))
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .field("max_retries", &self.max_retries)
            .field("backoff_factor", &self.backoff_factor)
            .field("max_requests_per_second", &self.max_requests_per_second)
            .finish()
    }
}

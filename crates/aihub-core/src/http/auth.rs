//! Bearer-token authentication
//!
//! The `Authorization` header is built once, when the client is constructed,
//! and installed as a default header on the transport.

use std::fmt;

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};

use crate::{Error, Result};

/// Bearer token credentials
#[derive(Clone)]
pub struct BearerAuth {
    api_key: String,
}

impl BearerAuth {
    /// Create credentials, rejecting an empty key
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(Error::configuration("api_key", "API key must not be empty"));
        }
        Ok(Self { api_key })
    }

    /// `Bearer <key>`, marked sensitive so it is never printed by `reqwest`
    pub fn header_value(&self) -> Result<HeaderValue> {
        let mut value = HeaderValue::from_str(&format!("Bearer {}", self.api_key)).map_err(|e| {
            Error::Configuration {
                message: "API key contains characters not allowed in a header".to_string(),
                field: Some("api_key".to_string()),
                source: Some(e.into()),
            }
        })?;
        value.set_sensitive(true);
        Ok(value)
    }

    /// Default headers to install on the transport
    pub fn headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, self.header_value()?);
        Ok(headers)
    }

    /// The key with everything but a short prefix hidden
    pub fn redacted(&self) -> String {
        redact_key(&self.api_key)
    }
}

impl fmt::Debug for BearerAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BearerAuth")
            .field("api_key", &self.redacted())
            .finish()
    }
}

/// Hide an API key for display, keeping a short prefix when the key is long
pub fn redact_key(key: &str) -> String {
    if key.chars().count() > 8 {
        let prefix: String = key.chars().take(5).collect();
        format!("{}...[REDACTED]", prefix)
    } else {
        "[REDACTED]".to_string()
    }
}

//! Input validation for the API facades
//!
//! Everything here runs before a request is built, so a rejected input never
//! costs a rate-limiter token or an API call.

use serde_json::{Map, Value};

use crate::{Error, Result};

/// Extra completion parameters callers may pass through
pub const ALLOWED_EXTRA_PARAMS: &[&str] = &["temperature", "max_tokens", "top_p", "n", "stream", "logprobs"];

pub fn validate_model(model: &str) -> Result<&str> {
    if model.trim().is_empty() {
        return Err(Error::Validation {
            field: "model".to_string(),
            message: "model must be a non-empty string".to_string(),
            expected: Some("a model id such as gpt-3.5-turbo".to_string()),
        });
    }
    Ok(model)
}

pub fn validate_prompt(prompt: &str) -> Result<&str> {
    if prompt.trim().is_empty() {
        return Err(Error::validation("prompt", "prompt must be a non-empty string"));
    }
    Ok(prompt)
}

/// Every message must be an object carrying `role` and `content`
pub fn validate_messages(messages: &[Value]) -> Result<()> {
    if messages.is_empty() {
        return Err(Error::validation("messages", "messages must be a non-empty list"));
    }

    for (index, message) in messages.iter().enumerate() {
        let valid = message
            .as_object()
            .is_some_and(|object| object.contains_key("role") && object.contains_key("content"));
        if !valid {
            return Err(Error::Validation {
                field: "messages".to_string(),
                message: format!("message {} must be an object with 'role' and 'content'", index),
                expected: Some(r#"{"role": "...", "content": "..."}"#.to_string()),
            });
        }
    }

    Ok(())
}

/// Reject parameters outside [`ALLOWED_EXTRA_PARAMS`] and any attempt to stream
pub fn validate_extra_params(params: &Map<String, Value>) -> Result<()> {
    for (key, value) in params {
        if !ALLOWED_EXTRA_PARAMS.contains(&key.as_str()) {
            return Err(Error::Validation {
                field: key.clone(),
                message: format!("extra parameter not allowed: {}", key),
                expected: Some(ALLOWED_EXTRA_PARAMS.join(", ")),
            });
        }
        if key == "stream" && value.as_bool() == Some(true) {
            return Err(Error::validation("stream", "streaming responses are not supported"));
        }
    }
    Ok(())
}

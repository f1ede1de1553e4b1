//! Text completions facade

use std::sync::Arc;

use serde_json::{Map, Value};

use crate::http::HttpClient;
use crate::validators::{validate_extra_params, validate_model, validate_prompt};
use crate::Result;

pub const DEFAULT_COMPLETION_MODEL: &str = "gpt-3.5-turbo-instruct";

/// Sends prompts to `completions`
#[derive(Debug, Clone)]
pub struct CompletionsService {
    client: Arc<HttpClient>,
}

impl CompletionsService {
    pub fn new(client: Arc<HttpClient>) -> Self {
        Self { client }
    }

    /// Generate text for `prompt`; `extra` holds sampling parameters such as
    /// `temperature` or `max_tokens`
    pub async fn generate_text(&self, prompt: &str, model: &str, extra: Map<String, Value>) -> Result<Value> {
        let prompt = validate_prompt(prompt)?;
        let model = validate_model(model)?;
        validate_extra_params(&extra)?;

        let mut payload = Map::new();
        payload.insert("model".to_string(), Value::from(model));
        payload.insert("prompt".to_string(), Value::from(prompt));
        payload.extend(extra);

        self.client.post("completions", Some(Value::Object(payload))).await
    }
}

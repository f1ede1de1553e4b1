//! Chat completions facade

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio_util::sync::CancellationToken;

use crate::http::HttpClient;
use crate::validators::{validate_messages, validate_model};
use crate::Result;

pub const DEFAULT_CHAT_MODEL: &str = "gpt-3.5-turbo";

/// One message of a conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new("user", content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new("assistant", content)
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new("system", content)
    }
}

/// Sends conversations to `chat/completions`
#[derive(Debug, Clone)]
pub struct ChatService {
    client: Arc<HttpClient>,
}

impl ChatService {
    pub fn new(client: Arc<HttpClient>) -> Self {
        Self { client }
    }

    /// Validate the conversation and request the next assistant message
    ///
    /// `messages` may be [`ChatMessage`]s or raw JSON objects; each must carry
    /// `role` and `content`.
    pub async fn create_conversation<M: Serialize>(&self, messages: &[M], model: &str) -> Result<Value> {
        self.create_conversation_with_cancel(messages, model, &CancellationToken::new())
            .await
    }

    pub async fn create_conversation_with_cancel<M: Serialize>(
        &self,
        messages: &[M],
        model: &str,
        cancel: &CancellationToken,
    ) -> Result<Value> {
        let messages = messages
            .iter()
            .map(serde_json::to_value)
            .collect::<std::result::Result<Vec<_>, _>>()?;
        validate_messages(&messages)?;
        let model = validate_model(model)?;

        let payload = json!({
            "model": model,
            "messages": messages,
        });
        self.client
            .post_with_cancel("chat/completions", Some(payload), cancel)
            .await
    }
}

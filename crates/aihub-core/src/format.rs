//! Human-readable rendering of API responses

use serde_json::Value;

use crate::chat::ChatMessage;

/// Assistant reply of a chat completion, or the whole response as pretty JSON
pub fn format_chat_response(response: &Value) -> String {
    match response.pointer("/choices/0/message/content").and_then(Value::as_str) {
        Some(content) => content.trim().to_string(),
        None => pretty(response),
    }
}

/// Generated text of a completion, or the whole response as pretty JSON
pub fn format_completion_response(response: &Value) -> String {
    match response.pointer("/choices/0/text").and_then(Value::as_str) {
        Some(text) => text.trim().to_string(),
        None => pretty(response),
    }
}

/// One `[role] content` line per message
pub fn format_context(messages: &[ChatMessage]) -> String {
    messages
        .iter()
        .map(|message| format!("[{}] {}", message.role, message.content))
        .collect::<Vec<_>>()
        .join("\n")
}

fn pretty(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}

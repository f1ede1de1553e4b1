//! Bounded conversation history

use std::fs;
use std::path::Path;

use crate::chat::ChatMessage;
use crate::Result;

/// Default number of messages kept
pub const DEFAULT_CONTEXT_LIMIT: usize = 20;

/// Message history that keeps only the most recent `max_length` entries
#[derive(Debug, Clone, PartialEq)]
pub struct ConversationContext {
    messages: Vec<ChatMessage>,
    max_length: usize,
}

impl Default for ConversationContext {
    fn default() -> Self {
        Self::new(DEFAULT_CONTEXT_LIMIT)
    }
}

impl ConversationContext {
    pub fn new(max_length: usize) -> Self {
        Self {
            messages: Vec::new(),
            max_length,
        }
    }

    pub fn max_length(&self) -> usize {
        self.max_length
    }

    /// Append a message, evicting the oldest ones beyond the limit
    pub fn push(&mut self, message: ChatMessage) {
        self.messages.push(message);
        if self.messages.len() > self.max_length {
            let excess = self.messages.len() - self.max_length;
            self.messages.drain(..excess);
        }
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// The last `n` messages, oldest first
    pub fn recent(&self, n: usize) -> &[ChatMessage] {
        let start = self.messages.len().saturating_sub(n);
        &self.messages[start..]
    }

    pub fn clear(&mut self) {
        self.messages.clear();
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Write the history as pretty JSON
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(&self.messages)?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Replace the history with the one stored at `path`, keeping the limit
    pub fn load(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let content = fs::read_to_string(path)?;
        let messages: Vec<ChatMessage> = serde_json::from_str(&content)?;
        self.messages.clear();
        for message in messages {
            self.push(message);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_push_evicts_oldest() {
        let mut context = ConversationContext::new(3);
        context.push(ChatMessage::user("one"));
        context.push(ChatMessage::assistant("two"));
        context.push(ChatMessage::user("three"));
        context.push(ChatMessage::assistant("four"));

        assert_eq!(context.len(), 3);
        assert_eq!(context.messages()[0].content, "two");
        assert_eq!(context.messages()[2].content, "four");
    }

    #[test]
    fn test_recent_and_clear() {
        let mut context = ConversationContext::default();
        assert_eq!(context.max_length(), DEFAULT_CONTEXT_LIMIT);
        for i in 0..5 {
            context.push(ChatMessage::user(format!("m{}", i)));
        }

        let recent = context.recent(2);
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].content, "m3");
        assert_eq!(context.recent(50).len(), 5);

        context.clear();
        assert!(context.is_empty());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("history.json");

        let mut context = ConversationContext::new(10);
        context.push(ChatMessage::system("be brief"));
        context.push(ChatMessage::user("hi"));
        context.save(&path).unwrap();

        let mut restored = ConversationContext::new(1);
        restored.load(&path).unwrap();
        assert_eq!(restored.len(), 1);
        assert_eq!(restored.messages()[0], ChatMessage::user("hi"));
    }

    #[test]
    fn test_load_missing_file() {
        let mut context = ConversationContext::default();
        assert!(matches!(
            context.load("/nonexistent/history.json"),
            Err(crate::Error::Io { .. })
        ));
    }
}

//! AI Hub Core - resilient client for OpenAI-compatible HTTP APIs
//!
//! Every call goes through one pipeline: a per-client token bucket, the HTTP
//! transport, an error classifier, and a retry loop with exponential backoff.
//! Usage counters are kept per client.
//!
//! # Main Components
//!
//! - **HTTP pipeline**: [`HttpClient`] with rate limiting, retries and metrics
//! - **Error Handling**: [`Error`] wrapping the classified API failure ([`ClassifiedError`])
//! - **Facades**: chat, completions and model listing on top of the client
//! - **Conversation context**: bounded message history with JSON persistence
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use aihub_core::{ChatMessage, ChatService, ClientConfig, HttpClient, Result};
//!
//! async fn example() -> Result<()> {
//!     let client = Arc::new(HttpClient::new(ClientConfig::new("sk-..."))?);
//!     let chat = ChatService::new(client.clone());
//!     let reply = chat
//!         .create_conversation(&[ChatMessage::user("Hello!")], "gpt-3.5-turbo")
//!         .await?;
//!     println!("{}", aihub_core::format::format_chat_response(&reply));
//!     println!("{:?}", client.metrics());
//!     Ok(())
//! }
//! ```

pub mod chat;
pub mod completions;
pub mod config;
pub mod context;
pub mod error;
pub mod format;
pub mod http;
pub mod models;
pub mod validators;

pub use chat::{ChatMessage, ChatService, DEFAULT_CHAT_MODEL};
pub use completions::{CompletionsService, DEFAULT_COMPLETION_MODEL};
pub use config::ClientConfig;
pub use context::{ConversationContext, DEFAULT_CONTEXT_LIMIT};
pub use error::{Error, Result};
pub use http::{ClassifiedError, ErrorKind, HttpClient, StatusRecord, UsageSnapshot};
pub use models::ModelsService;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

//! Command handlers for CLI subcommands
//!
//! This module contains the implementation logic for each CLI subcommand.

mod chat;
mod completions;
mod config;
mod interactive;
mod models;
mod request;

pub use chat::{handle_chat, handle_complete};
pub use completions::handle_completions;
pub use config::handle_config;
pub use interactive::handle_interactive;
pub use models::{handle_check, handle_models};
pub use request::{handle_get, handle_post};

use crate::config::Config;
use crate::error::Result;
use aihub_core::HttpClient;
use std::sync::Arc;

/// Build the API client shared by every command of one invocation
pub fn build_client(config: &Config) -> Result<Arc<HttpClient>> {
    let client_config = config.to_client_config()?;
    tracing::debug!(config = ?client_config, "Creating API client");
    Ok(Arc::new(HttpClient::new(client_config)?))
}

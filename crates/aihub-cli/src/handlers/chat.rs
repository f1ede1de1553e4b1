//! Chat and completion command handlers

use crate::cli::{ChatArgs, CompleteArgs};
use crate::config::Config;
use crate::error::Result;
use crate::logging::timing::Timer;
use crate::output::OutputWriter;
use aihub_core::format::{format_chat_response, format_completion_response};
use aihub_core::{ChatMessage, ChatService, CompletionsService, HttpClient};
use serde_json::{json, Map};
use std::sync::Arc;
use tracing::{info, instrument};

/// Handle the chat command
#[instrument(skip_all, fields(model = tracing::field::Empty))]
pub async fn handle_chat(
    args: ChatArgs,
    config: &Config,
    client: Arc<HttpClient>,
    output: &mut OutputWriter,
) -> Result<()> {
    let model = args.model.unwrap_or_else(|| config.defaults.chat_model.clone());
    tracing::Span::current().record("model", model.as_str());
    let _timer = Timer::with_details("chat", &model);

    let mut messages = Vec::new();
    if let Some(system) = args.system {
        messages.push(ChatMessage::system(system));
    }
    messages.push(ChatMessage::user(args.message));

    let spinner = output.spinner("Waiting for the model...");
    let result = ChatService::new(client).create_conversation(&messages, &model).await;
    if let Some(pb) = spinner {
        pb.finish_and_clear();
    }
    let response = result?;
    info!("Chat command completed");

    if output.is_human() {
        output.writeln(&format_chat_response(&response))
    } else {
        output.data(&response)
    }
}

/// Handle the complete command
#[instrument(skip_all, fields(model = tracing::field::Empty))]
pub async fn handle_complete(
    args: CompleteArgs,
    config: &Config,
    client: Arc<HttpClient>,
    output: &mut OutputWriter,
) -> Result<()> {
    let model = args.model.unwrap_or_else(|| config.defaults.completion_model.clone());
    tracing::Span::current().record("model", model.as_str());
    let _timer = Timer::with_details("complete", &model);

    let mut extra = Map::new();
    if let Some(max_tokens) = args.max_tokens {
        extra.insert("max_tokens".to_string(), json!(max_tokens));
    }
    if let Some(temperature) = args.temperature {
        extra.insert("temperature".to_string(), json!(temperature));
    }

    let spinner = output.spinner("Generating text...");
    let result = CompletionsService::new(client)
        .generate_text(&args.prompt, &model, extra)
        .await;
    if let Some(pb) = spinner {
        pb.finish_and_clear();
    }
    let response = result?;
    info!("Complete command completed");

    if output.is_human() {
        output.writeln(&format_completion_response(&response))
    } else {
        output.data(&response)
    }
}

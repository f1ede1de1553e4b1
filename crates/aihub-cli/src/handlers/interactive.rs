//! Interactive chat session handler

use crate::cli::InteractiveArgs;
use crate::config::Config;
use crate::error::{format_error, Error, Result};
use crate::logging::timing::Timer;
use crate::output::OutputWriter;
use aihub_core::format::{format_chat_response, format_context};
use aihub_core::{ChatMessage, ChatService, ConversationContext, HttpClient};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

const HELP_TEXT: &str = "Commands:
  /help            Show this help
  /history         Show the conversation so far
  /clear           Forget the conversation
  /save [file]     Save the conversation as JSON
  /load <file>     Load a saved conversation
  /quit, /exit     Leave the session";

/// One line typed at the prompt
#[derive(Debug, Clone, PartialEq, Eq)]
enum ReplInput {
    Empty,
    Quit,
    Clear,
    Help,
    History,
    Save(Option<PathBuf>),
    Load(PathBuf),
    Unknown(String),
    Message(String),
}

fn parse_input(line: &str) -> ReplInput {
    let line = line.trim();
    if line.is_empty() {
        return ReplInput::Empty;
    }
    if !line.starts_with('/') {
        return ReplInput::Message(line.to_string());
    }

    let (command, argument) = match line.split_once(char::is_whitespace) {
        Some((command, rest)) => (command, Some(rest.trim()).filter(|rest| !rest.is_empty())),
        None => (line, None),
    };

    match command.to_lowercase().as_str() {
        "/quit" | "/exit" => ReplInput::Quit,
        "/clear" => ReplInput::Clear,
        "/help" => ReplInput::Help,
        "/history" => ReplInput::History,
        "/save" => ReplInput::Save(argument.map(PathBuf::from)),
        "/load" => match argument {
            Some(path) => ReplInput::Load(PathBuf::from(path)),
            None => ReplInput::Unknown("/load needs a file name".to_string()),
        },
        other => ReplInput::Unknown(format!("Unknown command '{}'. Type /help", other)),
    }
}

fn default_save_path() -> PathBuf {
    PathBuf::from(chrono::Local::now().format("conversation_%Y%m%d_%H%M%S.json").to_string())
}

/// Conversation state of one interactive session
struct Session {
    context: ConversationContext,
    limit: usize,
    system: Option<String>,
}

impl Session {
    fn new(limit: usize, system: Option<String>) -> Self {
        Self {
            context: ConversationContext::default(),
            limit: limit.max(1),
            system,
        }
    }

    /// Messages for the next request: system prompt, recent history, then the new message
    fn request_messages(&self, user: &str) -> Vec<ChatMessage> {
        let mut messages = Vec::with_capacity(self.limit + 1);
        if let Some(system) = &self.system {
            messages.push(ChatMessage::system(system.clone()));
        }
        messages.extend(self.context.recent(self.limit - 1).iter().cloned());
        messages.push(ChatMessage::user(user));
        messages
    }

    /// Only exchanges that got a reply become part of the history
    fn record_exchange(&mut self, user: &str, reply: &str) {
        self.context.push(ChatMessage::user(user));
        self.context.push(ChatMessage::assistant(reply));
    }
}

/// Handle the interactive command
pub async fn handle_interactive(
    args: InteractiveArgs,
    config: &Config,
    client: Arc<HttpClient>,
    output: &mut OutputWriter,
    use_color: bool,
) -> Result<()> {
    let model = args.model.unwrap_or_else(|| config.defaults.chat_model.clone());
    let service = ChatService::new(client);
    let mut session = Session::new(args.context_limit, args.system);
    info!(model = %model, context_limit = session.limit, "Starting interactive session");

    output.section(&format!("Interactive chat with {}", model))?;
    output.info("Type /help for commands, /quit to leave. Ctrl-C cancels a pending reply.")?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        output.write("> ")?;
        let Some(line) = lines.next_line().await? else {
            debug!("End of input");
            break;
        };

        match parse_input(&line) {
            ReplInput::Empty => {}
            ReplInput::Quit => break,
            ReplInput::Help => output.writeln(HELP_TEXT)?,
            ReplInput::Clear => {
                session.context.clear();
                output.success("Conversation cleared")?;
            }
            ReplInput::History => {
                if session.context.is_empty() {
                    output.info("No messages yet")?;
                } else {
                    output.writeln(&format_context(session.context.messages()))?;
                }
            }
            ReplInput::Save(path) => {
                let path = path.unwrap_or_else(default_save_path);
                match session.context.save(&path) {
                    Ok(()) => output.success(&format!("Conversation saved to {}", path.display()))?,
                    Err(e) => report(output, Error::from(e), use_color),
                }
            }
            ReplInput::Load(path) => match session.context.load(&path) {
                Ok(()) => output.success(&format!(
                    "Loaded {} messages from {}",
                    session.context.len(),
                    path.display()
                ))?,
                Err(e) => report(output, Error::from(e), use_color),
            },
            ReplInput::Unknown(message) => output.warning(&message)?,
            ReplInput::Message(text) => {
                let messages = session.request_messages(&text);
                match send(&service, &messages, &model, output).await {
                    Ok(reply) => {
                        output.text("reply", &reply)?;
                        session.record_exchange(&text, &reply);
                    }
                    Err(e) => report(output, e, use_color),
                }
            }
        }
    }

    output.info("Goodbye!")
}

/// Send one request; Ctrl-C cancels it without leaving the session
async fn send(
    service: &ChatService,
    messages: &[ChatMessage],
    model: &str,
    output: &OutputWriter,
) -> Result<String> {
    let _timer = Timer::with_details("interactive_chat", model);
    let cancel = CancellationToken::new();
    let watcher = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                cancel.cancel();
            }
        })
    };

    let spinner = output.spinner("Thinking...");
    let result = service
        .create_conversation_with_cancel(messages, model, &cancel)
        .await;
    if let Some(pb) = spinner {
        pb.finish_and_clear();
    }
    watcher.abort();

    Ok(format_chat_response(&result?))
}

fn report(output: &mut OutputWriter, error: Error, use_color: bool) {
    warn!(error = %error, "Interactive request failed");
    if let Err(e) = output.writeln(&format_error(&error, use_color)) {
        debug!(error = %e, "Failed to write error message");
    }
}

//! Command-line interface argument parsing and definitions
//!
//! This module defines the CLI structure using clap's derive API,
//! providing a type-safe and well-documented command interface.

use clap::{Parser, Subcommand, ValueEnum};
use std::io::IsTerminal;
use std::path::PathBuf;

/// AI Hub CLI - talk to OpenAI-compatible APIs from the terminal
///
/// Every command goes through the same client: rate-limited, retried with
/// exponential backoff, and metered.
#[derive(Parser, Debug)]
#[command(
    name = "aihub",
    version,
    author,
    about,
    long_about = None,
    propagate_version = true,
    arg_required_else_help = true
)]
pub struct Cli {
    /// Enable verbose output (can be used multiple times for increased verbosity)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all non-essential output
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Path to configuration file (YAML or JSON)
    #[arg(short, long, global = true, env = "AIHUB_CONFIG")]
    pub config: Option<PathBuf>,

    /// Output format for results
    #[arg(short, long, value_enum, global = true, default_value = "human")]
    pub output: OutputFormat,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Print the client's usage metrics after the command
    #[arg(long, global = true)]
    pub metrics: bool,

    /// The subcommand to run
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Send one message to a chat model
    Chat(ChatArgs),

    /// Generate text from a prompt
    Complete(CompleteArgs),

    /// GET an API endpoint and print the JSON response
    Get(GetArgs),

    /// POST to an API endpoint and print the JSON response
    Post(PostArgs),

    /// List the models available to the API key
    Models,

    /// Check that the API key is accepted
    Check,

    /// Show or validate the effective configuration
    Config(ConfigArgs),

    /// Start an interactive chat session
    Interactive(InteractiveArgs),

    /// Generate shell completions for the specified shell
    Completions(CompletionsArgs),
}

/// Arguments for the chat command
#[derive(Parser, Debug)]
pub struct ChatArgs {
    /// Message to send
    #[arg(short, long)]
    pub message: String,

    /// Chat model (defaults to the configured chat model)
    #[arg(long)]
    pub model: Option<String>,

    /// Optional system prompt sent before the message
    #[arg(long)]
    pub system: Option<String>,
}

/// Arguments for the complete command
#[derive(Parser, Debug)]
pub struct CompleteArgs {
    /// Prompt to complete
    #[arg(short, long)]
    pub prompt: String,

    /// Completion model (defaults to the configured completion model)
    #[arg(long)]
    pub model: Option<String>,

    /// Maximum number of tokens to generate
    #[arg(long)]
    pub max_tokens: Option<u32>,

    /// Sampling temperature
    #[arg(long)]
    pub temperature: Option<f64>,
}

/// Arguments for the get command
#[derive(Parser, Debug)]
pub struct GetArgs {
    /// Endpoint relative to the base URL, e.g. `models`
    #[arg(value_name = "ENDPOINT")]
    pub endpoint: String,

    /// Query parameters as a JSON object
    #[arg(long, value_name = "JSON")]
    pub params: Option<String>,
}

/// Arguments for the post command
#[derive(Parser, Debug)]
pub struct PostArgs {
    /// Endpoint relative to the base URL, e.g. `chat/completions`
    #[arg(value_name = "ENDPOINT")]
    pub endpoint: String,

    /// JSON request body; when omitted the request carries no body at all
    #[arg(short, long, value_name = "JSON")]
    pub data: Option<String>,
}

/// Arguments for the config command
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: Option<ConfigAction>,
}

/// Configuration actions
#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigAction {
    /// Show current configuration values (default)
    Show,

    /// List the configuration file locations that are searched
    Paths,

    /// Check that the configuration can build a client
    Validate,
}

/// Arguments for the interactive command
#[derive(Parser, Debug)]
pub struct InteractiveArgs {
    /// Chat model (defaults to the configured chat model)
    #[arg(long)]
    pub model: Option<String>,

    /// Number of most recent messages sent with every request
    #[arg(long, default_value = "10")]
    pub context_limit: usize,

    /// Optional system prompt sent with every request
    #[arg(long)]
    pub system: Option<String>,
}

/// Arguments for generating shell completions
#[derive(Parser, Debug)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,
}

/// Output format options
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable formatted output
    Human,
    /// JSON output
    Json,
    /// Pretty-printed JSON output
    JsonPretty,
    /// YAML output
    Yaml,
}

/// Supported shells for completion generation
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
    Elvish,
}

impl Cli {
    /// Parse command-line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Get the effective verbosity level (considering quiet flag)
    pub fn verbosity_level(&self) -> u8 {
        if self.quiet {
            0
        } else {
            self.verbose
        }
    }

    /// Check if colored output should be used
    pub fn use_color(&self) -> bool {
        !self.no_color && std::io::stdout().is_terminal()
    }
}

impl Shell {
    /// Convert to clap_complete shell type
    pub fn to_clap_shell(self) -> clap_complete::Shell {
        match self {
            Shell::Bash => clap_complete::Shell::Bash,
            Shell::Zsh => clap_complete::Shell::Zsh,
            Shell::Fish => clap_complete::Shell::Fish,
            Shell::PowerShell => clap_complete::Shell::PowerShell,
            Shell::Elvish => clap_complete::Shell::Elvish,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_verbosity_level() {
        let cli = Cli::parse_from(["aihub", "-vv", "models"]);
        assert_eq!(cli.verbosity_level(), 2);

        let cli = Cli::parse_from(["aihub", "--quiet", "models"]);
        assert_eq!(cli.verbosity_level(), 0);
    }

    #[test]
    fn test_post_without_data_has_no_body() {
        let cli = Cli::parse_from(["aihub", "post", "completions"]);
        match cli.command {
            Commands::Post(args) => {
                assert_eq!(args.endpoint, "completions");
                assert!(args.data.is_none());
            }
            other => panic!("unexpected command: {:?}", other),
        }

        let cli = Cli::parse_from(["aihub", "post", "echo", "--data", "{}"]);
        match cli.command {
            Commands::Post(args) => assert_eq!(args.data.as_deref(), Some("{}")),
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::parse_from(["aihub", "chat", "-m", "Hi", "--metrics", "--output", "json"]);
        assert!(cli.metrics);
        assert_eq!(cli.output, OutputFormat::Json);
        match cli.command {
            Commands::Chat(args) => {
                assert_eq!(args.message, "Hi");
                assert!(args.model.is_none());
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_interactive_defaults() {
        let cli = Cli::parse_from(["aihub", "interactive"]);
        match cli.command {
            Commands::Interactive(args) => assert_eq!(args.context_limit, 10),
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_config_action_optional() {
        let cli = Cli::parse_from(["aihub", "config"]);
        assert!(matches!(cli.command, Commands::Config(ConfigArgs { action: None })));

        let cli = Cli::parse_from(["aihub", "config", "validate"]);
        assert!(matches!(
            cli.command,
            Commands::Config(ConfigArgs { action: Some(ConfigAction::Validate) })
        ));
    }
}

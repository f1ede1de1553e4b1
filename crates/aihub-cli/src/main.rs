//! AI Hub CLI - Command-line client for OpenAI-compatible APIs
//!
//! This is the main entry point for the AI Hub CLI application, providing
//! chat, completion, model listing and raw request commands on top of the
//! rate-limited, retrying client from `aihub-core`.

mod cli;
mod config;
mod error;
mod handlers;
mod logging;
mod output;

use cli::{Cli, Commands};
use colored::control;
use config::Config;
use error::Result;
use logging::{timing::Timer, LoggingConfig};
use output::OutputWriter;
use std::process;
use tracing::instrument;

#[tokio::main]
async fn main() {
    let cli = Cli::parse_args();

    control::set_override(cli.use_color());

    if let Err(e) = init_logging(&cli) {
        eprintln!("Failed to initialize logging: {}", e);
    }

    match run(cli).await {
        Ok(()) => process::exit(0),
        Err(e) => {
            eprintln!("{}", error::format_error(&e, control::SHOULD_COLORIZE.should_colorize()));

            if e.should_show_help() {
                eprintln!("\nFor more information, try '--help'");
            }

            process::exit(e.exit_code());
        }
    }
}

/// Main application logic
#[instrument(skip(cli), fields(command = ?cli.command))]
async fn run(cli: Cli) -> Result<()> {
    let _timer = Timer::new("cli_execution");

    let config = {
        let _config_timer = Timer::new("config_loading");
        tracing::info!("Loading configuration");
        Config::load(cli.config.as_deref())?
    };

    let use_color = cli.use_color();
    let mut output = OutputWriter::new(cli.output, use_color, cli.quiet);

    tracing::info!(
        command = ?cli.command,
        verbosity = cli.verbosity_level(),
        "Executing command"
    );

    // Commands that never talk to the API
    let command = match cli.command {
        Commands::Config(args) => return handlers::handle_config(args, &config, &mut output),
        Commands::Completions(args) => return handlers::handle_completions(args),
        command => command,
    };

    let client = handlers::build_client(&config)?;

    let result = match command {
        Commands::Chat(args) => handlers::handle_chat(args, &config, client.clone(), &mut output).await,
        Commands::Complete(args) => {
            handlers::handle_complete(args, &config, client.clone(), &mut output).await
        }
        Commands::Get(args) => handlers::handle_get(args, &client, &mut output).await,
        Commands::Post(args) => handlers::handle_post(args, &client, &mut output).await,
        Commands::Models => handlers::handle_models(client.clone(), &mut output).await,
        Commands::Check => handlers::handle_check(client.clone(), &mut output).await,
        Commands::Interactive(args) => {
            handlers::handle_interactive(args, &config, client.clone(), &mut output, use_color).await
        }
        Commands::Config(_) | Commands::Completions(_) => Ok(()),
    };

    if cli.metrics {
        output.metrics(&client.metrics())?;
    }

    result
}

/// Initialize the logging system
fn init_logging(cli: &Cli) -> Result<()> {
    let mut logging_config = LoggingConfig::from_verbosity(cli.verbosity_level());

    logging_config.merge_with_env();

    // If quiet mode, only log errors
    if cli.quiet {
        logging_config.level = "error".to_string();
        logging_config.console = false;
    }

    logging::init_logging(logging_config)
}

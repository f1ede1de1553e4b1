//! Configuration command handler

use crate::cli::{ConfigAction, ConfigArgs};
use crate::config::Config;
use crate::error::Result;
use crate::output::OutputWriter;

/// Handle the config command
pub fn handle_config(args: ConfigArgs, config: &Config, output: &mut OutputWriter) -> Result<()> {
    match args.action.unwrap_or(ConfigAction::Show) {
        ConfigAction::Show => handle_config_show(config, output),
        ConfigAction::Paths => handle_config_paths(output),
        ConfigAction::Validate => handle_config_validate(config, output),
    }
}

fn handle_config_show(config: &Config, output: &mut OutputWriter) -> Result<()> {
    let redacted = config.redacted();

    if !output.is_human() {
        return output.data(&redacted);
    }

    output.section("API")?;
    let api_key = redacted.api.api_key.as_deref().unwrap_or("(not set)");
    output.writeln(&format!("  api_key: {}", api_key))?;
    output.writeln(&format!("  base_url: {}", redacted.api.base_url))?;
    output.writeln(&format!("  timeout: {}s", redacted.api.timeout))?;
    output.writeln(&format!("  max_retries: {}", redacted.api.max_retries))?;
    output.writeln(&format!("  backoff_factor: {}s", redacted.api.backoff_factor))?;
    output.writeln(&format!(
        "  max_requests_per_second: {}",
        redacted.api.max_requests_per_second
    ))?;

    output.section("Defaults")?;
    output.writeln(&format!("  chat_model: {}", redacted.defaults.chat_model))?;
    output.writeln(&format!("  completion_model: {}", redacted.defaults.completion_model))
}

fn handle_config_paths(output: &mut OutputWriter) -> Result<()> {
    let paths = Config::default_config_paths();

    if !output.is_human() {
        let entries: Vec<_> = paths
            .iter()
            .map(|path| serde_json::json!({ "path": path, "exists": path.exists() }))
            .collect();
        return output.data(&entries);
    }

    output.section("Configuration Files")?;
    for path in paths {
        let marker = if path.exists() { "✓" } else { " " };
        output.writeln(&format!("  [{}] {}", marker, path.display()))?;
    }
    Ok(())
}

fn handle_config_validate(config: &Config, output: &mut OutputWriter) -> Result<()> {
    config.to_client_config()?;
    if output.is_human() {
        output.success("✓ Configuration is valid")
    } else {
        output.data(&serde_json::json!({ "valid": true }))
    }
}

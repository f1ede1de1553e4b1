//! Model listing and connection check handlers

use crate::error::{Error, Result};
use crate::output::OutputWriter;
use aihub_core::{HttpClient, ModelsService};
use std::sync::Arc;

/// Handle the models command
pub async fn handle_models(client: Arc<HttpClient>, output: &mut OutputWriter) -> Result<()> {
    let spinner = output.spinner("Fetching models...");
    let result = ModelsService::new(client).list_models().await;
    if let Some(pb) = spinner {
        pb.finish_and_clear();
    }
    let mut models = result?;
    models.sort();

    if !output.is_human() {
        return output.data(&models);
    }

    output.section("Available Models")?;
    for model in &models {
        output.writeln(&format!("  • {}", model))?;
    }
    output.info(&format!("{} models available", models.len()))
}

/// Handle the check command
pub async fn handle_check(client: Arc<HttpClient>, output: &mut OutputWriter) -> Result<()> {
    let valid = ModelsService::new(client).check_connection().await?;

    if !output.is_human() {
        output.data(&serde_json::json!({ "api_key_valid": valid }))?;
    } else if valid {
        output.success("✓ API key is valid and the API is reachable")?;
    }

    if valid {
        Ok(())
    } else {
        Err(Error::other(
            "The API rejected the configured key. Check OPENAI_API_KEY.",
        ))
    }
}

//! Output formatting and writing utilities
//!
//! This module provides utilities for formatting and writing output
//! in various formats (JSON, YAML, human-readable), including the usage
//! metrics report and progress spinners.

use crate::cli::OutputFormat;
use crate::error::Result;
use crate::logging::redaction;
use aihub_core::UsageSnapshot;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::io::{self, IsTerminal, Write};
use std::time::Duration;
use tracing::trace;

/// Trait for formatting output
pub trait OutputFormatter {
    /// Format a serializable value
    fn format<T: Serialize>(&self, value: &T) -> Result<String>;
}

impl OutputFormatter for OutputFormat {
    fn format<T: Serialize>(&self, value: &T) -> Result<String> {
        match self {
            OutputFormat::Json => Ok(serde_json::to_string(value)?),
            OutputFormat::JsonPretty | OutputFormat::Human => Ok(serde_json::to_string_pretty(value)?),
            OutputFormat::Yaml => Ok(serde_yaml::to_string(value)?),
        }
    }
}

/// Output writer that handles different output formats and colors
pub struct OutputWriter {
    format: OutputFormat,
    use_color: bool,
    show_progress: bool,
    quiet: bool,
    writer: Box<dyn Write>,
}

impl OutputWriter {
    /// Create a new output writer on stdout
    pub fn new(format: OutputFormat, use_color: bool, quiet: bool) -> Self {
        Self {
            format,
            use_color,
            show_progress: !quiet && io::stderr().is_terminal(),
            quiet,
            writer: Box::new(io::stdout()),
        }
    }

    /// Create an output writer with a custom writer
    pub fn with_writer(format: OutputFormat, use_color: bool, quiet: bool, writer: Box<dyn Write>) -> Self {
        Self {
            format,
            use_color,
            show_progress: false,
            quiet,
            writer,
        }
    }

    pub fn is_human(&self) -> bool {
        self.format == OutputFormat::Human
    }

    /// Write raw output
    pub fn write(&mut self, content: &str) -> Result<()> {
        write!(self.writer, "{}", content)?;
        self.writer.flush()?;
        Ok(())
    }

    /// Write a line of output
    pub fn writeln(&mut self, content: &str) -> Result<()> {
        writeln!(self.writer, "{}", content)?;
        self.writer.flush()?;
        Ok(())
    }

    /// Write an info message
    pub fn info(&mut self, message: &str) -> Result<()> {
        if self.quiet || !self.is_human() {
            return Ok(());
        }

        if self.use_color {
            self.writeln(&format!("{} {}", "ℹ".blue(), message))
        } else {
            self.writeln(&format!("INFO: {}", message))
        }
    }

    /// Write a success message
    pub fn success(&mut self, message: &str) -> Result<()> {
        if self.quiet || !self.is_human() {
            return Ok(());
        }

        if self.use_color {
            self.writeln(&message.green().to_string())
        } else {
            self.writeln(message)
        }
    }

    /// Write a warning message
    pub fn warning(&mut self, message: &str) -> Result<()> {
        if !self.is_human() {
            return Ok(());
        }

        if self.use_color {
            self.writeln(&message.yellow().to_string())
        } else {
            self.writeln(&format!("WARNING: {}", message))
        }
    }

    /// Write a section header
    pub fn section(&mut self, title: &str) -> Result<()> {
        if self.quiet || !self.is_human() {
            return Ok(());
        }

        self.writeln("")?;
        if self.use_color {
            self.writeln(&format!("═══ {} ═══", title).bright_blue().to_string())
        } else {
            self.writeln(&format!("=== {} ===", title))
        }
    }

    /// Write data in the configured format
    pub fn data<T: Serialize>(&mut self, value: &T) -> Result<()> {
        if tracing::enabled!(tracing::Level::TRACE) {
            let mut value_json = serde_json::to_value(value)?;
            redaction::redact_json_value(&mut value_json);
            trace!(data = %value_json, "Writing output data");
        }

        let formatted = self.format.format(value)?;
        if self.format == OutputFormat::Yaml {
            self.write(&formatted)
        } else {
            self.writeln(&formatted)
        }
    }

    /// Plain text in human mode, `{"<key>": text}` otherwise
    pub fn text(&mut self, key: &str, text: &str) -> Result<()> {
        if self.is_human() {
            self.writeln(text)
        } else {
            self.data(&serde_json::json!({ key: text }))
        }
    }

    /// Write the client's usage metrics
    pub fn metrics(&mut self, snapshot: &UsageSnapshot) -> Result<()> {
        if !self.is_human() {
            return self.data(&serde_json::json!({ "metrics": snapshot }));
        }

        self.section("Usage Metrics")?;
        let history = snapshot
            .status_history
            .iter()
            .map(|status| status.to_string())
            .collect::<Vec<_>>()
            .join(", ");
        let average = snapshot
            .average_latency()
            .map(|latency| format!("{:.3}s", latency.as_secs_f64()))
            .unwrap_or_else(|| "-".to_string());

        self.writeln(&format!("  • Total requests: {}", snapshot.total_requests))?;
        self.writeln(&format!("  • Successful: {}", snapshot.successful_requests))?;
        self.writeln(&format!("  • Failed: {}", snapshot.failed_requests))?;
        self.writeln(&format!("  • Total time: {:.3}s", snapshot.total_elapsed.as_secs_f64()))?;
        self.writeln(&format!("  • Average latency: {}", average))?;
        self.writeln(&format!("  • Status history: [{}]", history))
    }

    /// Create a spinner for a pending API call
    pub fn spinner(&self, message: &str) -> Option<ProgressBar> {
        if !self.show_progress || !self.is_human() {
            return None;
        }

        let pb = ProgressBar::new_spinner();
        pb.set_style(default_spinner_style());
        pb.set_message(message.to_string());
        pb.enable_steady_tick(Duration::from_millis(100));
        Some(pb)
    }
}

fn default_spinner_style() -> ProgressStyle {
    ProgressStyle::default_spinner()
        .template("{spinner:.cyan} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"])
}

//! Logging setup for the AI Hub CLI
//!
//! This module provides:
//! - Session ID generation
//! - Sensitive data redaction
//! - Performance timing spans
//! - Structured logging setup (compact, full, JSON) on stderr

use crate::error::{Error, Result};
use std::io::IsTerminal;
use std::sync::OnceLock;
use tracing::{field, Span};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

/// Session ID shared by every log line of this process
static SESSION_ID: OnceLock<String> = OnceLock::new();

/// Filter and layout of the stderr log
#[derive(Debug, Clone, PartialEq)]
pub struct LoggingConfig {
    /// `EnvFilter` directive string
    pub level: String,
    pub format: LogFormat,
    /// ANSI colors, honoured only when stderr is a terminal
    pub console: bool,
    pub thread_ids: bool,
    /// Emit file and line of each event
    pub source_location: bool,
}

/// Layout of each log line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// One line per event
    Compact,
    /// Multi-field layout with span context
    Full,
    /// Newline-delimited JSON objects
    Json,
}

/// Crates whose events `-v` and `-vv` turn up; dependencies stay at `warn`
const OWN_TARGETS: &[&str] = &["aihub", "aihub_core"];

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            format: LogFormat::Compact,
            console: true,
            thread_ids: false,
            source_location: false,
        }
    }
}

impl LoggingConfig {
    /// Map `-v` occurrences to a filter
    ///
    /// `-v` and `-vv` raise only this workspace's crates; `-vvv` traces
    /// everything, reqwest and hyper included.
    pub fn from_verbosity(verbosity: u8) -> Self {
        let own_level = match verbosity {
            0 => return Self::default(),
            1 => "info",
            2 => "debug",
            _ => {
                return Self {
                    level: "trace".to_string(),
                    format: LogFormat::Full,
                    source_location: true,
                    thread_ids: true,
                    ..Self::default()
                }
            }
        };

        let directives: Vec<String> = std::iter::once("warn".to_string())
            .chain(OWN_TARGETS.iter().map(|target| format!("{}={}", target, own_level)))
            .collect();

        Self {
            level: directives.join(","),
            source_location: verbosity >= 2,
            ..Self::default()
        }
    }

    /// Apply `RUST_LOG`, `LOG_LEVEL` and `AIHUB_LOG_FORMAT`
    pub fn merge_with_env(&mut self) {
        self.merge_with(|key| std::env::var(key).ok());
    }

    fn merge_with<F>(&mut self, get: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        // RUST_LOG takes precedence over LOG_LEVEL
        if let Some(level) = get("RUST_LOG").or_else(|| get("LOG_LEVEL")) {
            self.level = level.to_lowercase();
        }

        let Some(format) = get("AIHUB_LOG_FORMAT") else {
            return;
        };
        self.format = match format.to_lowercase().as_str() {
            "compact" => LogFormat::Compact,
            "full" | "pretty" => LogFormat::Full,
            "json" => LogFormat::Json,
            other => {
                eprintln!("Warning: unknown AIHUB_LOG_FORMAT '{}', keeping {:?}", other, self.format);
                self.format
            }
        };
    }
}

/// Initialize the global logging system
pub fn init_logging(config: LoggingConfig) -> Result<()> {
    let env_filter = EnvFilter::try_new(&config.level)
        .map_err(|e| Error::config(format!("Invalid log level '{}': {}", config.level, e)))?;
    let ansi = config.console && std::io::stderr().is_terminal();

    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_ids(config.thread_ids)
        .with_file(config.source_location)
        .with_line_number(config.source_location);

    let installed = match config.format {
        LogFormat::Compact => tracing::subscriber::set_global_default(builder.with_ansi(ansi).compact().finish()),
        LogFormat::Full => tracing::subscriber::set_global_default(builder.with_ansi(ansi).finish()),
        LogFormat::Json => tracing::subscriber::set_global_default(builder.with_ansi(false).json().finish()),
    };
    installed.map_err(|e| Error::other(format!("Failed to initialize logging: {}", e)))?;

    let session_id = SESSION_ID.get_or_init(generate_session_id);
    tracing::debug!(session_id = %session_id, config = ?config, "Logging system initialized");

    Ok(())
}

/// Generate a unique ID for this CLI session
pub fn generate_session_id() -> String {
    format!("sess_{}", Uuid::new_v4().simple())
}

/// Get the current session ID
pub fn current_session_id() -> Option<&'static str> {
    SESSION_ID.get().map(|s| s.as_str())
}

/// Create a span with session ID and timing
pub fn create_operation_span(operation: &str, details: Option<&str>) -> Span {
    tracing::info_span!(
        "operation",
        operation = operation,
        session_id = current_session_id().unwrap_or("unknown"),
        details = details.unwrap_or(""),
        duration_ms = field::Empty,
    )
}

/// Scrubbing of API keys and credentials before they reach the log
pub mod redaction {
    use regex::Regex;
    use serde_json::Value;
    use std::sync::OnceLock;

    /// Pattern and replacement, applied in order
    const RULES: &[(&str, &str)] = &[
        (
            r#"(?i)(api[_-]?key|apikey|token|bearer|password)([=:\s]+)['"]?([A-Za-z0-9_.-]{6,})['"]?"#,
            "$1$2***",
        ),
        (r"sk-[A-Za-z0-9_-]{8,}", "sk-***"),
    ];

    /// Object keys whose values are never logged
    const SENSITIVE_KEY_PARTS: &[&str] = &["api_key", "apikey", "password", "secret", "authorization"];

    fn compiled_rules() -> &'static [(Regex, &'static str)] {
        static COMPILED: OnceLock<Vec<(Regex, &'static str)>> = OnceLock::new();
        COMPILED.get_or_init(|| {
            RULES
                .iter()
                .filter_map(|(pattern, replacement)| Regex::new(pattern).ok().map(|re| (re, *replacement)))
                .collect()
        })
    }

    /// Mask key-like substrings of free text
    pub fn redact_sensitive(input: &str) -> String {
        compiled_rules()
            .iter()
            .fold(input.to_string(), |text, (regex, replacement)| {
                regex.replace_all(&text, *replacement).into_owned()
            })
    }

    /// Mask sensitive fields and key-like strings anywhere in a JSON tree
    pub fn redact_json_value(value: &mut Value) {
        match value {
            Value::Object(fields) => {
                for (key, field) in fields.iter_mut() {
                    if is_sensitive_key(key) {
                        *field = Value::String("***".to_string());
                    } else {
                        redact_json_value(field);
                    }
                }
            }
            Value::Array(items) => items.iter_mut().for_each(redact_json_value),
            Value::String(text) => *text = redact_sensitive(text),
            _ => {}
        }
    }

    fn is_sensitive_key(key: &str) -> bool {
        let key = key.to_lowercase();
        key.ends_with("token") || SENSITIVE_KEY_PARTS.iter().any(|part| key.contains(part))
    }
}

/// Wall-clock timing of CLI operations
pub mod timing {
    use std::time::Instant;
    use tracing::Span;

    /// Records `duration_ms` on its operation span when dropped
    pub struct Timer {
        started: Instant,
        span: Span,
    }

    impl Timer {
        pub fn new(operation: &str) -> Self {
            Self::start(operation, None)
        }

        pub fn with_details(operation: &str, details: &str) -> Self {
            Self::start(operation, Some(details))
        }

        fn start(operation: &str, details: Option<&str>) -> Self {
            Self {
                started: Instant::now(),
                span: super::create_operation_span(operation, details),
            }
        }
    }

    impl Drop for Timer {
        fn drop(&mut self) {
            let millis = u64::try_from(self.started.elapsed().as_millis()).unwrap_or(u64::MAX);
            self.span.record("duration_ms", millis);
            self.span.in_scope(|| tracing::debug!(duration_ms = millis, "Operation finished"));
        }
    }
}

//! Configuration management for the CLI
//!
//! This module handles loading and merging configuration from:
//! - Default values
//! - Configuration files (YAML/JSON)
//! - A `.env` file in the working directory
//! - Environment variables

use crate::error::{Error, Result};
use aihub_core::config::{
    DEFAULT_BACKOFF_FACTOR, DEFAULT_BASE_URL, DEFAULT_MAX_REQUESTS_PER_SECOND, DEFAULT_MAX_RETRIES,
    DEFAULT_TIMEOUT,
};
use aihub_core::http::auth::redact_key;
use aihub_core::{ClientConfig, DEFAULT_CHAT_MODEL, DEFAULT_COMPLETION_MODEL};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// API connection settings
    pub api: ApiConfig,

    /// Defaults for the chat and completion commands
    pub defaults: DefaultsConfig,
}

/// API connection settings
#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// API key; usually supplied through `OPENAI_API_KEY`
    pub api_key: Option<String>,

    /// API origin
    pub base_url: String,

    /// Per-attempt timeout in seconds
    pub timeout: f64,

    /// Retries after the first attempt
    pub max_retries: u32,

    /// Backoff factor in seconds
    pub backoff_factor: f64,

    /// Client-side request rate
    pub max_requests_per_second: f64,
}

/// Command defaults
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DefaultsConfig {
    /// Model used by `chat` and `interactive`
    pub chat_model: String,

    /// Model used by `complete`
    pub completion_model: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT.as_secs_f64(),
            max_retries: DEFAULT_MAX_RETRIES,
            backoff_factor: DEFAULT_BACKOFF_FACTOR.as_secs_f64(),
            max_requests_per_second: DEFAULT_MAX_REQUESTS_PER_SECOND,
        }
    }
}

impl fmt::Debug for ApiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiConfig")
            .field("api_key", &self.api_key.as_deref().map(redact_key))
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .field("max_retries", &self.max_retries)
            .field("backoff_factor", &self.backoff_factor)
            .field("max_requests_per_second", &self.max_requests_per_second)
            .finish()
    }
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            chat_model: DEFAULT_CHAT_MODEL.to_string(),
            completion_model: DEFAULT_COMPLETION_MODEL.to_string(),
        }
    }
}

impl Config {
    /// Load configuration from a file
    pub fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::FileNotFound {
                path: path.to_path_buf(),
            });
        }

        let content = std::fs::read_to_string(path)?;

        let config = if is_yaml(path) {
            serde_yaml::from_str(&content).map_err(|_| Error::InvalidFormat {
                path: path.to_path_buf(),
                expected: "YAML".to_string(),
            })?
        } else {
            serde_json::from_str(&content).map_err(|_| Error::InvalidFormat {
                path: path.to_path_buf(),
                expected: "JSON".to_string(),
            })?
        };

        Ok(config)
    }

    /// Load the first configuration file found in the default locations
    pub fn load_default_file() -> Result<Self> {
        for path in Self::default_config_paths() {
            if path.exists() {
                match Self::from_file(&path) {
                    Ok(config) => {
                        tracing::debug!(path = %path.display(), "Loaded configuration file");
                        return Ok(config);
                    }
                    Err(e) => {
                        tracing::warn!(path = %path.display(), error = %e, "Failed to load configuration file");
                    }
                }
            }
        }

        Ok(Self::default())
    }

    /// Load configuration: file (explicit or default locations), then `.env`,
    /// then the process environment
    pub fn load(file: Option<&Path>) -> Result<Self> {
        let mut config = match file {
            Some(path) => Self::from_file(path)?,
            None => Self::load_default_file()?,
        };

        // Variables already set in the environment win over the .env file
        if let Ok(path) = dotenv::dotenv() {
            tracing::debug!(path = %path.display(), "Loaded .env file");
        }

        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Configuration file locations, in search order
    pub fn default_config_paths() -> Vec<PathBuf> {
        let mut paths = vec![
            PathBuf::from(".aihub.yaml"),
            PathBuf::from(".aihub.json"),
            PathBuf::from("aihub.yaml"),
            PathBuf::from("aihub.json"),
        ];

        if let Some(config_dir) = dirs::config_dir() {
            let aihub_dir = config_dir.join("aihub");
            paths.push(aihub_dir.join("config.yaml"));
            paths.push(aihub_dir.join("config.json"));
        }

        if let Some(home_dir) = dirs::home_dir() {
            paths.push(home_dir.join(".aihub.yaml"));
            paths.push(home_dir.join(".aihub.json"));
        }

        paths
    }

    /// Override settings from `OPENAI_*` environment variables
    pub fn apply_env<F>(&mut self, get: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| get(key).filter(|value| !value.trim().is_empty());

        if let Some(key) = get("OPENAI_API_KEY") {
            self.api.api_key = Some(key);
        }
        if let Some(url) = get("OPENAI_BASE_URL") {
            self.api.base_url = url;
        }
        if let Some(value) = get("OPENAI_TIMEOUT") {
            self.api.timeout = parse_env("OPENAI_TIMEOUT", &value)?;
        }
        if let Some(value) = get("OPENAI_MAX_RETRIES") {
            self.api.max_retries = parse_env("OPENAI_MAX_RETRIES", &value)?;
        }
        if let Some(value) = get("OPENAI_BACKOFF_FACTOR") {
            self.api.backoff_factor = parse_env("OPENAI_BACKOFF_FACTOR", &value)?;
        }
        if let Some(value) = get("OPENAI_MAX_RPS") {
            self.api.max_requests_per_second = parse_env("OPENAI_MAX_RPS", &value)?;
        }

        Ok(())
    }

    /// Build the client configuration, checking every value
    pub fn to_client_config(&self) -> Result<ClientConfig> {
        let api_key = self
            .api
            .api_key
            .clone()
            .filter(|key| !key.trim().is_empty())
            .ok_or(Error::ApiKeyMissing)?;

        let client_config = ClientConfig::new(api_key)
            .with_base_url(self.api.base_url.clone())
            .with_timeout(seconds("timeout", self.api.timeout)?)
            .with_max_retries(self.api.max_retries)
            .with_backoff_factor(seconds("backoff_factor", self.api.backoff_factor)?)
            .with_max_requests_per_second(self.api.max_requests_per_second);

        client_config.validate()?;
        Ok(client_config)
    }

    /// Copy safe to print: the API key is masked
    pub fn redacted(&self) -> Self {
        let mut copy = self.clone();
        copy.api.api_key = self.api.api_key.as_deref().map(redact_key);
        copy
    }
}

fn is_yaml(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|s| s.to_str()),
        Some("yaml") | Some("yml")
    )
}

fn parse_env<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| Error::config(format!("{} has an invalid value: '{}'", key, value)))
}

fn seconds(field: &str, value: f64) -> Result<Duration> {
    Duration::try_from_secs_f64(value)
        .map_err(|_| Error::config(format!("{} must be a non-negative number of seconds, got {}", field, value)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::tempdir;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.api.base_url, "https://api.openai.com/v1");
        assert_eq!(config.api.timeout, 10.0);
        assert_eq!(config.api.max_retries, 2);
        assert_eq!(config.api.backoff_factor, 0.01);
        assert_eq!(config.api.max_requests_per_second, 3.0);
        assert_eq!(config.defaults.chat_model, "gpt-3.5-turbo");
        assert_eq!(config.defaults.completion_model, "gpt-3.5-turbo-instruct");
    }

    #[test]
    fn test_env_overrides() {
        let vars = env(&[
            ("OPENAI_API_KEY", "sk-from-env"),
            ("OPENAI_BASE_URL", "http://localhost:8080/v1"),
            ("OPENAI_TIMEOUT", "2.5"),
            ("OPENAI_MAX_RETRIES", "5"),
            ("OPENAI_BACKOFF_FACTOR", "0.5"),
            ("OPENAI_MAX_RPS", "10"),
        ]);
        let mut config = Config::default();
        config.apply_env(|key| vars.get(key).cloned()).unwrap();

        let client = config.to_client_config().unwrap();
        assert_eq!(client.api_key, "sk-from-env");
        assert_eq!(client.base_url, "http://localhost:8080/v1");
        assert_eq!(client.timeout, Duration::from_millis(2500));
        assert_eq!(client.max_retries, 5);
        assert_eq!(client.backoff_factor, Duration::from_millis(500));
        assert_eq!(client.max_requests_per_second, 10.0);
    }

    #[test]
    fn test_invalid_env_value() {
        let vars = env(&[("OPENAI_MAX_RETRIES", "many")]);
        let mut config = Config::default();
        let err = config.apply_env(|key| vars.get(key).cloned()).unwrap_err();
        assert!(err.to_string().contains("OPENAI_MAX_RETRIES"));
    }

    #[test]
    fn test_blank_env_values_ignored() {
        let vars = env(&[("OPENAI_API_KEY", "  ")]);
        let mut config = Config::default();
        config.api.api_key = Some("sk-from-file".to_string());
        config.apply_env(|key| vars.get(key).cloned()).unwrap();
        assert_eq!(config.api.api_key.as_deref(), Some("sk-from-file"));
    }

    #[test]
    fn test_missing_api_key() {
        assert!(matches!(
            Config::default().to_client_config(),
            Err(Error::ApiKeyMissing)
        ));
    }

    #[test]
    fn test_invalid_values_rejected() {
        let mut config = Config::default();
        config.api.api_key = Some("sk-test".to_string());
        config.api.max_requests_per_second = 0.0;
        assert!(matches!(config.to_client_config(), Err(Error::Core(_))));

        let mut config = Config::default();
        config.api.api_key = Some("sk-test".to_string());
        config.api.timeout = -1.0;
        assert!(matches!(config.to_client_config(), Err(Error::Config(_))));
    }

    #[test]
    fn test_yaml_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("aihub.yaml");
        std::fs::write(
            &path,
            "api:\n  base_url: https://proxy.example.com/v1\n  max_retries: 4\ndefaults:\n  chat_model: gpt-4\n",
        )
        .unwrap();

        let config = Config::from_file(&path).unwrap();
        assert_eq!(config.api.base_url, "https://proxy.example.com/v1");
        assert_eq!(config.api.max_retries, 4);
        assert_eq!(config.api.timeout, 10.0);
        assert_eq!(config.defaults.chat_model, "gpt-4");
        assert_eq!(config.defaults.completion_model, "gpt-3.5-turbo-instruct");
    }

    #[test]
    fn test_json_file_and_errors() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("aihub.json");
        std::fs::write(&path, r#"{"api": {"max_requests_per_second": 1.5}}"#).unwrap();
        assert_eq!(Config::from_file(&path).unwrap().api.max_requests_per_second, 1.5);

        std::fs::write(&path, "not json").unwrap();
        assert!(matches!(Config::from_file(&path), Err(Error::InvalidFormat { .. })));

        let missing = dir.path().join("missing.yaml");
        assert!(matches!(Config::from_file(&missing), Err(Error::FileNotFound { .. })));
    }

    #[test]
    fn test_redacted_copy() {
        let mut config = Config::default();
        config.api.api_key = Some("sk-abcdefghijklmnop".to_string());

        let redacted = config.redacted();
        assert_eq!(redacted.api.api_key.as_deref(), Some("sk-ab...[REDACTED]"));
        assert!(!format!("{:?}", config).contains("abcdefghijklmnop"));
    }
}

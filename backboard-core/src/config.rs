//! Configuration loading and management
//!
//! Configuration is loaded from `~/.config/backboard/config.toml`, then
//! environment overrides are applied:
//!
//! | Variable | Overrides |
//! |----------|-----------|
//! | `BACKBOARD_API_URL` | `backend.api_url` |
//! | `BACKBOARD_CLIENT_ID` | `backend.client_id` |
//!
//! This module follows the XDG Base Directory Specification:
//! - Config: `$XDG_CONFIG_HOME/backboard/` (~/.config/backboard/)
//! - State/Logs: `$XDG_STATE_HOME/backboard/` (~/.local/state/backboard/)

use crate::error::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Environment variable overriding `backend.api_url`
pub const API_URL_ENV: &str = "BACKBOARD_API_URL";

/// Environment variable overriding `backend.client_id`
pub const CLIENT_ID_ENV: &str = "BACKBOARD_CLIENT_ID";

/// Returns a best-effort home directory path.
fn home_dir() -> PathBuf {
    std::env::var_os("HOME")
        .map(PathBuf::from)
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Returns XDG_CONFIG_HOME or ~/.config
fn xdg_config_home() -> PathBuf {
    std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".config"))
}

/// Returns XDG_STATE_HOME or ~/.local/state
fn xdg_state_home() -> PathBuf {
    std::env::var("XDG_STATE_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".local/state"))
}

/// Main configuration struct
#[derive(Debug, Deserialize, Default, Clone)]
pub struct Config {
    /// Backend connection settings
    #[serde(default)]
    pub backend: BackendConfig,

    /// Source classifier settings
    #[serde(default)]
    pub classifier: ClassifierConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Backboard backend connection settings
#[derive(Debug, Deserialize, Clone)]
pub struct BackendConfig {
    /// Base URL of the backend (e.g., `http://localhost:8000`)
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Client identifier registered with the backend
    #[serde(default = "default_client_id")]
    pub client_id: String,

    /// HTTP request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            client_id: default_client_id(),
            timeout_secs: default_timeout(),
        }
    }
}

impl BackendConfig {
    /// Validate configuration, returning error message if invalid
    pub fn validate(&self) -> Result<()> {
        if self.api_url.trim().is_empty() {
            return Err(Error::Config("backend.api_url must not be empty".to_string()));
        }
        if !self.api_url.starts_with("http://") && !self.api_url.starts_with("https://") {
            return Err(Error::Config(format!(
                "backend.api_url must be an http(s) URL, got {:?}",
                self.api_url
            )));
        }
        if self.client_id.trim().is_empty() {
            return Err(Error::Config(
                "backend.client_id must not be empty".to_string(),
            ));
        }
        if self.timeout_secs == 0 {
            return Err(Error::Config(
                "backend.timeout_secs must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

fn default_api_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_client_id() -> String {
    "default_user".to_string()
}

fn default_timeout() -> u64 {
    30
}

/// Source classifier configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ClassifierConfig {
    /// First names of team members; an `@mention` plus one of these marks a chat transcript
    #[serde(default = "default_team_members")]
    pub team_members: Vec<String>,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            team_members: default_team_members(),
        }
    }
}

/// Built-in roster used when config.toml does not name one
pub fn default_team_members() -> Vec<String> {
    ["karan", "alex", "sarah", "mike", "priya", "jordan"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

/// Logging configuration
#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Maximum number of log files to keep
    #[serde(default = "default_max_log_files")]
    pub max_files: usize,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            max_files: default_max_log_files(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_max_log_files() -> usize {
    5
}

impl Config {
    /// Load configuration from the default path and apply environment overrides
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path();

        let mut config = if config_path.exists() {
            Self::load_from(&config_path)?
        } else {
            tracing::info!("No config file found at {:?}, using defaults", config_path);
            Config::default()
        };

        config.apply_env_overrides();
        Ok(config)
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("failed to read config file {:?}: {}", path, e)))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("failed to parse config: {}", e)))?;

        Ok(config)
    }

    /// Apply `BACKBOARD_API_URL` / `BACKBOARD_CLIENT_ID` on top of file values
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(
            std::env::var(API_URL_ENV).ok(),
            std::env::var(CLIENT_ID_ENV).ok(),
        );
    }

    /// Apply explicit overrides; blank values are ignored
    pub fn apply_overrides(&mut self, api_url: Option<String>, client_id: Option<String>) {
        if let Some(url) = api_url.filter(|v| !v.trim().is_empty()) {
            tracing::debug!(api_url = %url, "Overriding backend.api_url");
            self.backend.api_url = url;
        }
        if let Some(id) = client_id.filter(|v| !v.trim().is_empty()) {
            tracing::debug!(client_id = %id, "Overriding backend.client_id");
            self.backend.client_id = id;
        }
    }

    /// Returns the default config file path
    ///
    /// `$XDG_CONFIG_HOME/backboard/config.toml` (~/.config/backboard/config.toml)
    pub fn config_path() -> PathBuf {
        xdg_config_home().join("backboard").join("config.toml")
    }

    /// Returns the state directory path (for logs)
    ///
    /// `$XDG_STATE_HOME/backboard/` (~/.local/state/backboard/)
    pub fn state_dir() -> PathBuf {
        xdg_state_home().join("backboard")
    }

    /// Returns the log file path
    ///
    /// `$XDG_STATE_HOME/backboard/backboard.log` (~/.local/state/backboard/backboard.log)
    pub fn log_path() -> PathBuf {
        Self::state_dir().join("backboard.log")
    }
}

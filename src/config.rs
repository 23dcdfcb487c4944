//! Application configuration.
//!
//! Configuration is loaded from a TOML file at:
//! 1. `$MAILSCOPE_CONFIG` (environment variable)
//! 2. `~/.config/mailscope/config.toml` (Linux/macOS)
//!    `%APPDATA%\mailscope\config.toml` (Windows)
//! 3. Built-in defaults
//!
//! Command-line flags take precedence over every value here.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::export::text::ReportOptions;
use crate::imap::fetch::DEFAULT_BUFFER_CAPACITY;
use crate::imap::session::DEFAULT_PORT;

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General behavior settings.
    pub general: GeneralConfig,
    /// Server defaults.
    pub server: ServerConfig,
    /// Fetch tuning.
    pub fetch: FetchConfig,
    /// Report layout.
    pub report: ReportConfig,
}

/// General behavior settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log level: "error", "warn", "info", "debug", "trace".
    pub log_level: String,
    /// `strftime` format string for the date column.
    pub date_format: String,
    /// Override cache directory for logs.
    pub cache_dir: Option<PathBuf>,
}

/// Server defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Port used when the server address has none.
    pub default_port: u16,
    /// Mailbox to examine.
    pub mailbox: String,
}

/// Fetch tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Messages buffered between the network reader and the report builder.
    pub buffer_capacity: usize,
}

/// Report layout.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// Output format: "tsv" or "json".
    pub format: String,
    /// Separator between attachment names.
    pub name_separator: String,
}

// ── Default implementations ─────────────────────────────────────

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "warn".to_string(),
            date_format: ReportOptions::default().date_format,
            cache_dir: None,
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            default_port: DEFAULT_PORT,
            mailbox: "INBOX".to_string(),
        }
    }
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            buffer_capacity: DEFAULT_BUFFER_CAPACITY,
        }
    }
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            format: "tsv".to_string(),
            name_separator: ReportOptions::default().name_separator,
        }
    }
}

impl Config {
    /// Report options derived from the `[general]` and `[report]` sections.
    pub fn report_options(&self) -> ReportOptions {
        ReportOptions {
            date_format: self.general.date_format.clone(),
            name_separator: self.report.name_separator.clone(),
        }
    }
}

// ── Load ────────────────────────────────────────────────────────

/// Load configuration, searching standard locations.
///
/// Returns the default configuration if no file is found or on parse error.
pub fn load_config() -> Config {
    match config_file_path() {
        Some(path) if path.exists() => load_config_from(&path),
        _ => Config::default(),
    }
}

/// Load configuration from `path`, falling back to defaults on any error.
pub fn load_config_from(path: &Path) -> Config {
    match std::fs::read_to_string(path) {
        Ok(contents) => match toml::from_str::<Config>(&contents) {
            Ok(cfg) => {
                tracing::info!(path = %path.display(), "Loaded config");
                cfg
            }
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "Failed to parse config, using defaults"
                );
                Config::default()
            }
        },
        Err(e) => {
            tracing::warn!(
                path = %path.display(),
                error = %e,
                "Failed to read config file, using defaults"
            );
            Config::default()
        }
    }
}

/// Determine the config file path (checking env var first, then standard dirs).
pub fn config_file_path() -> Option<PathBuf> {
    if let Ok(env_path) = std::env::var("MAILSCOPE_CONFIG") {
        return Some(PathBuf::from(env_path));
    }
    dirs::config_dir().map(|d| d.join("mailscope").join("config.toml"))
}

/// Return the cache directory for logs.
pub fn cache_dir(config: &Config) -> PathBuf {
    if let Some(ref dir) = config.general.cache_dir {
        return dir.clone();
    }
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("mailscope")
}

/// Return the log file path.
pub fn log_file_path(config: &Config) -> PathBuf {
    cache_dir(config).join("mailscope.log")
}

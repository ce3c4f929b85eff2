//! Configuration file schema.
//!
//! Every section is optional and unknown keys are rejected at every level.

use std::path::PathBuf;

use serde::Deserialize;

use crate::error::ConfigError;
use crate::mcp::protocol::DEFAULT_SERVER_NAME;

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// The whole configuration file.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Optional JSON schema reference (ignored during parsing).
    #[serde(rename = "$schema", default)]
    _schema: Option<String>,

    /// Optional comment field (ignored during parsing).
    #[serde(rename = "_comment", default)]
    _comment: Option<String>,

    /// Name reported to clients in `serverInfo`.
    #[serde(default = "default_server_name")]
    pub server_name: String,

    /// Notes resource settings.
    #[serde(default)]
    pub notes: NotesConfig,

    /// Task store settings.
    #[serde(default)]
    pub tasks: TasksConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            _schema: None,
            _comment: None,
            server_name: default_server_name(),
            notes: NotesConfig::default(),
            tasks: TasksConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Config {
    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any validation checks fail.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server_name.trim().is_empty() {
            return Err(ConfigError::ValidationError {
                message: "server_name must not be blank".to_string(),
            });
        }

        if self.notes.dir.as_os_str().is_empty() {
            return Err(ConfigError::ValidationError {
                message: "notes.dir must not be empty".to_string(),
            });
        }

        let level = self.logging.level.to_lowercase();
        if !LOG_LEVELS.contains(&level.as_str()) {
            return Err(ConfigError::ValidationError {
                message: format!(
                    "Invalid log level '{}'. Must be one of: {}",
                    self.logging.level,
                    LOG_LEVELS.join(", ")
                ),
            });
        }

        Ok(())
    }
}

fn default_server_name() -> String {
    DEFAULT_SERVER_NAME.to_string()
}

/// Notes resource configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NotesConfig {
    /// Directory whose `*.md` files are exposed as resources.
    /// Default: "notes"
    #[serde(default = "default_notes_dir")]
    pub dir: PathBuf,

    /// Write the sample notes into `dir` at startup if they are missing.
    #[serde(default = "default_true")]
    pub seed_samples: bool,
}

impl Default for NotesConfig {
    fn default() -> Self {
        Self {
            dir: default_notes_dir(),
            seed_samples: default_true(),
        }
    }
}

fn default_notes_dir() -> PathBuf {
    PathBuf::from("notes")
}

const fn default_true() -> bool {
    true
}

/// Task store configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TasksConfig {
    /// Start with the three sample tasks instead of an empty store.
    #[serde(default)]
    pub seed_samples: bool,
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "warn".to_string()
}

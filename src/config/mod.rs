//! Server configuration.
//!
//! Everything here is optional: with no file at all the server starts with
//! [`Config::default`]. A file is looked up in this order:
//!
//! 1. the `--config` path, which must exist;
//! 2. `~/.mcp-learning-server/config.json` (`%USERPROFILE%` on Windows),
//!    used only if present.
//!
//! `config/example-config.json` lists every field with its default.

mod settings;

pub use settings::{Config, LoggingConfig, NotesConfig, TasksConfig};

use std::path::{Path, PathBuf};

use crate::error::ConfigError;

/// Directory holding the user's configuration, under their home directory.
///
/// - **Linux/macOS:** `~/.mcp-learning-server/`
/// - **Windows:** `%USERPROFILE%\.mcp-learning-server\`
#[must_use]
pub fn default_config_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|p| p.join(".mcp-learning-server"))
}

/// Path of the configuration file read when `--config` is not given.
#[must_use]
pub fn default_config_path() -> Option<PathBuf> {
    default_config_dir().map(|p| p.join("config.json"))
}

/// Loads, parses and validates the configuration.
///
/// # Errors
///
/// Returns [`ConfigError::NotFound`] for an explicit `path` that does not
/// exist, and a read, parse or validation error for a file that exists but
/// cannot be used.
pub fn load_config(path: Option<&Path>) -> Result<Config, ConfigError> {
    let file = match path {
        Some(p) if !p.exists() => {
            return Err(ConfigError::NotFound {
                path: p.to_path_buf(),
            })
        }
        Some(p) => p.to_path_buf(),
        None => match default_config_path().filter(|p| p.exists()) {
            Some(p) => p,
            None => return Ok(Config::default()),
        },
    };

    let text = std::fs::read_to_string(&file).map_err(|e| ConfigError::ReadError {
        path: file.clone(),
        source: e,
    })?;
    let config: Config = serde_json::from_str(&text)
        .map_err(|e| ConfigError::ParseError { path: file, source: e })?;

    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_dir_exists() {
        assert!(default_config_dir().is_some());
    }

    #[test]
    fn default_config_path_exists() {
        let path = default_config_path();
        assert!(path.is_some());
        assert!(path.unwrap().to_string_lossy().contains("config.json"));
    }

    #[test]
    fn explicit_missing_path_is_an_error() {
        let temp = tempfile::tempdir().unwrap();
        let missing = temp.path().join("nope.json");
        assert!(matches!(
            load_config(Some(&missing)),
            Err(ConfigError::NotFound { .. })
        ));
    }

    #[test]
    fn explicit_path_is_parsed_and_validated() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("config.json");

        std::fs::write(&path, r#"{"server_name": "lab"}"#).unwrap();
        assert_eq!(load_config(Some(&path)).unwrap().server_name, "lab");

        std::fs::write(&path, r#"{"logging": {"level": "chatty"}}"#).unwrap();
        assert!(matches!(
            load_config(Some(&path)),
            Err(ConfigError::ValidationError { .. })
        ));

        std::fs::write(&path, "{ not json").unwrap();
        assert!(matches!(
            load_config(Some(&path)),
            Err(ConfigError::ParseError { .. })
        ));
    }
}

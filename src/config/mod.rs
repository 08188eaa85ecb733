//! Configuration file loading and parsing.
//!
//! This module handles loading the optional configuration file from disk,
//! applying environment/CLI overrides, and validating the result.
//!
//! # Configuration Sources
//!
//! Settings are resolved in the following order (later wins):
//!
//! 1. Built-in defaults (local CodeMenu API at `http://127.0.0.1:1300/v1`)
//! 2. The configuration file, if any:
//!    - Path given on the command line, or
//!    - **Linux/macOS:** `~/.codemenu-mcp/config.json`
//!    - **Windows:** `%USERPROFILE%\.codemenu-mcp\config.json`
//! 3. `CODEMENU_API_URL` / `CODEMENU_API_KEY` (or `--api-url` / `--api-key`)
//!
//! A missing default configuration file is not an error. A missing file that
//! was named explicitly is.

mod settings;

pub use settings::{ApiConfig, Config, LoggingConfig, ToolsConfig, DEFAULT_API_URL};

use std::path::{Path, PathBuf};

use crate::error::ConfigError;

/// Values that take precedence over the configuration file.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    /// Replacement for `api.base_url`.
    pub api_url: Option<String>,
    /// Replacement for `api.api_key`. An empty string clears the key.
    pub api_key: Option<String>,
}

/// Returns the default configuration directory.
///
/// - **Linux/macOS:** `~/.codemenu-mcp/`
/// - **Windows:** `%USERPROFILE%\.codemenu-mcp\`
#[must_use]
pub fn default_config_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|p| p.join(".codemenu-mcp"))
}

/// Returns the platform-specific default configuration file path.
#[must_use]
pub fn default_config_path() -> Option<PathBuf> {
    default_config_dir().map(|p| p.join("config.json"))
}

/// Loads the configuration, applies overrides and validates the result.
///
/// If `path` is `None`, uses the platform-specific default location when a
/// file exists there, and built-in defaults otherwise.
///
/// # Errors
///
/// Returns an error if:
/// - An explicitly named configuration file cannot be found
/// - The file cannot be read
/// - The JSON is malformed
/// - The resolved settings are invalid
pub fn load_config(path: Option<&Path>, overrides: &Overrides) -> Result<Config, ConfigError> {
    let mut config = match path {
        Some(p) => read_config_file(p)?,
        None => match default_config_path() {
            Some(p) if p.exists() => read_config_file(&p)?,
            _ => Config::default(),
        },
    };

    apply_overrides(&mut config, overrides);

    // Validate the configuration
    config.validate()?;

    Ok(config)
}

fn read_config_file(config_path: &Path) -> Result<Config, ConfigError> {
    if !config_path.exists() {
        return Err(ConfigError::NotFound {
            path: config_path.to_path_buf(),
        });
    }

    let contents = std::fs::read_to_string(config_path).map_err(|e| ConfigError::ReadError {
        path: config_path.to_path_buf(),
        source: e,
    })?;

    serde_json::from_str(&contents).map_err(|e| ConfigError::ParseError {
        path: config_path.to_path_buf(),
        source: e,
    })
}

fn apply_overrides(config: &mut Config, overrides: &Overrides) {
    if let Some(url) = overrides.api_url.as_deref().filter(|u| !u.is_empty()) {
        config.api.base_url = url.to_string();
    }
    if let Some(key) = &overrides.api_key {
        config.api.api_key = Some(key.clone()).filter(|k| !k.is_empty());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::io::Write;

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
    fn explicit_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.json");
        let result = load_config(Some(&missing), &Overrides::default());
        assert!(matches!(result, Err(ConfigError::NotFound { .. })));
    }

    #[test]
    fn load_file_then_override() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{ "api": {{ "base_url": "http://10.0.0.5:1300/v1", "api_key": "from-file" }} }}"#
        )
        .unwrap();

        let config = load_config(Some(file.path()), &Overrides::default()).unwrap();
        assert_eq!(config.api.base_url, "http://10.0.0.5:1300/v1");
        assert_eq!(config.api.api_key.as_deref(), Some("from-file"));

        let overrides = Overrides {
            api_url: Some("http://localhost:9000/v1".to_string()),
            api_key: Some(String::new()),
        };
        let config = load_config(Some(file.path()), &overrides).unwrap();
        assert_eq!(config.api.base_url, "http://localhost:9000/v1");
        assert!(config.api.api_key.is_none());
    }

    #[test]
    fn malformed_file_is_a_parse_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{ not json").unwrap();

        let result = load_config(Some(file.path()), &Overrides::default());
        assert!(matches!(result, Err(ConfigError::ParseError { .. })));
    }

    #[test]
    fn invalid_override_url_fails_validation() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{}}").unwrap();

        let overrides = Overrides {
            api_url: Some("not a url".to_string()),
            api_key: None,
        };
        let result = load_config(Some(file.path()), &overrides);
        assert!(matches!(result, Err(ConfigError::InvalidBaseUrl { .. })));
    }
}

//! Configuration structures for deserialisation.
//!
//! These structures map directly to the JSON configuration file format.

use serde::Deserialize;
use url::Url;

use crate::codemenu::{AuthScheme, ClientSettings, SnippetLookup};
use crate::error::ConfigError;

/// Default CodeMenu API endpoint (the local server CodeMenu starts when its API is enabled).
pub const DEFAULT_API_URL: &str = "http://127.0.0.1:1300/v1";

/// Root configuration structure.
///
/// This is the top-level structure that matches the JSON config file.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Optional JSON schema reference (ignored during parsing).
    #[serde(rename = "$schema", default)]
    _schema: Option<String>,

    /// Optional comment field (ignored during parsing).
    #[serde(rename = "_comment", default)]
    _comment: Option<String>,

    /// CodeMenu API connection settings.
    #[serde(default)]
    pub api: ApiConfig,

    /// Tool exposure settings.
    #[serde(default)]
    pub tools: ToolsConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any validation checks fail.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.api.parse_base_url()?;

        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.to_lowercase().as_str()) {
            return Err(ConfigError::ValidationError {
                message: format!(
                    "Invalid log level '{}'. Must be one of: {}",
                    self.logging.level,
                    valid_levels.join(", ")
                ),
            });
        }

        Ok(())
    }
}

/// CodeMenu API configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ApiConfig {
    /// Base URL of the CodeMenu API, including the version prefix.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// API key, if the CodeMenu API requires one.
    #[serde(default)]
    pub api_key: Option<String>,

    /// How the API key is sent.
    #[serde(default)]
    pub auth: AuthScheme,

    /// How `get_snippet` finds a single snippet.
    #[serde(default)]
    pub snippet_lookup: SnippetLookup,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_key: None,
            auth: AuthScheme::default(),
            snippet_lookup: SnippetLookup::default(),
        }
    }
}

impl ApiConfig {
    /// Parses and checks the base URL.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidBaseUrl`] if the URL is not an absolute
    /// `http`/`https` URL that endpoint paths can be appended to.
    pub fn parse_base_url(&self) -> Result<Url, ConfigError> {
        let invalid = |reason: &str| ConfigError::InvalidBaseUrl {
            url: self.base_url.clone(),
            reason: reason.to_string(),
        };

        let url = Url::parse(&self.base_url).map_err(|e| invalid(&e.to_string()))?;

        if !matches!(url.scheme(), "http" | "https") {
            return Err(invalid("scheme must be http or https"));
        }
        if url.cannot_be_a_base() {
            return Err(invalid("URL cannot be used as a base"));
        }
        if url.query().is_some() || url.fragment().is_some() {
            return Err(invalid("URL must not contain a query string or fragment"));
        }

        Ok(url)
    }

    /// Builds the settings the CodeMenu client is constructed from.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL is invalid.
    pub fn client_settings(&self) -> Result<ClientSettings, ConfigError> {
        Ok(ClientSettings {
            base_url: self.parse_base_url()?,
            api_key: self.api_key.clone().filter(|k| !k.is_empty()),
            auth: self.auth,
            snippet_lookup: self.snippet_lookup,
        })
    }
}

fn default_base_url() -> String {
    DEFAULT_API_URL.to_string()
}

/// Tool exposure configuration.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ToolsConfig {
    /// Advertise and accept `create_snippet`, `update_snippet` and `delete_snippet`.
    #[serde(default)]
    pub allow_mutations: bool,

    /// Replace snippet code with its length in `list_snippets` results.
    #[serde(default = "default_true")]
    pub summarize_listings: bool,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            allow_mutations: false,
            summarize_listings: default_true(),
        }
    }
}

const fn default_true() -> bool {
    true
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

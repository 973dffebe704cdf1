use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::warn;
use url::Url;

use crate::engine::UnknownUpdatePolicy;
use crate::provider::Provider;

pub const DEFAULT_API_URL: &str = "http://localhost:8000";
pub const DEFAULT_MAX_TOKENS: u32 = 500;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_COMPLETION_TIMEOUT_SECS: u64 = 60;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("could not determine config directory")]
    NoConfigDir,
    #[error("failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("invalid URL for {0}: {1}")]
    InvalidUrl(String, String),
    #[error("unknown completion provider '{0}' (expected one of: {1})")]
    UnknownProvider(String, String),
    #[error("failed to build HTTP client: {0}")]
    Client(#[from] crate::error::TransportError),
}

/// Settings persisted in `config.json`. Every field is optional; accessors
/// fall back to built-in defaults.
///
/// The `Debug` implementation redacts `completion_token`.
#[derive(Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct Config {
    pub api_url: Option<String>,
    pub completion_provider: Option<String>,
    pub completion_url: Option<String>,
    pub completion_model: Option<String>,
    pub completion_token: Option<String>,
    pub completion_max_tokens: Option<u32>,
    pub request_timeout_secs: Option<u64>,
    pub completion_timeout_secs: Option<u64>,
    pub unknown_update_policy: Option<UnknownUpdatePolicy>,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("api_url", &self.api_url)
            .field("completion_provider", &self.completion_provider)
            .field("completion_url", &self.completion_url)
            .field("completion_model", &self.completion_model)
            .field(
                "completion_token",
                &self.completion_token.as_ref().map(|_| "[REDACTED]"),
            )
            .field("completion_max_tokens", &self.completion_max_tokens)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("completion_timeout_secs", &self.completion_timeout_secs)
            .field("unknown_update_policy", &self.unknown_update_policy)
            .finish()
    }
}

impl Config {
    pub fn new() -> Self {
        Self {
            api_url: Some(DEFAULT_API_URL.to_string()),
            completion_provider: Some(Provider::default().as_str().to_string()),
            ..Self::default()
        }
    }

    /// Load the config file (if any), then let environment variables win.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::load_from(&Self::get_config_path()?)?;
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::new());
        }

        let config_content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&config_content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::get_config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let io_err = |source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        };

        // Create config directory if it doesn't exist
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(io_err)?;
        }

        let config_content = serde_json::to_string_pretty(self).map_err(|source| {
            ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            }
        })?;
        fs::write(path, config_content).map_err(io_err)
    }

    /// Overlay environment variables on top of the file values.
    ///
    /// `lookup` is `std::env::var` in production; tests pass a map.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = non_empty("ASKTRACKER_API_URL") {
            self.api_url = Some(v);
        }
        if let Some(v) = non_empty("ASKTRACKER_COMPLETION_PROVIDER") {
            self.completion_provider = Some(v);
        }
        if let Some(v) = non_empty("ASKTRACKER_COMPLETION_URL") {
            self.completion_url = Some(v);
        }
        if let Some(v) = non_empty("ASKTRACKER_COMPLETION_MODEL") {
            self.completion_model = Some(v);
        }
        if let Some(v) = non_empty("ASKTRACKER_COMPLETION_TOKEN").or_else(|| non_empty("HF_TOKEN")) {
            self.completion_token = Some(v);
        }
        if let Some(raw) = non_empty("ASKTRACKER_TIMEOUT_SECS") {
            match raw.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => self.request_timeout_secs = Some(secs),
                _ => warn!(
                    value = %raw,
                    "ignoring ASKTRACKER_TIMEOUT_SECS; expected a positive number of seconds"
                ),
            }
        }
    }

    pub fn api_url(&self) -> Result<Url, ConfigError> {
        parse_url("api_url", self.api_url.as_deref().unwrap_or(DEFAULT_API_URL))
    }

    pub fn provider(&self) -> Result<Provider, ConfigError> {
        match self.completion_provider.as_deref() {
            None => Ok(Provider::default()),
            Some(name) => {
                Provider::from_str(name).ok_or_else(|| {
                    let known: Vec<&str> = Provider::all().iter().map(Provider::as_str).collect();
                    ConfigError::UnknownProvider(name.to_string(), known.join(", "))
                })
            }
        }
    }

    pub fn completion_url(&self) -> Result<Url, ConfigError> {
        let provider = self.provider()?;
        parse_url(
            "completion_url",
            self.completion_url
                .as_deref()
                .unwrap_or_else(|| provider.default_url()),
        )
    }

    pub fn completion_model(&self) -> Result<String, ConfigError> {
        let provider = self.provider()?;
        Ok(self
            .completion_model
            .clone()
            .unwrap_or_else(|| provider.default_model().to_string()))
    }

    /// Token for the completion provider. Kept apart from the session
    /// credential; the two services are authorized independently.
    pub fn completion_token(&self) -> Option<&str> {
        self.completion_token
            .as_deref()
            .filter(|t| !t.trim().is_empty())
    }

    pub fn max_tokens(&self) -> u32 {
        self.completion_max_tokens.unwrap_or(DEFAULT_MAX_TOKENS)
    }

    /// A zero in the file falls back to the default.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(
            self.request_timeout_secs
                .filter(|secs| *secs > 0)
                .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS),
        )
    }

    pub fn completion_timeout(&self) -> Duration {
        Duration::from_secs(
            self.completion_timeout_secs
                .filter(|secs| *secs > 0)
                .unwrap_or(DEFAULT_COMPLETION_TIMEOUT_SECS),
        )
    }

    pub fn unknown_update_policy(&self) -> UnknownUpdatePolicy {
        self.unknown_update_policy.unwrap_or_default()
    }

    pub fn get_config_path() -> Result<PathBuf, ConfigError> {
        Ok(config_dir()?.join("config.json"))
    }
}

/// `<platform config dir>/asktracker`, home of the config and session files.
pub fn config_dir() -> Result<PathBuf, ConfigError> {
    let config_dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
    Ok(config_dir.join("asktracker"))
}

fn parse_url(field: &str, raw: &str) -> Result<Url, ConfigError> {
    Url::parse(raw).map_err(|e| ConfigError::InvalidUrl(field.to_string(), e.to_string()))
}

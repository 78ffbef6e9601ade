//! Configuration management for the search gateway.
//!
//! Settings come from a TOML file (explicit path, `CODEQ_CONFIG`, the
//! working directory, or the platform config dir, in that order) with
//! environment variable overrides applied on top.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// Default search endpoint.
pub const DEFAULT_ENDPOINT: &str = "https://api.stackexchange.com/2.3/search/advanced";

/// Default site/channel identifier sent with every request.
pub const DEFAULT_SITE: &str = "stackoverflow";

/// Default response-shape filter id.
pub const DEFAULT_FILTER: &str = "default";

/// Default per-request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Backoff applied when a throttle response carries no usable retry hint.
pub const DEFAULT_BACKOFF_SECS: u64 = 30;

/// Config file name searched for in the working and platform config dirs.
const CONFIG_FILE_NAME: &str = "codeq.toml";

/// Errors from configuration loading and validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Settings for the upstream search gateway.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Search endpoint URL.
    pub endpoint: String,
    /// Provider site/channel identifier (`site=` parameter).
    pub site: String,
    /// Response-shape filter id (`filter=` parameter).
    pub filter: Option<String>,
    /// API key; raises the request quota when present.
    pub key: Option<String>,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
    /// Backoff window applied when a throttle response has no retry hint.
    pub default_backoff_secs: u64,
    /// User-Agent header for outbound calls.
    pub user_agent: String,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            site: DEFAULT_SITE.to_string(),
            filter: Some(DEFAULT_FILTER.to_string()),
            key: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            default_backoff_secs: DEFAULT_BACKOFF_SECS,
            user_agent: concat!("codeq-search/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl GatewayConfig {
    /// Per-request timeout as a `Duration`.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Validate fields that would otherwise fail at call time.
    pub fn validate(&self) -> Result<(), ConfigError> {
        url::Url::parse(&self.endpoint)
            .map_err(|e| ConfigError::Invalid(format!("endpoint is not a valid URL: {}", e)))?;
        if self.site.trim().is_empty() {
            return Err(ConfigError::Invalid("site must not be empty".to_string()));
        }
        if self.timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "timeout_secs must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Top-level settings file shape.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub gateway: GatewayConfig,
}

impl Settings {
    /// Load settings from the first config file found, then apply
    /// environment overrides and validate.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let mut settings = match Self::discover_path(explicit) {
            Some(path) => Self::from_file(&path)?,
            None => {
                debug!("no config file found, using defaults");
                Self::default()
            }
        };
        settings.apply_env();
        settings.gateway.validate()?;
        Ok(settings)
    }

    /// Parse a settings file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let settings = toml::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        debug!("loaded config from {}", path.display());
        Ok(settings)
    }

    /// Resolve the config file path: explicit flag, then `CODEQ_CONFIG`,
    /// then the working directory, then the platform config dir.
    fn discover_path(explicit: Option<&Path>) -> Option<PathBuf> {
        if let Some(path) = explicit {
            return Some(path.to_path_buf());
        }
        if let Ok(path) = std::env::var("CODEQ_CONFIG") {
            if !path.is_empty() {
                return Some(PathBuf::from(path));
            }
        }
        let cwd_path = PathBuf::from(CONFIG_FILE_NAME);
        if cwd_path.exists() {
            return Some(cwd_path);
        }
        if let Some(dir) = dirs::config_dir() {
            let path = dir.join("codeq").join(CONFIG_FILE_NAME);
            if path.exists() {
                return Some(path);
            }
        }
        None
    }

    /// Apply environment variable overrides on top of file values.
    fn apply_env(&mut self) {
        if let Ok(v) = std::env::var("CODEQ_ENDPOINT") {
            if !v.is_empty() {
                self.gateway.endpoint = v;
            }
        }
        if let Ok(v) = std::env::var("CODEQ_SITE") {
            if !v.is_empty() {
                self.gateway.site = v;
            }
        }
        if let Ok(v) = std::env::var("CODEQ_API_KEY") {
            if !v.is_empty() {
                self.gateway.key = Some(v);
            }
        }
    }
}

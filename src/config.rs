//! Configuration module
//! Reads defaults for the CLI from ~/.config/flagkit/config.json.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

const APP_DIR: &str = "flagkit";
const CONFIG_FILE: &str = "config.json";

/// Environment variable that overrides `asset_base_url`
pub const ASSET_URL_ENV: &str = "FLAGKIT_ASSET_URL";

/// Errors while reading the config file
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid config: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Runtime settings; every field has a default
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Serve flags from `<asset_base_url>/flags/<code>.svg` instead of the
    /// embedded table
    pub asset_base_url: Option<String>,
    /// Timeout for a single flag fetch
    pub fetch_timeout_secs: u64,
    /// Flag width when none is given
    pub default_width: f64,
    /// Selector list length
    pub max_results: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            asset_base_url: None,
            fetch_timeout_secs: crate::fetch::DEFAULT_TIMEOUT.as_secs(),
            default_width: crate::flag::DEFAULT_WIDTH,
            max_results: crate::selector::DEFAULT_MAX_RESULTS,
        }
    }
}

/// Gets the config directory path
fn config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join(APP_DIR))
}

/// Full path of the config file, if a config directory exists
pub fn config_path() -> Option<PathBuf> {
    config_dir().map(|p| p.join(CONFIG_FILE))
}

impl Config {
    /// Loads the user config, falling back to defaults when the file is
    /// missing or broken, then applies the environment override.
    pub fn load() -> Self {
        let config = match config_path() {
            Some(path) if path.exists() => match Self::load_from(&path) {
                Ok(config) => {
                    tracing::debug!("Loaded config from {:?}", path);
                    config
                }
                Err(e) => {
                    tracing::warn!("Ignoring config {:?}: {}", path, e);
                    Self::default()
                }
            },
            _ => Self::default(),
        };
        config.with_asset_url_override(std::env::var(ASSET_URL_ENV).ok())
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Replaces the asset URL when `url` is set and non-empty
    pub fn with_asset_url_override(mut self, url: Option<String>) -> Self {
        if let Some(url) = url.filter(|u| !u.trim().is_empty()) {
            self.asset_base_url = Some(url);
        }
        self
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.asset_base_url, None);
        assert_eq!(config.fetch_timeout(), Duration::from_secs(10));
        assert_eq!(config.default_width, 32.0);
        assert_eq!(config.max_results, 50);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = Config::from_json(r#"{"max_results": 5}"#).unwrap();
        assert_eq!(config.max_results, 5);
        assert_eq!(config.fetch_timeout_secs, 10);
    }

    #[test]
    fn test_invalid_json() {
        assert!(matches!(Config::from_json("{"), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_load_from_missing_file() {
        let path = std::env::temp_dir().join("flagkit-does-not-exist.json");
        assert!(matches!(Config::load_from(&path), Err(ConfigError::Io(_))));
    }

    #[test]
    fn test_asset_url_override() {
        let config =
            Config::default().with_asset_url_override(Some("http://localhost:8080".into()));
        assert_eq!(config.asset_base_url.as_deref(), Some("http://localhost:8080"));

        let config = config.with_asset_url_override(Some("  ".into()));
        assert_eq!(config.asset_base_url.as_deref(), Some("http://localhost:8080"));
    }
}

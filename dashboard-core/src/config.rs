use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf, time::Duration};

use crate::theme::Theme;

pub const DEFAULT_GEOCODING_URL: &str = "https://geocoding-api.open-meteo.com/v1";
pub const DEFAULT_FORECAST_URL: &str = "https://api.open-meteo.com/v1";

/// Retry behaviour for upstream calls.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Extra attempts after the first one; 0 disables retrying.
    pub max_retries: u32,
    /// Delay before the first retry, doubled for each following one.
    pub initial_backoff_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 2,
            initial_backoff_ms: 250,
        }
    }
}

impl RetryConfig {
    /// Delay before retry number `attempt` (1-based).
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 1u64.checked_shl(attempt.saturating_sub(1)).unwrap_or(u64::MAX);
        Duration::from_millis(self.initial_backoff_ms.saturating_mul(factor))
    }
}

/// Top-level configuration stored on disk.
///
/// Example TOML:
/// ```toml
/// theme = "dark"
/// timeout_secs = 5
///
/// [retry]
/// max_retries = 1
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Base URL of the geocoding API; `/search` is appended.
    pub geocoding_url: String,
    /// Base URL of the forecast API; `/forecast` is appended.
    pub forecast_url: String,
    /// Language of place names returned by search.
    pub language: String,
    /// Per-request timeout.
    pub timeout_secs: u64,
    /// Quiet period before a search is sent; a newer query within it cancels the older one.
    pub search_debounce_ms: u64,
    pub theme: Theme,
    pub retry: RetryConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            geocoding_url: DEFAULT_GEOCODING_URL.to_string(),
            forecast_url: DEFAULT_FORECAST_URL.to_string(),
            language: "en".to_string(),
            timeout_secs: 10,
            search_debounce_ms: 300,
            theme: Theme::default(),
            retry: RetryConfig::default(),
        }
    }
}

impl Config {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn search_debounce(&self) -> Duration {
        Duration::from_millis(self.search_debounce_ms)
    }

    /// Load config from disk, or return defaults if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        let path = Self::config_file_path()?;
        if !path.exists() {
            // First run: no config file, use defaults.
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::from_toml_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Parse a (possibly partial) TOML document; missing keys take defaults.
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let cfg: Config = toml::from_str(contents)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        let path = Self::config_file_path()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(&path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "weather-dashboard", "weather-dashboard")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }

    pub fn validate(&self) -> Result<()> {
        if self.timeout_secs == 0 {
            return Err(anyhow!("timeout_secs must be at least 1"));
        }
        for (key, url) in [
            ("geocoding_url", &self.geocoding_url),
            ("forecast_url", &self.forecast_url),
        ] {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(anyhow!("{key} must be an http(s) URL, got '{url}'"));
            }
        }
        Ok(())
    }
}

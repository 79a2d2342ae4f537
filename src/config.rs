//! Configuration loading and management for touchline.
//!
//! Loads settings from `touchline.toml` with environment variable overrides.
//! Every field has a default, so running without a config file is fine.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::role::DEFAULT_PROXIMITY_WINDOW;

const CONFIG_FILE: &str = "touchline.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },
}

/// HTTP and politeness settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScraperConfig {
    /// Site root, e.g. "https://www.transfermarkt.com"
    pub base_url: String,
    /// Fixed pause before every request, in seconds
    pub delay_secs: f64,
    pub timeout_secs: u64,
    pub user_agent: String,
}

impl ScraperConfig {
    pub fn delay(&self) -> Duration {
        Duration::from_secs_f64(self.delay_secs.max(0.0))
    }
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            base_url: "https://www.transfermarkt.com".to_string(),
            delay_secs: 2.0,
            timeout_secs: 30,
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                         (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36"
                .to_string(),
        }
    }
}

/// Role classifier tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// Characters scanned on each side of "manager" for other role words
    pub proximity_window: usize,
    /// Accept "Caretaker Manager" on staff pages
    pub include_caretaker: bool,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            proximity_window: DEFAULT_PROXIMITY_WINDOW,
            include_caretaker: false,
        }
    }
}

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub scraper: ScraperConfig,
    #[serde(default)]
    pub classifier: ClassifierConfig,
}

impl Config {
    /// Load configuration from the default location (touchline.toml in cwd or home)
    pub fn load() -> Result<Self, ConfigError> {
        match Self::find_config_file() {
            Some(path) => Self::load_from(&path),
            None => {
                let mut config = Config::default();
                config.apply_env()?;
                Ok(config)
            }
        }
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Config = toml::from_str(&content)?;
        config.apply_env()?;
        Ok(config)
    }

    /// Override settings from environment variables
    fn apply_env(&mut self) -> Result<(), ConfigError> {
        if let Ok(url) = std::env::var("TOUCHLINE_BASE_URL") {
            self.scraper.base_url = url;
        }
        if let Ok(delay) = std::env::var("TOUCHLINE_DELAY_SECS") {
            self.scraper.delay_secs =
                delay.parse().map_err(|_| ConfigError::InvalidValue {
                    key: "TOUCHLINE_DELAY_SECS".to_string(),
                    value: delay.clone(),
                })?;
        }
        self.validate()
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if !self.scraper.delay_secs.is_finite() || self.scraper.delay_secs < 0.0 {
            return Err(ConfigError::InvalidValue {
                key: "scraper.delay_secs".to_string(),
                value: self.scraper.delay_secs.to_string(),
            });
        }
        Ok(())
    }

    /// Find the config file in standard locations
    fn find_config_file() -> Option<PathBuf> {
        let local_config = PathBuf::from(CONFIG_FILE);
        if local_config.exists() {
            return Some(local_config);
        }

        let home_config = dirs::home_dir()?
            .join(".config")
            .join("touchline")
            .join(CONFIG_FILE);
        home_config.exists().then_some(home_config)
    }
}

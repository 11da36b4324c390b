use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{AppError, Result};
use crate::feed::DEFAULT_USER_AGENT;

pub const DEFAULT_FEED_URL: &str = "http://www.batoto.net/recent_rss";

/// Feed URL variable read by earlier deployments of the updater.
pub const LEGACY_FEED_URL_ENV: &str = "BATOTO_FEED_URL";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_db_path")]
    pub db_path: String,

    #[serde(default = "default_feed_url")]
    pub feed_url: String,

    /// Updates older than this many days are removed by `prune`.
    #[serde(default = "default_retention_days")]
    pub retention_days: u32,

    /// Hashed into every fingerprint when set. Changing it resets the
    /// incremental cursor.
    pub fingerprint_salt: Option<String>,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_db_path() -> String {
    let data_dir = dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("splitter");
    std::fs::create_dir_all(&data_dir).ok();
    data_dir.join("updates.db").to_string_lossy().to_string()
}

fn default_feed_url() -> String {
    DEFAULT_FEED_URL.to_string()
}

fn default_retention_days() -> u32 {
    30
}

fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            feed_url: default_feed_url(),
            retention_days: default_retention_days(),
            fingerprint_salt: None,
            user_agent: default_user_agent(),
        }
    }
}

impl Config {
    /// Load the default config file, writing one with defaults if missing.
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path();

        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            let config = Config::default();
            config.save_to(&config_path)?;
            Ok(config)
        }
    }

    /// Load an explicitly named config file; it must exist.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| AppError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.feed_url.trim().is_empty() {
            return Err(AppError::Config("feed_url must not be empty".to_string()));
        }
        if self.db_path.trim().is_empty() {
            return Err(AppError::Config("db_path must not be empty".to_string()));
        }
        Ok(())
    }

    /// Feed to ingest: the explicit location if given, then
    /// `BATOTO_FEED_URL`, then `feed_url` from the file.
    pub fn feed_location(&self, explicit: Option<String>) -> String {
        self.feed_location_with(explicit, std::env::var(LEGACY_FEED_URL_ENV).ok())
    }

    fn feed_location_with(&self, explicit: Option<String>, legacy: Option<String>) -> String {
        explicit
            .or(legacy)
            .filter(|location| !location.trim().is_empty())
            .unwrap_or_else(|| self.feed_url.clone())
    }

    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("splitter")
            .join("config.toml")
    }
}

//! Configuration management for inkpress.
//!
//! Handles loading, saving, and validating configuration from
//! platform-specific config directories.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use url::Url;

/// Application name used for config directory.
const APP_NAME: &str = "Inkpress";

/// Default config filename.
const CONFIG_FILENAME: &str = "config.toml";

/// Main configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Content host and download behavior settings.
    pub scraping: ScrapingConfig,

    /// PDF layout settings.
    pub output: OutputConfig,

    /// HTTP server settings for `serve` mode.
    pub server: ServerConfig,

    /// File paths.
    pub paths: PathsConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            scraping: ScrapingConfig::default(),
            output: OutputConfig::default(),
            server: ServerConfig::default(),
            paths: PathsConfig::default(),
        }
    }
}

/// Content host and download behavior configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScrapingConfig {
    /// Base URL of the content host. Also the session handshake target.
    pub api_base: String,

    /// User-Agent header sent with every request.
    pub user_agent: String,

    /// Per-request timeout in seconds.
    pub timeout_sec: u64,

    /// Total attempts per chapter before giving up (minimum 1).
    pub max_attempts: u32,

    /// Base backoff in seconds between failed attempts (scaled by attempt
    /// number). Denial-sentinel retries skip the backoff.
    pub retry_backoff_sec: f64,

    /// Politeness delay between sequential chapter requests in seconds.
    pub delay_between_requests_sec: f64,

    /// Chapters fetched concurrently per group. 1 means fully sequential.
    pub batch_size: usize,

    /// Wall-clock ceiling for a whole batch in seconds. 0 disables the
    /// ceiling; chapters unfinished when it expires become placeholders.
    pub overall_deadline_sec: f64,
}

impl Default for ScrapingConfig {
    fn default() -> Self {
        Self {
            api_base: "https://www.wattpad.com".to_string(),
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36".to_string(),
            timeout_sec: 30,
            max_attempts: 3,
            retry_backoff_sec: 1.0,
            delay_between_requests_sec: 1.0,
            batch_size: 5,
            overall_deadline_sec: 0.0,
        }
    }
}

/// PDF layout configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Body font family: "helvetica", "times" or "courier".
    /// Unknown values fall back to Helvetica at assembly time.
    pub font_family: String,

    /// Body text size in points.
    pub base_font_size: f32,

    /// Page width in points (595 x 842 is A4).
    pub page_width_pt: f32,

    /// Page height in points.
    pub page_height_pt: f32,

    /// Page margin in points, applied on all four sides.
    pub margin_pt: f32,

    /// Maximum characters of the story description shown on the title page.
    pub description_limit_chars: usize,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            font_family: "helvetica".to_string(),
            base_font_size: 11.0,
            page_width_pt: 595.0,
            page_height_pt: 842.0,
            margin_pt: 72.0,
            description_limit_chars: 600,
        }
    }
}

/// HTTP server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to bind in `serve` mode.
    pub bind_address: String,

    /// Port to listen on.
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1".to_string(),
            port: 3000,
        }
    }
}

/// File path configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Directory for generated PDF files.
    pub output_directory: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            output_directory: PathBuf::from("."),
        }
    }
}

impl Config {
    /// Returns the platform-specific config directory path.
    pub fn config_dir() -> Result<PathBuf, ConfigError> {
        dirs::config_dir()
            .map(|p| p.join(APP_NAME))
            .ok_or(ConfigError::NoConfigDir)
    }

    /// Returns the full path to the config file.
    pub fn config_path() -> Result<PathBuf, ConfigError> {
        Ok(Self::config_dir()?.join(CONFIG_FILENAME))
    }

    /// Loads configuration from the default location.
    ///
    /// If the config file doesn't exist, creates a default one.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::config_path()?;
        Self::load_from(&path)
    }

    /// Loads configuration from a specific path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            // Create default config
            let config = Config::default();
            config.save_to(path)?;
            return Ok(config);
        }

        let content = std::fs::read_to_string(path)?;
        let config: Config =
            toml::from_str(&content).map_err(|e| ConfigError::ParseError(e.to_string()))?;

        Ok(config)
    }

    /// Saves configuration to a specific path.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content =
            toml::to_string_pretty(self).map_err(|e| ConfigError::ParseError(e.to_string()))?;

        std::fs::write(path, content)?;
        Ok(())
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if Url::parse(&self.scraping.api_base).is_err() {
            return Err(ConfigError::InvalidValue {
                key: "scraping.api_base".to_string(),
                message: "must be a valid URL".to_string(),
            });
        }

        if self.scraping.max_attempts == 0 {
            return Err(ConfigError::InvalidValue {
                key: "scraping.max_attempts".to_string(),
                message: "must be at least 1".to_string(),
            });
        }

        if self.scraping.batch_size == 0 {
            return Err(ConfigError::InvalidValue {
                key: "scraping.batch_size".to_string(),
                message: "must be at least 1".to_string(),
            });
        }

        if self.output.base_font_size <= 0.0 {
            return Err(ConfigError::InvalidValue {
                key: "output.base_font_size".to_string(),
                message: "must be greater than 0".to_string(),
            });
        }

        let usable_width = self.output.page_width_pt - 2.0 * self.output.margin_pt;
        let usable_height = self.output.page_height_pt - 2.0 * self.output.margin_pt;
        if usable_width <= 0.0 || usable_height <= 0.0 {
            return Err(ConfigError::InvalidValue {
                key: "output.margin_pt".to_string(),
                message: "margins leave no usable page area".to_string(),
            });
        }

        Ok(())
    }
}

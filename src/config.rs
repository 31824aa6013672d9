//! Configuration module for newsgrab.

use serde::Deserialize;
use std::path::Path;

use crate::{NewsgrabError, Result};

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_db_path")]
    pub path: String,
}

fn default_db_path() -> String {
    "data/newsgrab.db".to_string()
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error), or a comma separated list
    /// of filter directives like `info,newsgrab::sync=debug`.
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Path to the log file. Empty logs to the console only.
    #[serde(default = "default_log_file")]
    pub file: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_file() -> String {
    "logs/newsgrab.log".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: default_log_file(),
        }
    }
}

/// Poll scheduler configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct GrabberConfig {
    /// Delay between two sweeps of the same source, in seconds.
    #[serde(default = "default_grabber_sleep")]
    pub sleep_secs: u64,
}

fn default_grabber_sleep() -> u64 {
    60
}

impl Default for GrabberConfig {
    fn default() -> Self {
        Self {
            sleep_secs: default_grabber_sleep(),
        }
    }
}

/// Outbound HTTP client configuration shared by all adapters.
#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    /// Connection timeout in seconds.
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
    /// Read timeout in seconds.
    #[serde(default = "default_read_timeout")]
    pub read_timeout_secs: u64,
    /// Total request timeout in seconds.
    #[serde(default = "default_total_timeout")]
    pub total_timeout_secs: u64,
    /// Maximum number of redirects.
    #[serde(default = "default_max_redirects")]
    pub max_redirects: usize,
}

fn default_connect_timeout() -> u64 {
    10
}

fn default_read_timeout() -> u64 {
    20
}

fn default_total_timeout() -> u64 {
    30
}

fn default_max_redirects() -> usize {
    5
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            connect_timeout_secs: default_connect_timeout(),
            read_timeout_secs: default_read_timeout(),
            total_timeout_secs: default_total_timeout(),
            max_redirects: default_max_redirects(),
        }
    }
}

/// VK wall source configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct VkConfig {
    /// Whether the VK source is polled.
    #[serde(default = "default_vk_enabled")]
    pub enabled: bool,
    /// Service access token.
    #[serde(default)]
    pub token: String,
    /// API base URL.
    #[serde(default = "default_vk_base_url")]
    pub base_url: String,
    /// API version sent with every call.
    #[serde(default = "default_vk_api_version")]
    pub api_version: String,
    /// Posts requested per page.
    #[serde(default = "default_vk_page_size")]
    pub page_size: usize,
}

fn default_vk_enabled() -> bool {
    true
}

fn default_vk_base_url() -> String {
    "https://api.vk.com".to_string()
}

fn default_vk_api_version() -> String {
    "5.131".to_string()
}

fn default_vk_page_size() -> usize {
    100
}

impl Default for VkConfig {
    fn default() -> Self {
        Self {
            enabled: default_vk_enabled(),
            token: String::new(),
            base_url: default_vk_base_url(),
            api_version: default_vk_api_version(),
            page_size: default_vk_page_size(),
        }
    }
}

/// RSS/Atom source configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct RssConfig {
    /// Whether the RSS source is polled.
    #[serde(default = "default_rss_enabled")]
    pub enabled: bool,
    /// Entries returned per page.
    #[serde(default = "default_rss_page_size")]
    pub page_size: usize,
    /// Maximum feed size in bytes.
    #[serde(default = "default_rss_max_feed_size")]
    pub max_feed_size_bytes: u64,
}

fn default_rss_enabled() -> bool {
    false
}

fn default_rss_page_size() -> usize {
    50
}

fn default_rss_max_feed_size() -> u64 {
    5 * 1024 * 1024 // 5MB
}

impl Default for RssConfig {
    fn default() -> Self {
        Self {
            enabled: default_rss_enabled(),
            page_size: default_rss_page_size(),
            max_feed_size_bytes: default_rss_max_feed_size(),
        }
    }
}

/// Telegram notifier configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct TelegramConfig {
    /// Bot token.
    #[serde(default)]
    pub token: String,
    /// Bot API base URL.
    #[serde(default = "default_telegram_base_url")]
    pub base_url: String,
}

fn default_telegram_base_url() -> String {
    "https://api.telegram.org/".to_string()
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            token: String::new(),
            base_url: default_telegram_base_url(),
        }
    }
}

/// Main configuration structure.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    /// Database configuration.
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Poll scheduler configuration.
    #[serde(default)]
    pub grabber: GrabberConfig,
    /// HTTP client configuration.
    #[serde(default)]
    pub http: HttpConfig,
    /// VK source configuration.
    #[serde(default)]
    pub vk: VkConfig,
    /// RSS source configuration.
    #[serde(default)]
    pub rss: RssConfig,
    /// Telegram notifier configuration.
    #[serde(default)]
    pub telegram: TelegramConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(NewsgrabError::Io)?;
        Self::parse(&content)
    }

    /// Load configuration from a TOML file and apply environment variable overrides.
    pub fn load_with_env<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(s: &str) -> Result<Self> {
        toml::from_str(s).map_err(|e| NewsgrabError::Config(format!("config parse error: {e}")))
    }

    /// Apply environment variable overrides to the configuration.
    ///
    /// Supported environment variables:
    /// - `NEWSGRAB_VK_TOKEN`: VK access token
    /// - `NEWSGRAB_TELEGRAM_TOKEN`: Telegram bot token
    pub fn apply_env_overrides(&mut self) {
        if let Ok(token) = std::env::var("NEWSGRAB_VK_TOKEN") {
            if !token.is_empty() {
                self.vk.token = token;
            }
        }
        if let Ok(token) = std::env::var("NEWSGRAB_TELEGRAM_TOKEN") {
            if !token.is_empty() {
                self.telegram.token = token;
            }
        }
    }

    /// Validate the configuration.
    ///
    /// Returns an error if:
    /// - the Telegram token is not set
    /// - VK is enabled but its token is not set
    /// - the scheduler delay or a page size is zero
    pub fn validate(&self) -> Result<()> {
        if self.telegram.token.is_empty() {
            return Err(NewsgrabError::Config(
                "telegram.token is not set. \
                 Set it in config.toml or via NEWSGRAB_TELEGRAM_TOKEN environment variable."
                    .to_string(),
            ));
        }
        if self.vk.enabled && self.vk.token.is_empty() {
            return Err(NewsgrabError::Config(
                "VK source is enabled but vk.token is not set. \
                 Set it in config.toml or via NEWSGRAB_VK_TOKEN environment variable."
                    .to_string(),
            ));
        }
        if self.grabber.sleep_secs == 0 {
            return Err(NewsgrabError::Config(
                "grabber.sleep_secs must be greater than zero".to_string(),
            ));
        }
        if self.vk.page_size == 0 || self.rss.page_size == 0 {
            return Err(NewsgrabError::Config(
                "page_size must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

//! Core configuration types and loading.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use super::defaults::*;
use super::validation::{self, ValidationError};

/// Environment variable that overrides `bot.script`.
pub const SCRIPT_ENV: &str = "BANANABOAT_SCRIPT";

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid config: {0}")]
    Invalid(#[from] ValidationError),
}

/// Bot configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Core bot settings.
    pub bot: BotConfig,
    /// Settings for the HTTP-backed script library functions.
    #[serde(default)]
    pub http: HttpConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    ///
    /// `BANANABOAT_SCRIPT`, when set and non-empty, replaces `bot.script`.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Config = toml::from_str(&content)?;
        if let Some(script) = std::env::var_os(SCRIPT_ENV).filter(|s| !s.is_empty()) {
            config.bot.script = PathBuf::from(script);
        }
        validation::validate(&config)?;
        Ok(config)
    }

    /// Build a config for the given script with every other field defaulted.
    pub fn for_script(script: impl Into<PathBuf>) -> Self {
        Self {
            bot: BotConfig {
                script: script.into(),
                log_commands: false,
                default_port: default_port(),
                max_reconnect: default_max_reconnect(),
                outbound_queue: default_outbound_queue(),
            },
            http: HttpConfig::default(),
        }
    }
}

/// Core bot settings.
#[derive(Debug, Clone, Deserialize)]
pub struct BotConfig {
    /// Path to the Lua script defining handlers and servers.
    #[serde(default)]
    pub script: PathBuf,
    /// Log every inbound message before dispatch.
    #[serde(default)]
    pub log_commands: bool,
    /// Port used when a server entry omits one.
    #[serde(default = "default_port")]
    pub default_port: u16,
    /// Upper bound, in seconds, of the reconnect backoff.
    #[serde(default = "default_max_reconnect")]
    pub max_reconnect: u64,
    /// Capacity of each connection's outbound queue.
    #[serde(default = "default_outbound_queue")]
    pub outbound_queue: usize,
}

/// HTTP client settings and endpoints.
#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    /// Request timeout in seconds.
    #[serde(default = "default_http_timeout")]
    pub timeout: u64,
    /// OpenWeatherMap current weather endpoint.
    #[serde(default = "default_weather_url")]
    pub weather_url: String,
    /// LUIS prediction endpoint; `{region}` and `{app_id}` are substituted.
    #[serde(default = "default_intent_url")]
    pub intent_url: String,
}

impl HttpConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout: default_http_timeout(),
            weather_url: default_weather_url(),
            intent_url: default_intent_url(),
        }
    }
}

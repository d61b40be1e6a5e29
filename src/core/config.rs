//! Configuration management

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};

use crate::core::errors::{LaraError, Result};

/// Production endpoint of the Lara API
pub const DEFAULT_SERVER_URL: &str = "https://api.laratranslate.com";

/// Name sent in `X-Lara-SDK-Name`
pub const SDK_NAME: &str = "lara-rust";

/// Version sent in `X-Lara-SDK-Version`
pub const SDK_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Interval between status polls of long-running operations
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 2000;

/// Configuration for a translator instance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub server_url: String,
    pub sdk_name: String,
    pub sdk_version: String,
    /// Whole-request timeout, none by default
    pub timeout_ms: Option<u64>,
    pub connect_timeout_ms: u64,
    pub poll_interval_ms: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_url: DEFAULT_SERVER_URL.to_string(),
            sdk_name: SDK_NAME.to_string(),
            sdk_version: SDK_VERSION.to_string(),
            timeout_ms: None,
            connect_timeout_ms: 10_000,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
        }
    }
}

impl ClientConfig {
    /// Point the client at another server
    pub fn with_server_url(mut self, server_url: impl Into<String>) -> Self {
        self.server_url = server_url.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_ms = Some(timeout.as_millis() as u64);
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval_ms = interval.as_millis() as u64;
        self
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        let server_url = std::env::var("LARA_SERVER_URL").unwrap_or(defaults.server_url);

        let timeout_ms = match std::env::var("LARA_TIMEOUT_MS") {
            Ok(value) => Some(parse_env("LARA_TIMEOUT_MS", &value)?),
            Err(_) => defaults.timeout_ms,
        };

        let connect_timeout_ms = match std::env::var("LARA_CONNECT_TIMEOUT_MS") {
            Ok(value) => parse_env("LARA_CONNECT_TIMEOUT_MS", &value)?,
            Err(_) => defaults.connect_timeout_ms,
        };

        let poll_interval_ms = match std::env::var("LARA_POLL_INTERVAL_MS") {
            Ok(value) => parse_env("LARA_POLL_INTERVAL_MS", &value)?,
            Err(_) => defaults.poll_interval_ms,
        };

        let config = Self {
            server_url,
            timeout_ms,
            connect_timeout_ms,
            poll_interval_ms,
            ..defaults
        };
        debug!("Loaded client configuration for {}", config.server_url);

        Ok(config)
    }

    /// Load from JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let config: Self = serde_json::from_str(&content).map_err(|e| LaraError::Config {
            message: format!("{}: {}", path.as_ref().display(), e),
        })?;
        info!("Loaded configuration from {}", path.as_ref().display());
        Ok(config)
    }

    /// Save configuration to file
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.server_url.is_empty() {
            return Err(LaraError::Config {
                message: "server URL is required".to_string(),
            });
        }

        if !self.server_url.starts_with("http://") && !self.server_url.starts_with("https://") {
            return Err(LaraError::Config {
                message: format!("server URL must be http(s): {}", self.server_url),
            });
        }

        if self.sdk_name.is_empty() || self.sdk_version.is_empty() {
            return Err(LaraError::Config {
                message: "SDK name and version are required".to_string(),
            });
        }

        if self.timeout_ms == Some(0) {
            return Err(LaraError::Config {
                message: "timeout_ms must be greater than 0".to_string(),
            });
        }

        if self.poll_interval_ms == 0 {
            return Err(LaraError::Config {
                message: "poll_interval_ms must be greater than 0".to_string(),
            });
        }

        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Base URL without trailing slashes
    pub fn base_url(&self) -> &str {
        self.server_url.trim_end_matches('/')
    }
}

fn parse_env(name: &str, value: &str) -> Result<u64> {
    value.trim().parse::<u64>().map_err(|e| LaraError::Config {
        message: format!("{} must be an integer: {}", name, e),
    })
}

//! HTTP transport configuration.
//!
//! Deserialized from the `[http]` table of the gateway configuration file.

use std::time::Duration;

use serde::Deserialize;

use crate::error::{GatewayError, Result};

/// User agent sent when none is configured.
pub const DEFAULT_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// HTTP transport configuration.
///
/// # Examples
///
/// ```toml
/// [http]
/// timeout_secs = 45
/// connect_timeout_secs = 5
/// user_agent = "shop-backend/2.1"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct HttpConfig {
    /// Request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Connection timeout in seconds.
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,

    /// `User-Agent` header value.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            connect_timeout_secs: default_connect_timeout_secs(),
            user_agent: default_user_agent(),
        }
    }
}

impl HttpConfig {
    /// Validates configuration values are within acceptable bounds.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::ConfigError`] if:
    /// - `timeout_secs` is outside 1-300 seconds
    /// - `connect_timeout_secs` is outside 1-60 seconds
    /// - `user_agent` is empty or contains control characters
    pub fn validate(&self) -> Result<()> {
        if self.timeout_secs == 0 || self.timeout_secs > 300 {
            return Err(GatewayError::ConfigError(
                "timeout_secs must be between 1 and 300".to_owned(),
            ));
        }
        if self.connect_timeout_secs == 0 || self.connect_timeout_secs > 60 {
            return Err(GatewayError::ConfigError(
                "connect_timeout_secs must be between 1 and 60".to_owned(),
            ));
        }
        if self.user_agent.is_empty() || self.user_agent.chars().any(char::is_control) {
            return Err(GatewayError::ConfigError(
                "user_agent must be non-empty printable text".to_owned(),
            ));
        }
        Ok(())
    }

    /// Returns timeout as Duration.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Returns connect timeout as Duration.
    #[must_use]
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_connect_timeout_secs() -> u64 {
    10
}

fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_owned()
}

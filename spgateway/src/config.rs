//! Gateway configuration types.
//!
//! This module defines TOML-deserializable configuration for one merchant
//! account. A configuration is turned into a [`Credential`](crate::Credential)
//! once, when a client is built.

use std::{fmt, path::Path, str::FromStr};

use serde::Deserialize;

use crate::{
    codec::UnpadMode,
    error::{GatewayError, Result},
    transport::HttpConfig,
};

/// Gateway environment.
///
/// Selects which column of the endpoint table the clients use. The codec
/// itself behaves identically in both modes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize)]
#[serde(try_from = "String")]
pub enum Mode {
    /// Sandbox endpoints (`ccore.*`, `cinv.*`).
    Test,
    /// Live endpoints.
    #[default]
    Production,
}

impl Mode {
    /// Returns the lowercase configuration name of the mode.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Test => "test",
            Self::Production => "production",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mode {
    type Err = GatewayError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "test" => Ok(Self::Test),
            "production" => Ok(Self::Production),
            _ => Err(GatewayError::InvalidMode(s.to_owned())),
        }
    }
}

impl TryFrom<String> for Mode {
    type Error = GatewayError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

/// Merchant account configuration.
///
/// # Examples
///
/// ```
/// use spgateway::config::{GatewayConfig, Mode};
///
/// let config = GatewayConfig::from_toml(
///     r#"
///     mode = "test"
///     merchant_id = "MS12345"
///     hash_key = "0123456789abcdef0123456789abcdef"
///     hash_iv = "0123456789abcdef"
///     "#,
/// )
/// .unwrap();
///
/// assert_eq!(config.mode, Mode::Test);
/// ```
#[derive(Clone, Default, Deserialize)]
pub struct GatewayConfig {
    /// Gateway environment (default: production).
    #[serde(default)]
    pub mode: Mode,

    /// Merchant id issued by the gateway.
    #[serde(default)]
    pub merchant_id: Option<String>,

    /// 32-byte hash key.
    #[serde(default)]
    pub hash_key: Option<String>,

    /// 16-byte hash IV.
    #[serde(default)]
    pub hash_iv: Option<String>,

    /// Unpadding behaviour for decrypted payloads.
    #[serde(default)]
    pub unpad_mode: UnpadMode,

    /// HTTP transport settings.
    #[serde(default)]
    pub http: HttpConfig,
}

impl fmt::Debug for GatewayConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GatewayConfig")
            .field("mode", &self.mode)
            .field("merchant_id", &self.merchant_id)
            .field("hash_key", &self.hash_key.as_ref().map(|_| "<redacted>"))
            .field("hash_iv", &self.hash_iv.as_ref().map(|_| "<redacted>"))
            .field("unpad_mode", &self.unpad_mode)
            .field("http", &self.http)
            .finish()
    }
}

impl GatewayConfig {
    /// Creates a configuration from the three merchant options.
    #[must_use]
    pub fn new(
        mode: Mode,
        merchant_id: impl Into<String>,
        hash_key: impl Into<String>,
        hash_iv: impl Into<String>,
    ) -> Self {
        Self {
            mode,
            merchant_id: Some(merchant_id.into()),
            hash_key: Some(hash_key.into()),
            hash_iv: Some(hash_iv.into()),
            ..Self::default()
        }
    }

    /// Parses and validates a TOML configuration.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::ConfigError`] if the TOML is malformed (including
    /// an unknown `mode`), or any validation error from [`Self::validate`].
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        let config = Self::parse_toml(toml_str)?;
        config.validate()?;
        Ok(config)
    }

    /// Parses a TOML configuration without validating it.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::ConfigError`] if the TOML is malformed.
    pub fn parse_toml(toml_str: &str) -> Result<Self> {
        toml::from_str(toml_str)
            .map_err(|e| GatewayError::ConfigError(format!("invalid TOML config: {e}")))
    }

    /// Reads a configuration file.
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read or fails [`Self::from_toml`].
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| GatewayError::ConfigError(format!("cannot read config file: {e}")))?;
        Self::from_toml(&content)
    }

    /// Validates that every merchant option is present and well-formed.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::MissingOption`] for an absent option,
    /// [`GatewayError::InvalidCredential`] for a key or IV of the wrong length,
    /// and transport validation errors for the `[http]` table.
    pub fn validate(&self) -> Result<()> {
        let merchant_id = required_option("merchant_id", self.merchant_id.as_deref())?;
        if merchant_id.chars().any(|c| c.is_control() || c == '&' || c == '=') {
            return Err(GatewayError::ConfigError(format!(
                "merchant_id contains reserved characters: {merchant_id}"
            )));
        }

        let key = required_option("hash_key", self.hash_key.as_deref())?;
        if key.len() != crate::credential::KEY_LEN {
            return Err(GatewayError::InvalidCredential(format!(
                "hash_key must be {} bytes, got {}",
                crate::credential::KEY_LEN,
                key.len()
            )));
        }

        let iv = required_option("hash_iv", self.hash_iv.as_deref())?;
        if iv.len() != crate::credential::IV_LEN {
            return Err(GatewayError::InvalidCredential(format!(
                "hash_iv must be {} bytes, got {}",
                crate::credential::IV_LEN,
                iv.len()
            )));
        }

        self.http.validate()
    }
}

fn required_option<'a>(name: &str, value: Option<&'a str>) -> Result<&'a str> {
    match value {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(GatewayError::MissingOption(name.to_owned())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VALID: &str = r#"
        mode = "test"
        merchant_id = "MS12345"
        hash_key = "0123456789abcdef0123456789abcdef"
        hash_iv = "0123456789abcdef"
    "#;

    #[test]
    fn test_config_from_toml() {
        let config = GatewayConfig::from_toml(VALID).unwrap();
        assert_eq!(config.mode, Mode::Test);
        assert_eq!(config.merchant_id.as_deref(), Some("MS12345"));
        assert_eq!(config.unpad_mode, UnpadMode::GatewayCompat);
        assert_eq!(config.http.timeout_secs, 30);
    }

    #[test]
    fn test_mode_defaults_to_production() {
        let toml = r#"
            merchant_id = "MS12345"
            hash_key = "0123456789abcdef0123456789abcdef"
            hash_iv = "0123456789abcdef"
        "#;
        let config = GatewayConfig::from_toml(toml).unwrap();
        assert_eq!(config.mode, Mode::Production);
    }

    #[test]
    fn test_unknown_mode_rejected() {
        let toml = VALID.replace("\"test\"", "\"staging\"");
        let err = GatewayConfig::from_toml(&toml).unwrap_err();
        assert!(matches!(err, GatewayError::ConfigError(_)));
        assert!(err.to_string().contains("staging"));
    }

    #[test]
    fn test_missing_hash_iv() {
        let toml = r#"
            merchant_id = "MS12345"
            hash_key = "0123456789abcdef0123456789abcdef"
        "#;
        let err = GatewayConfig::from_toml(toml).unwrap_err();
        assert!(matches!(err, GatewayError::MissingOption(ref name) if name == "hash_iv"));
    }

    #[test]
    fn test_empty_merchant_id_is_missing() {
        let config = GatewayConfig::new(
            Mode::Test,
            "",
            "0123456789abcdef0123456789abcdef",
            "0123456789abcdef",
        );
        assert!(matches!(config.validate(), Err(GatewayError::MissingOption(_))));
    }

    #[test]
    fn test_short_hash_key_rejected() {
        let config = GatewayConfig::new(Mode::Test, "MS1", "short", "0123456789abcdef");
        assert!(matches!(config.validate(), Err(GatewayError::InvalidCredential(_))));
    }

    #[test]
    fn test_strict_unpad_mode_from_toml() {
        let toml = format!("{VALID}\nunpad_mode = \"strict\"");
        let config = GatewayConfig::from_toml(&toml).unwrap();
        assert_eq!(config.unpad_mode, UnpadMode::Strict);
    }

    #[test]
    fn test_http_table_from_toml() {
        let toml = format!("{VALID}\n[http]\ntimeout_secs = 45\n");
        let config = GatewayConfig::from_toml(&toml).unwrap();
        assert_eq!(config.http.timeout_secs, 45);
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let config = GatewayConfig::from_toml(VALID).unwrap();
        let debug = format!("{config:?}");
        assert!(!debug.contains("0123456789abcdef"));
        assert!(debug.contains("<redacted>"));
    }

    #[test]
    fn test_mode_from_str() {
        assert_eq!("TEST".parse::<Mode>().unwrap(), Mode::Test);
        assert_eq!(" production ".parse::<Mode>().unwrap(), Mode::Production);
        assert!(matches!("live".parse::<Mode>(), Err(GatewayError::InvalidMode(_))));
    }
}

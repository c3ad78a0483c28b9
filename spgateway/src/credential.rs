//! Merchant credential shared by every codec operation of one client.

use std::fmt;

use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::{
    config::GatewayConfig,
    error::{GatewayError, Result},
};

/// AES-256 key length in bytes.
pub const KEY_LEN: usize = 32;

/// AES block / IV length in bytes.
pub const IV_LEN: usize = 16;

/// Merchant id plus the hash key/IV pair.
///
/// Immutable after construction. The secrets are wiped from memory on drop and
/// never appear in `Debug` output.
///
/// # Examples
///
/// ```
/// use spgateway::Credential;
///
/// let credential =
///     Credential::new("MS12345", "0123456789abcdef0123456789abcdef", "0123456789abcdef").unwrap();
/// assert_eq!(credential.merchant_id(), "MS12345");
///
/// assert!(Credential::new("MS12345", "too-short", "0123456789abcdef").is_err());
/// ```
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct Credential {
    #[zeroize(skip)]
    merchant_id: String,
    key: [u8; KEY_LEN],
    iv: [u8; IV_LEN],
}

impl Credential {
    /// Builds a credential from the raw option strings.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::MissingOption`] if any option is empty and
    /// [`GatewayError::InvalidCredential`] if the key or IV has the wrong length.
    pub fn new(merchant_id: &str, hash_key: &str, hash_iv: &str) -> Result<Self> {
        if merchant_id.is_empty() {
            return Err(GatewayError::MissingOption("merchant_id".to_owned()));
        }
        if hash_key.is_empty() {
            return Err(GatewayError::MissingOption("hash_key".to_owned()));
        }
        if hash_iv.is_empty() {
            return Err(GatewayError::MissingOption("hash_iv".to_owned()));
        }

        let key: [u8; KEY_LEN] = hash_key.as_bytes().try_into().map_err(|_| {
            GatewayError::InvalidCredential(format!(
                "hash_key must be {KEY_LEN} bytes, got {}",
                hash_key.len()
            ))
        })?;
        let iv: [u8; IV_LEN] = hash_iv.as_bytes().try_into().map_err(|_| {
            GatewayError::InvalidCredential(format!(
                "hash_iv must be {IV_LEN} bytes, got {}",
                hash_iv.len()
            ))
        })?;

        Ok(Self { merchant_id: merchant_id.to_owned(), key, iv })
    }

    /// Builds a credential from a validated configuration.
    ///
    /// # Errors
    ///
    /// Returns any error from [`GatewayConfig::validate`] or [`Self::new`].
    pub fn from_config(config: &GatewayConfig) -> Result<Self> {
        config.validate()?;
        Self::new(
            config.merchant_id.as_deref().unwrap_or_default(),
            config.hash_key.as_deref().unwrap_or_default(),
            config.hash_iv.as_deref().unwrap_or_default(),
        )
    }

    /// Returns the merchant id.
    #[must_use]
    pub fn merchant_id(&self) -> &str {
        &self.merchant_id
    }

    pub(crate) fn key(&self) -> &[u8; KEY_LEN] {
        &self.key
    }

    pub(crate) fn iv(&self) -> &[u8; IV_LEN] {
        &self.iv
    }

    /// Key as template text. The gateway issues ASCII keys; the bytes were
    /// validated as UTF-8 on construction.
    pub(crate) fn key_text(&self) -> &str {
        std::str::from_utf8(&self.key).unwrap_or_default()
    }

    pub(crate) fn iv_text(&self) -> &str {
        std::str::from_utf8(&self.iv).unwrap_or_default()
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("merchant_id", &self.merchant_id)
            .field("key", &"<redacted>")
            .field("iv", &"<redacted>")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Mode;

    const KEY: &str = "0123456789abcdef0123456789abcdef";
    const IV: &str = "0123456789abcdef";

    #[test]
    fn test_credential_new() {
        let credential = Credential::new("MS12345", KEY, IV).unwrap();
        assert_eq!(credential.merchant_id(), "MS12345");
        assert_eq!(credential.key_text(), KEY);
        assert_eq!(credential.iv_text(), IV);
    }

    #[test]
    fn test_missing_options_fail_fast() {
        assert!(matches!(
            Credential::new("", KEY, IV),
            Err(GatewayError::MissingOption(ref o)) if o == "merchant_id"
        ));
        assert!(matches!(
            Credential::new("MS1", "", IV),
            Err(GatewayError::MissingOption(ref o)) if o == "hash_key"
        ));
        assert!(matches!(
            Credential::new("MS1", KEY, ""),
            Err(GatewayError::MissingOption(ref o)) if o == "hash_iv"
        ));
    }

    #[test]
    fn test_wrong_lengths_rejected() {
        assert!(matches!(
            Credential::new("MS1", &KEY[..31], IV),
            Err(GatewayError::InvalidCredential(_))
        ));
        assert!(matches!(
            Credential::new("MS1", KEY, "0123456789abcdef0"),
            Err(GatewayError::InvalidCredential(_))
        ));
    }

    #[test]
    fn test_from_config() {
        let config = GatewayConfig::new(Mode::Test, "MS12345", KEY, IV);
        let credential = Credential::from_config(&config).unwrap();
        assert_eq!(credential.merchant_id(), "MS12345");
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let credential = Credential::new("MS12345", KEY, IV).unwrap();
        let debug = format!("{credential:?}");
        assert!(debug.contains("MS12345"));
        assert!(!debug.contains(IV));
    }
}

//! Transaction codec.
//!
//! Everything needed to talk to the gateway without touching the network:
//! parameter maps and their canonical renderings, the AES-256-CBC payload
//! cipher, keyed SHA-256 check values driven by a table of wire profiles,
//! and reply decoding.
//!
//! # Examples
//!
//! ```
//! use spgateway::{
//!     Credential,
//!     codec::{ParamMap, TransactionCodec},
//! };
//!
//! # fn example() -> spgateway::error::Result<()> {
//! let credential =
//!     Credential::new("MS12345", "0123456789abcdef0123456789abcdef", "0123456789abcdef")?;
//! let codec = TransactionCodec::new(credential);
//!
//! let params = ParamMap::new().with("MerchantID", "MS12345").with("Amt", 1000);
//! let trade_info = codec.encode_params(&params, &["Amt"])?;
//! let trade_sha = codec.engine().compute_payload_check_value("trade-sha", trade_info.as_str())?;
//!
//! assert_eq!(codec.cipher().decode_str(trade_info.as_str())?, "MerchantID=MS12345&Amt=1000");
//! assert_eq!(trade_sha.as_str().len(), 64);
//! # Ok(())
//! # }
//! # example().unwrap();
//! ```

use std::{fmt, sync::Arc};

use serde::Serialize;

use crate::{Credential, config::GatewayConfig, error::Result};

pub mod canonical;
pub mod check_value;
pub mod cipher;
pub mod params;
pub mod profile;
pub mod response;

#[cfg(test)]
mod tests;

pub use check_value::{CHECK_CODE_FIELD, CheckValueEngine};
pub use cipher::{BlockCipherCodec, UnpadMode};
pub use params::{ParamMap, ParamValue};
pub use profile::{Generation, ProfileId, ProfileRegistry, WireProfile};
pub use response::{DecodedResponse, ResponseShape, SignatureStatus};

/// Lowercase hex ciphertext produced by [`BlockCipherCodec::encode`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct EncryptedPayload(String);

impl EncryptedPayload {
    pub(crate) fn from_ciphertext(ciphertext: &[u8]) -> Self {
        Self(hex::encode(ciphertext))
    }

    /// Returns the hex text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Length of the hex text.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true for an empty payload. Encoding never produces one.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Consumes the payload into its hex text.
    #[must_use]
    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for EncryptedPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<EncryptedPayload> for String {
    fn from(payload: EncryptedPayload) -> Self {
        payload.0
    }
}

/// 64-character uppercase hex SHA-256 check value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct CheckValue(String);

impl CheckValue {
    pub(crate) fn from_digest(digest: &[u8]) -> Self {
        Self(hex::encode_upper(digest))
    }

    /// Returns the hex text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the check value into its hex text.
    #[must_use]
    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for CheckValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<CheckValue> for String {
    fn from(value: CheckValue) -> Self {
        value.0
    }
}

/// Cipher and check-value engine bound to one merchant credential.
///
/// Cheap to clone; clones share the credential.
#[derive(Debug, Clone)]
pub struct TransactionCodec {
    credential: Arc<Credential>,
    cipher: BlockCipherCodec,
    engine: CheckValueEngine,
}

impl TransactionCodec {
    /// Creates a codec with the built-in profiles and compatible unpadding.
    #[must_use]
    pub fn new(credential: Credential) -> Self {
        Self::with_unpad_mode(credential, UnpadMode::default())
    }

    /// Creates a codec with an explicit unpadding mode.
    #[must_use]
    pub fn with_unpad_mode(credential: Credential, unpad_mode: UnpadMode) -> Self {
        let credential = Arc::new(credential);
        Self {
            cipher: BlockCipherCodec::with_unpad_mode(Arc::clone(&credential), unpad_mode),
            engine: CheckValueEngine::new(Arc::clone(&credential)),
            credential,
        }
    }

    /// Builds a codec from validated configuration.
    ///
    /// # Errors
    ///
    /// Returns the validation error of [`GatewayConfig::validate`].
    pub fn from_config(config: &GatewayConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::with_unpad_mode(Credential::from_config(config)?, config.unpad_mode))
    }

    /// Merchant identifier of the bound credential.
    #[must_use]
    pub fn merchant_id(&self) -> &str {
        self.credential.merchant_id()
    }

    /// The payload cipher.
    #[must_use]
    pub fn cipher(&self) -> &BlockCipherCodec {
        &self.cipher
    }

    /// The check-value engine.
    #[must_use]
    pub fn engine(&self) -> &CheckValueEngine {
        &self.engine
    }

    /// Renders `params` in payload form and encrypts the result.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::GatewayError::MissingField`] if a `required`
    /// field is absent.
    pub fn encode_params(&self, params: &ParamMap, required: &[&str]) -> Result<EncryptedPayload> {
        let payload = canonical::render_payload(params, required)?;
        Ok(self.cipher.encode(payload))
    }

    /// Decodes a reply body. See [`response::decode`].
    ///
    /// # Errors
    ///
    /// Same as [`response::decode`].
    pub fn decode_response(&self, body: &[u8], shape: &ResponseShape) -> Result<DecodedResponse> {
        response::decode(body, shape, self)
    }
}

#[cfg(test)]
mod unit_tests {
    use super::*;

    #[test]
    fn test_codec_is_send_sync_clone() {
        fn assert_bounds<T: Send + Sync + Clone>() {}
        assert_bounds::<TransactionCodec>();
    }

    #[test]
    fn test_check_value_uppercase() {
        let value = CheckValue::from_digest(&[0xab, 0x01]);
        assert_eq!(value.as_str(), "AB01");
    }

    #[test]
    fn test_payload_lowercase() {
        let payload = EncryptedPayload::from_ciphertext(&[0xab, 0x01]);
        assert_eq!(payload.to_string(), "ab01");
        assert_eq!(payload.len(), 4);
    }

    #[test]
    fn test_from_config_uses_unpad_mode() {
        let config = GatewayConfig::from_toml(
            r#"
            mode = "test"
            merchant_id = "MS12345"
            hash_key = "0123456789abcdef0123456789abcdef"
            hash_iv = "0123456789abcdef"
            unpad_mode = "strict"
            "#,
        )
        .unwrap();
        let codec = TransactionCodec::from_config(&config).unwrap();
        assert_eq!(codec.cipher().unpad_mode(), UnpadMode::Strict);
        assert_eq!(codec.merchant_id(), "MS12345");
    }
}

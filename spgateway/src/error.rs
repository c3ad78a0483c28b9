//! Error types for the gateway codec and clients.
//!
//! This module defines every error the codec, the transport and the gateway
//! clients can return. All errors implement the standard [`std::error::Error`]
//! trait via [`thiserror::Error`].
//!
//! # Error Categories
//!
//! - **Caller errors** ([`GatewayError::MissingField`], [`GatewayError::MissingOption`],
//!   [`GatewayError::InvalidMode`], [`GatewayError::InvalidCredential`]): fix the input
//! - **Version errors** ([`GatewayError::UnsupportedProfile`]): the profile table does not
//!   know the requested message type
//! - **Codec errors** ([`GatewayError::CodecError`]): malformed hex, block misalignment or a
//!   key/IV mismatch
//! - **Decode errors** ([`GatewayError::DecodeError`]): the gateway sent a body that does not
//!   match the declared shape
//! - **Network errors** ([`GatewayError::HttpError`], [`GatewayError::TransportError`],
//!   [`GatewayError::GatewayStatus`])
//!
//! A failed check-value comparison is *not* an error. It is reported as
//! [`SignatureStatus::Invalid`](crate::codec::SignatureStatus::Invalid) so callers can inspect
//! the response and decide whether to trust it.
//!
//! # Examples
//!
//! ```
//! use spgateway::error::{GatewayError, Result};
//!
//! fn require_amount(amount: Option<&str>) -> Result<&str> {
//!     amount.ok_or_else(|| GatewayError::MissingField("Amt".to_owned()))
//! }
//!
//! assert!(require_amount(None).is_err());
//! ```

use thiserror::Error;

/// Result type alias for gateway operations.
///
/// All fallible functions in this crate return this type.
pub type Result<T> = std::result::Result<T, GatewayError>;

/// Errors that can occur while encoding, sending or decoding gateway messages.
///
/// None of these errors is retried by the codec. Retry policy, if any, belongs
/// to the [`Transport`](crate::transport::Transport) the caller plugs in.
#[must_use = "errors should be handled, propagated, or explicitly panicked"]
#[derive(Debug, Error)]
pub enum GatewayError {
    /// A required field is absent from a parameter map.
    ///
    /// Always a caller bug. The payload names the missing field.
    ///
    /// # Examples
    ///
    /// ```
    /// use spgateway::error::GatewayError;
    ///
    /// let err = GatewayError::MissingField("MerchantOrderNo".to_owned());
    /// assert_eq!(err.to_string(), r#"param "MerchantOrderNo" is required"#);
    /// ```
    #[error("param \"{0}\" is required")]
    MissingField(String),

    /// A required client option (merchant id, hash key, hash IV) is absent.
    ///
    /// Raised while constructing a client so that a misconfigured client is
    /// never usable.
    #[error("option \"{0}\" is required")]
    MissingOption(String),

    /// The configured mode is neither `test` nor `production`.
    #[error("option mode is either test or production, got: {0}")]
    InvalidMode(String),

    /// The hash key or hash IV has the wrong length.
    ///
    /// # Recovery
    ///
    /// The hash key must be exactly 32 bytes and the hash IV exactly 16 bytes,
    /// as issued in the merchant back office.
    #[error("invalid credential: {0}")]
    InvalidCredential(String),

    /// The requested wire profile is not in the profile table.
    ///
    /// Usually a version mismatch between the caller and this crate.
    #[error("unsupported API type: {0}")]
    UnsupportedProfile(String),

    /// Block cipher encoding or decoding failed.
    ///
    /// Common causes include:
    /// - Non-hex input
    /// - Ciphertext length not a multiple of the AES block size
    /// - Padding that does not match the expected scheme (strict mode)
    /// - A key/IV pair that does not match the one used to encrypt
    ///
    /// # Recovery
    ///
    /// Verify the merchant credential. Repeated failures on inbound data may
    /// indicate tampering.
    #[error("codec error: {0}")]
    CodecError(String),

    /// The gateway response does not match its declared shape.
    ///
    /// # Recovery
    ///
    /// Usually a gateway-side or network-layer problem. Log the raw body and
    /// contact the gateway if it persists.
    #[error("cannot decode gateway response: {0}")]
    DecodeError(String),

    /// HTTP request failed.
    ///
    /// Wraps [`reqwest::Error`]: timeouts, refused connections, DNS and TLS
    /// failures.
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// The transport rejected the request before sending it.
    #[error("transport error: {0}")]
    TransportError(String),

    /// The gateway answered with a non-success HTTP status.
    #[error("gateway returned status {status}")]
    GatewayStatus {
        /// HTTP status code.
        status: u16,
        /// Raw response body, lossily decoded.
        body: String,
    },

    /// Configuration could not be parsed or failed validation.
    #[error("invalid configuration: {0}")]
    ConfigError(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_field_names_field() {
        let error = GatewayError::MissingField("Amt".into());
        assert_eq!(error.to_string(), "param \"Amt\" is required");
    }

    #[test]
    fn test_missing_option_display() {
        let error = GatewayError::MissingOption("hash_iv".into());
        assert_eq!(error.to_string(), "option \"hash_iv\" is required");
    }

    #[test]
    fn test_unsupported_profile_display() {
        let error = GatewayError::UnsupportedProfile("refund-v9".into());
        assert!(error.to_string().contains("refund-v9"));
    }

    #[test]
    fn test_gateway_status_display() {
        let error = GatewayError::GatewayStatus { status: 502, body: String::new() };
        assert_eq!(error.to_string(), "gateway returned status 502");
    }

    #[test]
    fn test_codec_error_display() {
        let error = GatewayError::CodecError("odd hex length".into());
        assert_eq!(error.to_string(), "codec error: odd hex length");
    }
}

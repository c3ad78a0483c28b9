//! Gateway reply decoding.
//!
//! Replies come in three shapes: legacy form-encoded bodies, plain JSON
//! objects, and JSON objects whose payload field holds either inline JSON or
//! an encrypted hex blob. Signature checks on the last shape are reported as
//! data in [`SignatureStatus`], never as errors.

use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::{
    codec::{TransactionCodec, profile::ProfileId},
    error::{GatewayError, Result},
};

/// Expected shape of a gateway reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseShape {
    /// `key=value&...` body.
    Form,
    /// A JSON object.
    Json,
    /// A JSON object with an inline-JSON or encrypted payload field.
    EncryptedJson {
        /// Field holding the payload, e.g. `TradeInfo`.
        payload_field: &'static str,
        /// Field holding the check value of the raw payload, e.g. `TradeSha`.
        signature_field: &'static str,
        /// Raw-payload profile used to recompute the signature.
        profile: ProfileId,
    },
}

impl ResponseShape {
    /// `TradeInfo` signed by `TradeSha` under the given profile.
    #[must_use]
    pub const fn trade_info(profile: ProfileId) -> Self {
        Self::EncryptedJson { payload_field: "TradeInfo", signature_field: "TradeSha", profile }
    }
}

/// Outcome of the embedded signature check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignatureStatus {
    /// The reply carried no signature, or nothing to sign.
    NotPresent,
    /// The recomputed check value matched.
    Valid,
    /// The recomputed check value did not match.
    Invalid,
}

/// A decoded gateway reply.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedResponse {
    /// Decoded fields; for encrypted replies the inner object is merged over
    /// the outer one.
    pub fields: Map<String, Value>,
    /// Embedded signature check outcome.
    pub signature: SignatureStatus,
}

impl DecodedResponse {
    fn unsigned(fields: Map<String, Value>) -> Self {
        Self { fields, signature: SignatureStatus::NotPresent }
    }

    /// Returns true only if an embedded signature was present and matched.
    #[must_use]
    pub fn is_trusted(&self) -> bool {
        self.signature == SignatureStatus::Valid
    }

    /// Returns a field.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// Returns a string field.
    #[must_use]
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.fields.get(key).and_then(Value::as_str)
    }

    /// The gateway `Status` field, if any.
    #[must_use]
    pub fn status(&self) -> Option<&str> {
        self.get_str("Status")
    }

    /// Consumes the reply into its JSON object.
    #[must_use]
    pub fn into_value(self) -> Value {
        Value::Object(self.fields)
    }
}

/// Decodes `body` according to `shape`.
///
/// # Errors
///
/// Returns [`GatewayError::DecodeError`] for malformed bodies and
/// [`GatewayError::CodecError`] if an encrypted payload cannot be decrypted.
/// An unknown signature profile yields [`GatewayError::UnsupportedProfile`].
pub fn decode(body: &[u8], shape: &ResponseShape, codec: &TransactionCodec) -> Result<DecodedResponse> {
    match *shape {
        ResponseShape::Form => decode_form(body).map(DecodedResponse::unsigned),
        ResponseShape::Json => decode_json(body).map(DecodedResponse::unsigned),
        ResponseShape::EncryptedJson { payload_field, signature_field, profile } => {
            decode_encrypted_fields(decode_json(body)?, payload_field, signature_field, profile, codec)
        }
    }
}

/// Parses a form-encoded body.
///
/// Empty segments are skipped, both sides are percent-decoded (`+` is left
/// as is) and the last duplicate key wins.
///
/// # Errors
///
/// Returns [`GatewayError::DecodeError`] for a segment without `=` or an
/// escape that does not decode to UTF-8.
pub fn decode_form(body: &[u8]) -> Result<Map<String, Value>> {
    let text = body_str(body)?;
    let mut fields = Map::new();

    for segment in text.trim().split('&').filter(|s| !s.is_empty()) {
        let Some((key, value)) = segment.split_once('=') else {
            return Err(GatewayError::DecodeError(format!("form segment without '=': {segment}")));
        };
        fields.insert(percent_decode(key)?, Value::String(percent_decode(value)?));
    }
    Ok(fields)
}

/// Parses a JSON object body.
///
/// # Errors
///
/// Returns [`GatewayError::DecodeError`] if the body is not a JSON object.
pub fn decode_json(body: &[u8]) -> Result<Map<String, Value>> {
    parse_object(body_str(body)?)
}

/// Replaces a string field that holds JSON text with the parsed value.
///
/// Fields that are absent, not strings, empty, or not JSON are left alone.
pub fn expand_nested_json(fields: &mut Map<String, Value>, field: &str) {
    let Some(Value::String(text)) = fields.get(field) else {
        return;
    };
    if text.is_empty() {
        return;
    }
    match serde_json::from_str::<Value>(text) {
        Ok(parsed) => {
            fields.insert(field.to_owned(), parsed);
        }
        Err(e) => debug!(field, error = %e, "nested field is not JSON, keeping text"),
    }
}

/// Decodes the payload field of an already-parsed object.
///
/// This is the second half of [`ResponseShape::EncryptedJson`] decoding,
/// usable on notification fields that arrive as a form rather than a body.
///
/// # Errors
///
/// Same as [`decode`].
pub fn decode_encrypted_fields(
    mut fields: Map<String, Value>,
    payload_field: &str,
    signature_field: &str,
    profile: ProfileId,
    codec: &TransactionCodec,
) -> Result<DecodedResponse> {
    let Some(payload) = fields.get(payload_field).and_then(Value::as_str).map(str::to_owned) else {
        debug!(payload_field, "reply carries no payload");
        return Ok(DecodedResponse::unsigned(fields));
    };

    let signature = match fields.get(signature_field).and_then(Value::as_str) {
        Some(candidate) => {
            if codec.engine().verify_payload_for(profile, &payload, candidate)? {
                SignatureStatus::Valid
            } else {
                warn!(signature_field, "reply signature does not match payload");
                SignatureStatus::Invalid
            }
        }
        None => SignatureStatus::NotPresent,
    };

    let inner = if payload.starts_with('{') {
        debug!(payload_field, "payload is inline JSON");
        parse_object(&payload)?
    } else {
        debug!(payload_field, "payload is encrypted");
        parse_object(&codec.cipher().decode_str(&payload)?)?
    };

    fields.extend(inner);
    Ok(DecodedResponse { fields, signature })
}

fn body_str(body: &[u8]) -> Result<&str> {
    std::str::from_utf8(body)
        .map_err(|e| GatewayError::DecodeError(format!("body is not valid UTF-8: {e}")))
}

fn parse_object(text: &str) -> Result<Map<String, Value>> {
    match serde_json::from_str::<Value>(text) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(other) => Err(GatewayError::DecodeError(format!(
            "expected a JSON object, got {}",
            json_kind(&other)
        ))),
        Err(e) => Err(GatewayError::DecodeError(format!("invalid JSON: {e}"))),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

fn percent_decode(raw: &str) -> Result<String> {
    urlencoding::decode(raw)
        .map(std::borrow::Cow::into_owned)
        .map_err(|e| GatewayError::DecodeError(format!("invalid percent escape in {raw:?}: {e}")))
}

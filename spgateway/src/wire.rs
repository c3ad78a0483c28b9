//! Request envelopes.
//!
//! Every outbound request is a flat form: either the plain fields with a
//! `CheckValue` appended, or a short envelope wrapping an encrypted blob.
//! Envelopes serialize with their gateway field names so callers can render
//! them into auto-submitting HTML forms.

use serde::Serialize;

use crate::codec::{CheckValue, EncryptedPayload, ParamMap};

/// Ordered `(name, value)` pairs of a form post.
pub type FormFields = Vec<(String, String)>;

/// Field name of the check value appended to plain field maps.
pub const CHECK_VALUE_FIELD: &str = "CheckValue";

/// `MerchantID_` + `PostData_` envelope of the non-checksum APIs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PostDataEnvelope {
    /// Merchant identifier.
    #[serde(rename = "MerchantID_")]
    pub merchant_id: String,
    /// Encrypted parameters.
    #[serde(rename = "PostData_")]
    pub post_data: EncryptedPayload,
}

impl PostDataEnvelope {
    /// Converts the envelope into form fields.
    #[must_use]
    pub fn into_form_fields(self) -> FormFields {
        vec![
            ("MerchantID_".to_owned(), self.merchant_id),
            ("PostData_".to_owned(), self.post_data.into_string()),
        ]
    }
}

/// `TradeInfo` + `TradeSha` envelope of MPG 2.0 style APIs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct TradeInfoEnvelope {
    /// Merchant identifier.
    #[serde(rename = "MerchantID")]
    pub merchant_id: String,
    /// Encrypted parameters.
    pub trade_info: EncryptedPayload,
    /// Check value over `trade_info`.
    pub trade_sha: CheckValue,
    /// Protocol version sent outside the encrypted blob.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

impl TradeInfoEnvelope {
    /// Converts the envelope into form fields.
    #[must_use]
    pub fn into_form_fields(self) -> FormFields {
        let mut fields = vec![
            ("MerchantID".to_owned(), self.merchant_id),
            ("TradeInfo".to_owned(), self.trade_info.into_string()),
            ("TradeSha".to_owned(), self.trade_sha.into_string()),
        ];
        if let Some(version) = self.version {
            fields.push(("Version".to_owned(), version));
        }
        fields
    }
}

/// E-wallet envelope with underscore-suffixed field names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EncryptDataEnvelope {
    /// Merchant identifier.
    #[serde(rename = "UID_")]
    pub uid: String,
    /// API version.
    #[serde(rename = "Version_")]
    pub version: String,
    /// Reply format, `JSON` in practice.
    #[serde(rename = "RespondType_")]
    pub respond_type: String,
    /// Encrypted JSON payload.
    #[serde(rename = "EncryptData_")]
    pub encrypt_data: EncryptedPayload,
    /// Check value over `encrypt_data`.
    #[serde(rename = "HashData_")]
    pub hash_data: CheckValue,
}

impl EncryptDataEnvelope {
    /// Converts the envelope into form fields.
    #[must_use]
    pub fn into_form_fields(self) -> FormFields {
        vec![
            ("UID_".to_owned(), self.uid),
            ("Version_".to_owned(), self.version),
            ("RespondType_".to_owned(), self.respond_type),
            ("EncryptData_".to_owned(), self.encrypt_data.into_string()),
            ("HashData_".to_owned(), self.hash_data.into_string()),
        ]
    }
}

/// Appends `CheckValue` to a plain field map.
#[must_use]
pub fn with_check_value(params: ParamMap, check_value: CheckValue) -> ParamMap {
    params.with(CHECK_VALUE_FIELD, check_value.into_string())
}

impl From<PostDataEnvelope> for FormFields {
    fn from(envelope: PostDataEnvelope) -> Self {
        envelope.into_form_fields()
    }
}

impl From<TradeInfoEnvelope> for FormFields {
    fn from(envelope: TradeInfoEnvelope) -> Self {
        envelope.into_form_fields()
    }
}

impl From<EncryptDataEnvelope> for FormFields {
    fn from(envelope: EncryptDataEnvelope) -> Self {
        envelope.into_form_fields()
    }
}

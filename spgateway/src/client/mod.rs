//! Gateway clients.
//!
//! Each client binds one merchant credential, one [`Mode`] and one
//! [`Transport`]. Caller parameters are merged over per-call defaults
//! ("defaults first, caller params override") and either signed in place
//! with a `CheckValue` or encrypted into an envelope.
//!
//! | Client | Gateway | Reply shape |
//! |--------|---------|-------------|
//! | [`Client`] | `*.spgateway.com` | form |
//! | [`ClientV2`] | `*.newebpay.com` | JSON |
//! | [`InvoiceClient`] | `*.ezpay.com.tw` | JSON with nested `Result` |
//! | [`LinePayClient`] | `*.newebpay.com` | JSON with `TradeInfo` |

use tracing::{debug, instrument};

use crate::{
    codec::{
        CheckValue, DecodedResponse, EncryptedPayload, ParamMap, ProfileId, ResponseShape,
        TransactionCodec,
    },
    config::{GatewayConfig, Mode},
    endpoints::EndpointId,
    error::{GatewayError, Result},
    transport::{HttpTransport, Transport},
    wire::{self, FormFields, PostDataEnvelope},
};

pub mod invoice;
pub mod legacy;
pub mod line_pay;
pub mod v2;

#[cfg(test)]
pub(crate) mod testing;

pub use invoice::InvoiceClient;
pub use legacy::Client;
pub use line_pay::LinePayClient;
pub use v2::ClientV2;

/// Current Unix time, the default `TimeStamp`.
#[must_use]
pub fn unix_timestamp() -> i64 {
    chrono::Utc::now().timestamp()
}

/// Checks that every `names` field is present in `params`.
///
/// # Errors
///
/// Returns [`GatewayError::MissingField`] naming the first absent field.
pub(crate) fn require(params: &ParamMap, names: &[&str]) -> Result<()> {
    match names.iter().find(|name| !params.contains_key(name)) {
        Some(missing) => Err(GatewayError::MissingField((*missing).to_owned())),
        None => Ok(()),
    }
}

/// Checks that the transaction is identified by order number or trade number.
pub(crate) fn require_order_or_trade_no(params: &ParamMap) -> Result<()> {
    if params.contains_key("MerchantOrderNo") || params.contains_key("TradeNo") {
        Ok(())
    } else {
        Err(GatewayError::MissingField("MerchantOrderNo or TradeNo".to_owned()))
    }
}

/// Builds per-call defaults with the current `TimeStamp` and overlays `params`.
pub(crate) fn with_defaults(defaults: &[(&str, &str)], params: &ParamMap) -> ParamMap {
    let mut merged: ParamMap = defaults.iter().copied().collect();
    if !merged.contains_key("TimeStamp") {
        merged.insert("TimeStamp", unix_timestamp());
    }
    merged.merge(params)
}

/// State shared by every client.
#[derive(Debug, Clone)]
pub(crate) struct ClientCore<T> {
    codec: TransactionCodec,
    mode: Mode,
    transport: T,
}

impl ClientCore<HttpTransport> {
    pub(crate) fn from_config(config: &GatewayConfig) -> Result<Self> {
        config.validate()?;
        let transport = HttpTransport::with_config(&config.http)?;
        Self::new(config, transport)
    }
}

impl<T: Transport> ClientCore<T> {
    pub(crate) fn new(config: &GatewayConfig, transport: T) -> Result<Self> {
        let codec = TransactionCodec::from_config(config)?;
        debug!(mode = %config.mode, protocol = transport.protocol_name(), "gateway client ready");
        Ok(Self { codec, mode: config.mode, transport })
    }

    pub(crate) fn codec(&self) -> &TransactionCodec {
        &self.codec
    }

    pub(crate) fn mode(&self) -> Mode {
        self.mode
    }

    pub(crate) fn merchant_id(&self) -> &str {
        self.codec.merchant_id()
    }

    /// Sets `MerchantID` and appends the profile's `CheckValue`.
    pub(crate) fn sign_fields(&self, profile: &str, params: ParamMap) -> Result<ParamMap> {
        let params = params.with("MerchantID", self.merchant_id());
        let check_value = self.codec.engine().compute_check_value(profile, &params)?;
        Ok(wire::with_check_value(params, check_value))
    }

    pub(crate) fn encrypt(&self, params: &ParamMap) -> Result<EncryptedPayload> {
        self.codec.encode_params(params, &[])
    }

    pub(crate) fn payload_check_value(
        &self,
        profile: &str,
        payload: &EncryptedPayload,
    ) -> Result<CheckValue> {
        self.codec.engine().compute_payload_check_value(profile, payload.as_str())
    }

    pub(crate) fn post_data(&self, params: &ParamMap) -> Result<PostDataEnvelope> {
        Ok(PostDataEnvelope { merchant_id: self.merchant_id().to_owned(), post_data: self.encrypt(params)? })
    }

    /// Posts `fields` to the endpoint and decodes the reply.
    #[instrument(skip(self, fields), fields(mode = %self.mode))]
    pub(crate) async fn post(
        &self,
        endpoint: EndpointId,
        fields: FormFields,
        shape: ResponseShape,
    ) -> Result<DecodedResponse> {
        let url = endpoint.url(self.mode);
        let response = self.transport.post_form(url, &fields).await?;
        debug!(status = response.status, "decoding gateway reply");
        self.codec.decode_response(&response.body, &shape)
    }

    pub(crate) fn verify_check_code(&self, params: &ParamMap) -> bool {
        self.codec.engine().verify_check_code(params)
    }

    pub(crate) fn decode_trade_info(
        &self,
        profile: ProfileId,
        trade_info: &str,
        trade_sha: Option<&str>,
    ) -> Result<DecodedResponse> {
        let mut fields = serde_json::Map::new();
        fields.insert("TradeInfo".to_owned(), trade_info.into());
        if let Some(trade_sha) = trade_sha {
            fields.insert("TradeSha".to_owned(), trade_sha.into());
        }
        crate::codec::response::decode_encrypted_fields(
            fields,
            "TradeInfo",
            "TradeSha",
            profile,
            &self.codec,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_names_first_missing() {
        let params = ParamMap::new().with("Amt", 1);
        let err = require(&params, &["Amt", "MerchantOrderNo", "ItemDesc"]).unwrap_err();
        assert!(matches!(err, GatewayError::MissingField(ref f) if f == "MerchantOrderNo"));
    }

    #[test]
    fn test_require_order_or_trade_no() {
        assert!(require_order_or_trade_no(&ParamMap::new().with("TradeNo", "T1")).is_ok());
        assert!(require_order_or_trade_no(&ParamMap::new().with("MerchantOrderNo", "O1")).is_ok());
        let err = require_order_or_trade_no(&ParamMap::new().with("Amt", 1)).unwrap_err();
        assert_eq!(err.to_string(), r#"param "MerchantOrderNo or TradeNo" is required"#);
    }

    #[test]
    fn test_with_defaults_caller_wins_and_order_kept() {
        let params = ParamMap::new().with("Amt", 100).with("Version", "9.9").with("TimeStamp", 1);
        let merged = with_defaults(&[("RespondType", "JSON"), ("Version", "1.0")], &params);

        let keys: Vec<&str> = merged.keys().collect();
        assert_eq!(keys, ["RespondType", "Version", "TimeStamp", "Amt"]);
        assert_eq!(merged.get("Version").unwrap().to_string(), "9.9");
        assert_eq!(merged.get("TimeStamp").unwrap().to_string(), "1");
    }

    #[test]
    fn test_with_defaults_fills_timestamp() {
        let merged = with_defaults(&[], &ParamMap::new());
        let stamp: i64 = merged.get("TimeStamp").unwrap().to_string().parse().unwrap();
        assert!(stamp > 1_600_000_000);
    }
}

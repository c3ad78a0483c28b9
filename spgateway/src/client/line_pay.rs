//! LINE Pay refund client.

use tracing::instrument;

use super::{ClientCore, require};
use crate::{
    codec::{DecodedResponse, ParamMap, ProfileId, ResponseShape, TransactionCodec},
    config::{GatewayConfig, Mode},
    endpoints::EndpointId,
    error::Result,
    transport::{HttpTransport, Transport},
    wire::TradeInfoEnvelope,
};

const REFUND_VERSION: &str = "1.0";

/// Client for LINE Pay refunds on `newebpay.com`.
#[derive(Debug, Clone)]
pub struct LinePayClient<T = HttpTransport> {
    core: ClientCore<T>,
}

impl LinePayClient<HttpTransport> {
    /// Creates a client over HTTPS.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::GatewayError::MissingOption`] if any merchant
    /// option is absent, or any other configuration error.
    pub fn new(config: &GatewayConfig) -> Result<Self> {
        Ok(Self { core: ClientCore::from_config(config)? })
    }
}

impl<T: Transport> LinePayClient<T> {
    /// Creates a client over a caller-supplied transport.
    ///
    /// # Errors
    ///
    /// Same as [`LinePayClient::new`].
    pub fn with_transport(config: &GatewayConfig, transport: T) -> Result<Self> {
        Ok(Self { core: ClientCore::new(config, transport)? })
    }

    /// Selected environment.
    #[must_use]
    pub fn mode(&self) -> Mode {
        self.core.mode()
    }

    /// Underlying codec.
    #[must_use]
    pub fn codec(&self) -> &TransactionCodec {
        self.core.codec()
    }

    /// Refunds a LINE Pay payment.
    ///
    /// `MerchantID` plus the caller's fields are encrypted into `TradeInfo`;
    /// `Version` travels in clear. The reply's `TradeInfo` may be inline JSON
    /// or an encrypted blob, and its `TradeSha` check is reported in
    /// [`DecodedResponse::signature`].
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::GatewayError::MissingField`] if
    /// `MerchantOrderNo` or `RefundAmount` is absent, and transport, decode or
    /// codec errors.
    #[instrument(skip(self, params))]
    pub async fn refund(&self, params: &ParamMap) -> Result<DecodedResponse> {
        require(params, &["MerchantOrderNo", "RefundAmount"])?;
        let raw = ParamMap::new().with("MerchantID", self.core.merchant_id()).merge(params);

        let trade_info = self.core.encrypt(&raw)?;
        let trade_sha = self.core.payload_check_value("wallet-refund", &trade_info)?;
        let envelope = TradeInfoEnvelope {
            merchant_id: self.core.merchant_id().to_owned(),
            trade_info,
            trade_sha,
            version: Some(REFUND_VERSION.to_owned()),
        };

        self.core
            .post(
                EndpointId::LinePayRefund,
                envelope.into_form_fields(),
                ResponseShape::trade_info(ProfileId::WalletRefund),
            )
            .await
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::{
        client::testing::{RecordingTransport, test_config},
        codec::SignatureStatus,
        error::GatewayError,
    };

    fn client(transport: &RecordingTransport) -> LinePayClient<RecordingTransport> {
        LinePayClient::with_transport(&test_config(), transport.clone()).unwrap()
    }

    fn refund_params() -> ParamMap {
        ParamMap::new().with("MerchantOrderNo", "O1").with("RefundAmount", 100)
    }

    #[tokio::test]
    async fn test_refund_request_envelope() {
        let transport = RecordingTransport::replying(r#"{"Status":"SUCCESS"}"#);
        let client = client(&transport);
        client.refund(&refund_params()).await.unwrap();

        let request = transport.last_request();
        assert_eq!(request.url, "https://ccore.newebpay.com/API/LinePay/refund");
        assert_eq!(request.names(), ["MerchantID", "TradeInfo", "TradeSha", "Version"]);
        assert_eq!(request.field("Version"), Some("1.0"));

        let trade_info = request.field("TradeInfo").unwrap();
        assert_eq!(
            client.codec().cipher().decode_str(trade_info).unwrap(),
            "MerchantID=MS12345&MerchantOrderNo=O1&RefundAmount=100"
        );
        assert!(
            client
                .codec()
                .engine()
                .verify_payload_check_value(
                    "wallet-refund",
                    trade_info,
                    request.field("TradeSha").unwrap()
                )
                .unwrap()
        );
    }

    #[tokio::test]
    async fn test_refund_reply_with_encrypted_trade_info() {
        let transport = RecordingTransport::replying(
            r#"{"Status":"SUCCESS","TradeInfo":"a6a33edeab69cbb6cf7153eb75d3c8fca5993bcb8ef63163fcc306d723e8030d","TradeSha":"259D697CED40D2D0703E688A27616F952B0BC4B077263AD5008FEA8444EB4F2B"}"#,
        );
        let reply = client(&transport).refund(&refund_params()).await.unwrap();

        assert_eq!(reply.signature, SignatureStatus::Valid);
        assert_eq!(reply.get("Amt"), Some(&json!(100)));
    }

    #[tokio::test]
    async fn test_refund_reply_with_inline_trade_info() {
        let transport = RecordingTransport::replying(
            r#"{"Status":"SUCCESS","TradeInfo":"{\"RefundAmount\":100,\"Status\":\"REFUNDED\"}","TradeSha":"00"}"#,
        );
        let reply = client(&transport).refund(&refund_params()).await.unwrap();

        assert_eq!(reply.signature, SignatureStatus::Invalid);
        assert!(!reply.is_trusted());
        assert_eq!(reply.status(), Some("REFUNDED"));
        assert_eq!(reply.get("RefundAmount"), Some(&json!(100)));
    }

    #[tokio::test]
    async fn test_refund_requires_amount() {
        let transport = RecordingTransport::default();
        let err = client(&transport)
            .refund(&ParamMap::new().with("MerchantOrderNo", "O1"))
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::MissingField(ref f) if f == "RefundAmount"));
        assert!(transport.requests().is_empty());
    }
}

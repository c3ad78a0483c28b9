//! `newebpay.com` client.
//!
//! Requests use `RespondType=JSON`. Hosted checkout data travels in an
//! encrypted `TradeInfo` signed by `TradeSha`; back-office calls use the
//! `PostData_` envelope, except e-wallet refunds which use `EncryptData_`.

use tracing::instrument;

use super::{ClientCore, require, require_order_or_trade_no, unix_timestamp, with_defaults};
use crate::{
    codec::{DecodedResponse, ParamMap, ProfileId, ResponseShape, TransactionCodec},
    config::{GatewayConfig, Mode},
    endpoints::EndpointId,
    error::{GatewayError, Result},
    transport::{HttpTransport, Transport},
    wire::{EncryptDataEnvelope, PostDataEnvelope, TradeInfoEnvelope},
};

/// Endpoints addressable through [`ClientV2::api_url_for`].
const API_TYPES: [EndpointId; 7] = [
    EndpointId::MpgGateway,
    EndpointId::Period,
    EndpointId::QueryTradeInfo,
    EndpointId::CreditCardCancel,
    EndpointId::CreditCardClose,
    EndpointId::PeriodAlterStatus,
    EndpointId::EWalletRefund,
];

const MPG_VERSION: &str = "2.0";

/// Client for the `newebpay.com` gateway generation.
///
/// # Examples
///
/// ```
/// use spgateway::{
///     client::ClientV2,
///     codec::ParamMap,
///     config::{GatewayConfig, Mode},
/// };
///
/// # fn example() -> spgateway::error::Result<()> {
/// let config = GatewayConfig::new(
///     Mode::Test,
///     "MS12345",
///     "0123456789abcdef0123456789abcdef",
///     "0123456789abcdef",
/// );
/// let client = ClientV2::new(&config)?;
///
/// let envelope = client.generate_mpg_params(
///     &ParamMap::new()
///         .with("MerchantOrderNo", "ORDER1")
///         .with("Amt", 1000)
///         .with("ItemDesc", "Green tea"),
/// )?;
/// assert_eq!(envelope.version.as_deref(), Some("2.0"));
/// assert_eq!(client.api_url_for("mpg")?, "https://ccore.newebpay.com/MPG/mpg_gateway");
/// # Ok(())
/// # }
/// # example().unwrap();
/// ```
#[derive(Debug, Clone)]
pub struct ClientV2<T = HttpTransport> {
    core: ClientCore<T>,
}

impl ClientV2<HttpTransport> {
    /// Creates a client over HTTPS.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::MissingOption`] if any merchant option is
    /// absent, or any other configuration error.
    pub fn new(config: &GatewayConfig) -> Result<Self> {
        Ok(Self { core: ClientCore::from_config(config)? })
    }
}

impl<T: Transport> ClientV2<T> {
    /// Creates a client over a caller-supplied transport.
    ///
    /// # Errors
    ///
    /// Same as [`ClientV2::new`].
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

    /// Builds the `TradeInfo` envelope of a hosted checkout form.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::MissingField`] if `MerchantOrderNo`, `Amt` or
    /// `ItemDesc` is absent.
    pub fn generate_mpg_params(&self, params: &ParamMap) -> Result<TradeInfoEnvelope> {
        require(params, &["MerchantOrderNo", "Amt", "ItemDesc"])?;
        let fields = ParamMap::new()
            .with("MerchantID", self.core.merchant_id())
            .with("RespondType", "JSON")
            .with("TimeStamp", unix_timestamp())
            .with("Version", MPG_VERSION)
            .merge(params);

        let trade_info = self.core.encrypt(&fields)?;
        let trade_sha = self.core.payload_check_value("trade-sha", &trade_info)?;
        Ok(TradeInfoEnvelope {
            merchant_id: self.core.merchant_id().to_owned(),
            trade_info,
            trade_sha,
            version: Some(MPG_VERSION.to_owned()),
        })
    }

    /// Builds the `PostData_` envelope of a recurring-billing form (version 1.5).
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::MissingField`] if any period field is absent.
    pub fn generate_credit_card_period_params(&self, params: &ParamMap) -> Result<PostDataEnvelope> {
        require(
            params,
            &[
                "MerOrderNo",
                "ProdDesc",
                "PeriodAmt",
                "PeriodType",
                "PeriodPoint",
                "PeriodStartType",
                "PeriodTimes",
                "ReturnURL",
                "PayerEmail",
                "NotifyURL",
                "BackURL",
            ],
        )?;
        let fields = with_defaults(&[("RespondType", "JSON"), ("Version", "1.5")], params);
        self.core.post_data(&fields)
    }

    /// Suspends, terminates or restarts a subscription.
    ///
    /// # Errors
    ///
    /// Returns a missing-field error if `MerOrderNo`, `PeriodNo` or
    /// `AlterType` is absent, and transport or decode errors.
    #[instrument(skip(self, params))]
    pub async fn change_subscription_status(&self, params: &ParamMap) -> Result<DecodedResponse> {
        require(params, &["MerOrderNo", "PeriodNo", "AlterType"])?;
        let fields = with_defaults(&[("Version", "1.0"), ("RespondType", "JSON")], params);
        let envelope = self.core.post_data(&fields)?;
        self.core
            .post(EndpointId::PeriodAlterStatus, envelope.into_form_fields(), ResponseShape::Json)
            .await
    }

    /// Queries a transaction (version 1.3).
    ///
    /// # Errors
    ///
    /// Returns a missing-field error if `MerchantOrderNo` or `Amt` is absent,
    /// and transport or decode errors.
    #[instrument(skip(self, params))]
    pub async fn query_trade_info(&self, params: &ParamMap) -> Result<DecodedResponse> {
        require(params, &["MerchantOrderNo", "Amt"])?;
        let fields = with_defaults(&[("Version", "1.3"), ("RespondType", "JSON")], params);
        let signed = self.core.sign_fields("transaction-query", fields)?;
        self.core
            .post(EndpointId::QueryTradeInfo, signed.to_form_fields(), ResponseShape::Json)
            .await
    }

    /// Cancels a credit card authorization.
    ///
    /// # Errors
    ///
    /// Returns a missing-field error if `Amt`, `IndexType` or both of
    /// `MerchantOrderNo` / `TradeNo` are absent, and transport or decode
    /// errors.
    #[instrument(skip(self, params))]
    pub async fn credit_card_deauthorize(&self, params: &ParamMap) -> Result<DecodedResponse> {
        require(params, &["Amt", "IndexType"])?;
        require_order_or_trade_no(params)?;
        let fields = with_defaults(&[("RespondType", "JSON"), ("Version", "1.0")], params);
        let envelope = self.core.post_data(&fields)?;
        self.core
            .post(EndpointId::CreditCardCancel, envelope.into_form_fields(), ResponseShape::Json)
            .await
    }

    /// [`Self::credit_card_deauthorize`] keyed by merchant order number.
    ///
    /// # Errors
    ///
    /// Same as [`Self::credit_card_deauthorize`].
    pub async fn credit_card_deauthorize_by_merchant_order_no(
        &self,
        params: &ParamMap,
    ) -> Result<DecodedResponse> {
        require(params, &["Amt", "MerchantOrderNo"])?;
        self.credit_card_deauthorize(&ParamMap::new().with("IndexType", 1).merge(params)).await
    }

    /// [`Self::credit_card_deauthorize`] keyed by gateway trade number.
    ///
    /// # Errors
    ///
    /// Same as [`Self::credit_card_deauthorize`].
    pub async fn credit_card_deauthorize_by_trade_no(
        &self,
        params: &ParamMap,
    ) -> Result<DecodedResponse> {
        require(params, &["Amt", "TradeNo"])?;
        self.credit_card_deauthorize(&ParamMap::new().with("IndexType", 2).merge(params)).await
    }

    /// Requests collection (`CloseType=1`) or refund (`CloseType=2`) of a
    /// card payment (version 1.1).
    ///
    /// # Errors
    ///
    /// Returns a missing-field error if `Amt`, `IndexType`, `CloseType` or
    /// both of `MerchantOrderNo` / `TradeNo` are absent, and transport or
    /// decode errors.
    #[instrument(skip(self, params))]
    pub async fn credit_card_collect_refund(&self, params: &ParamMap) -> Result<DecodedResponse> {
        require(params, &["Amt", "IndexType", "CloseType"])?;
        require_order_or_trade_no(params)?;
        let fields = with_defaults(&[("RespondType", "JSON"), ("Version", "1.1")], params);
        let envelope = self.core.post_data(&fields)?;
        self.core
            .post(EndpointId::CreditCardClose, envelope.into_form_fields(), ResponseShape::Json)
            .await
    }

    /// Collects a card payment keyed by merchant order number.
    ///
    /// # Errors
    ///
    /// Same as [`Self::credit_card_collect_refund`].
    pub async fn credit_card_collect_by_merchant_order_no(
        &self,
        params: &ParamMap,
    ) -> Result<DecodedResponse> {
        require(params, &["Amt", "MerchantOrderNo"])?;
        self.close(1, 1, params).await
    }

    /// Collects a card payment keyed by gateway trade number.
    ///
    /// # Errors
    ///
    /// Same as [`Self::credit_card_collect_refund`].
    pub async fn credit_card_collect_by_trade_no(
        &self,
        params: &ParamMap,
    ) -> Result<DecodedResponse> {
        require(params, &["Amt", "TradeNo"])?;
        self.close(2, 1, params).await
    }

    /// Refunds a card payment keyed by merchant order number.
    ///
    /// # Errors
    ///
    /// Same as [`Self::credit_card_collect_refund`].
    pub async fn credit_card_refund_by_merchant_order_no(
        &self,
        params: &ParamMap,
    ) -> Result<DecodedResponse> {
        require(params, &["Amt", "MerchantOrderNo"])?;
        self.close(1, 2, params).await
    }

    /// Refunds a card payment keyed by gateway trade number.
    ///
    /// # Errors
    ///
    /// Same as [`Self::credit_card_collect_refund`].
    pub async fn credit_card_refund_by_trade_no(
        &self,
        params: &ParamMap,
    ) -> Result<DecodedResponse> {
        require(params, &["Amt", "TradeNo"])?;
        self.close(2, 2, params).await
    }

    async fn close(
        &self,
        index_type: i64,
        close_type: i64,
        params: &ParamMap,
    ) -> Result<DecodedResponse> {
        let keyed = ParamMap::new()
            .with("IndexType", index_type)
            .with("CloseType", close_type)
            .merge(params);
        self.credit_card_collect_refund(&keyed).await
    }

    /// Refunds an e-wallet payment.
    ///
    /// The parameters are sent as a JSON object in `EncryptData_`, signed by
    /// `HashData_`.
    ///
    /// # Errors
    ///
    /// Returns a missing-field error if `Amount`, `PaymentType` or
    /// `MerchantOrderNo` is absent, and transport or decode errors.
    #[instrument(skip(self, params))]
    pub async fn ewallet_refund_by_merchant_order_no(
        &self,
        params: &ParamMap,
    ) -> Result<DecodedResponse> {
        require(params, &["Amount", "PaymentType", "MerchantOrderNo"])?;
        let fields = with_defaults(&[], params);

        let encrypt_data = self.core.codec().cipher().encode(fields.to_json().to_string());
        let hash_data = self.core.payload_check_value("wallet-refund", &encrypt_data)?;
        let envelope = EncryptDataEnvelope {
            uid: self.core.merchant_id().to_owned(),
            version: "1.0".to_owned(),
            respond_type: "JSON".to_owned(),
            encrypt_data,
            hash_data,
        };
        self.core
            .post(EndpointId::EWalletRefund, envelope.into_form_fields(), ResponseShape::Json)
            .await
    }

    /// Returns the URL of a named API in the configured mode.
    ///
    /// Accepted names: `mpg`, `period`, `query_trade_info`,
    /// `credit_card_deauthorize`, `credit_card_collect_refund`,
    /// `change_subscription_status`, `ewallet_refund`.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::UnsupportedProfile`] for any other name.
    pub fn api_url_for(&self, api_type: &str) -> Result<&'static str> {
        let id = EndpointId::from_name(api_type)?;
        if !API_TYPES.contains(&id) {
            return Err(GatewayError::UnsupportedProfile(api_type.to_owned()));
        }
        Ok(id.url(self.core.mode()))
    }

    /// Decodes the `TradeInfo` of a payment notification.
    ///
    /// When `trade_sha` is given it is checked against `trade_info` and the
    /// outcome reported in [`DecodedResponse::signature`].
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::CodecError`] if the blob cannot be decrypted
    /// and [`GatewayError::DecodeError`] if it is not a JSON object.
    pub fn decode_trade_info(
        &self,
        trade_info: &str,
        trade_sha: Option<&str>,
    ) -> Result<DecodedResponse> {
        self.core.decode_trade_info(ProfileId::TradeSha, trade_info, trade_sha)
    }

    /// Verifies the `CheckCode` of an inbound notification.
    #[must_use]
    pub fn verify_check_code(&self, params: &ParamMap) -> bool {
        self.core.verify_check_code(params)
    }
}

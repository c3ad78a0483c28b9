//! Legacy `spgateway.com` client.
//!
//! Requests use `RespondType=String` and replies are form-encoded.

use tracing::instrument;

use super::{ClientCore, require, require_order_or_trade_no, with_defaults};
use crate::{
    codec::{DecodedResponse, ParamMap, ResponseShape, TransactionCodec},
    config::{GatewayConfig, Mode},
    endpoints::EndpointId,
    error::Result,
    transport::{HttpTransport, Transport},
};

/// Client for the legacy gateway generation.
///
/// # Examples
///
/// ```
/// use spgateway::{
///     client::Client,
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
/// let client = Client::new(&config)?;
///
/// let form = client.generate_mpg_params(
///     &ParamMap::new()
///         .with("MerchantOrderNo", "ORDER1")
///         .with("Amt", 1000)
///         .with("ItemDesc", "Green tea")
///         .with("Email", "buyer@example.com")
///         .with("LoginType", 0),
/// )?;
/// assert!(form.contains_key("CheckValue"));
/// # Ok(())
/// # }
/// # example().unwrap();
/// ```
#[derive(Debug, Clone)]
pub struct Client<T = HttpTransport> {
    core: ClientCore<T>,
}

impl Client<HttpTransport> {
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

impl<T: Transport> Client<T> {
    /// Creates a client over a caller-supplied transport.
    ///
    /// # Errors
    ///
    /// Same as [`Client::new`].
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

    /// Builds the signed field map of a hosted checkout form (version 1.2).
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::GatewayError::MissingField`] if `MerchantOrderNo`,
    /// `Amt`, `ItemDesc`, `Email` or `LoginType` is absent.
    pub fn generate_mpg_params(&self, params: &ParamMap) -> Result<ParamMap> {
        require(params, &["MerchantOrderNo", "Amt", "ItemDesc", "Email", "LoginType"])?;
        let fields =
            with_defaults(&[("RespondType", "String"), ("Version", "1.2")], params);
        self.core.sign_fields("card-payment", fields)
    }

    /// Queries a transaction (version 1.1).
    ///
    /// # Errors
    ///
    /// Returns a missing-field error if `MerchantOrderNo` or `Amt` is absent,
    /// and transport or decode errors.
    #[instrument(skip(self, params))]
    pub async fn query_trade_info(&self, params: &ParamMap) -> Result<DecodedResponse> {
        require(params, &["MerchantOrderNo", "Amt"])?;
        let fields = with_defaults(&[("Version", "1.1"), ("RespondType", "String")], params);
        let signed = self.core.sign_fields("transaction-query", fields)?;
        self.core
            .post(EndpointId::LegacyQueryTradeInfo, signed.to_form_fields(), ResponseShape::Form)
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
        let fields =
            with_defaults(&[("RespondType", "String"), ("Version", "1.0")], params);
        let envelope = self.core.post_data(&fields)?;
        self.core
            .post(EndpointId::LegacyCreditCardCancel, envelope.into_form_fields(), ResponseShape::Form)
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

    /// Requests collection or refund of a captured card payment.
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
        let fields =
            with_defaults(&[("RespondType", "String"), ("Version", "1.0")], params);
        let envelope = self.core.post_data(&fields)?;
        self.core
            .post(EndpointId::LegacyCreditCardClose, envelope.into_form_fields(), ResponseShape::Form)
            .await
    }

    /// [`Self::credit_card_collect_refund`] keyed by merchant order number.
    ///
    /// # Errors
    ///
    /// Same as [`Self::credit_card_collect_refund`].
    pub async fn credit_card_collect_refund_by_merchant_order_no(
        &self,
        params: &ParamMap,
    ) -> Result<DecodedResponse> {
        require(params, &["Amt", "MerchantOrderNo", "CloseType"])?;
        self.credit_card_collect_refund(&ParamMap::new().with("IndexType", 1).merge(params)).await
    }

    /// [`Self::credit_card_collect_refund`] keyed by gateway trade number.
    ///
    /// # Errors
    ///
    /// Same as [`Self::credit_card_collect_refund`].
    pub async fn credit_card_collect_refund_by_trade_no(
        &self,
        params: &ParamMap,
    ) -> Result<DecodedResponse> {
        require(params, &["Amt", "TradeNo", "CloseType"])?;
        self.credit_card_collect_refund(&ParamMap::new().with("IndexType", 2).merge(params)).await
    }

    /// Builds the signed field map of a recurring-billing form (version 1.0).
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::GatewayError::MissingField`] if any period
    /// field is absent.
    pub fn generate_credit_card_period_params(&self, params: &ParamMap) -> Result<ParamMap> {
        require(
            params,
            &[
                "MerchantOrderNo",
                "ProdDesc",
                "PeriodAmt",
                "PeriodAmtMode",
                "PeriodType",
                "PeriodPoint",
                "PeriodStartType",
                "PeriodTimes",
            ],
        )?;
        let fields =
            with_defaults(&[("RespondType", "String"), ("Version", "1.0")], params);
        self.core.sign_fields("recurring-billing", fields)
    }

    /// Verifies the `CheckCode` of an inbound notification.
    #[must_use]
    pub fn verify_check_code(&self, params: &ParamMap) -> bool {
        self.core.verify_check_code(params)
    }
}

//! e-invoice client for the `ezpay.com.tw` platform.
//!
//! Every call posts a `PostData_` envelope and receives a JSON object whose
//! `Result` field is itself JSON text; [`InvoiceClient`] expands it in place.
//! Optional fields that should be omitted must simply not be inserted (see
//! [`ParamMap::insert_opt`]).

use tracing::instrument;

use super::{ClientCore, require, with_defaults};
use crate::{
    codec::{
        DecodedResponse, EncryptedPayload, ParamMap, ResponseShape, TransactionCodec,
        response::expand_nested_json,
    },
    config::{GatewayConfig, Mode},
    endpoints::EndpointId,
    error::Result,
    transport::{HttpTransport, Transport},
};

const NESTED_RESULT_FIELD: &str = "Result";

/// Client for invoice issuing, voiding, allowances and lookups.
#[derive(Debug, Clone)]
pub struct InvoiceClient<T = HttpTransport> {
    core: ClientCore<T>,
}

impl InvoiceClient<HttpTransport> {
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

impl<T: Transport> InvoiceClient<T> {
    /// Creates a client over a caller-supplied transport.
    ///
    /// # Errors
    ///
    /// Same as [`InvoiceClient::new`].
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

    /// Issues an invoice (version 1.4).
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::GatewayError::MissingField`] if a required
    /// invoice field is absent, and transport or decode errors.
    #[instrument(skip(self, params))]
    pub async fn invoice_issue(&self, params: &ParamMap) -> Result<DecodedResponse> {
        require(
            params,
            &[
                "MerchantOrderNo",
                "Status",
                "Category",
                "BuyerName",
                "PrintFlag",
                "TaxType",
                "TaxRate",
                "Amt",
                "TaxAmt",
                "TotalAmt",
                "ItemName",
                "ItemCount",
                "ItemUnit",
                "ItemPrice",
                "ItemAmt",
            ],
        )?;
        self.send(EndpointId::InvoiceIssue, &[("Version", "1.4")], params).await
    }

    /// Voids an invoice.
    ///
    /// # Errors
    ///
    /// Returns a missing-field error if `InvoiceNumber` or `InvalidReason` is
    /// absent, and transport or decode errors.
    #[instrument(skip(self, params))]
    pub async fn invoice_invalid(&self, params: &ParamMap) -> Result<DecodedResponse> {
        require(params, &["InvoiceNumber", "InvalidReason"])?;
        self.send(EndpointId::InvoiceInvalid, &[("Version", "1.0")], params).await
    }

    /// Issues an allowance against an invoice (version 1.3).
    ///
    /// # Errors
    ///
    /// Returns a missing-field error if a required allowance field is absent,
    /// and transport or decode errors.
    #[instrument(skip(self, params))]
    pub async fn allowance_issue(&self, params: &ParamMap) -> Result<DecodedResponse> {
        require(
            params,
            &[
                "InvoiceNo",
                "MerchantOrderNo",
                "ItemName",
                "ItemCount",
                "ItemUnit",
                "ItemPrice",
                "ItemAmt",
                "ItemTaxAmt",
                "TotalAmt",
                "BuyerEmail",
                "Status",
            ],
        )?;
        self.send(EndpointId::AllowanceIssue, &[("Version", "1.3")], params).await
    }

    /// Looks up an invoice by merchant order number (`SearchType=1`).
    ///
    /// # Errors
    ///
    /// Returns a missing-field error if `MerchantOrderNo` or `TotalAmt` is
    /// absent, and transport or decode errors.
    #[instrument(skip(self, params))]
    pub async fn invoice_search_by_merchant_order_no(
        &self,
        params: &ParamMap,
    ) -> Result<DecodedResponse> {
        require(params, &["MerchantOrderNo", "TotalAmt"])?;
        self.send(EndpointId::InvoiceSearch, &[("Version", "1.3"), ("SearchType", "1")], params)
            .await
    }

    /// Looks up an invoice by invoice number and random code (`SearchType=0`).
    ///
    /// # Errors
    ///
    /// Returns a missing-field error if `InvoiceNumber` or `RandomNum` is
    /// absent, and transport or decode errors.
    #[instrument(skip(self, params))]
    pub async fn invoice_search_by_invoice_no(&self, params: &ParamMap) -> Result<DecodedResponse> {
        require(params, &["InvoiceNumber", "RandomNum"])?;
        self.send(EndpointId::InvoiceSearch, SEARCH_BY_INVOICE_NO, params).await
    }

    /// Builds the encrypted `PostData_` of an invoice-number lookup without
    /// sending it, for a form the buyer submits to the platform directly.
    ///
    /// # Errors
    ///
    /// Returns a missing-field error if `InvoiceNumber` or `RandomNum` is
    /// absent.
    pub fn invoice_search_by_invoice_no_offsite(&self, params: &ParamMap) -> Result<EncryptedPayload> {
        require(params, &["InvoiceNumber", "RandomNum"])?;
        self.core.encrypt(&request_fields(SEARCH_BY_INVOICE_NO, params))
    }

    async fn send(
        &self,
        endpoint: EndpointId,
        defaults: &[(&str, &str)],
        params: &ParamMap,
    ) -> Result<DecodedResponse> {
        let envelope = self.core.post_data(&request_fields(defaults, params))?;
        let mut reply = self
            .core
            .post(endpoint, envelope.into_form_fields(), ResponseShape::Json)
            .await?;
        expand_nested_json(&mut reply.fields, NESTED_RESULT_FIELD);
        Ok(reply)
    }
}

const SEARCH_BY_INVOICE_NO: &[(&str, &str)] = &[("Version", "1.3"), ("SearchType", "0")];

/// `RespondType=JSON`, the call defaults and `TimeStamp`, overlaid by the
/// caller's fields.
fn request_fields(defaults: &[(&str, &str)], params: &ParamMap) -> ParamMap {
    let mut ordered = vec![("RespondType", "JSON")];
    ordered.extend_from_slice(defaults);
    with_defaults(&ordered, params)
}

//! Gateway endpoint table.
//!
//! Each API has a test and a production URL; [`Mode`] picks the column.

use std::fmt;

use crate::{
    config::Mode,
    error::{GatewayError, Result},
};

/// Gateway API identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(usize)]
pub enum EndpointId {
    /// Legacy transaction query.
    LegacyQueryTradeInfo,
    /// Legacy credit card collect / refund.
    LegacyCreditCardClose,
    /// Legacy credit card deauthorization.
    LegacyCreditCardCancel,
    /// Hosted checkout page.
    MpgGateway,
    /// Hosted recurring-billing page.
    Period,
    /// Transaction query.
    QueryTradeInfo,
    /// Credit card collect / refund.
    CreditCardClose,
    /// Credit card deauthorization.
    CreditCardCancel,
    /// Subscription status change.
    PeriodAlterStatus,
    /// E-wallet refund.
    EWalletRefund,
    /// LINE Pay refund.
    LinePayRefund,
    /// Invoice issuance.
    InvoiceIssue,
    /// Invoice voiding.
    InvoiceInvalid,
    /// Allowance issuance.
    AllowanceIssue,
    /// Invoice search.
    InvoiceSearch,
}

/// Test and production URLs of one API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ApiEndpoint {
    /// Identifier.
    pub id: EndpointId,
    /// Short name, as accepted by [`EndpointId::from_name`].
    pub name: &'static str,
    /// Sandbox URL.
    pub test: &'static str,
    /// Live URL.
    pub production: &'static str,
}

impl ApiEndpoint {
    /// Returns the URL for `mode`.
    #[must_use]
    pub const fn url(&self, mode: Mode) -> &'static str {
        match mode {
            Mode::Test => self.test,
            Mode::Production => self.production,
        }
    }
}

macro_rules! endpoint {
    ($id:ident, $name:literal, $test:literal, $production:literal) => {
        ApiEndpoint { id: EndpointId::$id, name: $name, test: $test, production: $production }
    };
}

/// Every known endpoint.
pub static ENDPOINTS: [ApiEndpoint; 15] = [
    endpoint!(
        LegacyQueryTradeInfo,
        "legacy_query_trade_info",
        "https://ccore.spgateway.com/API/QueryTradeInfo",
        "https://core.spgateway.com/API/QueryTradeInfo"
    ),
    endpoint!(
        LegacyCreditCardClose,
        "legacy_credit_card_collect_refund",
        "https://ccore.spgateway.com/API/CreditCard/Close",
        "https://core.spgateway.com/API/CreditCard/Close"
    ),
    endpoint!(
        LegacyCreditCardCancel,
        "legacy_credit_card_deauthorize",
        "https://ccore.spgateway.com/API/CreditCard/Cancel",
        "https://core.spgateway.com/API/CreditCard/Cancel"
    ),
    endpoint!(
        MpgGateway,
        "mpg",
        "https://ccore.newebpay.com/MPG/mpg_gateway",
        "https://core.newebpay.com/MPG/mpg_gateway"
    ),
    endpoint!(
        Period,
        "period",
        "https://ccore.newebpay.com/MPG/period",
        "https://core.newebpay.com/MPG/period"
    ),
    endpoint!(
        QueryTradeInfo,
        "query_trade_info",
        "https://ccore.newebpay.com/API/QueryTradeInfo",
        "https://core.newebpay.com/API/QueryTradeInfo"
    ),
    endpoint!(
        CreditCardClose,
        "credit_card_collect_refund",
        "https://ccore.newebpay.com/API/CreditCard/Close",
        "https://core.newebpay.com/API/CreditCard/Close"
    ),
    endpoint!(
        CreditCardCancel,
        "credit_card_deauthorize",
        "https://ccore.newebpay.com/API/CreditCard/Cancel",
        "https://core.newebpay.com/API/CreditCard/Cancel"
    ),
    endpoint!(
        PeriodAlterStatus,
        "change_subscription_status",
        "https://ccore.newebpay.com/MPG/period/AlterStatus",
        "https://core.newebpay.com/MPG/period/AlterStatus"
    ),
    endpoint!(
        EWalletRefund,
        "ewallet_refund",
        "https://ccore.newebpay.com/API/EWallet/refund",
        "https://core.newebpay.com/API/EWallet/refund"
    ),
    endpoint!(
        LinePayRefund,
        "line_pay_refund",
        "https://ccore.newebpay.com/API/LinePay/refund",
        "https://core.newebpay.com/API/LinePay/refund"
    ),
    endpoint!(
        InvoiceIssue,
        "invoice_issue",
        "https://cinv.ezpay.com.tw/API/invoice_issue",
        "https://inv.ezpay.com.tw/API/invoice_issue"
    ),
    endpoint!(
        InvoiceInvalid,
        "invoice_invalid",
        "https://cinv.ezpay.com.tw/API/invoice_invalid",
        "https://inv.ezpay.com.tw/API/invoice_invalid"
    ),
    endpoint!(
        AllowanceIssue,
        "allowance_issue",
        "https://cinv.ezpay.com.tw/API/allowance_issue",
        "https://inv.ezpay.com.tw/API/allowance_issue"
    ),
    endpoint!(
        InvoiceSearch,
        "invoice_search",
        "https://cinv.ezpay.com.tw/API/invoice_search",
        "https://inv.ezpay.com.tw/API/invoice_search"
    ),
];

impl EndpointId {
    /// Returns the table row for this identifier.
    #[must_use]
    pub fn endpoint(self) -> &'static ApiEndpoint {
        // rows are declared in variant order
        &ENDPOINTS[self as usize]
    }

    /// Returns the URL for `mode`.
    #[must_use]
    pub fn url(self, mode: Mode) -> &'static str {
        self.endpoint().url(mode)
    }

    /// Looks an endpoint up by short name.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::UnsupportedProfile`] for an unknown name.
    pub fn from_name(name: &str) -> Result<Self> {
        ENDPOINTS
            .iter()
            .find(|e| e.name == name)
            .map(|e| e.id)
            .ok_or_else(|| GatewayError::UnsupportedProfile(name.to_owned()))
    }
}

impl fmt::Display for EndpointId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.endpoint().name)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn test_every_row_resolves_to_itself() {
        for row in &ENDPOINTS {
            assert_eq!(row.id.endpoint(), row);
            assert_eq!(EndpointId::from_name(row.name).unwrap(), row.id);
        }
    }

    #[test]
    fn test_ids_and_names_unique() {
        let ids: HashSet<_> = ENDPOINTS.iter().map(|e| e.id).collect();
        let names: HashSet<_> = ENDPOINTS.iter().map(|e| e.name).collect();
        assert_eq!(ids.len(), ENDPOINTS.len());
        assert_eq!(names.len(), ENDPOINTS.len());
    }

    #[test]
    fn test_mode_selects_column() {
        assert_eq!(
            EndpointId::MpgGateway.url(Mode::Test),
            "https://ccore.newebpay.com/MPG/mpg_gateway"
        );
        assert_eq!(
            EndpointId::MpgGateway.url(Mode::Production),
            "https://core.newebpay.com/MPG/mpg_gateway"
        );
        assert_eq!(
            EndpointId::InvoiceSearch.url(Mode::Test),
            "https://cinv.ezpay.com.tw/API/invoice_search"
        );
    }

    #[test]
    fn test_all_urls_https() {
        for row in &ENDPOINTS {
            assert!(row.test.starts_with("https://"));
            assert!(row.production.starts_with("https://"));
        }
    }

    #[test]
    fn test_unknown_name() {
        assert!(matches!(
            EndpointId::from_name("refund_everything").unwrap_err(),
            GatewayError::UnsupportedProfile(_)
        ));
    }
}

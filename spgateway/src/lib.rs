//! Spgateway / NewebPay transaction codec and clients.
//!
//! The Spgateway family of Taiwanese payment gateways (Spgateway, its
//! NewebPay successor, and the ezPay e-invoice platform) authenticates
//! merchants with a shared 32-byte hash key and 16-byte hash IV. Requests
//! are either signed in place with a keyed SHA-256 `CheckValue`, or
//! encrypted with AES-256-CBC into a hex blob that is then signed.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │ client    Client · ClientV2 · InvoiceClient · LinePay │  per-call defaults,
//! │                                                      │  required fields
//! └──────────┬───────────────────────────────┬───────────┘
//!            │ ParamMap                      │ FormFields
//! ┌──────────▼───────────┐        ┌──────────▼───────────┐
//! │ codec                │        │ transport            │
//! │  canonical · cipher  │        │  Transport trait     │
//! │  check_value ·       │        │  HttpTransport       │
//! │  profile · response  │        │  (reqwest, HTTPS)    │
//! └──────────┬───────────┘        └──────────────────────┘
//!            │
//! ┌──────────▼───────────┐
//! │ credential · config  │  key material, mode, endpoints
//! └──────────────────────┘
//! ```
//!
//! The codec never touches the network and can be used on its own, for
//! instance to verify inbound notifications.
//!
//! # Quick Start
//!
//! ## Build a hosted checkout form
//!
//! ```
//! use spgateway::{ClientV2, GatewayConfig, Mode, codec::ParamMap};
//!
//! # fn example() -> spgateway::Result<()> {
//! let config = GatewayConfig::new(
//!     Mode::Test,
//!     "MS12345",
//!     "0123456789abcdef0123456789abcdef",
//!     "0123456789abcdef",
//! );
//! let client = ClientV2::new(&config)?;
//!
//! let form = client.generate_mpg_params(
//!     &ParamMap::new()
//!         .with("MerchantOrderNo", "ORDER1")
//!         .with("Amt", 1000)
//!         .with("ItemDesc", "Green tea"),
//! )?;
//!
//! // Post these fields from the buyer's browser to the MPG gateway.
//! let fields = form.into_form_fields();
//! assert_eq!(fields[0], ("MerchantID".to_owned(), "MS12345".to_owned()));
//! # Ok(())
//! # }
//! # example().unwrap();
//! ```
//!
//! ## Verify a payment notification
//!
//! ```
//! use spgateway::{Credential, codec::TransactionCodec};
//!
//! # fn example() -> spgateway::Result<()> {
//! let codec = TransactionCodec::new(Credential::new(
//!     "MS12345",
//!     "0123456789abcdef0123456789abcdef",
//!     "0123456789abcdef",
//! )?);
//!
//! let trade_info = "a6a33edeab69cbb6cf7153eb75d3c8fca5993bcb8ef63163fcc306d723e8030d";
//! let trade_sha = "259D697CED40D2D0703E688A27616F952B0BC4B077263AD5008FEA8444EB4F2B";
//!
//! assert!(codec.engine().verify_payload_check_value("trade-sha", trade_info, trade_sha)?);
//! assert_eq!(codec.cipher().decode_str(trade_info)?, r#"{"Status":"SUCCESS","Amt":100}"#);
//! # Ok(())
//! # }
//! # example().unwrap();
//! ```
//!
//! # Security
//!
//! - Key material is zeroized on drop and redacted from `Debug` output.
//! - Check values are compared in constant time.
//! - [`HttpTransport`](transport::HttpTransport) only posts to HTTPS URLs.
//! - A failed signature check is reported as
//!   [`SignatureStatus::Invalid`](codec::SignatureStatus::Invalid), never
//!   silently accepted: check [`DecodedResponse::is_trusted`](codec::DecodedResponse::is_trusted).

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![allow(
    clippy::multiple_crate_versions,
    reason = "transitive dependencies from reqwest"
)]

pub mod client;
pub mod codec;
pub mod config;
pub mod credential;
pub mod endpoints;
pub mod error;
pub mod transport;
pub mod wire;

pub use client::{Client, ClientV2, InvoiceClient, LinePayClient};
pub use config::{GatewayConfig, Mode};
pub use credential::Credential;
pub use error::{GatewayError, Result};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_library_exports() {
        let _ = std::marker::PhantomData::<GatewayError>;
        let _ = std::marker::PhantomData::<ClientV2>;
        let _ = std::marker::PhantomData::<Credential>;
    }
}

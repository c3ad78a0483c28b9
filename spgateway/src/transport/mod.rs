//! Transport abstraction.
//!
//! Gateway calls are form posts: a URL plus an ordered list of string pairs.
//! The [`Transport`] trait hides how they reach the network so clients can
//! be driven by [`HttpTransport`] in production and by an in-memory double
//! in tests.
//!
//! # Examples
//!
//! ```rust,no_run
//! use spgateway::transport::{HttpTransport, Transport};
//!
//! # async fn example() -> spgateway::error::Result<()> {
//! let transport = HttpTransport::new()?;
//!
//! let fields = vec![
//!     ("MerchantID_".to_owned(), "MS12345".to_owned()),
//!     ("PostData_".to_owned(), "c3ee3e7e".to_owned()),
//! ];
//! let response = transport
//!     .post_form("https://ccore.newebpay.com/API/CreditCard/Close", &fields)
//!     .await?;
//! println!("Status: {}", response.status);
//! # Ok(())
//! # }
//! ```

#[allow(
    redundant_imports,
    reason = "Future needed for RPITIT despite being in Edition 2024 prelude"
)]
use std::future::Future;

use crate::{error::Result, wire::FormFields};

pub mod config;
pub mod http;

pub use config::HttpConfig;
pub use http::HttpTransport;

/// Response from transport operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    /// HTTP status code.
    pub status: u16,
    /// Raw response body bytes.
    pub body: Vec<u8>,
}

impl TransportResponse {
    /// Body as text, replacing invalid UTF-8 sequences.
    #[must_use]
    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Returns true for 2xx statuses.
    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Posts `application/x-www-form-urlencoded` requests.
///
/// Implementations perform a single attempt; retrying is left to callers.
pub trait Transport: Send + Sync {
    /// Posts `fields` to `url` and returns the raw reply.
    ///
    /// # Errors
    ///
    /// Returns error if the URL is rejected, the request fails, or the
    /// gateway answers with a non-success status.
    fn post_form<'a>(
        &'a self,
        url: &'a str,
        fields: &'a FormFields,
    ) -> impl Future<Output = Result<TransportResponse>> + Send + 'a;

    /// Returns the protocol name, for logging.
    fn protocol_name(&self) -> &'static str;
}

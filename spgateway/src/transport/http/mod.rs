//! HTTP transport implementation using reqwest.

use std::{sync::LazyLock, time::Duration};

use reqwest::Client;
use tracing::{debug, instrument};
use url::{Host, Url};

use super::config::{DEFAULT_USER_AGENT, HttpConfig};
use crate::{
    error::{GatewayError, Result},
    transport::{Transport, TransportResponse},
    wire::FormFields,
};

/// Shared default client, so default transports reuse one connection pool.
static DEFAULT_HTTP_CLIENT: LazyLock<Client> = LazyLock::new(|| {
    Client::builder()
        .timeout(Duration::from_secs(30))
        .connect_timeout(Duration::from_secs(10))
        .user_agent(DEFAULT_USER_AGENT)
        .build()
        .unwrap_or_else(|_| Client::new())
});

/// Validates URL for security constraints.
///
/// Ensures the URL uses HTTPS and does not point to a loopback host.
fn validate_url(raw: &str) -> Result<Url> {
    let url = Url::parse(raw)
        .map_err(|e| GatewayError::TransportError(format!("invalid URL {raw:?}: {e}")))?;

    if url.scheme() != "https" {
        return Err(GatewayError::TransportError("Only HTTPS URLs are allowed".to_owned()));
    }

    let loopback = match url.host() {
        Some(Host::Domain(domain)) => domain.eq_ignore_ascii_case("localhost"),
        Some(Host::Ipv4(addr)) => addr.is_loopback(),
        Some(Host::Ipv6(addr)) => addr.is_loopback(),
        None => {
            return Err(GatewayError::TransportError(format!("URL missing host: {raw}")));
        }
    };
    if loopback {
        return Err(GatewayError::TransportError("Localhost URLs are not allowed".to_owned()));
    }

    Ok(url)
}

/// Form-posting transport over reqwest.
///
/// # Examples
///
/// ```
/// use spgateway::transport::{HttpConfig, HttpTransport, Transport};
///
/// let config = HttpConfig { timeout_secs: 60, ..Default::default() };
/// let transport = HttpTransport::with_config(&config).unwrap();
/// assert_eq!(transport.protocol_name(), "https");
/// ```
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    /// Creates a transport on the shared default client.
    ///
    /// Defaults: 30 second timeout, 10 second connect timeout.
    ///
    /// # Errors
    ///
    /// This method is infallible but returns `Result` for API consistency.
    pub fn new() -> Result<Self> {
        Ok(Self { client: DEFAULT_HTTP_CLIENT.clone() })
    }

    /// Creates a transport with custom configuration.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::ConfigError`] if `config` is out of bounds and
    /// [`GatewayError::HttpError`] if the client cannot be built.
    pub fn with_config(config: &HttpConfig) -> Result<Self> {
        config.validate()?;
        let client = Client::builder()
            .timeout(config.timeout())
            .connect_timeout(config.connect_timeout())
            .user_agent(config.user_agent.as_str())
            .build()
            .map_err(GatewayError::HttpError)?;
        Ok(Self { client })
    }

    #[instrument(skip(self, fields), fields(field_count = fields.len()))]
    async fn execute_post(&self, url: &str, fields: &FormFields) -> Result<TransportResponse> {
        let url = validate_url(url)?;

        let response = self.client.post(url).form(fields).send().await?;
        let status = response.status();
        let body = response.bytes().await.map_err(GatewayError::HttpError)?.to_vec();
        debug!(status = status.as_u16(), body_len = body.len(), "gateway replied");

        if !status.is_success() {
            return Err(GatewayError::GatewayStatus {
                status: status.as_u16(),
                body: String::from_utf8_lossy(&body).into_owned(),
            });
        }

        Ok(TransportResponse { status: status.as_u16(), body })
    }
}

impl Transport for HttpTransport {
    async fn post_form<'a>(
        &'a self,
        url: &'a str,
        fields: &'a FormFields,
    ) -> Result<TransportResponse> {
        self.execute_post(url, fields).await
    }

    fn protocol_name(&self) -> &'static str {
        "https"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_transport_new() {
        assert!(HttpTransport::new().is_ok());
    }

    #[test]
    fn test_http_transport_with_config() {
        let config = HttpConfig {
            timeout_secs: 60,
            connect_timeout_secs: 15,
            user_agent: "shop-backend/2.1".to_owned(),
        };
        assert!(HttpTransport::with_config(&config).is_ok());
    }

    #[test]
    fn test_http_transport_rejects_invalid_config() {
        let config = HttpConfig { timeout_secs: 0, ..Default::default() };
        let err = HttpTransport::with_config(&config).unwrap_err();
        assert!(matches!(err, GatewayError::ConfigError(_)));
    }

    #[test]
    fn test_validate_url_accepts_gateway_hosts() {
        assert!(validate_url("https://ccore.newebpay.com/MPG/mpg_gateway").is_ok());
        assert!(validate_url("https://inv.ezpay.com.tw/API/invoice_issue").is_ok());
    }

    #[test]
    fn test_validate_url_rejects_plain_http() {
        assert!(matches!(
            validate_url("http://core.newebpay.com/API/QueryTradeInfo").unwrap_err(),
            GatewayError::TransportError(_)
        ));
    }

    #[test]
    fn test_validate_url_rejects_loopback() {
        for url in
            ["https://localhost/api", "https://LOCALHOST:8443/", "https://127.0.0.1/", "https://[::1]/"]
        {
            assert!(validate_url(url).is_err(), "{url} should be rejected");
        }
    }

    #[test]
    fn test_validate_url_rejects_garbage() {
        assert!(validate_url("not-a-url").is_err());
        assert!(validate_url("file:///etc/passwd").is_err());
    }

    #[tokio::test]
    async fn test_post_form_rejects_before_network() {
        let transport = HttpTransport::new().unwrap();
        let fields = vec![("MerchantID_".to_owned(), "MS1".to_owned())];
        let err = transport.post_form("http://example.com/", &fields).await.unwrap_err();
        assert!(matches!(err, GatewayError::TransportError(_)));
    }
}

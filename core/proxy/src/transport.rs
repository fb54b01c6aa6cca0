//! Delivery of proxy requests to a remote handler.

use async_trait::async_trait;
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

use openhub_common::{Error, Result, SharedSecret};

use crate::protocol::{ProxyRequest, ProxyResponse, PROXY_PATH, SECRET_HEADER};

/// Sends one request and yields the remote handler's response.
///
/// Transport problems are reported as failure responses, never as errors,
/// so callers see a single failure channel.
#[async_trait]
pub trait ProxyTransport: Send + Sync {
    async fn send(&self, request: ProxyRequest) -> ProxyResponse;
}

#[async_trait]
impl<T: ProxyTransport + ?Sized> ProxyTransport for Arc<T> {
    async fn send(&self, request: ProxyRequest) -> ProxyResponse {
        (**self).send(request).await
    }
}

/// Append the proxy route to a base URL unless it already ends with it.
///
/// Trailing slashes are dropped first, so the result is the same for
/// `https://app.example`, `https://app.example/` and
/// `https://app.example/__openhub/proxy`.
pub fn normalize_proxy_url(base: &str) -> String {
    let trimmed = base.trim_end_matches('/');
    if trimmed.ends_with(PROXY_PATH) {
        trimmed.to_string()
    } else {
        format!("{}{}", trimmed, PROXY_PATH)
    }
}

/// JSON-over-HTTP transport.
///
/// Each request is a `POST` to the normalized proxy URL with the shared
/// secret in the `x-openhub-secret` header.
pub struct HttpTransport {
    http: Client,
    url: Url,
    secret: SharedSecret,
}

impl HttpTransport {
    /// Create a transport for a deployment base URL.
    pub fn new(base_url: &str, secret: SharedSecret) -> Result<Self> {
        Self::build(base_url, secret, None)
    }

    /// Create a transport whose requests give up after `timeout`.
    pub fn with_timeout(base_url: &str, secret: SharedSecret, timeout: Duration) -> Result<Self> {
        Self::build(base_url, secret, Some(timeout))
    }

    fn build(base_url: &str, secret: SharedSecret, timeout: Option<Duration>) -> Result<Self> {
        let normalized = normalize_proxy_url(base_url);
        let url = Url::parse(&normalized).map_err(|e| {
            Error::Configuration(format!("Invalid remote URL '{}': {}", base_url, e))
        })?;

        let mut builder = Client::builder().user_agent(concat!("OpenHub/", env!("CARGO_PKG_VERSION")));
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder
            .build()
            .map_err(|e| Error::Configuration(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { http, url, secret })
    }

    /// The normalized proxy URL requests are posted to.
    pub fn url(&self) -> &str {
        self.url.as_str()
    }
}

impl std::fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpTransport")
            .field("url", &self.url.as_str())
            .field("secret", &self.secret)
            .finish()
    }
}

#[async_trait]
impl ProxyTransport for HttpTransport {
    async fn send(&self, request: ProxyRequest) -> ProxyResponse {
        debug!(url = %self.url, binding = %request.binding, method = %request.method, "Sending proxy request");

        let response = match self
            .http
            .post(self.url.clone())
            .header(SECRET_HEADER, self.secret.expose())
            .json(&request)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                warn!(url = %self.url, error = %e, "Proxy request failed to send");
                return ProxyResponse::failure(Error::Network(e.to_string()).to_string());
            }
        };

        let status = response.status();
        if !status.is_success() {
            warn!(url = %self.url, status = status.as_u16(), "Proxy endpoint rejected request");
            return ProxyResponse::failure(format!("HTTP error! status: {}", status.as_u16()));
        }

        match response.json::<ProxyResponse>().await {
            Ok(body) => body,
            Err(e) => ProxyResponse::failure(
                Error::Serialization(format!("Invalid proxy response: {}", e)).to_string(),
            ),
        }
    }
}

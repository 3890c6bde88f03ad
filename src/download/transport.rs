//! HTTP transport capability and its reqwest-backed implementation.
//!
//! The orchestrator only needs "issue GET, get status + headers + stream".
//! Keeping that behind [`HttpTransport`] lets classification and filename
//! resolution be exercised with synthetic [`ResponseEnvelope`]s.

use std::io;

use async_trait::async_trait;
use futures_util::TryStreamExt;
use reqwest::Client;
use reqwest::header::HeaderMap;
use tracing::{debug, instrument};
use url::Url;

use super::envelope::{ResponseEnvelope, ResponseHeaders};
use super::error::DownloadError;
use crate::config::ClientConfig;

/// Issues a single GET and returns the response head with an unread body.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Sends `GET url` with `headers` verbatim.
    ///
    /// Any status code is a successful transport result; only failures to
    /// obtain a response head are errors.
    ///
    /// # Errors
    ///
    /// Returns [`DownloadError::Transport`] for connection, DNS, TLS and
    /// timeout failures.
    async fn get(&self, url: &Url, headers: &HeaderMap) -> Result<ResponseEnvelope, DownloadError>;
}

/// HTTP client for streaming downloads.
///
/// Create once and reuse across downloads to share the connection pool.
///
/// # Example
///
/// ```no_run
/// use fetcher_core::{ClientConfig, HttpClient};
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = HttpClient::new(&ClientConfig::default())?;
/// # let _ = client;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
}

impl HttpClient {
    /// Builds a client from explicit configuration.
    ///
    /// # Errors
    ///
    /// Returns the reqwest builder error (e.g. TLS backend initialization).
    #[instrument(level = "debug", skip(config), fields(
        connect_timeout_secs = config.connect_timeout_secs,
        read_timeout_secs = config.read_timeout_secs,
    ))]
    pub fn new(config: &ClientConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .connect_timeout(config.connect_timeout())
            .timeout(config.read_timeout())
            .gzip(config.gzip)
            .user_agent(config.user_agent.as_str())
            .build()?;
        Ok(Self { client })
    }

    /// Wraps an already configured reqwest client.
    #[must_use]
    pub fn from_client(client: Client) -> Self {
        Self { client }
    }

    /// Returns a reference to the underlying reqwest client.
    #[must_use]
    pub fn inner(&self) -> &Client {
        &self.client
    }
}

#[async_trait]
impl HttpTransport for HttpClient {
    #[instrument(level = "debug", skip(self, headers), fields(url = %url))]
    async fn get(&self, url: &Url, headers: &HeaderMap) -> Result<ResponseEnvelope, DownloadError> {
        let response = self
            .client
            .get(url.clone())
            .headers(headers.clone())
            .send()
            .await
            .map_err(|e| DownloadError::transport(url.as_str(), e))?;

        let status = response.status().as_u16();
        let response_headers = ResponseHeaders::from_header_map(response.headers());
        let content_length = response.content_length();
        debug!(status, ?content_length, "response head received");

        let body = response.bytes_stream().map_err(io::Error::other);
        Ok(ResponseEnvelope::new(
            status,
            response_headers,
            content_length,
            Box::pin(body),
        ))
    }
}

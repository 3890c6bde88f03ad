//! Download request definition and validation.

use std::collections::BTreeMap;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde::Deserialize;
use url::Url;

use super::classify::FailurePolicy;
use super::error::DownloadError;

/// A single download: where to fetch from and how tolerant to be.
///
/// Deserializes from the task definition shape used by the invoking
/// framework:
///
/// ```
/// use fetcher_core::DownloadRequest;
///
/// let request: DownloadRequest = serde_json::from_str(
///     r#"{"uri": "https://example.com/data.csv", "allowFailed": true}"#,
/// ).unwrap();
/// assert!(request.allow_failed());
/// assert!(request.fail_on_empty_response());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadRequest {
    uri: String,
    #[serde(default)]
    headers: BTreeMap<String, String>,
    #[serde(default = "default_fail_on_empty_response")]
    fail_on_empty_response: bool,
    #[serde(default)]
    allow_failed: bool,
}

fn default_fail_on_empty_response() -> bool {
    true
}

impl DownloadRequest {
    /// Creates a request with default policy: empty responses fail, error
    /// statuses fail.
    pub fn new(uri: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            headers: BTreeMap::new(),
            fail_on_empty_response: true,
            allow_failed: false,
        }
    }

    /// Adds a request header, replacing any earlier value under the same
    /// name (compared case-insensitively).
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let name = name.into();
        self.headers
            .retain(|existing, _| !existing.eq_ignore_ascii_case(&name));
        self.headers.insert(name, value.into());
        self
    }

    #[must_use]
    pub fn with_fail_on_empty_response(mut self, fail_on_empty_response: bool) -> Self {
        self.fail_on_empty_response = fail_on_empty_response;
        self
    }

    #[must_use]
    pub fn with_allow_failed(mut self, allow_failed: bool) -> Self {
        self.allow_failed = allow_failed;
        self
    }

    #[must_use]
    pub fn uri(&self) -> &str {
        &self.uri
    }

    #[must_use]
    pub fn headers(&self) -> &BTreeMap<String, String> {
        &self.headers
    }

    #[must_use]
    pub fn fail_on_empty_response(&self) -> bool {
        self.fail_on_empty_response
    }

    #[must_use]
    pub fn allow_failed(&self) -> bool {
        self.allow_failed
    }

    #[must_use]
    pub fn policy(&self) -> FailurePolicy {
        FailurePolicy {
            fail_on_empty_response: self.fail_on_empty_response,
            allow_failed: self.allow_failed,
        }
    }

    /// Parses the URI, requiring an absolute http(s) URI with a host.
    ///
    /// # Errors
    ///
    /// Returns [`DownloadError::InvalidRequest`] for anything else.
    pub fn validate_uri(&self) -> Result<Url, DownloadError> {
        let trimmed = self.uri.trim();
        let url = Url::parse(trimmed)
            .map_err(|e| DownloadError::invalid_request(&self.uri, e.to_string()))?;

        if !matches!(url.scheme(), "http" | "https") {
            return Err(DownloadError::invalid_request(
                &self.uri,
                format!("unsupported scheme `{}`", url.scheme()),
            ));
        }
        if url.host_str().is_none_or(str::is_empty) {
            return Err(DownloadError::invalid_request(&self.uri, "missing host"));
        }
        Ok(url)
    }

    /// Converts the request headers into a transport header map.
    ///
    /// # Errors
    ///
    /// Returns [`DownloadError::InvalidRequest`] when a header name or value
    /// is not valid HTTP.
    pub fn header_map(&self) -> Result<HeaderMap, DownloadError> {
        let mut map = HeaderMap::with_capacity(self.headers.len());
        for (name, value) in &self.headers {
            let header_name = HeaderName::from_bytes(name.as_bytes()).map_err(|_| {
                DownloadError::invalid_request(&self.uri, format!("invalid header name `{name}`"))
            })?;
            let header_value = HeaderValue::from_str(value).map_err(|_| {
                DownloadError::invalid_request(
                    &self.uri,
                    format!("invalid value for header `{name}`"),
                )
            })?;
            map.insert(header_name, header_value);
        }
        Ok(map)
    }

    /// Validates the URI and headers together; nothing touches the network
    /// until this succeeds.
    ///
    /// # Errors
    ///
    /// Returns [`DownloadError::InvalidRequest`] as described on
    /// [`validate_uri`](Self::validate_uri) and [`header_map`](Self::header_map).
    pub fn prepare(&self) -> Result<(Url, HeaderMap), DownloadError> {
        Ok((self.validate_uri()?, self.header_map()?))
    }
}

//! Error types for the download module.
//!
//! Each variant corresponds to one way a single download attempt can end
//! without producing a [`DownloadResult`](super::DownloadResult). Nothing here
//! is retried by the core; retry policy belongs to the caller.

use reqwest::StatusCode;
use thiserror::Error;

use super::constants::{EMPTY_RESPONSE_MESSAGE, UNKNOWN_STATUS_REASON};
use super::envelope::ResponseHeaders;
use crate::storage::StorageError;

/// Boxed source error carried by [`DownloadError::Transport`].
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors that can occur during a download.
#[derive(Debug, Error)]
pub enum DownloadError {
    /// The request URI is malformed, relative, or not http/https.
    ///
    /// Raised before any network activity.
    #[error("invalid request URI {url}: {reason}")]
    InvalidRequest {
        /// The rejected URI as supplied by the caller.
        url: String,
        /// Why the URI (or a request header) was rejected.
        reason: String,
    },

    /// Network-level error: DNS, connection refused, TLS, timeout, or an I/O
    /// failure while the body was being streamed.
    #[error("transport error downloading {url}: {source}")]
    Transport {
        /// The URL being downloaded.
        url: String,
        /// The underlying transport error.
        #[source]
        source: BoxError,
    },

    /// Success-range status without a body while empty responses are rejected.
    #[error("{}", EMPTY_RESPONSE_MESSAGE)]
    EmptyResponse {
        /// The URL that returned no content.
        url: String,
    },

    /// Error-range status while failed responses are not allowed.
    ///
    /// Displays as the status's standard reason phrase.
    #[error("{reason}")]
    HttpStatus {
        /// The URL that returned the status.
        url: String,
        /// The HTTP status code.
        status: u16,
        /// Canonical reason phrase for `status`.
        reason: &'static str,
        /// Response headers, kept for caller inspection.
        headers: ResponseHeaders,
    },

    /// The storage sink failed; propagated as reported by the sink.
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl DownloadError {
    /// Creates an invalid request error.
    pub fn invalid_request(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidRequest {
            url: url.into(),
            reason: reason.into(),
        }
    }

    /// Creates a transport error from any error source.
    pub fn transport(url: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self::Transport {
            url: url.into(),
            source: source.into(),
        }
    }

    /// Creates an empty response error.
    pub fn empty_response(url: impl Into<String>) -> Self {
        Self::EmptyResponse { url: url.into() }
    }

    /// Creates an HTTP status error; the reason phrase is derived from `status`.
    pub fn http_status(url: impl Into<String>, status: u16, headers: ResponseHeaders) -> Self {
        Self::HttpStatus {
            url: url.into(),
            status,
            reason: reason_phrase(status),
            headers,
        }
    }

    /// HTTP status attached to the error, if any.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::HttpStatus { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Response headers attached to the error, if any.
    #[must_use]
    pub fn headers(&self) -> Option<&ResponseHeaders> {
        match self {
            Self::HttpStatus { headers, .. } => Some(headers),
            _ => None,
        }
    }

    /// Returns true when the transport gave up because a configured timeout elapsed.
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        let Self::Transport { source, .. } = self else {
            return false;
        };
        if let Some(error) = source.downcast_ref::<reqwest::Error>() {
            return error.is_timeout();
        }
        if let Some(error) = source.downcast_ref::<std::io::Error>() {
            return error.kind() == std::io::ErrorKind::TimedOut
                || error
                    .get_ref()
                    .and_then(|inner| inner.downcast_ref::<reqwest::Error>())
                    .is_some_and(reqwest::Error::is_timeout);
        }
        false
    }
}

/// Standard reason phrase for a status code.
#[must_use]
pub fn reason_phrase(status: u16) -> &'static str {
    StatusCode::from_u16(status)
        .ok()
        .and_then(|code| code.canonical_reason())
        .unwrap_or(UNKNOWN_STATUS_REASON)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_http_status_displays_reason_phrase_only() {
        let error = DownloadError::http_status(
            "https://example.com/data.csv",
            500,
            ResponseHeaders::new(),
        );
        assert_eq!(error.to_string(), "Internal Server Error");
        assert_eq!(error.status(), Some(500));
    }

    #[test]
    fn test_http_status_unusual_code_has_reason() {
        let error =
            DownloadError::http_status("https://example.com/", 417, ResponseHeaders::new());
        assert_eq!(error.to_string(), "Expectation Failed");
    }

    #[test]
    fn test_http_status_without_canonical_reason() {
        let error =
            DownloadError::http_status("https://example.com/", 599, ResponseHeaders::new());
        assert_eq!(error.to_string(), UNKNOWN_STATUS_REASON);
    }

    #[test]
    fn test_http_status_keeps_headers() {
        let mut headers = ResponseHeaders::new();
        headers.append("Retry-After", "120");
        let error = DownloadError::http_status("https://example.com/", 503, headers);
        assert_eq!(
            error.headers().and_then(|h| h.first("retry-after")),
            Some("120")
        );
    }

    #[test]
    fn test_empty_response_message_is_fixed() {
        let error = DownloadError::empty_response("https://example.com/204");
        assert_eq!(error.to_string(), "No response from server");
        assert_eq!(error.status(), None);
    }

    #[test]
    fn test_invalid_request_display() {
        let error = DownloadError::invalid_request("not-a-url", "relative URL without a base");
        let msg = error.to_string();
        assert!(msg.contains("not-a-url"), "Expected URL in: {msg}");
        assert!(msg.contains("relative URL"), "Expected reason in: {msg}");
    }

    #[test]
    fn test_transport_timeout_detected_through_io_error() {
        let io_error = std::io::Error::new(std::io::ErrorKind::TimedOut, "read timed out");
        let error = DownloadError::transport("https://example.com/", io_error);
        assert!(error.is_timeout());
    }

    #[test]
    fn test_transport_other_io_error_is_not_timeout() {
        let io_error = std::io::Error::new(std::io::ErrorKind::ConnectionReset, "reset");
        let error = DownloadError::transport("https://example.com/", io_error);
        assert!(!error.is_timeout());
        assert!(error.to_string().contains("reset"));
    }

    #[test]
    fn test_storage_error_is_transparent() {
        let error = DownloadError::from(StorageError::NotFound {
            uri: "memory:///1/a.txt".to_string(),
        });
        assert_eq!(
            error.to_string(),
            StorageError::NotFound {
                uri: "memory:///1/a.txt".to_string()
            }
            .to_string()
        );
    }
}

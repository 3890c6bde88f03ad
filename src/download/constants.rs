//! Constants for the download module (timeouts, fallback names, messages).

/// Default HTTP connect timeout (30 seconds).
pub const CONNECT_TIMEOUT_SECS: u64 = 30;

/// Default HTTP read timeout (5 minutes for large files).
pub const READ_TIMEOUT_SECS: u64 = 300;

/// Upper bound accepted for any configured timeout (one day).
pub const MAX_TIMEOUT_SECS: u64 = 86_400;

/// Stored name used when neither Content-Disposition nor the URI path yields one.
pub const FALLBACK_FILENAME: &str = "download";

/// Message carried by [`DownloadError::EmptyResponse`](super::DownloadError::EmptyResponse).
pub const EMPTY_RESPONSE_MESSAGE: &str = "No response from server";

/// Reason phrase used for status codes without a canonical one.
pub const UNKNOWN_STATUS_REASON: &str = "Unknown Status";

//! Download orchestrator: one request, one classification, one storage write.

use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use super::classify::{
    BodyPresence, ClassificationOutcome, Decision, classify, decide, is_success_status,
};
use super::envelope::ResponseHeaders;
use super::error::DownloadError;
use super::filename::resolve_filename;
use super::request::DownloadRequest;
use super::transport::{HttpClient, HttpTransport};
use crate::config::ClientConfig;
use crate::storage::{StorageError, StorageSink};

/// What was stored for a download.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DownloadResult {
    /// URI of the stored object, as returned by the sink.
    pub uri: String,
    /// Bytes actually written to storage.
    pub length: u64,
    /// Response status code.
    pub code: u16,
    /// Response headers snapshot.
    pub headers: ResponseHeaders,
}

/// Runs downloads against a transport.
///
/// Holds no per-download state; one instance can serve any number of
/// concurrent downloads.
///
/// # Example
///
/// ```no_run
/// use fetcher_core::{ClientConfig, DownloadRequest, Downloader, MemoryStorage};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let downloader = Downloader::with_config(&ClientConfig::default())?;
/// let storage = MemoryStorage::new();
/// let request = DownloadRequest::new("https://example.com/data.csv");
///
/// let result = downloader.download(&request, &storage).await?;
/// println!("stored {} bytes at {}", result.length, result.uri);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Downloader {
    transport: Arc<dyn HttpTransport>,
}

impl Downloader {
    #[must_use]
    pub fn new(transport: impl HttpTransport + 'static) -> Self {
        Self {
            transport: Arc::new(transport),
        }
    }

    #[must_use]
    pub fn from_shared(transport: Arc<dyn HttpTransport>) -> Self {
        Self { transport }
    }

    /// Creates a downloader over an [`HttpClient`] built from `config`.
    ///
    /// # Errors
    ///
    /// Returns the reqwest builder error.
    pub fn with_config(config: &ClientConfig) -> Result<Self, reqwest::Error> {
        Ok(Self::new(HttpClient::new(config)?))
    }

    /// Fetches `request.uri()` and streams the body into `sink`.
    ///
    /// Performs exactly one request attempt. The response is dropped, and
    /// its connection released, on every path out of this function.
    ///
    /// # Errors
    ///
    /// - [`DownloadError::InvalidRequest`] before any network activity
    /// - [`DownloadError::Transport`] for connection or mid-stream failures
    /// - [`DownloadError::EmptyResponse`] for an empty success while empty
    ///   responses are rejected
    /// - [`DownloadError::HttpStatus`] for an error status while failures
    ///   are not allowed
    /// - [`DownloadError::Storage`] as reported by the sink
    #[instrument(skip(self, request, sink), fields(uri = %request.uri()))]
    pub async fn download(
        &self,
        request: &DownloadRequest,
        sink: &dyn StorageSink,
    ) -> Result<DownloadResult, DownloadError> {
        let (url, headers) = request.prepare()?;
        debug!("starting download");

        let mut envelope = self.transport.get(&url, &headers).await?;
        let status = envelope.status();

        let presence = if is_success_status(status) {
            envelope
                .probe_body()
                .await
                .map_err(|e| DownloadError::transport(url.as_str(), e))?
        } else {
            BodyPresence::Unknown
        };
        let outcome = classify(status, presence);
        debug!(status, ?outcome, "response classified");

        match decide(outcome, request.policy()) {
            Decision::Store => {}
            Decision::RejectEmpty => return Err(DownloadError::empty_response(url.as_str())),
            Decision::RejectStatus => {
                return Err(DownloadError::http_status(
                    url.as_str(),
                    status,
                    envelope.headers().clone(),
                ));
            }
        }
        if let ClassificationOutcome::Failure { status } = outcome {
            warn!(status, "storing failed response because failures are allowed");
        }

        let filename = resolve_filename(envelope.headers(), &url);
        debug!(filename = %filename, "resolved stored name");

        let (code, response_headers, body) = envelope.into_parts();
        let stored = sink
            .write(&filename, body)
            .await
            .map_err(|error| match error {
                StorageError::Body { source } => DownloadError::transport(url.as_str(), source),
                other => DownloadError::Storage(other),
            })?;

        info!(
            stored_uri = %stored.uri,
            bytes = stored.length,
            status = code,
            "download complete"
        );

        Ok(DownloadResult {
            uri: stored.uri,
            length: stored.length,
            code,
            headers: response_headers,
        })
    }
}

impl fmt::Debug for Downloader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Downloader").finish_non_exhaustive()
    }
}

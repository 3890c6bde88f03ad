//! HTTP download pipeline: request, classify, name, store.
//!
//! This module fetches one resource per call and streams its body into a
//! [`StorageSink`](crate::storage::StorageSink).
//!
//! # Features
//!
//! - Streaming transfer (memory bounded by one chunk plus the sink's buffer)
//! - Pure classification and failure-policy decision table
//! - Filename extraction from Content-Disposition headers or the URI path
//! - Configurable timeouts (30s connect, 5min read by default)
//! - Structured error types with full context
//!
//! # Example
//!
//! ```no_run
//! use fetcher_core::download::{DownloadRequest, Downloader};
//! use fetcher_core::{ClientConfig, LocalStorage};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let downloader = Downloader::with_config(&ClientConfig::default())?;
//! let storage = LocalStorage::new("./downloads");
//! let request = DownloadRequest::new("https://example.com/report.csv")
//!     .with_allow_failed(true);
//!
//! let result = downloader.download(&request, &storage).await?;
//! println!("HTTP {} -> {} ({} bytes)", result.code, result.uri, result.length);
//! # Ok(())
//! # }
//! ```

mod classify;
pub(crate) mod constants;
mod envelope;
mod error;
mod filename;
mod orchestrator;
mod request;
mod transport;

pub use classify::{
    BodyPresence, ClassificationOutcome, Decision, FailurePolicy, classify, decide,
    is_success_status,
};
pub use constants::{EMPTY_RESPONSE_MESSAGE, FALLBACK_FILENAME};
pub use envelope::{BodyStream, ResponseEnvelope, ResponseHeaders};
pub use error::{BoxError, DownloadError, reason_phrase};
pub use filename::resolve_filename;
pub(crate) use filename::{is_meaningful, sanitize_filename};
pub use orchestrator::{DownloadResult, Downloader};
pub use request::DownloadRequest;
pub use transport::{HttpClient, HttpTransport};

// Note: we do NOT define module-local Result aliases.
// Use `Result<T, DownloadError>` explicitly in function signatures.

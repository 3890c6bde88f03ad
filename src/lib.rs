//! Fetcher Core Library
//!
//! This library fetches a single resource over HTTP(S) and streams its body
//! into an addressable storage backend, returning metadata describing what
//! was stored.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//! - [`config`] - HTTP client configuration (timeouts, user agent)
//! - [`download`] - Request validation, response classification, filename
//!   resolution and the download orchestrator
//! - [`storage`] - Storage sink capability plus in-memory and local-disk sinks

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod download;
pub mod storage;
mod user_agent;

#[cfg(test)]
pub(crate) mod test_support;

// Re-export commonly used types
pub use config::ClientConfig;
pub use download::{
    ClassificationOutcome, Decision, DownloadError, DownloadRequest, DownloadResult, Downloader,
    FailurePolicy, HttpClient, HttpTransport, ResponseEnvelope, ResponseHeaders,
};
pub use storage::{LocalStorage, MemoryStorage, StorageError, StorageSink, StoredObject};

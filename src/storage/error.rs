//! Error types for storage sinks.

use std::path::PathBuf;

use thiserror::Error;

/// Errors reported by a [`StorageSink`](super::StorageSink).
#[derive(Debug, Error)]
pub enum StorageError {
    /// Reading the body being stored failed (network I/O mid-stream).
    #[error("failed reading body while storing: {source}")]
    Body {
        /// The body stream error.
        #[source]
        source: std::io::Error,
    },

    /// File system error while writing or reading an object.
    #[error("IO error at {path}: {source}")]
    Io {
        /// The file path where the error occurred.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The URI does not address an object of this sink.
    #[error("invalid storage URI: {uri}")]
    InvalidUri {
        /// The rejected URI.
        uri: String,
    },

    /// No object is stored under the URI.
    #[error("no stored object at {uri}")]
    NotFound {
        /// The URI that was looked up.
        uri: String,
    },
}

impl StorageError {
    /// Creates an IO error.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Creates an invalid URI error.
    pub fn invalid_uri(uri: impl Into<String>) -> Self {
        Self::InvalidUri { uri: uri.into() }
    }

    /// Creates a not-found error.
    pub fn not_found(uri: impl Into<String>) -> Self {
        Self::NotFound { uri: uri.into() }
    }
}

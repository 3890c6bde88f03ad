//! Storage sinks that persist a streamed body under a suggested name.
//!
//! The orchestrator depends only on the [`StorageSink`] capability. Two
//! implementations ship with the crate:
//!
//! - [`MemoryStorage`] - in-process map, used by tests and embedders
//! - [`LocalStorage`] - files under a root directory, addressed by `file://` URIs

mod error;
mod local;
mod memory;

pub use error::StorageError;
pub use local::LocalStorage;
pub use memory::MemoryStorage;

use async_trait::async_trait;
use futures_util::StreamExt;
use tokio::io::{AsyncWrite, AsyncWriteExt};

use crate::download::BodyStream;

/// Identifier and size of an object written by a sink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    /// URI under which the object can be read back.
    pub uri: String,
    /// Number of bytes actually written.
    pub length: u64,
}

/// Durable storage for downloaded bodies.
///
/// Implementations must:
/// - accept zero-length bodies, including streams that yield nothing
/// - consume `body` completely before returning `Ok`
/// - report `length` from the bytes actually transferred
/// - report failures reading `body` as [`StorageError::Body`]
#[async_trait]
pub trait StorageSink: Send + Sync {
    /// Persists `body` under a name derived from `name_hint`.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Body`] when the body stream fails, and any
    /// other variant for failures of the storage itself.
    async fn write(&self, name_hint: &str, body: BodyStream) -> Result<StoredObject, StorageError>;
}

/// Failure while pumping a body into a writer.
#[derive(Debug, thiserror::Error)]
pub enum DrainError {
    /// Reading the body stream failed.
    #[error("failed reading body: {0}")]
    Body(#[source] std::io::Error),
    /// Writing to the destination failed.
    #[error("failed writing body: {0}")]
    Write(#[source] std::io::Error),
}

/// Streams every chunk of `body` into `writer` and flushes it, returning the
/// number of bytes written.
///
/// # Errors
///
/// Returns [`DrainError::Body`] or [`DrainError::Write`] depending on which
/// side failed.
pub async fn drain_into<W>(mut body: BodyStream, writer: &mut W) -> Result<u64, DrainError>
where
    W: AsyncWrite + Unpin + ?Sized,
{
    let mut bytes_written: u64 = 0;

    while let Some(chunk) = body.next().await {
        let chunk = chunk.map_err(DrainError::Body)?;
        writer.write_all(&chunk).await.map_err(DrainError::Write)?;
        bytes_written += chunk.len() as u64;
    }

    writer.flush().await.map_err(DrainError::Write)?;
    Ok(bytes_written)
}

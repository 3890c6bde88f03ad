//! In-memory storage sink.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use bytes::Bytes;
use tracing::debug;

use super::{DrainError, StorageError, StorageSink, StoredObject, drain_into};
use crate::download::BodyStream;

const URI_PREFIX: &str = "memory:///";

/// Keeps stored objects in a process-local map.
///
/// Every write gets a fresh sequence number, so URIs look like
/// `memory:///<n>/<name>` and never collide.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    objects: Mutex<HashMap<String, Bytes>>,
    next_id: AtomicU64,
}

impl MemoryStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the bytes stored under `uri`.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::InvalidUri`] for URIs of another scheme and
    /// [`StorageError::NotFound`] when nothing was stored there.
    pub fn get(&self, uri: &str) -> Result<Bytes, StorageError> {
        if !uri.starts_with(URI_PREFIX) {
            return Err(StorageError::invalid_uri(uri));
        }
        self.objects
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(uri)
            .cloned()
            .ok_or_else(|| StorageError::not_found(uri))
    }

    /// Number of stored objects.
    #[must_use]
    pub fn len(&self) -> usize {
        self.objects
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl StorageSink for MemoryStorage {
    async fn write(&self, name_hint: &str, body: BodyStream) -> Result<StoredObject, StorageError> {
        let mut buffer = Vec::new();
        let length = drain_into(body, &mut buffer)
            .await
            .map_err(|error| match error {
                DrainError::Body(source) => StorageError::Body { source },
                // Writes into a Vec cannot fail short of allocation failure.
                DrainError::Write(source) => StorageError::io(name_hint, source),
            })?;

        let id = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        let uri = format!("{URI_PREFIX}{id}/{}", urlencoding::encode(name_hint));
        debug!(uri = %uri, bytes = length, "stored object in memory");

        self.objects
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(uri.clone(), Bytes::from(buffer));

        Ok(StoredObject { uri, length })
    }
}

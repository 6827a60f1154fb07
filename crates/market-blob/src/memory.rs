use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::{BlobError, BlobResult};
use crate::traits::{validate_key, BlobStore, StoredBlob};

/// In-memory blob store for tests and embedding.
#[derive(Debug, Default)]
pub struct InMemoryBlobStore {
    blobs: RwLock<HashMap<String, Bytes>>,
}

impl InMemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of blobs currently stored.
    pub fn len(&self) -> usize {
        self.blobs.read().map(|m| m.len()).unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Sorted list of stored filenames.
    pub fn filenames(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .blobs
            .read()
            .map(|m| m.keys().cloned().collect())
            .unwrap_or_default();
        names.sort();
        names
    }

    fn poisoned<E: std::fmt::Display>(e: E) -> BlobError {
        BlobError::Io(std::io::Error::other(format!("lock poisoned: {e}")))
    }
}

#[async_trait]
impl BlobStore for InMemoryBlobStore {
    async fn put(&self, filename: &str, media_type: &str, data: Bytes) -> BlobResult<StoredBlob> {
        validate_key(filename)?;
        let mut map = self.blobs.write().map_err(Self::poisoned)?;
        if map.contains_key(filename) {
            return Err(BlobError::AlreadyExists(filename.to_string()));
        }
        let size = data.len() as u64;
        map.insert(filename.to_string(), data);
        Ok(StoredBlob {
            filename: filename.to_string(),
            media_type: media_type.to_string(),
            size,
        })
    }

    async fn get(&self, filename: &str) -> BlobResult<Option<Bytes>> {
        validate_key(filename)?;
        let map = self.blobs.read().map_err(Self::poisoned)?;
        Ok(map.get(filename).cloned())
    }
}

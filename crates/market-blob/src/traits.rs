use async_trait::async_trait;
use bytes::Bytes;

use crate::error::BlobResult;

/// Metadata for a blob that has been written.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoredBlob {
    pub filename: String,
    pub media_type: String,
    pub size: u64,
}

/// Durable storage for uploaded pictures, addressed by generated filename.
///
/// Implementations must reject filenames that could escape their namespace
/// and must never overwrite an existing blob.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Write a blob under `filename`.
    async fn put(&self, filename: &str, media_type: &str, data: Bytes) -> BlobResult<StoredBlob>;

    /// Read a blob. Returns `Ok(None)` if absent.
    async fn get(&self, filename: &str) -> BlobResult<Option<Bytes>>;

    /// Check whether a blob exists.
    async fn exists(&self, filename: &str) -> BlobResult<bool> {
        Ok(self.get(filename).await?.is_some())
    }
}

/// Validate a filename for use as a flat storage key.
pub(crate) fn validate_key(filename: &str) -> BlobResult<()> {
    use crate::error::BlobError;

    if filename.is_empty()
        || filename.contains("..")
        || filename.contains('/')
        || filename.contains('\\')
        || filename.starts_with('.')
    {
        return Err(BlobError::InvalidFilename(filename.to_string()));
    }
    Ok(())
}

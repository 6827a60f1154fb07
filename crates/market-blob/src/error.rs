/// Errors from blob storage and upload policy checks.
#[derive(Debug, thiserror::Error)]
pub enum BlobError {
    /// The declared media type is not on the allow-list.
    #[error("unsupported media type: {0}")]
    UnsupportedMediaType(String),

    /// The file exceeds the size ceiling.
    #[error("payload too large: {size} bytes (max {max})")]
    PayloadTooLarge { size: u64, max: u64 },

    /// The filename is unsafe to use as a storage key.
    #[error("invalid filename: {0}")]
    InvalidFilename(String),

    /// A file with this name is already stored.
    #[error("blob already exists: {0}")]
    AlreadyExists(String),

    /// I/O error from the underlying storage backend.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result alias for blob operations.
pub type BlobResult<T> = Result<T, BlobError>;

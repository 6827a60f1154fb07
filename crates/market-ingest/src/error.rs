use market_types::ItemId;
use thiserror::Error;

/// Failure kinds of the ingestion pipeline and its repair path.
///
/// Each kind has a stable [`code`](IngestError::code) so the wire
/// representation does not depend on message text.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("unsupported media type: {0}")]
    UnsupportedMediaType(String),

    #[error("payload too large: {size} bytes (max {max})")]
    PayloadTooLarge { size: u64, max: u64 },

    #[error("upload failed: {0}")]
    UploadFailure(String),

    /// An insert, re-read, or update was rejected by the record store.
    /// `id` is set when the record had already been inserted.
    #[error("persistence failed: {detail}")]
    PersistenceFailure { id: Option<ItemId>, detail: String },

    /// The record exists but its hash could not be computed or stored.
    #[error("hash computation failed for {id}: {detail}")]
    HashComputationFailure { id: ItemId, detail: String },

    #[error("item not found: {0}")]
    NotFound(String),

    #[error("invalid form: {0}")]
    InvalidForm(String),
}

impl IngestError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::UnsupportedMediaType(_) => "unsupported_media_type",
            Self::PayloadTooLarge { .. } => "payload_too_large",
            Self::UploadFailure(_) => "upload_failure",
            Self::PersistenceFailure { .. } => "persistence_failure",
            Self::HashComputationFailure { .. } => "hash_computation_failure",
            Self::NotFound(_) => "not_found",
            Self::InvalidForm(_) => "invalid_form",
        }
    }

    /// Id of a record left behind by a failed creation, if any.
    pub fn pending_item(&self) -> Option<&ItemId> {
        match self {
            Self::HashComputationFailure { id, .. } => Some(id),
            Self::PersistenceFailure { id, .. } => id.as_ref(),
            _ => None,
        }
    }
}

impl From<market_blob::BlobError> for IngestError {
    fn from(err: market_blob::BlobError) -> Self {
        use market_blob::BlobError;
        match err {
            BlobError::UnsupportedMediaType(t) => Self::UnsupportedMediaType(t),
            BlobError::PayloadTooLarge { size, max } => Self::PayloadTooLarge { size, max },
            other => Self::UploadFailure(other.to_string()),
        }
    }
}

pub type IngestResult<T> = Result<T, IngestError>;

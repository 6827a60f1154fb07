use bytes::Bytes;
use market_types::NewItem;

/// The single file part of a creation request.
#[derive(Clone, Debug)]
pub struct Upload {
    /// Client-side filename, untrusted.
    pub original_filename: String,
    /// Declared media type, untrusted.
    pub media_type: String,
    pub data: Bytes,
}

impl Upload {
    pub fn new(original_filename: impl Into<String>, media_type: impl Into<String>, data: Bytes) -> Self {
        Self {
            original_filename: original_filename.into(),
            media_type: media_type.into(),
            data,
        }
    }

    pub fn size(&self) -> u64 {
        self.data.len() as u64
    }
}

/// A parsed creation request: one file plus the item metadata.
#[derive(Clone, Debug)]
pub struct CreateRequest {
    pub file: Upload,
    pub fields: NewItem,
}

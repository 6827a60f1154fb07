use serde::{Deserialize, Serialize};

use crate::error::{BlobError, BlobResult};

/// Default upload ceiling: 4 MiB.
pub const DEFAULT_MAX_BYTES: u64 = 4 * 1024 * 1024;

/// Media types accepted by default.
pub const DEFAULT_MEDIA_TYPES: [&str; 3] = ["image/png", "image/jpg", "image/jpeg"];

/// Type and size policy applied to every upload before anything is written.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadPolicy {
    pub allowed_media_types: Vec<String>,
    pub max_bytes: u64,
}

impl Default for UploadPolicy {
    fn default() -> Self {
        Self {
            allowed_media_types: DEFAULT_MEDIA_TYPES.iter().map(|s| s.to_string()).collect(),
            max_bytes: DEFAULT_MAX_BYTES,
        }
    }
}

impl UploadPolicy {
    /// Check the declared media type.
    ///
    /// Comparison ignores case and any `;`-parameters (`image/png; q=1`).
    pub fn check_media_type(&self, media_type: &str) -> BlobResult<()> {
        let essence = media_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();
        if self
            .allowed_media_types
            .iter()
            .any(|allowed| allowed.eq_ignore_ascii_case(&essence))
        {
            Ok(())
        } else {
            Err(BlobError::UnsupportedMediaType(media_type.to_string()))
        }
    }

    /// Check a byte count against the ceiling. A file of exactly
    /// `max_bytes` is accepted.
    pub fn check_size(&self, size: u64) -> BlobResult<()> {
        if size > self.max_bytes {
            return Err(BlobError::PayloadTooLarge {
                size,
                max: self.max_bytes,
            });
        }
        Ok(())
    }
}

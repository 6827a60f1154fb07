use std::time::Duration;

use market_blob::UploadPolicy;

/// Settings for the ingestion pipeline.
#[derive(Clone, Debug)]
pub struct IngestConfig {
    /// Public URL prefix under which stored pictures are served, e.g.
    /// `http://market.example/pictures/items`.
    pub public_base_url: String,
    pub policy: UploadPolicy,
    /// Upper bound on a single blob store write.
    pub blob_timeout: Duration,
    /// Upper bound on a single hash oracle call.
    pub oracle_timeout: Duration,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            public_base_url: "http://localhost:3000/pictures/items".into(),
            policy: UploadPolicy::default(),
            blob_timeout: Duration::from_secs(10),
            oracle_timeout: Duration::from_secs(5),
        }
    }
}

impl IngestConfig {
    /// Absolute URL of a stored picture.
    pub fn picture_url(&self, filename: &str) -> String {
        format!("{}/{}", self.public_base_url.trim_end_matches('/'), filename)
    }
}

use std::net::{Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};
use std::time::Duration;

use market_blob::policy::{DEFAULT_MAX_BYTES, DEFAULT_MEDIA_TYPES};
use market_blob::UploadPolicy;
use market_crypto::HashAlgorithm;
use market_ingest::IngestConfig;
use serde::{Deserialize, Serialize};

use crate::error::{ServerError, ServerResult};

/// Combined size allowed for the text fields of a creation form.
pub const TEXT_FIELDS_LIMIT: usize = 64 * 1024;

/// Part headers and boundaries of a creation form.
pub const FORM_OVERHEAD: u64 = 16 * 1024;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    /// Externally reachable `host[:port]`; picture URLs are built from it.
    pub public_address: String,
    /// Directory holding stored pictures, also served at `/pictures/items`.
    pub blob_root: PathBuf,
    pub max_upload_bytes: u64,
    pub allowed_media_types: Vec<String>,
    pub blob_timeout_ms: u64,
    pub oracle_timeout_ms: u64,
    pub hash_algorithm: HashAlgorithm,
    /// Seconds between repair sweeps; 0 disables the sweeper.
    pub sweep_interval_secs: u64,
    /// Pending records younger than this are left to their in-flight create.
    pub sweep_grace_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from((Ipv4Addr::LOCALHOST, 3000)),
            public_address: "localhost:3000".into(),
            blob_root: PathBuf::from("./public/pictures/items"),
            max_upload_bytes: DEFAULT_MAX_BYTES,
            allowed_media_types: DEFAULT_MEDIA_TYPES.iter().map(|s| s.to_string()).collect(),
            blob_timeout_ms: 10_000,
            oracle_timeout_ms: 5_000,
            hash_algorithm: HashAlgorithm::default(),
            sweep_interval_secs: 60,
            sweep_grace_secs: 30,
        }
    }
}

impl ServerConfig {
    /// Read a TOML config file. Missing keys take their defaults.
    pub fn load(path: impl AsRef<Path>) -> ServerResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| ServerError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml(&text)
    }

    pub fn from_toml(text: &str) -> ServerResult<Self> {
        toml::from_str(text).map_err(|e| ServerError::Config(e.to_string()))
    }

    pub fn to_toml(&self) -> ServerResult<String> {
        toml::to_string_pretty(self).map_err(|e| ServerError::Config(e.to_string()))
    }

    pub fn upload_policy(&self) -> UploadPolicy {
        UploadPolicy {
            allowed_media_types: self.allowed_media_types.clone(),
            max_bytes: self.max_upload_bytes,
        }
    }

    pub fn ingest_config(&self) -> IngestConfig {
        IngestConfig {
            public_base_url: format!("http://{}/pictures/items", self.public_address),
            policy: self.upload_policy(),
            blob_timeout: Duration::from_millis(self.blob_timeout_ms),
            oracle_timeout: Duration::from_millis(self.oracle_timeout_ms),
        }
    }

    /// Request body ceiling: a file at the upload limit plus full text
    /// fields still fits, so the per-part checks decide which part is at
    /// fault.
    pub fn body_limit(&self) -> usize {
        let limit = self
            .max_upload_bytes
            .saturating_add(TEXT_FIELDS_LIMIT as u64)
            .saturating_add(FORM_OVERHEAD);
        usize::try_from(limit).unwrap_or(usize::MAX)
    }

    pub fn sweep_interval(&self) -> Option<Duration> {
        (self.sweep_interval_secs > 0).then(|| Duration::from_secs(self.sweep_interval_secs))
    }

    pub fn sweep_grace(&self) -> Duration {
        Duration::from_secs(self.sweep_grace_secs)
    }
}

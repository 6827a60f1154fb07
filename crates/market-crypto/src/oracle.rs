use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use market_types::{CanonicalFields, ContentHash};
use serde::{Deserialize, Serialize};

use crate::domain::Blake3Oracle;
use crate::keccak::Keccak256Oracle;

/// Errors from hash computation.
#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum OracleError {
    /// The oracle could not be reached or refused the request.
    #[error("hash oracle unavailable: {0}")]
    Unavailable(String),

    #[error("unknown hash algorithm: {0}")]
    UnknownAlgorithm(String),
}

pub type OracleResult<T> = Result<T, OracleError>;

/// Maps an ordered tuple of canonical field values to a content hash.
///
/// Implementations must be deterministic: the same fields always produce the
/// same hash. The call is async so remote oracles fit behind the same seam;
/// callers bound it with a timeout.
#[async_trait]
pub trait HashOracle: Send + Sync {
    /// Short name for logs and configuration (e.g. `"keccak256"`).
    fn name(&self) -> &'static str;

    async fn hash(&self, fields: &CanonicalFields) -> OracleResult<ContentHash>;

    /// Recompute and compare against an expected hash.
    async fn verify(&self, fields: &CanonicalFields, expected: &ContentHash) -> OracleResult<bool> {
        Ok(self.hash(fields).await? == *expected)
    }
}

/// Which built-in oracle to use.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HashAlgorithm {
    #[default]
    Keccak256,
    Blake3,
}

impl HashAlgorithm {
    /// Instantiate the oracle for this algorithm.
    pub fn oracle(self) -> Arc<dyn HashOracle> {
        match self {
            Self::Keccak256 => Arc::new(Keccak256Oracle),
            Self::Blake3 => Arc::new(Blake3Oracle::ITEM),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Keccak256 => "keccak256",
            Self::Blake3 => "blake3",
        }
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HashAlgorithm {
    type Err = OracleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "keccak256" | "keccak" => Ok(Self::Keccak256),
            "blake3" => Ok(Self::Blake3),
            _ => Err(OracleError::UnknownAlgorithm(s.to_string())),
        }
    }
}

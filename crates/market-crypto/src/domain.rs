use async_trait::async_trait;
use market_types::{CanonicalFields, ContentHash};

use crate::oracle::{HashOracle, OracleResult};

/// Domain-separated BLAKE3 oracle.
///
/// The domain tag is prepended to every computation and each field is
/// length-prefixed, so unlike the packed Keccak encoding, moving bytes
/// between adjacent fields changes the hash.
#[derive(Clone, Copy, Debug)]
pub struct Blake3Oracle {
    domain: &'static str,
}

impl Blake3Oracle {
    /// Oracle for item canonical fields.
    pub const ITEM: Self = Self {
        domain: "market-item-v1",
    };

    /// Create an oracle with a custom domain tag.
    pub const fn new(domain: &'static str) -> Self {
        Self { domain }
    }

    pub fn domain(&self) -> &str {
        self.domain
    }

    pub fn digest(&self, fields: &CanonicalFields) -> ContentHash {
        let mut hasher = blake3::Hasher::new();
        hasher.update(self.domain.as_bytes());
        hasher.update(b":");
        for part in fields.as_tuple() {
            hasher.update(&(part.len() as u64).to_le_bytes());
            hasher.update(part.as_bytes());
        }
        ContentHash::from_digest(*hasher.finalize().as_bytes())
    }
}

#[async_trait]
impl HashOracle for Blake3Oracle {
    fn name(&self) -> &'static str {
        "blake3"
    }

    async fn hash(&self, fields: &CanonicalFields) -> OracleResult<ContentHash> {
        Ok(self.digest(fields))
    }
}

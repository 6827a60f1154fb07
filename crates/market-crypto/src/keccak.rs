use alloy_primitives::keccak256;
use async_trait::async_trait;
use market_types::{CanonicalFields, ContentHash};

use crate::oracle::{HashOracle, OracleResult};

/// Keccak-256 over the Solidity tightly-packed encoding of the canonical
/// fields.
///
/// Packed encoding of `string` values is the plain concatenation of their
/// UTF-8 bytes, so the result equals
/// `soliditySha3(name, description, specifications, externalLink, picture)`.
/// Field boundaries are not encoded: `("ab", "c")` and `("a", "bc")` collide.
#[derive(Clone, Copy, Debug, Default)]
pub struct Keccak256Oracle;

impl Keccak256Oracle {
    /// The packed preimage.
    pub fn encode_packed(fields: &CanonicalFields) -> Vec<u8> {
        let parts = fields.as_tuple();
        let mut out = Vec::with_capacity(parts.iter().map(|p| p.len()).sum());
        for part in parts {
            out.extend_from_slice(part.as_bytes());
        }
        out
    }

    pub fn digest(fields: &CanonicalFields) -> ContentHash {
        ContentHash::from_digest(keccak256(Self::encode_packed(fields)).0)
    }
}

#[async_trait]
impl HashOracle for Keccak256Oracle {
    fn name(&self) -> &'static str {
        "keccak256"
    }

    async fn hash(&self, fields: &CanonicalFields) -> OracleResult<ContentHash> {
        Ok(Self::digest(fields))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tuple(parts: [&str; 5]) -> CanonicalFields {
        CanonicalFields {
            name: parts[0].into(),
            description: parts[1].into(),
            specifications: parts[2].into(),
            external_link: parts[3].into(),
            picture: parts[4].into(),
        }
    }

    #[test]
    fn empty_fields_hash_to_empty_keccak() {
        let h = Keccak256Oracle::digest(&tuple(["", "", "", "", ""]));
        assert_eq!(
            h.to_hex(),
            "0xc5d2460186f7233c927e7db2dcc703c0e500b653ca82273b7bfad8045d85a470"
        );
    }

    #[test]
    fn packed_encoding_concatenates() {
        let h = Keccak256Oracle::digest(&tuple(["a", "b", "c", "", ""]));
        assert_eq!(
            h.to_hex(),
            "0x4e03657aea45a94fc7d47ba826c8d667c0d1e6e33a64a036ec44f58fa12d6c45"
        );
    }

    #[test]
    fn field_order_matters() {
        let a = Keccak256Oracle::digest(&tuple(["x", "y", "", "", ""]));
        let b = Keccak256Oracle::digest(&tuple(["y", "x", "", "", ""]));
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn trait_matches_digest() {
        let f = tuple(["Chair", "d", "s", "l", "p"]);
        let via_trait = Keccak256Oracle.hash(&f).await.unwrap();
        assert_eq!(via_trait, Keccak256Oracle::digest(&f));
        assert_eq!(via_trait.to_string().len(), 66);
    }
}

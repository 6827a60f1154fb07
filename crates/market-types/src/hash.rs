use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::TypeError;

/// Content-integrity hash over an item's canonical fields.
///
/// Always 32 bytes. The wire and storage form is `0x` followed by 64 lowercase
/// hex characters (66 characters total), which is also what Solidity tooling
/// prints for a `bytes32`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContentHash([u8; 32]);

impl ContentHash {
    /// Length of the rendered `0x`-prefixed form.
    pub const RENDERED_LEN: usize = 66;

    /// Wrap a pre-computed digest.
    pub const fn from_digest(digest: [u8; 32]) -> Self {
        Self(digest)
    }

    /// The raw 32-byte digest.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// `0x`-prefixed hex rendering.
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }

    /// Short form for log lines (first 4 bytes).
    pub fn short_hex(&self) -> String {
        format!("0x{}", hex::encode(&self.0[..4]))
    }

    /// Parse from hex, with or without the `0x` prefix.
    pub fn from_hex(s: &str) -> Result<Self, TypeError> {
        let digits = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(digits).map_err(|e| TypeError::InvalidHex(e.to_string()))?;
        if bytes.len() != 32 {
            return Err(TypeError::InvalidLength {
                expected: 32,
                actual: bytes.len(),
            });
        }
        let mut arr = [0u8; 32];
        arr.copy_from_slice(&bytes);
        Ok(Self(arr))
    }
}

impl fmt::Debug for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContentHash({})", self.short_hex())
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl FromStr for ContentHash {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl From<[u8; 32]> for ContentHash {
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

impl Serialize for ContentHash {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for ContentHash {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rendered_form_is_66_chars() {
        let h = ContentHash::from_digest([0xab; 32]);
        let s = h.to_string();
        assert_eq!(s.len(), ContentHash::RENDERED_LEN);
        assert!(s.starts_with("0x"));
    }

    #[test]
    fn parse_accepts_prefix_or_bare() {
        let h = ContentHash::from_digest([7; 32]);
        assert_eq!(ContentHash::from_hex(&h.to_hex()).unwrap(), h);
        assert_eq!(ContentHash::from_hex(&h.to_hex()[2..]).unwrap(), h);
    }

    #[test]
    fn parse_rejects_wrong_length() {
        let err = ContentHash::from_hex("0xabcd").unwrap_err();
        assert_eq!(err, TypeError::InvalidLength { expected: 32, actual: 2 });
    }

    #[test]
    fn parse_rejects_non_hex() {
        assert!(matches!(ContentHash::from_hex("0xzz"), Err(TypeError::InvalidHex(_))));
    }

    #[test]
    fn serializes_as_plain_string() {
        let h = ContentHash::from_digest([1; 32]);
        let json = serde_json::to_string(&h).unwrap();
        assert_eq!(json, format!("\"{}\"", h.to_hex()));
        let back: ContentHash = serde_json::from_str(&json).unwrap();
        assert_eq!(back, h);
    }

    #[test]
    fn short_hex_is_prefix() {
        let h = ContentHash::from_digest([0x12; 32]);
        assert!(h.to_hex().starts_with(&h.short_hex()));
    }
}

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Identifier layout version.
///
/// Item ids are assigned before the record exists and double as the stem of
/// the stored picture's filename. The layout is pinned per version so a
/// change to filename generation cannot silently change id length or content.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IdScheme {
    /// `{unix_ms:013}-{random:010}-{nonce:016x}`, 41 ASCII characters.
    V1,
}

impl IdScheme {
    /// The scheme used for newly minted ids.
    pub const CURRENT: Self = Self::V1;

    /// Exact length of an id in this scheme.
    pub const fn id_len(self) -> usize {
        match self {
            Self::V1 => 41,
        }
    }
}

const V1_MS_DIGITS: usize = 13;
const V1_RANDOM_DIGITS: usize = 10;
const V1_NONCE_HEX: usize = 16;

/// Largest timestamp that still fits the 13-digit field.
pub const V1_MAX_MS: u64 = 9_999_999_999_999;
/// Exclusive upper bound of the decimal random component.
pub const V1_RANDOM_BOUND: u64 = 10_000_000_000;

/// Unique, immutable item identifier.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ItemId(String);

impl ItemId {
    /// Mint a V1 id from its three components.
    ///
    /// `unix_ms` is clamped to 13 digits and `random` reduced modulo
    /// [`V1_RANDOM_BOUND`] so the rendered id is always exactly 41 characters.
    pub fn v1(unix_ms: u64, random: u64, nonce: u64) -> Self {
        let ms = unix_ms.min(V1_MAX_MS);
        let random = random % V1_RANDOM_BOUND;
        Self(format!("{ms:013}-{random:010}-{nonce:016x}"))
    }

    /// Parse and validate an id string.
    pub fn parse(s: &str) -> Result<Self, TypeError> {
        validate_v1(s)?;
        Ok(Self(s.to_string()))
    }

    /// Recover the id from a generated filename: its first
    /// `IdScheme::CURRENT.id_len()` characters.
    pub fn from_filename(filename: &str) -> Result<Self, TypeError> {
        let len = IdScheme::CURRENT.id_len();
        match filename.get(..len) {
            Some(stem) => Self::parse(stem),
            None => Err(TypeError::InvalidItemId {
                id: filename.to_string(),
                reason: format!("filename shorter than {len} characters"),
            }),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Millisecond timestamp component.
    pub fn timestamp_ms(&self) -> u64 {
        self.0[..V1_MS_DIGITS].parse().unwrap_or_default()
    }
}

fn validate_v1(s: &str) -> Result<(), TypeError> {
    let invalid = |reason: &str| TypeError::InvalidItemId {
        id: s.to_string(),
        reason: reason.to_string(),
    };

    if s.len() != IdScheme::V1.id_len() {
        return Err(TypeError::InvalidLength {
            expected: IdScheme::V1.id_len(),
            actual: s.len(),
        });
    }
    let bytes = s.as_bytes();
    let sep1 = V1_MS_DIGITS;
    let sep2 = sep1 + 1 + V1_RANDOM_DIGITS;
    if bytes[sep1] != b'-' || bytes[sep2] != b'-' {
        return Err(invalid("separators out of place"));
    }
    if !bytes[..sep1].iter().all(u8::is_ascii_digit) {
        return Err(invalid("timestamp must be decimal"));
    }
    if !bytes[sep1 + 1..sep2].iter().all(u8::is_ascii_digit) {
        return Err(invalid("random component must be decimal"));
    }
    let nonce = &bytes[sep2 + 1..];
    debug_assert_eq!(nonce.len(), V1_NONCE_HEX);
    if !nonce
        .iter()
        .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(b))
    {
        return Err(invalid("nonce must be lowercase hex"));
    }
    Ok(())
}

impl fmt::Debug for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ItemId({})", self.0)
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for ItemId {
    type Error = TypeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        validate_v1(&value)?;
        Ok(Self(value))
    }
}

impl From<ItemId> for String {
    fn from(id: ItemId) -> Self {
        id.0
    }
}

impl AsRef<str> for ItemId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

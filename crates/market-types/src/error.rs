use thiserror::Error;

/// Errors produced by type operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid hex string: {0}")]
    InvalidHex(String),

    #[error("invalid byte length: expected {expected}, got {actual}")]
    InvalidLength { expected: usize, actual: usize },

    #[error("invalid item id {id:?}: {reason}")]
    InvalidItemId { id: String, reason: String },

    #[error("unknown item state: {0}")]
    UnknownState(u8),

    #[error("invalid field {field}: {reason}")]
    InvalidField { field: &'static str, reason: String },
}

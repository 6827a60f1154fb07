use market_types::{HashStatus, ItemId, TypeError};

/// Errors from item store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The requested record was not found.
    #[error("item not found: {0}")]
    NotFound(ItemId),

    /// A record with this id already exists.
    #[error("duplicate item id: {0}")]
    AlreadyExists(ItemId),

    /// The record failed validation.
    #[error("validation failed: {0}")]
    Validation(#[from] TypeError),

    /// The update would move the hash state backwards.
    #[error("illegal hash transition for {id}: {from} -> {to}")]
    InvalidTransition {
        id: ItemId,
        from: HashStatus,
        to: HashStatus,
    },

    /// The backend is unreachable or its state is unusable.
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

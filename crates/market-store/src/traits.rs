use async_trait::async_trait;
use market_types::{CanonicalFields, ContentHash, Item, ItemId, ItemSummary};

use crate::error::StoreResult;
use crate::query::ItemQuery;

/// Durable storage of item records.
///
/// All implementations must satisfy these invariants:
/// - Records are keyed by the caller-supplied id; `insert` never overwrites.
/// - `set_hash` and `mark_hash_failed` touch only the hash fields and
///   `updatedAt`, and only along legal `HashStatus` transitions.
/// - `find` returns records sorted by `createdAt` descending, truncated to
///   the query limit.
/// - All backend errors are propagated, never silently ignored.
#[async_trait]
pub trait ItemStore: Send + Sync {
    /// Insert a new record.
    ///
    /// Fails with `AlreadyExists` on a duplicate id and `Validation` if the
    /// record is malformed.
    async fn insert(&self, item: &Item) -> StoreResult<()>;

    /// Read a full record by id. Returns `Ok(None)` if absent.
    async fn get(&self, id: &ItemId) -> StoreResult<Option<Item>>;

    /// Read a record projected to its canonical hash input.
    ///
    /// Default implementation projects the result of `get()`. Backends may
    /// override to fetch only the five fields.
    async fn get_canonical(&self, id: &ItemId) -> StoreResult<Option<CanonicalFields>> {
        Ok(self.get(id).await?.map(|item| item.canonical()))
    }

    /// Record the reconciled hash and move the record to `Hashed`.
    ///
    /// Re-applying the same hash to a `Hashed` record is a no-op.
    async fn set_hash(&self, id: &ItemId, hash: &ContentHash) -> StoreResult<()>;

    /// Move a not-yet-hashed record to `Failed`.
    async fn mark_hash_failed(&self, id: &ItemId) -> StoreResult<()>;

    /// Filtered scan, newest first.
    async fn find(&self, query: &ItemQuery) -> StoreResult<Vec<Item>>;

    /// Filtered scan projected to the listing summary.
    async fn find_summaries(&self, query: &ItemQuery) -> StoreResult<Vec<ItemSummary>> {
        Ok(self
            .find(query)
            .await?
            .iter()
            .map(Item::summary)
            .collect())
    }
}

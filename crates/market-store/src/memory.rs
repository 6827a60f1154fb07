use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::Utc;
use market_types::{ContentHash, HashStatus, Item, ItemId};

use crate::error::{StoreError, StoreResult};
use crate::query::ItemQuery;
use crate::traits::ItemStore;

/// In-memory, HashMap-based item store.
///
/// Intended for tests and embedding. Records are held behind a `RwLock` and
/// cloned on read/write. Locks are never held across an await point.
pub struct InMemoryItemStore {
    items: RwLock<HashMap<ItemId, Item>>,
}

impl InMemoryItemStore {
    pub fn new() -> Self {
        Self {
            items: RwLock::new(HashMap::new()),
        }
    }

    /// Number of records currently stored.
    pub fn len(&self) -> usize {
        self.items.read().map(|m| m.len()).unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Overwrite a stored record in place, bypassing the hash state rules.
    ///
    /// Stands in for the out-of-band processes that change `state`, `price`,
    /// or `owner`.
    pub fn replace(&self, item: Item) -> StoreResult<()> {
        let mut map = self.write_lock()?;
        match map.get_mut(&item.id) {
            Some(slot) => {
                *slot = item;
                Ok(())
            }
            None => Err(StoreError::NotFound(item.id)),
        }
    }

    fn read_lock(&self) -> StoreResult<std::sync::RwLockReadGuard<'_, HashMap<ItemId, Item>>> {
        self.items
            .read()
            .map_err(|e| StoreError::Unavailable(format!("lock poisoned: {e}")))
    }

    fn write_lock(&self) -> StoreResult<std::sync::RwLockWriteGuard<'_, HashMap<ItemId, Item>>> {
        self.items
            .write()
            .map_err(|e| StoreError::Unavailable(format!("lock poisoned: {e}")))
    }

    fn transition(
        &self,
        id: &ItemId,
        next: HashStatus,
        hash: Option<&ContentHash>,
    ) -> StoreResult<()> {
        let mut map = self.write_lock()?;
        let item = map
            .get_mut(id)
            .ok_or_else(|| StoreError::NotFound(id.clone()))?;

        if item.hash_status == HashStatus::Hashed
            && next == HashStatus::Hashed
            && item.raw_data_hash.as_ref() == hash
        {
            return Ok(());
        }
        if !item.hash_status.can_transition_to(next) {
            return Err(StoreError::InvalidTransition {
                id: id.clone(),
                from: item.hash_status,
                to: next,
            });
        }

        item.hash_status = next;
        item.raw_data_hash = hash.copied();
        item.updated_at = Utc::now();
        Ok(())
    }
}

impl Default for InMemoryItemStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ItemStore for InMemoryItemStore {
    async fn insert(&self, item: &Item) -> StoreResult<()> {
        item.validate()?;
        let mut map = self.write_lock()?;
        if map.contains_key(&item.id) {
            return Err(StoreError::AlreadyExists(item.id.clone()));
        }
        map.insert(item.id.clone(), item.clone());
        tracing::debug!(id = %item.id, "item inserted");
        Ok(())
    }

    async fn get(&self, id: &ItemId) -> StoreResult<Option<Item>> {
        Ok(self.read_lock()?.get(id).cloned())
    }

    async fn set_hash(&self, id: &ItemId, hash: &ContentHash) -> StoreResult<()> {
        self.transition(id, HashStatus::Hashed, Some(hash))
    }

    async fn mark_hash_failed(&self, id: &ItemId) -> StoreResult<()> {
        self.transition(id, HashStatus::Failed, None)
    }

    async fn find(&self, query: &ItemQuery) -> StoreResult<Vec<Item>> {
        let map = self.read_lock()?;
        let mut hits: Vec<Item> = map.values().filter(|i| query.matches(i)).cloned().collect();
        drop(map);

        hits.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.id.cmp(&a.id))
        });
        if let Some(limit) = query.limit {
            hits.truncate(limit);
        }
        Ok(hits)
    }
}

impl std::fmt::Debug for InMemoryItemStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryItemStore")
            .field("item_count", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::{ItemFilter, LISTING_LIMIT};
    use chrono::{Duration, TimeZone};
    use market_types::{ItemState, NewItem};

    fn make_item(n: u64, owner: &str, state: ItemState) -> Item {
        let created = Utc.timestamp_millis_opt(1_700_000_000_000 + n as i64).unwrap();
        let mut item = Item::new(
            ItemId::v1(1_700_000_000_000 + n, n, n),
            format!("http://localhost/pictures/items/{n}.png"),
            NewItem {
                name: format!("Item {n}"),
                description: "d".into(),
                specifications: "s".into(),
                external_link: "l".into(),
                price: n,
                owner: owner.into(),
            },
            created,
        );
        item.state = state;
        item
    }

    // -----------------------------------------------------------------------
    // Core CRUD
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn insert_and_get() {
        let store = InMemoryItemStore::new();
        let item = make_item(1, "alice", ItemState::Listed);
        store.insert(&item).await.unwrap();

        let read_back = store.get(&item.id).await.unwrap().expect("should exist");
        assert_eq!(read_back, item);
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn get_missing_is_none() {
        let store = InMemoryItemStore::new();
        assert!(store.get(&ItemId::v1(1, 1, 1)).await.unwrap().is_none());
        assert!(store.get_canonical(&ItemId::v1(1, 1, 1)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn duplicate_insert_rejected() {
        let store = InMemoryItemStore::new();
        let item = make_item(1, "alice", ItemState::Listed);
        store.insert(&item).await.unwrap();
        let err = store.insert(&item).await.unwrap_err();
        assert!(matches!(err, StoreError::AlreadyExists(_)));
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn invalid_record_rejected() {
        let store = InMemoryItemStore::new();
        let mut item = make_item(1, "alice", ItemState::Listed);
        item.name.clear();
        assert!(matches!(
            store.insert(&item).await.unwrap_err(),
            StoreError::Validation(_)
        ));
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn canonical_projection() {
        let store = InMemoryItemStore::new();
        let item = make_item(3, "alice", ItemState::Listed);
        store.insert(&item).await.unwrap();
        let canonical = store.get_canonical(&item.id).await.unwrap().unwrap();
        assert_eq!(canonical, item.canonical());
    }

    // -----------------------------------------------------------------------
    // Hash reconciliation
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn set_hash_transitions_pending_to_hashed() {
        let store = InMemoryItemStore::new();
        let item = make_item(1, "alice", ItemState::Listed);
        store.insert(&item).await.unwrap();

        let hash = ContentHash::from_digest([9; 32]);
        store.set_hash(&item.id, &hash).await.unwrap();
        let stored = store.get(&item.id).await.unwrap().unwrap();
        assert_eq!(stored.raw_data_hash, Some(hash));
        assert_eq!(stored.hash_status, HashStatus::Hashed);
        assert!(stored.updated_at >= stored.created_at);

        // Only hash fields change.
        assert_eq!(stored.canonical(), item.canonical());
        assert_eq!(stored.price, item.price);
    }

    #[tokio::test]
    async fn set_same_hash_twice_is_noop() {
        let store = InMemoryItemStore::new();
        let item = make_item(1, "alice", ItemState::Listed);
        store.insert(&item).await.unwrap();
        let hash = ContentHash::from_digest([9; 32]);
        store.set_hash(&item.id, &hash).await.unwrap();
        store.set_hash(&item.id, &hash).await.unwrap();
    }

    #[tokio::test]
    async fn rehash_with_different_value_rejected() {
        let store = InMemoryItemStore::new();
        let item = make_item(1, "alice", ItemState::Listed);
        store.insert(&item).await.unwrap();
        store.set_hash(&item.id, &ContentHash::from_digest([1; 32])).await.unwrap();
        let err = store
            .set_hash(&item.id, &ContentHash::from_digest([2; 32]))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::InvalidTransition { .. }));
    }

    #[tokio::test]
    async fn failed_can_be_repaired() {
        let store = InMemoryItemStore::new();
        let item = make_item(1, "alice", ItemState::Listed);
        store.insert(&item).await.unwrap();
        store.mark_hash_failed(&item.id).await.unwrap();
        assert_eq!(
            store.get(&item.id).await.unwrap().unwrap().hash_status,
            HashStatus::Failed
        );
        store.set_hash(&item.id, &ContentHash::from_digest([3; 32])).await.unwrap();
        let stored = store.get(&item.id).await.unwrap().unwrap();
        assert_eq!(stored.hash_status, HashStatus::Hashed);
    }

    #[tokio::test]
    async fn hashed_cannot_be_marked_failed() {
        let store = InMemoryItemStore::new();
        let item = make_item(1, "alice", ItemState::Listed);
        store.insert(&item).await.unwrap();
        store.set_hash(&item.id, &ContentHash::from_digest([3; 32])).await.unwrap();
        assert!(store.mark_hash_failed(&item.id).await.is_err());
    }

    #[tokio::test]
    async fn update_missing_is_not_found() {
        let store = InMemoryItemStore::new();
        let err = store
            .set_hash(&ItemId::v1(1, 1, 1), &ContentHash::from_digest([0; 32]))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    // -----------------------------------------------------------------------
    // Scans
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn listing_is_capped_and_newest_first() {
        let store = InMemoryItemStore::new();
        for n in 0..20 {
            store.insert(&make_item(n, "alice", ItemState::Listed)).await.unwrap();
        }
        let hits = store.find(&ItemQuery::listed()).await.unwrap();
        assert_eq!(hits.len(), LISTING_LIMIT);
        assert!(hits.windows(2).all(|w| w[0].created_at >= w[1].created_at));
        assert_eq!(hits[0].name, "Item 19");
    }

    #[tokio::test]
    async fn listing_filters_state() {
        let store = InMemoryItemStore::new();
        store.insert(&make_item(1, "alice", ItemState::Listed)).await.unwrap();
        store.insert(&make_item(2, "alice", ItemState::Sold)).await.unwrap();
        store.insert(&make_item(3, "alice", ItemState::Removed)).await.unwrap();

        let listed = store.find(&ItemQuery::listed()).await.unwrap();
        assert_eq!(listed.len(), 1);

        let mine = store.find(&ItemQuery::owned_by("alice")).await.unwrap();
        assert_eq!(mine.len(), 2);
        assert!(mine.iter().all(|i| i.state != ItemState::Removed));
    }

    #[tokio::test]
    async fn summaries_project_display_fields() {
        let store = InMemoryItemStore::new();
        store.insert(&make_item(1, "alice", ItemState::Listed)).await.unwrap();
        let summaries = store.find_summaries(&ItemQuery::listed()).await.unwrap();
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].owner, "alice");
        assert_eq!(summaries[0].price, 1);
    }

    #[tokio::test]
    async fn hash_status_scan_with_cutoff() {
        let store = InMemoryItemStore::new();
        let old = make_item(1, "alice", ItemState::Listed);
        store.insert(&old).await.unwrap();
        let cutoff = old.created_at + Duration::milliseconds(1);
        store.insert(&make_item(5, "alice", ItemState::Listed)).await.unwrap();

        let q = ItemQuery::hash_status(HashStatus::Pending).created_before(cutoff);
        let hits = store.find(&q).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, old.id);
        assert!(store
            .find(&ItemQuery::new(ItemFilter::HashStatus(HashStatus::Hashed)))
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn replace_updates_out_of_band_fields() {
        let store = InMemoryItemStore::new();
        let mut item = make_item(1, "alice", ItemState::Listed);
        store.insert(&item).await.unwrap();
        item.state = ItemState::Removed;
        store.replace(item.clone()).unwrap();
        assert_eq!(
            store.get(&item.id).await.unwrap().unwrap().state,
            ItemState::Removed
        );
        assert!(store.replace(make_item(9, "x", ItemState::Listed)).is_err());
    }
}

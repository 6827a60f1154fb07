use chrono::{DateTime, Utc};
use market_types::{HashStatus, Item, ItemState};

/// Maximum number of records returned by listing views.
pub const LISTING_LIMIT: usize = 12;

/// Record predicate for scans.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ItemFilter {
    All,
    /// `state == s`
    StateEq(ItemState),
    /// `owner == owner AND state != excluded`
    OwnerExcluding { owner: String, excluded: ItemState },
    /// Case-insensitive substring match on `name`. The keyword is matched
    /// literally.
    NameContains(String),
    HashStatus(HashStatus),
}

impl ItemFilter {
    pub fn matches(&self, item: &Item) -> bool {
        match self {
            Self::All => true,
            Self::StateEq(state) => item.state == *state,
            Self::OwnerExcluding { owner, excluded } => {
                item.owner == *owner && item.state != *excluded
            }
            Self::NameContains(keyword) => item
                .name
                .to_lowercase()
                .contains(&keyword.to_lowercase()),
            Self::HashStatus(status) => item.hash_status == *status,
        }
    }
}

/// A filtered scan, always sorted by `createdAt` descending.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ItemQuery {
    pub filter: ItemFilter,
    /// Only records created strictly before this instant.
    pub created_before: Option<DateTime<Utc>>,
    pub limit: Option<usize>,
}

impl ItemQuery {
    pub fn new(filter: ItemFilter) -> Self {
        Self {
            filter,
            created_before: None,
            limit: None,
        }
    }

    /// Public listing: active items only.
    pub fn listed() -> Self {
        Self::new(ItemFilter::StateEq(ItemState::Listed)).with_limit(LISTING_LIMIT)
    }

    /// An owner's items, excluding removed ones.
    pub fn owned_by(owner: impl Into<String>) -> Self {
        Self::new(ItemFilter::OwnerExcluding {
            owner: owner.into(),
            excluded: ItemState::Removed,
        })
        .with_limit(LISTING_LIMIT)
    }

    /// Keyword search on `name`, no state filter.
    pub fn search(keywords: impl Into<String>) -> Self {
        Self::new(ItemFilter::NameContains(keywords.into())).with_limit(LISTING_LIMIT)
    }

    pub fn hash_status(status: HashStatus) -> Self {
        Self::new(ItemFilter::HashStatus(status))
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn created_before(mut self, cutoff: DateTime<Utc>) -> Self {
        self.created_before = Some(cutoff);
        self
    }

    pub fn matches(&self, item: &Item) -> bool {
        if let Some(cutoff) = self.created_before {
            if item.created_at >= cutoff {
                return false;
            }
        }
        self.filter.matches(item)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use market_types::{ItemId, NewItem};

    fn item(name: &str, owner: &str, state: ItemState) -> Item {
        let mut item = Item::new(
            ItemId::v1(1, 2, 3),
            "http://p".into(),
            NewItem {
                name: name.into(),
                owner: owner.into(),
                ..Default::default()
            },
            Utc::now(),
        );
        item.state = state;
        item
    }

    #[test]
    fn listed_matches_only_active() {
        let q = ItemQuery::listed();
        assert_eq!(q.limit, Some(LISTING_LIMIT));
        assert!(q.matches(&item("a", "o", ItemState::Listed)));
        assert!(!q.matches(&item("a", "o", ItemState::Reserved)));
        assert!(!q.matches(&item("a", "o", ItemState::Removed)));
    }

    #[test]
    fn owner_excludes_removed() {
        let q = ItemQuery::owned_by("alice");
        assert!(q.matches(&item("a", "alice", ItemState::Listed)));
        assert!(q.matches(&item("a", "alice", ItemState::Sold)));
        assert!(!q.matches(&item("a", "alice", ItemState::Removed)));
        assert!(!q.matches(&item("a", "bob", ItemState::Listed)));
    }

    #[test]
    fn search_is_case_insensitive_and_literal() {
        let q = ItemQuery::search("CHA");
        assert!(q.matches(&item("Oak Chair", "o", ItemState::Removed)));
        assert!(!q.matches(&item("Table", "o", ItemState::Listed)));

        let dot = ItemQuery::search("c.air");
        assert!(!dot.matches(&item("chair", "o", ItemState::Listed)));
        assert!(dot.matches(&item("c.air", "o", ItemState::Listed)));
    }

    #[test]
    fn created_before_cutoff() {
        let it = item("a", "o", ItemState::Listed);
        let q = ItemQuery::new(ItemFilter::All).created_before(it.created_at);
        assert!(!q.matches(&it));
        let q = ItemQuery::new(ItemFilter::All)
            .created_before(it.created_at + chrono::Duration::seconds(1));
        assert!(q.matches(&it));
    }
}

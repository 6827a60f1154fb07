use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::TypeError;
use crate::hash::ContentHash;
use crate::id::ItemId;

/// Lifecycle stage of an item.
///
/// Stored and transmitted as a small integer. This subsystem only reads and
/// filters on the state; transitions are driven elsewhere.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum ItemState {
    /// Active and visible in the public listing.
    #[default]
    Listed,
    Reserved,
    Sold,
    Completed,
    /// Withdrawn; hidden from every listing.
    Removed,
}

impl ItemState {
    pub const fn code(self) -> u8 {
        match self {
            Self::Listed => 0,
            Self::Reserved => 1,
            Self::Sold => 2,
            Self::Completed => 3,
            Self::Removed => 4,
        }
    }
}

impl TryFrom<u8> for ItemState {
    type Error = TypeError;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(Self::Listed),
            1 => Ok(Self::Reserved),
            2 => Ok(Self::Sold),
            3 => Ok(Self::Completed),
            4 => Ok(Self::Removed),
            other => Err(TypeError::UnknownState(other)),
        }
    }
}

impl From<ItemState> for u8 {
    fn from(state: ItemState) -> Self {
        state.code()
    }
}

/// Progress of the two-phase write.
///
/// `Pending → Hashed` is the normal path. `Pending → Failed` records an
/// oracle or reconciliation failure; `Failed → Hashed` happens on repair.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HashStatus {
    #[default]
    Pending,
    Hashed,
    Failed,
}

impl HashStatus {
    /// Whether moving from `self` to `next` is a legal transition.
    pub fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Hashed)
                | (Self::Pending, Self::Failed)
                | (Self::Failed, Self::Hashed)
                | (Self::Failed, Self::Failed)
        )
    }
}

impl fmt::Display for HashStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Pending => "pending",
            Self::Hashed => "hashed",
            Self::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// Creator-supplied fields of a creation request.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewItem {
    pub name: String,
    pub description: String,
    pub specifications: String,
    pub external_link: String,
    pub price: u64,
    pub owner: String,
}

impl NewItem {
    /// First required field that is blank, if any.
    pub fn missing_field(&self) -> Option<&'static str> {
        [("name", &self.name), ("owner", &self.owner)]
            .into_iter()
            .find(|(_, value)| value.trim().is_empty())
            .map(|(field, _)| field)
    }
}

/// The ordered field tuple that is the sole input to the content hash.
///
/// Field order is `name, description, specifications, externalLink, picture`
/// and is part of the hash definition.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanonicalFields {
    pub name: String,
    pub description: String,
    pub specifications: String,
    pub external_link: String,
    pub picture: String,
}

impl CanonicalFields {
    /// The fields as an ordered array of string slices.
    pub fn as_tuple(&self) -> [&str; 5] {
        [
            self.name.as_str(),
            self.description.as_str(),
            self.specifications.as_str(),
            self.external_link.as_str(),
            self.picture.as_str(),
        ]
    }
}

/// Display projection used by listing views.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemSummary {
    #[serde(rename = "_id")]
    pub id: ItemId,
    pub name: String,
    pub picture: String,
    pub price: u64,
    pub owner: String,
}

/// A stored catalog item.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    #[serde(rename = "_id")]
    pub id: ItemId,
    pub name: String,
    pub description: String,
    pub specifications: String,
    pub external_link: String,
    pub picture: String,
    pub price: u64,
    pub owner: String,
    #[serde(default)]
    pub state: ItemState,
    /// Absent until reconciliation succeeds. Absence means "not yet
    /// computed", never "invalid".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_data_hash: Option<ContentHash>,
    #[serde(default)]
    pub hash_status: HashStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Item {
    /// Build an unhashed record from a creation request.
    pub fn new(id: ItemId, picture: String, fields: NewItem, now: DateTime<Utc>) -> Self {
        Self {
            id,
            name: fields.name,
            description: fields.description,
            specifications: fields.specifications,
            external_link: fields.external_link,
            picture,
            price: fields.price,
            owner: fields.owner,
            state: ItemState::default(),
            raw_data_hash: None,
            hash_status: HashStatus::Pending,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn canonical(&self) -> CanonicalFields {
        CanonicalFields {
            name: self.name.clone(),
            description: self.description.clone(),
            specifications: self.specifications.clone(),
            external_link: self.external_link.clone(),
            picture: self.picture.clone(),
        }
    }

    pub fn summary(&self) -> ItemSummary {
        ItemSummary {
            id: self.id.clone(),
            name: self.name.clone(),
            picture: self.picture.clone(),
            price: self.price,
            owner: self.owner.clone(),
        }
    }

    pub fn is_hash_pending(&self) -> bool {
        self.raw_data_hash.is_none()
    }

    /// Record-level validation applied by stores before insert.
    pub fn validate(&self) -> Result<(), TypeError> {
        let required = [
            ("name", &self.name),
            ("owner", &self.owner),
            ("picture", &self.picture),
        ];
        for (field, value) in required {
            if value.trim().is_empty() {
                return Err(TypeError::InvalidField {
                    field,
                    reason: "must not be empty".into(),
                });
            }
        }
        if self.raw_data_hash.is_some() || self.hash_status != HashStatus::Pending {
            return Err(TypeError::InvalidField {
                field: "rawDataHash",
                reason: "must be unset on insert".into(),
            });
        }
        Ok(())
    }
}

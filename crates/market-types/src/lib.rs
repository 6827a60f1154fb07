//! Foundation types for the market catalog.
//!
//! Every other market crate depends on `market-types`. The types here are
//! pure data: no I/O, no hashing backends, no storage.
//!
//! # Key Types
//!
//! - [`ItemId`] -- versioned, storage-independent item identifier
//! - [`Item`] -- the full stored record
//! - [`NewItem`] -- creator-supplied fields of a creation request
//! - [`CanonicalFields`] -- the ordered field tuple that feeds the content hash
//! - [`ItemSummary`] -- display projection used by listing views
//! - [`ItemState`] -- lifecycle stage (listed, reserved, sold, ...)
//! - [`HashStatus`] -- two-phase write state (`pending`, `hashed`, `failed`)
//! - [`ContentHash`] -- `0x`-prefixed 32-byte digest

pub mod error;
pub mod hash;
pub mod id;
pub mod item;

pub use error::TypeError;
pub use hash::ContentHash;
pub use id::{IdScheme, ItemId};
pub use item::{CanonicalFields, HashStatus, Item, ItemState, ItemSummary, NewItem};

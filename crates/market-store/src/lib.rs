//! Item record storage for the market catalog.
//!
//! Records are keyed by an externally supplied [`ItemId`](market_types::ItemId);
//! stores never mint surrogate keys. A store offers insert, point lookup,
//! the two partial updates of the hash reconciliation step, and a filtered
//! scan sorted newest-first with a result cap.
//!
//! # Storage Backends
//!
//! All backends implement the [`ItemStore`] trait:
//!
//! - [`InMemoryItemStore`] -- `HashMap`-based store for tests and embedding
//!
//! # Design Rules
//!
//! 1. Insert never overwrites: a duplicate id is an error.
//! 2. Only `rawDataHash`/`hashStatus` are mutated here, and only along legal
//!    [`HashStatus`](market_types::HashStatus) transitions.
//! 3. Scans are sorted by `createdAt` descending.
//! 4. All backend errors are propagated, never silently ignored.

pub mod error;
pub mod memory;
pub mod query;
pub mod traits;

pub use error::{StoreError, StoreResult};
pub use memory::InMemoryItemStore;
pub use query::{ItemFilter, ItemQuery, LISTING_LIMIT};
pub use traits::ItemStore;

//! Picture storage for the market catalog.
//!
//! Uploaded files are checked against an [`UploadPolicy`], given a generated
//! filename by the [`FilenameGenerator`], and written through a
//! [`BlobStore`]. The generated filename starts with the item's
//! [`ItemId`](market_types::ItemId), so the id can always be recovered from
//! the stored name.
//!
//! # Storage Backends
//!
//! - [`FilesystemBlobStore`] -- files under a root directory, served publicly
//! - [`InMemoryBlobStore`] -- `HashMap`-based store for tests

pub mod error;
pub mod filesystem;
pub mod memory;
pub mod naming;
pub mod policy;
pub mod traits;

pub use error::{BlobError, BlobResult};
pub use filesystem::FilesystemBlobStore;
pub use memory::InMemoryBlobStore;
pub use naming::{FilenameGenerator, GeneratedName};
pub use policy::UploadPolicy;
pub use traits::{BlobStore, StoredBlob};

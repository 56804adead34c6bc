//! Brix Storage Library
//!
//! Storage abstraction for project documents: the `DocumentStorage` trait
//! plus local filesystem and cloud (Cloudinary-style) implementations.
//!
//! # Addressing
//!
//! The delivery URL returned by `store_file`/`store_image` is the only
//! persisted address of an object. Both backends therefore re-derive their
//! native key (filesystem path, or `{folder, public_id, resource_type}`)
//! from that URL when deleting or signing. Changing the URL shape breaks
//! deletion and signing for previously stored rows; see DESIGN.md.

pub mod cloudinary;
pub mod factory;
pub(crate) mod filename;
pub mod local;
pub mod traits;

// Re-export commonly used types
pub use brix_core::StorageStrategy;
pub use cloudinary::CloudinaryStorage;
pub use factory::create_storage;
pub use local::LocalStorage;
pub use traits::{DocumentStorage, StorageError, StorageResult};

//! soundcheck storage library
//!
//! Blob store abstraction and its implementations (S3-compatible object
//! stores and the local filesystem).
//!
//! # Object addressing
//!
//! Objects are addressed by `(bucket, key)` exactly as upload notifications
//! name them. Keys must not contain `..` segments or a leading `/`; validation
//! is centralized in the `keys` module so all backends agree.

pub mod factory;
pub(crate) mod keys;
#[cfg(feature = "storage-local")]
pub mod local;
#[cfg(feature = "storage-s3")]
pub mod s3;
pub mod traits;

// Re-export commonly used types
pub use factory::create_storage;
#[cfg(feature = "storage-local")]
pub use local::LocalStorage;
#[cfg(feature = "storage-s3")]
pub use s3::S3Storage;
pub use soundcheck_core::StorageBackend;
pub use traits::{Storage, StorageError, StorageResult};

//! Shared bucket/key validation for storage backends.

use crate::{StorageError, StorageResult};

/// Reject bucket names and object keys that could escape their namespace.
///
/// Both backends call this before touching the store so that local and S3
/// storage accept exactly the same set of addresses.
pub fn validate_object_address(bucket: &str, key: &str) -> StorageResult<()> {
    if bucket.is_empty() || bucket.contains('/') || bucket.contains("..") {
        return Err(StorageError::InvalidKey(format!(
            "Invalid bucket name: {:?}",
            bucket
        )));
    }

    if key.is_empty() || key.starts_with('/') || key.split('/').any(|segment| segment == "..") {
        return Err(StorageError::InvalidKey(
            "Storage key contains invalid characters".to_string(),
        ));
    }

    Ok(())
}

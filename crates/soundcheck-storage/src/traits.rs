//! Storage abstraction trait
//!
//! This module defines the Storage trait that all blob store backends implement.

use crate::StorageBackend;
use async_trait::async_trait;
use soundcheck_core::AppError;
use thiserror::Error;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Download failed: {0}")]
    DownloadFailed(String),

    #[error("File not found: {0}")]
    NotFound(String),

    #[error("Access denied: {0}")]
    AccessDenied(String),

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl StorageError {
    /// Whether the same request may succeed if tried again.
    pub fn is_transient(&self) -> bool {
        match self {
            StorageError::DownloadFailed(_) => true,
            StorageError::NotFound(_)
            | StorageError::AccessDenied(_)
            | StorageError::InvalidKey(_)
            | StorageError::ConfigError(_) => false,
        }
    }
}

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        AppError::Storage(err.to_string())
    }
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Storage abstraction trait
///
/// Objects are addressed the way the upload notification names them: a bucket
/// plus the object path inside it.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Download an object's bytes
    async fn download(&self, bucket: &str, key: &str) -> StorageResult<Vec<u8>>;

    /// Get the storage backend type
    fn backend_type(&self) -> StorageBackend;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transient_classification() {
        assert!(StorageError::DownloadFailed("reset".into()).is_transient());

        assert!(!StorageError::NotFound("content/a.mp3".into()).is_transient());
        assert!(!StorageError::InvalidKey("../x".into()).is_transient());
        assert!(!StorageError::AccessDenied("products/content/a.mp3".into()).is_transient());
    }

    #[test]
    fn converts_into_storage_app_error() {
        let err: AppError = StorageError::NotFound("products/content/a.mp3".into()).into();
        assert_eq!(
            err.to_string(),
            "Storage error: File not found: products/content/a.mp3"
        );
    }
}

use crate::keys::validate_object_address;
use crate::traits::{Storage, StorageError, StorageResult};
use crate::StorageBackend;
use async_trait::async_trait;
use std::io;
use std::path::PathBuf;
use tokio::fs;

/// Local filesystem storage implementation
///
/// Objects live at `{base_path}/{bucket}/{key}`, mirroring the bucket layout of
/// the hosted store so fixtures can be dropped in by hand during development.
#[derive(Clone)]
pub struct LocalStorage {
    base_path: PathBuf,
}

impl LocalStorage {
    /// Create a new LocalStorage instance rooted at `base_path`
    pub async fn new(base_path: impl Into<PathBuf>) -> StorageResult<Self> {
        let base_path = base_path.into();

        fs::create_dir_all(&base_path).await.map_err(|e| {
            StorageError::ConfigError(format!(
                "Failed to create storage directory {}: {}",
                base_path.display(),
                e
            ))
        })?;

        Ok(LocalStorage { base_path })
    }

    /// Convert bucket and key to a filesystem path with security validation
    fn object_path(&self, bucket: &str, key: &str) -> StorageResult<PathBuf> {
        validate_object_address(bucket, key)?;

        let path = self.base_path.join(bucket).join(key);

        let base_canonical = self.base_path.canonicalize().map_err(|e| {
            StorageError::ConfigError(format!("Failed to canonicalize base path: {}", e))
        })?;

        // Symlinks inside the tree must not point outside of it
        if let Ok(canonical) = path.canonicalize() {
            if canonical.strip_prefix(&base_canonical).is_err() {
                return Err(StorageError::InvalidKey(
                    "Storage key resolves outside storage directory".to_string(),
                ));
            }
        }

        Ok(path)
    }
}

/// Map a filesystem error on an object path to its storage meaning
fn read_error(err: io::Error, bucket: &str, key: &str) -> StorageError {
    let address = format!("{}/{}", bucket, key);
    match err.kind() {
        io::ErrorKind::NotFound => StorageError::NotFound(address),
        io::ErrorKind::PermissionDenied => StorageError::AccessDenied(address),
        _ => StorageError::DownloadFailed(format!("Failed to read {}: {}", address, err)),
    }
}

#[async_trait]
impl Storage for LocalStorage {
    async fn download(&self, bucket: &str, key: &str) -> StorageResult<Vec<u8>> {
        let path = self.object_path(bucket, key)?;
        let start = std::time::Instant::now();

        let meta = fs::metadata(&path)
            .await
            .map_err(|e| read_error(e, bucket, key))?;
        // a directory is a folder prefix, not an object
        if !meta.is_file() {
            return Err(StorageError::NotFound(format!("{}/{}", bucket, key)));
        }

        let data = fs::read(&path)
            .await
            .map_err(|e| read_error(e, bucket, key))?;

        tracing::info!(
            path = %path.display(),
            bucket = %bucket,
            key = %key,
            size_bytes = data.len(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Local storage download successful"
        );

        Ok(data)
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Local
    }
}

#[cfg(all(test, feature = "storage-local"))]
mod tests {
    use super::*;
    use tempfile::tempdir;

    async fn put(dir: &std::path::Path, bucket: &str, key: &str, data: &[u8]) {
        let path = dir.join(bucket).join(key);
        fs::create_dir_all(path.parent().unwrap()).await.unwrap();
        fs::write(path, data).await.unwrap();
    }

    #[tokio::test]
    async fn test_local_storage_download() {
        let dir = tempdir().unwrap();
        let storage = LocalStorage::new(dir.path()).await.unwrap();

        put(dir.path(), "products", "content/u1/track.mp3", b"ID3 bytes").await;

        let downloaded = storage
            .download("products", "content/u1/track.mp3")
            .await
            .unwrap();
        assert_eq!(downloaded, b"ID3 bytes");
        assert_eq!(storage.backend_type(), StorageBackend::Local);
    }

    #[tokio::test]
    async fn test_missing_object_is_not_found() {
        let dir = tempdir().unwrap();
        let storage = LocalStorage::new(dir.path()).await.unwrap();

        let result = storage.download("products", "content/missing.mp3").await;
        assert!(matches!(result, Err(StorageError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_path_traversal_rejected() {
        let dir = tempdir().unwrap();
        let storage = LocalStorage::new(dir.path()).await.unwrap();

        let result = storage.download("products", "../../../etc/passwd").await;
        assert!(matches!(result, Err(StorageError::InvalidKey(_))));

        let result = storage.download("products", "/etc/passwd").await;
        assert!(matches!(result, Err(StorageError::InvalidKey(_))));
    }

    #[tokio::test]
    async fn test_directory_at_key_is_not_found() {
        let dir = tempdir().unwrap();
        let storage = LocalStorage::new(dir.path()).await.unwrap();

        fs::create_dir_all(dir.path().join("products/content/u1/album.mp3"))
            .await
            .unwrap();

        let err = storage
            .download("products", "content/u1/album.mp3")
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::NotFound(_)));
        assert!(!err.is_transient());
    }

    #[test]
    fn test_read_errors_keep_their_meaning() {
        let err = read_error(io::ErrorKind::PermissionDenied.into(), "products", "content/a.mp3");
        assert!(matches!(err, StorageError::AccessDenied(ref a) if a == "products/content/a.mp3"));
        assert!(!err.is_transient());

        let err = read_error(io::ErrorKind::NotFound.into(), "products", "content/a.mp3");
        assert!(matches!(err, StorageError::NotFound(_)));
        assert!(!err.is_transient());

        let err = read_error(io::ErrorKind::Interrupted.into(), "products", "content/a.mp3");
        assert!(matches!(err, StorageError::DownloadFailed(_)));
        assert!(err.is_transient());
    }
}

use crate::keys::validate_object_address;
use crate::traits::{Storage, StorageError, StorageResult};
use crate::StorageBackend;
use async_trait::async_trait;
use object_store::aws::{AmazonS3, AmazonS3Builder};
use object_store::path::Path;
use object_store::Error as ObjectStoreError;
use object_store::{ObjectStoreExt, Result as ObjectResult};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// S3-compatible storage implementation
///
/// Notifications name the bucket per object, so one client is built lazily per
/// bucket and cached for the life of the process.
#[derive(Clone)]
pub struct S3Storage {
    region: String,
    endpoint_url: Option<String>, // Custom endpoint for S3-compatible providers
    stores: Arc<RwLock<HashMap<String, AmazonS3>>>,
}

impl S3Storage {
    /// Create a new S3Storage instance
    ///
    /// # Arguments
    /// * `region` - AWS region (or region identifier for S3-compatible providers)
    /// * `endpoint_url` - Optional custom endpoint URL for S3-compatible providers
    ///   (e.g., "http://localhost:9000" for MinIO, or a hosted backend's S3 gateway)
    pub fn new(region: String, endpoint_url: Option<String>) -> Self {
        S3Storage {
            region,
            endpoint_url,
            stores: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    fn build_store(&self, bucket: &str) -> StorageResult<AmazonS3> {
        // Credentials come from AWS_ACCESS_KEY_ID / AWS_SECRET_ACCESS_KEY
        let mut builder = AmazonS3Builder::from_env()
            .with_region(self.region.clone())
            .with_bucket_name(bucket.to_string());

        if let Some(ref endpoint) = self.endpoint_url {
            let allow_http = endpoint.starts_with("http://");
            builder = builder
                .with_endpoint(endpoint.clone())
                .with_allow_http(allow_http);
        }

        builder
            .build()
            .map_err(|e| StorageError::ConfigError(e.to_string()))
    }

    async fn store_for(&self, bucket: &str) -> StorageResult<AmazonS3> {
        if let Some(store) = self.stores.read().await.get(bucket) {
            return Ok(store.clone());
        }

        let mut stores = self.stores.write().await;
        if let Some(store) = stores.get(bucket) {
            return Ok(store.clone());
        }

        let store = self.build_store(bucket)?;
        stores.insert(bucket.to_string(), store.clone());
        tracing::debug!(bucket = %bucket, region = %self.region, "S3 client created");
        Ok(store)
    }
}

/// Map a failed GET to its storage meaning; only `DownloadFailed` is retried
fn get_error(err: ObjectStoreError, bucket: &str, key: &str) -> StorageError {
    let address = format!("{}/{}", bucket, key);
    match err {
        ObjectStoreError::NotFound { .. } => StorageError::NotFound(address),
        ObjectStoreError::PermissionDenied { .. } | ObjectStoreError::Unauthenticated { .. } => {
            StorageError::AccessDenied(format!("{}: {}", address, err))
        }
        other => StorageError::DownloadFailed(other.to_string()),
    }
}

#[async_trait]
impl Storage for S3Storage {
    async fn download(&self, bucket: &str, key: &str) -> StorageResult<Vec<u8>> {
        validate_object_address(bucket, key)?;
        let store = self.store_for(bucket).await?;

        let start = std::time::Instant::now();
        let location = Path::from(key.to_string());

        let result: ObjectResult<_> = store.get(&location).await;

        let result = result.map_err(|e| {
            let err = get_error(e, bucket, key);
            if !matches!(err, StorageError::NotFound(_)) {
                tracing::error!(
                    error = %err,
                    bucket = %bucket,
                    key = %key,
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "S3 download failed"
                );
            }
            err
        })?;

        let bytes = result
            .bytes()
            .await
            .map_err(|e| StorageError::DownloadFailed(e.to_string()))?;

        tracing::info!(
            bucket = %bucket,
            key = %key,
            size_bytes = bytes.len(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "S3 download successful"
        );

        Ok(bytes.to_vec())
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::S3
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn rejects_invalid_keys_before_any_request() {
        let storage = S3Storage::new("us-east-1".to_string(), None);

        let result = storage.download("products", "../secrets").await;
        assert!(matches!(result, Err(StorageError::InvalidKey(_))));
        assert!(storage.stores.read().await.is_empty());
    }

    #[tokio::test]
    async fn caches_one_client_per_bucket() {
        let storage = S3Storage::new(
            "us-east-1".to_string(),
            Some("http://localhost:9000".to_string()),
        );

        storage.store_for("products").await.unwrap();
        storage.store_for("products").await.unwrap();
        storage.store_for("covers").await.unwrap();

        assert_eq!(storage.stores.read().await.len(), 2);
    }

    #[test]
    fn auth_failures_are_not_retried() {
        let denied = ObjectStoreError::PermissionDenied {
            path: "content/a.mp3".to_string(),
            source: "403 Forbidden".into(),
        };
        let err = get_error(denied, "products", "content/a.mp3");
        assert!(matches!(err, StorageError::AccessDenied(_)));
        assert!(!err.is_transient());

        let unauthenticated = ObjectStoreError::Unauthenticated {
            path: "content/a.mp3".to_string(),
            source: "401 Unauthorized".into(),
        };
        assert!(!get_error(unauthenticated, "products", "content/a.mp3").is_transient());

        let missing = ObjectStoreError::NotFound {
            path: "content/a.mp3".to_string(),
            source: "404".into(),
        };
        assert!(matches!(
            get_error(missing, "products", "content/a.mp3"),
            StorageError::NotFound(ref a) if a == "products/content/a.mp3"
        ));

        let flaky = ObjectStoreError::Generic {
            store: "S3",
            source: "connection reset".into(),
        };
        assert!(get_error(flaky, "products", "content/a.mp3").is_transient());
    }
}

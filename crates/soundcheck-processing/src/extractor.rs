//! Extraction pipeline: storage notification in, catalog update out
//!
//! Steps run strictly in order and each gate short-circuits:
//! prefix filter, catalog lookup, product kind filter, download, parse, update.
//! Nothing is written unless every earlier step succeeded.

use crate::metadata::ExtractedAudio;
use crate::retry::{retry_with_backoff, RetryPolicy};
use crate::traits::MediaProcessor;
use soundcheck_core::models::{
    CatalogItem, ExtractionOutcome, SkipReason, StorageObject, TriggerEvent,
};
use soundcheck_core::{AppError, Config};
use soundcheck_db::{CatalogError, CatalogStore};
use soundcheck_storage::{Storage, StorageError};
use std::sync::Arc;

pub const DEFAULT_CONTENT_PREFIX: &str = "content/";

#[derive(Debug, Clone)]
pub struct ExtractorSettings {
    /// Only object names starting with this prefix are processed
    pub content_prefix: String,
    pub retry: RetryPolicy,
}

impl Default for ExtractorSettings {
    fn default() -> Self {
        Self {
            content_prefix: DEFAULT_CONTENT_PREFIX.to_string(),
            retry: RetryPolicy::default(),
        }
    }
}

impl ExtractorSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            content_prefix: config.content_prefix().to_string(),
            retry: RetryPolicy::from_config(config),
        }
    }
}

pub struct MetadataExtractor {
    catalog: Arc<dyn CatalogStore>,
    storage: Arc<dyn Storage>,
    processor: Arc<dyn MediaProcessor<Metadata = ExtractedAudio>>,
    settings: ExtractorSettings,
}

impl MetadataExtractor {
    pub fn new(
        catalog: Arc<dyn CatalogStore>,
        storage: Arc<dyn Storage>,
        processor: Arc<dyn MediaProcessor<Metadata = ExtractedAudio>>,
        settings: ExtractorSettings,
    ) -> Self {
        Self {
            catalog,
            storage,
            processor,
            settings,
        }
    }

    /// Entry point for a decoded trigger payload
    pub async fn handle(&self, event: TriggerEvent) -> Result<ExtractionOutcome, AppError> {
        match event {
            TriggerEvent::StorageInsert(object) => self.process(&object).await,
            TriggerEvent::Other => {
                tracing::debug!("Ignoring payload that is not a storage insert");
                Ok(ExtractionOutcome::skipped(SkipReason::NotStorageInsert))
            }
        }
    }

    #[tracing::instrument(skip(self, object), fields(bucket = %object.bucket_id, key = %object.name))]
    pub async fn process(&self, object: &StorageObject) -> Result<ExtractionOutcome, AppError> {
        if !object.name.starts_with(&self.settings.content_prefix) {
            tracing::info!(
                content_prefix = %self.settings.content_prefix,
                "File skipped: not in content folder"
            );
            return Ok(ExtractionOutcome::skipped(SkipReason::NotContentFolder));
        }

        let item = self.resolve_item(object).await?;

        if !item.product_type.is_audio() {
            tracing::info!(
                product_id = %item.id,
                product_type = %item.product_type,
                "File skipped: product type is not audio"
            );
            return Ok(ExtractionOutcome::skipped(SkipReason::NotAudioProduct));
        }

        let data = self.download(object).await?;

        let extracted = self.processor.extract_metadata(&data).await?;
        let update = extracted.to_update();

        let catalog = self.catalog.as_ref();
        let update_ref = &update;
        retry_with_backoff(
            &self.settings.retry,
            "catalog_update",
            CatalogError::is_transient,
            || catalog.update_audio_metadata(item.id, update_ref),
        )
        .await?;

        tracing::info!(
            product_id = %item.id,
            duration_seconds = ?update.duration_seconds,
            bitrate = ?update.bitrate,
            codec = ?update.metadata.codec,
            "Product audio metadata updated"
        );

        Ok(ExtractionOutcome::Updated {
            product_id: item.id,
            update,
        })
    }

    /// Catalog row owning the object: by attached id when present, else by URL suffix
    async fn resolve_item(&self, object: &StorageObject) -> Result<CatalogItem, CatalogError> {
        let catalog = self.catalog.as_ref();
        let retry = &self.settings.retry;

        match object.product_id() {
            Some(id) => {
                tracing::debug!(product_id = %id, "Resolving product by attached id");
                retry_with_backoff(retry, "catalog_lookup", CatalogError::is_transient, || {
                    catalog.find_by_id(id)
                })
                .await
            }
            None => {
                let path = object.name.as_str();
                retry_with_backoff(retry, "catalog_lookup", CatalogError::is_transient, || {
                    catalog.find_by_file_url_suffix(path)
                })
                .await
            }
        }
    }

    async fn download(&self, object: &StorageObject) -> Result<Vec<u8>, StorageError> {
        let storage = self.storage.as_ref();
        let bucket = object.bucket_id.as_str();
        let key = object.name.as_str();

        retry_with_backoff(
            &self.settings.retry,
            "download",
            StorageError::is_transient,
            || storage.download(bucket, key),
        )
        .await
    }
}

//! Storage-insert notifications delivered by the database webhook.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One object row inserted into `storage.objects`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageObject {
    pub bucket_id: String,
    /// Object path inside the bucket, e.g. `content/u123/1700000000_track.mp3`
    pub name: String,
    /// Metadata the uploader attached to the object
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_metadata: Option<serde_json::Value>,
}

impl StorageObject {
    pub fn new(bucket_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            bucket_id: bucket_id.into(),
            name: name.into(),
            user_metadata: None,
        }
    }

    /// Catalog id attached at upload time (`product_id` or `productId`), if any.
    pub fn product_id(&self) -> Option<Uuid> {
        let metadata = self.user_metadata.as_ref()?.as_object()?;
        ["product_id", "productId"]
            .iter()
            .filter_map(|key| metadata.get(*key))
            .filter_map(|value| value.as_str())
            .find_map(|raw| Uuid::parse_str(raw.trim()).ok())
    }
}

#[derive(Debug, Deserialize)]
struct RawTrigger {
    #[serde(rename = "type")]
    kind: Option<String>,
    table: Option<String>,
    schema: Option<String>,
    record: Option<serde_json::Value>,
}

/// Validated trigger input.
#[derive(Debug, Clone, PartialEq)]
pub enum TriggerEvent {
    StorageInsert(StorageObject),
    /// Any payload that is not an insert into `storage.objects`
    Other,
}

impl TriggerEvent {
    pub fn from_json(value: serde_json::Value) -> Self {
        let Ok(raw) = serde_json::from_value::<RawTrigger>(value) else {
            return TriggerEvent::Other;
        };

        let is_storage_insert = raw.kind.as_deref() == Some("INSERT")
            && raw.table.as_deref() == Some("objects")
            && raw.schema.as_deref() == Some("storage");
        if !is_storage_insert {
            return TriggerEvent::Other;
        }

        raw.record
            .and_then(|record| serde_json::from_value::<StorageObject>(record).ok())
            .map(TriggerEvent::StorageInsert)
            .unwrap_or(TriggerEvent::Other)
    }
}

/// Why an invocation finished without touching the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    NotStorageInsert,
    NotContentFolder,
    NotAudioProduct,
}

impl SkipReason {
    pub fn message(&self) -> &'static str {
        match self {
            SkipReason::NotStorageInsert => "Not a storage insert event.",
            SkipReason::NotContentFolder => "File skipped: not in content folder.",
            SkipReason::NotAudioProduct => "File skipped: product type is not audio.",
        }
    }
}

pub const UPDATED_MESSAGE: &str = "File processed and product updated successfully.";

/// Terminal result of one successful invocation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ExtractionOutcome {
    Updated {
        product_id: Uuid,
        update: super::AudioMetadataUpdate,
    },
    Skipped {
        reason: SkipReason,
    },
}

impl ExtractionOutcome {
    pub fn skipped(reason: SkipReason) -> Self {
        ExtractionOutcome::Skipped { reason }
    }

    pub fn message(&self) -> &'static str {
        match self {
            ExtractionOutcome::Updated { .. } => UPDATED_MESSAGE,
            ExtractionOutcome::Skipped { reason } => reason.message(),
        }
    }
}

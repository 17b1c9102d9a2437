//! Core traits for media processing

use crate::metadata::ExtractionError;
use async_trait::async_trait;

/// Media processor trait - handles metadata extraction and validation
#[async_trait]
pub trait MediaProcessor: Send + Sync {
    type Metadata: Send + Sync;

    /// Extract metadata from media data
    async fn extract_metadata(&self, data: &[u8]) -> Result<Self::Metadata, ExtractionError>;

    /// Cheap sanity checks before a full parse
    fn validate(&self, data: &[u8]) -> Result<(), ExtractionError>;
}

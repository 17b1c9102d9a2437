//! Application state shared by all handlers

use soundcheck_db::CatalogStore;
use soundcheck_processing::MetadataExtractor;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub extractor: Arc<MetadataExtractor>,
    /// Used by the readiness check
    pub catalog: Arc<dyn CatalogStore>,
    /// Bearer secret required on webhook deliveries, if configured
    pub webhook_secret: Option<String>,
}

impl AppState {
    pub fn new(
        extractor: Arc<MetadataExtractor>,
        catalog: Arc<dyn CatalogStore>,
        webhook_secret: Option<String>,
    ) -> Self {
        Self {
            extractor,
            catalog,
            webhook_secret,
        }
    }
}

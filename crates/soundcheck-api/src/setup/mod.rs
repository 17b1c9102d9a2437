//! Application setup and initialization

pub mod database;
pub mod routes;
pub mod server;
pub mod storage;

use crate::state::AppState;
use anyhow::{Context, Result};
use soundcheck_core::Config;
use soundcheck_db::{CatalogRepository, CatalogStore};
use soundcheck_processing::{AudioProcessor, ExtractorSettings, MetadataExtractor};
use std::sync::Arc;

/// Initialize the entire application
pub async fn initialize_app(config: Config) -> Result<(Arc<AppState>, axum::Router)> {
    crate::telemetry::init_telemetry(config.environment())?;

    // Fail fast on misconfiguration
    config
        .validate()
        .context("Configuration validation failed")?;
    tracing::info!("Configuration loaded and validated successfully");

    let pool = database::setup_database(&config).await?;
    let storage = storage::setup_storage(&config).await?;

    let catalog: Arc<dyn CatalogStore> = Arc::new(CatalogRepository::new(pool));
    let extractor = Arc::new(MetadataExtractor::new(
        catalog.clone(),
        storage,
        Arc::new(AudioProcessor::new()),
        ExtractorSettings::from_config(&config),
    ));

    let state = Arc::new(AppState::new(
        extractor,
        catalog,
        config.webhook_secret().map(String::from),
    ));

    let router = routes::setup_routes(&config, state.clone())?;

    Ok((state, router))
}

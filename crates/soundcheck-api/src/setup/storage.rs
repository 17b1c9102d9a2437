//! Storage setup and initialization

use anyhow::{Context, Result};
use soundcheck_core::Config;
use soundcheck_storage::{create_storage, Storage};
use std::sync::Arc;

/// Setup the blob store backend named by `STORAGE_BACKEND`
pub async fn setup_storage(config: &Config) -> Result<Arc<dyn Storage>> {
    let storage = create_storage(config)
        .await
        .context("Failed to initialize storage backend")?;

    tracing::info!(backend = %storage.backend_type(), "Storage backend initialized");

    Ok(storage)
}

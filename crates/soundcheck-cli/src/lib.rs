use anyhow::Context;
use serde::Serialize;
use soundcheck_core::models::AudioMetadataUpdate;
use soundcheck_core::Config;
use soundcheck_db::{CatalogRepository, CatalogStore};
use soundcheck_processing::{AudioProcessor, ExtractorSettings, MediaProcessor, MetadataExtractor};
use soundcheck_storage::create_storage;
use sqlx::postgres::PgPoolOptions;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

/// Initialize tracing for CLI binaries.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
}

pub fn print_json(value: &impl Serialize) -> anyhow::Result<()> {
    let out = serde_json::to_string_pretty(value).context("Serialize output")?;
    println!("{}", out);
    Ok(())
}

/// Parse a local audio file into the catalog update it would produce
pub async fn inspect_file(path: &Path) -> anyhow::Result<AudioMetadataUpdate> {
    let data = tokio::fs::read(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;

    let extracted = AudioProcessor::new()
        .extract_metadata(&data)
        .await
        .with_context(|| format!("Failed to extract metadata from {}", path.display()))?;

    Ok(extracted.to_update())
}

/// Pipeline wired exactly like the service: Postgres catalog and the configured blob store
pub async fn build_extractor(config: &Config) -> anyhow::Result<MetadataExtractor> {
    config
        .validate()
        .context("Configuration validation failed")?;

    let pool = PgPoolOptions::new()
        .max_connections(1)
        .acquire_timeout(Duration::from_secs(config.db_timeout_seconds()))
        .connect(config.database_url())
        .await
        .context("Failed to connect to database")?;

    let storage = create_storage(config)
        .await
        .context("Failed to initialize storage backend")?;
    let catalog: Arc<dyn CatalogStore> = Arc::new(CatalogRepository::new(pool));

    Ok(MetadataExtractor::new(
        catalog,
        storage,
        Arc::new(AudioProcessor::new()),
        ExtractorSettings::from_config(config),
    ))
}

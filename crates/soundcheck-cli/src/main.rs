//! soundcheck CLI: operator tools for the metadata extractor.
//!
//! Reads the same environment as the service (`DATABASE_URL`, `STORAGE_BACKEND`, ...).

use anyhow::Context;
use clap::{Parser, Subcommand};
use soundcheck_cli::{build_extractor, init_tracing, inspect_file, print_json};
use soundcheck_core::models::StorageObject;
use soundcheck_core::Config;

#[derive(Parser)]
#[command(name = "soundcheck", about = "Audio metadata extractor tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the extraction pipeline for an object already in storage
    Reprocess {
        /// Bucket holding the object
        #[arg(long)]
        bucket: String,
        /// Object path inside the bucket, e.g. content/u123/1700000000_track.mp3
        #[arg(long)]
        path: String,
    },
    /// Parse a local audio file and print the catalog update it would produce
    Inspect {
        /// Path to the audio file
        file: std::path::PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let cli = Cli::parse();

    match cli.command {
        Commands::Reprocess { bucket, path } => {
            let config = Config::from_env().context("Failed to load configuration")?;
            let extractor = build_extractor(&config).await?;

            let object = StorageObject::new(bucket, path);
            let outcome = extractor
                .process(&object)
                .await
                .with_context(|| format!("Failed to process {}/{}", object.bucket_id, object.name))?;

            print_json(&serde_json::json!({
                "message": outcome.message(),
                "outcome": outcome,
            }))?;
        }
        Commands::Inspect { file } => {
            let update = inspect_file(&file).await?;
            print_json(&update)?;
        }
    }

    Ok(())
}

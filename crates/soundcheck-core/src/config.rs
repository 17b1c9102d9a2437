//! Configuration module
//!
//! Configuration is read from environment variables (optionally seeded from a
//! `.env` file) into `BaseConfig` plus the extractor-specific settings, then
//! wrapped in `Config` which the rest of the workspace reads through getters.

use std::env;
use std::time::Duration;

use crate::storage_types::StorageBackend;

// Common constants
const SERVER_PORT: u16 = 4000;
const MAX_CONNECTIONS: u32 = 10;
const CONNECTION_TIMEOUT_SECS: u64 = 30;
const REQUEST_TIMEOUT_SECS: u64 = 60;
const CONTENT_PREFIX: &str = "content/";
const RETRY_MAX_ATTEMPTS: u32 = 3;
const RETRY_BASE_DELAY_MS: u64 = 200;
const RETRY_MAX_DELAY_MS: u64 = 5_000;
const MIN_WEBHOOK_SECRET_LEN: usize = 16;

/// Base configuration shared by the service and the CLI
#[derive(Clone, Debug)]
pub struct BaseConfig {
    pub server_port: u16,
    pub cors_origins: Vec<String>,
    pub request_timeout_seconds: u64,
    pub db_max_connections: u32,
    pub db_timeout_seconds: u64,
    pub environment: String,
}

/// Metadata extractor configuration
#[derive(Clone, Debug)]
pub struct ExtractorConfig {
    pub base: BaseConfig,
    pub database_url: String,
    pub run_migrations: bool,
    // Storage configuration
    pub storage_backend: Option<StorageBackend>,
    pub s3_region: Option<String>,
    pub s3_endpoint: Option<String>,
    pub aws_region: Option<String>,
    pub local_storage_path: Option<String>,
    // Pipeline
    pub content_prefix: String,
    pub retry_max_attempts: u32,
    pub retry_base_delay_ms: u64,
    pub retry_max_delay_ms: u64,
    /// Shared secret expected as `Authorization: Bearer <secret>` on webhook calls
    pub webhook_secret: Option<String>,
}

/// Application configuration.
#[derive(Clone, Debug)]
pub struct Config(pub Box<ExtractorConfig>);

impl Config {
    fn as_extractor(&self) -> &ExtractorConfig {
        &self.0
    }

    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();
        Self::from_source(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup (the environment in production).
    pub fn from_source<F>(lookup: F) -> Result<Self, anyhow::Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let config = ExtractorConfig::from_source(lookup)?;
        Ok(Config(Box::new(config)))
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        self.as_extractor().validate()
    }

    pub fn server_port(&self) -> u16 {
        self.as_extractor().base.server_port
    }

    pub fn cors_origins(&self) -> &[String] {
        &self.as_extractor().base.cors_origins
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.as_extractor().base.request_timeout_seconds)
    }

    pub fn db_max_connections(&self) -> u32 {
        self.as_extractor().base.db_max_connections
    }

    pub fn db_timeout_seconds(&self) -> u64 {
        self.as_extractor().base.db_timeout_seconds
    }

    pub fn environment(&self) -> &str {
        &self.as_extractor().base.environment
    }

    pub fn database_url(&self) -> &str {
        &self.as_extractor().database_url
    }

    pub fn run_migrations(&self) -> bool {
        self.as_extractor().run_migrations
    }

    pub fn storage_backend(&self) -> Option<StorageBackend> {
        self.as_extractor().storage_backend
    }

    pub fn s3_region(&self) -> Option<&str> {
        self.as_extractor().s3_region.as_deref()
    }

    pub fn s3_endpoint(&self) -> Option<&str> {
        self.as_extractor().s3_endpoint.as_deref()
    }

    pub fn aws_region(&self) -> Option<&str> {
        self.as_extractor().aws_region.as_deref()
    }

    pub fn local_storage_path(&self) -> Option<&str> {
        self.as_extractor().local_storage_path.as_deref()
    }

    pub fn content_prefix(&self) -> &str {
        &self.as_extractor().content_prefix
    }

    pub fn retry_max_attempts(&self) -> u32 {
        self.as_extractor().retry_max_attempts
    }

    pub fn retry_base_delay(&self) -> Duration {
        Duration::from_millis(self.as_extractor().retry_base_delay_ms)
    }

    pub fn retry_max_delay(&self) -> Duration {
        Duration::from_millis(self.as_extractor().retry_max_delay_ms)
    }

    pub fn webhook_secret(&self) -> Option<&str> {
        self.as_extractor().webhook_secret.as_deref()
    }
}

fn parse_or<T, F>(lookup: &F, key: &str, default: T) -> T
where
    T: std::str::FromStr,
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(default)
}

fn parse_bool<F>(lookup: &F, key: &str, default: bool) -> bool
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .map(|s| matches!(s.trim().to_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(default)
}

impl ExtractorConfig {
    pub fn from_source<F>(lookup: F) -> Result<Self, anyhow::Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let environment = lookup("ENVIRONMENT")
            .or_else(|| lookup("APP_ENV"))
            .unwrap_or_else(|| "development".to_string());

        let cors_origins: Vec<String> = lookup("CORS_ORIGINS")
            .unwrap_or_else(|| "*".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let server_port = match lookup("PORT") {
            Some(port) => port
                .trim()
                .parse()
                .map_err(|_| anyhow::anyhow!("PORT must be a valid number"))?,
            None => SERVER_PORT,
        };

        let base = BaseConfig {
            server_port,
            cors_origins,
            request_timeout_seconds: parse_or(&lookup, "REQUEST_TIMEOUT_SECS", REQUEST_TIMEOUT_SECS)
                .max(1),
            db_max_connections: parse_or(&lookup, "DB_MAX_CONNECTIONS", MAX_CONNECTIONS),
            db_timeout_seconds: parse_or(&lookup, "DB_TIMEOUT_SECONDS", CONNECTION_TIMEOUT_SECS),
            environment,
        };

        let storage_backend = match lookup("STORAGE_BACKEND") {
            Some(value) => Some(value.parse::<StorageBackend>()?),
            None => None,
        };

        // matched with starts_with, so the folder boundary must be explicit
        let content_prefix = lookup("CONTENT_PREFIX")
            .map(|s| s.trim().trim_matches('/').to_string())
            .filter(|s| !s.is_empty())
            .map(|s| format!("{}/", s))
            .unwrap_or_else(|| CONTENT_PREFIX.to_string());

        Ok(ExtractorConfig {
            base,
            database_url: lookup("DATABASE_URL")
                .ok_or_else(|| anyhow::anyhow!("DATABASE_URL must be set"))?,
            run_migrations: parse_bool(&lookup, "RUN_MIGRATIONS", false),
            storage_backend,
            s3_region: lookup("S3_REGION"),
            s3_endpoint: lookup("S3_ENDPOINT"),
            aws_region: lookup("AWS_REGION"),
            local_storage_path: lookup("LOCAL_STORAGE_PATH"),
            content_prefix,
            retry_max_attempts: parse_or(&lookup, "RETRY_MAX_ATTEMPTS", RETRY_MAX_ATTEMPTS),
            retry_base_delay_ms: parse_or(&lookup, "RETRY_BASE_DELAY_MS", RETRY_BASE_DELAY_MS),
            retry_max_delay_ms: parse_or(&lookup, "RETRY_MAX_DELAY_MS", RETRY_MAX_DELAY_MS),
            webhook_secret: lookup("WEBHOOK_SECRET").filter(|s| !s.is_empty()),
        })
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if !self.database_url.starts_with("postgres://")
            && !self.database_url.starts_with("postgresql://")
        {
            return Err(anyhow::anyhow!(
                "DATABASE_URL must be a valid PostgreSQL connection string"
            ));
        }

        if self.retry_max_attempts == 0 {
            return Err(anyhow::anyhow!("RETRY_MAX_ATTEMPTS must be at least 1"));
        }

        if self.retry_base_delay_ms > self.retry_max_delay_ms {
            return Err(anyhow::anyhow!(
                "RETRY_BASE_DELAY_MS must not exceed RETRY_MAX_DELAY_MS"
            ));
        }

        if let Some(ref secret) = self.webhook_secret {
            if secret.len() < MIN_WEBHOOK_SECRET_LEN {
                return Err(anyhow::anyhow!(
                    "WEBHOOK_SECRET must be at least {} characters long",
                    MIN_WEBHOOK_SECRET_LEN
                ));
            }
        }

        match self.storage_backend.unwrap_or(StorageBackend::S3) {
            StorageBackend::S3 => {
                if self.s3_region.is_none() && self.aws_region.is_none() {
                    return Err(anyhow::anyhow!(
                        "S3_REGION or AWS_REGION must be set when using S3 storage backend"
                    ));
                }
            }
            StorageBackend::Local => {
                if self.local_storage_path.is_none() {
                    return Err(anyhow::anyhow!(
                        "LOCAL_STORAGE_PATH must be set when using local storage backend"
                    ));
                }
            }
        }

        Ok(())
    }
}

//! soundcheck core library
//!
//! Domain models, error types, and configuration shared by the storage,
//! catalog, processing, and HTTP crates.

pub mod config;
pub mod error;
pub mod models;
pub mod storage_types;

// Re-export commonly used types
pub use config::{BaseConfig, Config, ExtractorConfig};
pub use error::{AppError, ErrorMetadata, LogLevel};
pub use storage_types::StorageBackend;

//! soundcheck API library
//!
//! HTTP surface of the metadata extractor: the storage webhook endpoint, CORS,
//! health checks, and application setup.

pub mod auth;
pub mod constants;
pub mod error;
mod handlers;
pub mod setup;
pub mod state;
pub mod telemetry;

// Re-exports
pub use error::{ErrorResponse, HttpAppError};
pub use state::AppState;

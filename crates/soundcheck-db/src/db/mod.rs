//! Database repositories for data access layer
//!
//! The catalog is the only table this service touches. Rows are created and
//! deleted by the platform; the extractor reads them and writes audio fields.
//
// Catalog repository and the store trait the pipeline depends on
pub mod catalog;

pub use catalog::{CatalogError, CatalogRepository, CatalogResult, CatalogStore};

//! soundcheck database library
//!
//! Access to the catalog (`digital_products`) owned by the content platform.

pub mod db;

pub use db::{CatalogError, CatalogRepository, CatalogResult, CatalogStore};

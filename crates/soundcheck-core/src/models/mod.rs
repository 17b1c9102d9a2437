//! Domain models shared by every crate in the workspace.

pub mod catalog;
pub mod event;

pub use catalog::{AudioMetadataUpdate, AudioTagMetadata, CatalogItem, ProductType};
pub use event::{
    ExtractionOutcome, SkipReason, StorageObject, TriggerEvent, UPDATED_MESSAGE,
};

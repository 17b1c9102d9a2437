//! soundcheck processing library
//!
//! Audio metadata parsing, retry policy, and the extraction pipeline that ties
//! the catalog and blob store together.

pub mod extractor;
pub mod metadata;
pub mod retry;
pub mod traits;

#[cfg(feature = "audio")]
pub mod audio;

#[cfg(any(test, feature = "test-fixtures"))]
pub mod fixtures;

// Re-export commonly used types
pub use extractor::{ExtractorSettings, MetadataExtractor};
pub use metadata::{ExtractedAudio, ExtractionError};
pub use retry::{retry_with_backoff, RetryPolicy};
pub use traits::MediaProcessor;

#[cfg(feature = "audio")]
pub use audio::AudioProcessor;

//! Audio processing module

mod bitrate;
pub mod processor;

pub use processor::AudioProcessor;

// Re-export metadata types
pub use crate::metadata::ExtractedAudio;

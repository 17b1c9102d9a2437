//! Audio metadata types

use serde::{Deserialize, Serialize};
use soundcheck_core::models::{AudioMetadataUpdate, AudioTagMetadata};
use soundcheck_core::AppError;

#[derive(Debug, thiserror::Error)]
pub enum ExtractionError {
    #[error("Unsupported or unrecognized audio format: {0}")]
    UnsupportedFormat(String),

    #[error("Failed to parse audio file: {0}")]
    Parse(String),

    #[error("Metadata task failed: {0}")]
    Task(String),
}

impl From<ExtractionError> for AppError {
    fn from(err: ExtractionError) -> Self {
        AppError::MetadataExtraction(err.to_string())
    }
}

/// Audio properties and tags as read from the container, before rounding
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractedAudio {
    /// Zero when the container does not report a duration
    pub duration_secs: f64,
    pub bitrate_bps: Option<f64>,
    pub sample_rate: Option<u32>,
    pub codec: Option<String>,
    pub bpm: Option<f64>,
    pub key: Option<String>,
}

impl ExtractedAudio {
    /// Catalog write derived from the parsed values
    pub fn to_update(&self) -> AudioMetadataUpdate {
        AudioMetadataUpdate {
            duration_seconds: AudioMetadataUpdate::round_duration(self.duration_secs),
            bitrate: self
                .bitrate_bps
                .and_then(AudioMetadataUpdate::round_bitrate_kbps),
            metadata: AudioTagMetadata {
                bpm: self.bpm,
                key: self.key.clone(),
                codec: self.codec.clone(),
                sample_rate: self.sample_rate,
            },
        }
    }
}

/// Parse a BPM tag value. Accepts integers and decimals ("128", "93.5").
pub fn parse_bpm(raw: &str) -> Option<f64> {
    let value = raw.trim().parse::<f64>().ok()?;
    (value.is_finite() && value > 0.0).then_some(value)
}

/// Copy a text tag verbatim, treating blank values as absent
pub fn non_empty(raw: &str) -> Option<String> {
    (!raw.trim().is_empty()).then(|| raw.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_rounds_duration_and_bitrate() {
        let extracted = ExtractedAudio {
            duration_secs: 184.6,
            bitrate_bps: Some(320_499.0),
            sample_rate: Some(48_000),
            codec: Some("FLAC".to_string()),
            bpm: Some(93.5),
            key: Some("F#m".to_string()),
        };

        let update = extracted.to_update();
        assert_eq!(update.duration_seconds, Some(185));
        assert_eq!(update.bitrate, Some(320));
        assert_eq!(update.metadata.sample_rate, Some(48_000));
        assert_eq!(update.metadata.codec.as_deref(), Some("FLAC"));
        assert_eq!(update.metadata.bpm, Some(93.5));
        assert_eq!(update.metadata.key.as_deref(), Some("F#m"));
    }

    #[test]
    fn test_missing_values_stay_null() {
        let update = ExtractedAudio::default().to_update();
        assert_eq!(update.duration_seconds, None);
        assert_eq!(update.bitrate, None);

        let json = serde_json::to_value(&update.metadata).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"bpm": null, "key": null, "codec": null, "sampleRate": null})
        );
    }

    #[test]
    fn test_parse_bpm() {
        assert_eq!(parse_bpm("128"), Some(128.0));
        assert_eq!(parse_bpm(" 93.5 "), Some(93.5));
        assert_eq!(parse_bpm("fast"), None);
        assert_eq!(parse_bpm("0"), None);
        assert_eq!(non_empty("  "), None);
        assert_eq!(non_empty("Am"), Some("Am".to_string()));
    }

    #[test]
    fn test_converts_to_app_error() {
        let err: AppError = ExtractionError::UnsupportedFormat("no sync".into()).into();
        assert!(matches!(err, AppError::MetadataExtraction(_)));
    }
}

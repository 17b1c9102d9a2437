//! Audio processor - metadata extraction and validation

use super::bitrate::measured_bps;
use crate::metadata::{non_empty, parse_bpm, ExtractedAudio, ExtractionError};
use crate::traits::MediaProcessor;
use async_trait::async_trait;
use lofty::file::{AudioFile, FileType, TaggedFileExt};
use lofty::probe::Probe;
use lofty::tag::ItemKey;
use std::io::Cursor;

/// Smallest input worth probing (one MPEG frame header or a container magic)
const MIN_AUDIO_BYTES: usize = 4;

/// Reads container properties and tags with lofty. Input is never written to disk.
#[derive(Debug, Clone, Default)]
pub struct AudioProcessor;

impl AudioProcessor {
    pub fn new() -> Self {
        Self
    }

    /// Synchronous parse; run it on the blocking pool from async code
    pub fn parse(data: Vec<u8>) -> Result<ExtractedAudio, ExtractionError> {
        let detected = Probe::new(Cursor::new(data.as_slice()))
            .guess_file_type()
            .map_err(|e| ExtractionError::Parse(e.to_string()))?;

        if detected.file_type().is_none() {
            return Err(ExtractionError::UnsupportedFormat(
                "no known audio container signature".to_string(),
            ));
        }

        let tagged_file = detected
            .read()
            .map_err(|e| ExtractionError::Parse(e.to_string()))?;

        let properties = tagged_file.properties();
        // lofty reports truncated kbps; prefer a measured rate where the container allows it
        let bitrate_bps = measured_bps(tagged_file.file_type(), &data).or_else(|| {
            properties
                .audio_bitrate()
                .or_else(|| properties.overall_bitrate())
                .filter(|kbps| *kbps > 0)
                .map(|kbps| f64::from(kbps) * 1000.0)
        });

        let tag = tagged_file
            .primary_tag()
            .or_else(|| tagged_file.first_tag());

        let (bpm, key) = match tag {
            Some(tag) => {
                let bpm = tag
                    .get_string(&ItemKey::Bpm)
                    .or_else(|| tag.get_string(&ItemKey::IntegerBpm))
                    .and_then(parse_bpm);
                let key = tag.get_string(&ItemKey::InitialKey).and_then(non_empty);
                (bpm, key)
            }
            None => (None, None),
        };

        let extracted = ExtractedAudio {
            duration_secs: properties.duration().as_secs_f64(),
            bitrate_bps,
            sample_rate: properties.sample_rate().filter(|rate| *rate > 0),
            codec: Some(codec_name(tagged_file.file_type())),
            bpm,
            key,
        };

        tracing::debug!(
            codec = ?extracted.codec,
            duration_s = extracted.duration_secs,
            bitrate_bps = ?extracted.bitrate_bps,
            sample_rate = ?extracted.sample_rate,
            bpm = ?extracted.bpm,
            key = ?extracted.key,
            "Extracted audio metadata"
        );

        Ok(extracted)
    }
}

/// Display name for a container / codec family
fn codec_name(file_type: FileType) -> String {
    match file_type {
        FileType::Mpeg => "MP3",
        FileType::Flac => "FLAC",
        FileType::Aac => "AAC",
        FileType::Mp4 => "MP4",
        FileType::Vorbis => "Vorbis",
        FileType::Opus => "Opus",
        FileType::Speex => "Speex",
        FileType::Wav => "WAV",
        FileType::Aiff => "AIFF",
        FileType::Ape => "APE",
        FileType::WavPack => "WavPack",
        FileType::Mpc => "Musepack",
        other => return format!("{:?}", other),
    }
    .to_string()
}

#[async_trait]
impl MediaProcessor for AudioProcessor {
    type Metadata = ExtractedAudio;

    #[tracing::instrument(skip(self, data), fields(service = "audio", size_bytes = data.len()))]
    async fn extract_metadata(&self, data: &[u8]) -> Result<Self::Metadata, ExtractionError> {
        self.validate(data)?;

        let owned = data.to_vec();
        tokio::task::spawn_blocking(move || Self::parse(owned))
            .await
            .map_err(|e| ExtractionError::Task(e.to_string()))?
    }

    fn validate(&self, data: &[u8]) -> Result<(), ExtractionError> {
        if data.len() < MIN_AUDIO_BYTES {
            return Err(ExtractionError::UnsupportedFormat(
                "File too small to be a valid audio file".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{flac_stream, mp3_with_tags, mpeg_frames, xing_mp3};

    #[tokio::test]
    async fn test_extracts_properties_and_tags() {
        let data = mp3_with_tags(5, &[("TBPM", "128"), ("TKEY", "Am"), ("TIT2", "Track")]);

        let extracted = AudioProcessor::new().extract_metadata(&data).await.unwrap();
        let update = extracted.to_update();

        assert_eq!(update.duration_seconds, Some(5));
        assert_eq!(update.bitrate, Some(128));
        assert_eq!(update.metadata.codec.as_deref(), Some("MP3"));
        assert_eq!(update.metadata.sample_rate, Some(44_100));
        assert_eq!(update.metadata.bpm, Some(128.0));
        assert_eq!(update.metadata.key.as_deref(), Some("Am"));
    }

    #[tokio::test]
    async fn test_flac_bitrate_rounds_to_nearest_kbps() {
        // 900 560 bps: truncation would give 900
        let data = flac_stream(44_100, 44_100, 112_570);

        let update = AudioProcessor::new()
            .extract_metadata(&data)
            .await
            .unwrap()
            .to_update();

        assert_eq!(update.bitrate, Some(901));
        assert_eq!(update.duration_seconds, Some(1));
        assert_eq!(update.metadata.codec.as_deref(), Some("FLAC"));
        assert_eq!(update.metadata.sample_rate, Some(44_100));
    }

    #[tokio::test]
    async fn test_vbr_mp3_bitrate_uses_exact_duration() {
        // 192 frames of 1152 samples at 44.1 kHz; about 128.45 kbps
        let data = xing_mp3(192, 80_531);

        let update = AudioProcessor::new()
            .extract_metadata(&data)
            .await
            .unwrap()
            .to_update();

        assert_eq!(update.bitrate, Some(128));
        assert_eq!(update.duration_seconds, Some(5));
        assert_eq!(update.metadata.codec.as_deref(), Some("MP3"));
    }

    #[tokio::test]
    async fn test_missing_tags_are_none() {
        let data = mpeg_frames(3);

        let extracted = AudioProcessor::new().extract_metadata(&data).await.unwrap();

        assert_eq!(extracted.codec.as_deref(), Some("MP3"));
        assert_eq!(extracted.bpm, None);
        assert_eq!(extracted.key, None);
        assert!(extracted.duration_secs > 0.0);
    }

    #[tokio::test]
    async fn test_rejects_non_audio() {
        let processor = AudioProcessor::new();

        let result = processor
            .extract_metadata(b"%PDF-1.7 definitely not audio")
            .await;
        assert!(result.is_err());

        assert!(matches!(
            processor.validate(b"ID"),
            Err(ExtractionError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn test_codec_names() {
        assert_eq!(codec_name(FileType::Flac), "FLAC");
        assert_eq!(codec_name(FileType::Mpc), "Musepack");
        assert_eq!(codec_name(FileType::Mp4), "MP4");
    }
}

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};
use uuid::Uuid;

/// Kind of a sellable catalog item (`digital_products.product_type`).
///
/// Values the extractor does not care about are kept verbatim in `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ProductType {
    Music,
    Beat,
    SamplePack,
    Stems,
    Audiobook,
    Podcast,
    Other(String),
}

impl ProductType {
    /// Product kinds whose primary file is an audio container.
    pub fn is_audio(&self) -> bool {
        !matches!(self, ProductType::Other(_))
    }

    pub fn as_str(&self) -> &str {
        match self {
            ProductType::Music => "music",
            ProductType::Beat => "beat",
            ProductType::SamplePack => "sample_pack",
            ProductType::Stems => "stems",
            ProductType::Audiobook => "audiobook",
            ProductType::Podcast => "podcast",
            ProductType::Other(raw) => raw,
        }
    }
}

impl From<&str> for ProductType {
    fn from(raw: &str) -> Self {
        let normalized: String = raw
            .trim()
            .to_lowercase()
            .chars()
            .map(|c| if c == '-' || c == ' ' { '_' } else { c })
            .collect();

        match normalized.as_str() {
            "music" => ProductType::Music,
            "beat" => ProductType::Beat,
            "sample_pack" => ProductType::SamplePack,
            "stems" => ProductType::Stems,
            "audiobook" => ProductType::Audiobook,
            "podcast" => ProductType::Podcast,
            _ => ProductType::Other(raw.to_string()),
        }
    }
}

impl From<String> for ProductType {
    fn from(raw: String) -> Self {
        ProductType::from(raw.as_str())
    }
}

impl Display for ProductType {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

impl Serialize for ProductType {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ProductType {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(ProductType::from(raw))
    }
}

/// A row of the externally owned `digital_products` table, restricted to the
/// columns the extractor reads or writes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogItem {
    pub id: Uuid,
    pub product_type: ProductType,
    pub file_url: String,
    pub duration_seconds: Option<i32>,
    pub bitrate: Option<i32>,
    pub metadata: Option<serde_json::Value>,
}

/// Audio keys merged into `digital_products.metadata`.
///
/// Absent values are written as JSON `null` so a re-run clears stale tags.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AudioTagMetadata {
    pub bpm: Option<f64>,
    pub key: Option<String>,
    pub codec: Option<String>,
    pub sample_rate: Option<u32>,
}

/// The complete write applied to one catalog item.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AudioMetadataUpdate {
    pub duration_seconds: Option<i32>,
    /// Kilobits per second
    pub bitrate: Option<i32>,
    pub metadata: AudioTagMetadata,
}

impl AudioMetadataUpdate {
    /// Seconds rounded to the nearest whole second. Zero or non-finite
    /// durations mean the container did not report one.
    pub fn round_duration(seconds: f64) -> Option<i32> {
        if !seconds.is_finite() || seconds <= 0.0 {
            return None;
        }
        Some(seconds.round() as i32)
    }

    /// Bits per second to kilobits per second, rounded to the nearest kbps.
    pub fn round_bitrate_kbps(bits_per_second: f64) -> Option<i32> {
        if !bits_per_second.is_finite() || bits_per_second <= 0.0 {
            return None;
        }
        Some((bits_per_second / 1000.0).round() as i32)
    }
}

//! Test doubles and synthetic audio
//!
//! MP3 fixtures are a constant-bitrate MPEG-1 Layer III stream (128 kbps,
//! 44.1 kHz, stereo) optionally preceded by an ID3v2.3 tag with text frames.
//! `InMemoryCatalog` and `InMemoryStorage` stand in for Postgres and the blob
//! store and record every call.

use async_trait::async_trait;
use soundcheck_core::models::{AudioMetadataUpdate, CatalogItem, ProductType};
use soundcheck_core::StorageBackend;
use soundcheck_db::{CatalogError, CatalogResult, CatalogStore};
use soundcheck_storage::{Storage, StorageError, StorageResult};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use uuid::Uuid;

/// MPEG-1 Layer III, no CRC, 128 kbps, 44.1 kHz, no padding, stereo
pub const FRAME_HEADER: [u8; 4] = [0xFF, 0xFB, 0x90, 0x00];

/// `144 * 128000 / 44100` without padding
pub const FRAME_LEN: usize = 417;

pub const SAMPLES_PER_FRAME: u32 = 1152;
pub const SAMPLE_RATE: u32 = 44_100;

/// Bare MPEG stream lasting roughly `seconds`
pub fn mpeg_frames(seconds: u32) -> Vec<u8> {
    let frames = (seconds * SAMPLE_RATE).div_ceil(SAMPLES_PER_FRAME) as usize;
    let mut data = Vec::with_capacity(frames * FRAME_LEN);
    for _ in 0..frames {
        data.extend_from_slice(&FRAME_HEADER);
        data.resize(data.len() + FRAME_LEN - FRAME_HEADER.len(), 0);
    }
    data
}

/// ID3v2.3 tag holding the given text frames, e.g. `[("TBPM", "128")]`
pub fn id3v23_tag(frames: &[(&str, &str)]) -> Vec<u8> {
    let mut body = Vec::new();
    for (id, text) in frames {
        assert_eq!(id.len(), 4, "ID3v2 frame ids are four characters");
        body.extend_from_slice(id.as_bytes());
        // ISO-8859-1 encoding byte followed by the text
        body.extend_from_slice(&((text.len() + 1) as u32).to_be_bytes());
        body.extend_from_slice(&[0x00, 0x00]);
        body.push(0x00);
        body.extend_from_slice(text.as_bytes());
    }

    let mut tag = Vec::with_capacity(10 + body.len());
    tag.extend_from_slice(b"ID3");
    tag.extend_from_slice(&[0x03, 0x00, 0x00]);
    tag.extend_from_slice(&synchsafe(body.len() as u32));
    tag.extend_from_slice(&body);
    tag
}

/// Tagged MP3 of roughly `seconds`
pub fn mp3_with_tags(seconds: u32, frames: &[(&str, &str)]) -> Vec<u8> {
    let mut data = id3v23_tag(frames);
    data.extend_from_slice(&mpeg_frames(seconds));
    data
}

/// MPEG stream of `frames` frames whose first frame carries a Xing header
/// declaring `frames` and `stream_bytes`, as VBR encoders write it
pub fn xing_mp3(frames: u32, stream_bytes: u32) -> Vec<u8> {
    let mut data = Vec::with_capacity(frames as usize * FRAME_LEN);
    let mut first = FRAME_HEADER.to_vec();
    // MPEG-1 stereo side information
    first.resize(4 + 32, 0);
    first.extend_from_slice(b"Xing");
    first.extend_from_slice(&[0x00, 0x00, 0x00, 0x03]);
    first.extend_from_slice(&frames.to_be_bytes());
    first.extend_from_slice(&stream_bytes.to_be_bytes());
    first.resize(FRAME_LEN, 0);
    data.extend_from_slice(&first);

    for _ in 1..frames {
        data.extend_from_slice(&FRAME_HEADER);
        data.resize(data.len() + FRAME_LEN - FRAME_HEADER.len(), 0);
    }
    data
}

/// Minimal FLAC: STREAMINFO (16-bit stereo) followed by `audio_bytes` of frame data
pub fn flac_stream(sample_rate: u32, total_samples: u64, audio_bytes: usize) -> Vec<u8> {
    let mut data = b"fLaC".to_vec();
    // last block, STREAMINFO, 34 bytes
    data.extend_from_slice(&[0x80, 0x00, 0x00, 34]);
    data.extend_from_slice(&4096u16.to_be_bytes());
    data.extend_from_slice(&4096u16.to_be_bytes());
    data.extend_from_slice(&[0; 6]);
    let packed = (u64::from(sample_rate) << 44) | (1u64 << 41) | (15u64 << 36) | total_samples;
    data.extend_from_slice(&packed.to_be_bytes());
    data.extend_from_slice(&[0; 16]);
    data.resize(data.len() + audio_bytes, 0xA5);
    data
}

fn synchsafe(size: u32) -> [u8; 4] {
    [
        ((size >> 21) & 0x7F) as u8,
        ((size >> 14) & 0x7F) as u8,
        ((size >> 7) & 0x7F) as u8,
        (size & 0x7F) as u8,
    ]
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Catalog row pointing at `https://cdn.example.com/storage/v1/object/public/{bucket}/{path}`
pub fn catalog_item(product_type: &str, bucket: &str, path: &str) -> CatalogItem {
    CatalogItem {
        id: Uuid::new_v4(),
        product_type: ProductType::from(product_type),
        file_url: format!(
            "https://cdn.example.com/storage/v1/object/public/{}/{}",
            bucket, path
        ),
        duration_seconds: None,
        bitrate: None,
        metadata: None,
    }
}

/// Catalog held in memory; updates merge audio keys like the Postgres query does
#[derive(Default)]
pub struct InMemoryCatalog {
    items: Mutex<Vec<CatalogItem>>,
    lookups: AtomicUsize,
    updates: AtomicUsize,
    unavailable: AtomicBool,
}

impl InMemoryCatalog {
    pub fn new(items: Vec<CatalogItem>) -> Self {
        Self {
            items: Mutex::new(items),
            ..Default::default()
        }
    }

    pub fn item(&self, id: Uuid) -> Option<CatalogItem> {
        lock(&self.items).iter().find(|item| item.id == id).cloned()
    }

    pub fn remove(&self, id: Uuid) {
        lock(&self.items).retain(|item| item.id != id);
    }

    pub fn lookup_count(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }

    pub fn update_count(&self) -> usize {
        self.updates.load(Ordering::SeqCst)
    }

    /// Make `ping` fail, as if the database were unreachable
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }
}

#[async_trait]
impl CatalogStore for InMemoryCatalog {
    async fn find_by_file_url_suffix(&self, path: &str) -> CatalogResult<CatalogItem> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        let items = lock(&self.items);
        let matches: Vec<&CatalogItem> = items
            .iter()
            .filter(|item| item.file_url.ends_with(path))
            .take(2)
            .collect();

        match matches.as_slice() {
            [] => Err(CatalogError::NoMatch(path.to_string())),
            [item] => Ok((*item).clone()),
            many => Err(CatalogError::Ambiguous {
                path: path.to_string(),
                count: many.len(),
            }),
        }
    }

    async fn find_by_id(&self, id: Uuid) -> CatalogResult<CatalogItem> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        self.item(id)
            .ok_or_else(|| CatalogError::NoMatch(format!("product id {}", id)))
    }

    async fn update_audio_metadata(
        &self,
        id: Uuid,
        update: &AudioMetadataUpdate,
    ) -> CatalogResult<()> {
        let mut items = lock(&self.items);
        let item = items
            .iter_mut()
            .find(|item| item.id == id)
            .ok_or(CatalogError::RowMissing(id))?;

        item.duration_seconds = update.duration_seconds;
        item.bitrate = update.bitrate;

        let mut merged = match item.metadata.take() {
            Some(serde_json::Value::Object(map)) => map,
            _ => serde_json::Map::new(),
        };
        if let Ok(serde_json::Value::Object(audio)) = serde_json::to_value(&update.metadata) {
            merged.extend(audio);
        }
        item.metadata = Some(serde_json::Value::Object(merged));

        self.updates.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn ping(&self) -> CatalogResult<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(CatalogError::Database(sqlx::Error::PoolTimedOut));
        }
        Ok(())
    }
}

/// Blob store held in memory, with scripted failures served before real reads
#[derive(Default)]
pub struct InMemoryStorage {
    objects: Mutex<HashMap<(String, String), Vec<u8>>>,
    failures: Mutex<VecDeque<StorageError>>,
    downloads: AtomicUsize,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_object(self, bucket: &str, key: &str, data: Vec<u8>) -> Self {
        lock(&self.objects).insert((bucket.to_string(), key.to_string()), data);
        self
    }

    /// The next download calls fail with these errors, in order
    pub fn fail_next(&self, errors: impl IntoIterator<Item = StorageError>) {
        lock(&self.failures).extend(errors);
    }

    pub fn download_count(&self) -> usize {
        self.downloads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Storage for InMemoryStorage {
    async fn download(&self, bucket: &str, key: &str) -> StorageResult<Vec<u8>> {
        self.downloads.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = lock(&self.failures).pop_front() {
            return Err(err);
        }
        lock(&self.objects)
            .get(&(bucket.to_string(), key.to_string()))
            .cloned()
            .ok_or_else(|| StorageError::NotFound(format!("{}/{}", bucket, key)))
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Local
    }
}

//! Stream bitrate in bits per second, measured from the container
//!
//! lofty reports whole kbps divided by a millisecond duration and truncated.
//! FLAC (STREAMINFO sample count + audio bytes after the metadata blocks) and
//! MPEG Layer III with a Xing/Info header (frame and byte counts) carry enough
//! to compute the exact rate, so those are measured here. Everything else
//! falls back to lofty.

use lofty::file::FileType;

/// Exact audio bitrate for containers that allow measuring it
pub fn measured_bps(file_type: FileType, data: &[u8]) -> Option<f64> {
    let stream = data.get(id3v2_len(data)..)?;
    match file_type {
        FileType::Flac => flac_bps(stream),
        FileType::Mpeg => xing_bps(stream),
        _ => None,
    }
}

/// Bytes taken by a leading ID3v2 tag (0 when absent)
fn id3v2_len(data: &[u8]) -> usize {
    if data.len() < 10 || &data[..3] != b"ID3" {
        return 0;
    }
    let size = data[6..10]
        .iter()
        .fold(0usize, |acc, b| (acc << 7) | usize::from(b & 0x7F));
    let footer = if data[5] & 0x10 != 0 { 10 } else { 0 };
    10 + size + footer
}

fn bits_per_second(stream_bytes: u64, seconds: f64) -> Option<f64> {
    (stream_bytes > 0 && seconds > 0.0).then(|| stream_bytes as f64 * 8.0 / seconds)
}

fn flac_bps(data: &[u8]) -> Option<f64> {
    let mut rest = data.strip_prefix(b"fLaC")?;
    let mut stream_info = None;

    loop {
        let header = rest.get(..4)?;
        let len = u32::from_be_bytes([0, header[1], header[2], header[3]]) as usize;
        let body = rest.get(4..4 + len)?;
        if header[0] & 0x7F == 0 {
            stream_info = Some(body);
        }
        rest = &rest[4 + len..];
        if header[0] & 0x80 != 0 {
            break;
        }
    }

    // sample rate (20 bits) | channels - 1 (3) | bits per sample - 1 (5) | total samples (36)
    let packed = u64::from_be_bytes(stream_info?.get(10..18)?.try_into().ok()?);
    let sample_rate = packed >> 44;
    let total_samples = packed & 0xF_FFFF_FFFF;
    if sample_rate == 0 || total_samples == 0 {
        return None;
    }

    bits_per_second(rest.len() as u64, total_samples as f64 / sample_rate as f64)
}

fn xing_bps(data: &[u8]) -> Option<f64> {
    let start = data
        .windows(2)
        .position(|w| w[0] == 0xFF && w[1] & 0xE0 == 0xE0)?;
    let header = data.get(start..start + 4)?;

    let version = (header[1] >> 3) & 0x03;
    let layer = (header[1] >> 1) & 0x03;
    if layer != 0x01 || version == 0x01 {
        // Layer III only; version 01 is reserved
        return None;
    }
    let mpeg1 = version == 0x03;

    let base_rate = match (header[2] >> 2) & 0x03 {
        0 => 44_100,
        1 => 48_000,
        2 => 32_000,
        _ => return None,
    };
    let sample_rate = match version {
        0x03 => base_rate,
        0x02 => base_rate / 2,
        _ => base_rate / 4,
    };

    let mono = header[3] >> 6 == 0x03;
    let side_info = match (mpeg1, mono) {
        (true, false) => 32,
        (true, true) => 17,
        (false, false) => 17,
        (false, true) => 9,
    };
    let samples_per_frame = if mpeg1 { 1152 } else { 576 };

    let xing = data.get(start + 4 + side_info..start + 4 + side_info + 16)?;
    if &xing[..4] != b"Xing" && &xing[..4] != b"Info" {
        return None;
    }
    // frame and byte counts are both required
    if xing[7] & 0x03 != 0x03 {
        return None;
    }
    let frames = u32::from_be_bytes(xing[8..12].try_into().ok()?);
    let bytes = u32::from_be_bytes(xing[12..16].try_into().ok()?);

    let seconds = f64::from(frames) * f64::from(samples_per_frame) / f64::from(sample_rate);
    bits_per_second(u64::from(bytes), seconds)
}

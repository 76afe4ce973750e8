//! Upload planning and pre-flight gates for lesson media.
//!
//! Videos go through a three-phase multipart upload (initiate, one presigned
//! PUT per chunk, complete). Everything here is pure: chunk layout, the part
//! list sent on completion, and the checks that reject a file before any
//! network call. The transfer itself lives in the client crate.

use serde::{Deserialize, Serialize};

/// Multipart chunk size: 5 MiB, the smallest part object storage accepts.
pub const DEFAULT_CHUNK_SIZE: u64 = 5 * 1024 * 1024;

/// Shortest accepted lesson video, inclusive.
pub const MIN_VIDEO_DURATION_SECS: f64 = 60.0;

/// Longest accepted lesson video, inclusive.
pub const MAX_VIDEO_DURATION_SECS: f64 = 300.0;

/// Largest accepted article image.
pub const MAX_IMAGE_BYTES: u64 = 5 * 1024 * 1024;

pub const IMAGE_MIME_TYPES: &[&str] = &["image/jpeg", "image/png", "image/webp", "image/gif"];

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("File must be a video (got {mime})")]
    NotVideo { mime: String },

    #[error("File must be a JPEG, PNG, WebP or GIF image (got {mime})")]
    NotImage { mime: String },

    #[error("File is too large: {size} bytes (max {max})")]
    TooLarge { size: u64, max: u64 },

    #[error("File is empty")]
    Empty,

    #[error("Video must be between 1:00 and 5:00 long (this one is {measured})")]
    DurationOutOfRange { measured: String, seconds: f64 },

    #[error("Could not read video duration: {0}")]
    Probe(String),

    #[error("Upload failed: {0}")]
    Transfer(String),
}

impl UploadError {
    /// True for rejections raised before any network call.
    pub fn is_preflight(&self) -> bool {
        !matches!(self, Self::Transfer(_))
    }
}

// ---------------------------------------------------------------------------
// Multipart plan
// ---------------------------------------------------------------------------

/// One part of a multipart upload. `part_number` starts at 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkSpan {
    pub part_number: u32,
    pub offset: u64,
    pub len: u64,
}

/// Part number and integrity tag returned by storage for one uploaded chunk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletedPart {
    pub part_number: u32,
    pub e_tag: String,
}

/// Response of the initiate call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InitiatedUpload {
    pub upload_id: String,
    pub file_name: String,
}

/// Body of the complete call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompleteUpload {
    pub file_name: String,
    pub upload_id: String,
    pub parts: Vec<CompletedPart>,
}

/// Split `total` bytes into sequential parts of `chunk_size` (the last one
/// may be shorter). A zero `chunk_size` falls back to [`DEFAULT_CHUNK_SIZE`].
pub fn plan_chunks(total: u64, chunk_size: u64) -> Vec<ChunkSpan> {
    let chunk_size = if chunk_size == 0 { DEFAULT_CHUNK_SIZE } else { chunk_size };
    let mut spans = Vec::with_capacity(total.div_ceil(chunk_size) as usize);
    let mut offset = 0;
    let mut part_number = 1;
    while offset < total {
        let len = chunk_size.min(total - offset);
        spans.push(ChunkSpan {
            part_number,
            offset,
            len,
        });
        offset += len;
        part_number += 1;
    }
    spans
}

// ---------------------------------------------------------------------------
// Gates
// ---------------------------------------------------------------------------

pub fn validate_video_mime(mime: &str) -> Result<(), UploadError> {
    if mime.trim().to_ascii_lowercase().starts_with("video/") {
        Ok(())
    } else {
        Err(UploadError::NotVideo {
            mime: mime.to_string(),
        })
    }
}

/// Accept durations in `[MIN_VIDEO_DURATION_SECS, MAX_VIDEO_DURATION_SECS]`.
pub fn check_video_duration(seconds: f64) -> Result<(), UploadError> {
    if seconds.is_finite() && (MIN_VIDEO_DURATION_SECS..=MAX_VIDEO_DURATION_SECS).contains(&seconds) {
        Ok(())
    } else {
        Err(UploadError::DurationOutOfRange {
            measured: format_duration(seconds),
            seconds,
        })
    }
}

pub fn validate_image_attachment(mime: &str, size: u64) -> Result<(), UploadError> {
    let normalized = mime.trim().to_ascii_lowercase();
    if !IMAGE_MIME_TYPES.contains(&normalized.as_str()) {
        return Err(UploadError::NotImage {
            mime: mime.to_string(),
        });
    }
    if size == 0 {
        return Err(UploadError::Empty);
    }
    if size > MAX_IMAGE_BYTES {
        return Err(UploadError::TooLarge {
            size,
            max: MAX_IMAGE_BYTES,
        });
    }
    Ok(())
}

/// Render seconds as `m:ss`, truncating fractions.
pub fn format_duration(seconds: f64) -> String {
    let total = if seconds.is_finite() && seconds > 0.0 { seconds as u64 } else { 0 };
    format!("{}:{:02}", total / 60, total % 60)
}

// ---------------------------------------------------------------------------
// ffprobe output
// ---------------------------------------------------------------------------

/// The parts of `ffprobe -print_format json -show_format -show_streams`
/// output needed to read a duration.
#[derive(Debug, Default, Deserialize)]
pub struct FfprobeOutput {
    #[serde(default)]
    pub streams: Vec<FfprobeStream>,
    #[serde(default)]
    pub format: FfprobeFormat,
}

#[derive(Debug, Default, Deserialize)]
pub struct FfprobeStream {
    pub codec_type: Option<String>,
    pub duration: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct FfprobeFormat {
    pub duration: Option<String>,
}

/// Duration in seconds: format-level first, then the first video stream.
pub fn parse_probe_duration(probe: &FfprobeOutput) -> Option<f64> {
    let from_format = probe.format.duration.as_deref().and_then(|d| d.parse::<f64>().ok());
    from_format.or_else(|| {
        probe
            .streams
            .iter()
            .find(|s| s.codec_type.as_deref() == Some("video"))
            .and_then(|s| s.duration.as_deref())
            .and_then(|d| d.parse::<f64>().ok())
    })
}

//! # Metadata Module
//!
//! Extracts the properties used to spot duplicate videos.
//!
//! ## Extracted Fields
//! - Container duration (seconds, rounded to 2 decimals)
//! - Video stream dimensions (width x height)
//! - Video codec
//! - File size
//!
//! Extraction never fails outright: a file that cannot be probed yields a
//! [`VideoMetadata`] with `success == false` and a description of what went wrong.

mod ffprobe;

pub use ffprobe::{parse_probe_output, FfprobeExtractor};

use crate::core::units::{bytes_to_mb, round2};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Label used when a file has no usable video stream
pub const UNKNOWN: &str = "Unknown";

/// Extracted video metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoMetadata {
    pub file_path: PathBuf,
    pub file_name: String,
    pub directory: PathBuf,
    pub size_bytes: u64,
    #[serde(rename = "sizeMB")]
    pub size_mb: f64,
    pub duration_seconds: f64,
    pub width: u32,
    pub height: u32,
    pub resolution_label: String,
    pub codec: String,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Properties of the first video stream in a container
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoStream {
    pub width: u32,
    pub height: u32,
    pub codec: String,
}

impl VideoMetadata {
    /// Build a successful record; the raw duration is rounded here.
    pub fn probed(path: &Path, size_bytes: u64, duration_seconds: f64, stream: VideoStream) -> Self {
        Self {
            file_path: path.to_path_buf(),
            file_name: file_name_of(path),
            directory: directory_of(path),
            size_bytes,
            size_mb: bytes_to_mb(size_bytes),
            duration_seconds: round2(duration_seconds),
            width: stream.width,
            height: stream.height,
            resolution_label: format!("{}x{}", stream.width, stream.height),
            codec: stream.codec,
            success: true,
            error: None,
        }
    }

    /// Build a failed record carrying `error`
    pub fn failed(path: &Path, error: impl Into<String>) -> Self {
        Self {
            file_path: path.to_path_buf(),
            file_name: file_name_of(path),
            directory: directory_of(path),
            size_bytes: 0,
            size_mb: 0.0,
            duration_seconds: 0.0,
            width: 0,
            height: 0,
            resolution_label: UNKNOWN.to_string(),
            codec: UNKNOWN.to_string(),
            success: false,
            error: Some(error.into()),
        }
    }
}

/// Source of video metadata for a single path.
///
/// Implementations must not panic or return early on bad input; every failure
/// is folded into a `success == false` record.
pub trait MetadataExtractor: Send + Sync {
    fn extract(&self, path: &Path) -> VideoMetadata;
}

impl<F> MetadataExtractor for F
where
    F: Fn(&Path) -> VideoMetadata + Send + Sync,
{
    fn extract(&self, path: &Path) -> VideoMetadata {
        self(path)
    }
}

fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn directory_of(path: &Path) -> PathBuf {
    path.parent().map(Path::to_path_buf).unwrap_or_default()
}

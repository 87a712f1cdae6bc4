//! # Comparator Module
//!
//! Finds duplicate videos by comparing duration and resolution.
//!
//! ## How It Works
//! 1. Drop files whose metadata could not be extracted
//! 2. Partition the rest by (rounded duration, width, height), exact match only
//! 3. Keep partitions with two or more files
//! 4. Within each, keep the largest file and mark the rest for moving
//!
//! Duration and resolution equality is a cheap stand-in for "same content,
//! re-muxed or re-encoded". Re-encodes that shift the reported duration by more
//! than the rounding step are not caught.

mod grouper;

pub use grouper::{files_to_move, summarize, DuplicateGrouper};

use crate::core::metadata::VideoMetadata;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// A set of videos sharing duration and resolution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DuplicateGroup {
    /// 1-based, in the order groups were first seen in the input
    pub group_number: usize,
    pub duration_seconds: f64,
    pub resolution_label: String,
    pub width: u32,
    pub height: u32,
    pub codec: String,
    /// Number of members, including the kept file
    pub file_count: usize,
    /// Largest member; stays where it is
    pub kept_file: VideoMetadata,
    /// Remaining members, largest first
    pub files_to_move: Vec<VideoMetadata>,
    #[serde(rename = "totalSizeMB")]
    pub total_size_mb: f64,
    #[serde(rename = "spaceToSaveMB")]
    pub space_to_save_mb: f64,
}

impl DuplicateGroup {
    /// All members, kept file first, sorted by size descending
    pub fn members(&self) -> impl Iterator<Item = &VideoMetadata> {
        std::iter::once(&self.kept_file).chain(self.files_to_move.iter())
    }
}

/// One file slated for relocation, flattened out of its group
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileToMove {
    pub source_path: PathBuf,
    pub file_name: String,
    pub directory: PathBuf,
    #[serde(rename = "sizeMB")]
    pub size_mb: f64,
    pub size_bytes: u64,
    pub group_number: usize,
    pub duration_seconds: f64,
    pub resolution_label: String,
    /// Name of the file this one duplicates
    pub keeping_file_name: String,
}

/// Totals across all groups of a scan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    pub duplicate_group_count: usize,
    pub total_files_to_move: usize,
    #[serde(rename = "spaceToSaveMB")]
    pub space_to_save_mb: f64,
    #[serde(rename = "spaceToSaveGB")]
    pub space_to_save_gb: f64,
}

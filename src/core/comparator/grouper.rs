//! Groups videos by duration and resolution.
//!
//! Grouping is a pure function of the input list: the same list in the same
//! order always produces the same groups with the same numbers.

use super::{DuplicateGroup, FileToMove, Summary};
use crate::core::metadata::VideoMetadata;
use crate::core::units::round2;
use std::collections::HashMap;

/// Exact-match key: rounded duration bits, width, height
type GroupKey = (u64, u32, u32);

/// Groups successfully probed videos into duplicate sets
#[derive(Debug, Clone, Copy, Default)]
pub struct DuplicateGrouper;

impl DuplicateGrouper {
    /// Create a new grouper
    pub fn new() -> Self {
        Self
    }

    /// Group metadata into duplicate sets.
    ///
    /// Failed extractions are ignored and singleton partitions are dropped, so
    /// every returned group has at least two members.
    pub fn group(&self, metadata: &[VideoMetadata]) -> Vec<DuplicateGroup> {
        // Partitions in first-seen order
        let mut partitions: Vec<Vec<&VideoMetadata>> = Vec::new();
        let mut index: HashMap<GroupKey, usize> = HashMap::new();

        for video in metadata.iter().filter(|v| v.success) {
            let key = group_key(video);
            let slot = *index.entry(key).or_insert_with(|| {
                partitions.push(Vec::new());
                partitions.len() - 1
            });
            partitions[slot].push(video);
        }

        partitions
            .into_iter()
            .filter(|members| members.len() >= 2)
            .enumerate()
            .map(|(i, mut members)| {
                // Stable: equal sizes keep discovery order
                members.sort_by(|a, b| b.size_bytes.cmp(&a.size_bytes));
                build_group(i + 1, members)
            })
            .collect()
    }
}

fn group_key(video: &VideoMetadata) -> GroupKey {
    // +0.0 folds a negative zero onto zero so both land in one partition
    let duration = video.duration_seconds + 0.0;
    (duration.to_bits(), video.width, video.height)
}

fn build_group(group_number: usize, members: Vec<&VideoMetadata>) -> DuplicateGroup {
    let kept = members[0];
    let files_to_move: Vec<VideoMetadata> = members[1..].iter().map(|v| (*v).clone()).collect();

    let total_size_mb = round2(members.iter().map(|v| v.size_mb).sum());
    let space_to_save_mb = round2(files_to_move.iter().map(|v| v.size_mb).sum());

    DuplicateGroup {
        group_number,
        duration_seconds: kept.duration_seconds,
        resolution_label: kept.resolution_label.clone(),
        width: kept.width,
        height: kept.height,
        codec: kept.codec.clone(),
        file_count: members.len(),
        kept_file: kept.clone(),
        files_to_move,
        total_size_mb,
        space_to_save_mb,
    }
}

/// Flatten groups into one relocation list, preserving group order and
/// within-group order.
pub fn files_to_move(groups: &[DuplicateGroup]) -> Vec<FileToMove> {
    groups
        .iter()
        .flat_map(|group| {
            group.files_to_move.iter().map(move |file| FileToMove {
                source_path: file.file_path.clone(),
                file_name: file.file_name.clone(),
                directory: file.directory.clone(),
                size_mb: file.size_mb,
                size_bytes: file.size_bytes,
                group_number: group.group_number,
                duration_seconds: group.duration_seconds,
                resolution_label: group.resolution_label.clone(),
                keeping_file_name: group.kept_file.file_name.clone(),
            })
        })
        .collect()
}

/// Totals for a scan
pub fn summarize(groups: &[DuplicateGroup], files: &[FileToMove]) -> Summary {
    let space_to_save_mb = round2(files.iter().map(|f| f.size_mb).sum());

    Summary {
        duplicate_group_count: groups.len(),
        total_files_to_move: files.len(),
        space_to_save_mb,
        space_to_save_gb: round2(space_to_save_mb / 1024.0),
    }
}

//! Scan records and the values reported for scans and moves.

use crate::core::comparator::{DuplicateGroup, FileToMove, Summary};
use crate::core::relocate::MoveResult;
use crate::core::units::percentage;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use uuid::Uuid;

/// Opaque, unique scan identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScanId(Uuid);

impl ScanId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ScanId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ScanId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl FromStr for ScanId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

/// Overall state of a scan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScanStatus {
    Running,
    Completed,
    Error,
}

impl ScanStatus {
    /// Completed and errored scans never change again
    pub fn is_terminal(&self) -> bool {
        !matches!(self, ScanStatus::Running)
    }
}

/// Phases of a scan, in the order they are entered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScanPhase {
    Discovering,
    Discovered,
    Analyzing,
    Grouping,
    Complete,
}

impl fmt::Display for ScanPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScanPhase::Discovering => write!(f, "Discovering"),
            ScanPhase::Discovered => write!(f, "Discovered"),
            ScanPhase::Analyzing => write!(f, "Analyzing"),
            ScanPhase::Grouping => write!(f, "Grouping"),
            ScanPhase::Complete => write!(f, "Complete"),
        }
    }
}

/// Position within a sequence of files
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Progress {
    pub current: usize,
    pub total: usize,
    pub percentage: u32,
}

impl Progress {
    pub fn of(current: usize, total: usize) -> Self {
        Self {
            current,
            total,
            percentage: percentage(current, total),
        }
    }
}

/// What a successful scan found
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanResults {
    /// Every discovered video, including ones that failed to probe
    pub video_count: usize,
    pub duplicate_groups: Vec<DuplicateGroup>,
    pub files_to_move: Vec<FileToMove>,
    /// Absent when no videos were found at all
    pub summary: Option<Summary>,
}

impl ScanResults {
    /// Results for a tree with no videos in it
    pub fn empty() -> Self {
        Self {
            video_count: 0,
            duplicate_groups: Vec::new(),
            files_to_move: Vec::new(),
            summary: None,
        }
    }
}

/// Everything known about one scan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanRecord {
    pub id: ScanId,
    pub status: ScanStatus,
    pub phase: ScanPhase,
    pub source_path: PathBuf,
    pub recurse: bool,
    pub progress: Progress,
    pub results: Option<ScanResults>,
    pub error: Option<String>,
    pub start_time: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<Utc>>,
}

impl ScanRecord {
    /// A freshly accepted scan: running, discovering, no progress yet
    pub fn new(id: ScanId, source_path: PathBuf, recurse: bool) -> Self {
        Self {
            id,
            status: ScanStatus::Running,
            phase: ScanPhase::Discovering,
            source_path,
            recurse,
            progress: Progress::default(),
            results: None,
            error: None,
            start_time: Utc::now(),
            end_time: None,
        }
    }

    /// Short form used when listing scans
    pub fn listing(&self) -> ScanListing {
        ScanListing {
            id: self.id,
            status: self.status,
            phase: self.phase,
            source_path: self.source_path.clone(),
            start_time: self.start_time,
            end_time: self.end_time,
            summary: self.results.as_ref().and_then(|r| r.summary.clone()),
        }
    }
}

/// One row of a scan listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanListing {
    pub id: ScanId,
    pub status: ScanStatus,
    pub phase: ScanPhase,
    pub source_path: PathBuf,
    pub start_time: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<Summary>,
}

/// Acknowledgement that a move was accepted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveTicket {
    pub total_files: usize,
}

/// Totals for a finished move
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveSummary {
    pub total_files: usize,
    pub success_count: usize,
    pub failure_count: usize,
    pub total_bytes_moved: u64,
    #[serde(rename = "totalGBMoved")]
    pub total_gb_moved: f64,
    pub move_results: Vec<MoveResult>,
}

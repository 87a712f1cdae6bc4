//! # Scanner Module
//!
//! Discovers video files in directories and answers the simple path questions
//! asked before a scan or move starts.
//!
//! ## Supported Formats
//! See [`VIDEO_EXTENSIONS`]; matching is case-insensitive.
//!
//! ## Example
//! ```rust,ignore
//! use duplicate_video_cleaner::core::scanner::{FileDiscoverer, ScanConfig, WalkDirDiscoverer};
//!
//! let discoverer = WalkDirDiscoverer::new(ScanConfig::default());
//! let discovery = discoverer.discover("/mnt/media".as_ref(), true)?;
//! ```

mod filter;
mod walker;

pub use filter::{VideoFilter, VIDEO_EXTENSIONS};
pub use walker::{ScanConfig, WalkDirDiscoverer};

use crate::error::ScanError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Result of a discovery pass
#[derive(Debug, Default)]
pub struct Discovery {
    /// Candidate video files, in walk order
    pub files: Vec<PathBuf>,
    /// Directories or entries that could not be read (non-fatal)
    pub errors: Vec<ScanError>,
}

/// Trait for file discoverers
///
/// Implement this trait to plug in a different traversal (e.g., for testing).
pub trait FileDiscoverer: Send + Sync {
    /// Find candidate video files under `root`.
    ///
    /// Only a missing or non-directory root is an error; unreadable
    /// subdirectories are reported in [`Discovery::errors`] and skipped.
    fn discover(&self, root: &Path, recurse: bool) -> Result<Discovery, ScanError>;
}

/// Outcome of checking a user-supplied path
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PathValidation {
    pub valid: bool,
    #[serde(default)]
    pub is_directory: bool,
    #[serde(default)]
    pub is_file: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Check whether `path` exists and what kind of entry it is.
pub fn validate_path(path: &Path) -> PathValidation {
    match fs::metadata(path) {
        Ok(metadata) => PathValidation {
            valid: true,
            is_directory: metadata.is_dir(),
            is_file: metadata.is_file(),
            error: None,
        },
        Err(e) => PathValidation {
            valid: false,
            is_directory: false,
            is_file: false,
            error: Some(e.to_string()),
        },
    }
}

/// Create `path` and any missing ancestors.
pub fn ensure_directory(path: &Path) -> io::Result<()> {
    fs::create_dir_all(path)
}

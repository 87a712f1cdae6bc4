//! # Relocate Module
//!
//! Moves duplicate videos into a cleanup tree that mirrors the scanned tree.
//!
//! `base/season1/ep1.mkv` relocated from `base` into `cleanup` lands at
//! `cleanup/season1/ep1.mkv`; files directly inside `base` land directly inside
//! `cleanup`.

mod relocator;

pub use relocator::{FileRelocator, RenameFn};

use crate::error::RelocateError;
use serde::{Deserialize, Serialize};
use std::path::{Component, Path, PathBuf};

/// Outcome of relocating one file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveResult {
    pub source_path: PathBuf,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination_path: Option<PathBuf>,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl MoveResult {
    pub fn moved(source: &Path, destination: PathBuf) -> Self {
        Self {
            source_path: source.to_path_buf(),
            destination_path: Some(destination),
            success: true,
            error: None,
        }
    }

    pub fn failed(source: &Path, error: &RelocateError) -> Self {
        Self {
            source_path: source.to_path_buf(),
            destination_path: None,
            success: false,
            error: Some(error.to_string()),
        }
    }
}

/// Where `source` ends up when mirrored from `base` into `destination_root`.
///
/// Sources outside `base` (or reaching out of it with `..`) are rejected rather
/// than mirrored above the cleanup root.
pub fn destination_for(
    source: &Path,
    base: &Path,
    destination_root: &Path,
) -> Result<PathBuf, RelocateError> {
    let relative = source
        .strip_prefix(base)
        .map_err(|_| RelocateError::NotUnderBase {
            path: source.to_path_buf(),
            base: base.to_path_buf(),
        })?;

    if relative
        .components()
        .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir))
    {
        return Err(RelocateError::NotUnderBase {
            path: source.to_path_buf(),
            base: base.to_path_buf(),
        });
    }

    if relative.file_name().is_none() {
        return Err(RelocateError::NoFileName {
            path: source.to_path_buf(),
        });
    }

    Ok(destination_root.join(relative))
}

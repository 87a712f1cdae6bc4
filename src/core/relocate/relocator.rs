//! File relocation with a cross-device fallback.

use super::{destination_for, MoveResult};
use crate::error::RelocateError;
use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Signature of the primary move strategy
pub type RenameFn = fn(&Path, &Path) -> io::Result<()>;

#[cfg(unix)]
const CROSS_DEVICE_CODE: Option<i32> = Some(18); // EXDEV
#[cfg(windows)]
const CROSS_DEVICE_CODE: Option<i32> = Some(17); // ERROR_NOT_SAME_DEVICE
#[cfg(not(any(unix, windows)))]
const CROSS_DEVICE_CODE: Option<i32> = None;

/// Moves files into a mirrored cleanup tree
#[derive(Clone, Copy)]
pub struct FileRelocator {
    rename: RenameFn,
}

impl FileRelocator {
    /// Relocator whose primary strategy refuses to replace an existing destination
    pub fn new() -> Self {
        Self {
            rename: rename_no_clobber,
        }
    }

    /// Relocator with a custom primary strategy.
    ///
    /// The copy fallback still runs whenever `rename` reports a cross-device error.
    pub fn with_rename(rename: RenameFn) -> Self {
        Self { rename }
    }

    /// Move `source` from under `base` to the mirrored path under `destination_root`.
    ///
    /// Never panics and never returns early for the caller: every failure is
    /// captured in the returned [`MoveResult`].
    pub fn relocate(&self, source: &Path, base: &Path, destination_root: &Path) -> MoveResult {
        match self.try_relocate(source, base, destination_root) {
            Ok(destination) => {
                info!("Moved {} -> {}", source.display(), destination.display());
                MoveResult::moved(source, destination)
            }
            Err(e) => {
                warn!("Failed to move {}: {}", source.display(), e);
                MoveResult::failed(source, &e)
            }
        }
    }

    fn try_relocate(
        &self,
        source: &Path,
        base: &Path,
        destination_root: &Path,
    ) -> Result<PathBuf, RelocateError> {
        let destination = destination_for(source, base, destination_root)?;

        fs::symlink_metadata(source).map_err(|e| RelocateError::SourceUnavailable {
            path: source.to_path_buf(),
            source: e,
        })?;

        if fs::symlink_metadata(&destination).is_ok() {
            return Err(RelocateError::DestinationExists { path: destination });
        }

        if let Some(parent) = destination.parent() {
            fs::create_dir_all(parent).map_err(|e| RelocateError::CreateDirectory {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        match (self.rename)(source, &destination) {
            Ok(()) => Ok(destination),
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                Err(RelocateError::DestinationExists { path: destination })
            }
            Err(e) if is_cross_device(&e) => {
                copy_then_remove(source, &destination)?;
                Ok(destination)
            }
            Err(e) => Err(RelocateError::Rename {
                from: source.to_path_buf(),
                to: destination,
                source: e,
            }),
        }
    }
}

impl Default for FileRelocator {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for FileRelocator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileRelocator").finish_non_exhaustive()
    }
}

/// Move within one volume without ever replacing `to`.
///
/// Hard-linking fails with `AlreadyExists` if `to` appeared after the up-front
/// check, and with a cross-device error across volumes. Filesystems without
/// hard links fall back to a plain rename.
fn rename_no_clobber(from: &Path, to: &Path) -> io::Result<()> {
    match fs::hard_link(from, to) {
        Ok(()) => {
            if let Err(e) = fs::remove_file(from) {
                let _ = fs::remove_file(to);
                return Err(e);
            }
            Ok(())
        }
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists || is_cross_device(&e) => Err(e),
        Err(_) => fs::rename(from, to),
    }
}

fn is_cross_device(error: &io::Error) -> bool {
    CROSS_DEVICE_CODE.is_some() && error.raw_os_error() == CROSS_DEVICE_CODE
}

/// Copy across volumes, verify the copy's length, then delete the source.
///
/// The destination is opened create-new, so an existing file is never
/// overwritten. If removing the source fails the copy stays behind and the move
/// is still reported as failed.
fn copy_then_remove(source: &Path, destination: &Path) -> Result<(), RelocateError> {
    let copy_error = |e: io::Error| RelocateError::Copy {
        from: source.to_path_buf(),
        to: destination.to_path_buf(),
        source: e,
    };

    let source_meta = fs::metadata(source).map_err(copy_error)?;

    let mut reader = File::open(source).map_err(copy_error)?;
    let mut writer = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(destination)
        .map_err(|e| {
            if e.kind() == io::ErrorKind::AlreadyExists {
                RelocateError::DestinationExists {
                    path: destination.to_path_buf(),
                }
            } else {
                copy_error(e)
            }
        })?;

    let copied = io::copy(&mut reader, &mut writer).and_then(|n| writer.sync_all().map(|_| n));
    drop(writer);

    let copied = match copied {
        Ok(n) => n,
        Err(e) => {
            let _ = fs::remove_file(destination);
            return Err(copy_error(e));
        }
    };

    if copied != source_meta.len() {
        // Copy was incomplete, don't delete source
        let _ = fs::remove_file(destination);
        return Err(RelocateError::CopyVerification {
            path: destination.to_path_buf(),
            expected: source_meta.len(),
            actual: copied,
        });
    }

    let _ = fs::set_permissions(destination, source_meta.permissions());

    fs::remove_file(source).map_err(|e| RelocateError::RemoveSource {
        path: source.to_path_buf(),
        copy: destination.to_path_buf(),
        source: e,
    })
}

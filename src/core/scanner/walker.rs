//! Directory walking implementation using walkdir.

use super::filter::{is_hidden, VideoFilter};
use super::{Discovery, FileDiscoverer};
use crate::error::ScanError;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Configuration for the directory walker
#[derive(Debug, Clone)]
pub struct ScanConfig {
    /// Whether to follow symbolic links
    pub follow_symlinks: bool,
    /// Whether to include hidden files and directories
    pub include_hidden: bool,
    /// Custom extensions to include (None = default video containers)
    pub extensions: Option<Vec<String>>,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            follow_symlinks: false,
            include_hidden: true,
            extensions: None,
        }
    }
}

/// Discoverer implementation using the walkdir crate
///
/// Entries are visited in file-name order, so the same tree always yields the
/// same sequence of paths.
#[derive(Debug, Clone)]
pub struct WalkDirDiscoverer {
    config: ScanConfig,
    filter: VideoFilter,
}

impl WalkDirDiscoverer {
    /// Create a new discoverer with the given configuration
    pub fn new(config: ScanConfig) -> Self {
        let mut filter = VideoFilter::new().with_hidden(config.include_hidden);

        if let Some(ref extensions) = config.extensions {
            filter = filter.with_extensions(extensions.clone());
        }

        Self { config, filter }
    }

    /// Lazily walk `root`, yielding candidate videos and unreadable entries.
    ///
    /// Only the root's immediate entries are visited when `recurse` is false.
    pub fn walk<'a>(
        &'a self,
        root: &Path,
        recurse: bool,
    ) -> impl Iterator<Item = Result<PathBuf, ScanError>> + 'a {
        let mut walker = WalkDir::new(root)
            .min_depth(1)
            .follow_links(self.config.follow_symlinks)
            .sort_by_file_name();

        if !recurse {
            walker = walker.max_depth(1);
        }

        let include_hidden = self.filter.includes_hidden();

        walker
            .into_iter()
            .filter_entry(move |entry| include_hidden || !is_hidden(entry.path()))
            .filter_map(move |entry_result| match entry_result {
                Ok(entry) => {
                    if entry.file_type().is_file() && self.filter.should_include(entry.path()) {
                        Some(Ok(entry.into_path()))
                    } else {
                        None
                    }
                }
                Err(e) => Some(Err(walk_error(e))),
            })
    }
}

impl Default for WalkDirDiscoverer {
    fn default() -> Self {
        Self::new(ScanConfig::default())
    }
}

impl FileDiscoverer for WalkDirDiscoverer {
    fn discover(&self, root: &Path, recurse: bool) -> Result<Discovery, ScanError> {
        if !root.exists() {
            return Err(ScanError::DirectoryNotFound {
                path: root.to_path_buf(),
            });
        }

        if !root.is_dir() {
            return Err(ScanError::NotADirectory {
                path: root.to_path_buf(),
            });
        }

        let mut discovery = Discovery::default();

        for item in self.walk(root, recurse) {
            match item {
                Ok(path) => {
                    debug!(path = %path.display(), "Found video");
                    discovery.files.push(path);
                }
                Err(error) => {
                    warn!("Skipping unreadable entry: {}", error);
                    discovery.errors.push(error);
                }
            }
        }

        Ok(discovery)
    }
}

fn walk_error(e: walkdir::Error) -> ScanError {
    let path = e.path().map(Path::to_path_buf).unwrap_or_default();

    if e.io_error().map(|io| io.kind()) == Some(std::io::ErrorKind::PermissionDenied) {
        return ScanError::PermissionDenied { path };
    }

    let source = match e.into_io_error() {
        Some(io) => io,
        None => std::io::Error::new(std::io::ErrorKind::Other, "filesystem loop detected"),
    };
    ScanError::ReadDirectory { path, source }
}

//! Public entry points: start scans, poll them, and move their extras.

use super::registry::ScanRegistry;
use super::types::{MoveTicket, ScanId, ScanListing, ScanRecord};
use super::{mover, scan};
use crate::core::comparator::{DuplicateGrouper, FileToMove};
use crate::core::metadata::{FfprobeExtractor, MetadataExtractor};
use crate::core::relocate::FileRelocator;
use crate::core::scanner::{ensure_directory, FileDiscoverer, ScanConfig, WalkDirDiscoverer};
use crate::error::{MoveError, ScanError};
use crate::events::{null_sink, EventSink};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::info;

/// The pluggable pieces a scan or move runs with
pub(crate) struct Engine {
    pub(super) discoverer: Box<dyn FileDiscoverer>,
    pub(super) extractor: Box<dyn MetadataExtractor>,
    pub(super) grouper: DuplicateGrouper,
    pub(super) relocator: FileRelocator,
    pub(super) events: Arc<dyn EventSink>,
}

impl Engine {
    pub(super) fn new(
        discoverer: Box<dyn FileDiscoverer>,
        extractor: Box<dyn MetadataExtractor>,
        events: Arc<dyn EventSink>,
    ) -> Self {
        Self {
            discoverer,
            extractor,
            grouper: DuplicateGrouper::new(),
            relocator: FileRelocator::new(),
            events,
        }
    }
}

struct Shared {
    registry: ScanRegistry,
    engine: Engine,
}

/// Builder for [`ScanOrchestrator`]
pub struct OrchestratorBuilder {
    discoverer: Option<Box<dyn FileDiscoverer>>,
    extractor: Option<Box<dyn MetadataExtractor>>,
    relocator: FileRelocator,
    events: Option<Arc<dyn EventSink>>,
    retention: Option<Duration>,
}

impl OrchestratorBuilder {
    pub fn new() -> Self {
        Self {
            discoverer: None,
            extractor: None,
            relocator: FileRelocator::new(),
            events: None,
            retention: None,
        }
    }

    /// Use a custom file discoverer
    pub fn discoverer(mut self, discoverer: impl FileDiscoverer + 'static) -> Self {
        self.discoverer = Some(Box::new(discoverer));
        self
    }

    /// Use the walkdir discoverer with this configuration
    pub fn scan_config(mut self, config: ScanConfig) -> Self {
        self.discoverer = Some(Box::new(WalkDirDiscoverer::new(config)));
        self
    }

    /// Use a custom metadata extractor
    pub fn extractor(mut self, extractor: impl MetadataExtractor + 'static) -> Self {
        self.extractor = Some(Box::new(extractor));
        self
    }

    pub fn relocator(mut self, relocator: FileRelocator) -> Self {
        self.relocator = relocator;
        self
    }

    /// Publish progress to this sink
    pub fn events(mut self, sink: impl EventSink + 'static) -> Self {
        self.events = Some(Arc::new(sink));
        self
    }

    /// Forget finished scans after this long; `None` keeps them for the process lifetime
    pub fn retention(mut self, retention: Option<Duration>) -> Self {
        self.retention = retention;
        self
    }

    pub fn build(self) -> ScanOrchestrator {
        let discoverer: Box<dyn FileDiscoverer> = match self.discoverer {
            Some(discoverer) => discoverer,
            None => Box::new(WalkDirDiscoverer::new(ScanConfig::default())),
        };
        let extractor: Box<dyn MetadataExtractor> = match self.extractor {
            Some(extractor) => extractor,
            None => Box::new(FfprobeExtractor::new()),
        };
        let events = self.events.unwrap_or_else(null_sink);

        let mut engine = Engine::new(discoverer, extractor, events);
        engine.relocator = self.relocator;

        ScanOrchestrator {
            shared: Arc::new(Shared {
                registry: ScanRegistry::new(self.retention),
                engine,
            }),
        }
    }
}

impl Default for OrchestratorBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Accepts scan and move requests and runs each on its own worker thread.
///
/// Cloning is cheap and every clone shares the same scans.
#[derive(Clone)]
pub struct ScanOrchestrator {
    shared: Arc<Shared>,
}

impl ScanOrchestrator {
    pub fn builder() -> OrchestratorBuilder {
        OrchestratorBuilder::new()
    }

    /// Accept a scan of `source` and return at once.
    ///
    /// The source must be an existing directory; otherwise nothing is recorded.
    pub fn start_scan(&self, source: impl Into<PathBuf>, recurse: bool) -> Result<ScanId, ScanError> {
        let source = source.into();
        if !source.exists() {
            return Err(ScanError::DirectoryNotFound { path: source });
        }
        if !source.is_dir() {
            return Err(ScanError::NotADirectory { path: source });
        }

        self.shared.registry.evict_expired();

        let writer = self.shared.registry.create(source.clone(), recurse);
        let scan_id = writer.id();
        info!(%scan_id, source = %source.display(), recurse, "Scan accepted");

        let shared = Arc::clone(&self.shared);
        let spawned = thread::Builder::new()
            .name(format!("scan-{scan_id}"))
            .spawn(move || scan::run(&shared.engine, &writer, &source, recurse));

        if let Err(err) = spawned {
            self.shared.registry.remove(&scan_id);
            return Err(ScanError::Spawn(err));
        }
        Ok(scan_id)
    }

    /// Current state of a scan
    pub fn get_scan(&self, id: &ScanId) -> Option<ScanRecord> {
        self.shared.registry.get(id)
    }

    /// Every known scan, oldest first
    pub fn list_scans(&self) -> Vec<ScanListing> {
        self.shared.registry.evict_expired();
        self.shared.registry.list()
    }

    /// Accept a move of a completed scan's extras into `cleanup`.
    ///
    /// A non-empty `selected` list restricts the move to those source paths.
    /// Relative directories below the scan's source are mirrored under `cleanup`.
    pub fn start_move(
        &self,
        id: &ScanId,
        cleanup: impl Into<PathBuf>,
        selected: Option<&[PathBuf]>,
    ) -> Result<MoveTicket, MoveError> {
        let record = self
            .shared
            .registry
            .get(id)
            .ok_or_else(|| MoveError::ScanNotFound { id: id.to_string() })?;
        let results = record
            .results
            .ok_or_else(|| MoveError::NoResults { id: id.to_string() })?;

        if results.files_to_move.is_empty() {
            return Err(MoveError::NothingToMove);
        }

        let files = select(results.files_to_move, selected);
        if files.is_empty() {
            return Err(MoveError::NoMatchingFiles);
        }

        let cleanup = cleanup.into();
        ensure_directory(&cleanup).map_err(|source| MoveError::CleanupDirectory {
            path: cleanup.clone(),
            source,
        })?;

        let ticket = MoveTicket {
            total_files: files.len(),
        };
        info!(scan_id = %id, files = ticket.total_files, cleanup = %cleanup.display(), "Move accepted");

        let shared = Arc::clone(&self.shared);
        let scan_id = *id;
        let base = record.source_path;
        thread::Builder::new()
            .name(format!("move-{scan_id}"))
            .spawn(move || {
                mover::run(&shared.engine, scan_id, &files, &base, &cleanup);
            })
            .map_err(MoveError::Spawn)?;

        Ok(ticket)
    }
}

fn select(files: Vec<FileToMove>, selected: Option<&[PathBuf]>) -> Vec<FileToMove> {
    match selected {
        Some(paths) if !paths.is_empty() => {
            let wanted: HashSet<&Path> = paths.iter().map(PathBuf::as_path).collect();
            files
                .into_iter()
                .filter(|file| wanted.contains(file.source_path.as_path()))
                .collect()
        }
        _ => files,
    }
}

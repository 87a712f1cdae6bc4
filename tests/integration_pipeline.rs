//! Integration tests for the scan and move workflows.
//!
//! These tests drive the orchestrator end to end against real directory trees,
//! with a catalog standing in for ffprobe:
//! - Grouping and keeper selection
//! - Failed extractions and empty trees
//! - Move requests, selections and mirrored layouts
//! - Scan failures surfacing as events

use assert_fs::prelude::*;
use duplicate_video_cleaner::core::metadata::{MetadataExtractor, VideoMetadata, VideoStream};
use duplicate_video_cleaner::core::pipeline::{
    MoveSummary, ScanId, ScanOrchestrator, ScanPhase, ScanRecord, ScanStatus,
};
use duplicate_video_cleaner::core::scanner::{Discovery, FileDiscoverer};
use duplicate_video_cleaner::error::{MoveError, ScanError};
use duplicate_video_cleaner::events::{Event, EventBus, EventReceiver};
use predicates::prelude::*;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

const MB: u64 = 1_048_576;
const WAIT: Duration = Duration::from_secs(10);

/// Answers extraction from a table keyed by file name; unknown files fail
#[derive(Default)]
struct Catalog {
    entries: HashMap<String, (f64, u32, u32, u64)>,
}

impl Catalog {
    fn with(mut self, name: &str, duration: f64, width: u32, height: u32, size_mb: u64) -> Self {
        self.entries
            .insert(name.to_string(), (duration, width, height, size_mb));
        self
    }
}

impl MetadataExtractor for Catalog {
    fn extract(&self, path: &Path) -> VideoMetadata {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        match self.entries.get(&name) {
            Some(&(duration, width, height, size_mb)) => VideoMetadata::probed(
                path,
                size_mb * MB,
                duration,
                VideoStream {
                    width,
                    height,
                    codec: "h264".to_string(),
                },
            ),
            None => VideoMetadata::failed(path, "No video stream found"),
        }
    }
}

struct Harness {
    orchestrator: ScanOrchestrator,
    receiver: EventReceiver,
}

impl Harness {
    fn new(catalog: Catalog) -> Self {
        let bus = EventBus::new();
        let receiver = bus.subscribe();
        let orchestrator = ScanOrchestrator::builder()
            .extractor(catalog)
            .events(bus)
            .build();
        Self {
            orchestrator,
            receiver,
        }
    }

    /// Start a scan and block until its terminal event
    fn scan(&self, root: &Path) -> (ScanId, ScanRecord, Vec<Event>) {
        let id = self.orchestrator.start_scan(root, true).unwrap();
        let events = self.collect_until(id, |e| {
            matches!(e, Event::ScanComplete { .. } | Event::ScanError { .. })
        });
        let record = self.orchestrator.get_scan(&id).unwrap();
        (id, record, events)
    }

    /// Block until the move for `id` reports completion
    fn finish_move(&self, id: ScanId) -> (MoveSummary, Vec<Event>) {
        let events = self.collect_until(id, |e| matches!(e, Event::MoveComplete { .. }));
        match events.last() {
            Some(Event::MoveComplete { results, .. }) => (results.clone(), events),
            other => panic!("expected move_complete, got {other:?}"),
        }
    }

    fn collect_until(&self, id: ScanId, done: impl Fn(&Event) -> bool) -> Vec<Event> {
        let deadline = Instant::now() + WAIT;
        let mut events = Vec::new();
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match self.receiver.recv_timeout(remaining) {
                Some(event) if event.scan_id() == id => {
                    let finished = done(&event);
                    events.push(event);
                    if finished {
                        return events;
                    }
                }
                Some(_) => continue,
                None => panic!("timed out waiting for {id}"),
            }
        }
    }
}

#[test]
fn largest_copy_is_kept_and_the_rest_are_queued() {
    let temp = assert_fs::TempDir::new().unwrap();
    for name in ["a.mp4", "b.mp4", "c.mp4"] {
        temp.child(name).write_str("video").unwrap();
    }
    let harness = Harness::new(
        Catalog::default()
            .with("a.mp4", 120.0, 1920, 1080, 700)
            .with("b.mp4", 120.0, 1920, 1080, 650)
            .with("c.mp4", 120.0, 1920, 1080, 680),
    );

    let (_, record, _) = harness.scan(temp.path());

    assert_eq!(record.status, ScanStatus::Completed);
    assert_eq!(record.phase, ScanPhase::Complete);
    assert!(record.error.is_none());
    assert!(record.end_time.is_some());

    let results = record.results.unwrap();
    assert_eq!(results.video_count, 3);
    assert_eq!(results.duplicate_groups.len(), 1);

    let group = &results.duplicate_groups[0];
    assert_eq!(group.group_number, 1);
    assert_eq!(group.file_count, 3);
    assert_eq!(group.resolution_label, "1920x1080");
    assert_eq!(group.kept_file.file_name, "a.mp4");

    let queued: Vec<&str> = results
        .files_to_move
        .iter()
        .map(|f| f.file_name.as_str())
        .collect();
    assert_eq!(queued, vec!["c.mp4", "b.mp4"]);
    assert!(results
        .files_to_move
        .iter()
        .all(|f| f.keeping_file_name == "a.mp4"));

    let summary = results.summary.unwrap();
    assert_eq!(summary.duplicate_group_count, 1);
    assert_eq!(summary.total_files_to_move, 2);
    assert_eq!(summary.space_to_save_mb, 1330.0);
    assert_eq!(summary.space_to_save_gb, 1.3);
}

#[test]
fn failed_extractions_count_as_videos_but_never_group() {
    let temp = assert_fs::TempDir::new().unwrap();
    for name in ["a.mp4", "b.mp4", "broken.mp4"] {
        temp.child(name).write_str("video").unwrap();
    }
    let harness = Harness::new(
        Catalog::default()
            .with("a.mp4", 30.0, 1280, 720, 20)
            .with("b.mp4", 30.0, 1280, 720, 10),
    );

    let (_, record, _) = harness.scan(temp.path());
    let results = record.results.unwrap();

    assert_eq!(results.video_count, 3);
    assert_eq!(results.duplicate_groups.len(), 1);
    assert!(results
        .duplicate_groups
        .iter()
        .flat_map(|g| g.members())
        .all(|v| v.file_name != "broken.mp4"));
    assert_eq!(results.files_to_move.len(), 1);
    assert_eq!(results.files_to_move[0].file_name, "b.mp4");
}

#[test]
fn empty_tree_completes_with_null_summary() {
    let temp = assert_fs::TempDir::new().unwrap();
    temp.child("notes.txt").write_str("not a video").unwrap();
    let harness = Harness::new(Catalog::default());

    let (_, record, events) = harness.scan(temp.path());

    assert_eq!(record.status, ScanStatus::Completed);
    assert!(record.error.is_none());
    let results = record.results.unwrap();
    assert_eq!(results.video_count, 0);
    assert!(results.duplicate_groups.is_empty());
    assert!(results.files_to_move.is_empty());
    assert!(results.summary.is_none());
    assert!(matches!(events.last(), Some(Event::ScanComplete { .. })));
}

#[test]
fn unmatched_selection_is_rejected_before_touching_disk() {
    let temp = assert_fs::TempDir::new().unwrap();
    temp.child("a.mp4").write_str("video").unwrap();
    temp.child("b.mp4").write_str("video").unwrap();
    let harness = Harness::new(
        Catalog::default()
            .with("a.mp4", 60.0, 640, 480, 2)
            .with("b.mp4", 60.0, 640, 480, 1),
    );
    let (id, _, _) = harness.scan(temp.path());
    let cleanup = temp.child("cleanup");

    let selected = vec![PathBuf::from("/somewhere/else.mp4")];
    let result = harness
        .orchestrator
        .start_move(&id, cleanup.path(), Some(&selected));

    assert!(matches!(result, Err(MoveError::NoMatchingFiles)));
    cleanup.assert(predicate::path::missing());
    temp.child("b.mp4").assert(predicate::path::exists());
}

#[test]
fn move_mirrors_layout_into_cleanup() {
    let temp = assert_fs::TempDir::new().unwrap();
    let source = temp.child("library");
    source.child("x/clip1.mkv").write_str("larger").unwrap();
    source.child("y/deep/clip2.mkv").write_str("smaller").unwrap();
    source.child("clip3.mkv").write_str("smallest").unwrap();
    let cleanup = temp.child("cleanup");
    let harness = Harness::new(
        Catalog::default()
            .with("clip1.mkv", 95.5, 3840, 2160, 900)
            .with("clip2.mkv", 95.5, 3840, 2160, 400)
            .with("clip3.mkv", 95.5, 3840, 2160, 100),
    );
    let (id, _, _) = harness.scan(source.path());

    let ticket = harness
        .orchestrator
        .start_move(&id, cleanup.path(), None)
        .unwrap();
    let (summary, events) = harness.finish_move(id);

    assert_eq!(ticket.total_files, 2);
    assert_eq!(summary.total_files, 2);
    assert_eq!(summary.success_count, 2);
    assert_eq!(summary.failure_count, 0);
    assert_eq!(summary.total_bytes_moved, 500 * MB);
    assert_eq!(summary.total_gb_moved, 0.49);

    source.child("x/clip1.mkv").assert(predicate::path::exists());
    source.child("y/deep/clip2.mkv").assert(predicate::path::missing());
    source.child("clip3.mkv").assert(predicate::path::missing());
    cleanup.child("y/deep/clip2.mkv").assert("smaller");
    cleanup.child("clip3.mkv").assert("smallest");

    let progress: Vec<usize> = events
        .iter()
        .filter_map(|e| match e {
            Event::MoveProgress { progress, .. } => Some(progress.current),
            _ => None,
        })
        .collect();
    assert_eq!(progress, vec![1, 2]);
}

#[test]
fn selection_limits_the_move() {
    let temp = assert_fs::TempDir::new().unwrap();
    let source = temp.child("library");
    for name in ["a.mp4", "b.mp4", "c.mp4"] {
        source.child(name).write_str(name).unwrap();
    }
    let cleanup = temp.child("cleanup");
    let harness = Harness::new(
        Catalog::default()
            .with("a.mp4", 10.0, 320, 240, 3)
            .with("b.mp4", 10.0, 320, 240, 2)
            .with("c.mp4", 10.0, 320, 240, 1),
    );
    let (id, record, _) = harness.scan(source.path());
    let chosen = record.results.unwrap().files_to_move[1].source_path.clone();

    let ticket = harness
        .orchestrator
        .start_move(&id, cleanup.path(), Some(&[chosen.clone()]))
        .unwrap();
    let (summary, _) = harness.finish_move(id);

    assert_eq!(ticket.total_files, 1);
    assert_eq!(summary.success_count, 1);
    assert_eq!(summary.move_results[0].source_path, chosen);
    source.child("b.mp4").assert(predicate::path::exists());
    source.child("c.mp4").assert(predicate::path::missing());
    cleanup.child("c.mp4").assert(predicate::path::exists());
}

#[test]
fn move_continues_past_a_vanished_file() {
    let temp = assert_fs::TempDir::new().unwrap();
    let source = temp.child("library");
    for name in ["a.mp4", "b.mp4", "c.mp4"] {
        source.child(name).write_str(name).unwrap();
    }
    let cleanup = temp.child("cleanup");
    let harness = Harness::new(
        Catalog::default()
            .with("a.mp4", 10.0, 320, 240, 3)
            .with("b.mp4", 10.0, 320, 240, 2)
            .with("c.mp4", 10.0, 320, 240, 1),
    );
    let (id, _, _) = harness.scan(source.path());
    std::fs::remove_file(source.child("b.mp4").path()).unwrap();

    harness
        .orchestrator
        .start_move(&id, cleanup.path(), None)
        .unwrap();
    let (summary, events) = harness.finish_move(id);

    assert_eq!(summary.success_count, 1);
    assert_eq!(summary.failure_count, 1);
    assert_eq!(summary.total_bytes_moved, MB);
    assert!(!summary.move_results[0].success);
    assert!(summary.move_results[0].error.is_some());
    assert!(summary.move_results[1].success);
    assert!(events.iter().any(|e| matches!(
        e,
        Event::MoveProgress { success: false, .. }
    )));
}

#[test]
fn existing_destination_is_never_overwritten() {
    let temp = assert_fs::TempDir::new().unwrap();
    let source = temp.child("library");
    source.child("a.mp4").write_str("keep").unwrap();
    source.child("b.mp4").write_str("extra").unwrap();
    let cleanup = temp.child("cleanup");
    cleanup.child("b.mp4").write_str("already here").unwrap();
    let harness = Harness::new(
        Catalog::default()
            .with("a.mp4", 10.0, 320, 240, 2)
            .with("b.mp4", 10.0, 320, 240, 1),
    );
    let (id, _, _) = harness.scan(source.path());

    harness
        .orchestrator
        .start_move(&id, cleanup.path(), None)
        .unwrap();
    let (summary, _) = harness.finish_move(id);

    assert_eq!(summary.failure_count, 1);
    let error = summary.move_results[0].error.clone().unwrap();
    assert!(error.contains("Destination already exists"));
    cleanup.child("b.mp4").assert("already here");
    source.child("b.mp4").assert("extra");
}

#[test]
fn move_before_results_is_rejected() {
    let harness = Harness::new(Catalog::default());

    let result = harness
        .orchestrator
        .start_move(&ScanId::new(), "/tmp/never", None);

    assert!(matches!(result, Err(MoveError::ScanNotFound { .. })));
}

struct LockedOut;

impl FileDiscoverer for LockedOut {
    fn discover(&self, root: &Path, _recurse: bool) -> Result<Discovery, ScanError> {
        Err(ScanError::PermissionDenied {
            path: root.to_path_buf(),
        })
    }
}

#[test]
fn discovery_failure_surfaces_as_scan_error() {
    let temp = assert_fs::TempDir::new().unwrap();
    let bus = EventBus::new();
    let receiver = bus.subscribe();
    let orchestrator = ScanOrchestrator::builder()
        .discoverer(LockedOut)
        .extractor(Catalog::default())
        .events(bus)
        .build();
    let harness = Harness {
        orchestrator,
        receiver,
    };

    let (_, record, events) = harness.scan(temp.path());

    assert_eq!(record.status, ScanStatus::Error);
    assert!(record.results.is_none());
    assert!(record.error.unwrap().contains("Permission denied"));
    match events.last() {
        Some(Event::ScanError { error, .. }) => assert!(error.contains("Permission denied")),
        other => panic!("expected scan_error, got {other:?}"),
    }
}

#[test]
fn panicking_extractor_fails_only_its_scan() {
    let temp = assert_fs::TempDir::new().unwrap();
    temp.child("boom.mp4").write_str("video").unwrap();
    let bus = EventBus::new();
    let receiver = bus.subscribe();
    let orchestrator = ScanOrchestrator::builder()
        .extractor(|path: &Path| -> VideoMetadata {
            if path.ends_with("boom.mp4") {
                panic!("decoder crashed");
            }
            VideoMetadata::failed(path, "unknown")
        })
        .events(bus)
        .build();
    let harness = Harness {
        orchestrator,
        receiver,
    };

    let (_, record, _) = harness.scan(temp.path());
    assert_eq!(record.status, ScanStatus::Error);
    assert!(record.error.unwrap().contains("decoder crashed"));

    // The orchestrator keeps serving other scans
    let other = assert_fs::TempDir::new().unwrap();
    let (_, record, _) = harness.scan(other.path());
    assert_eq!(record.status, ScanStatus::Completed);
}

#[test]
fn invalid_sources_are_rejected_synchronously() {
    let temp = assert_fs::TempDir::new().unwrap();
    let file = temp.child("a.mp4");
    file.write_str("video").unwrap();
    let harness = Harness::new(Catalog::default());

    let missing = harness
        .orchestrator
        .start_scan(temp.path().join("nope"), true);
    let not_dir = harness.orchestrator.start_scan(file.path(), true);

    assert!(matches!(missing, Err(ScanError::DirectoryNotFound { .. })));
    assert!(matches!(not_dir, Err(ScanError::NotADirectory { .. })));
    assert!(harness.orchestrator.list_scans().is_empty());
}

#[test]
fn listing_reports_every_scan_with_summary() {
    let first = assert_fs::TempDir::new().unwrap();
    first.child("a.mp4").write_str("video").unwrap();
    first.child("b.mp4").write_str("video").unwrap();
    let second = assert_fs::TempDir::new().unwrap();
    let harness = Harness::new(
        Catalog::default()
            .with("a.mp4", 5.0, 100, 100, 2)
            .with("b.mp4", 5.0, 100, 100, 1),
    );

    let (first_id, _, _) = harness.scan(first.path());
    let (second_id, _, _) = harness.scan(second.path());
    let listing = harness.orchestrator.list_scans();

    assert_eq!(listing.len(), 2);
    assert_eq!(listing[0].id, first_id);
    assert_eq!(listing[0].summary.as_ref().unwrap().total_files_to_move, 1);
    assert_eq!(listing[1].id, second_id);
    assert!(listing[1].summary.is_none());
    assert!(listing.iter().all(|l| l.status == ScanStatus::Completed));
}

#[test]
fn expired_scans_are_forgotten() {
    let temp = assert_fs::TempDir::new().unwrap();
    let bus = EventBus::new();
    let receiver = bus.subscribe();
    let orchestrator = ScanOrchestrator::builder()
        .extractor(Catalog::default())
        .events(bus)
        .retention(Some(Duration::ZERO))
        .build();
    let harness = Harness {
        orchestrator,
        receiver,
    };

    let (id, _, _) = harness.scan(temp.path());
    std::thread::sleep(Duration::from_millis(10));

    assert!(harness.orchestrator.list_scans().is_empty());
    assert!(harness.orchestrator.get_scan(&id).is_none());
}

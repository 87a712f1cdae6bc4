//! Relocates a scan's extra copies into the cleanup tree.

use super::orchestrator::Engine;
use super::types::{MoveSummary, Progress, ScanId};
use crate::core::comparator::FileToMove;
use crate::core::units::bytes_to_gb;
use crate::events::Event;
use std::path::Path;
use tracing::info;

/// Move every file in order, never stopping on a single failure.
///
/// Emits `move_progress` after each file and one `move_complete` at the end.
pub(super) fn run(
    engine: &Engine,
    scan_id: ScanId,
    files: &[FileToMove],
    base: &Path,
    cleanup: &Path,
) -> MoveSummary {
    let total = files.len();
    let mut move_results = Vec::with_capacity(total);
    let mut success_count = 0;
    let mut failure_count = 0;
    let mut total_bytes_moved = 0u64;

    for (i, file) in files.iter().enumerate() {
        let result = engine.relocator.relocate(&file.source_path, base, cleanup);

        if result.success {
            success_count += 1;
            total_bytes_moved += file.size_bytes;
        } else {
            failure_count += 1;
        }

        engine.events.emit(Event::MoveProgress {
            scan_id,
            progress: Progress::of(i + 1, total),
            message: format!("Moving: {}", file.file_name),
            success: result.success,
        });
        move_results.push(result);
    }

    let summary = MoveSummary {
        total_files: total,
        success_count,
        failure_count,
        total_bytes_moved,
        total_gb_moved: bytes_to_gb(total_bytes_moved),
        move_results,
    };

    info!(
        %scan_id,
        moved = success_count,
        failed = failure_count,
        gb = summary.total_gb_moved,
        "Move complete"
    );
    engine.events.emit(Event::MoveComplete {
        scan_id,
        results: summary.clone(),
    });
    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::metadata::VideoMetadata;
    use crate::core::scanner::{ScanConfig, WalkDirDiscoverer};
    use crate::events::EventBus;
    use std::fs;
    use std::path::PathBuf;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn file_to_move(path: PathBuf, size_bytes: u64) -> FileToMove {
        let file_name = path.file_name().unwrap().to_string_lossy().into_owned();
        let directory = path.parent().unwrap().to_path_buf();
        FileToMove {
            source_path: path,
            file_name,
            directory,
            size_mb: 0.0,
            size_bytes,
            group_number: 1,
            duration_seconds: 60.0,
            resolution_label: "1280x720".to_string(),
            keeping_file_name: "kept.mp4".to_string(),
        }
    }

    fn engine(bus: &EventBus) -> Engine {
        Engine::new(
            Box::new(WalkDirDiscoverer::new(ScanConfig::default())),
            Box::new(|path: &Path| VideoMetadata::failed(path, "unused")),
            Arc::new(bus.clone()),
        )
    }

    #[test]
    fn partial_failure_does_not_stop_the_move() {
        let source = TempDir::new().unwrap();
        let cleanup = TempDir::new().unwrap();
        fs::create_dir(source.path().join("sub")).unwrap();
        fs::write(source.path().join("sub/a.mp4"), b"0123456789").unwrap();
        fs::write(source.path().join("c.mp4"), b"01234").unwrap();

        let files = vec![
            file_to_move(source.path().join("sub/a.mp4"), 10),
            file_to_move(source.path().join("missing.mp4"), 99),
            file_to_move(source.path().join("c.mp4"), 5),
        ];
        let bus = EventBus::new();
        let receiver = bus.subscribe();
        let scan_id = ScanId::new();

        let summary = run(&engine(&bus), scan_id, &files, source.path(), cleanup.path());

        assert_eq!(summary.total_files, 3);
        assert_eq!(summary.success_count, 2);
        assert_eq!(summary.failure_count, 1);
        assert_eq!(summary.total_bytes_moved, 15);
        assert!(cleanup.path().join("sub/a.mp4").exists());
        assert!(cleanup.path().join("c.mp4").exists());
        assert!(!summary.move_results[1].success);

        let events: Vec<Event> = std::iter::from_fn(|| receiver.try_recv()).collect();
        assert_eq!(events.len(), 4);
        match &events[1] {
            Event::MoveProgress {
                progress, success, message, ..
            } => {
                assert_eq!(progress.current, 2);
                assert!(!success);
                assert_eq!(message, "Moving: missing.mp4");
            }
            other => panic!("expected move_progress, got {other:?}"),
        }
        assert!(matches!(events[3], Event::MoveComplete { .. }));
    }

    #[test]
    fn gigabytes_are_rounded() {
        let source = TempDir::new().unwrap();
        let cleanup = TempDir::new().unwrap();
        fs::write(source.path().join("big.mp4"), b"x").unwrap();
        // Size is taken from the scan, not re-read from disk
        let files = vec![file_to_move(source.path().join("big.mp4"), 1_610_612_736)];
        let bus = EventBus::new();

        let summary = run(&engine(&bus), ScanId::new(), &files, source.path(), cleanup.path());

        assert_eq!(summary.total_gb_moved, 1.5);
    }
}

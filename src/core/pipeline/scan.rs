//! The scan state machine run on a worker thread.

use super::orchestrator::Engine;
use super::registry::ScanWriter;
use super::types::{Progress, ScanPhase, ScanResults};
use crate::core::comparator::{files_to_move, summarize};
use crate::core::metadata::VideoMetadata;
use crate::error::VideoDedupError;
use crate::events::Event;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::path::Path;
use std::time::Instant;
use tracing::{debug, error, info};

/// Analyzing progress is published once per this many files, and on the last one
pub const PROGRESS_EVERY: usize = 5;

/// Drive one scan to a terminal state.
///
/// Every outcome, including a panic inside a plugged-in component, ends with
/// exactly one `scan_complete` or `scan_error` event.
pub(super) fn run(engine: &Engine, writer: &ScanWriter, source: &Path, recurse: bool) {
    let scan_id = writer.id();
    let started = Instant::now();

    let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
        analyze(engine, writer, source, recurse)
    }));

    let failure = match outcome {
        Ok(Ok(results)) => {
            info!(
                %scan_id,
                videos = results.video_count,
                groups = results.duplicate_groups.len(),
                to_move = results.files_to_move.len(),
                elapsed_ms = started.elapsed().as_millis() as u64,
                "Scan complete"
            );
            writer.complete(results.clone());
            engine.events.emit(Event::ScanComplete { scan_id, results });
            return;
        }
        Ok(Err(err)) => err.to_string(),
        Err(payload) => VideoDedupError::ScanFailed(panic_message(payload.as_ref())).to_string(),
    };

    error!(%scan_id, error = %failure, "Scan failed");
    writer.fail(failure.clone());
    engine.events.emit(Event::ScanError {
        scan_id,
        error: failure,
    });
}

fn analyze(
    engine: &Engine,
    writer: &ScanWriter,
    source: &Path,
    recurse: bool,
) -> Result<ScanResults, VideoDedupError> {
    let scan_id = writer.id();
    let progress = |phase: ScanPhase, message: String, progress: Option<Progress>| {
        engine.events.emit(Event::ScanProgress {
            scan_id,
            phase,
            message: Some(message),
            progress,
        });
    };

    // Discovering
    progress(
        ScanPhase::Discovering,
        "Searching for video files...".to_string(),
        None,
    );
    let discovery = engine.discoverer.discover(source, recurse)?;
    for skipped in &discovery.errors {
        debug!(%scan_id, error = %skipped, "Skipped during discovery");
    }

    let files = discovery.files;
    if files.is_empty() {
        info!(%scan_id, source = %source.display(), "No video files found");
        return Ok(ScanResults::empty());
    }

    writer.set_phase(ScanPhase::Discovered);
    progress(
        ScanPhase::Discovered,
        format!("Found {} video files", files.len()),
        None,
    );

    // Analyzing, strictly one probe at a time
    let total = files.len();
    writer.start_analyzing(total);

    let mut metadata: Vec<VideoMetadata> = Vec::with_capacity(total);
    for (i, path) in files.iter().enumerate() {
        let video = engine.extractor.extract(path);
        let current = i + 1;
        let step = Progress::of(current, total);
        writer.set_progress(step);

        if current % PROGRESS_EVERY == 0 || current == total {
            progress(
                ScanPhase::Analyzing,
                format!("Analyzing: {}", video.file_name),
                Some(step),
            );
        }
        metadata.push(video);
    }

    let failed = metadata.iter().filter(|v| !v.success).count();
    if failed > 0 {
        debug!(%scan_id, failed, "Some files could not be probed");
    }

    // Grouping
    writer.set_phase(ScanPhase::Grouping);
    progress(
        ScanPhase::Grouping,
        "Identifying duplicate groups...".to_string(),
        None,
    );

    let duplicate_groups = engine.grouper.group(&metadata);
    let files_to_move = files_to_move(&duplicate_groups);
    let summary = summarize(&duplicate_groups, &files_to_move);

    Ok(ScanResults {
        video_count: total,
        duplicate_groups,
        files_to_move,
        summary: Some(summary),
    })
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "worker panicked".to_string()
    }
}

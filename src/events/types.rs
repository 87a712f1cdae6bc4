//! Event type definitions for progress reporting.
//!
//! Events serialize to the JSON shape pushed to clients:
//! `{"type": "scan_progress", "scanId": "...", ...}`.

use crate::core::pipeline::{MoveSummary, Progress, ScanId, ScanPhase, ScanResults};
use serde::{Deserialize, Serialize};

/// All events emitted while scanning and moving
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// A scan entered a phase or advanced within one
    #[serde(rename_all = "camelCase")]
    ScanProgress {
        scan_id: ScanId,
        phase: ScanPhase,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        progress: Option<Progress>,
    },
    /// A scan finished and its results are available
    #[serde(rename_all = "camelCase")]
    ScanComplete {
        scan_id: ScanId,
        results: ScanResults,
    },
    /// A scan aborted
    #[serde(rename_all = "camelCase")]
    ScanError { scan_id: ScanId, error: String },
    /// One file of a move was processed
    #[serde(rename_all = "camelCase")]
    MoveProgress {
        scan_id: ScanId,
        progress: Progress,
        message: String,
        success: bool,
    },
    /// Every file of a move was processed
    #[serde(rename_all = "camelCase")]
    MoveComplete {
        scan_id: ScanId,
        results: MoveSummary,
    },
}

impl Event {
    /// The scan this event belongs to
    pub fn scan_id(&self) -> ScanId {
        match self {
            Event::ScanProgress { scan_id, .. }
            | Event::ScanComplete { scan_id, .. }
            | Event::ScanError { scan_id, .. }
            | Event::MoveProgress { scan_id, .. }
            | Event::MoveComplete { scan_id, .. } => *scan_id,
        }
    }

    /// Wire name of this event
    pub fn kind(&self) -> &'static str {
        match self {
            Event::ScanProgress { .. } => "scan_progress",
            Event::ScanComplete { .. } => "scan_complete",
            Event::ScanError { .. } => "scan_error",
            Event::MoveProgress { .. } => "move_progress",
            Event::MoveComplete { .. } => "move_complete",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn progress_event_uses_wire_names() {
        let scan_id = ScanId::new();
        let event = Event::ScanProgress {
            scan_id,
            phase: ScanPhase::Analyzing,
            message: Some("Analyzing: a.mkv".to_string()),
            progress: Some(Progress {
                current: 5,
                total: 10,
                percentage: 50,
            }),
        };

        let json = serde_json::to_value(&event).unwrap();

        assert_eq!(json["type"], "scan_progress");
        assert_eq!(json["scanId"], scan_id.to_string());
        assert_eq!(json["phase"], "analyzing");
        assert_eq!(json["progress"]["percentage"], 50);
    }

    #[test]
    fn optional_fields_are_omitted() {
        let event = Event::ScanProgress {
            scan_id: ScanId::new(),
            phase: ScanPhase::Discovering,
            message: None,
            progress: None,
        };

        let json = serde_json::to_value(&event).unwrap();

        assert!(json.get("message").is_none());
        assert!(json.get("progress").is_none());
    }

    #[test]
    fn events_round_trip() {
        let scan_id = ScanId::new();
        let event = Event::ScanError {
            scan_id,
            error: "disk vanished".to_string(),
        };

        let json = serde_json::to_string(&event).unwrap();
        let back: Event = serde_json::from_str(&json).unwrap();

        match back {
            Event::ScanError { scan_id: id, error } => {
                assert_eq!(id, scan_id);
                assert_eq!(error, "disk vanished");
            }
            _ => panic!("Wrong event type"),
        }
        assert_eq!(event.kind(), "scan_error");
    }
}

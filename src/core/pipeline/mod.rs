//! # Pipeline Module
//!
//! Owns scan records and drives the scan and move workflows.
//!
//! ## Scan Phases
//! 1. **Discovering** - Walk the source tree for video files
//! 2. **Discovered** - Report how many files were found
//! 3. **Analyzing** - Probe each file, one at a time
//! 4. **Grouping** - Bucket by duration and resolution, pick keepers
//! 5. **Complete** - Results stored on the scan record
//!
//! Any failure along the way ends the scan with status `error`.
//!
//! ## Threading
//! Each accepted scan or move runs on its own named thread. A scan record has a
//! single writer (its worker); polling takes a consistent snapshot.

mod mover;
mod orchestrator;
mod registry;
mod scan;
mod types;

pub use orchestrator::{OrchestratorBuilder, ScanOrchestrator};
pub use registry::{ScanRegistry, ScanWriter};
pub use scan::PROGRESS_EVERY;
pub use types::{
    MoveSummary, MoveTicket, Progress, ScanId, ScanListing, ScanPhase, ScanRecord, ScanResults,
    ScanStatus,
};

//! # Core Module
//!
//! The UI-agnostic duplicate video engine.
//!
//! ## Modules
//! - `scanner` - Discovers video files in a directory tree
//! - `metadata` - Extracts duration and resolution with ffprobe
//! - `comparator` - Groups videos that share duration and resolution
//! - `relocate` - Moves extras into a mirrored cleanup tree
//! - `pipeline` - Owns scan records and drives scans and moves
//! - `units` - Rounding and size conversions shared by the above

pub mod comparator;
pub mod metadata;
pub mod pipeline;
pub mod relocate;
pub mod scanner;
pub mod units;

// Re-export commonly used types
pub use comparator::{DuplicateGroup, DuplicateGrouper, FileToMove, Summary};
pub use metadata::{FfprobeExtractor, MetadataExtractor, VideoMetadata};
pub use pipeline::{ScanId, ScanOrchestrator, ScanPhase, ScanRecord, ScanStatus};
pub use relocate::{FileRelocator, MoveResult};
pub use scanner::{ScanConfig, WalkDirDiscoverer};

//! # Error Module
//!
//! Error types for the duplicate video cleaner.
//!
//! ## Design Principles
//! - **Never panic** on user data - return errors instead
//! - **Include context** - paths, file names, what went wrong
//! - **Per-file failures are values** - a bad file never aborts a batch

use std::path::PathBuf;
use thiserror::Error;

/// Top-level application error
#[derive(Error, Debug)]
pub enum VideoDedupError {
    #[error("Scanning error: {0}")]
    Scan(#[from] ScanError),

    #[error("Metadata extraction error: {0}")]
    Probe(#[from] ProbeError),

    #[error("Relocation error: {0}")]
    Relocate(#[from] RelocateError),

    #[error("Move request rejected: {0}")]
    Move(#[from] MoveError),

    #[error("Scan failed: {0}")]
    ScanFailed(String),

    #[error("Event stream closed before the {0} finished")]
    EventStreamClosed(&'static str),

    #[error("Failed to encode output: {0}")]
    Output(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors that occur while validating a scan request or discovering files
#[derive(Error, Debug)]
pub enum ScanError {
    #[error("Directory not found: {path}")]
    DirectoryNotFound { path: PathBuf },

    #[error("Not a directory: {path}")]
    NotADirectory { path: PathBuf },

    #[error("Permission denied accessing: {path}")]
    PermissionDenied { path: PathBuf },

    #[error("Failed to read directory {path}: {source}")]
    ReadDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to start scan worker: {0}")]
    Spawn(#[source] std::io::Error),
}

/// Errors from a single ffprobe invocation
#[derive(Error, Debug)]
pub enum ProbeError {
    #[error("Failed to run {program}: {source}")]
    Spawn {
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("ffprobe exited with {status}: {stderr}")]
    Failed { status: String, stderr: String },

    #[error("Failed to extract metadata")]
    EmptyOutput,

    #[error("Unreadable ffprobe output: {0}")]
    InvalidOutput(#[from] serde_json::Error),

    #[error("No video stream found")]
    NoVideoStream,

    #[error("ffprobe did not finish within {seconds}s")]
    TimedOut { seconds: u64 },

    #[error("I/O error while probing: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors that occur while relocating one file
#[derive(Error, Debug)]
pub enum RelocateError {
    #[error("{path} is not inside {base}")]
    NotUnderBase { path: PathBuf, base: PathBuf },

    #[error("{path} has no file name")]
    NoFileName { path: PathBuf },

    #[error("Source file unavailable {path}: {source}")]
    SourceUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Destination already exists: {path}")]
    DestinationExists { path: PathBuf },

    #[error("Failed to create directory {path}: {source}")]
    CreateDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to rename {from} to {to}: {source}")]
    Rename {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to copy {from} to {to}: {source}")]
    Copy {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Copy verification failed for {path}: source {expected} bytes, copy {actual} bytes")]
    CopyVerification {
        path: PathBuf,
        expected: u64,
        actual: u64,
    },

    #[error("Copied to {copy} but failed to remove source {path}: {source}")]
    RemoveSource {
        path: PathBuf,
        copy: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Reasons a move request is refused before any file is touched
#[derive(Error, Debug)]
pub enum MoveError {
    #[error("Scan not found: {id}")]
    ScanNotFound { id: String },

    #[error("Scan {id} has no results available")]
    NoResults { id: String },

    #[error("No files to move")]
    NothingToMove,

    #[error("No matching files found to move")]
    NoMatchingFiles,

    #[error("Cannot create cleanup directory {path}: {source}")]
    CleanupDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to start move worker: {0}")]
    Spawn(#[source] std::io::Error),
}

/// Convenience Result type alias
pub type Result<T> = std::result::Result<T, VideoDedupError>;

//! # Duplicate Video Cleaner
//!
//! Finds duplicate videos (same duration and resolution) in a directory tree and
//! moves every copy except the largest into a cleanup folder.
//!
//! ## Core Philosophy
//! - **Never delete** - extras are moved aside, mirroring their original layout
//! - **Keep the best copy** - the largest file in each group stays put
//! - **Report everything** - progress and failures flow through the event stream
//!
//! ## Architecture
//! - `core` - discovery, metadata extraction, grouping, relocation and orchestration
//! - `events` - progress events and the broadcast bus that delivers them
//! - `error` - typed errors for every stage

pub mod core;
pub mod error;
pub mod events;

// Re-export commonly used types at the crate root
pub use error::{Result, VideoDedupError};

/// Install a `tracing` subscriber for the process.
///
/// `RUST_LOG` takes precedence over `default_directive`. Calling this twice is harmless;
/// the second call leaves the first subscriber in place.
pub fn init_tracing(default_directive: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_directive));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

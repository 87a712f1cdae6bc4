//! # Events Module
//!
//! Progress reporting decoupled from any transport.
//!
//! ## Design
//! The core only calls [`EventSink::emit`]. [`EventBus`] fans each event out to
//! every subscriber (CLI, web socket bridge, tests) without ever blocking.
//!
//! ## Example
//! ```rust,ignore
//! let bus = EventBus::new();
//! let receiver = bus.subscribe();
//!
//! let orchestrator = ScanOrchestrator::builder().events(bus.clone()).build();
//! let scan_id = orchestrator.start_scan("/mnt/media", true)?;
//!
//! for event in receiver.iter() {
//!     match event {
//!         Event::ScanProgress { phase, .. } => println!("{phase}"),
//!         Event::ScanComplete { .. } | Event::ScanError { .. } => break,
//!         _ => {}
//!     }
//! }
//! ```

mod channel;
mod types;

pub use channel::{null_sink, EventBus, EventReceiver, EventSink};
pub use types::*;

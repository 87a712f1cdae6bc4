//! Broadcast bus built on crossbeam-channel.
//!
//! Delivery is at-most-once with no back-pressure: emitting never blocks the
//! core. A subscriber whose bounded buffer is full misses that event, and a
//! subscriber whose receiver was dropped is removed on the next emit.

use crossbeam_channel::{bounded, unbounded, Receiver, RecvTimeoutError, Sender, TrySendError};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tracing::trace;

use super::Event;

/// Where the core publishes events.
///
/// Implementations must return promptly; a slow consumer must not stall a scan.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: Event);
}

/// Fan-out publisher that delivers every event to all current subscribers.
///
/// Cloning yields another handle to the same subscriber list.
#[derive(Clone, Default)]
pub struct EventBus {
    subscribers: Arc<Mutex<Vec<Sender<Event>>>>,
}

impl EventBus {
    /// Create a bus with no subscribers
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe with an unbounded buffer.
    ///
    /// Only events emitted after this call are received.
    pub fn subscribe(&self) -> EventReceiver {
        let (sender, receiver) = unbounded();
        self.add(sender);
        EventReceiver { inner: receiver }
    }

    /// Subscribe with a buffer of `capacity` events; overflow is dropped.
    pub fn subscribe_bounded(&self, capacity: usize) -> EventReceiver {
        let (sender, receiver) = bounded(capacity);
        self.add(sender);
        EventReceiver { inner: receiver }
    }

    /// Number of live subscribers
    pub fn subscriber_count(&self) -> usize {
        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    fn add(&self, sender: Sender<Event>) {
        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(sender);
    }
}

impl EventSink for EventBus {
    fn emit(&self, event: Event) {
        let mut subscribers = self
            .subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        subscribers.retain(|sender| match sender.try_send(event.clone()) {
            Ok(()) => true,
            Err(TrySendError::Full(dropped)) => {
                trace!(kind = dropped.kind(), "Subscriber buffer full, dropping event");
                true
            }
            Err(TrySendError::Disconnected(_)) => false,
        });
    }
}

/// Receives events from the bus.
///
/// Used by UI layers to subscribe to progress updates.
pub struct EventReceiver {
    inner: Receiver<Event>,
}

impl EventReceiver {
    /// Block until the next event is received
    pub fn recv(&self) -> Option<Event> {
        self.inner.recv().ok()
    }

    /// Wait up to `timeout` for the next event
    pub fn recv_timeout(&self, timeout: Duration) -> Option<Event> {
        match self.inner.recv_timeout(timeout) {
            Ok(event) => Some(event),
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => None,
        }
    }

    /// Try to receive an event without blocking
    pub fn try_recv(&self) -> Option<Event> {
        self.inner.try_recv().ok()
    }

    /// Returns an iterator over received events
    pub fn iter(&self) -> impl Iterator<Item = Event> + '_ {
        self.inner.iter()
    }
}

/// A sink that discards everything.
///
/// This is useful for tests or when running without a UI.
pub fn null_sink() -> Arc<dyn EventSink> {
    Arc::new(EventBus::new())
}

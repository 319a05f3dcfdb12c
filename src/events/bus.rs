//! # Event bus for broadcasting lifecycle events.
//!
//! [`Bus`] wraps [`tokio::sync::broadcast`] so that lifecycle operations on any node can
//! publish without blocking, including from inside a node's critical section.
//!
//! ## Architecture
//! ```text
//! Publishers (many):                      Subscriber (one):
//!   start task (node B) ──┐
//!   start task (node C) ──┼──► Bus ──► supervisor listener ──► SubscriberSet
//!   stop / restart      ──┤  (broadcast)
//!   shutdown            ──┘
//! ```
//!
//! ## Rules
//! - **Non-blocking publish**: `publish()` never blocks.
//! - **Bounded capacity**: slow receivers get `RecvError::Lagged(n)` and skip `n` items.
//! - **No persistence**: events are dropped if nobody is subscribed.

use tokio::sync::broadcast;

use super::event::Event;

/// Broadcast channel for lifecycle events.
///
/// Cloneable; every clone publishes into the same channel.
#[derive(Clone, Debug)]
pub struct Bus {
    tx: broadcast::Sender<Event>,
}

impl Bus {
    /// Creates a new bus; `capacity` is clamped to at least 1.
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel::<Event>(capacity.max(1));
        Self { tx }
    }

    /// Publishes an event to all active receivers (dropped if there are none).
    pub fn publish(&self, ev: Event) {
        let _ = self.tx.send(ev);
    }

    /// Creates a receiver that observes events sent after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.tx.subscribe()
    }
}

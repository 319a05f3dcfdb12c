//! # Event subscriber trait.
//!
//! Each subscriber gets a dedicated worker task and a bounded queue; a panic in
//! `on_event` is caught and reported as `EventKind::SubscriberPanicked`.
//!
//! ## Example
//! ```rust
//! use async_trait::async_trait;
//! use pepvisor::{Event, EventKind, Subscribe};
//!
//! struct FailureCounter;
//!
//! #[async_trait]
//! impl Subscribe for FailureCounter {
//!     async fn on_event(&self, ev: &Event) {
//!         if matches!(ev.kind, EventKind::NodeStartFailed) {
//!             // bump a counter, page someone, ...
//!         }
//!     }
//!
//!     fn name(&self) -> &'static str { "failures" }
//! }
//! ```

use async_trait::async_trait;

use crate::events::Event;

/// Observer of lifecycle events.
///
/// ### Implementation requirements
/// - Use async I/O; avoid blocking the executor.
/// - Handle errors internally; do not panic.
/// - Slow processing only fills this subscriber's own queue.
#[async_trait]
pub trait Subscribe: Send + Sync + 'static {
    /// Processes a single event (FIFO per subscriber).
    async fn on_event(&self, event: &Event);

    /// Name used in overflow/panic reports.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Queue capacity for this subscriber (clamped to at least 1).
    fn queue_capacity(&self) -> usize {
        256
    }
}

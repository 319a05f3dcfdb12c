//! # Lifecycle events emitted by the supervisor.
//!
//! The [`EventKind`] enum classifies events across three categories:
//! - **Node lifecycle**: a start dispatched, committed, failed or skipped; a stop
//! - **Shutdown**: waiting for in-flight operations
//! - **Subscriber health**: overflow and panics in subscriber workers
//!
//! ## Ordering guarantees
//! Each event carries a process-wide monotonic `seq`. Events for the same node are
//! published from inside that node's critical section, so their `seq` order matches
//! the order of the status transitions.
//!
//! ## Example
//! ```rust
//! use pepvisor::{Event, EventKind};
//!
//! let ev = Event::new(EventKind::NodeStartFailed)
//!     .with_node("B")
//!     .with_reason("node nodeB not found");
//!
//! assert_eq!(ev.kind, EventKind::NodeStartFailed);
//! assert_eq!(ev.reason.as_deref(), Some("node nodeB not found"));
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::SystemTime;

use crate::locator::ExecContext;
use crate::nodes::NodeKey;

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of runtime events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === Node lifecycle ===
    /// Start (or restart) dispatched; the node is now `Starting`.
    ///
    /// Sets: `node`, `reason` (`"start"` or `"restart"`).
    NodeStarting,

    /// Start request ignored: the node was already `Running` or already starting.
    ///
    /// Sets: `node`, `reason`.
    StartSkipped,

    /// Operation result dropped because a later request took the node over.
    ///
    /// Sets: `node`, `reason` (`"start"`, `"stop"` or `"restart"`).
    Superseded,

    /// Proxy launched; the node is now `Running`.
    ///
    /// Sets: `node`, `pid` (execution context used).
    NodeRunning,

    /// Start attempt failed; the node is back to `Stopped`.
    ///
    /// Sets: `node`, `reason`.
    NodeStartFailed,

    /// Termination signalled; the node is marked `Stopped` (optimistically).
    ///
    /// Sets: `node`, `pid`.
    NodeStopped,

    /// Termination could not be signalled; the node is still marked `Stopped`.
    ///
    /// Sets: `node`, `reason`.
    NodeStopFailed,

    // === Shutdown ===
    /// Shutdown requested; waiting for in-flight operations.
    ShutdownRequested,

    /// Every in-flight operation finished within the grace period.
    AllSettled,

    /// Grace period exceeded; `reason` lists busy nodes.
    GraceExceeded,

    // === Subscribers ===
    /// Subscriber dropped an event (queue full or worker closed).
    ///
    /// Sets: `reason` (`subscriber=<name> reason=<full|closed>`).
    SubscriberOverflow,

    /// Subscriber panicked while handling an event.
    ///
    /// Sets: `reason` (panic message).
    SubscriberPanicked,
}

/// Runtime event with optional metadata.
#[derive(Clone, Debug)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,
    /// Node the event is about, if any.
    pub node: Option<NodeKey>,
    /// Pid of the execution context used, if any.
    pub pid: Option<u32>,
    /// Human-readable reason (errors, overflow details, etc.).
    pub reason: Option<Arc<str>>,
}

impl Event {
    /// Creates a new event with current timestamp and next sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            node: None,
            pid: None,
            reason: None,
        }
    }

    #[inline]
    pub fn with_node(mut self, node: impl Into<NodeKey>) -> Self {
        self.node = Some(node.into());
        self
    }

    #[inline]
    pub fn with_ctx(mut self, ctx: ExecContext) -> Self {
        self.pid = Some(ctx.pid);
        self
    }

    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Creates a subscriber overflow event.
    #[inline]
    pub fn subscriber_overflow(subscriber: &'static str, reason: &'static str) -> Self {
        Event::new(EventKind::SubscriberOverflow)
            .with_reason(format!("subscriber={subscriber} reason={reason}"))
    }

    /// Creates a subscriber panic event.
    #[inline]
    pub fn subscriber_panicked(subscriber: &'static str, info: String) -> Self {
        Event::new(EventKind::SubscriberPanicked)
            .with_reason(format!("subscriber={subscriber} info={info}"))
    }
}

//! # LogWriter: lifecycle events to `tracing`
//!
//! Maps each [`Event`] to one structured `tracing` record. Install a
//! `tracing-subscriber` (the binary does) to see them.
//!
//! ## Example output
//! ```text
//! INFO node=B reason="start" starting
//! INFO node=B pid=4242 proxy running
//! WARN node=C reason="node nodeC not found: ..." start failed
//! INFO node=B pid=4242 proxy stopped
//! ```

use async_trait::async_trait;
use tracing::{debug, error, info, warn};

use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;

/// Event writer subscriber.
#[derive(Default)]
pub struct LogWriter;

impl LogWriter {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Event) {
        let node = e.node.as_ref().map(|k| k.as_str()).unwrap_or("-");
        let reason = e.reason.as_deref().unwrap_or("");
        match e.kind {
            EventKind::NodeStarting => info!(node, reason, seq = e.seq, "starting"),
            EventKind::StartSkipped => debug!(node, reason, seq = e.seq, "start skipped"),
            EventKind::Superseded => debug!(node, op = reason, seq = e.seq, "superseded"),
            EventKind::NodeRunning => info!(node, pid = ?e.pid, seq = e.seq, "proxy running"),
            EventKind::NodeStartFailed => warn!(node, reason, seq = e.seq, "start failed"),
            EventKind::NodeStopped => info!(node, pid = ?e.pid, seq = e.seq, "proxy stopped"),
            EventKind::NodeStopFailed => warn!(node, reason, seq = e.seq, "stop failed"),
            EventKind::ShutdownRequested => info!("shutdown requested"),
            EventKind::AllSettled => info!("all operations settled"),
            EventKind::GraceExceeded => error!(busy = reason, "grace exceeded"),
            EventKind::SubscriberOverflow => warn!(reason, "subscriber overflow"),
            EventKind::SubscriberPanicked => error!(reason, "subscriber panicked"),
        }
    }

    fn name(&self) -> &'static str {
        "log"
    }

    fn queue_capacity(&self) -> usize {
        1024
    }
}

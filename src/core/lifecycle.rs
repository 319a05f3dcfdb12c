//! # Lifecycle state machine for one node.
//!
//! ```text
//!            start (dispatch)          launch ok
//! Stopped ───────────────────► Starting ─────────► Running
//!    ▲                            │                   │
//!    │        launch/resolve err  │                   │
//!    ├────────────────────────────┘                   │
//!    │                  stop (optimistic)             │
//!    └────────────────────────────────────────────────┘
//! ```
//!
//! ## Operations
//! - **start**: no-op when `Running` or when a start is already pending. Otherwise
//!   marks `Starting` before returning and spawns the async path:
//!   resolve → launch → commit `Running` or `Stopped`.
//! - **stop**: resolve → terminate → commit `Stopped`. There is no `Stopping` state:
//!   the record says `Stopped` as soon as the signal is *sent*, whether or not the
//!   proxy has exited yet (or even existed). Failures only change the message.
//!   Never waits for a pending start.
//! - **restart**: stop, then a forced start claimed in the same write as the stop's
//!   commit. A node that was `Running` finishes with the "restarted" message; any
//!   other node finishes like a plain start.
//!
//! ## Ordering
//! Each request claims a new epoch on the slot when it is made. Lookups run
//! unlocked; the launch/terminate spawn runs under the slot's `act` mutex.
//! - A start launches and commits only while its epoch is current, so a later stop
//!   or restart abandons it wherever it is (even stuck in the lookup).
//! - A terminate is skipped when a later request has already spawned, so it never
//!   kills a proxy launched after it was asked for.
//! - A launch is skipped when a proxy launched earlier was never terminated.
//! - A stop or restart whose epoch moved on commits nothing: the later request
//!   owns the record.
//!
//! No retries: a failed attempt leaves `Stopped` plus the cause in the message.

use std::sync::Arc;

use crate::core::table::{NodeSlot, NodeState, NodeStatus};
use crate::error::NodeError;
use crate::events::{Bus, Event, EventKind};
use crate::launcher::ProcessLauncher;
use crate::locator::{ExecContext, NodeLocator};

pub const MSG_STARTING: &str = "starting...";
pub const MSG_RESTARTING: &str = "restarting...";
pub const MSG_STARTED: &str = "proxy running";
pub const MSG_RESTARTED: &str = "restarted, proxy running";
pub const MSG_STOPPED: &str = "proxy stopped";

/// Transition logic shared by every node; the node's state lives in the [`NodeSlot`]
/// passed to each call.
#[derive(Clone)]
pub(crate) struct Lifecycle {
    locator: Arc<dyn NodeLocator>,
    launcher: Arc<dyn ProcessLauncher>,
    bus: Bus,
}

impl Lifecycle {
    pub fn new(locator: Arc<dyn NodeLocator>, launcher: Arc<dyn ProcessLauncher>, bus: Bus) -> Self {
        Self {
            locator,
            launcher,
            bus,
        }
    }

    /// Starts a node unless it is running or already starting.
    ///
    /// Returns `true` if a start was dispatched. `Starting` is visible on return.
    pub fn start(&self, slot: &Arc<NodeSlot>) -> bool {
        let mut st = slot.write();
        let skip = if st.state == NodeState::Running {
            Some("already running")
        } else if st.start_pending {
            Some("already starting")
        } else {
            None
        };
        if let Some(why) = skip {
            drop(st);
            self.publish_skipped(slot, why);
            return false;
        }

        let epoch = st.claim();
        self.mark_starting(slot, &mut st, MSG_STARTING, "start");
        drop(st);
        self.dispatch(slot, epoch);
        true
    }

    /// Stops a node. Unless a later request took the node over meanwhile, it is
    /// `Stopped` when this returns.
    pub async fn stop(&self, slot: &Arc<NodeSlot>) {
        let epoch = slot.write().claim();
        let outcome = self.terminate(slot, epoch).await;

        let mut st = slot.write();
        if !st.is_current(epoch) {
            drop(st);
            self.publish_superseded(slot, "stop");
            return;
        }
        self.commit_stopped(slot, &mut st, outcome);
    }

    /// Stops the node, then dispatches a forced start (flagged as a restart when the
    /// node was running).
    pub async fn restart(&self, slot: &Arc<NodeSlot>) {
        let (epoch, was_running) = {
            let mut st = slot.write();
            let was_running = st.state == NodeState::Running;
            (st.claim(), was_running)
        };
        let outcome = self.terminate(slot, epoch).await;

        let mut st = slot.write();
        if !st.is_current(epoch) {
            drop(st);
            self.publish_superseded(slot, "restart");
            return;
        }
        self.commit_stopped(slot, &mut st, outcome);
        let next = st.claim();
        st.pending_restart = was_running;
        self.mark_starting(slot, &mut st, MSG_RESTARTING, "restart");
        drop(st);
        self.dispatch(slot, next);
    }

    fn mark_starting(&self, slot: &NodeSlot, st: &mut NodeStatus, message: &str, why: &'static str) {
        st.start_pending = true;
        st.set(NodeState::Starting, message);
        self.bus.publish(
            Event::new(EventKind::NodeStarting)
                .with_node(slot.key().clone())
                .with_reason(why),
        );
    }

    fn dispatch(&self, slot: &Arc<NodeSlot>, epoch: u64) {
        let me = self.clone();
        let task_slot = Arc::clone(slot);
        let handle = tokio::spawn(async move { me.run_start(&task_slot, epoch).await });
        slot.track(handle);
    }

    /// Asynchronous half of a start.
    async fn run_start(&self, slot: &NodeSlot, epoch: u64) {
        let outcome = self.launch(slot, epoch).await;

        let mut st = slot.write();
        if !st.is_current(epoch) {
            drop(st);
            self.publish_superseded(slot, "start");
            return;
        }
        match outcome {
            Ok(ctx) => {
                let message = if st.pending_restart {
                    MSG_RESTARTED
                } else {
                    MSG_STARTED
                };
                st.set(NodeState::Running, message);
                self.bus.publish(
                    Event::new(EventKind::NodeRunning)
                        .with_node(slot.key().clone())
                        .with_ctx(ctx),
                );
            }
            Err(e) => {
                st.set(NodeState::Stopped, format!("start failed: {e}"));
                self.bus.publish(
                    Event::new(EventKind::NodeStartFailed)
                        .with_node(slot.key().clone())
                        .with_reason(e.to_string()),
                );
            }
        }
        st.start_pending = false;
        st.pending_restart = false;
    }

    /// Resolves the node and launches its proxy, unless `epoch` is no longer current
    /// or a proxy launched earlier was never terminated.
    async fn launch(&self, slot: &NodeSlot, epoch: u64) -> Result<ExecContext, NodeError> {
        let ctx = self.locator.resolve(slot.key()).await?;
        let mut act = slot.act.lock().await;
        let current = slot.read().is_current(epoch);
        if current {
            act.last = epoch;
            if !act.live {
                self.launcher.launch(ctx, slot.spec()).await?;
                act.live = true;
            }
        }
        Ok(ctx)
    }

    /// Resolves the node and signals its proxy, unless a later request already spawned.
    ///
    /// The proxy counts as gone once a terminate was attempted, even a failed one.
    async fn terminate(&self, slot: &NodeSlot, epoch: u64) -> Result<ExecContext, NodeError> {
        let resolved = self.locator.resolve(slot.key()).await;
        let mut act = slot.act.lock().await;
        if act.last >= epoch {
            return resolved;
        }
        act.last = epoch;
        act.live = false;
        let ctx = resolved?;
        self.launcher
            .terminate(ctx, slot.spec().proxy_pattern())
            .await?;
        Ok(ctx)
    }

    fn commit_stopped(
        &self,
        slot: &NodeSlot,
        st: &mut NodeStatus,
        outcome: Result<ExecContext, NodeError>,
    ) {
        match outcome {
            Ok(ctx) => {
                st.set(NodeState::Stopped, MSG_STOPPED);
                self.bus.publish(
                    Event::new(EventKind::NodeStopped)
                        .with_node(slot.key().clone())
                        .with_ctx(ctx),
                );
            }
            Err(e) => {
                st.set(NodeState::Stopped, format!("stop failed: {e}"));
                self.bus.publish(
                    Event::new(EventKind::NodeStopFailed)
                        .with_node(slot.key().clone())
                        .with_reason(e.to_string()),
                );
            }
        }
    }

    fn publish_skipped(&self, slot: &NodeSlot, why: &'static str) {
        self.bus.publish(
            Event::new(EventKind::StartSkipped)
                .with_node(slot.key().clone())
                .with_reason(why),
        );
    }

    fn publish_superseded(&self, slot: &NodeSlot, op: &'static str) {
        self.bus.publish(
            Event::new(EventKind::Superseded)
                .with_node(slot.key().clone())
                .with_reason(op),
        );
    }
}

//! # Supervisor: the façade callers talk to.
//!
//! The [`Supervisor`] owns the status table, the event bus and the subscriber
//! listener, and fans "all nodes" requests out to the per-node lifecycle.
//!
//! ## High-level architecture
//! ```text
//! caller ──► start_all() ──┬─► lifecycle.start(slot B) ──► spawn(resolve → launch → commit)
//!                          └─► lifecycle.start(slot C) ──► spawn(...)
//!        ──► stop_all()  ──► join_all(lifecycle.stop(slot)...)      (returns when all Stopped)
//!        ──► restart_all() ─► join_all(lifecycle.restart(slot)...)  (stop + dispatch)
//!        ──► snapshot()  ──► read guards only, never waits
//!
//! lifecycle ── publish(Event) ──► Bus ──► listener ──► SubscriberSet ──► LogWriter, ...
//!
//! shutdown():
//!   publish(ShutdownRequested)
//!   wait in-flight within cfg.grace ─┬─ Ok      → publish(AllSettled)
//!                                    └─ timeout → publish(GraceExceeded), Err(GraceExceeded)
//!   cancel listener, drain subscribers
//! ```
//!
//! ## Example
//! ```rust,no_run
//! use pepvisor::{Supervisor, SupervisorConfig};
//!
//! # async fn demo() -> Result<(), pepvisor::SupervisorError> {
//! let sup = Supervisor::builder(SupervisorConfig::default()).build();
//! sup.start_all();
//! sup.settle().await;
//! for (node, status) in sup.snapshot() {
//!     println!("{node}: {:?} {}", status.state, status.message);
//! }
//! sup.shutdown().await
//! # }
//! ```

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, PoisonError};

use futures::future::join_all;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::core::builder::SupervisorBuilder;
use crate::core::config::SupervisorConfig;
use crate::core::lifecycle::Lifecycle;
use crate::core::table::{NodeSlot, NodeSnapshot, StatusTable};
use crate::error::SupervisorError;
use crate::events::{Bus, Event, EventKind};
use crate::nodes::NodeKey;
use crate::subscribers::SubscriberSet;

/// Lifecycle supervisor for the proxies of a fixed set of nodes.
pub struct Supervisor {
    cfg: SupervisorConfig,
    bus: Bus,
    table: StatusTable,
    lifecycle: Lifecycle,
    runtime_token: CancellationToken,
    listener: Mutex<Option<JoinHandle<()>>>,
}

impl Supervisor {
    /// Returns a builder with the default `pgrep`/`mnexec` primitives.
    pub fn builder(cfg: SupervisorConfig) -> SupervisorBuilder {
        SupervisorBuilder::new(cfg)
    }

    pub(crate) fn new_internal(
        cfg: SupervisorConfig,
        bus: Bus,
        lifecycle: Lifecycle,
        subs: SubscriberSet,
    ) -> Self {
        let table = StatusTable::new(cfg.nodes.iter().cloned());
        let runtime_token = CancellationToken::new();
        let listener = Self::spawn_listener(&bus, subs, runtime_token.clone());
        Self {
            cfg,
            bus,
            table,
            lifecycle,
            runtime_token,
            listener: Mutex::new(Some(listener)),
        }
    }

    /// Forwards bus events to the subscriber set until cancelled, then drains it.
    fn spawn_listener(bus: &Bus, subs: SubscriberSet, token: CancellationToken) -> JoinHandle<()> {
        let mut rx = bus.subscribe();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    msg = rx.recv() => match msg {
                        Ok(ev) => subs.emit(ev),
                        Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
                        Err(tokio::sync::broadcast::error::RecvError::Lagged(n)) => {
                            subs.emit(Event::subscriber_overflow("listener", "lagged"));
                            tracing::warn!(skipped = n, "event listener lagged");
                        }
                    }
                }
            }
            while let Ok(ev) = rx.try_recv() {
                subs.emit(ev);
            }
            subs.shutdown().await;
        })
    }

    /// Returns the configuration this supervisor was built with.
    pub fn config(&self) -> &SupervisorConfig {
        &self.cfg
    }

    /// Returns the event bus (subscribe to observe transitions directly).
    pub fn bus(&self) -> &Bus {
        &self.bus
    }

    /// Returns the managed node keys in order.
    pub fn nodes(&self) -> Vec<NodeKey> {
        self.table.keys()
    }

    /// Starts every node that is not `Running`.
    ///
    /// Each dispatched node is `Starting` when this returns; launches complete in
    /// the background and are only observable through [`snapshot`](Self::snapshot).
    /// Returns the number of nodes dispatched.
    pub fn start_all(&self) -> usize {
        let mut dispatched = 0;
        for slot in self.table.slots() {
            if self.lifecycle.start(slot) {
                dispatched += 1;
            }
        }
        dispatched
    }

    /// Stops every node; every node is `Stopped` when this returns.
    pub async fn stop_all(&self) {
        join_all(self.table.slots().map(|slot| self.lifecycle.stop(slot))).await;
    }

    /// Stops every node and dispatches a fresh start for each, regardless of state.
    ///
    /// Nodes that were `Running` finish with the "restarted" message; the others
    /// finish like a plain start.
    pub async fn restart_all(&self) {
        join_all(self.table.slots().map(|slot| self.lifecycle.restart(slot))).await;
    }

    /// Starts one node; `Ok(false)` if it was already running.
    pub fn start(&self, key: &str) -> Result<bool, SupervisorError> {
        Ok(self.lifecycle.start(self.slot(key)?))
    }

    /// Stops one node.
    pub async fn stop(&self, key: &str) -> Result<(), SupervisorError> {
        self.lifecycle.stop(self.slot(key)?).await;
        Ok(())
    }

    /// Restarts one node.
    pub async fn restart(&self, key: &str) -> Result<(), SupervisorError> {
        self.lifecycle.restart(self.slot(key)?).await;
        Ok(())
    }

    /// Returns the committed status of one node.
    pub fn status(&self, key: &str) -> Result<NodeSnapshot, SupervisorError> {
        Ok(self.slot(key)?.snapshot())
    }

    /// Returns the committed status of every node. Never waits on operations.
    pub fn snapshot(&self) -> BTreeMap<NodeKey, NodeSnapshot> {
        self.table.snapshot()
    }

    /// Waits until every operation dispatched so far has completed.
    pub async fn settle(&self) {
        self.settle_until(None).await;
    }

    /// Joins dispatched operations until none is left or `deadline` passes.
    ///
    /// Returns the nodes whose operations were still running at the deadline; their
    /// handles go back into the slots so a later `settle` still waits for them.
    async fn settle_until(&self, deadline: Option<Instant>) -> Vec<String> {
        loop {
            let mut pending: Vec<(&Arc<NodeSlot>, JoinHandle<()>)> = self
                .table
                .slots()
                .flat_map(|slot| slot.take_in_flight().into_iter().map(move |h| (slot, h)))
                .collect();
            if pending.is_empty() {
                return Vec::new();
            }

            let joined = join_all(pending.iter_mut().map(|(_, h)| h));
            let outcome = match deadline {
                Some(deadline) => tokio::time::timeout_at(deadline, joined).await.ok(),
                None => Some(joined.await),
            };
            let Some(results) = outcome else {
                return Self::restore_unfinished(pending);
            };
            for res in results {
                if let Err(e) = res {
                    tracing::error!(error = %e, "lifecycle task panicked");
                }
            }
        }
    }

    fn restore_unfinished(pending: Vec<(&Arc<NodeSlot>, JoinHandle<()>)>) -> Vec<String> {
        let mut busy: Vec<String> = Vec::new();
        for (slot, h) in pending {
            if h.is_finished() {
                continue;
            }
            let key = slot.key().to_string();
            if !busy.contains(&key) {
                busy.push(key);
            }
            slot.restore_in_flight([h]);
        }
        busy
    }

    /// Waits for in-flight operations (up to the configured grace) and stops the
    /// event listener. Proxies are left running; call [`stop_all`](Self::stop_all)
    /// first to take them down.
    pub async fn shutdown(&self) -> Result<(), SupervisorError> {
        self.bus.publish(Event::new(EventKind::ShutdownRequested));

        let res = match self.cfg.grace_limit() {
            Some(grace) => {
                let busy = self.settle_until(Some(Instant::now() + grace)).await;
                if busy.is_empty() {
                    self.bus.publish(Event::new(EventKind::AllSettled));
                    Ok(())
                } else {
                    self.bus.publish(
                        Event::new(EventKind::GraceExceeded).with_reason(busy.join(",")),
                    );
                    Err(SupervisorError::GraceExceeded { grace, busy })
                }
            }
            None => Ok(()),
        };

        self.runtime_token.cancel();
        let listener = self
            .listener
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(listener) = listener {
            let _ = listener.await;
        }
        res
    }

    fn slot(&self, key: &str) -> Result<&Arc<NodeSlot>, SupervisorError> {
        self.table
            .get(key)
            .ok_or_else(|| SupervisorError::UnknownNode(key.to_string()))
    }
}

//! # Per-node status table.
//!
//! One [`NodeSlot`] per managed node, created at construction and never removed.
//!
//! ## Locks per slot
//! ```text
//! NodeSlot
//!   ├─ status:    std RwLock<NodeStatus>   held only to copy/write fields, never across .await
//!   ├─ act:       tokio Mutex<ActLog>      held around one launch/terminate spawn
//!   └─ in_flight: std Mutex<Vec<JoinHandle>> dispatched start tasks not yet joined
//! ```
//!
//! ## Rules
//! - `state` and `message` are always written together under one write guard,
//!   so readers never observe a torn pair.
//! - Every request claims a new `epoch` when it is made; an operation commits (and a
//!   start launches) only while its epoch is still the current one.
//! - Lookups run outside every lock; only the spawn itself is serialized by `act`.
//! - Snapshots take read guards only.
//! - Slots of different nodes share nothing.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde::Serialize;
use tokio::task::JoinHandle;

use crate::nodes::{NodeKey, NodeSpec};

/// Status message of a node nobody has touched yet.
pub const MSG_IDLE: &str = "waiting for operation";

/// Lifecycle state of a managed node.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeState {
    Stopped,
    Starting,
    Running,
}

/// Mutable record of one node. Only the lifecycle module writes it.
#[derive(Clone, Debug)]
pub(crate) struct NodeStatus {
    pub state: NodeState,
    pub message: String,
    /// Set by restart when the node was running; picks the completion message.
    pub pending_restart: bool,
    /// The current epoch belongs to a dispatched start that has not committed yet.
    pub start_pending: bool,
    /// Bumped by every request that takes over the node.
    epoch: u64,
}

impl NodeStatus {
    fn idle() -> Self {
        Self {
            state: NodeState::Stopped,
            message: MSG_IDLE.to_string(),
            pending_restart: false,
            start_pending: false,
            epoch: 0,
        }
    }

    pub fn set(&mut self, state: NodeState, message: impl Into<String>) {
        self.state = state;
        self.message = message.into();
    }

    /// Takes over the node for a new request and returns its epoch. Any start
    /// still pending under an older epoch is abandoned.
    pub fn claim(&mut self) -> u64 {
        self.epoch = self.epoch.wrapping_add(1);
        self.start_pending = false;
        self.pending_restart = false;
        self.epoch
    }

    #[inline]
    pub fn is_current(&self, epoch: u64) -> bool {
        self.epoch == epoch
    }
}

/// What the last launch/terminate spawn did to the node.
#[derive(Debug, Default)]
pub(crate) struct ActLog {
    /// Epoch of the request that spawned last.
    pub last: u64,
    /// A proxy was launched and no terminate has been sent since.
    pub live: bool,
}

/// Point-in-time copy of a node's status as shown to callers.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct NodeSnapshot {
    #[serde(rename = "status")]
    pub state: NodeState,
    #[serde(rename = "msg")]
    pub message: String,
}

/// Everything the supervisor keeps about one managed node.
pub(crate) struct NodeSlot {
    spec: NodeSpec,
    status: RwLock<NodeStatus>,
    pub act: tokio::sync::Mutex<ActLog>,
    in_flight: Mutex<Vec<JoinHandle<()>>>,
}

impl NodeSlot {
    fn new(spec: NodeSpec) -> Self {
        Self {
            spec,
            status: RwLock::new(NodeStatus::idle()),
            act: tokio::sync::Mutex::new(ActLog::default()),
            in_flight: Mutex::new(Vec::new()),
        }
    }

    #[inline]
    pub fn spec(&self) -> &NodeSpec {
        &self.spec
    }

    #[inline]
    pub fn key(&self) -> &NodeKey {
        self.spec.key()
    }

    pub fn read(&self) -> RwLockReadGuard<'_, NodeStatus> {
        self.status.read().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn write(&self) -> RwLockWriteGuard<'_, NodeStatus> {
        self.status.write().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn snapshot(&self) -> NodeSnapshot {
        let st = self.read();
        NodeSnapshot {
            state: st.state,
            message: st.message.clone(),
        }
    }

    /// Records a dispatched operation, dropping handles of finished ones.
    pub fn track(&self, handle: JoinHandle<()>) {
        let mut in_flight = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
        in_flight.retain(|h| !h.is_finished());
        in_flight.push(handle);
    }

    /// Takes every tracked handle (finished or not).
    pub fn take_in_flight(&self) -> Vec<JoinHandle<()>> {
        std::mem::take(&mut *self.in_flight.lock().unwrap_or_else(PoisonError::into_inner))
    }

    /// Puts back handles that are still running.
    pub fn restore_in_flight(&self, handles: impl IntoIterator<Item = JoinHandle<()>>) {
        let mut in_flight = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
        in_flight.extend(handles.into_iter().filter(|h| !h.is_finished()));
    }
}

/// Fixed table of managed nodes, ordered by key.
pub(crate) struct StatusTable {
    slots: BTreeMap<NodeKey, Arc<NodeSlot>>,
}

impl StatusTable {
    /// Builds the table; later specs with an already-seen key are ignored.
    pub fn new(specs: impl IntoIterator<Item = NodeSpec>) -> Self {
        let mut slots = BTreeMap::new();
        for spec in specs {
            slots
                .entry(spec.key().clone())
                .or_insert_with(|| Arc::new(NodeSlot::new(spec)));
        }
        Self { slots }
    }

    pub fn get(&self, key: &str) -> Option<&Arc<NodeSlot>> {
        self.slots.get(key)
    }

    pub fn slots(&self) -> impl Iterator<Item = &Arc<NodeSlot>> {
        self.slots.values()
    }

    pub fn keys(&self) -> Vec<NodeKey> {
        self.slots.keys().cloned().collect()
    }

    pub fn snapshot(&self) -> BTreeMap<NodeKey, NodeSnapshot> {
        self.slots
            .iter()
            .map(|(k, slot)| (k.clone(), slot.snapshot()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> StatusTable {
        StatusTable::new([
            NodeSpec::new("C", "/tmp/c.sh"),
            NodeSpec::new("B", "/tmp/b.sh"),
            NodeSpec::new("B", "/tmp/other.sh"),
        ])
    }

    #[test]
    fn test_new_table_is_stopped_and_ordered() {
        let t = table();
        let snap = t.snapshot();
        let keys: Vec<&str> = snap.keys().map(|k| k.as_str()).collect();
        assert_eq!(keys, vec!["B", "C"]);
        for s in snap.values() {
            assert_eq!(s.state, NodeState::Stopped);
            assert_eq!(s.message, MSG_IDLE);
        }
    }

    #[test]
    fn test_duplicate_key_keeps_first_spec() {
        let t = table();
        let b = t.get("B").unwrap();
        assert_eq!(b.spec().script().to_str(), Some("/tmp/b.sh"));
    }

    #[test]
    fn test_snapshot_serializes_like_status_api() {
        let snap = NodeSnapshot {
            state: NodeState::Running,
            message: "proxy running".into(),
        };
        let json = serde_json::to_value(&snap).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"status": "running", "msg": "proxy running"})
        );
    }

    #[test]
    fn test_claim_abandons_pending_start() {
        let t = table();
        let b = t.get("B").unwrap();
        let mut st = b.write();
        let first = st.claim();
        st.start_pending = true;
        st.pending_restart = true;

        let second = st.claim();
        assert_ne!(first, second);
        assert!(!st.is_current(first));
        assert!(st.is_current(second));
        assert!(!st.start_pending);
        assert!(!st.pending_restart);
    }

    #[tokio::test]
    async fn test_in_flight_take_and_restore() {
        let t = table();
        let b = t.get("B").unwrap();
        let (tx, rx) = tokio::sync::oneshot::channel::<()>();
        b.track(tokio::spawn(async move {
            let _ = rx.await;
        }));
        b.track(tokio::spawn(async {}));
        for _ in 0..8 {
            tokio::task::yield_now().await;
        }

        let handles = b.take_in_flight();
        assert!(b.take_in_flight().is_empty());
        b.restore_in_flight(handles);

        let running = b.take_in_flight();
        assert_eq!(running.len(), 1);
        tx.send(()).unwrap();
        for h in running {
            h.await.unwrap();
        }
    }
}

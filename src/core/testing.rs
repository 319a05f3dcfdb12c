//! In-memory locator and launcher for lifecycle tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::Semaphore;

use crate::error::NodeError;
use crate::launcher::ProcessLauncher;
use crate::locator::{ExecContext, NodeLocator};
use crate::nodes::{NodeKey, NodeSpec};

/// Resolves nodes from a fixed map; unknown nodes are `NodeNotFound`.
///
/// With a gate, every resolution first waits for one permit. After `stall_next`,
/// the next resolution never returns.
#[derive(Default)]
pub struct FakeLocator {
    pids: Mutex<HashMap<String, u32>>,
    gate: Option<Arc<Semaphore>>,
    stall_next: AtomicBool,
    calls: AtomicUsize,
}

impl FakeLocator {
    pub fn with_nodes(nodes: &[(&str, u32)]) -> Self {
        Self {
            pids: Mutex::new(nodes.iter().map(|(k, p)| (k.to_string(), *p)).collect()),
            ..Self::default()
        }
    }

    pub fn gated(mut self, gate: Arc<Semaphore>) -> Self {
        self.gate = Some(gate);
        self
    }

    pub fn remove(&self, key: &str) {
        self.pids.lock().unwrap().remove(key);
    }

    /// Makes the next resolution hang, like a `pgrep` that never exits.
    pub fn stall_next(&self) {
        self.stall_next.store(true, Ordering::SeqCst);
    }

    /// Number of resolutions entered so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Yields until at least `n` resolutions have been entered.
    pub async fn wait_for_calls(&self, n: usize) {
        while self.calls() < n {
            tokio::task::yield_now().await;
        }
    }
}

#[async_trait]
impl NodeLocator for FakeLocator {
    async fn resolve(&self, node: &NodeKey) -> Result<ExecContext, NodeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.stall_next.swap(false, Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
        if let Some(gate) = &self.gate {
            gate.acquire().await.expect("gate closed").forget();
        }
        let pid = self.pids.lock().unwrap().get(node.as_str()).copied();
        pid.map(|pid| ExecContext { pid })
            .ok_or_else(|| NodeError::NodeNotFound {
                node: node.node_name(),
                reason: "topology not built".into(),
            })
    }
}

/// Records every launch and termination.
#[derive(Default)]
pub struct FakeLauncher {
    pub launches: Mutex<Vec<(NodeKey, u32)>>,
    pub terminations: Mutex<Vec<(u32, String)>>,
    pub fail_launch: AtomicBool,
    pub fail_terminate: AtomicBool,
}

impl FakeLauncher {
    pub fn launch_count(&self) -> usize {
        self.launches.lock().unwrap().len()
    }

    pub fn termination_count(&self) -> usize {
        self.terminations.lock().unwrap().len()
    }

    fn spawn_error(program: &str) -> NodeError {
        NodeError::Launch {
            program: program.into(),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        }
    }
}

#[async_trait]
impl ProcessLauncher for FakeLauncher {
    async fn launch(&self, ctx: ExecContext, spec: &NodeSpec) -> Result<(), NodeError> {
        if self.fail_launch.load(Ordering::SeqCst) {
            return Err(Self::spawn_error("mnexec"));
        }
        self.launches
            .lock()
            .unwrap()
            .push((spec.key().clone(), ctx.pid));
        Ok(())
    }

    async fn terminate(&self, ctx: ExecContext, pattern: &str) -> Result<(), NodeError> {
        if self.fail_terminate.load(Ordering::SeqCst) {
            return Err(Self::spawn_error("mnexec"));
        }
        self.terminations
            .lock()
            .unwrap()
            .push((ctx.pid, pattern.to_string()));
        Ok(())
    }
}

//! Runtime core: status table, lifecycle and the supervisor façade.
//!
//! The public API from this module is [`Supervisor`] (with its builder and
//! [`SupervisorConfig`]), the caller-facing [`NodeSnapshot`]/[`NodeState`] types and
//! [`wait_for_shutdown_signal`].
//!
//! Internal modules:
//! - [`table`]: per-node status records and locks;
//! - [`lifecycle`]: start/stop/restart transitions for one node;
//! - [`supervisor`]: fan-out over all nodes, snapshots, shutdown;
//! - [`builder`]: wiring of locator, launcher, bus and subscribers;
//! - [`shutdown`]: cross-platform shutdown signal handling.

mod builder;
mod config;
mod lifecycle;
mod shutdown;
mod supervisor;
mod table;

#[cfg(test)]
mod testing;

pub use builder::SupervisorBuilder;
pub use config::{DEFAULT_SCRIPT_DIR, SupervisorConfig};
pub use lifecycle::{MSG_RESTARTED, MSG_RESTARTING, MSG_STARTED, MSG_STARTING, MSG_STOPPED};
pub use shutdown::{ShutdownSignal, wait_for_shutdown_signal};
pub use supervisor::Supervisor;
pub use table::{MSG_IDLE, NodeSnapshot, NodeState};

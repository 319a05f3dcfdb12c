//! # pepvisor
//!
//! **pepvisor** supervises one proxy process per node of an emulated network.
//!
//! Each managed node lives in its own set of namespaces, anchored by a shell process
//! the emulator tags as `mininet:node<KEY>`. pepvisor finds that process, enters its
//! namespaces to start or kill the node's proxy, and keeps a per-node status record
//! that callers can read at any time without waiting on an operation in progress.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!   caller (console / UI)
//!        │ start_all / stop_all / restart_all / per-node / snapshot
//!        ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  Supervisor                                                       │
//! │  - StatusTable (one NodeSlot per node: status + act lock)         │
//! │  - Lifecycle   (start / stop / restart transitions)               │
//! │  - Bus         (broadcast events)                                 │
//! └──────┬─────────────────────────┬──────────────────────────┬───────┘
//!        ▼                         ▼                          │
//!  ┌──────────────┐        ┌────────────────┐                 │
//!  │ NodeLocator  │        │ ProcessLauncher│                 │
//!  │ pgrep -f     │        │ mnexec -a pid  │                 │
//!  │ mininet:nodeX│        │ sh / pkill     │                 │
//!  └──────────────┘        └────────────────┘                 │
//!                                                             ▼
//!                                         ┌────────────────────────┐
//!                                         │  listener → SubscriberSet
//!                                         └───┬────────────────┬───┘
//!                                             ▼                ▼
//!                                         LogWriter         custom
//! ```
//!
//! ### Lifecycle of one node
//! ```text
//! start:   Running? ─► no-op
//!          else ─► Starting "starting..." ─► (spawned) resolve ─► launch
//!                     ├─ ok  ─► Running "proxy running" | "restarted, proxy running"
//!                     └─ err ─► Stopped "start failed: <cause>"
//!
//! stop:    resolve ─► terminate ─► Stopped "proxy stopped" | "stop failed: <cause>"
//!
//! restart: stop ─► Starting "restarting..." ─► same path as start (forced)
//! ```
//!
//! The latest request on a node wins: a stop or restart takes over a start still in
//! progress instead of waiting for it. Different nodes never wait on each other.
//!
//! ## Features
//! | Area              | Description                                                  | Key types / traits                         |
//! |-------------------|--------------------------------------------------------------|--------------------------------------------|
//! | **Supervision**   | Lifecycle operations and status snapshots for all nodes.     | [`Supervisor`], [`NodeSnapshot`]           |
//! | **Primitives**    | Find a node's context and act inside it.                     | [`NodeLocator`], [`ProcessLauncher`]       |
//! | **Subscriber API**| Observe every transition.                                    | [`Subscribe`], [`Event`]                   |
//! | **Endpoints**     | Persisted proxy addressing per node.                         | [`EndpointBook`], [`EndpointConfig`]       |
//! | **Errors**        | Typed errors for primitives, config and the façade.          | [`NodeError`], [`ConfigError`], [`SupervisorError`] |
//! | **Configuration** | Centralize runtime settings.                                 | [`SupervisorConfig`]                       |
//!
//! ## Optional features
//! - `logging` (default): exports the built-in [`LogWriter`] subscriber and builds the
//!   `pepvisor` console binary.
//!
//! ## Example
//! ```rust,no_run
//! use std::sync::Arc;
//! use pepvisor::{Supervisor, SupervisorConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     #[cfg(feature = "logging")]
//!     let subs: Vec<Arc<dyn pepvisor::Subscribe>> = vec![Arc::new(pepvisor::LogWriter)];
//!     #[cfg(not(feature = "logging"))]
//!     let subs: Vec<Arc<dyn pepvisor::Subscribe>> = Vec::new();
//!
//!     let sup = Supervisor::builder(SupervisorConfig::default())
//!         .with_subscribers(subs)
//!         .build();
//!
//!     sup.start_all();
//!     for (node, status) in sup.snapshot() {
//!         println!("{node}: {:?} {}", status.state, status.message);
//!     }
//!
//!     sup.settle().await;
//!     sup.shutdown().await?;
//!     Ok(())
//! }
//! ```
mod core;
mod endpoint;
mod error;
mod events;
mod launcher;
mod locator;
mod nodes;
mod subscribers;

// ---- Public re-exports ----

pub use core::{
    DEFAULT_SCRIPT_DIR, MSG_IDLE, MSG_RESTARTED, MSG_RESTARTING, MSG_STARTED, MSG_STARTING,
    MSG_STOPPED, NodeSnapshot, NodeState, ShutdownSignal, Supervisor, SupervisorBuilder,
    SupervisorConfig, wait_for_shutdown_signal,
};
pub use endpoint::{
    DEFAULT_CONFIG_FILE, DEFAULT_PORT, Endpoint, EndpointBook, EndpointConfig, EndpointStore,
    REQUIRED_FIELDS,
};
pub use error::{ConfigError, NodeError, SupervisorError};
pub use events::{Bus, Event, EventKind};
pub use launcher::{MnexecLauncher, ProcessLauncher};
pub use locator::{DEFAULT_TAG_PREFIX, ExecContext, NodeLocator, PgrepLocator};
pub use nodes::{DEFAULT_PROXY_PATTERN, NodeKey, NodeSpec};
pub use subscribers::{Subscribe, SubscriberSet};

// Built-in tracing subscriber.
// Enabled by default; disable with `--no-default-features`.
#[cfg(feature = "logging")]
pub use subscribers::LogWriter;

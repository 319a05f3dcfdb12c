//! # Process launcher.
//!
//! Action primitives executed inside a node's [`ExecContext`]. No status semantics live
//! here; callers fold the outcome into the node's status record.
//!
//! - [`ProcessLauncher`] the seam (`launch` / `terminate`)
//! - [`MnexecLauncher`] default: `mnexec -a <pid> ...` spawned detached
//!
//! ## Rules
//! - Both operations are **fire-and-forget**: success means the spawn did not fail,
//!   nothing more. A launched proxy may still crash; a signalled one may still be alive.
//! - Neither operation waits for the spawned program to exit.

mod mnexec;

use async_trait::async_trait;

use crate::error::NodeError;
use crate::locator::ExecContext;
use crate::nodes::NodeSpec;

pub use mnexec::MnexecLauncher;

/// Starts and signals processes inside a node's execution context.
#[async_trait]
pub trait ProcessLauncher: Send + Sync + 'static {
    /// Starts the node's proxy detached inside `ctx`.
    async fn launch(&self, ctx: ExecContext, spec: &NodeSpec) -> Result<(), NodeError>;

    /// Sends a termination signal to processes inside `ctx` matching `pattern`.
    async fn terminate(&self, ctx: ExecContext, pattern: &str) -> Result<(), NodeError>;
}

//! # Node locator.
//!
//! Resolves a [`NodeKey`](crate::NodeKey) to the [`ExecContext`] anchoring the node's
//! namespaces. The context is never cached: every lifecycle operation resolves it
//! again, so a rebuilt topology is picked up without stale pids.
//!
//! - [`NodeLocator`] the seam (swap the matching strategy or fake it in tests)
//! - [`PgrepLocator`] default: `pgrep -f <prefix><node-name>`, first match wins

mod pgrep;

use std::fmt;

use async_trait::async_trait;

use crate::error::NodeError;
use crate::nodes::NodeKey;

pub use pgrep::{DEFAULT_TAG_PREFIX, PgrepLocator};

/// Process anchoring a node's private execution context.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ExecContext {
    pub pid: u32,
}

impl fmt::Display for ExecContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "pid {}", self.pid)
    }
}

/// Looks up the execution context of a managed node.
///
/// ### Rules
/// - Pure query: no state is kept between calls.
/// - When several processes match, the first one listed wins.
/// - Returns [`NodeError::NodeNotFound`] when nothing matches.
#[async_trait]
pub trait NodeLocator: Send + Sync + 'static {
    async fn resolve(&self, node: &NodeKey) -> Result<ExecContext, NodeError>;
}

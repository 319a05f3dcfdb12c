//! # `pgrep`-backed locator.
//!
//! The emulator tags each host's shell with `mininet:<node-name>` in its command line.
//! [`PgrepLocator`] runs `pgrep -f mininet:nodeB` and takes the first pid printed.
//!
//! ## Sharp edge
//! `pgrep -f` is a substring/regex match: `mininet:nodeB` also matches `mininet:nodeB2`.
//! The first listed pid is used; keep node names prefix-free.

use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

use super::{ExecContext, NodeLocator};
use crate::error::NodeError;
use crate::nodes::NodeKey;

/// Default process-table tag prefix used by the emulator.
pub const DEFAULT_TAG_PREFIX: &str = "mininet:";

/// Locator that scans the process table with `pgrep -f`.
#[derive(Clone, Debug)]
pub struct PgrepLocator {
    program: String,
    tag_prefix: String,
}

impl Default for PgrepLocator {
    fn default() -> Self {
        Self::new("pgrep", DEFAULT_TAG_PREFIX)
    }
}

impl PgrepLocator {
    pub fn new(program: impl Into<String>, tag_prefix: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            tag_prefix: tag_prefix.into(),
        }
    }

    fn pattern(&self, node: &NodeKey) -> String {
        format!("{}{}", self.tag_prefix, node.node_name())
    }
}

#[async_trait]
impl NodeLocator for PgrepLocator {
    async fn resolve(&self, node: &NodeKey) -> Result<ExecContext, NodeError> {
        let pattern = self.pattern(node);
        let output = Command::new(&self.program)
            .arg("-f")
            .arg(&pattern)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|source| NodeError::Launch {
                program: self.program.clone(),
                source,
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let reason = match output.status.code() {
                Some(1) => format!("no process matches {pattern:?}"),
                code => format!("{} exited with {code:?}: {}", self.program, stderr.trim()),
            };
            return Err(NodeError::NodeNotFound {
                node: node.node_name(),
                reason,
            });
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let ctx = first_pid(&stdout).ok_or_else(|| NodeError::NodeNotFound {
            node: node.node_name(),
            reason: format!("unparsable {} output: {:?}", self.program, stdout.trim()),
        })?;
        debug!(node = %node, %ctx, "resolved execution context");
        Ok(ctx)
    }
}

/// Parses the first non-empty line of `pgrep` output as a pid.
fn first_pid(stdout: &str) -> Option<ExecContext> {
    stdout
        .lines()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .and_then(|l| l.parse::<u32>().ok())
        .map(|pid| ExecContext { pid })
}

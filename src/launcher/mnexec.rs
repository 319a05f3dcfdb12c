//! # `mnexec`-backed launcher.
//!
//! `mnexec -a <pid> <cmd...>` attaches to every namespace of `<pid>` and execs `<cmd>`.
//!
//! ```text
//! launch:    mnexec -a <pid> sh <script>
//! terminate: mnexec -a <pid> pkill -f <pattern>
//! ```
//!
//! Children are spawned in their own process group (they outlive the supervisor and
//! do not receive its Ctrl-C) and reaped by a background task.

use std::ffi::OsStr;
use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, warn};

use super::ProcessLauncher;
use crate::error::NodeError;
use crate::locator::ExecContext;
use crate::nodes::NodeSpec;

/// Launcher that enters a node's namespaces through `mnexec`.
#[derive(Clone, Debug)]
pub struct MnexecLauncher {
    program: String,
    shell: String,
    pkill: String,
}

impl Default for MnexecLauncher {
    fn default() -> Self {
        Self::new("mnexec")
    }
}

impl MnexecLauncher {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            shell: "sh".to_string(),
            pkill: "pkill".to_string(),
        }
    }

    /// Spawns `mnexec -a <pid> <args...>` and returns without waiting for it.
    fn spawn_detached<I, S>(&self, ctx: ExecContext, what: &'static str, args: I) -> Result<(), NodeError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let mut cmd = Command::new(&self.program);
        cmd.arg("-a")
            .arg(ctx.pid.to_string())
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null());
        #[cfg(unix)]
        cmd.process_group(0);

        let mut child = cmd.spawn().map_err(|source| NodeError::Launch {
            program: self.program.clone(),
            source,
        })?;
        debug!(%ctx, what, child = ?child.id(), "spawned");

        tokio::spawn(async move {
            match child.wait().await {
                Ok(status) => debug!(%ctx, what, %status, "child exited"),
                Err(e) => warn!(%ctx, what, error = %e, "failed to reap child"),
            }
        });
        Ok(())
    }
}

#[async_trait]
impl ProcessLauncher for MnexecLauncher {
    async fn launch(&self, ctx: ExecContext, spec: &NodeSpec) -> Result<(), NodeError> {
        self.spawn_detached(
            ctx,
            "launch",
            [OsStr::new(&self.shell), spec.script().as_os_str()],
        )
    }

    async fn terminate(&self, ctx: ExecContext, pattern: &str) -> Result<(), NodeError> {
        self.spawn_detached(ctx, "terminate", [self.pkill.as_str(), "-f", pattern])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_spawn_failure_surfaces_as_launch_error() {
        let launcher = MnexecLauncher::new("/nonexistent/mnexec-for-tests");
        let err = launcher
            .terminate(ExecContext { pid: 1 }, "pep.py")
            .await
            .unwrap_err();
        match err {
            NodeError::Launch { program, .. } => {
                assert_eq!(program, "/nonexistent/mnexec-for-tests")
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_launch_returns_without_waiting() {
        // `true` ignores its arguments, so it stands in for mnexec here.
        let launcher = MnexecLauncher::new("true");
        let spec = NodeSpec::new("B", "/nonexistent/script.sh");
        launcher
            .launch(ExecContext { pid: 1 }, &spec)
            .await
            .unwrap();
    }
}

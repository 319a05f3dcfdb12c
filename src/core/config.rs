//! # Supervisor configuration.
//!
//! [`SupervisorConfig`] centralizes the settings of one supervisor instance:
//! the fixed set of managed nodes, the shutdown grace period and the event bus size.
//!
//! ## Sentinel values
//! - `grace = 0s` → do not wait for in-flight operations on shutdown

use std::path::PathBuf;
use std::time::Duration;

use crate::nodes::NodeSpec;

/// Directory holding the per-node proxy start scripts in the reference deployment.
pub const DEFAULT_SCRIPT_DIR: &str = "/home/mininet/pepesc/pepesc-main/Mininet-scripts";

/// Configuration for the supervisor runtime.
///
/// ## Field semantics
/// - `nodes`: managed nodes, fixed for the lifetime of the supervisor (duplicates by key
///   are collapsed, first wins)
/// - `grace`: maximum wait for in-flight operations during shutdown (`0s` = no wait)
/// - `bus_capacity`: event bus ring buffer size (min 1)
#[derive(Clone, Debug)]
pub struct SupervisorConfig {
    /// Managed nodes and what to run in each.
    pub nodes: Vec<NodeSpec>,

    /// Maximum time to wait for dispatched operations when shutting down.
    pub grace: Duration,

    /// Capacity of the event bus broadcast channel.
    pub bus_capacity: usize,
}

impl SupervisorConfig {
    /// Returns the shutdown grace as an `Option` (`None` = do not wait).
    #[inline]
    pub fn grace_limit(&self) -> Option<Duration> {
        if self.grace == Duration::ZERO {
            None
        } else {
            Some(self.grace)
        }
    }

    /// Returns a bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }

    /// Default node set of the reference topology: `B` and `C`, each running
    /// `<DEFAULT_SCRIPT_DIR>/node<KEY>_pep.sh`.
    pub fn default_nodes() -> Vec<NodeSpec> {
        ["B", "C"]
            .into_iter()
            .map(|key| {
                let script = PathBuf::from(DEFAULT_SCRIPT_DIR).join(format!("node{key}_pep.sh"));
                NodeSpec::new(key, script)
            })
            .collect()
    }
}

impl Default for SupervisorConfig {
    /// Default configuration:
    ///
    /// - `nodes = B, C` (see [`SupervisorConfig::default_nodes`])
    /// - `grace = 10s`
    /// - `bus_capacity = 1024`
    fn default() -> Self {
        Self {
            nodes: Self::default_nodes(),
            grace: Duration::from_secs(10),
            bus_capacity: 1024,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_nodes_follow_script_convention() {
        let cfg = SupervisorConfig::default();
        let keys: Vec<&str> = cfg.nodes.iter().map(|n| n.key().as_str()).collect();
        assert_eq!(keys, vec!["B", "C"]);
        assert!(cfg.nodes[1].script().ends_with("nodeC_pep.sh"));
    }

    #[test]
    fn test_zero_grace_means_no_wait() {
        let cfg = SupervisorConfig {
            grace: Duration::ZERO,
            ..SupervisorConfig::default()
        };
        assert_eq!(cfg.grace_limit(), None);
        assert_eq!(SupervisorConfig::default().grace_limit(), Some(Duration::from_secs(10)));
    }
}

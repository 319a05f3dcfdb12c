//! Error types used by the supervisor, the node primitives and the endpoint config.
//!
//! This module defines three enums:
//!
//! - [`NodeError`]: failures of the locator/launcher primitives for one node.
//! - [`ConfigError`]: endpoint configuration that cannot be read, parsed or saved.
//! - [`SupervisorError`]: misuse of the façade or a shutdown that overran its grace.
//!
//! All of them provide `as_label` (stable snake_case, for logs). [`NodeError`] also has
//! `as_message`, a short `<subject>: <cause>` line.
//! [`NodeError`] never reaches the caller of a lifecycle operation: it is folded into
//! the node's status message instead.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// # Errors produced while resolving or acting on a node's execution context.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum NodeError {
    /// No process in the process table matches the node (topology missing or node absent).
    #[error("node {node} not found: {reason}")]
    NodeNotFound {
        /// Process-table name of the node (e.g. `nodeB`).
        node: String,
        /// Why the lookup came back empty.
        reason: String,
    },

    /// Spawning a helper program (lookup, exec or signal) failed.
    #[error("failed to run {program}: {source}")]
    Launch {
        /// Program that could not be spawned.
        program: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

impl NodeError {
    /// Returns a short stable label (snake_case) for use in logs.
    ///
    /// # Example
    /// ```
    /// use pepvisor::NodeError;
    ///
    /// let err = NodeError::NodeNotFound { node: "nodeB".into(), reason: "no match".into() };
    /// assert_eq!(err.as_label(), "node_not_found");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            NodeError::NodeNotFound { .. } => "node_not_found",
            NodeError::Launch { .. } => "launch_failed",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            NodeError::NodeNotFound { node, reason } => format!("{node}: {reason}"),
            NodeError::Launch { program, source } => format!("{program}: {source}"),
        }
    }
}

/// # Errors produced by the endpoint configuration store.
///
/// On load these are recovered by falling back to defaults; on save or replace they
/// are returned to the caller and nothing is changed.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Reading or writing the config file failed.
    #[error("config io error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The document is not valid JSON or has the wrong shape.
    #[error("malformed config: {0}")]
    Malformed(#[from] serde_json::Error),

    /// A managed node or one of its required fields is absent.
    #[error("missing field {field} for node {node}")]
    MissingField { node: String, field: &'static str },

    /// A required field is present but has an unusable value.
    #[error("invalid value for {field} of node {node}: {reason}")]
    InvalidField {
        node: String,
        field: &'static str,
        reason: String,
    },
}

impl ConfigError {
    /// Returns a short stable label (snake_case) for use in logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            ConfigError::Io { .. } => "config_io",
            ConfigError::Malformed(_) => "config_malformed",
            ConfigError::MissingField { .. } => "config_missing_field",
            ConfigError::InvalidField { .. } => "config_invalid_field",
        }
    }
}

/// # Errors produced by the supervisor façade.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum SupervisorError {
    /// The key does not name one of the managed nodes.
    #[error("unknown node {0}")]
    UnknownNode(String),

    /// Shutdown grace period was exceeded while operations were still in flight.
    #[error("shutdown timeout {grace:?} exceeded; busy: {busy:?}")]
    GraceExceeded {
        /// The configured grace duration.
        grace: Duration,
        /// Nodes whose operation did not finish in time.
        busy: Vec<String>,
    },
}

impl SupervisorError {
    /// Returns a short stable label (snake_case) for use in logs.
    ///
    /// # Example
    /// ```
    /// use pepvisor::SupervisorError;
    /// use std::time::Duration;
    ///
    /// let err = SupervisorError::GraceExceeded { grace: Duration::from_secs(5), busy: vec![] };
    /// assert_eq!(err.as_label(), "supervisor_grace_exceeded");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            SupervisorError::UnknownNode(_) => "supervisor_unknown_node",
            SupervisorError::GraceExceeded { .. } => "supervisor_grace_exceeded",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_error_message_is_descriptive() {
        let err = NodeError::Launch {
            program: "mnexec".into(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "no such file"),
        };
        assert_eq!(err.as_label(), "launch_failed");
        assert_eq!(err.to_string(), "failed to run mnexec: no such file");
        assert_eq!(err.as_message(), "mnexec: no such file");
    }

    #[test]
    fn test_config_error_labels() {
        let err = ConfigError::MissingField {
            node: "C".into(),
            field: "peer_port",
        };
        assert_eq!(err.as_label(), "config_missing_field");
        assert_eq!(err.to_string(), "missing field peer_port for node C");
    }
}

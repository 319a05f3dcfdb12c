//! # Node specification.
//!
//! [`NodeSpec`] bundles what the supervisor needs to know about one managed node:
//! - its [`NodeKey`],
//! - the proxy start script run inside the node (`sh <script>`),
//! - the pattern used to find the proxy when stopping it.

use std::path::PathBuf;

use crate::nodes::NodeKey;

/// Pattern matched by `pkill -f` when stopping the proxy.
pub const DEFAULT_PROXY_PATTERN: &str = "pep.py";

/// Static description of a managed node.
#[derive(Clone, Debug)]
pub struct NodeSpec {
    key: NodeKey,
    script: PathBuf,
    proxy_pattern: String,
}

impl NodeSpec {
    /// Creates a spec that runs `script` and stops processes matching [`DEFAULT_PROXY_PATTERN`].
    pub fn new(key: impl Into<NodeKey>, script: impl Into<PathBuf>) -> Self {
        Self {
            key: key.into(),
            script: script.into(),
            proxy_pattern: DEFAULT_PROXY_PATTERN.to_string(),
        }
    }

    /// Overrides the termination pattern.
    pub fn with_proxy_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.proxy_pattern = pattern.into();
        self
    }

    #[inline]
    pub fn key(&self) -> &NodeKey {
        &self.key
    }

    #[inline]
    pub fn script(&self) -> &PathBuf {
        &self.script
    }

    #[inline]
    pub fn proxy_pattern(&self) -> &str {
        &self.proxy_pattern
    }

    /// Parses `KEY=SCRIPT` (as given on the command line).
    pub fn parse_assignment(s: &str) -> Result<Self, String> {
        let (key, script) = s
            .split_once('=')
            .ok_or_else(|| format!("expected KEY=SCRIPT, got {s:?}"))?;
        let key = key.trim();
        let script = script.trim();
        if key.is_empty() || script.is_empty() {
            return Err(format!("expected KEY=SCRIPT, got {s:?}"));
        }
        Ok(Self::new(key, script))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_assignment() {
        let spec = NodeSpec::parse_assignment("B=/opt/pep/nodeB_pep.sh").unwrap();
        assert_eq!(spec.key().as_str(), "B");
        assert_eq!(spec.script(), &PathBuf::from("/opt/pep/nodeB_pep.sh"));
        assert_eq!(spec.proxy_pattern(), DEFAULT_PROXY_PATTERN);
    }

    #[test]
    fn test_parse_assignment_rejects_missing_parts() {
        assert!(NodeSpec::parse_assignment("B").is_err());
        assert!(NodeSpec::parse_assignment("=x.sh").is_err());
        assert!(NodeSpec::parse_assignment("B=").is_err());
    }
}

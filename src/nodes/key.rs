use std::borrow::Borrow;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Logical key of a managed node.
///
/// Cheap to clone; ordered so that snapshots and config maps iterate in a stable order.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeKey(Arc<str>);

impl NodeKey {
    pub fn new(key: impl Into<Arc<str>>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Name the topology gives the node's host process (`B` → `nodeB`).
    pub fn node_name(&self) -> String {
        format!("node{}", self.0)
    }
}

impl fmt::Display for NodeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeKey {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl Borrow<str> for NodeKey {
    fn borrow(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_name_follows_topology_convention() {
        assert_eq!(NodeKey::from("B").node_name(), "nodeB");
    }

    #[test]
    fn test_serializes_as_plain_string() {
        let key = NodeKey::from("C");
        assert_eq!(serde_json::to_string(&key).unwrap(), "\"C\"");
        let back: NodeKey = serde_json::from_str("\"C\"").unwrap();
        assert_eq!(back, key);
    }
}

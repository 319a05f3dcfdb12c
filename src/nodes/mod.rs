//! # Managed nodes.
//!
//! - [`NodeKey`] stable logical identifier of a managed node (e.g. `"B"`)
//! - [`NodeSpec`] what to run inside the node and how the topology names it

mod key;
mod spec;

pub use key::NodeKey;
pub use spec::{DEFAULT_PROXY_PATTERN, NodeSpec};

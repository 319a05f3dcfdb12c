//! # Endpoint addressing of the node proxies.
//!
//! Each managed node runs a proxy bound to `self_ip:self_port` that tunnels to
//! `peer_ip:peer_port`. This module keeps that addressing:
//!
//! - [`EndpointConfig`]: the per-node map, its defaults and validated updates;
//! - [`EndpointStore`]: the JSON file it is persisted in (`pep_config.json`);
//! - [`EndpointBook`]: the in-memory current config with persist-then-swap replace.
//!
//! The supervisor itself never reads this config; the proxy scripts do.

mod book;
mod model;
mod store;

pub use book::EndpointBook;
pub use model::{DEFAULT_PORT, Endpoint, EndpointConfig, REQUIRED_FIELDS};
pub use store::{DEFAULT_CONFIG_FILE, EndpointStore};

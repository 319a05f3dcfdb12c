use std::collections::BTreeMap;
use std::net::{IpAddr, Ipv4Addr};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ConfigError;
use crate::nodes::NodeKey;

/// Port every proxy listens on unless configured otherwise.
pub const DEFAULT_PORT: u16 = 9999;

/// Fields every managed node must carry in a submitted config.
pub const REQUIRED_FIELDS: [&str; 4] = ["self_ip", "self_port", "peer_ip", "peer_port"];

/// Addressing of one node's proxy and of the peer it tunnels to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoint {
    pub self_ip: IpAddr,
    pub self_port: u16,
    pub peer_ip: IpAddr,
    pub peer_port: u16,
}

/// Endpoint addressing for every node, keyed by node.
///
/// Serializes as a flat JSON object: `{"B": {"self_ip": ..., ...}, "C": {...}}`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EndpointConfig {
    nodes: BTreeMap<NodeKey, Endpoint>,
}

impl EndpointConfig {
    /// Default addressing for `nodes`, in key order: node `i` gets `10.0.1.(2+i)` and
    /// peers with the next node, the last one wrapping to the first.
    ///
    /// For the reference pair this yields B = 10.0.1.2 ↔ C = 10.0.1.3, both on port 9999.
    pub fn defaults<'a>(nodes: impl IntoIterator<Item = &'a NodeKey>) -> Self {
        let mut keys: Vec<&NodeKey> = nodes.into_iter().collect();
        keys.sort();
        keys.dedup();

        let addr = |i: usize| IpAddr::V4(Ipv4Addr::new(10, 0, 1, (2 + i).min(254) as u8));
        let n = keys.len();
        let nodes = keys
            .iter()
            .enumerate()
            .map(|(i, key)| {
                let ep = Endpoint {
                    self_ip: addr(i),
                    self_port: DEFAULT_PORT,
                    peer_ip: addr((i + 1) % n),
                    peer_port: DEFAULT_PORT,
                };
                ((*key).clone(), ep)
            })
            .collect();
        Self { nodes }
    }

    pub fn get(&self, key: &str) -> Option<&Endpoint> {
        self.nodes.get(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&NodeKey, &Endpoint)> {
        self.nodes.iter()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn insert(&mut self, key: NodeKey, endpoint: Endpoint) -> Option<Endpoint> {
        self.nodes.insert(key, endpoint)
    }

    /// Copies in every entry of `defaults` whose node is missing from `self`. Returns the keys filled in.
    pub fn fill_missing(&mut self, defaults: &EndpointConfig) -> Vec<NodeKey> {
        let mut filled = Vec::new();
        for (key, ep) in defaults.iter() {
            if !self.nodes.contains_key(key) {
                self.nodes.insert(key.clone(), *ep);
                filled.push(key.clone());
            }
        }
        filled
    }

    /// Returns a copy of `self` with the managed nodes' fields replaced from `update`.
    ///
    /// Every managed node must be present in `update` with all of [`REQUIRED_FIELDS`];
    /// ports may be JSON numbers or numeric strings. The whole update is checked
    /// before anything is built, so an error leaves no partial result. Entries for
    /// nodes outside `managed` are ignored.
    pub fn apply_update<'a>(
        &self,
        update: &Value,
        managed: impl IntoIterator<Item = &'a NodeKey>,
    ) -> Result<Self, ConfigError> {
        let mut next = self.clone();
        for key in managed {
            let entry = update
                .get(key.as_str())
                .and_then(Value::as_object)
                .ok_or_else(|| ConfigError::MissingField {
                    node: key.to_string(),
                    field: "node",
                })?;

            let field = move |name: &'static str| {
                entry.get(name).ok_or_else(|| ConfigError::MissingField {
                    node: key.to_string(),
                    field: name,
                })
            };

            let ep = Endpoint {
                self_ip: parse_ip(key, "self_ip", field("self_ip")?)?,
                self_port: parse_port(key, "self_port", field("self_port")?)?,
                peer_ip: parse_ip(key, "peer_ip", field("peer_ip")?)?,
                peer_port: parse_port(key, "peer_port", field("peer_port")?)?,
            };
            next.nodes.insert(key.clone(), ep);
        }
        Ok(next)
    }
}

fn invalid(key: &NodeKey, field: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::InvalidField {
        node: key.to_string(),
        field,
        reason: reason.into(),
    }
}

fn parse_ip(key: &NodeKey, field: &'static str, v: &Value) -> Result<IpAddr, ConfigError> {
    let s = v
        .as_str()
        .ok_or_else(|| invalid(key, field, "expected a string"))?;
    s.trim()
        .parse()
        .map_err(|e: std::net::AddrParseError| invalid(key, field, format!("{s:?}: {e}")))
}

fn parse_port(key: &NodeKey, field: &'static str, v: &Value) -> Result<u16, ConfigError> {
    let n = match v {
        Value::Number(n) => n
            .as_u64()
            .ok_or_else(|| invalid(key, field, format!("{n} is not a port number")))?,
        Value::String(s) => s
            .trim()
            .parse::<u64>()
            .map_err(|e| invalid(key, field, format!("{s:?}: {e}")))?,
        _ => return Err(invalid(key, field, "expected a number")),
    };
    u16::try_from(n).map_err(|_| invalid(key, field, format!("{n} is out of range")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn managed() -> Vec<NodeKey> {
        vec![NodeKey::from("B"), NodeKey::from("C")]
    }

    fn full_update() -> Value {
        json!({
            "B": {"self_ip": "10.0.2.2", "self_port": 8000, "peer_ip": "10.0.2.3", "peer_port": "8001"},
            "C": {"self_ip": "10.0.2.3", "self_port": 8001, "peer_ip": "10.0.2.2", "peer_port": 8000},
        })
    }

    #[test]
    fn test_defaults_pair_b_and_c() {
        let cfg = EndpointConfig::defaults(&managed());
        let json = serde_json::to_value(&cfg).unwrap();
        assert_eq!(
            json,
            json!({
                "B": {"self_ip": "10.0.1.2", "self_port": 9999, "peer_ip": "10.0.1.3", "peer_port": 9999},
                "C": {"self_ip": "10.0.1.3", "self_port": 9999, "peer_ip": "10.0.1.2", "peer_port": 9999},
            })
        );
    }

    #[test]
    fn test_apply_update_replaces_managed_nodes() {
        let cfg = EndpointConfig::defaults(&managed());
        let next = cfg.apply_update(&full_update(), &managed()).unwrap();

        let b = next.get("B").unwrap();
        assert_eq!(b.self_ip.to_string(), "10.0.2.2");
        assert_eq!(b.self_port, 8000);
        assert_eq!(b.peer_port, 8001);
        assert_eq!(next.get("C").unwrap().peer_ip.to_string(), "10.0.2.2");
    }

    #[test]
    fn test_apply_update_ignores_unmanaged_nodes() {
        let cfg = EndpointConfig::defaults(&managed());
        let mut update = full_update();
        update["Z"] = json!({"self_ip": "bogus"});

        let next = cfg.apply_update(&update, &managed()).unwrap();
        assert!(next.get("Z").is_none());
        assert_eq!(next.len(), 2);
    }

    #[test]
    fn test_apply_update_rejects_missing_field() {
        let cfg = EndpointConfig::defaults(&managed());
        let mut update = full_update();
        update["C"].as_object_mut().unwrap().remove("peer_port");

        let err = cfg.apply_update(&update, &managed()).unwrap_err();
        match err {
            ConfigError::MissingField { node, field } => {
                assert_eq!(node, "C");
                assert_eq!(field, "peer_port");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_apply_update_rejects_missing_node() {
        let cfg = EndpointConfig::defaults(&managed());
        let update = json!({"B": full_update()["B"].clone()});

        let err = cfg.apply_update(&update, &managed()).unwrap_err();
        assert_eq!(err.as_label(), "config_missing_field");
    }

    #[test]
    fn test_apply_update_rejects_bad_values() {
        let cfg = EndpointConfig::defaults(&managed());

        let mut update = full_update();
        update["B"]["self_ip"] = json!("10.0.2.300");
        let err = cfg.apply_update(&update, &managed()).unwrap_err();
        assert_eq!(err.as_label(), "config_invalid_field");

        let mut update = full_update();
        update["B"]["self_port"] = json!(70000);
        let err = cfg.apply_update(&update, &managed()).unwrap_err();
        assert!(err.to_string().contains("out of range"), "{err}");
    }

    #[test]
    fn test_fill_missing_adds_only_absent_nodes() {
        let defaults = EndpointConfig::defaults(&managed());
        let mut cfg = EndpointConfig::default();
        let custom = Endpoint {
            self_ip: "192.168.0.1".parse().unwrap(),
            self_port: 1,
            peer_ip: "192.168.0.2".parse().unwrap(),
            peer_port: 2,
        };
        cfg.insert(NodeKey::from("B"), custom);

        let filled = cfg.fill_missing(&defaults);
        assert_eq!(filled, vec![NodeKey::from("C")]);
        assert_eq!(cfg.get("B"), Some(&custom));
    }
}

use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use super::model::EndpointConfig;
use crate::error::ConfigError;

/// Default file name of the endpoint config, relative to the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "pep_config.json";

/// JSON file holding the persisted [`EndpointConfig`].
#[derive(Clone, Debug)]
pub struct EndpointStore {
    path: PathBuf,
}

impl Default for EndpointStore {
    fn default() -> Self {
        Self::new(DEFAULT_CONFIG_FILE)
    }
}

impl EndpointStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the persisted config.
    ///
    /// Never fails: an absent, unreadable or malformed file yields `defaults` (logged
    /// at warn for anything but absence). Nodes present in `defaults` but missing from
    /// the file are filled in from `defaults`.
    pub async fn load(&self, defaults: &EndpointConfig) -> EndpointConfig {
        match self.try_load().await {
            Ok(Some(mut cfg)) => {
                let filled = cfg.fill_missing(defaults);
                if !filled.is_empty() {
                    warn!(path = %self.path.display(), ?filled, "endpoint config lacks nodes; using defaults for them");
                }
                debug!(path = %self.path.display(), nodes = cfg.len(), "endpoint config loaded");
                cfg
            }
            Ok(None) => {
                debug!(path = %self.path.display(), "no endpoint config file; using defaults");
                defaults.clone()
            }
            Err(e) => {
                warn!(path = %self.path.display(), label = e.as_label(), error = %e, "endpoint config unusable; using defaults");
                defaults.clone()
            }
        }
    }

    async fn try_load(&self) -> Result<Option<EndpointConfig>, ConfigError> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(b) => b,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(ConfigError::Io {
                    path: self.path.clone(),
                    source,
                });
            }
        };
        Ok(Some(serde_json::from_slice(&bytes)?))
    }

    /// Writes `cfg` as pretty-printed JSON, replacing the file.
    pub async fn save(&self, cfg: &EndpointConfig) -> Result<(), ConfigError> {
        let mut body = serde_json::to_vec_pretty(cfg)?;
        body.push(b'\n');
        tokio::fs::write(&self.path, body)
            .await
            .map_err(|source| ConfigError::Io {
                path: self.path.clone(),
                source,
            })
    }
}

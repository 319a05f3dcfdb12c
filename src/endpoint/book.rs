use std::sync::{PoisonError, RwLock};

use serde_json::Value;
use tracing::info;

use super::{model::EndpointConfig, store::EndpointStore};
use crate::error::ConfigError;
use crate::nodes::NodeKey;

/// Current endpoint config of a running console, backed by an [`EndpointStore`].
///
/// Reads never wait on a save in progress. Replacements are serialized; the
/// in-memory copy changes only after the new config has been persisted.
pub struct EndpointBook {
    store: EndpointStore,
    managed: Vec<NodeKey>,
    current: RwLock<EndpointConfig>,
    write: tokio::sync::Mutex<()>,
}

impl EndpointBook {
    /// Loads the config from `store`, falling back to defaults for `managed`.
    pub async fn open(store: EndpointStore, managed: Vec<NodeKey>) -> Self {
        let defaults = EndpointConfig::defaults(&managed);
        let current = store.load(&defaults).await;
        Self {
            store,
            managed,
            current: RwLock::new(current),
            write: tokio::sync::Mutex::new(()),
        }
    }

    pub fn store(&self) -> &EndpointStore {
        &self.store
    }

    /// Copy of the current config.
    pub fn get(&self) -> EndpointConfig {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Validates `update` against every managed node, persists it, then makes it current.
    ///
    /// On any error neither the file nor the in-memory config changes.
    pub async fn replace(&self, update: &Value) -> Result<(), ConfigError> {
        let _guard = self.write.lock().await;
        let next = self.get().apply_update(update, &self.managed)?;
        self.store.save(&next).await?;
        *self
            .current
            .write()
            .unwrap_or_else(PoisonError::into_inner) = next;
        info!(path = %self.store.path().display(), "endpoint config saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn managed() -> Vec<NodeKey> {
        vec![NodeKey::from("B"), NodeKey::from("C")]
    }

    fn update() -> Value {
        json!({
            "B": {"self_ip": "10.0.5.2", "self_port": 5000, "peer_ip": "10.0.5.3", "peer_port": 5001},
            "C": {"self_ip": "10.0.5.3", "self_port": 5001, "peer_ip": "10.0.5.2", "peer_port": 5000},
        })
    }

    #[tokio::test]
    async fn test_replace_persists_and_updates_current() {
        let dir = tempfile::tempdir().unwrap();
        let store = EndpointStore::new(dir.path().join("pep_config.json"));
        let book = EndpointBook::open(store.clone(), managed()).await;

        book.replace(&update()).await.unwrap();
        assert_eq!(book.get().get("B").unwrap().self_port, 5000);

        let reopened = EndpointBook::open(store, managed()).await;
        assert_eq!(reopened.get(), book.get());
    }

    #[tokio::test]
    async fn test_rejected_replace_changes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pep_config.json");
        let book = EndpointBook::open(EndpointStore::new(&path), managed()).await;
        let before = book.get();

        let mut bad = update();
        bad["B"].as_object_mut().unwrap().remove("self_ip");
        let err = book.replace(&bad).await.unwrap_err();

        assert_eq!(err.as_label(), "config_missing_field");
        assert_eq!(book.get(), before);
        assert_eq!(book.store().path(), path.as_path());
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_failed_save_keeps_current() {
        let dir = tempfile::tempdir().unwrap();
        let store = EndpointStore::new(dir.path().join("gone").join("pep_config.json"));
        let book = EndpointBook::open(store, managed()).await;
        let before = book.get();

        let err = book.replace(&update()).await.unwrap_err();
        assert_eq!(err.as_label(), "config_io");
        assert_eq!(book.get(), before);
    }
}

//! In-memory snapshot store.

use super::ArtifactStore;
use crate::core::OutputBag;
use crate::errors::ArtifactStoreError;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

/// Keeps snapshots in a map. Clones share the same map.
#[derive(Debug, Clone, Default)]
pub struct InMemoryArtifactStore {
    entries: Arc<Mutex<HashMap<(String, String), OutputBag>>>,
}

impl InMemoryArtifactStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of snapshots.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Returns true if no snapshots are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Returns true if a snapshot exists for the pair.
    #[must_use]
    pub fn contains(&self, run_id: &str, node: &str) -> bool {
        self.entries
            .lock()
            .contains_key(&(run_id.to_string(), node.to_string()))
    }
}

#[async_trait]
impl ArtifactStore for InMemoryArtifactStore {
    async fn save(&self, run_id: &str, node: &str, outputs: &OutputBag) -> Result<(), ArtifactStoreError> {
        let replaced = self
            .entries
            .lock()
            .insert((run_id.to_string(), node.to_string()), outputs.clone())
            .is_some();
        if replaced {
            tracing::warn!(run_id, node, "Replacing existing snapshot");
        }
        Ok(())
    }

    async fn load(&self, run_id: &str, node: &str) -> Result<Option<OutputBag>, ArtifactStoreError> {
        Ok(self
            .entries
            .lock()
            .get(&(run_id.to_string(), node.to_string()))
            .cloned())
    }

    fn locate(&self, run_id: &str, node: &str) -> String {
        format!("memory://{run_id}/{node}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_save_load_and_isolation_by_run() {
        let store = InMemoryArtifactStore::new();
        let mut bag = OutputBag::new();
        bag.insert("value".to_string(), json!(10));

        store.save("run1", "transform", &bag).await.unwrap();

        assert_eq!(store.load("run1", "transform").await.unwrap(), Some(bag));
        assert_eq!(store.load("run2", "transform").await.unwrap(), None);
        assert!(store.contains("run1", "transform"));
        assert_eq!(store.len(), 1);
        assert_eq!(store.locate("run1", "transform"), "memory://run1/transform");
    }

    #[tokio::test]
    async fn test_clones_share_entries() {
        let store = InMemoryArtifactStore::new();
        let clone = store.clone();

        clone.save("run1", "a", &OutputBag::new()).await.unwrap();
        assert!(!store.is_empty());
    }
}

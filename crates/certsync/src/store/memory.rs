//! In-memory credential store backend.
//!
//! Used by tests and by embedders that want reconciliation without
//! persistence. Clones share the same underlying map.

use std::sync::Arc;

use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use crate::errors::StoreError;
use crate::store::{ArtifactId, CredentialStore, StoredArtifact};

/// DashMap-backed credential store.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    artifacts: Arc<DashMap<ArtifactId, StoredArtifact>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored artifacts.
    pub fn len(&self) -> usize {
        self.artifacts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.artifacts.is_empty()
    }
}

#[async_trait]
impl CredentialStore for MemoryStore {
    async fn get(&self, id: &ArtifactId) -> Result<Option<StoredArtifact>, StoreError> {
        Ok(self.artifacts.get(id).map(|entry| entry.value().clone()))
    }

    async fn create(&self, artifact: &StoredArtifact) -> Result<(), StoreError> {
        match self.artifacts.entry(artifact.id.clone()) {
            Entry::Occupied(_) => Err(StoreError::AlreadyExists {
                id: artifact.id.to_string(),
            }),
            Entry::Vacant(vacant) => {
                vacant.insert(artifact.clone());
                Ok(())
            }
        }
    }

    async fn update(&self, artifact: &StoredArtifact) -> Result<(), StoreError> {
        match self.artifacts.get_mut(&artifact.id) {
            Some(mut entry) => {
                *entry = artifact.clone();
                Ok(())
            }
            None => Err(StoreError::NotFound {
                id: artifact.id.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn artifact(name: &str) -> StoredArtifact {
        let mut data = BTreeMap::new();
        data.insert("tls.crt".to_string(), b"cert".to_vec());
        StoredArtifact {
            id: ArtifactId::new(name, "default"),
            data,
            labels: BTreeMap::new(),
        }
    }

    #[tokio::test]
    async fn test_get_absent_is_none() {
        let store = MemoryStore::new();
        let result = store.get(&ArtifactId::new("nope", "default")).await.unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_create_then_get() {
        let store = MemoryStore::new();
        let artifact = artifact("tls-secret");

        store.create(&artifact).await.unwrap();

        let loaded = store.get(&artifact.id).await.unwrap();
        assert_eq!(loaded, Some(artifact));
    }

    #[tokio::test]
    async fn test_create_existing_fails() {
        let store = MemoryStore::new();
        let artifact = artifact("tls-secret");

        store.create(&artifact).await.unwrap();

        let result = store.create(&artifact).await;
        assert!(matches!(result, Err(StoreError::AlreadyExists { .. })));
    }

    #[tokio::test]
    async fn test_update_missing_fails() {
        let store = MemoryStore::new();
        let result = store.update(&artifact("tls-secret")).await;
        assert!(matches!(result, Err(StoreError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_update_overwrites() {
        let store = MemoryStore::new();
        let mut artifact = artifact("tls-secret");
        store.create(&artifact).await.unwrap();

        artifact
            .data
            .insert("tls.crt".to_string(), b"new cert".to_vec());
        store.update(&artifact).await.unwrap();

        let loaded = store.get(&artifact.id).await.unwrap().unwrap();
        assert_eq!(loaded.data["tls.crt"], b"new cert");
    }

    #[tokio::test]
    async fn test_clones_share_state() {
        let store = MemoryStore::new();
        let handle = store.clone();

        store.create(&artifact("tls-secret")).await.unwrap();

        assert_eq!(handle.len(), 1);
    }
}

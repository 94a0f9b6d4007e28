//! Filesystem credential store backend.
//!
//! # Directory Structure
//!
//! ```text
//! <root>/
//! └── <namespace>/
//!     └── <name>/
//!         ├── tls.crt       # PEM certificate
//!         ├── tls.key       # PEM private key (0600 on Unix)
//!         └── meta.json     # Artifact labels
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::errors::StoreError;
use crate::store::{ArtifactId, CredentialStore, StoredArtifact, TLS_KEY_KEY};

const META_FILE: &str = "meta.json";

/// Labels stored alongside the credential blobs.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct ArtifactMeta {
    #[serde(default)]
    labels: BTreeMap<String, String>,
}

/// Directory-per-credential store rooted at a base path.
#[derive(Debug)]
pub struct FsStore {
    base_path: PathBuf,
}

impl FsStore {
    /// Open (creating if needed) a store rooted at `base_path`.
    ///
    /// The root directory is created with restrictive permissions (0700 on
    /// Unix) since it will hold private keys.
    pub fn new(base_path: &Path) -> Result<Self, StoreError> {
        fs::create_dir_all(base_path).map_err(|source| StoreError::Io {
            target: base_path.display().to_string(),
            source,
        })?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(base_path, fs::Permissions::from_mode(0o700)).map_err(
                |source| StoreError::Io {
                    target: base_path.display().to_string(),
                    source,
                },
            )?;
        }

        debug!(store_path = %base_path.display(), "Opened credential store");

        Ok(Self {
            base_path: base_path.to_path_buf(),
        })
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    fn artifact_path(&self, id: &ArtifactId) -> PathBuf {
        self.base_path.join(&id.namespace).join(&id.name)
    }

    fn io_error(id: &ArtifactId, source: std::io::Error) -> StoreError {
        StoreError::Io {
            target: id.to_string(),
            source,
        }
    }

    fn write_artifact(&self, artifact: &StoredArtifact) -> Result<(), StoreError> {
        let dir = self.artifact_path(&artifact.id);
        fs::create_dir_all(&dir).map_err(|e| Self::io_error(&artifact.id, e))?;

        for (name, blob) in &artifact.data {
            let path = dir.join(name);
            fs::write(&path, blob).map_err(|e| Self::io_error(&artifact.id, e))?;

            // Private key material must not be group/world readable.
            #[cfg(unix)]
            if name == TLS_KEY_KEY {
                use std::os::unix::fs::PermissionsExt;
                fs::set_permissions(&path, fs::Permissions::from_mode(0o600))
                    .map_err(|e| Self::io_error(&artifact.id, e))?;
            }
        }

        let meta = ArtifactMeta {
            labels: artifact.labels.clone(),
        };
        let content = serde_json::to_string_pretty(&meta).map_err(|source| {
            StoreError::Metadata {
                id: artifact.id.to_string(),
                source,
            }
        })?;
        fs::write(dir.join(META_FILE), content).map_err(|e| Self::io_error(&artifact.id, e))?;

        Ok(())
    }
}

#[async_trait]
impl CredentialStore for FsStore {
    async fn get(&self, id: &ArtifactId) -> Result<Option<StoredArtifact>, StoreError> {
        let dir = self.artifact_path(id);
        if !dir.exists() {
            return Ok(None);
        }

        let mut data = BTreeMap::new();
        let entries = fs::read_dir(&dir).map_err(|e| Self::io_error(id, e))?;
        for entry in entries {
            let entry = entry.map_err(|e| Self::io_error(id, e))?;
            let Some(name) = entry.file_name().to_str().map(str::to_string) else {
                continue;
            };
            if name == META_FILE {
                continue;
            }
            let blob = fs::read(entry.path()).map_err(|e| Self::io_error(id, e))?;
            data.insert(name, blob);
        }

        let meta_path = dir.join(META_FILE);
        let labels = if meta_path.exists() {
            let content = fs::read_to_string(&meta_path).map_err(|e| Self::io_error(id, e))?;
            let meta: ArtifactMeta =
                serde_json::from_str(&content).map_err(|source| StoreError::Metadata {
                    id: id.to_string(),
                    source,
                })?;
            meta.labels
        } else {
            BTreeMap::new()
        };

        debug!(id = %id, blobs = data.len(), "Loaded stored credential");

        Ok(Some(StoredArtifact {
            id: id.clone(),
            data,
            labels,
        }))
    }

    async fn create(&self, artifact: &StoredArtifact) -> Result<(), StoreError> {
        let dir = self.artifact_path(&artifact.id);
        if dir.exists() {
            return Err(StoreError::AlreadyExists {
                id: artifact.id.to_string(),
            });
        }

        self.write_artifact(artifact)?;
        info!(id = %artifact.id, "Created stored credential");
        Ok(())
    }

    async fn update(&self, artifact: &StoredArtifact) -> Result<(), StoreError> {
        let dir = self.artifact_path(&artifact.id);
        if !dir.exists() {
            return Err(StoreError::NotFound {
                id: artifact.id.to_string(),
            });
        }

        self.write_artifact(artifact)?;
        info!(id = %artifact.id, "Updated stored credential");
        Ok(())
    }
}

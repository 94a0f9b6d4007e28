//! Credential store port and artifact types.
//!
//! The reconciler only ever talks to [`CredentialStore`]; backends decide
//! where the bytes live. Absence of an artifact is a valid result of `get`,
//! never an error.

mod fs;
mod memory;

pub use fs::FsStore;
pub use memory::MemoryStore;

use std::collections::BTreeMap;
use std::fmt;

use async_trait::async_trait;

use crate::errors::StoreError;

/// Blob key for the PEM certificate within a stored artifact.
pub const TLS_CERT_KEY: &str = "tls.crt";

/// Blob key for the PEM private key within a stored artifact.
pub const TLS_KEY_KEY: &str = "tls.key";

/// Identifies a credential within the store.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ArtifactId {
    /// Credential name.
    pub name: String,
    /// Namespace scoping the name.
    pub namespace: String,
}

impl ArtifactId {
    pub fn new(name: impl Into<String>, namespace: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespace: namespace.into(),
        }
    }
}

impl fmt::Display for ArtifactId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

/// A named set of byte blobs plus labels, as held by the credential store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredArtifact {
    /// Identifier of the credential.
    pub id: ArtifactId,
    /// Named byte blobs; the reconciler writes `tls.crt` and `tls.key`.
    pub data: BTreeMap<String, Vec<u8>>,
    /// Labels attached to the artifact's metadata.
    pub labels: BTreeMap<String, String>,
}

impl StoredArtifact {
    /// The PEM certificate blob, if present.
    pub fn certificate(&self) -> Option<&[u8]> {
        self.data.get(TLS_CERT_KEY).map(Vec::as_slice)
    }
}

/// The get/create/update contract the reconciler drives.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Fetch an artifact. Absence is `Ok(None)`, not an error.
    async fn get(&self, id: &ArtifactId) -> Result<Option<StoredArtifact>, StoreError>;

    /// Persist a new artifact. Fails with `AlreadyExists` if the id is taken.
    async fn create(&self, artifact: &StoredArtifact) -> Result<(), StoreError>;

    /// Overwrite an existing artifact. Fails with `NotFound` if the target
    /// no longer exists.
    async fn update(&self, artifact: &StoredArtifact) -> Result<(), StoreError>;
}

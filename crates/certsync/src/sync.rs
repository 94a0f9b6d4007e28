//! Certificate reconciliation cycles and the polling loop.
//!
//! One cycle fetches the stored credential, decides whether the certificate
//! inside still satisfies the spec, and regenerates + writes back only when
//! it does not. The loop repeats cycles at a fixed interval until cancelled;
//! a fatal cycle error stops the loop (retry policy belongs to the process
//! supervisor).

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration as StdDuration;

use time::{Duration, OffsetDateTime};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::ca::CaSigner;
use crate::cert::ParsedCertificate;
use crate::drift::needs_regeneration;
use crate::errors::SyncError;
use crate::generate::{generate, IssuedCertificate};
use crate::spec::CertificateSpec;
use crate::store::{ArtifactId, CredentialStore, StoredArtifact, TLS_CERT_KEY, TLS_KEY_KEY};

/// What a reconciliation cycle did to the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    /// The stored certificate satisfies the spec; nothing was written.
    Unchanged,
    /// No artifact existed; one was created.
    Created,
    /// The artifact was overwritten with a fresh certificate.
    Updated,
}

/// Reconciles one stored credential against the desired certificate spec.
///
/// Holds no cross-cycle state beyond its configuration: the CA material is
/// re-read from disk each time a regeneration is actually needed, so CA
/// files can be replaced between cycles without restarting.
pub struct Syncer<S> {
    store: S,
    id: ArtifactId,
    spec: CertificateSpec,
    ca_cert_path: PathBuf,
    ca_key_path: PathBuf,
    renew_before: Duration,
}

impl<S: CredentialStore> Syncer<S> {
    pub fn new(
        store: S,
        id: ArtifactId,
        spec: CertificateSpec,
        ca_cert_path: PathBuf,
        ca_key_path: PathBuf,
    ) -> Self {
        Self {
            store,
            id,
            spec,
            ca_cert_path,
            ca_key_path,
            renew_before: Duration::ZERO,
        }
    }

    /// Set the renewal buffer: regenerate when the stored certificate is
    /// within this much of expiry. Zero means exact-expiry semantics.
    pub fn with_renew_before(mut self, buffer: Duration) -> Self {
        self.renew_before = buffer;
        self
    }

    /// Run one reconciliation cycle.
    ///
    /// # Errors
    ///
    /// Store and generation failures abort the cycle. An unparsable stored
    /// certificate is not an error; it is replaced.
    pub async fn sync(&self) -> Result<SyncOutcome, SyncError> {
        let existing = self.store.get(&self.id).await?;
        let parsed = existing.as_ref().and_then(|artifact| self.parse_stored(artifact));

        let now = OffsetDateTime::now_utc();
        let Some(reason) = needs_regeneration(&self.spec, parsed.as_ref(), now, self.renew_before)
        else {
            info!(id = %self.id, subject = %self.spec.subject_cn, "Certificate in sync");
            return Ok(SyncOutcome::Unchanged);
        };

        info!(
            id = %self.id,
            subject = %self.spec.subject_cn,
            reason = %reason,
            "Regenerating certificate"
        );

        let signer = CaSigner::load(&self.ca_cert_path, &self.ca_key_path)?;
        let issued = generate(&self.spec, &signer)?;
        let artifact = self.build_artifact(&issued);

        if existing.is_some() {
            self.store.update(&artifact).await?;
            info!(id = %self.id, not_after = %issued.not_after, "Updated stored certificate");
            Ok(SyncOutcome::Updated)
        } else {
            self.store.create(&artifact).await?;
            info!(id = %self.id, not_after = %issued.not_after, "Created stored certificate");
            Ok(SyncOutcome::Created)
        }
    }

    /// Run reconciliation cycles until cancelled.
    ///
    /// The next cycle starts a fixed `interval` after the previous one
    /// completed. Cancellation is checked before each cycle and during the
    /// sleep. A fatal cycle error stops the loop and is returned.
    pub async fn run(
        &self,
        interval: StdDuration,
        cancel: CancellationToken,
    ) -> Result<(), SyncError> {
        info!(
            id = %self.id,
            interval_secs = interval.as_secs(),
            "Starting certificate sync loop"
        );

        loop {
            if cancel.is_cancelled() {
                info!(id = %self.id, "Sync loop cancelled");
                return Ok(());
            }

            self.sync().await?;

            tokio::select! {
                _ = cancel.cancelled() => {
                    info!(id = %self.id, "Sync loop cancelled");
                    return Ok(());
                }
                _ = tokio::time::sleep(interval) => {}
            }
        }
    }

    fn parse_stored(&self, artifact: &StoredArtifact) -> Option<ParsedCertificate> {
        let Some(blob) = artifact.certificate() else {
            warn!(id = %self.id, "Stored artifact has no certificate blob; will regenerate");
            return None;
        };
        match ParsedCertificate::from_pem(blob) {
            Ok(cert) => Some(cert),
            Err(e) => {
                warn!(
                    id = %self.id,
                    error = %e,
                    "Stored certificate is unparsable; will regenerate"
                );
                None
            }
        }
    }

    fn build_artifact(&self, issued: &IssuedCertificate) -> StoredArtifact {
        let mut data = BTreeMap::new();
        data.insert(TLS_CERT_KEY.to_string(), issued.cert_pem.clone().into_bytes());
        data.insert(TLS_KEY_KEY.to_string(), issued.key_pem.clone().into_bytes());
        StoredArtifact {
            id: self.id.clone(),
            data,
            labels: self.spec.labels.clone(),
        }
    }
}

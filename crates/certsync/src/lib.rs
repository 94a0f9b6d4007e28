//! Certsync Library
//!
//! Keeps a stored TLS certificate in sync with a desired specification: given
//! CA material and the wanted subject, SANs and validity window, a
//! reconciliation cycle checks the credential store and re-issues the
//! certificate only when it is missing, expired, or no longer matches.
//!
//! The core components:
//!
//! - **PEM Codec** ([`pem`]): DER ↔ PEM for CA material and generated output
//! - **CA Loader** ([`ca::CaSigner`]): CA certificate + key files → signer
//! - **Generator** ([`generate::generate`]): fresh key pair + CA-signed leaf
//! - **Drift Detector** ([`drift::needs_regeneration`]): missing / expired /
//!   subject / SAN comparison with a reason
//! - **Reconciler** ([`sync::Syncer`]): one idempotent fetch-compare-act
//!   cycle, or a cancellable fixed-interval loop
//! - **Credential Store Port** ([`store::CredentialStore`]): get/create/update
//!   contract, with in-memory and filesystem backends
//!
//! # Example
//!
//! ```ignore
//! use certsync::{ArtifactId, CertificateSpec, MemoryStore, Syncer};
//!
//! let spec = CertificateSpec {
//!     subject_cn: "svc.example.com".into(),
//!     dns_names: vec!["svc.example.com".into()],
//!     ip_addresses: vec![],
//!     validity_days: 60,
//!     labels: Default::default(),
//! };
//!
//! let syncer = Syncer::new(
//!     MemoryStore::new(),
//!     ArtifactId::new("tls-secret", "default"),
//!     spec,
//!     "./ca.pem".into(),
//!     "./ca-key.pem".into(),
//! );
//! let outcome = syncer.sync().await?;
//! ```

pub mod ca;
pub mod cert;
pub mod config;
pub mod drift;
pub mod errors;
pub mod generate;
pub mod pem;
pub mod spec;
pub mod store;
pub mod sync;

#[cfg(test)]
mod testutil;

pub use ca::CaSigner;
pub use cert::ParsedCertificate;
pub use config::Config;
pub use drift::{needs_regeneration, RegenReason};
pub use generate::{generate, IssuedCertificate};
pub use spec::CertificateSpec;
pub use store::{ArtifactId, CredentialStore, FsStore, MemoryStore, StoredArtifact};
pub use sync::{SyncOutcome, Syncer};

//! Error types for certificate reconciliation.

use std::path::PathBuf;

use thiserror::Error;

/// Errors decoding PEM input.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// Input held no parsable PEM block.
    #[error("no valid PEM block in input: {0}")]
    NoPemBlock(#[from] pem::PemError),
}

/// Errors parsing a stored certificate.
///
/// These are never fatal to a reconciliation cycle: an unparsable stored
/// certificate is treated as absent and regenerated.
#[derive(Debug, Error)]
pub enum ParseError {
    /// The stored blob was not valid PEM.
    #[error("invalid PEM: {0}")]
    Decode(#[from] DecodeError),

    /// The DER contents were not a valid X.509 certificate.
    #[error("invalid X.509 structure: {0}")]
    Certificate(String),
}

/// Errors loading CA material. Fatal at startup; never retried.
#[derive(Debug, Error)]
pub enum CaMaterialError {
    /// A CA file could not be read.
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The CA certificate file held no valid PEM block.
    #[error("CA certificate is not valid PEM: {0}")]
    CertificateDecode(#[source] DecodeError),

    /// The CA private key file held no valid PEM block.
    #[error("CA private key is not valid PEM: {0}")]
    KeyDecode(#[source] DecodeError),

    /// The CA certificate DER could not be parsed.
    #[error("failed to parse CA certificate: {0}")]
    CertificateParse(String),

    /// The CA private key DER could not be parsed (PKCS#8 expected).
    #[error("failed to parse CA private key: {0}")]
    KeyParse(String),
}

/// Errors generating a leaf certificate. Fatal to the current cycle.
#[derive(Debug, Error)]
pub enum GenerationError {
    /// Key-pair generation failed.
    #[error("failed to generate key pair: {0}")]
    KeyGeneration(String),

    /// A DNS name in the spec cannot be encoded into a SAN entry.
    #[error("invalid DNS name '{name}': {reason}")]
    InvalidDnsName { name: String, reason: String },

    /// Signing with the CA key failed.
    #[error("failed to sign certificate: {0}")]
    Signing(String),
}

/// Errors from the credential store.
///
/// Absence of an artifact on `get` is NOT an error; it is a valid
/// `Ok(None)` result.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Create was called for an identifier that already exists.
    #[error("credential {id} already exists")]
    AlreadyExists { id: String },

    /// Update was called for an identifier that no longer exists.
    #[error("credential {id} not found")]
    NotFound { id: String },

    /// Transport or filesystem failure talking to the store.
    #[error("store I/O failure for {target}: {source}")]
    Io {
        target: String,
        #[source]
        source: std::io::Error,
    },

    /// Artifact metadata could not be serialized or deserialized.
    #[error("corrupt metadata for {id}: {source}")]
    Metadata {
        id: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Errors that abort a reconciliation cycle.
#[derive(Debug, Error)]
pub enum SyncError {
    /// The credential store failed.
    #[error("credential store operation failed: {0}")]
    Store(#[from] StoreError),

    /// CA material could not be loaded.
    #[error("CA material unusable: {0}")]
    CaMaterial(#[from] CaMaterialError),

    /// Certificate generation failed.
    #[error("certificate generation failed: {0}")]
    Generation(#[from] GenerationError),
}

/// Errors assembling runtime configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The subject common name is required and must be non-empty.
    #[error("missing required subject common name")]
    MissingSubject,

    /// Certificate validity must be a positive number of days.
    #[error("certificate validity must be at least one day")]
    InvalidValidity,

    /// A label argument was not of the form key=value.
    #[error("invalid label '{0}': expected key=value")]
    InvalidLabel(String),

    /// An IP address in the spec did not parse.
    #[error("invalid IP address '{0}'")]
    InvalidIp(String),

    /// A duration string did not parse.
    #[error("invalid duration '{input}': {reason}")]
    InvalidDuration { input: String, reason: String },
}

//! CA material loading.
//!
//! Turns PEM-encoded CA certificate and private key files into a signer
//! usable for issuing leaf certificates. The loader does not check the CA
//! certificate's own validity or CA flags; unusable material surfaces as a
//! signing error on first use.

use std::fmt;
use std::fs;
use std::path::Path;

use rcgen::{Issuer, KeyPair};
use rustls_pki_types::CertificateDer;
use tracing::debug;

use crate::errors::CaMaterialError;
use crate::pem;

/// A CA certificate and matching private key, able to sign leaf certificates.
pub struct CaSigner {
    issuer: Issuer<'static, KeyPair>,
}

impl CaSigner {
    /// Load CA material from PEM files on disk.
    ///
    /// # Errors
    ///
    /// Returns [`CaMaterialError`] if either file is unreadable, holds no
    /// PEM block, or does not parse as a certificate / PKCS#8 key.
    pub fn load(cert_path: &Path, key_path: &Path) -> Result<Self, CaMaterialError> {
        let cert_pem = fs::read(cert_path).map_err(|source| CaMaterialError::Read {
            path: cert_path.to_path_buf(),
            source,
        })?;
        let key_pem = fs::read(key_path).map_err(|source| CaMaterialError::Read {
            path: key_path.to_path_buf(),
            source,
        })?;

        let signer = Self::from_pem(&cert_pem, &key_pem)?;
        debug!(
            cert = %cert_path.display(),
            key = %key_path.display(),
            "Loaded CA signing material"
        );
        Ok(signer)
    }

    /// Build a signer from in-memory PEM bytes.
    pub fn from_pem(cert_pem: &[u8], key_pem: &[u8]) -> Result<Self, CaMaterialError> {
        let cert_der = pem::decode(cert_pem).map_err(CaMaterialError::CertificateDecode)?;
        let key_der = pem::decode(key_pem).map_err(CaMaterialError::KeyDecode)?;

        let key = KeyPair::try_from(key_der.as_slice())
            .map_err(|e| CaMaterialError::KeyParse(e.to_string()))?;

        let cert_der = CertificateDer::from(cert_der);
        let issuer = Issuer::from_ca_cert_der(&cert_der, key)
            .map_err(|e| CaMaterialError::CertificateParse(e.to_string()))?;

        Ok(Self { issuer })
    }

    pub(crate) fn issuer(&self) -> &Issuer<'static, KeyPair> {
        &self.issuer
    }
}

impl fmt::Debug for CaSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CaSigner").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::CaMaterialError;
    use crate::testutil;

    #[test]
    fn test_from_pem_accepts_generated_ca() {
        let (cert_pem, key_pem) = testutil::ca_pem();
        let signer = CaSigner::from_pem(cert_pem.as_bytes(), key_pem.as_bytes());
        assert!(signer.is_ok());
    }

    #[test]
    fn test_load_from_files() {
        let (cert_pem, key_pem) = testutil::ca_pem();
        let dir = tempfile::TempDir::new().unwrap();
        let cert_path = dir.path().join("ca.pem");
        let key_path = dir.path().join("ca-key.pem");
        fs::write(&cert_path, cert_pem).unwrap();
        fs::write(&key_path, key_pem).unwrap();

        let signer = CaSigner::load(&cert_path, &key_path);
        assert!(signer.is_ok());
    }

    #[test]
    fn test_load_missing_file_is_read_error() {
        let dir = tempfile::TempDir::new().unwrap();
        let missing = dir.path().join("nope.pem");

        let result = CaSigner::load(&missing, &missing);
        assert!(matches!(result, Err(CaMaterialError::Read { .. })));
    }

    #[test]
    fn test_from_pem_rejects_garbage_certificate() {
        let (_, key_pem) = testutil::ca_pem();
        let result = CaSigner::from_pem(b"not pem at all", key_pem.as_bytes());
        assert!(matches!(result, Err(CaMaterialError::CertificateDecode(_))));
    }

    #[test]
    fn test_from_pem_rejects_garbage_key() {
        let (cert_pem, _) = testutil::ca_pem();
        let result = CaSigner::from_pem(cert_pem.as_bytes(), b"not pem at all");
        assert!(matches!(result, Err(CaMaterialError::KeyDecode(_))));
    }

    #[test]
    fn test_from_pem_rejects_non_key_der() {
        let (cert_pem, _) = testutil::ca_pem();
        // Valid PEM block, but the DER inside is not a PKCS#8 key.
        let bogus = crate::pem::encode(crate::pem::PRIVATE_KEY_TAG, b"\x30\x03\x02\x01\x01");
        let result = CaSigner::from_pem(cert_pem.as_bytes(), bogus.as_bytes());
        assert!(matches!(result, Err(CaMaterialError::KeyParse(_))));
    }
}

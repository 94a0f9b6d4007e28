//! Leaf certificate generation.
//!
//! Produces a freshly keyed, CA-signed certificate whose subject, SAN set,
//! and validity exactly reflect the input spec. Key pairs are never reused
//! across calls.

use std::net::IpAddr;

use rand::RngCore;
use rcgen::{
    string::Ia5String, CertificateParams, DistinguishedName, DnType, ExtendedKeyUsagePurpose, IsCa,
    KeyPair, KeyUsagePurpose, SanType, SerialNumber,
};
use time::{Duration, OffsetDateTime};
use tracing::debug;

use crate::ca::CaSigner;
use crate::errors::GenerationError;
use crate::pem;
use crate::spec::CertificateSpec;

/// Allowance for clock skew between this host and certificate consumers.
const NOT_BEFORE_SKEW: Duration = Duration::minutes(5);

/// Serial number entropy in bytes (128 bits).
const SERIAL_LEN: usize = 16;

/// A freshly generated, CA-signed leaf certificate.
///
/// The embedded attribute fields mirror what was actually written into the
/// certificate, so callers can log or assert on them without re-parsing.
#[derive(Debug, Clone)]
pub struct IssuedCertificate {
    /// PEM-encoded certificate.
    pub cert_pem: String,
    /// PEM-encoded PKCS#8 private key.
    pub key_pem: String,
    /// Subject common name embedded in the certificate.
    pub subject_cn: String,
    /// DNS SAN entries embedded in the certificate.
    pub dns_names: Vec<String>,
    /// IP SAN entries embedded in the certificate.
    pub ip_addresses: Vec<IpAddr>,
    /// Expiry timestamp embedded in the certificate.
    pub not_after: OffsetDateTime,
}

/// Generate a new leaf certificate for `spec`, signed by `signer`.
///
/// # Errors
///
/// Returns [`GenerationError`] on key-generation or signing failure; the
/// caller decides whether to retry.
pub fn generate(
    spec: &CertificateSpec,
    signer: &CaSigner,
) -> Result<IssuedCertificate, GenerationError> {
    let key = KeyPair::generate().map_err(|e| GenerationError::KeyGeneration(e.to_string()))?;

    let mut params = CertificateParams::default();

    let mut dn = DistinguishedName::new();
    dn.push(DnType::CommonName, spec.subject_cn.clone());
    params.distinguished_name = dn;

    params.is_ca = IsCa::NoCa;
    params.key_usages = vec![
        KeyUsagePurpose::DigitalSignature,
        KeyUsagePurpose::KeyEncipherment,
    ];
    params.extended_key_usages = vec![
        ExtendedKeyUsagePurpose::ServerAuth,
        ExtendedKeyUsagePurpose::ClientAuth,
    ];

    for name in &spec.dns_names {
        let dns = Ia5String::try_from(name.clone()).map_err(|e| GenerationError::InvalidDnsName {
            name: name.clone(),
            reason: e.to_string(),
        })?;
        params.subject_alt_names.push(SanType::DnsName(dns));
    }
    for ip in &spec.ip_addresses {
        params.subject_alt_names.push(SanType::IpAddress(*ip));
    }

    let now = OffsetDateTime::now_utc();
    let not_after = now + spec.validity_window();
    params.not_before = now - NOT_BEFORE_SKEW;
    params.not_after = not_after;

    let mut serial = [0u8; SERIAL_LEN];
    rand::thread_rng().fill_bytes(&mut serial);
    params.serial_number = Some(SerialNumber::from(serial.to_vec()));

    let cert = params
        .signed_by(&key, signer.issuer())
        .map_err(|e| GenerationError::Signing(e.to_string()))?;

    debug!(
        subject = %spec.subject_cn,
        not_after = %not_after,
        "Generated leaf certificate"
    );

    Ok(IssuedCertificate {
        cert_pem: pem::encode(pem::CERTIFICATE_TAG, cert.der().as_ref()),
        key_pem: pem::encode(pem::PRIVATE_KEY_TAG, &key.serialize_der()),
        subject_cn: spec.subject_cn.clone(),
        dns_names: spec.dns_names.clone(),
        ip_addresses: spec.ip_addresses.clone(),
        not_after,
    })
}

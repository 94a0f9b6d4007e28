//! Shared fixtures for unit tests: an ephemeral CA and leaf certificates
//! with chosen attributes. Nothing here ships in release builds.

use std::net::IpAddr;

use rcgen::{
    string::Ia5String, BasicConstraints, CertificateParams, DistinguishedName, DnType, IsCa,
    KeyPair, SanType,
};
use time::{Duration, OffsetDateTime};

use crate::ca::CaSigner;
use crate::spec::CertificateSpec;

/// Generate a throwaway CA, returning (certificate PEM, PKCS#8 key PEM).
pub(crate) fn ca_pem() -> (String, String) {
    let key = KeyPair::generate().unwrap();
    let mut params = CertificateParams::default();
    params.is_ca = IsCa::Ca(BasicConstraints::Unconstrained);
    let mut dn = DistinguishedName::new();
    dn.push(DnType::CommonName, "certsync test CA");
    params.distinguished_name = dn;
    let cert = params.self_signed(&key).unwrap();
    (cert.pem(), key.serialize_pem())
}

/// A ready-to-use signer backed by a throwaway CA.
pub(crate) fn ca_signer() -> CaSigner {
    let (cert_pem, key_pem) = ca_pem();
    CaSigner::from_pem(cert_pem.as_bytes(), key_pem.as_bytes()).unwrap()
}

/// Issue a leaf certificate with exactly the given attributes, bypassing
/// the generator so tests can produce expired or mismatched certificates.
pub(crate) fn leaf_pem(
    signer: &CaSigner,
    cn: &str,
    dns: &[&str],
    ips: &[IpAddr],
    not_after: OffsetDateTime,
) -> String {
    let key = KeyPair::generate().unwrap();
    let mut params = CertificateParams::default();
    let mut dn = DistinguishedName::new();
    dn.push(DnType::CommonName, cn);
    params.distinguished_name = dn;
    params.is_ca = IsCa::NoCa;
    for name in dns {
        params
            .subject_alt_names
            .push(SanType::DnsName(Ia5String::try_from(*name).unwrap()));
    }
    for ip in ips {
        params.subject_alt_names.push(SanType::IpAddress(*ip));
    }
    params.not_before = not_after - Duration::days(365);
    params.not_after = not_after;

    let cert = params.signed_by(&key, signer.issuer()).unwrap();
    cert.pem()
}

/// Build a spec from string-ish inputs.
pub(crate) fn spec(cn: &str, dns: &[&str], ips: &[&str], validity_days: u32) -> CertificateSpec {
    CertificateSpec {
        subject_cn: cn.to_string(),
        dns_names: dns.iter().map(|s| s.to_string()).collect(),
        ip_addresses: ips.iter().map(|s| s.parse().unwrap()).collect(),
        validity_days,
        labels: Default::default(),
    }
}

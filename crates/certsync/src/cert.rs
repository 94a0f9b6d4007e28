//! Parsing of stored leaf certificates.

use std::net::IpAddr;

use ::time::OffsetDateTime;
use x509_parser::prelude::*;

use crate::errors::ParseError;
use crate::pem;

/// The attributes of a previously issued certificate that drift detection
/// compares against the desired spec.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedCertificate {
    /// Subject common name; empty if the certificate carries none.
    pub subject_cn: String,
    /// DNS entries from the SAN extension.
    pub dns_names: Vec<String>,
    /// IP entries from the SAN extension.
    pub ip_addresses: Vec<IpAddr>,
    /// Expiry timestamp.
    pub not_after: OffsetDateTime,
}

impl ParsedCertificate {
    /// Parse a PEM-encoded certificate into its comparison attributes.
    pub fn from_pem(input: &[u8]) -> Result<Self, ParseError> {
        let der = pem::decode(input)?;
        let (_, cert) = X509Certificate::from_der(&der)
            .map_err(|e| ParseError::Certificate(e.to_string()))?;

        let subject_cn = cert
            .subject()
            .iter_common_name()
            .next()
            .and_then(|cn| cn.as_str().ok())
            .unwrap_or_default()
            .to_string();

        let mut dns_names = Vec::new();
        let mut ip_addresses = Vec::new();
        let san = cert
            .subject_alternative_name()
            .map_err(|e| ParseError::Certificate(e.to_string()))?;
        if let Some(san) = san {
            for name in &san.value.general_names {
                match name {
                    GeneralName::DNSName(dns) => dns_names.push((*dns).to_string()),
                    GeneralName::IPAddress(bytes) => {
                        if let Some(ip) = ip_from_bytes(bytes) {
                            ip_addresses.push(ip);
                        }
                    }
                    _ => {}
                }
            }
        }

        let not_after = cert.validity().not_after.to_datetime();

        Ok(Self {
            subject_cn,
            dns_names,
            ip_addresses,
            not_after,
        })
    }
}

/// SAN IP entries are raw octets: 4 for IPv4, 16 for IPv6.
fn ip_from_bytes(bytes: &[u8]) -> Option<IpAddr> {
    match bytes.len() {
        4 => <[u8; 4]>::try_from(bytes).ok().map(IpAddr::from),
        16 => <[u8; 16]>::try_from(bytes).ok().map(IpAddr::from),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ParseError;
    use crate::testutil;

    #[test]
    fn test_parse_extracts_subject_and_sans() {
        let signer = testutil::ca_signer();
        let not_after = OffsetDateTime::now_utc() + ::time::Duration::days(30);
        let cert_pem = testutil::leaf_pem(
            &signer,
            "svc.example.com",
            &["svc.example.com", "svc.internal"],
            &["10.0.0.1".parse().unwrap(), "::1".parse().unwrap()],
            not_after,
        );

        let parsed = ParsedCertificate::from_pem(cert_pem.as_bytes()).unwrap();
        assert_eq!(parsed.subject_cn, "svc.example.com");
        assert_eq!(parsed.dns_names, vec!["svc.example.com", "svc.internal"]);
        assert_eq!(
            parsed.ip_addresses,
            vec!["10.0.0.1".parse::<IpAddr>().unwrap(), "::1".parse().unwrap()]
        );
        // X.509 stores validity at second precision.
        assert!((parsed.not_after - not_after).abs() < ::time::Duration::seconds(1));
    }

    #[test]
    fn test_parse_certificate_without_sans() {
        let signer = testutil::ca_signer();
        let not_after = OffsetDateTime::now_utc() + ::time::Duration::days(30);
        let cert_pem = testutil::leaf_pem(&signer, "bare.example.com", &[], &[], not_after);

        let parsed = ParsedCertificate::from_pem(cert_pem.as_bytes()).unwrap();
        assert_eq!(parsed.subject_cn, "bare.example.com");
        assert!(parsed.dns_names.is_empty());
        assert!(parsed.ip_addresses.is_empty());
    }

    #[test]
    fn test_parse_rejects_non_pem() {
        let result = ParsedCertificate::from_pem(b"garbage");
        assert!(matches!(result, Err(ParseError::Decode(_))));
    }

    #[test]
    fn test_parse_rejects_non_certificate_der() {
        let pem = crate::pem::encode(crate::pem::CERTIFICATE_TAG, b"\x30\x03\x02\x01\x01");
        let result = ParsedCertificate::from_pem(pem.as_bytes());
        assert!(matches!(result, Err(ParseError::Certificate(_))));
    }

    #[test]
    fn test_ip_from_bytes_lengths() {
        assert_eq!(
            ip_from_bytes(&[10, 0, 0, 1]),
            Some("10.0.0.1".parse().unwrap())
        );
        assert_eq!(ip_from_bytes(&[0u8; 16]), Some("::".parse().unwrap()));
        assert_eq!(ip_from_bytes(&[1, 2, 3]), None);
    }
}

//! Desired certificate state.

use std::collections::BTreeMap;
use std::net::IpAddr;

use time::Duration;

/// The desired shape of the managed certificate, immutable for a run.
///
/// The label set rides along to the stored credential's metadata; it is
/// never embedded in the certificate itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertificateSpec {
    /// Subject common name. Required, non-empty.
    pub subject_cn: String,
    /// DNS subject-alternative names. May be empty.
    pub dns_names: Vec<String>,
    /// IP subject-alternative names. May be empty.
    pub ip_addresses: Vec<IpAddr>,
    /// Validity window in days from issuance. Positive.
    pub validity_days: u32,
    /// Labels attached to the stored credential.
    pub labels: BTreeMap<String, String>,
}

impl CertificateSpec {
    /// The validity window as a duration.
    pub fn validity_window(&self) -> Duration {
        Duration::days(i64::from(self.validity_days))
    }
}

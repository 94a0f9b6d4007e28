//! Drift detection between desired and stored certificate state.

use std::collections::BTreeSet;
use std::fmt;
use std::net::IpAddr;

use time::{Duration, OffsetDateTime};

use crate::cert::ParsedCertificate;
use crate::spec::CertificateSpec;

/// Why a stored certificate must be replaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegenReason {
    /// No usable certificate is stored.
    Missing,
    /// The stored certificate has expired, or falls within the renewal buffer.
    Expired,
    /// The stored subject common name no longer matches the spec.
    SubjectChanged,
    /// The stored SAN entries no longer match the spec.
    SanChanged,
}

impl fmt::Display for RegenReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            RegenReason::Missing => "missing",
            RegenReason::Expired => "expired",
            RegenReason::SubjectChanged => "subject changed",
            RegenReason::SanChanged => "SAN changed",
        };
        f.write_str(reason)
    }
}

/// Decide whether the stored certificate must be regenerated.
///
/// Rules are evaluated in order, short-circuiting on the first match:
/// absent, expired (within `renew_before` of `not_after`; zero buffer means
/// exact-expiry semantics), subject mismatch, SAN set mismatch. SAN
/// comparison is order-independent set equality over DNS names and IP
/// addresses separately.
///
/// Returns `None` when the stored certificate still satisfies the spec.
pub fn needs_regeneration(
    spec: &CertificateSpec,
    existing: Option<&ParsedCertificate>,
    now: OffsetDateTime,
    renew_before: Duration,
) -> Option<RegenReason> {
    let Some(existing) = existing else {
        return Some(RegenReason::Missing);
    };

    if existing.not_after <= now + renew_before {
        return Some(RegenReason::Expired);
    }

    if existing.subject_cn != spec.subject_cn {
        return Some(RegenReason::SubjectChanged);
    }

    let desired_dns: BTreeSet<&str> = spec.dns_names.iter().map(String::as_str).collect();
    let stored_dns: BTreeSet<&str> = existing.dns_names.iter().map(String::as_str).collect();
    if desired_dns != stored_dns {
        return Some(RegenReason::SanChanged);
    }

    let desired_ips: BTreeSet<IpAddr> = spec.ip_addresses.iter().copied().collect();
    let stored_ips: BTreeSet<IpAddr> = existing.ip_addresses.iter().copied().collect();
    if desired_ips != stored_ips {
        return Some(RegenReason::SanChanged);
    }

    None
}

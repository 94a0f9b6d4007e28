//! Runtime configuration assembled from the command line.
//!
//! Everything the reconciler needs is captured here once at startup and
//! passed down explicitly; the core carries no ambient global state.

use std::collections::BTreeMap;
use std::net::IpAddr;
use std::path::PathBuf;
use std::time::Duration;

use crate::errors::ConfigError;
use crate::spec::CertificateSpec;
use crate::store::ArtifactId;

/// Fully resolved configuration for one certsync run.
#[derive(Debug, Clone)]
pub struct Config {
    /// Desired certificate shape.
    pub spec: CertificateSpec,
    /// Credential to keep in sync; `None` means print to stdout.
    pub target: Option<ArtifactId>,
    /// Path to the CA certificate PEM file.
    pub ca_cert_path: PathBuf,
    /// Path to the CA private key PEM file.
    pub ca_key_path: PathBuf,
    /// Root directory of the filesystem credential store.
    pub store_path: PathBuf,
    /// Interval between sync cycles; `None` means one-shot.
    pub interval: Option<Duration>,
    /// Days before expiry at which to regenerate; 0 means on expiry only.
    pub renew_before_days: u32,
}

impl Config {
    /// Check invariants the type system cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.spec.subject_cn.is_empty() {
            return Err(ConfigError::MissingSubject);
        }
        if self.spec.validity_days == 0 {
            return Err(ConfigError::InvalidValidity);
        }
        Ok(())
    }
}

/// Parse repeatable `key=value` label arguments.
pub fn parse_labels(raw: &[String]) -> Result<BTreeMap<String, String>, ConfigError> {
    let mut labels = BTreeMap::new();
    for entry in raw {
        let Some((key, value)) = entry.split_once('=') else {
            return Err(ConfigError::InvalidLabel(entry.clone()));
        };
        if key.is_empty() {
            return Err(ConfigError::InvalidLabel(entry.clone()));
        }
        labels.insert(key.to_string(), value.to_string());
    }
    Ok(labels)
}

/// Parse a comma-separated list of DNS names. Empty input yields an empty
/// list; surrounding whitespace is trimmed.
pub fn parse_dns_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Parse a comma-separated list of IP addresses.
pub fn parse_ip_list(raw: &str) -> Result<Vec<IpAddr>, ConfigError> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse()
                .map_err(|_| ConfigError::InvalidIp(s.to_string()))
        })
        .collect()
}

/// Parse a human-readable duration such as "90s", "30m", "1h" or "1h30m".
///
/// Units: `s`, `m`, `h`, `d`. The result must be positive.
pub fn parse_duration(input: &str) -> Result<Duration, ConfigError> {
    let input = input.trim();
    if input.is_empty() {
        return Err(ConfigError::InvalidDuration {
            input: input.to_string(),
            reason: "empty".to_string(),
        });
    }

    let mut total_seconds: u64 = 0;
    let mut current = String::new();

    for c in input.chars() {
        match c {
            '0'..='9' => current.push(c),
            's' | 'm' | 'h' | 'd' => {
                let value: u64 = current.parse().map_err(|_| ConfigError::InvalidDuration {
                    input: input.to_string(),
                    reason: format!("missing number before '{c}'"),
                })?;
                let unit = match c {
                    's' => 1,
                    'm' => 60,
                    'h' => 3600,
                    'd' => 86_400,
                    _ => unreachable!(),
                };
                total_seconds = total_seconds.saturating_add(value.saturating_mul(unit));
                current.clear();
            }
            _ => {
                return Err(ConfigError::InvalidDuration {
                    input: input.to_string(),
                    reason: format!("unexpected character '{c}'"),
                });
            }
        }
    }

    if !current.is_empty() {
        return Err(ConfigError::InvalidDuration {
            input: input.to_string(),
            reason: "trailing number without a unit".to_string(),
        });
    }
    if total_seconds == 0 {
        return Err(ConfigError::InvalidDuration {
            input: input.to_string(),
            reason: "must be positive".to_string(),
        });
    }

    Ok(Duration::from_secs(total_seconds))
}

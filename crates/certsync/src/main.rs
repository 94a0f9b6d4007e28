//! Certsync - Main entry point
//!
//! Keeps a stored TLS certificate in sync with the desired specification,
//! re-issuing from a CA when it drifts or expires.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::info;

use certsync::config::{parse_dns_list, parse_duration, parse_ip_list, parse_labels, Config};
use certsync::{generate, ArtifactId, CaSigner, CertificateSpec, FsStore, Syncer};

/// Certsync - keeps a stored TLS certificate in sync with its specification
#[derive(Parser, Debug)]
#[command(name = "certsync")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the CA certificate
    #[arg(long = "cacert", env = "CERTSYNC_CACERT", default_value = "./ca.pem")]
    cacert: PathBuf,

    /// Path to the CA private key
    #[arg(long = "cakey", env = "CERTSYNC_CAKEY", default_value = "./ca-key.pem")]
    cakey: PathBuf,

    /// The certificate Subject Common Name
    #[arg(long = "subject")]
    subject: String,

    /// Certificate expiration in days
    #[arg(long = "expire", default_value_t = 60)]
    expire: u32,

    /// Comma-separated list of DNS alternative names
    #[arg(long = "dns", default_value = "")]
    dns: String,

    /// Comma-separated list of valid IP addresses
    #[arg(long = "ip", default_value = "")]
    ip: String,

    /// Label as key=value to put on the stored credential; repeatable
    #[arg(long = "label")]
    label: Vec<String>,

    /// Name of the credential to keep in sync (omit to print to stdout)
    #[arg(long = "name")]
    name: Option<String>,

    /// Namespace of the credential to keep in sync
    #[arg(long = "namespace", default_value = "default")]
    namespace: String,

    /// Root directory of the credential store
    #[arg(
        long = "store-path",
        env = "CERTSYNC_STORE_PATH",
        default_value = "./secrets"
    )]
    store_path: PathBuf,

    /// Interval to check if the cert is in sync (ex: 1h, 30m); omit for one-shot
    #[arg(long = "interval")]
    interval: Option<String>,

    /// Days before expiry at which to regenerate (0 = on expiry only)
    #[arg(long = "renew-before", default_value_t = 0)]
    renew_before: u32,

    /// Enable verbose logging (debug level)
    #[arg(long = "verbose")]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .init();

    let config = build_config(&cli)?;

    match config.target.clone() {
        None => generate_to_stdout(&config),
        Some(id) => run_syncer(config, id).await,
    }
}

fn build_config(cli: &Cli) -> Result<Config> {
    let labels = parse_labels(&cli.label)?;
    let dns_names = parse_dns_list(&cli.dns);
    let ip_addresses = parse_ip_list(&cli.ip)?;
    let interval = cli
        .interval
        .as_deref()
        .map(parse_duration)
        .transpose()
        .context("parameter --interval was not a valid duration")?;

    let spec = CertificateSpec {
        subject_cn: cli.subject.clone(),
        dns_names,
        ip_addresses,
        validity_days: cli.expire,
        labels,
    };
    let target = cli
        .name
        .clone()
        .map(|name| ArtifactId::new(name, cli.namespace.clone()));

    let config = Config {
        spec,
        target,
        ca_cert_path: cli.cacert.clone(),
        ca_key_path: cli.cakey.clone(),
        store_path: cli.store_path.clone(),
        interval,
        renew_before_days: cli.renew_before,
    };
    config.validate()?;
    Ok(config)
}

/// Direct generator path: no credential name, print the PEM pair to stdout.
fn generate_to_stdout(config: &Config) -> Result<()> {
    info!("No credential name provided, generating certificate on stdout");

    let signer = CaSigner::load(&config.ca_cert_path, &config.ca_key_path)
        .context("failed to read CA files")?;
    let issued = generate(&config.spec, &signer).context("unable to generate certificate")?;

    print!("{}{}", issued.cert_pem, issued.key_pem);
    Ok(())
}

async fn run_syncer(config: Config, id: ArtifactId) -> Result<()> {
    let store =
        FsStore::new(&config.store_path).context("failed to open the credential store")?;

    info!(
        subject = %config.spec.subject_cn,
        id = %id,
        store = %config.store_path.display(),
        "Syncing certificate"
    );

    let syncer = Syncer::new(
        store,
        id,
        config.spec.clone(),
        config.ca_cert_path.clone(),
        config.ca_key_path.clone(),
    )
    .with_renew_before(time::Duration::days(i64::from(config.renew_before_days)));

    match config.interval {
        None => {
            syncer.sync().await.context("unable to sync certificate")?;
            Ok(())
        }
        Some(interval) => {
            let cancel = CancellationToken::new();
            let signal_cancel = cancel.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    info!("Received interrupt, shutting down");
                    signal_cancel.cancel();
                }
            });

            info!(interval_secs = interval.as_secs(), "Monitoring for drift");
            syncer
                .run(interval, cancel)
                .await
                .context("unable to sync certificate")
        }
    }
}

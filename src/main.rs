use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Result, bail};
use clap::Parser;

use kubestatus_core::ClusterRegistry;
use kubestatus_k8s::{CredentialBundle, KubeconfigConnector};

mod config;
mod output;
mod poller;

use config::Settings;
use output::OutputFormat;
use poller::Poller;

/// Kubestatus - Poll Kubernetes workloads and infrastructure for dashboard status
#[derive(Parser, Debug)]
#[command(name = "kubestatus")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file (TOML)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Kubeconfig of a cluster to track, in addition to those in the config file
    #[arg(long, value_name = "FILE")]
    kubeconfig: Option<PathBuf>,

    /// Name of the cluster given with --kubeconfig
    #[arg(long, default_value = "default")]
    name: String,

    /// Seconds between refresh passes
    #[arg(long, value_name = "SECS")]
    interval: Option<u64>,

    /// Seconds before a single cluster call is abandoned
    #[arg(long, value_name = "SECS")]
    timeout: Option<u64>,

    /// Discover, print the status of every resource and exit
    #[arg(long)]
    once: bool,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    /// Delete the credential bundles when shutting down
    #[arg(long)]
    purge_credentials: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let result = run(args).await;

    if let Err(e) = &result {
        eprintln!("Error: {:#}", e);
    }

    result
}

async fn run(args: Args) -> Result<()> {
    let settings = settings(&args)?;
    let registry = activate_all(&settings).await?;

    if args.once {
        let emitted = output::emit(&registry.records(), args.format);
        let torn_down = teardown(registry, args.purge_credentials);
        return emitted.and(torn_down);
    }

    let poller = Poller::new(registry, settings.poll_interval(), args.format);
    let cancel = poller.cancel_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("shutting down");
        }
        cancel.cancel();
    });

    // Tear down even when polling failed, so purged bundles never linger
    let polled = poller.run().await;
    let torn_down = teardown(poller.into_registry(), args.purge_credentials);
    polled.and(torn_down)
}

/// Merge the config file with command line overrides
fn settings(args: &Args) -> Result<Settings> {
    let mut settings = match &args.config {
        Some(path) => Settings::load(path)?,
        None => Settings::default(),
    };

    if let Some(kubeconfig) = &args.kubeconfig {
        settings.add_cluster(args.name.clone(), kubeconfig.clone());
    }
    if let Some(interval) = args.interval {
        settings.poll_interval_secs = interval;
    }
    if let Some(timeout) = args.timeout {
        settings.request_timeout_secs = timeout;
    }

    settings.validate()?;
    Ok(settings)
}

/// Activate every configured cluster. A cluster that fails is reported and
/// left out; the others keep going.
async fn activate_all(settings: &Settings) -> Result<ClusterRegistry<KubeconfigConnector>> {
    let mut registry = ClusterRegistry::new();

    for cluster in &settings.clusters {
        let bundle = match CredentialBundle::open(&cluster.kubeconfig) {
            Ok(bundle) => bundle,
            Err(e) => {
                tracing::error!(
                    cluster = %cluster.name,
                    error = %format!("{:#}", anyhow::Error::from(e)),
                    "failed to load credential bundle"
                );
                continue;
            }
        };

        let connector = KubeconfigConnector::new(Arc::new(bundle), settings.request_timeout());
        if let Err(e) = registry.activate(&cluster.name, connector).await {
            tracing::error!(
                cluster = %cluster.name,
                error = %format!("{:#}", anyhow::Error::from(e)),
                "failed to activate cluster"
            );
        }
    }

    if registry.is_empty() {
        bail!("none of the configured clusters could be activated");
    }
    Ok(registry)
}

/// Drop every configuration, optionally deleting its credential bundle
fn teardown(
    mut registry: ClusterRegistry<KubeconfigConnector>,
    purge_credentials: bool,
) -> Result<()> {
    let names: Vec<String> = registry.names().map(str::to_string).collect();
    let entries: Vec<_> = names
        .iter()
        .filter_map(|name| registry.deactivate(name))
        .collect();

    if !purge_credentials {
        return Ok(());
    }
    remove_bundles(entries.iter().map(|entry| entry.connector().bundle()))
}

/// Delete every bundle, reporting each one that could not be removed
fn remove_bundles<'a>(bundles: impl IntoIterator<Item = &'a CredentialBundle>) -> Result<()> {
    let mut failed = 0;
    for bundle in bundles {
        if let Err(e) = bundle.remove() {
            tracing::error!(
                error = %format!("{:#}", anyhow::Error::from(e)),
                "failed to remove credential bundle"
            );
            failed += 1;
        }
    }

    if failed > 0 {
        bail!("{} credential bundle(s) could not be removed", failed);
    }
    Ok(())
}

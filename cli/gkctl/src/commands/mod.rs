//! CLI commands.

mod install;
mod wait;

use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use gko_cluster::{connect, Client, ClusterConfig};
use gko_converge::{PollConfig, Poller};
use tokio::sync::watch;
use tracing::{debug, warn};

use crate::output::OutputFormat;

/// gkctl - submit Gatekeeper resources and wait for them to converge.
#[derive(Debug, Parser)]
#[command(name = "gkctl")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Output format (table or json).
    #[arg(long, global = true, default_value = "table")]
    format: String,

    /// Delay between polls, in milliseconds.
    #[arg(long, global = true, env = "GKO_POLL_INTERVAL_MS", default_value_t = 50)]
    interval_ms: u64,

    /// Give up waiting after this many seconds.
    #[arg(long, global = true, env = "GKO_WAIT_TIMEOUT_SECS", default_value_t = 30)]
    timeout_secs: u64,

    /// Kubeconfig context to use.
    #[arg(long, global = true, env = "GKO_KUBE_CONTEXT")]
    context: Option<String>,

    /// Log level when RUST_LOG is unset.
    #[arg(long, global = true, env = "GKO_LOG_LEVEL", default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Create a Gatekeeper resource and wait for its Deployments.
    Install(install::InstallCommand),

    /// Wait for a single Deployment to reach a ready replica count.
    Wait(wait::WaitCommand),

    /// Show CLI version.
    Version,
}

impl Cli {
    pub fn log_level(&self) -> String {
        self.log_level.clone()
    }

    /// Run the CLI command.
    pub async fn run(self) -> Result<()> {
        let format = match self.format.as_str() {
            "json" => OutputFormat::Json,
            _ => OutputFormat::Table,
        };

        if let Commands::Version = self.command {
            println!("gkctl {}", env!("CARGO_PKG_VERSION"));
            return Ok(());
        }

        let poll = PollConfig::new(
            Duration::from_millis(self.interval_ms),
            Duration::from_secs(self.timeout_secs),
        )?;

        let ctx = CommandContext {
            format,
            poll,
            cluster: ClusterConfig {
                context: self.context,
                read_timeout: Some(poll.timeout),
            },
            shutdown: shutdown_on_ctrl_c(),
        };

        match self.command {
            Commands::Install(cmd) => cmd.run(ctx).await,
            Commands::Wait(cmd) => cmd.run(ctx).await,
            Commands::Version => Ok(()),
        }
    }
}

/// Flip the returned flag on Ctrl+C so in-flight waits stop at the next tick.
fn shutdown_on_ctrl_c() -> watch::Receiver<bool> {
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                warn!("Interrupted, cancelling wait");
                let _ = shutdown_tx.send(true);
            }
            Err(e) => debug!(error = %e, "Ctrl+C handler unavailable"),
        }
    });
    shutdown_rx
}

/// Shared command context.
pub struct CommandContext {
    pub format: OutputFormat,
    pub poll: PollConfig,
    pub cluster: ClusterConfig,
    pub shutdown: watch::Receiver<bool>,
}

impl CommandContext {
    /// Connect to the configured cluster.
    pub async fn client(&self) -> Result<Client> {
        connect(&self.cluster)
            .await
            .context("Failed to connect to the Kubernetes API")
    }

    /// A poller over `fetcher` using the configured cadence and shutdown flag.
    pub fn poller<F>(&self, fetcher: F) -> Poller<F> {
        Poller::new(fetcher, self.poll).with_shutdown(self.shutdown.clone())
    }
}

//! Install command (create a Gatekeeper and wait for its Deployments).

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use gko_cluster::{KubeDeployments, KubeGatekeepers};
use gko_gatekeeper::{load_from_path, InstallCheck, ReadinessMode, DEFAULT_NAMESPACE, SAMPLE_PATH};
use serde::Serialize;
use tabled::Tabled;

use crate::output::{print_output, print_single, print_success, OutputFormat};

use super::CommandContext;

/// Install command - submit desired state, then wait for convergence.
#[derive(Debug, Args)]
pub struct InstallCommand {
    /// Path to the Gatekeeper descriptor.
    #[arg(long, default_value = SAMPLE_PATH)]
    sample: PathBuf,

    /// Namespace the operator installs Gatekeeper into.
    #[arg(long, default_value = DEFAULT_NAMESPACE)]
    namespace: String,

    /// Readiness rule: match-spec, minimum, or at-least=N.
    #[arg(long, default_value = "match-spec")]
    mode: ReadinessMode,

    /// Reuse an existing Gatekeeper resource instead of failing.
    #[arg(long)]
    allow_existing: bool,
}

#[derive(Debug, Serialize, Tabled)]
struct ComponentRow {
    #[tabled(rename = "Component")]
    component: String,
    #[tabled(rename = "Deployment")]
    deployment: String,
    #[tabled(rename = "Rule")]
    rule: String,
    #[tabled(rename = "Desired")]
    desired: i32,
    #[tabled(rename = "Ready")]
    ready: i32,
    #[tabled(rename = "Rolled out")]
    rolled_out: bool,
    #[tabled(rename = "Attempts")]
    attempts: u32,
    #[tabled(rename = "Elapsed (ms)")]
    elapsed_ms: u64,
}

impl InstallCommand {
    pub async fn run(self, ctx: CommandContext) -> Result<()> {
        let desired = load_from_path(&self.sample)
            .with_context(|| format!("Failed to load {}", self.sample.display()))?;

        let client = ctx.client().await?;
        let check = InstallCheck::new(
            KubeGatekeepers::new(client.clone()),
            ctx.poller(KubeDeployments::new(client)),
            &self.namespace,
        )
        .with_mode(self.mode)
        .allow_existing(self.allow_existing);

        let report = check.run(&desired).await?;

        match ctx.format {
            OutputFormat::Json => print_single(&report),
            OutputFormat::Table => {
                let rows: Vec<ComponentRow> = report
                    .components
                    .iter()
                    .map(|c| ComponentRow {
                        component: c.component.to_string(),
                        deployment: c.identity.clone(),
                        rule: c.rule.clone(),
                        desired: c.desired_replicas,
                        ready: c.ready_replicas,
                        rolled_out: c.rollout_current,
                        attempts: c.attempts,
                        elapsed_ms: c.elapsed_ms,
                    })
                    .collect();
                print_output(&rows, ctx.format);
                print_success(&format!(
                    "Gatekeeper '{}' converged in {}ms",
                    report.name,
                    report.slowest().as_millis()
                ));
            }
        }

        Ok(())
    }
}

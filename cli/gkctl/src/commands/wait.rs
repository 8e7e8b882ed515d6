//! Wait command (single Deployment readiness).

use anyhow::Result;
use clap::Args;
use gko_cluster::KubeDeployments;
use gko_converge::{ConvergencePredicate, ObjectIdentity, ScalarPredicate};
use gko_gatekeeper::DeploymentObservation;
use serde::Serialize;
use tabled::Tabled;

use crate::output::{print_output, print_success, OutputFormat};

use super::CommandContext;

/// Wait command - poll one Deployment until enough replicas are ready.
#[derive(Debug, Args)]
pub struct WaitCommand {
    /// Deployment as NAMESPACE/NAME.
    target: ObjectIdentity,

    /// Ready replica count to wait for.
    #[arg(long)]
    replicas: i64,

    /// Accept any count at or above --replicas.
    #[arg(long)]
    at_least: bool,
}

#[derive(Debug, Serialize, Tabled)]
struct WaitRow {
    #[tabled(rename = "Deployment")]
    deployment: String,
    #[tabled(rename = "Rule")]
    rule: String,
    #[tabled(rename = "Ready")]
    ready: i32,
    #[tabled(rename = "Attempts")]
    attempts: u32,
    #[tabled(rename = "Elapsed (ms)")]
    elapsed_ms: u64,
}

fn ready_replicas(observed: &DeploymentObservation) -> i64 {
    i64::from(observed.ready_replicas)
}

fn requested(replicas: &i64) -> i64 {
    *replicas
}

/// Readiness rule for a literal replica count.
fn readiness(replicas: i64, at_least: bool) -> ScalarPredicate<DeploymentObservation, i64> {
    if at_least {
        ScalarPredicate::at_least("ready_replicas", ready_replicas, replicas)
    } else {
        ScalarPredicate::exact("ready_replicas", ready_replicas, requested)
    }
}

impl WaitCommand {
    pub async fn run(self, ctx: CommandContext) -> Result<()> {
        if self.replicas < 0 {
            anyhow::bail!("--replicas must be non-negative");
        }

        let client = ctx.client().await?;
        let poller = ctx.poller(KubeDeployments::new(client));
        let predicate = readiness(self.replicas, self.at_least);

        let report = poller
            .await_convergence(&self.target, &self.replicas, &predicate)
            .await;
        let attempts = report.attempts;
        let elapsed_ms = report.elapsed.as_millis() as u64;
        let observed = report.into_result(&self.target.name)?;

        let row = WaitRow {
            deployment: self.target.to_string(),
            rule: predicate.describe(&self.replicas),
            ready: observed.ready_replicas,
            attempts,
            elapsed_ms,
        };
        print_output(&[row], ctx.format);
        if let OutputFormat::Table = ctx.format {
            print_success(&format!("{} is ready", self.target));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case(false, 2, false)]
    #[case(false, 3, true)]
    #[case(false, 4, false)]
    #[case(true, 2, false)]
    #[case(true, 4, true)]
    fn test_readiness(#[case] at_least: bool, #[case] ready: i32, #[case] expected: bool) {
        let predicate = readiness(3, at_least);
        let observed = DeploymentObservation::ready(ready);
        assert_eq!(predicate.is_converged(&observed, &3), expected);
    }

    #[test]
    fn test_readiness_describe() {
        assert_eq!(readiness(3, false).describe(&3), "ready_replicas == 3");
        assert_eq!(readiness(1, true).describe(&1), "ready_replicas >= 1");
    }
}

//! Error display for the CLI.

use colored::Colorize;
use gko_cluster::ClusterError;
use gko_converge::ConvergeError;
use gko_gatekeeper::{InstallError, LoadError, SubmitError};

/// What to suggest for a failure, if anything.
fn hint(err: &anyhow::Error) -> Option<&'static str> {
    let converge = err.downcast_ref::<ConvergeError>().or_else(|| {
        err.downcast_ref::<InstallError>().and_then(|e| match e {
            InstallError::Converge(c) => Some(c),
            InstallError::Submit(_) => None,
        })
    });

    if let Some(InstallError::Submit(submit)) = err.downcast_ref::<InstallError>() {
        return match submit {
            SubmitError::AlreadyExists(_) => {
                Some("Hint: Pass --allow-existing to wait on the existing resource.")
            }
            SubmitError::Rejected { code: 401 | 403, .. } => {
                Some("Hint: You may not have permission to create Gatekeeper resources.")
            }
            SubmitError::Rejected { code: 404, .. } => {
                Some("Hint: Is the Gatekeeper CRD installed? Deploy the operator first.")
            }
            SubmitError::Rejected { .. } => None,
            SubmitError::Transport { .. } => {
                Some("Hint: Check that the cluster API server is reachable.")
            }
        };
    }

    match converge {
        Some(ConvergeError::TimedOut { .. }) => {
            return Some("Hint: Check the operator logs, or raise --timeout-secs.");
        }
        Some(ConvergeError::Failed { .. }) => {
            return Some("Hint: Reads failed outright; check RBAC for Deployments.");
        }
        _ => {}
    }

    if err.downcast_ref::<ClusterError>().is_some() {
        return Some("Hint: Check your kubeconfig, or pass --context.");
    }
    if err.downcast_ref::<LoadError>().is_some() {
        return Some("Hint: Pass --sample with the path to a Gatekeeper YAML descriptor.");
    }

    None
}

/// Print an error in a user-friendly format.
pub fn print_error(err: &anyhow::Error) {
    eprintln!("{} {:#}", "Error:".red().bold(), err);

    if let Some(hint) = hint(err) {
        eprintln!("\n{}", hint.yellow());
    }
}

//! Cluster connection errors.

use kube::config::{InferConfigError, KubeconfigError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClusterError {
    #[error("failed to load kubeconfig: {0}")]
    Kubeconfig(#[from] KubeconfigError),

    #[error("failed to infer cluster configuration: {0}")]
    Infer(#[from] InferConfigError),

    #[error("failed to build Kubernetes client: {0}")]
    Client(#[from] kube::Error),
}

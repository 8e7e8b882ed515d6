//! Kubernetes client construction.

use std::time::Duration;

use kube::config::KubeConfigOptions;
use kube::{Client, Config};
use tracing::{debug, info};

use crate::error::ClusterError;

/// How to reach the cluster.
#[derive(Debug, Clone, Default)]
pub struct ClusterConfig {
    /// Kubeconfig context to use. Inferred (kubeconfig, then in-cluster) when unset.
    pub context: Option<String>,

    /// Per-request read timeout.
    pub read_timeout: Option<Duration>,
}

/// Build a client for the configured cluster.
pub async fn connect(config: &ClusterConfig) -> Result<Client, ClusterError> {
    let mut kube_config = match &config.context {
        Some(context) => {
            debug!(context = %context, "Loading kubeconfig context");
            let options = KubeConfigOptions {
                context: Some(context.clone()),
                ..Default::default()
            };
            Config::from_kubeconfig(&options).await?
        }
        None => Config::infer().await?,
    };

    if let Some(timeout) = config.read_timeout {
        kube_config.read_timeout = Some(timeout);
    }

    info!(cluster_url = %kube_config.cluster_url, "Connecting to Kubernetes API");
    let client = Client::try_from(kube_config)?;
    Ok(client)
}

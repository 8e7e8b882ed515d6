//! Deployment reads for the convergence poller.

use async_trait::async_trait;
use gko_converge::{FetchError, ObjectFetcher, ObjectIdentity};
use gko_gatekeeper::DeploymentObservation;
use k8s_openapi::api::apps::v1::Deployment;
use kube::api::Api;
use kube::Client;
use tracing::trace;

/// Reads Deployment status through the Kubernetes API.
#[derive(Clone)]
pub struct KubeDeployments {
    client: Client,
}

impl KubeDeployments {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ObjectFetcher<DeploymentObservation> for KubeDeployments {
    async fn fetch(&self, identity: &ObjectIdentity) -> Result<DeploymentObservation, FetchError> {
        let api: Api<Deployment> = Api::namespaced(self.client.clone(), &identity.namespace);

        match api.get(&identity.name).await {
            Ok(deployment) => {
                let observed = observe(&deployment);
                trace!(
                    identity = %identity,
                    ready_replicas = observed.ready_replicas,
                    "Fetched deployment"
                );
                Ok(observed)
            }
            Err(err) => Err(classify(identity, err)),
        }
    }
}

/// Extract the fields the readiness predicates look at.
pub fn observe(deployment: &Deployment) -> DeploymentObservation {
    let status = deployment.status.as_ref();

    DeploymentObservation {
        spec_replicas: deployment.spec.as_ref().and_then(|s| s.replicas),
        ready_replicas: status.and_then(|s| s.ready_replicas).unwrap_or(0),
        available_replicas: status.and_then(|s| s.available_replicas).unwrap_or(0),
        updated_replicas: status.and_then(|s| s.updated_replicas).unwrap_or(0),
        generation: deployment.metadata.generation,
        observed_generation: status.and_then(|s| s.observed_generation),
    }
}

/// HTTP 404 is the only retryable answer; everything else is fatal.
pub fn classify(identity: &ObjectIdentity, err: kube::Error) -> FetchError {
    match err {
        kube::Error::Api(ae) if ae.code == 404 => FetchError::NotFound(identity.clone()),
        err => FetchError::other(identity.clone(), err),
    }
}

//! Install check: submit desired state, then wait for every component.
//!
//! Submission is a precondition. If the control plane does not accept the
//! resource, no polling happens at all.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use gko_converge::{await_all, ObjectFetcher, ObjectIdentity, PollReport, Poller};
use serde::Serialize;
use tracing::{info, warn};

use crate::deployment::{install_targets, Component, DeploymentObservation, ReadinessMode};
use crate::error::{InstallError, SubmitError};
use crate::types::Gatekeeper;

/// Control-plane write API for Gatekeeper resources.
#[async_trait]
pub trait GatekeeperApi: Send + Sync {
    /// Create the resource. Invoked once, before polling begins.
    async fn create(&self, gatekeeper: &Gatekeeper) -> Result<(), SubmitError>;
}

#[async_trait]
impl<T: GatekeeperApi + ?Sized> GatekeeperApi for Arc<T> {
    async fn create(&self, gatekeeper: &Gatekeeper) -> Result<(), SubmitError> {
        (**self).create(gatekeeper).await
    }
}

/// Per-component result of a successful install check.
#[derive(Debug, Clone, Serialize)]
pub struct ComponentReport {
    pub component: Component,
    pub identity: String,
    pub rule: String,
    /// Replica count the desired state asks for.
    pub desired_replicas: i32,
    pub ready_replicas: i32,
    /// Whether the Deployment controller had seen the latest spec.
    pub rollout_current: bool,
    pub attempts: u32,
    pub elapsed_ms: u64,
}

/// Result of a successful install check.
#[derive(Debug, Clone, Serialize)]
pub struct InstallReport {
    pub name: String,
    pub namespace: String,
    pub components: Vec<ComponentReport>,
}

impl InstallReport {
    /// Longest single component wait.
    pub fn slowest(&self) -> Duration {
        self.components
            .iter()
            .map(|c| Duration::from_millis(c.elapsed_ms))
            .max()
            .unwrap_or_default()
    }
}

/// Submits a Gatekeeper resource and waits for its Deployments.
pub struct InstallCheck<A, F> {
    api: A,
    poller: Poller<F>,
    namespace: String,
    mode: ReadinessMode,
    allow_existing: bool,
}

impl<A, F> InstallCheck<A, F>
where
    A: GatekeeperApi,
    F: ObjectFetcher<DeploymentObservation>,
{
    pub fn new(api: A, poller: Poller<F>, namespace: impl Into<String>) -> Self {
        Self {
            api,
            poller,
            namespace: namespace.into(),
            mode: ReadinessMode::default(),
            allow_existing: false,
        }
    }

    pub fn with_mode(mut self, mode: ReadinessMode) -> Self {
        self.mode = mode;
        self
    }

    /// Treat an already existing resource as successfully submitted.
    pub fn allow_existing(mut self, allow: bool) -> Self {
        self.allow_existing = allow;
        self
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn poller(&self) -> &Poller<F> {
        &self.poller
    }

    /// Submit `desired` into the check's namespace and wait for convergence.
    pub async fn run(&self, desired: &Gatekeeper) -> Result<InstallReport, InstallError> {
        let desired = desired.with_namespace(&self.namespace);

        info!(
            name = %desired.name(),
            namespace = %self.namespace,
            "Creating Gatekeeper resource"
        );
        match self.api.create(&desired).await {
            Ok(()) => {}
            Err(SubmitError::AlreadyExists(name)) if self.allow_existing => {
                warn!(name = %name, "Gatekeeper resource already exists, reusing it");
            }
            Err(err) => return Err(InstallError::Submit(err)),
        }

        let targets = install_targets(&self.namespace, self.mode);
        let reports = await_all(&self.poller, &desired, &targets).await?;

        let components = Component::ALL
            .iter()
            .zip(targets.iter())
            .zip(reports)
            .map(|((component, target), report)| ComponentReport {
                component: *component,
                identity: target.identity.to_string(),
                rule: target.predicate.describe(&desired),
                desired_replicas: component.desired_replicas(&desired),
                ready_replicas: ready_count(&report),
                rollout_current: report
                    .outcome
                    .last_observed()
                    .is_some_and(DeploymentObservation::is_current),
                attempts: report.attempts,
                elapsed_ms: report.elapsed.as_millis() as u64,
            })
            .collect();

        Ok(InstallReport {
            name: desired.name().to_string(),
            namespace: self.namespace.clone(),
            components,
        })
    }

    /// Wait for a single component without submitting anything.
    pub async fn wait_for(
        &self,
        desired: &Gatekeeper,
        component: Component,
    ) -> PollReport<DeploymentObservation> {
        let identity: ObjectIdentity = component.identity(&self.namespace);
        let predicate = component.readiness(self.mode);
        self.poller
            .await_convergence(&identity, desired, &predicate)
            .await
    }
}

fn ready_count(report: &PollReport<DeploymentObservation>) -> i32 {
    report
        .outcome
        .last_observed()
        .map(|observed| observed.ready_replicas)
        .unwrap_or(0)
}

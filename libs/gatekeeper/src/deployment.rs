//! Gatekeeper component Deployments and their readiness predicates.

use std::fmt;
use std::str::FromStr;

use gko_converge::{ObjectIdentity, ScalarPredicate, WaitTarget};
use serde::{Deserialize, Serialize};

use crate::types::{Gatekeeper, DEFAULT_AUDIT_REPLICAS, DEFAULT_WEBHOOK_REPLICAS};

/// Snapshot of a Deployment's status, fetched fresh on every poll.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentObservation {
    /// `spec.replicas` as seen by the control plane.
    pub spec_replicas: Option<i32>,
    pub ready_replicas: i32,
    pub available_replicas: i32,
    pub updated_replicas: i32,
    pub generation: Option<i64>,
    pub observed_generation: Option<i64>,
}

impl DeploymentObservation {
    /// An observation with only the ready count set.
    pub fn ready(ready_replicas: i32) -> Self {
        Self {
            ready_replicas,
            ..Default::default()
        }
    }

    /// Whether the deployment controller has seen the latest spec.
    pub fn is_current(&self) -> bool {
        match (self.generation, self.observed_generation) {
            (Some(generation), Some(observed)) => observed >= generation,
            _ => true,
        }
    }
}

fn ready_replicas(observed: &DeploymentObservation) -> i64 {
    i64::from(observed.ready_replicas)
}

fn desired_webhook_replicas(desired: &Gatekeeper) -> i64 {
    i64::from(desired.webhook_replicas())
}

fn desired_audit_replicas(desired: &Gatekeeper) -> i64 {
    i64::from(desired.audit_replicas())
}

/// The Gatekeeper sub-components installed by the operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Component {
    /// Admission webhook; scaled by `spec.webhook.replicas`.
    ControllerManager,

    /// Audit controller; scaled by `spec.audit.replicas`.
    Audit,
}

impl Component {
    pub const ALL: [Component; 2] = [Component::ControllerManager, Component::Audit];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ControllerManager => "controller-manager",
            Self::Audit => "audit",
        }
    }

    /// Name of the Deployment the operator creates for this component.
    pub fn deployment_name(&self) -> &'static str {
        match self {
            Self::ControllerManager => "gatekeeper-controller-manager",
            Self::Audit => "gatekeeper-audit",
        }
    }

    pub fn identity(&self, namespace: &str) -> ObjectIdentity {
        ObjectIdentity::new(namespace, self.deployment_name())
    }

    /// Replica count the desired state asks for.
    pub fn desired_replicas(&self, desired: &Gatekeeper) -> i32 {
        match self {
            Self::ControllerManager => desired.webhook_replicas(),
            Self::Audit => desired.audit_replicas(),
        }
    }

    /// Fixed floor used by [`ReadinessMode::Minimum`].
    pub fn minimum_replicas(&self) -> i32 {
        match self {
            Self::ControllerManager => DEFAULT_WEBHOOK_REPLICAS,
            Self::Audit => DEFAULT_AUDIT_REPLICAS,
        }
    }

    /// Readiness predicate for this component in the given mode.
    pub fn readiness(&self, mode: ReadinessMode) -> ScalarPredicate<DeploymentObservation, Gatekeeper> {
        match mode {
            ReadinessMode::MatchSpec => {
                let desired_of: fn(&Gatekeeper) -> i64 = match self {
                    Self::ControllerManager => desired_webhook_replicas,
                    Self::Audit => desired_audit_replicas,
                };
                ScalarPredicate::exact("ready_replicas", ready_replicas, desired_of)
            }
            ReadinessMode::Minimum => ScalarPredicate::at_least(
                "ready_replicas",
                ready_replicas,
                i64::from(self.minimum_replicas()),
            ),
            ReadinessMode::AtLeast(floor) => {
                ScalarPredicate::at_least("ready_replicas", ready_replicas, i64::from(floor))
            }
        }
    }

    pub fn wait_target(
        &self,
        namespace: &str,
        mode: ReadinessMode,
    ) -> WaitTarget<DeploymentObservation, Gatekeeper> {
        WaitTarget::new(self.as_str(), self.identity(namespace), self.readiness(mode))
    }
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How ready replicas are compared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReadinessMode {
    /// Ready replicas equal the replica count in the desired spec.
    #[default]
    MatchSpec,

    /// Ready replicas reach the operator's default counts (3 webhook, 1 audit).
    Minimum,

    /// Ready replicas reach an explicit floor.
    AtLeast(i32),
}

impl FromStr for ReadinessMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "match-spec" | "exact" => Ok(Self::MatchSpec),
            "minimum" => Ok(Self::Minimum),
            other => match other.strip_prefix("at-least=") {
                Some(n) => n
                    .parse()
                    .map(Self::AtLeast)
                    .map_err(|_| format!("invalid replica floor '{n}'")),
                None => Err(format!(
                    "unknown readiness mode '{other}' (expected match-spec, minimum or at-least=N)"
                )),
            },
        }
    }
}

/// Wait targets for every component the desired state installs.
pub fn install_targets(
    namespace: &str,
    mode: ReadinessMode,
) -> Vec<WaitTarget<DeploymentObservation, Gatekeeper>> {
    Component::ALL
        .iter()
        .map(|component| component.wait_target(namespace, mode))
        .collect()
}

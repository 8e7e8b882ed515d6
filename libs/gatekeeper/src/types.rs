//! Gatekeeper custom resource model.
//!
//! Mirrors `operator.gatekeeper.sh/v1alpha1, Kind=Gatekeeper`. Every spec
//! field is optional; the operator fills in defaults.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::LoadError;

// =============================================================================
// Resource Constants
// =============================================================================

pub const API_GROUP: &str = "operator.gatekeeper.sh";
pub const API_VERSION: &str = "operator.gatekeeper.sh/v1alpha1";
pub const KIND: &str = "Gatekeeper";
pub const PLURAL: &str = "gatekeepers";

/// Namespace the operator installs Gatekeeper into.
pub const DEFAULT_NAMESPACE: &str = "gatekeeper-system";

/// Replica count the operator uses for the webhook when unset.
pub const DEFAULT_WEBHOOK_REPLICAS: i32 = 3;

/// Replica count the operator uses for audit when unset.
pub const DEFAULT_AUDIT_REPLICAS: i32 = 1;

// =============================================================================
// Resource
// =============================================================================

/// Desired state for a Gatekeeper installation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Gatekeeper {
    pub api_version: String,
    pub kind: String,
    pub metadata: ObjectMeta,
    #[serde(default)]
    pub spec: GatekeeperSpec,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ObjectMeta {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub annotations: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GatekeeperSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<ImageConfig>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audit: Option<AuditConfig>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validating_webhook: Option<Mode>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub webhook: Option<WebhookConfig>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_selector: Option<BTreeMap<String, String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pod_annotations: Option<BTreeMap<String, String>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_pull_policy: Option<PullPolicy>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replicas: Option<i32>,

    /// Go duration string, e.g. `60s`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audit_interval: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub constraint_violation_limit: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audit_from_cache: Option<Mode>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audit_chunk_size: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_level: Option<LogLevel>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emit_audit_events: Option<Mode>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replicas: Option<i32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_level: Option<LogLevel>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emit_admission_events: Option<Mode>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure_policy: Option<FailurePolicy>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Mode {
    Enabled,
    Disabled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogLevel {
    Debug,
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FailurePolicy {
    Ignore,
    Fail,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PullPolicy {
    Always,
    IfNotPresent,
    Never,
}

impl Gatekeeper {
    /// A minimal resource with the given name and an empty spec.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            api_version: API_VERSION.to_string(),
            kind: KIND.to_string(),
            metadata: ObjectMeta {
                name: name.into(),
                ..Default::default()
            },
            spec: GatekeeperSpec::default(),
        }
    }

    pub fn name(&self) -> &str {
        &self.metadata.name
    }

    pub fn namespace(&self) -> Option<&str> {
        self.metadata.namespace.as_deref()
    }

    /// Copy of this resource targeting `namespace`.
    pub fn with_namespace(&self, namespace: impl Into<String>) -> Self {
        let mut copy = self.clone();
        copy.metadata.namespace = Some(namespace.into());
        copy
    }

    /// Desired webhook (controller manager) replicas, with operator default.
    pub fn webhook_replicas(&self) -> i32 {
        self.spec
            .webhook
            .as_ref()
            .and_then(|w| w.replicas)
            .unwrap_or(DEFAULT_WEBHOOK_REPLICAS)
    }

    /// Desired audit replicas, with operator default.
    pub fn audit_replicas(&self) -> i32 {
        self.spec
            .audit
            .as_ref()
            .and_then(|a| a.replicas)
            .unwrap_or(DEFAULT_AUDIT_REPLICAS)
    }

    /// Validate identity and scalar fields.
    pub fn validate(&self) -> Result<(), LoadError> {
        if self.api_version != API_VERSION {
            return Err(LoadError::Invalid(format!(
                "unexpected apiVersion '{}', expected '{}'",
                self.api_version, API_VERSION
            )));
        }
        if self.kind != KIND {
            return Err(LoadError::Invalid(format!(
                "unexpected kind '{}', expected '{}'",
                self.kind, KIND
            )));
        }
        if self.metadata.name.trim().is_empty() {
            return Err(LoadError::Invalid("metadata.name is required".to_string()));
        }
        if self.webhook_replicas() < 0 {
            return Err(LoadError::Invalid(
                "spec.webhook.replicas must not be negative".to_string(),
            ));
        }
        if self.audit_replicas() < 0 {
            return Err(LoadError::Invalid(
                "spec.audit.replicas must not be negative".to_string(),
            ));
        }
        Ok(())
    }
}

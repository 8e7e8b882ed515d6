//! Gatekeeper desired state and install convergence checks.
//!
//! This library knows what a Gatekeeper installation should look like:
//!
//! - **Desired state**: the `Gatekeeper` custom resource, loaded from YAML.
//! - **Components**: the controller-manager and audit Deployments the operator creates.
//! - **Readiness**: ready replicas matching the spec, or reaching a fixed floor.
//!
//! The transport is abstracted behind [`GatekeeperApi`] (writes) and
//! [`gko_converge::ObjectFetcher`] (reads).

pub mod deployment;
pub mod error;
pub mod install;
pub mod loader;
pub mod mock;
pub mod types;

pub use deployment::{install_targets, Component, DeploymentObservation, ReadinessMode};
pub use error::{InstallError, LoadError, SubmitError};
pub use install::{ComponentReport, GatekeeperApi, InstallCheck, InstallReport};
pub use loader::{load_from_path, load_from_reader, load_from_str, SAMPLE_PATH};
pub use mock::{MockGatekeeperApi, MockResponse};
pub use types::{Gatekeeper, GatekeeperSpec, DEFAULT_NAMESPACE};

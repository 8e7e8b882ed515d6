//! Kubernetes adapters for Gatekeeper convergence checks.
//!
//! - [`KubeDeployments`]: reads Deployment status for the poller.
//! - [`KubeGatekeepers`]: creates `Gatekeeper` custom resources.
//! - [`connect`]: builds a client from kubeconfig or in-cluster config.

pub mod client;
pub mod deployments;
pub mod error;
pub mod gatekeepers;

pub use client::{connect, ClusterConfig};
pub use deployments::KubeDeployments;
pub use error::ClusterError;
pub use gatekeepers::KubeGatekeepers;
pub use kube::Client;

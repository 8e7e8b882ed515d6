//! Error types for loading, submitting and checking Gatekeeper installs.

use std::path::PathBuf;

use gko_converge::{BoxError, ConvergeError};
use thiserror::Error;

/// Errors that can occur while loading a desired-state descriptor.
#[derive(Debug, Error)]
pub enum LoadError {
    /// The descriptor file could not be read.
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The descriptor is not valid YAML for this resource.
    #[error("failed to decode Gatekeeper resource: {0}")]
    Decode(#[from] serde_yaml::Error),

    /// The descriptor decoded but describes an unusable resource.
    #[error("invalid Gatekeeper resource: {0}")]
    Invalid(String),
}

/// Errors returned by the control-plane write API.
#[derive(Debug, Error)]
pub enum SubmitError {
    /// A resource with this name already exists.
    #[error("Gatekeeper '{0}' already exists")]
    AlreadyExists(String),

    /// The control plane refused the resource (validation, permissions).
    #[error("Gatekeeper '{name}' rejected ({code}): {message}")]
    Rejected {
        name: String,
        code: u16,
        message: String,
    },

    /// The request never got a definitive answer.
    #[error("failed to submit Gatekeeper '{name}': {source}")]
    Transport {
        name: String,
        #[source]
        source: BoxError,
    },
}

/// Errors from a full install check.
#[derive(Debug, Error)]
pub enum InstallError {
    /// Desired state was never accepted; no polling happened.
    #[error("desired state was not submitted: {0}")]
    Submit(#[from] SubmitError),

    /// At least one component did not converge.
    #[error(transparent)]
    Converge(#[from] ConvergeError),
}

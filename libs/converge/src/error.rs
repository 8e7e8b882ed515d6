//! Convergence errors.

use std::time::Duration;

use thiserror::Error;

use crate::fetch::FetchError;
use crate::identity::ObjectIdentity;

/// Errors surfaced by convergence waits.
///
/// The wait-level variants carry enough context to tell which dependent
/// object failed to converge, and how.
#[derive(Debug, Error)]
pub enum ConvergeError {
    /// Poll interval or timeout is unusable.
    #[error("invalid poll configuration: {0}")]
    InvalidConfig(String),

    /// Identity string could not be parsed as `namespace/name`.
    #[error("invalid object identity '{0}': expected <namespace>/<name>")]
    InvalidIdentity(String),

    /// Deadline reached without the predicate ever holding.
    #[error(
        "{target} ({identity}) did not converge within {elapsed:?} after {attempts} attempts; {}",
        describe_last(.last_observed)
    )]
    TimedOut {
        target: String,
        identity: ObjectIdentity,
        attempts: u32,
        elapsed: Duration,
        last_observed: Option<String>,
    },

    /// A non-retryable fetch error ended the wait.
    #[error(
        "{target} ({identity}) failed after {attempts} attempts: {cause}; {}",
        describe_last(.last_observed)
    )]
    Failed {
        target: String,
        identity: ObjectIdentity,
        attempts: u32,
        last_observed: Option<String>,
        #[source]
        cause: FetchError,
    },

    /// The wait was cancelled by a shutdown signal.
    #[error(
        "wait for {target} ({identity}) cancelled after {attempts} attempts; {}",
        describe_last(.last_observed)
    )]
    Cancelled {
        target: String,
        identity: ObjectIdentity,
        attempts: u32,
        last_observed: Option<String>,
    },
}

impl ConvergeError {
    /// Identity of the object the error refers to, if any.
    pub fn identity(&self) -> Option<&ObjectIdentity> {
        match self {
            Self::TimedOut { identity, .. }
            | Self::Failed { identity, .. }
            | Self::Cancelled { identity, .. } => Some(identity),
            Self::InvalidConfig(_) | Self::InvalidIdentity(_) => None,
        }
    }

    /// Debug rendering of the last successful observation, if any.
    pub fn last_observed(&self) -> Option<&str> {
        match self {
            Self::TimedOut { last_observed, .. }
            | Self::Failed { last_observed, .. }
            | Self::Cancelled { last_observed, .. } => last_observed.as_deref(),
            Self::InvalidConfig(_) | Self::InvalidIdentity(_) => None,
        }
    }

    /// Returns true if the error is a timeout rather than a fatal failure.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::TimedOut { .. })
    }
}

fn describe_last(last_observed: &Option<String>) -> String {
    match last_observed {
        Some(observed) => format!("last observed: {observed}"),
        None => "object never observed".to_string(),
    }
}

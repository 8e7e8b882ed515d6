//! Control-plane read contract and fetch error classification.

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::identity::ObjectIdentity;

/// Boxed error type carried by fatal fetch failures.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors returned by an [`ObjectFetcher`].
///
/// Exactly one class is retryable: [`FetchError::NotFound`] means the object
/// has not been created yet (creation is still propagating). Anything else is
/// fatal and ends the wait immediately.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The object does not exist (yet).
    #[error("{0} not found")]
    NotFound(ObjectIdentity),

    /// Any other failure: permissions, malformed identity, transport errors.
    #[error("failed to fetch {identity}: {source}")]
    Other {
        identity: ObjectIdentity,
        #[source]
        source: BoxError,
    },
}

impl FetchError {
    /// Create a fatal fetch error.
    pub fn other(identity: ObjectIdentity, source: impl Into<BoxError>) -> Self {
        Self::Other {
            identity,
            source: source.into(),
        }
    }

    /// Returns true for the transient-absence class.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// Returns true if polling may continue after this error.
    pub fn is_retryable(&self) -> bool {
        self.is_not_found()
    }

    /// Identity of the object the fetch was for.
    pub fn identity(&self) -> &ObjectIdentity {
        match self {
            Self::NotFound(identity) => identity,
            Self::Other { identity, .. } => identity,
        }
    }
}

/// Read access to the control plane.
///
/// Implementations must be safe for concurrent read use: several waits may
/// share one fetcher.
#[async_trait]
pub trait ObjectFetcher<S>: Send + Sync
where
    S: Send + 'static,
{
    /// Fetch a fresh snapshot of the object's observed state.
    async fn fetch(&self, identity: &ObjectIdentity) -> Result<S, FetchError>;
}

#[async_trait]
impl<S, T> ObjectFetcher<S> for Arc<T>
where
    S: Send + 'static,
    T: ObjectFetcher<S> + ?Sized,
{
    async fn fetch(&self, identity: &ObjectIdentity) -> Result<S, FetchError> {
        (**self).fetch(identity).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification() {
        let id = ObjectIdentity::new("ns", "obj");

        let not_found = FetchError::NotFound(id.clone());
        assert!(not_found.is_not_found());
        assert!(not_found.is_retryable());
        assert_eq!(not_found.to_string(), "ns/obj not found");

        let forbidden = FetchError::other(id.clone(), "deployments is forbidden");
        assert!(!forbidden.is_not_found());
        assert!(!forbidden.is_retryable());
        assert_eq!(forbidden.identity(), &id);
        assert_eq!(
            forbidden.to_string(),
            "failed to fetch ns/obj: deployments is forbidden"
        );
    }
}

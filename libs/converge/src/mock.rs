//! Scripted fetcher for testing and development.
//!
//! Replays a fixed sequence of fetch results, one per call, then keeps
//! repeating the final step.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use tracing::debug;

use crate::fetch::{FetchError, ObjectFetcher};
use crate::identity::ObjectIdentity;

/// One scripted fetch result.
#[derive(Debug, Clone)]
pub enum FetchStep<S> {
    /// The object exists with this observed state.
    Found(S),

    /// The object does not exist yet.
    NotFound,

    /// A fatal fetch error with this message.
    Error(String),
}

/// Fetcher that replays scripted results.
pub struct ScriptedFetcher<S> {
    steps: Mutex<VecDeque<FetchStep<S>>>,
    last: Mutex<Option<FetchStep<S>>>,
    calls: AtomicU32,
}

impl<S: Clone> ScriptedFetcher<S> {
    /// Create a fetcher from a script. An empty script behaves as "never found".
    pub fn new(steps: impl IntoIterator<Item = FetchStep<S>>) -> Self {
        Self {
            steps: Mutex::new(steps.into_iter().collect()),
            last: Mutex::new(None),
            calls: AtomicU32::new(0),
        }
    }

    /// Observations that show up in order, one per fetch.
    pub fn observations(observed: impl IntoIterator<Item = S>) -> Self {
        Self::new(observed.into_iter().map(FetchStep::Found))
    }

    /// `n` not-found responses followed by `observed` forever.
    pub fn appears_after(n: usize, observed: S) -> Self {
        Self::new(
            std::iter::repeat_n(FetchStep::NotFound, n).chain(std::iter::once(FetchStep::Found(observed))),
        )
    }

    /// An object that never exists.
    pub fn never_found() -> Self {
        Self::new([FetchStep::NotFound])
    }

    /// A fetcher whose every call fails fatally.
    pub fn failing(message: impl Into<String>) -> Self {
        Self::new([FetchStep::Error(message.into())])
    }

    /// Number of fetch calls made so far.
    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    fn next_step(&self) -> FetchStep<S> {
        let mut steps = self.steps.lock().unwrap_or_else(|e| e.into_inner());
        let mut last = self.last.lock().unwrap_or_else(|e| e.into_inner());

        if let Some(step) = steps.pop_front() {
            *last = Some(step.clone());
            return step;
        }

        last.clone().unwrap_or(FetchStep::NotFound)
    }
}

#[async_trait]
impl<S> ObjectFetcher<S> for ScriptedFetcher<S>
where
    S: Clone + Send + 'static,
{
    async fn fetch(&self, identity: &ObjectIdentity) -> Result<S, FetchError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        debug!(identity = %identity, call, "[MOCK] Fetching object");

        match self.next_step() {
            FetchStep::Found(observed) => Ok(observed),
            FetchStep::NotFound => Err(FetchError::NotFound(identity.clone())),
            FetchStep::Error(message) => Err(FetchError::other(identity.clone(), message)),
        }
    }
}

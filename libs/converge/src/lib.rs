//! Convergence polling primitives.
//!
//! This library provides the client side of "submit desired state, then
//! wait for eventual consistency". Key concepts:
//!
//! - **Desired state**: What the system should look like (submitted by the caller).
//! - **Observed state**: What a dependent object actually looks like right now.
//! - **Convergence**: Observed state satisfying a predicate over desired state.
//!
//! # Invariants
//!
//! - Polling is read-only with respect to the watched objects
//! - Only "not found" is retryable; every other fetch error ends the wait
//! - The first check happens immediately; the last one happens at the deadline
//! - Timeouts are reported as their own outcome, never folded into success or failure

pub mod error;
pub mod fetch;
pub mod identity;
pub mod mock;
pub mod orchestrate;
pub mod poller;
pub mod predicate;

pub use error::ConvergeError;
pub use fetch::{BoxError, FetchError, ObjectFetcher};
pub use identity::ObjectIdentity;
pub use mock::{FetchStep, ScriptedFetcher};
pub use orchestrate::{await_all, WaitTarget};
pub use poller::{
    await_convergence, PollConfig, PollOutcome, PollReport, Poller, DEFAULT_POLL_INTERVAL,
    DEFAULT_WAIT_TIMEOUT,
};
pub use predicate::{ConvergencePredicate, ScalarPredicate};

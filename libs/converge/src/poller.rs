//! The convergence poller.
//!
//! Fixed-cadence polling: fetch, classify, evaluate, sleep. No backoff; wait
//! windows are short and bounded.

use std::fmt;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::Instant;
use tracing::{debug, trace, warn};

use crate::error::ConvergeError;
use crate::fetch::{FetchError, ObjectFetcher};
use crate::identity::ObjectIdentity;
use crate::predicate::ConvergencePredicate;

/// Default spacing between fetch attempts.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Default maximum time to wait for convergence.
pub const DEFAULT_WAIT_TIMEOUT: Duration = Duration::from_secs(30);

/// Stand-in deadline for timeouts too large to add to an `Instant`.
const FAR_FUTURE: Duration = Duration::from_secs(86_400 * 365 * 30);

/// Poll cadence and deadline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollConfig {
    /// Minimum spacing between fetch attempts.
    pub interval: Duration,

    /// Maximum wall-clock time to wait.
    pub timeout: Duration,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            timeout: DEFAULT_WAIT_TIMEOUT,
        }
    }
}

impl PollConfig {
    /// Create a validated poll configuration.
    pub fn new(interval: Duration, timeout: Duration) -> Result<Self, ConvergeError> {
        let config = Self { interval, timeout };
        config.validate()?;
        Ok(config)
    }

    /// Check that both durations are non-zero.
    ///
    /// The timeout does not need to be a multiple of the interval: the
    /// poller always makes one final attempt at the deadline.
    pub fn validate(&self) -> Result<(), ConvergeError> {
        if self.interval.is_zero() {
            return Err(ConvergeError::InvalidConfig(
                "poll interval must be greater than zero".to_string(),
            ));
        }
        if self.timeout.is_zero() {
            return Err(ConvergeError::InvalidConfig(
                "wait timeout must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Terminal result of a single convergence wait.
#[derive(Debug)]
pub enum PollOutcome<S> {
    /// The predicate held for this observation.
    Converged(S),

    /// The deadline passed without the predicate holding.
    TimedOut { last_observed: Option<S> },

    /// A non-retryable fetch error ended the wait.
    Failed {
        cause: FetchError,
        last_observed: Option<S>,
    },

    /// The shutdown signal fired while waiting for the next tick.
    Cancelled { last_observed: Option<S> },
}

impl<S> PollOutcome<S> {
    pub fn is_converged(&self) -> bool {
        matches!(self, Self::Converged(_))
    }

    pub fn is_timed_out(&self) -> bool {
        matches!(self, Self::TimedOut { .. })
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }

    /// Short name of the outcome.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Converged(_) => "converged",
            Self::TimedOut { .. } => "timed_out",
            Self::Failed { .. } => "failed",
            Self::Cancelled { .. } => "cancelled",
        }
    }

    /// The most recent successful observation, if any.
    pub fn last_observed(&self) -> Option<&S> {
        match self {
            Self::Converged(observed) => Some(observed),
            Self::TimedOut { last_observed }
            | Self::Failed { last_observed, .. }
            | Self::Cancelled { last_observed } => last_observed.as_ref(),
        }
    }
}

/// Outcome of one wait plus the bookkeeping needed to diagnose it.
#[derive(Debug)]
pub struct PollReport<S> {
    pub identity: ObjectIdentity,
    pub outcome: PollOutcome<S>,

    /// Number of fetch attempts made.
    pub attempts: u32,

    /// Time from the first attempt to the terminal outcome.
    pub elapsed: Duration,
}

impl<S: fmt::Debug> PollReport<S> {
    /// Convert into a result, labelling errors with `target`.
    pub fn into_result(self, target: &str) -> Result<S, ConvergeError> {
        let Self {
            identity,
            outcome,
            attempts,
            elapsed,
        } = self;

        match outcome {
            PollOutcome::Converged(observed) => Ok(observed),
            PollOutcome::TimedOut { last_observed } => Err(ConvergeError::TimedOut {
                target: target.to_string(),
                identity,
                attempts,
                elapsed,
                last_observed: last_observed.map(|o| format!("{o:?}")),
            }),
            PollOutcome::Failed {
                cause,
                last_observed,
            } => Err(ConvergeError::Failed {
                target: target.to_string(),
                identity,
                attempts,
                last_observed: last_observed.map(|o| format!("{o:?}")),
                cause,
            }),
            PollOutcome::Cancelled { last_observed } => Err(ConvergeError::Cancelled {
                target: target.to_string(),
                last_observed: last_observed.map(|o| format!("{o:?}")),
                identity,
                attempts,
            }),
        }
    }
}

impl<S: fmt::Debug> PollReport<S> {
    /// Keep a converged report as is; turn any other outcome into an error.
    pub fn ensure_converged(self, target: &str) -> Result<Self, ConvergeError> {
        let identity = self.identity.clone();
        let attempts = self.attempts;
        let elapsed = self.elapsed;

        self.into_result(target).map(|observed| Self {
            identity,
            outcome: PollOutcome::Converged(observed),
            attempts,
            elapsed,
        })
    }
}

/// Polls a fetcher until a predicate holds, a fatal error occurs, or the
/// deadline passes.
pub struct Poller<F> {
    fetcher: F,
    config: PollConfig,
    shutdown: Option<watch::Receiver<bool>>,
}

impl<F> Poller<F> {
    /// Create a poller. `config` should already be validated.
    pub fn new(fetcher: F, config: PollConfig) -> Self {
        Self {
            fetcher,
            config,
            shutdown: None,
        }
    }

    /// Cancel waits when the shutdown flag flips to `true`.
    pub fn with_shutdown(mut self, shutdown: watch::Receiver<bool>) -> Self {
        self.shutdown = Some(shutdown);
        self
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    /// Wait for the object at `identity` to satisfy `predicate`.
    ///
    /// The first fetch happens immediately. Not-found is absorbed; any
    /// other fetch error returns [`PollOutcome::Failed`] without further
    /// attempts.
    pub async fn await_convergence<S, D, P>(
        &self,
        identity: &ObjectIdentity,
        desired: &D,
        predicate: &P,
    ) -> PollReport<S>
    where
        F: ObjectFetcher<S>,
        S: Send + 'static,
        P: ConvergencePredicate<S, D> + ?Sized,
    {
        poll_until_converged(
            &self.fetcher,
            self.config,
            self.shutdown.clone(),
            identity,
            desired,
            predicate,
        )
        .await
    }
}

/// Convenience wrapper for a one-off wait without a shutdown signal.
pub async fn await_convergence<F, S, D, P>(
    fetcher: &F,
    identity: &ObjectIdentity,
    desired: &D,
    predicate: &P,
    config: PollConfig,
) -> PollReport<S>
where
    F: ObjectFetcher<S>,
    S: Send + 'static,
    P: ConvergencePredicate<S, D> + ?Sized,
{
    poll_until_converged(fetcher, config, None, identity, desired, predicate).await
}

async fn poll_until_converged<F, S, D, P>(
    fetcher: &F,
    config: PollConfig,
    mut shutdown: Option<watch::Receiver<bool>>,
    identity: &ObjectIdentity,
    desired: &D,
    predicate: &P,
) -> PollReport<S>
where
    F: ObjectFetcher<S>,
    S: Send + 'static,
    P: ConvergencePredicate<S, D> + ?Sized,
{
    let start = Instant::now();
    // Timeouts past the clock's range behave as "no deadline".
    let deadline = start
        .checked_add(config.timeout)
        .unwrap_or_else(|| start + FAR_FUTURE);
    let mut attempts: u32 = 0;
    let mut last_observed = None;

    let report = |outcome: PollOutcome<S>, attempts: u32| PollReport {
        identity: identity.clone(),
        outcome,
        attempts,
        elapsed: start.elapsed(),
    };

    loop {
        attempts += 1;

        match fetcher.fetch(identity).await {
            Ok(observed) => {
                if predicate.is_converged(&observed, desired) {
                    debug!(identity = %identity, attempts, "Converged");
                    return report(PollOutcome::Converged(observed), attempts);
                }
                trace!(identity = %identity, attempt = attempts, "Not converged yet");
                last_observed = Some(observed);
            }
            Err(err) if err.is_retryable() => {
                trace!(identity = %identity, attempt = attempts, "Object not found yet");
            }
            Err(err) => {
                warn!(identity = %identity, attempt = attempts, error = %err, "Fatal fetch error");
                return report(
                    PollOutcome::Failed {
                        cause: err,
                        last_observed,
                    },
                    attempts,
                );
            }
        }

        let now = Instant::now();
        if now >= deadline {
            warn!(
                identity = %identity,
                attempts,
                timeout = ?config.timeout,
                "Timed out waiting for convergence"
            );
            return report(PollOutcome::TimedOut { last_observed }, attempts);
        }

        // Clamp to the deadline so the final attempt lands exactly on it.
        let next_tick = now
            .checked_add(config.interval)
            .map_or(deadline, |tick| tick.min(deadline));
        match shutdown.as_mut() {
            Some(rx) => {
                tokio::select! {
                    _ = tokio::time::sleep_until(next_tick) => {}
                    _ = shutdown_signalled(rx) => {
                        debug!(identity = %identity, attempts, "Wait cancelled");
                        return report(PollOutcome::Cancelled { last_observed }, attempts);
                    }
                }
            }
            None => tokio::time::sleep_until(next_tick).await,
        }
    }
}

/// Resolves once the flag is `true`. Never resolves if the sender is gone.
async fn shutdown_signalled(rx: &mut watch::Receiver<bool>) {
    loop {
        if *rx.borrow() {
            return;
        }
        if rx.changed().await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

//! Multi-target wait orchestration.
//!
//! Runs one wait per dependent object, concurrently, and fast-fails: the
//! first wait that does not converge is reported and the rest are dropped.

use std::fmt;

use futures_util::stream::{FuturesUnordered, StreamExt};
use tracing::{info, warn};

use crate::error::ConvergeError;
use crate::fetch::ObjectFetcher;
use crate::identity::ObjectIdentity;
use crate::poller::{PollReport, Poller};
use crate::predicate::ConvergencePredicate;

/// One dependent object to wait on.
pub struct WaitTarget<S, D> {
    /// Label used in logs and errors (e.g. the component name).
    pub label: String,
    pub identity: ObjectIdentity,
    pub predicate: Box<dyn ConvergencePredicate<S, D>>,
}

impl<S, D> WaitTarget<S, D> {
    pub fn new<P>(label: impl Into<String>, identity: ObjectIdentity, predicate: P) -> Self
    where
        P: ConvergencePredicate<S, D> + 'static,
    {
        Self {
            label: label.into(),
            identity,
            predicate: Box::new(predicate),
        }
    }
}

impl<S, D> fmt::Debug for WaitTarget<S, D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WaitTarget")
            .field("label", &self.label)
            .field("identity", &self.identity)
            .finish_non_exhaustive()
    }
}

/// Wait for every target to converge.
///
/// Returns the reports in target order once all have converged. The first
/// target to time out, fail or be cancelled is returned as an error and the
/// remaining waits are dropped.
pub async fn await_all<F, S, D>(
    poller: &Poller<F>,
    desired: &D,
    targets: &[WaitTarget<S, D>],
) -> Result<Vec<PollReport<S>>, ConvergeError>
where
    F: ObjectFetcher<S>,
    S: fmt::Debug + Send + 'static,
{
    let mut pending: FuturesUnordered<_> = targets
        .iter()
        .enumerate()
        .map(|(index, target)| async move {
            let report = poller
                .await_convergence(&target.identity, desired, target.predicate.as_ref())
                .await;
            (index, report)
        })
        .collect();

    let mut reports: Vec<Option<PollReport<S>>> = targets.iter().map(|_| None).collect();

    while let Some((index, report)) = pending.next().await {
        let target = &targets[index];

        if !report.outcome.is_converged() {
            warn!(
                label = %target.label,
                identity = %target.identity,
                outcome = report.outcome.as_str(),
                attempts = report.attempts,
                remaining = pending.len(),
                "Wait did not converge, abandoning remaining waits"
            );
        }
        let report = report.ensure_converged(&target.label)?;

        info!(
            label = %target.label,
            identity = %target.identity,
            rule = %target.predicate.describe(desired),
            attempts = report.attempts,
            elapsed_ms = report.elapsed.as_millis() as u64,
            "Target converged"
        );
        reports[index] = Some(report);
    }

    Ok(reports.into_iter().flatten().collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::ScriptedFetcher;
    use crate::poller::PollConfig;

    #[tokio::test(start_paused = true)]
    async fn test_empty_target_list_succeeds() {
        let poller = Poller::new(ScriptedFetcher::<i64>::never_found(), PollConfig::default());
        let targets: Vec<WaitTarget<i64, ()>> = Vec::new();

        let reports = await_all(&poller, &(), &targets).await.unwrap();
        assert!(reports.is_empty());
        assert_eq!(poller.fetcher().calls(), 0);
    }
}

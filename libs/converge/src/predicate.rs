//! Convergence predicates.
//!
//! A predicate is a pure function of `(observed, desired)` deciding whether
//! one object has converged. Closures work directly; [`ScalarPredicate`]
//! covers the common "compare one number" case in two modes:
//!
//! - **Exact match**: the observed value equals a value read from desired state.
//! - **Threshold**: the observed value is at least a fixed constant.

use std::fmt;

/// Decides whether observed state has converged with desired state.
pub trait ConvergencePredicate<S, D>: Send + Sync {
    /// Returns true once `observed` satisfies `desired`.
    fn is_converged(&self, observed: &S, desired: &D) -> bool;

    /// Human-readable form of the rule, for logs and reports.
    fn describe(&self, _desired: &D) -> String {
        "custom predicate".to_string()
    }
}

impl<S, D, F> ConvergencePredicate<S, D> for F
where
    F: Fn(&S, &D) -> bool + Send + Sync,
{
    fn is_converged(&self, observed: &S, desired: &D) -> bool {
        self(observed, desired)
    }
}

/// What a scalar observation is compared against.
enum ScalarTarget<D> {
    /// Exact match against a field of desired state.
    Desired(fn(&D) -> i64),

    /// Threshold: observed value must be at least this constant.
    AtLeast(i64),
}

impl<D> Clone for ScalarTarget<D> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<D> Copy for ScalarTarget<D> {}

impl<D> fmt::Debug for ScalarTarget<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Desired(_) => f.write_str("Desired"),
            Self::AtLeast(n) => f.debug_tuple("AtLeast").field(n).finish(),
        }
    }
}

/// Predicate comparing one numeric field of the observation.
pub struct ScalarPredicate<S, D> {
    field: &'static str,
    observe: fn(&S) -> i64,
    target: ScalarTarget<D>,
}

impl<S, D> ScalarPredicate<S, D> {
    /// Exact-match mode: `observe(observed) == desired_of(desired)`.
    pub fn exact(field: &'static str, observe: fn(&S) -> i64, desired_of: fn(&D) -> i64) -> Self {
        Self {
            field,
            observe,
            target: ScalarTarget::Desired(desired_of),
        }
    }

    /// Threshold mode: `observe(observed) >= floor`.
    pub fn at_least(field: &'static str, observe: fn(&S) -> i64, floor: i64) -> Self {
        Self {
            field,
            observe,
            target: ScalarTarget::AtLeast(floor),
        }
    }

    /// The observed value this predicate looks at.
    pub fn observed_value(&self, observed: &S) -> i64 {
        (self.observe)(observed)
    }

    /// The value the observation is compared against.
    pub fn expected_value(&self, desired: &D) -> i64 {
        match self.target {
            ScalarTarget::Desired(desired_of) => desired_of(desired),
            ScalarTarget::AtLeast(floor) => floor,
        }
    }
}

impl<S, D> fmt::Debug for ScalarPredicate<S, D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScalarPredicate")
            .field("field", &self.field)
            .field("target", &self.target)
            .finish()
    }
}

impl<S, D> ConvergencePredicate<S, D> for ScalarPredicate<S, D> {
    fn is_converged(&self, observed: &S, desired: &D) -> bool {
        let value = self.observed_value(observed);
        let expected = self.expected_value(desired);
        match self.target {
            ScalarTarget::Desired(_) => value == expected,
            ScalarTarget::AtLeast(_) => value >= expected,
        }
    }

    fn describe(&self, desired: &D) -> String {
        let op = match self.target {
            ScalarTarget::Desired(_) => "==",
            ScalarTarget::AtLeast(_) => ">=",
        };
        format!("{} {} {}", self.field, op, self.expected_value(desired))
    }
}

//! Precision-controlled convergence engine.
//!
//! The engine repeatedly advances an iterate, rounds it to a fixed number of
//! decimal digits and stops once two successive rounded iterates are equal.

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::error::{LabError, Result};
use crate::rounding::Precision;
use crate::rules::{Iterate, UpdateRule};

/// Configuration for one engine run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConvergenceOptions {
    /// Decimal digits kept before comparing successive iterates.
    pub precision: Precision,
    /// Safety bound on the number of updates.
    pub max_iterations: usize,
    /// Halt without recording when the next rounded iterate is exactly zero.
    pub zero_suppression: bool,
}

impl Default for ConvergenceOptions {
    fn default() -> Self {
        Self {
            precision: 6,
            max_iterations: 1_000,
            zero_suppression: true,
        }
    }
}

impl ConvergenceOptions {
    pub fn with_precision(mut self, precision: Precision) -> Self {
        self.precision = precision;
        self
    }

    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    pub fn with_zero_suppression(mut self, enabled: bool) -> Self {
        self.zero_suppression = enabled;
        self
    }
}

/// How a successful run ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Termination {
    /// Two successive rounded iterates were identical.
    Converged,
    /// The next iterate rounded to zero; the previous value was kept.
    ZeroSuppressed,
    /// An observer asked the engine to stop.
    StoppedByObserver,
}

/// Result of one engine run at one precision.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ConvergenceRecord<I> {
    /// Precision the run used.
    pub precision: Precision,
    /// Final rounded iterate.
    pub value: I,
    /// Number of recorded updates.
    pub iterations: usize,
    /// Every recorded rounded iterate, oldest first.
    pub trace: Vec<I>,
    pub termination: Termination,
}

impl<I> ConvergenceRecord<I> {
    pub fn is_converged(&self) -> bool {
        self.termination == Termination::Converged
    }
}

/// Emitted after every recorded update.
#[derive(Debug)]
pub struct StepEvent<'a, I> {
    /// 1-based iteration index.
    pub iteration: usize,
    pub precision: Precision,
    /// The rounded iterate just recorded.
    pub value: &'a I,
}

/// Control actions an observer may request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Action {
    Stop,
}

/// Receives engine events and optionally steers the run.
///
/// Closures implement `Observer` automatically, and `()` is a no-op observer.
pub trait Observer<E> {
    fn observe(&mut self, event: &E) -> Option<Action>;
}

impl<E, F> Observer<E> for F
where
    F: FnMut(&E) -> Option<Action>,
{
    fn observe(&mut self, event: &E) -> Option<Action> {
        self(event)
    }
}

impl<E> Observer<E> for () {
    fn observe(&mut self, _event: &E) -> Option<Action> {
        None
    }
}

/// Iterates `rule` from `initial` until the rounded iterate stops changing.
///
/// # Errors
///
/// Returns [`LabError::DegenerateUpdate`] when an update is not finite and
/// [`LabError::NonConvergence`] when `options.max_iterations` is exhausted.
pub fn converge<R, Obs>(
    rule: &R,
    initial: R::Iterate,
    options: &ConvergenceOptions,
    observer: Obs,
) -> Result<ConvergenceRecord<R::Iterate>>
where
    R: UpdateRule + ?Sized,
    Obs: for<'a> Observer<StepEvent<'a, R::Iterate>>,
{
    let precision = options.precision;
    converge_sequence(
        initial,
        options,
        rule.label(),
        |current| rule.apply_rounded(current, precision),
        observer,
    )
}

/// Same as [`converge`] without an observer.
pub fn converge_unobserved<R>(
    rule: &R,
    initial: R::Iterate,
    options: &ConvergenceOptions,
) -> Result<ConvergenceRecord<R::Iterate>>
where
    R: UpdateRule + ?Sized,
{
    converge(rule, initial, options, ())
}

/// Drives an arbitrary producer of candidates through the rounded-equality test.
///
/// `next` receives the latest rounded iterate (initially `initial`, unrounded)
/// and returns the raw candidate, which the engine rounds. Producers may carry
/// their own state, as the power method does with its running vector.
pub fn converge_sequence<I, N, Obs>(
    initial: I,
    options: &ConvergenceOptions,
    context: &'static str,
    mut next: N,
    mut observer: Obs,
) -> Result<ConvergenceRecord<I>>
where
    I: Iterate,
    N: FnMut(&I) -> I,
    Obs: for<'a> Observer<StepEvent<'a, I>>,
{
    let precision = options.precision;
    let mut current = initial;
    let mut trace = Vec::new();
    let mut iterations = 0usize;

    while iterations < options.max_iterations {
        let candidate = next(&current).rounded(precision);

        if let Some(value) = candidate.first_non_finite() {
            warn!("{context}: non-finite update at iteration {}", iterations + 1);
            return Err(LabError::degenerate(iterations + 1, context, value)
                .with_trace(recorded_components(&trace)));
        }

        if options.zero_suppression && candidate.is_zero() {
            warn!(
                "{context}: update {} rounds to zero at precision {precision}; halting",
                iterations + 1
            );
            return Ok(ConvergenceRecord {
                precision,
                value: current,
                iterations,
                trace,
                termination: Termination::ZeroSuppressed,
            });
        }

        iterations += 1;
        debug!("{context}: iter #{iterations} -> {candidate:?}");

        let converged = candidate == current;
        trace.push(candidate.clone());
        current = candidate;

        let action = observer.observe(&StepEvent {
            iteration: iterations,
            precision,
            value: &current,
        });

        if converged {
            info!("{context}: converged at precision {precision} after {iterations} iterations");
            return Ok(ConvergenceRecord {
                precision,
                value: current,
                iterations,
                trace,
                termination: Termination::Converged,
            });
        }

        if action == Some(Action::Stop) {
            return Ok(ConvergenceRecord {
                precision,
                value: current,
                iterations,
                trace,
                termination: Termination::StoppedByObserver,
            });
        }
    }

    warn!("{context}: no convergence within {iterations} iterations at precision {precision}");
    Err(LabError::NonConvergence {
        iterations,
        last: current.components(),
        trace: recorded_components(&trace),
    })
}

fn recorded_components<I: Iterate>(trace: &[I]) -> Vec<Vec<f64>> {
    trace.iter().map(Iterate::components).collect()
}

//! Composite Simpson quadrature refined on a fixed schedule.
//!
//! The partition starts at three points and grows by two each iteration,
//! keeping an even number of sub-intervals, until the stop rule accepts the
//! rounded estimate.

use std::time::{Duration, Instant};

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::error::{LabError, Result};
use crate::rounding::{round_to, Precision};
use crate::solving::{Action, Termination};

/// Composite Simpson rule over `n` equally spaced points (`n` odd, `n >= 3`).
///
/// # Errors
///
/// [`LabError::InvalidConfig`] for an even or too small `n`, and
/// [`LabError::DegenerateUpdate`] if the integrand is not finite somewhere.
pub fn simpson<F>(f: F, a: f64, b: f64, points: usize) -> Result<f64>
where
    F: Fn(f64) -> f64,
{
    if points < 3 || points % 2 == 0 {
        return Err(LabError::invalid_config(format!(
            "Simpson's rule needs an odd number of points >= 3, got {points}"
        )));
    }

    let h = (b - a) / (points - 1) as f64;
    let mut sum = f(a) + f(b);
    for i in 1..points - 1 {
        let weight = if i % 2 == 1 { 4.0 } else { 2.0 };
        sum += weight * f(a + i as f64 * h);
    }

    let integral = h / 3.0 * sum;
    if !integral.is_finite() {
        return Err(LabError::degenerate(0, "Simpson weighted sum", integral));
    }
    Ok(integral)
}

/// Terminal condition for [`SimpsonLoop`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StopRule {
    /// Stop once the estimate, rounded to `precision`, equals `value` at the same precision.
    MatchesReference { value: f64, precision: Precision },
    /// Stop once the residual between successive estimates drops below the threshold.
    ///
    /// Neither the first estimate nor a zero estimate can satisfy this rule.
    ResidualBelow(f64),
}

/// Configuration for the refinement loop.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimpsonOptions {
    /// Lower integration limit.
    pub a: f64,
    /// Upper integration limit.
    pub b: f64,
    /// Digits every estimate is rounded to.
    pub estimate_precision: Precision,
    pub stop: StopRule,
    /// Safety bound on the partition size.
    pub max_points: usize,
}

impl Default for SimpsonOptions {
    fn default() -> Self {
        Self {
            a: 0.0,
            b: 4.0 * std::f64::consts::PI,
            estimate_precision: 5,
            stop: StopRule::MatchesReference {
                value: -1.302,
                precision: 3,
            },
            max_points: 10_001,
        }
    }
}

impl SimpsonOptions {
    pub fn with_range(mut self, a: f64, b: f64) -> Self {
        self.a = a;
        self.b = b;
        self
    }

    pub fn with_stop(mut self, stop: StopRule) -> Self {
        self.stop = stop;
        self
    }

    pub fn with_estimate_precision(mut self, precision: Precision) -> Self {
        self.estimate_precision = precision;
        self
    }

    pub fn with_max_points(mut self, max_points: usize) -> Self {
        self.max_points = max_points;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.a.is_finite() && self.b.is_finite()) || self.b <= self.a {
            return Err(LabError::invalid_config(format!(
                "integration range [{}, {}] must be finite and increasing",
                self.a, self.b
            )));
        }
        if self.max_points < 3 {
            return Err(LabError::invalid_config("max_points must be at least 3"));
        }
        if let StopRule::ResidualBelow(threshold) = self.stop {
            if threshold <= 0.0 || !threshold.is_finite() {
                return Err(LabError::invalid_config(
                    "residual threshold must be positive and finite",
                ));
            }
        }
        Ok(())
    }
}

/// One refinement step.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SimpsonRow {
    /// 1-based iteration index.
    pub iteration: usize,
    /// Number of partition points (odd).
    pub points: usize,
    /// Rounded integral estimate.
    pub estimate: f64,
    /// `|estimate - previous estimate|`, against zero on the first row.
    pub residual: f64,
    /// Wall-clock time since the loop started.
    pub elapsed: Duration,
}

/// Rows of a finished loop.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SimpsonSummary {
    pub rows: Vec<SimpsonRow>,
    /// `Converged` when the stop rule accepted the last row.
    pub termination: Termination,
}

impl SimpsonSummary {
    pub fn is_accepted(&self) -> bool {
        self.termination == Termination::Converged
    }

    /// The accepted row, or the row at which the run was stopped.
    pub fn last(&self) -> Option<&SimpsonRow> {
        self.rows.last()
    }

    pub fn estimate(&self) -> Option<f64> {
        self.last().map(|row| row.estimate)
    }

    pub fn points(&self) -> Option<usize> {
        self.last().map(|row| row.points)
    }
}

/// Simpson refinement over a fixed integrand.
pub struct SimpsonLoop<F> {
    f: F,
    options: SimpsonOptions,
}

impl<F> SimpsonLoop<F>
where
    F: Fn(f64) -> f64,
{
    pub fn new(f: F, options: SimpsonOptions) -> Result<Self> {
        options.validate()?;
        Ok(Self { f, options })
    }

    pub fn options(&self) -> &SimpsonOptions {
        &self.options
    }

    /// Refines until the stop rule accepts an estimate.
    pub fn run(&self) -> Result<SimpsonSummary> {
        self.run_with(|_| None)
    }

    /// Same as [`run`](Self::run), handing each row to `on_row` as it is produced.
    ///
    /// Returning [`Action::Stop`] from `on_row` ends the loop after that row
    /// unless the row is accepted; the summary then reports
    /// [`Termination::StoppedByObserver`].
    ///
    /// # Errors
    ///
    /// [`LabError::NonConvergence`] once `max_points` is exceeded, with the
    /// last estimate and every earlier estimate attached.
    pub fn run_with<C>(&self, mut on_row: C) -> Result<SimpsonSummary>
    where
        C: FnMut(&SimpsonRow) -> Option<Action>,
    {
        let options = &self.options;
        let started = Instant::now();
        let mut rows: Vec<SimpsonRow> = Vec::new();
        let mut previous = 0.0;
        let mut points = 3usize;

        while points <= options.max_points {
            let iteration = rows.len() + 1;
            let raw = simpson(&self.f, options.a, options.b, points).map_err(|err| match err {
                LabError::DegenerateUpdate { context, value, .. } => {
                    LabError::degenerate(iteration, context, value).with_trace(estimates(&rows))
                }
                other => other,
            })?;
            let estimate = round_to(raw, options.estimate_precision);
            let row = SimpsonRow {
                iteration,
                points,
                estimate,
                residual: (estimate - previous).abs(),
                elapsed: started.elapsed(),
            };
            debug!(
                "simpson: iter #{iteration} points={points} estimate={estimate} residual={}",
                row.residual
            );
            let action = on_row(&row);

            let accepted = self.accepts(&row);
            previous = estimate;
            rows.push(row);

            if accepted {
                info!("simpson: accepted estimate {estimate} with {points} points");
                return Ok(SimpsonSummary {
                    rows,
                    termination: Termination::Converged,
                });
            }
            if action == Some(Action::Stop) {
                info!("simpson: stopped at iteration {iteration} with {points} points");
                return Ok(SimpsonSummary {
                    rows,
                    termination: Termination::StoppedByObserver,
                });
            }
            points += 2;
        }

        warn!("simpson: no acceptable estimate within {} points", options.max_points);
        Err(LabError::NonConvergence {
            iterations: rows.len(),
            last: rows.last().map(|row| row.estimate).into_iter().collect(),
            trace: estimates(&rows),
        })
    }

    fn accepts(&self, row: &SimpsonRow) -> bool {
        match self.options.stop {
            StopRule::MatchesReference { value, precision } => {
                round_to(row.estimate, precision) == round_to(value, precision)
            }
            StopRule::ResidualBelow(threshold) => {
                row.iteration > 1 && row.estimate != 0.0 && row.residual < threshold
            }
        }
    }
}

fn estimates(rows: &[SimpsonRow]) -> Vec<Vec<f64>> {
    rows.iter().map(|row| vec![row.estimate]).collect()
}

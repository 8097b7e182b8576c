//! Runs one problem at several precisions.
//!
//! Every run restarts from the same initial iterate; results are never
//! chained from one precision to the next.

use rayon::prelude::*;

use crate::error::Result;
use crate::rounding::Precision;
use crate::rules::{DecoupledPair, UpdateRule};
use crate::solving::{converge_unobserved, ConvergenceOptions, ConvergenceRecord};

/// Outcome of one run within a sweep.
#[derive(Debug)]
pub struct SweepEntry<I> {
    pub precision: Precision,
    pub outcome: Result<ConvergenceRecord<I>>,
}

/// Outcome of one precision for a decoupled two-variable problem.
#[derive(Debug)]
pub struct PairEntry {
    pub precision: Precision,
    pub x: Result<ConvergenceRecord<f64>>,
    pub y: Result<ConvergenceRecord<f64>>,
}

/// Runs `rule` from `initial` once per precision, in input order.
///
/// `base` supplies every setting except the precision.
pub fn sweep<R>(
    rule: &R,
    initial: &R::Iterate,
    precisions: &[Precision],
    base: &ConvergenceOptions,
) -> Vec<SweepEntry<R::Iterate>>
where
    R: UpdateRule + ?Sized,
{
    precisions
        .iter()
        .map(|&precision| run_at(rule, initial, precision, base))
        .collect()
}

/// Parallel version of [`sweep`]; output order still follows `precisions`.
pub fn par_sweep<R>(
    rule: &R,
    initial: &R::Iterate,
    precisions: &[Precision],
    base: &ConvergenceOptions,
) -> Vec<SweepEntry<R::Iterate>>
where
    R: UpdateRule + Sync + ?Sized,
    R::Iterate: Send + Sync,
{
    precisions
        .par_iter()
        .map(|&precision| run_at(rule, initial, precision, base))
        .collect()
}

/// Sweeps both halves of a decoupled pair; `x` and `y` keep separate counts.
pub fn sweep_pair<X, Y>(
    pair: &DecoupledPair<X, Y>,
    initial: (f64, f64),
    precisions: &[Precision],
    base: &ConvergenceOptions,
) -> Vec<PairEntry>
where
    X: UpdateRule<Iterate = f64>,
    Y: UpdateRule<Iterate = f64>,
{
    precisions
        .iter()
        .map(|&precision| {
            let options = base.clone().with_precision(precision);
            PairEntry {
                precision,
                x: converge_unobserved(&pair.x, initial.0, &options),
                y: converge_unobserved(&pair.y, initial.1, &options),
            }
        })
        .collect()
}

fn run_at<R>(
    rule: &R,
    initial: &R::Iterate,
    precision: Precision,
    base: &ConvergenceOptions,
) -> SweepEntry<R::Iterate>
where
    R: UpdateRule + ?Sized,
{
    let options = base.clone().with_precision(precision);
    SweepEntry {
        precision,
        outcome: converge_unobserved(rule, initial.clone(), &options),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::{NewtonStep, PicardStep};

    #[test]
    fn sweep_restarts_from_the_initial_iterate() {
        let rule = NewtonStep::new(|x: f64| x * x - 2.0, |x: f64| 2.0 * x);
        let base = ConvergenceOptions::default();
        let entries = sweep(&rule, &1.0, &[12, 3], &base);

        assert_eq!(entries[0].precision, 12);
        assert_eq!(entries[1].precision, 3);
        let coarse = entries[1].outcome.as_ref().unwrap();
        // A chained run would start at the converged 12-digit value.
        assert_eq!(coarse.trace[0], 1.5);
        assert_eq!(coarse.value, 1.414);
    }

    #[test]
    fn parallel_sweep_matches_sequential_sweep() {
        let rule = PicardStep::new(|x: f64| ((2.0 * x).exp() - 1.0) / 3.0);
        let base = ConvergenceOptions::default();
        let precisions = [2, 3, 6, 12];

        let sequential = sweep(&rule, &0.1, &precisions, &base);
        let parallel = par_sweep(&rule, &0.1, &precisions, &base);

        for (a, b) in sequential.iter().zip(parallel.iter()) {
            assert_eq!(a.precision, b.precision);
            assert_eq!(a.outcome.as_ref().unwrap(), b.outcome.as_ref().unwrap());
        }
    }

    #[test]
    fn pair_halves_converge_independently() {
        let pair = DecoupledPair::new(
            NewtonStep::new(|x: f64| 4.0 * x * x - 11.0, |x: f64| 8.0 * x),
            NewtonStep::new(|y: f64| 4.0 * y * y - 1.0, |y: f64| 8.0 * y),
        );
        let entries = sweep_pair(&pair, (1.5, 0.8), &[3], &ConvergenceOptions::default());
        let x = entries[0].x.as_ref().unwrap();
        let y = entries[0].y.as_ref().unwrap();

        assert_eq!(x.value, 1.658);
        assert_eq!(y.value, 0.5);
        assert_ne!(x.iterations, y.iterations);
    }
}

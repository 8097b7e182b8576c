//! Dominant eigenvalue estimation by the power method.
//!
//! The estimate is the limit of `pick(A^(k+1) x) / pick(A^k x)`, where `pick`
//! selects either the greatest component or a fixed index. The ratio sequence
//! runs through the same rounded-equality test as every other solver in the
//! crate, see [`converge_sequence`].

use log::warn;
use nalgebra::{DMatrix, DVector};
use rand::rngs::SmallRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Uniform};
use serde::{Deserialize, Serialize};

use crate::error::{LabError, Result};
use crate::rounding::round_to;
use crate::solving::{
    converge_sequence, ConvergenceOptions, ConvergenceRecord, Observer, StepEvent,
    Termination,
};

/// Which component of `A^k x` feeds the ratio.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RatioComponent {
    /// The greatest (signed) component.
    Max,
    /// A fixed component index.
    Index(usize),
}

/// How `A^k x` is produced at each step.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PowerStrategy {
    /// Rebuild `A^k` by repeated matrix-matrix products every iteration.
    ExplicitPowers,
    /// Keep `y_k = A^k x` and update it as `y_(k+1) = A y_k`.
    RunningProduct,
}

/// The arbitrary starting vector `x`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SeedVector {
    Ones,
    Values(Vec<f64>),
    /// Uniform draws in `[0.5, 1.5)` from a seeded generator.
    Random { seed: u64 },
}

impl SeedVector {
    /// Materializes the seed for an `n`-dimensional problem.
    pub fn build(&self, n: usize) -> Result<DVector<f64>> {
        match self {
            Self::Ones => Ok(DVector::from_element(n, 1.0)),
            Self::Values(values) => {
                if values.len() != n {
                    return Err(LabError::dimension_mismatch("seed vector", n, values.len()));
                }
                Ok(DVector::from_column_slice(values))
            }
            Self::Random { seed } => {
                let mut rng = SmallRng::seed_from_u64(*seed);
                let uniform = Uniform::new(0.5, 1.5);
                Ok(DVector::from_fn(n, |_, _| uniform.sample(&mut rng)))
            }
        }
    }
}

/// Options for [`PowerMethod::estimate`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PowerOptions {
    pub convergence: ConvergenceOptions,
    pub component: RatioComponent,
    pub strategy: PowerStrategy,
    pub seed: SeedVector,
}

impl Default for PowerOptions {
    fn default() -> Self {
        Self {
            convergence: ConvergenceOptions::default().with_precision(3),
            component: RatioComponent::Max,
            strategy: PowerStrategy::RunningProduct,
            seed: SeedVector::Ones,
        }
    }
}

impl PowerOptions {
    pub fn with_convergence(mut self, convergence: ConvergenceOptions) -> Self {
        self.convergence = convergence;
        self
    }

    pub fn with_component(mut self, component: RatioComponent) -> Self {
        self.component = component;
        self
    }

    pub fn with_strategy(mut self, strategy: PowerStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn with_seed(mut self, seed: SeedVector) -> Self {
        self.seed = seed;
        self
    }
}

/// Outcome of a power-method run.
#[derive(Clone, Debug)]
pub struct EigenEstimate {
    /// Converged rounded ratio.
    pub eigenvalue: f64,
    /// `A^k x` divided by its selected component, for the `k` behind `eigenvalue`.
    pub eigenvector: DVector<f64>,
    /// The power `k` of the vector behind `eigenvector`.
    pub power: usize,
    /// Ratio trace and iteration count.
    pub record: ConvergenceRecord<f64>,
}

/// Power-method estimator for a fixed square matrix.
#[derive(Clone, Debug)]
pub struct PowerMethod {
    matrix: DMatrix<f64>,
}

impl PowerMethod {
    /// Wraps a square, non-empty matrix.
    pub fn new(matrix: DMatrix<f64>) -> Result<Self> {
        if matrix.nrows() == 0 {
            return Err(LabError::dimension_mismatch("power method matrix", 1, 0));
        }
        if !matrix.is_square() {
            return Err(LabError::dimension_mismatch(
                "power method columns",
                matrix.nrows(),
                matrix.ncols(),
            ));
        }
        Ok(Self { matrix })
    }

    /// Builds the estimator from integer rows.
    ///
    /// Entries are held as `f64` so that high powers do not overflow.
    pub fn from_integer_rows(rows: &[Vec<i64>]) -> Result<Self> {
        let n = rows.len();
        for row in rows {
            if row.len() != n {
                return Err(LabError::dimension_mismatch("power method row", n, row.len()));
            }
        }
        let flat: Vec<f64> = rows.iter().flatten().map(|&value| value as f64).collect();
        Self::new(DMatrix::from_row_slice(n, n, &flat))
    }

    pub fn matrix(&self) -> &DMatrix<f64> {
        &self.matrix
    }

    pub fn dimension(&self) -> usize {
        self.matrix.nrows()
    }

    /// `A^power` by repeated multiplication (`A^k = A^(k-1) A`); `A^0` is the identity.
    pub fn matrix_power(&self, power: usize) -> DMatrix<f64> {
        let n = self.dimension();
        let mut result = DMatrix::identity(n, n);
        for _ in 0..power {
            result = &result * &self.matrix;
        }
        result
    }

    /// Runs the estimator without an observer.
    pub fn estimate(&self, options: &PowerOptions) -> Result<EigenEstimate> {
        self.estimate_observed(options, ())
    }

    /// Runs the estimator, reporting each rounded ratio to `observer`.
    ///
    /// The first ratio `pick(A^2 x) / pick(A x)` seeds the sequence; every
    /// later ratio counts as one iteration.
    ///
    /// # Errors
    ///
    /// [`LabError::DimensionMismatch`] for a bad seed or component index,
    /// [`LabError::DegenerateUpdate`] when a selected component is zero
    /// (iteration `0` refers to the seeding ratio), and
    /// [`LabError::NonConvergence`] when the safety bound is hit.
    ///
    /// With zero suppression on, a ratio that rounds to zero ends the run with
    /// [`Termination::ZeroSuppressed`]; the estimate then keeps the last
    /// non-zero ratio and the `A^k x` it was formed from. A seeding ratio that
    /// rounds to zero is reported unrounded with no iterations.
    pub fn estimate_observed<Obs>(
        &self,
        options: &PowerOptions,
        observer: Obs,
    ) -> Result<EigenEstimate>
    where
        Obs: for<'a> Observer<StepEvent<'a, f64>>,
    {
        let n = self.dimension();
        if let RatioComponent::Index(index) = options.component {
            if index >= n {
                return Err(LabError::dimension_mismatch("ratio component index", n, index));
            }
        }
        let seed = options.seed.build(n)?;

        let mut sequence = PowerSequence::new(self, seed, options);
        let convergence = &options.convergence;
        let precision = convergence.precision;
        let seeding = sequence.next_ratio();
        let first = round_to(seeding, precision);
        if !first.is_finite() {
            return Err(LabError::degenerate(0, "power method ratio", first));
        }

        if convergence.zero_suppression && first == 0.0 {
            warn!("power method: seeding ratio rounds to zero at precision {precision}; halting");
            let record = ConvergenceRecord {
                precision,
                value: seeding,
                iterations: 0,
                trace: Vec::new(),
                termination: Termination::ZeroSuppressed,
            };
            return normalised(&sequence, &sequence.current, sequence.power, record);
        }

        let record = converge_sequence(
            first,
            convergence,
            "power method ratio",
            |_| sequence.next_ratio(),
            observer,
        )?;

        // A suppressed candidate already advanced the sequence by one power.
        if record.termination == Termination::ZeroSuppressed {
            normalised(&sequence, &sequence.previous, sequence.power - 1, record)
        } else {
            normalised(&sequence, &sequence.current, sequence.power, record)
        }
    }
}

/// Divides `A^power x` by its selected component.
fn normalised(
    sequence: &PowerSequence<'_>,
    vector: &DVector<f64>,
    power: usize,
    record: ConvergenceRecord<f64>,
) -> Result<EigenEstimate> {
    let pivot = sequence.pick(vector);
    let eigenvector = vector / pivot;
    if let Some(value) = eigenvector.iter().copied().find(|value| !value.is_finite()) {
        warn!("power method: selected component of A^{power} x is {pivot}");
        let trace = record.trace.iter().map(|ratio| vec![*ratio]).collect();
        return Err(LabError::degenerate(
            record.iterations,
            "power method eigenvector normalisation",
            value,
        )
        .with_trace(trace));
    }
    Ok(EigenEstimate {
        eigenvalue: record.value,
        eigenvector,
        power,
        record,
    })
}

/// Running state of `y_k = A^k x`.
struct PowerSequence<'m> {
    method: &'m PowerMethod,
    seed: DVector<f64>,
    strategy: PowerStrategy,
    component: RatioComponent,
    power: usize,
    previous: DVector<f64>,
    current: DVector<f64>,
}

impl<'m> PowerSequence<'m> {
    fn new(method: &'m PowerMethod, seed: DVector<f64>, options: &PowerOptions) -> Self {
        let current = method.matrix() * &seed;
        Self {
            method,
            seed: seed.clone(),
            strategy: options.strategy,
            component: options.component,
            power: 1,
            previous: seed.clone(),
            current,
        }
    }

    fn pick(&self, vector: &DVector<f64>) -> f64 {
        match self.component {
            RatioComponent::Max => vector.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            RatioComponent::Index(index) => vector[index],
        }
    }

    /// Advances to `A^(k+1) x` and returns the raw ratio against `A^k x`.
    fn next_ratio(&mut self) -> f64 {
        let next = match self.strategy {
            PowerStrategy::ExplicitPowers => self.method.matrix_power(self.power + 1) * &self.seed,
            PowerStrategy::RunningProduct => self.method.matrix() * &self.current,
        };
        let ratio = self.pick(&next) / self.pick(&self.current);
        self.previous = std::mem::replace(&mut self.current, next);
        self.power += 1;
        ratio
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::solving::Action;
    use approx::assert_relative_eq;

    fn diagonal() -> PowerMethod {
        PowerMethod::from_integer_rows(&[vec![2, 0], vec![0, 5]]).unwrap()
    }

    #[test]
    fn matrix_power_by_repeated_multiplication() {
        let method = PowerMethod::from_integer_rows(&[vec![1, 1], vec![1, 0]]).unwrap();
        let fib = method.matrix_power(10);
        assert_eq!(fib[(0, 0)], 89.0);
        assert_eq!(fib[(0, 1)], 55.0);
        assert_eq!(method.matrix_power(0), DMatrix::identity(2, 2));
    }

    #[test]
    fn diagonal_matrix_yields_largest_entry() {
        let estimate = diagonal().estimate(&PowerOptions::default()).unwrap();
        assert_relative_eq!(estimate.eigenvalue, 5.0);
        assert_eq!(estimate.record.iterations, 1);
        assert_eq!(estimate.power, 3);
        // A^3 x = (8, 125), normalised by its greatest component.
        assert_relative_eq!(estimate.eigenvector[0], 8.0 / 125.0);
        assert_relative_eq!(estimate.eigenvector[1], 1.0);
    }

    #[test]
    fn rejects_non_square_input() {
        let result = PowerMethod::from_integer_rows(&[vec![1, 2, 3], vec![4, 5, 6]]);
        assert!(matches!(result, Err(LabError::DimensionMismatch { .. })));
    }

    #[test]
    fn rejects_out_of_range_component() {
        let options = PowerOptions::default().with_component(RatioComponent::Index(2));
        let result = diagonal().estimate(&options);
        assert!(matches!(result, Err(LabError::DimensionMismatch { .. })));
    }

    #[test]
    fn zero_component_is_degenerate() {
        // The first component of every A^k x is zero for this seed.
        let options = PowerOptions::default()
            .with_component(RatioComponent::Index(0))
            .with_seed(SeedVector::Values(vec![0.0, 1.0]));
        let result = diagonal().estimate(&options);
        assert!(matches!(
            result,
            Err(LabError::DegenerateUpdate { iteration: 0, .. })
        ));
    }

    #[test]
    fn random_seed_is_reproducible_and_positive() {
        let a = SeedVector::Random { seed: 9 }.build(4).unwrap();
        let b = SeedVector::Random { seed: 9 }.build(4).unwrap();
        assert_eq!(a, b);
        assert!(a.iter().all(|value| *value >= 0.5 && *value < 1.5));
    }

    #[test]
    fn strategies_agree_on_small_matrix() {
        let method =
            PowerMethod::from_integer_rows(&[vec![2, 3, 2], vec![4, 3, 5], vec![3, 2, 9]])
                .unwrap();
        let explicit = method
            .estimate(&PowerOptions::default().with_strategy(PowerStrategy::ExplicitPowers))
            .unwrap();
        let running = method
            .estimate(&PowerOptions::default().with_strategy(PowerStrategy::RunningProduct))
            .unwrap();
        assert_eq!(explicit.record.trace, running.record.trace);
        assert_eq!(explicit.power, running.power);
    }

    fn rotation() -> PowerMethod {
        // A x = (0, 2), A^2 x = (-2, 2), A^3 x = (-4, 0) for x = (1, 1).
        PowerMethod::from_integer_rows(&[vec![1, -1], vec![1, 1]]).unwrap()
    }

    #[test]
    fn suppressed_ratio_keeps_the_matching_eigenvector() {
        let options = PowerOptions::default()
            .with_component(RatioComponent::Index(1))
            .with_seed(SeedVector::Values(vec![1.0, 1.0]));
        let estimate = rotation().estimate(&options).unwrap();

        assert_eq!(estimate.record.termination, Termination::ZeroSuppressed);
        assert_eq!(estimate.eigenvalue, 1.0);
        assert_eq!(estimate.power, 2);
        assert!(estimate.eigenvector.iter().all(|value| value.is_finite()));
        assert_relative_eq!(estimate.eigenvector[0], -1.0);
        assert_relative_eq!(estimate.eigenvector[1], 1.0);
    }

    #[test]
    fn zero_pivot_after_stop_is_degenerate() {
        let options = PowerOptions::default()
            .with_convergence(ConvergenceOptions::default().with_zero_suppression(false))
            .with_component(RatioComponent::Index(1));
        let stop = |_: &StepEvent<'_, f64>| Some(Action::Stop);
        let err = rotation().estimate_observed(&options, stop).unwrap_err();

        match &err {
            LabError::DegenerateUpdate { iteration, .. } => assert_eq!(*iteration, 1),
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(err.partial_trace(), &[vec![0.0]]);
    }

    #[test]
    fn seeding_ratio_rounding_to_zero_is_suppressed() {
        let method = PowerMethod::new(DMatrix::from_diagonal_element(2, 2, 1e-4)).unwrap();
        let estimate = method.estimate(&PowerOptions::default()).unwrap();

        assert_eq!(estimate.record.termination, Termination::ZeroSuppressed);
        assert_eq!(estimate.record.iterations, 0);
        assert!(estimate.record.trace.is_empty());
        assert_relative_eq!(estimate.eigenvalue, 1e-4, max_relative = 1e-9);
        assert_eq!(estimate.power, 2);
        assert_relative_eq!(estimate.eigenvector[0], 1.0);
        assert_relative_eq!(estimate.eigenvector[1], 1.0);
    }
}

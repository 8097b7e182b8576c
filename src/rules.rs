//! Iterates and the update rules that advance them.
//!
//! An [`UpdateRule`] is a pure map from the current iterate to the next one.
//! The convergence engine in [`crate::solving`] is agnostic to the formula; it
//! only needs to round, compare and sanity-check iterates through [`Iterate`].

use crate::error::{LabError, Result};
use crate::rounding::{round_to, Precision};

/// A value (or fixed-size tuple of values) produced by one update.
pub trait Iterate: Clone + PartialEq + std::fmt::Debug {
    /// Returns a copy with every component rounded to `precision` digits.
    fn rounded(&self, precision: Precision) -> Self;

    /// Flattened view of the components, in order.
    fn components(&self) -> Vec<f64>;

    /// First component that is NaN or infinite, if any.
    fn first_non_finite(&self) -> Option<f64> {
        self.components().into_iter().find(|value| !value.is_finite())
    }

    /// Whether every component is exactly zero.
    fn is_zero(&self) -> bool {
        self.components().iter().all(|value| *value == 0.0)
    }
}

impl Iterate for f64 {
    fn rounded(&self, precision: Precision) -> Self {
        round_to(*self, precision)
    }

    fn components(&self) -> Vec<f64> {
        vec![*self]
    }
}

impl<const N: usize> Iterate for [f64; N] {
    fn rounded(&self, precision: Precision) -> Self {
        self.map(|value| round_to(value, precision))
    }

    fn components(&self) -> Vec<f64> {
        self.to_vec()
    }
}

/// A stateless map `iterate -> iterate` over fixed problem constants.
pub trait UpdateRule {
    type Iterate: Iterate;

    /// Applies the formula once.
    fn apply(&self, current: &Self::Iterate) -> Self::Iterate;

    /// Applies the formula and rounds the result to `precision` digits.
    ///
    /// Rules whose intermediate values feed back into the same step may
    /// override this to round in between.
    fn apply_rounded(&self, current: &Self::Iterate, precision: Precision) -> Self::Iterate {
        self.apply(current).rounded(precision)
    }

    /// Short label used in diagnostics.
    fn label(&self) -> &'static str;
}

/// One Gauss-Seidel sweep over a 3x3 linear system `A v = b`.
///
/// Variables are solved in order `x, y, z`; each update reads the values
/// already refreshed earlier in the same sweep.
#[derive(Clone, Debug, PartialEq)]
pub struct GaussSeidel3 {
    coefficients: [[f64; 3]; 3],
    rhs: [f64; 3],
}

impl GaussSeidel3 {
    /// Builds the sweep, rejecting systems with a zero pivot.
    pub fn new(coefficients: [[f64; 3]; 3], rhs: [f64; 3]) -> Result<Self> {
        for (row, values) in coefficients.iter().enumerate() {
            if values[row] == 0.0 {
                return Err(LabError::invalid_config(format!(
                    "Gauss-Seidel pivot on row {row} is zero"
                )));
            }
        }
        Ok(Self { coefficients, rhs })
    }

    /// Whether every row is strictly diagonally dominant (a sufficient convergence condition).
    pub fn is_diagonally_dominant(&self) -> bool {
        self.coefficients.iter().enumerate().all(|(row, values)| {
            let off: f64 = values
                .iter()
                .enumerate()
                .filter(|(col, _)| *col != row)
                .map(|(_, value)| value.abs())
                .sum();
            values[row].abs() > off
        })
    }

    pub fn coefficients(&self) -> &[[f64; 3]; 3] {
        &self.coefficients
    }

    pub fn rhs(&self) -> &[f64; 3] {
        &self.rhs
    }

    fn sweep(&self, current: &[f64; 3], round: impl Fn(f64) -> f64) -> [f64; 3] {
        let mut next = *current;
        for row in 0..3 {
            let a = &self.coefficients[row];
            let off: f64 = (0..3)
                .filter(|col| *col != row)
                .map(|col| a[col] * next[col])
                .sum();
            next[row] = round((self.rhs[row] - off) / a[row]);
        }
        next
    }
}

impl UpdateRule for GaussSeidel3 {
    type Iterate = [f64; 3];

    fn apply(&self, current: &[f64; 3]) -> [f64; 3] {
        self.sweep(current, |value| value)
    }

    fn apply_rounded(&self, current: &[f64; 3], precision: Precision) -> [f64; 3] {
        self.sweep(current, |value| round_to(value, precision))
    }

    fn label(&self) -> &'static str {
        "Gauss-Seidel sweep"
    }
}

/// Newton-Raphson step `x' = x - f(x) / f'(x)` for a scalar equation.
#[derive(Clone)]
pub struct NewtonStep<F, D> {
    f: F,
    derivative: D,
}

impl<F, D> NewtonStep<F, D>
where
    F: Fn(f64) -> f64,
    D: Fn(f64) -> f64,
{
    pub fn new(f: F, derivative: D) -> Self {
        Self { f, derivative }
    }

    /// Residual `f(x)` at a point.
    pub fn residual(&self, x: f64) -> f64 {
        (self.f)(x)
    }
}

impl<F, D> UpdateRule for NewtonStep<F, D>
where
    F: Fn(f64) -> f64,
    D: Fn(f64) -> f64,
{
    type Iterate = f64;

    fn apply(&self, current: &f64) -> f64 {
        let x = *current;
        x - (self.f)(x) / (self.derivative)(x)
    }

    fn label(&self) -> &'static str {
        "Newton step"
    }
}

impl<F, D> std::fmt::Debug for NewtonStep<F, D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NewtonStep").finish_non_exhaustive()
    }
}

/// Picard (successive substitution) step `x' = g(x)`.
#[derive(Clone)]
pub struct PicardStep<G> {
    g: G,
}

impl<G> PicardStep<G>
where
    G: Fn(f64) -> f64,
{
    pub fn new(g: G) -> Self {
        Self { g }
    }
}

impl<G> UpdateRule for PicardStep<G>
where
    G: Fn(f64) -> f64,
{
    type Iterate = f64;

    fn apply(&self, current: &f64) -> f64 {
        (self.g)(*current)
    }

    fn label(&self) -> &'static str {
        "Picard step"
    }
}

impl<G> std::fmt::Debug for PicardStep<G> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PicardStep").finish_non_exhaustive()
    }
}

/// Two scalar recurrences that share a problem but never exchange values.
///
/// Each variable is iterated to its own fixed point with its own count; see
/// [`crate::sweep::sweep_pair`].
#[derive(Clone, Debug)]
pub struct DecoupledPair<X, Y> {
    pub x: X,
    pub y: Y,
}

impl<X, Y> DecoupledPair<X, Y>
where
    X: UpdateRule<Iterate = f64>,
    Y: UpdateRule<Iterate = f64>,
{
    pub fn new(x: X, y: Y) -> Self {
        Self { x, y }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn reference_system() -> GaussSeidel3 {
        GaussSeidel3::new(
            [[20.0, 1.0, -2.0], [3.0, 20.0, 1.0], [2.0, -3.0, 20.0]],
            [17.0, -18.0, 25.0],
        )
        .unwrap()
    }

    #[test]
    fn gauss_seidel_uses_fresh_values_within_a_sweep() {
        let rule = reference_system();
        let next = rule.apply(&[2.0, 0.0, 2.0]);
        // x from the old y, z; y already sees the new x; z sees both.
        let x = (17.0 - 0.0 + 2.0 * 2.0) / 20.0;
        let y = (-18.0 - 3.0 * x - 2.0) / 20.0;
        let z = (25.0 - 2.0 * x + 3.0 * y) / 20.0;
        assert_relative_eq!(next[0], x);
        assert_relative_eq!(next[1], y);
        assert_relative_eq!(next[2], z);
    }

    #[test]
    fn gauss_seidel_rounds_between_variables() {
        let rule = reference_system();
        let next = rule.apply_rounded(&[2.0, 0.0, 2.0], 1);
        assert_eq!(next[0], 1.1);
        assert_eq!(next[1], -1.2);
        assert_eq!(next[2], round_to((25.0 - 2.0 * 1.1 + 3.0 * -1.2) / 20.0, 1));
    }

    #[test]
    fn gauss_seidel_rejects_zero_pivot() {
        let result = GaussSeidel3::new([[0.0, 1.0, 1.0], [1.0, 1.0, 1.0], [1.0, 1.0, 1.0]], [0.0; 3]);
        assert!(matches!(result, Err(LabError::InvalidConfig { .. })));
        assert!(reference_system().is_diagonally_dominant());
    }

    #[test]
    fn newton_step_follows_the_tangent() {
        let rule = NewtonStep::new(|x: f64| x * x - 2.0, |x: f64| 2.0 * x);
        assert_relative_eq!(rule.apply(&1.0), 1.5);
        assert_relative_eq!(rule.residual(1.5), 0.25);
    }

    #[test]
    fn newton_step_with_flat_derivative_is_not_finite() {
        let rule = NewtonStep::new(|x: f64| x * x - 2.0, |x: f64| 2.0 * x);
        assert!(rule.apply(&0.0).first_non_finite().is_some());
    }

    #[test]
    fn array_iterates_round_componentwise() {
        let value = [1.23456, -0.00049, 7.0];
        assert_eq!(value.rounded(3), [1.235, -0.0, 7.0]);
        assert!([0.0, -0.0].is_zero());
    }
}

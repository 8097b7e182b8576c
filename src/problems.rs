//! The concrete problem instances the lab ships with.
//!
//! Formulas are fixed per problem; only their constants, starting points and
//! precisions come from [`crate::config`].

use crate::config::{GaussSeidelConfig, PowerConfig};
use crate::eigen::PowerMethod;
use crate::error::Result;
use crate::rules::{DecoupledPair, GaussSeidel3, NewtonStep, PicardStep};

/// Plain scalar function pointer used by the built-in rules.
pub type ScalarFn = fn(f64) -> f64;

pub type ScalarNewton = NewtonStep<ScalarFn, ScalarFn>;
pub type ScalarPicard = PicardStep<ScalarFn>;

/// `f(x) = e^(2x) - 3x - 1`, with roots at `0` and near `0.3813`.
pub fn exp_residual(x: f64) -> f64 {
    (2.0 * x).exp() - 3.0 * x - 1.0
}

/// `f'(x) = 2e^(2x) - 3`, zero at `ln(1.5) / 2`.
pub fn exp_residual_derivative(x: f64) -> f64 {
    2.0 * (2.0 * x).exp() - 3.0
}

/// `g(x) = (e^(2x) - 1) / 3`, the fixed-point form of [`exp_residual`].
pub fn exp_contraction(x: f64) -> f64 {
    ((2.0 * x).exp() - 1.0) / 3.0
}

/// Integrand `e^(x - 10) sin(10x)` of the Simpson reference run.
pub fn damped_oscillation(x: f64) -> f64 {
    (x - 10.0).exp() * (10.0 * x).sin()
}

pub fn gauss_seidel(config: &GaussSeidelConfig) -> Result<GaussSeidel3> {
    GaussSeidel3::new(config.coefficients, config.rhs)
}

pub fn newton() -> ScalarNewton {
    NewtonStep::new(exp_residual as ScalarFn, exp_residual_derivative as ScalarFn)
}

pub fn picard() -> ScalarPicard {
    PicardStep::new(exp_contraction as ScalarFn)
}

/// Newton steps for `4x^2 - 11 = 0` and `4y^2 - 1 = 0`, iterated separately.
pub fn newton_pair() -> DecoupledPair<ScalarNewton, ScalarNewton> {
    DecoupledPair::new(
        NewtonStep::new(
            (|x: f64| 4.0 * x * x - 11.0) as ScalarFn,
            (|x: f64| 8.0 * x) as ScalarFn,
        ),
        NewtonStep::new(
            (|y: f64| 4.0 * y * y - 1.0) as ScalarFn,
            (|y: f64| 8.0 * y) as ScalarFn,
        ),
    )
}

/// Substitutions `x = sqrt(3 - x^2)` and `y = sqrt((y^2 - 2) / 3)`.
///
/// Neither is a contraction near its fixed point: `x` oscillates and `y`
/// leaves the domain of the square root.
pub fn picard_pair() -> DecoupledPair<ScalarPicard, ScalarPicard> {
    DecoupledPair::new(
        PicardStep::new((|x: f64| (3.0 - x * x).sqrt()) as ScalarFn),
        PicardStep::new((|y: f64| ((y * y - 2.0) / 3.0).sqrt()) as ScalarFn),
    )
}

pub fn power_method(config: &PowerConfig) -> Result<PowerMethod> {
    PowerMethod::from_integer_rows(&config.matrix)
}

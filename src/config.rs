//! Run configuration for every method, with defaults reproducing the reference runs.
//!
//! A [`LabConfig`] can be deserialized from JSON; omitted sections and fields
//! fall back to their defaults.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::eigen::{PowerOptions, PowerStrategy, RatioComponent, SeedVector};
use crate::error::{LabError, Result};
use crate::integration::SimpsonOptions;
use crate::rounding::Precision;
use crate::solving::ConvergenceOptions;

/// Largest precision accepted; beyond this `f64` carries no further decimal digits.
pub const MAX_PRECISION: Precision = 15;

/// Settings shared by every convergence-engine run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Safety bound on iterations per run.
    pub max_iterations: usize,
    pub zero_suppression: bool,
    /// Run precision sweeps on the rayon pool.
    pub parallel: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_iterations: 1_000,
            zero_suppression: true,
            parallel: false,
        }
    }
}

impl EngineConfig {
    /// Engine options for one run at `precision`.
    pub fn options(&self, precision: Precision) -> ConvergenceOptions {
        ConvergenceOptions::default()
            .with_precision(precision)
            .with_max_iterations(self.max_iterations)
            .with_zero_suppression(self.zero_suppression)
    }
}

/// The 3x3 linear system solved by Gauss-Seidel sweeps.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GaussSeidelConfig {
    pub coefficients: [[f64; 3]; 3],
    pub rhs: [f64; 3],
    pub initial: [f64; 3],
    pub precisions: Vec<Precision>,
}

impl Default for GaussSeidelConfig {
    fn default() -> Self {
        Self {
            coefficients: [[20.0, 1.0, -2.0], [3.0, 20.0, 1.0], [2.0, -3.0, 20.0]],
            rhs: [17.0, -18.0, 25.0],
            initial: [2.0, 0.0, 2.0],
            precisions: vec![3, 9, 12],
        }
    }
}

/// Newton-Raphson on `e^(2x) - 3x - 1`, swept once per starting point.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NewtonConfig {
    pub initials: Vec<f64>,
    pub precisions: Vec<Precision>,
}

impl Default for NewtonConfig {
    fn default() -> Self {
        Self {
            initials: vec![0.1, 0.203],
            precisions: vec![2, 3, 6, 12],
        }
    }
}

/// Picard iteration on `g(x) = (e^(2x) - 1) / 3`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PicardConfig {
    pub initial: f64,
    pub precisions: Vec<Precision>,
}

impl Default for PicardConfig {
    fn default() -> Self {
        Self {
            initial: 0.1,
            precisions: vec![2, 3, 6, 12],
        }
    }
}

/// Starting point and precisions of a decoupled two-variable problem.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PairConfig {
    pub initial: [f64; 2],
    pub precisions: Vec<Precision>,
}

impl PairConfig {
    /// Defaults of the Newton pair `4x^2 = 11`, `4y^2 = 1`.
    pub fn newton() -> Self {
        Self {
            initial: [1.5, 0.8],
            precisions: vec![3, 6, 12],
        }
    }

    /// Defaults of the Picard pair `x = sqrt(3 - x^2)`, `y = sqrt((y^2 - 2) / 3)`.
    pub fn picard() -> Self {
        Self {
            initial: [1.4, 2.0],
            precisions: vec![3, 6, 12],
        }
    }
}

fn default_newton_pair() -> PairConfig {
    PairConfig::newton()
}

fn default_picard_pair() -> PairConfig {
    PairConfig::picard()
}

/// The matrix and ratio settings of the power method.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PowerConfig {
    pub matrix: Vec<Vec<i64>>,
    pub precisions: Vec<Precision>,
    pub component: RatioComponent,
    pub strategy: PowerStrategy,
    pub seed: SeedVector,
}

impl Default for PowerConfig {
    fn default() -> Self {
        Self {
            matrix: vec![
                vec![6, 0, 2, 3, 2, 4],
                vec![4, 1, 8, 0, 3, 5],
                vec![7, 3, 3, 2, 9, 0],
                vec![4, 0, 0, 2, 6, 1],
                vec![1, 6, 3, 4, 5, 6],
                vec![2, 8, 4, 3, 9, 0],
            ],
            precisions: vec![3, 12, 6],
            component: RatioComponent::Max,
            strategy: PowerStrategy::RunningProduct,
            seed: SeedVector::Ones,
        }
    }
}

impl PowerConfig {
    /// Estimator options for one run at `precision`.
    pub fn options(&self, engine: &EngineConfig, precision: Precision) -> PowerOptions {
        PowerOptions::default()
            .with_convergence(engine.options(precision))
            .with_component(self.component)
            .with_strategy(self.strategy)
            .with_seed(self.seed.clone())
    }
}

/// Aggregated configuration for a full lab run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LabConfig {
    pub engine: EngineConfig,
    pub gauss_seidel: GaussSeidelConfig,
    pub newton: NewtonConfig,
    #[serde(default = "default_newton_pair")]
    pub newton_pair: PairConfig,
    pub picard: PicardConfig,
    #[serde(default = "default_picard_pair")]
    pub picard_pair: PairConfig,
    pub power: PowerConfig,
    pub simpson: SimpsonOptions,
}

impl Default for LabConfig {
    fn default() -> Self {
        Self {
            engine: EngineConfig::default(),
            gauss_seidel: GaussSeidelConfig::default(),
            newton: NewtonConfig::default(),
            newton_pair: PairConfig::newton(),
            picard: PicardConfig::default(),
            picard_pair: PairConfig::picard(),
            power: PowerConfig::default(),
            simpson: SimpsonOptions::default(),
        }
    }
}

impl LabConfig {
    /// Parses a JSON document.
    pub fn from_json_str(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Reads and parses a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Checks every section for values the solvers cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.engine.max_iterations == 0 {
            return Err(LabError::invalid_config("max_iterations must be at least 1"));
        }
        check_precisions("gauss_seidel", &self.gauss_seidel.precisions)?;
        check_precisions("newton", &self.newton.precisions)?;
        if self.newton.initials.is_empty() {
            return Err(LabError::invalid_config("newton needs at least one initial value"));
        }
        check_precisions("newton_pair", &self.newton_pair.precisions)?;
        check_precisions("picard", &self.picard.precisions)?;
        check_precisions("picard_pair", &self.picard_pair.precisions)?;
        check_precisions("power", &self.power.precisions)?;

        let n = self.power.matrix.len();
        if n == 0 {
            return Err(LabError::dimension_mismatch("power matrix", 1, 0));
        }
        if let Some(row) = self.power.matrix.iter().find(|row| row.len() != n) {
            return Err(LabError::dimension_mismatch("power matrix row", n, row.len()));
        }

        if self.simpson.estimate_precision > MAX_PRECISION {
            return Err(LabError::invalid_config(format!(
                "simpson estimate precision {} exceeds {MAX_PRECISION}",
                self.simpson.estimate_precision
            )));
        }
        self.simpson.validate()
    }
}

fn check_precisions(section: &str, precisions: &[Precision]) -> Result<()> {
    if precisions.is_empty() {
        return Err(LabError::invalid_config(format!(
            "{section} needs at least one precision"
        )));
    }
    if let Some(&precision) = precisions.iter().find(|&&p| p > MAX_PRECISION) {
        return Err(LabError::invalid_config(format!(
            "{section} precision {precision} exceeds {MAX_PRECISION}"
        )));
    }
    Ok(())
}

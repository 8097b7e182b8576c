use thiserror::Error;

/// Unified error type for `numlab` operations.
#[derive(Debug, Error)]
pub enum LabError {
    /// Raised when the rounded iterate keeps changing until the safety bound is reached.
    #[error("no convergence after {iterations} iterations; last rounded iterate {last:?}")]
    NonConvergence {
        /// Number of iterations performed before giving up.
        iterations: usize,
        /// Components of the last rounded iterate that was recorded.
        last: Vec<f64>,
        /// Components of every rounded iterate recorded before giving up.
        trace: Vec<Vec<f64>>,
    },

    /// Raised when an update produces a non-finite value.
    #[error("degenerate update at iteration {iteration} during {context}: produced {value}")]
    DegenerateUpdate {
        /// The (1-based) iteration whose update failed.
        iteration: usize,
        /// Human-readable context describing the computation.
        context: &'static str,
        /// The offending value, usually NaN or an infinity.
        value: f64,
        /// Components of the rounded iterates recorded before the failing update.
        trace: Vec<Vec<f64>>,
    },

    /// Raised when provided matrices or vectors have incompatible dimensions.
    #[error("dimension mismatch in {context}: expected {expected} but found {found}")]
    DimensionMismatch {
        context: &'static str,
        expected: usize,
        found: usize,
    },

    /// Raised when a configuration value is out of its valid domain.
    #[error("invalid configuration: {reason}")]
    InvalidConfig { reason: String },

    /// Raised when a configuration document cannot be parsed.
    #[error("failed to parse configuration: {0}")]
    Config(#[from] serde_json::Error),

    /// Raised when a configuration file cannot be read.
    #[error("failed to read configuration: {0}")]
    Io(#[from] std::io::Error),
}

impl LabError {
    /// Helper to format a [`DimensionMismatch`](LabError::DimensionMismatch) error.
    pub fn dimension_mismatch(context: &'static str, expected: usize, found: usize) -> Self {
        Self::DimensionMismatch {
            context,
            expected,
            found,
        }
    }

    /// Helper for updates that left the finite reals before anything was recorded.
    pub fn degenerate(iteration: usize, context: &'static str, value: f64) -> Self {
        Self::DegenerateUpdate {
            iteration,
            context,
            value,
            trace: Vec::new(),
        }
    }

    /// Attaches the iterates recorded before the failure. Other variants are returned unchanged.
    pub fn with_trace(mut self, recorded: Vec<Vec<f64>>) -> Self {
        match &mut self {
            Self::NonConvergence { trace, .. } | Self::DegenerateUpdate { trace, .. } => {
                *trace = recorded;
            }
            _ => {}
        }
        self
    }

    /// Iterates recorded by a failed run, oldest first; empty for other errors.
    pub fn partial_trace(&self) -> &[Vec<f64>] {
        match self {
            Self::NonConvergence { trace, .. } | Self::DegenerateUpdate { trace, .. } => trace,
            _ => &[],
        }
    }

    /// Helper for rejecting configuration values.
    pub fn invalid_config(reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            reason: reason.into(),
        }
    }

    /// Whether this error is a [`NonConvergence`](LabError::NonConvergence).
    pub fn is_non_convergence(&self) -> bool {
        matches!(self, Self::NonConvergence { .. })
    }

    /// Whether this error is a [`DegenerateUpdate`](LabError::DegenerateUpdate).
    pub fn is_degenerate(&self) -> bool {
        matches!(self, Self::DegenerateUpdate { .. })
    }
}

/// Type alias for results returned by this crate.
pub type Result<T> = std::result::Result<T, LabError>;

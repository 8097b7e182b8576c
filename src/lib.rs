//! A small laboratory of classical iterative numerical methods.
//!
//! Every method in this crate shares one idea: iterate, round the result to a
//! caller-chosen number of decimal digits, and stop when two successive
//! rounded values are identical. The crate offers
//!
//! - the rounding utility (`rounding` module),
//! - update rules for Gauss-Seidel, Newton-Raphson and Picard iteration (`rules` module),
//! - the convergence engine itself (`solving` module),
//! - a driver that repeats a run at several precisions (`sweep` module),
//! - a power-method estimator for the dominant eigenvalue (`eigen` module), and
//! - a Simpson refinement loop validated against a known integral (`integration` module).
//!
//! Problem instances are deliberately concrete (`problems` module); their
//! constants, starting points and precisions come from `config`.
//!
//! # Quick start
//!
//! ```no_run
//! use numlab::problems;
//! use numlab::solving::{converge_unobserved, ConvergenceOptions};
//!
//! let rule = problems::newton();
//! let options = ConvergenceOptions::default().with_precision(12);
//! let record = converge_unobserved(&rule, 0.203, &options).expect("converged");
//! println!("root {} after {} iterations", record.value, record.iterations);
//! ```
//!
//! Runs fail with [`LabError::NonConvergence`] when the iteration bound is hit
//! and with [`LabError::DegenerateUpdate`] when an update leaves the finite
//! reals. An update that rounds to exactly zero halts the run with
//! [`Termination::ZeroSuppressed`] instead of being reported as a fixed point.

pub mod config;
pub mod eigen;
pub mod error;
pub mod integration;
pub mod problems;
pub mod report;
pub mod rounding;
pub mod rules;
pub mod solving;
pub mod sweep;

pub use config::LabConfig;
pub use eigen::{EigenEstimate, PowerMethod, PowerOptions};
pub use error::{LabError, Result};
pub use integration::{SimpsonLoop, SimpsonOptions, SimpsonSummary, StopRule};
pub use rounding::{round_to, Precision};
pub use solving::{ConvergenceOptions, ConvergenceRecord, Termination};

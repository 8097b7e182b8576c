//! Console formatting of iteration traces and run summaries.

use crate::error::LabError;
use crate::integration::SimpsonRow;
use crate::rounding::Precision;
use crate::rules::Iterate;
use crate::solving::{ConvergenceRecord, Termination};

/// Rows printed between repeated Simpson table headers.
pub const SIMPSON_HEADER_EVERY: usize = 15;

/// Title underlined with dashes.
pub fn title(text: &str) -> String {
    format!("{text}\n{}", "-".repeat(text.chars().count()))
}

/// `x = 1.004  y = -1.100` style listing at fixed precision.
pub fn format_named(names: &[&str], values: &[f64], precision: Precision) -> String {
    let digits = precision as usize;
    names
        .iter()
        .zip(values)
        .map(|(name, value)| format!("{name} = {value:.digits$}"))
        .collect::<Vec<_>>()
        .join("  ")
}

/// `(1.004,-1.100,0.985)` or a bare value for scalars.
pub fn format_tuple(values: &[f64], precision: Precision) -> String {
    let digits = precision as usize;
    let parts: Vec<String> = values.iter().map(|v| format!("{v:.digits$}")).collect();
    match parts.as_slice() {
        [single] => single.clone(),
        _ => format!("({})", parts.join(",")),
    }
}

/// One `Iter #n: ...` line per recorded iterate.
pub fn trace_lines<I: Iterate>(names: &[&str], record: &ConvergenceRecord<I>) -> Vec<String> {
    let values: Vec<Vec<f64>> = record.trace.iter().map(Iterate::components).collect();
    iterate_lines(names, &values, record.precision)
}

/// `Iter #n` lines for the iterates a failed run recorded before it stopped.
pub fn partial_trace_lines(names: &[&str], precision: Precision, error: &LabError) -> Vec<String> {
    iterate_lines(names, error.partial_trace(), precision)
}

fn iterate_lines(names: &[&str], values: &[Vec<f64>], precision: Precision) -> Vec<String> {
    values
        .iter()
        .enumerate()
        .map(|(index, value)| {
            format!(
                "Iter #{}: {}",
                index + 1,
                format_named(names, value, precision)
            )
        })
        .collect()
}

/// Closing line for one run.
pub fn summary_line<I: Iterate>(label: &str, record: &ConvergenceRecord<I>) -> String {
    let note = match record.termination {
        Termination::Converged => "",
        Termination::ZeroSuppressed => "  (next update rounded to zero; halted)",
        Termination::StoppedByObserver => "  (stopped early)",
    };
    format!(
        "Solution with {} significant decimal digits: {label} = {}  |  Iterations: {}{note}",
        record.precision,
        format_tuple(&record.value.components(), record.precision),
        record.iterations
    )
}

/// Closing line for a decoupled pair; each half reports its own count.
pub fn pair_summary_line(x: &ConvergenceRecord<f64>, y: &ConvergenceRecord<f64>) -> String {
    let precision = x.precision;
    format!(
        "Solution with {precision} decimal places: (x,y) = {}\tIterations: x: {}, y: {}",
        format_tuple(&[x.value, y.value], precision),
        x.iterations,
        y.iterations
    )
}

/// Message for a run that ended in an error; `variable` names one half of a decoupled pair.
pub fn failure_line(
    problem: &str,
    variable: Option<&str>,
    precision: Precision,
    error: &LabError,
) -> String {
    match variable {
        Some(name) => format!(
            "{problem}, variable {name}, with {precision} significant decimal digits failed: {error}"
        ),
        None => format!("{problem} with {precision} significant decimal digits failed: {error}"),
    }
}

pub fn simpson_header() -> &'static str {
    "Iter   points  Integral    Residual   Time(s)"
}

/// Table line for one Simpson row; a header precedes every 15th row.
pub fn simpson_lines(row: &SimpsonRow, precision: Precision) -> Vec<String> {
    let digits = precision as usize;
    let mut lines = Vec::new();
    if row.iteration % SIMPSON_HEADER_EVERY == 0 {
        lines.push(simpson_header().to_string());
    }
    lines.push(format!(
        "{:<7}{:<8}{:<12.digits$}{:<11.digits$}{:.6}",
        row.iteration,
        row.points,
        row.estimate,
        row.residual,
        row.elapsed.as_secs_f64()
    ));
    lines
}

/// Counts failed runs and maps them to a process exit code.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Tally {
    pub runs: usize,
    pub non_convergence: usize,
    pub degenerate: usize,
    pub other_failures: usize,
}

impl Tally {
    pub fn record<T>(&mut self, outcome: &Result<T, LabError>) {
        self.runs += 1;
        if let Err(error) = outcome {
            if error.is_non_convergence() {
                self.non_convergence += 1;
            } else if error.is_degenerate() {
                self.degenerate += 1;
            } else {
                self.other_failures += 1;
            }
        }
    }

    /// `0` success, `2` any non-convergence, `3` degenerate updates only, `1` anything else.
    pub fn exit_code(&self) -> u8 {
        if self.non_convergence > 0 {
            2
        } else if self.degenerate > 0 {
            3
        } else if self.other_failures > 0 {
            1
        } else {
            0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn record() -> ConvergenceRecord<[f64; 3]> {
        ConvergenceRecord {
            precision: 3,
            value: [1.004, -1.1, 0.985],
            iterations: 2,
            trace: vec![[1.05, -1.0, 1.0], [1.004, -1.1, 0.985]],
            termination: Termination::Converged,
        }
    }

    #[test]
    fn trace_lines_use_fixed_precision() {
        let lines = trace_lines(&["x", "y", "z"], &record());
        assert_eq!(lines[0], "Iter #1: x = 1.050  y = -1.000  z = 1.000");
        assert_eq!(lines.len(), 2);
    }

    #[test]
    fn summary_line_lists_value_and_count() {
        let line = summary_line("(x,y,z)", &record());
        assert_eq!(
            line,
            "Solution with 3 significant decimal digits: (x,y,z) = (1.004,-1.100,0.985)  |  Iterations: 2"
        );
    }

    #[test]
    fn simpson_header_repeats_every_fifteen_rows() {
        let row = |iteration| SimpsonRow {
            iteration,
            points: 2 * iteration + 1,
            estimate: -1.30182,
            residual: 0.00104,
            elapsed: Duration::from_millis(3),
        };
        assert_eq!(simpson_lines(&row(14), 5).len(), 1);
        let lines = simpson_lines(&row(15), 5);
        assert_eq!(lines[0], simpson_header());
        assert!(lines[1].starts_with("15     31      -1.30182"));
    }

    #[test]
    fn exit_code_prefers_non_convergence() {
        let mut tally = Tally::default();
        tally.record::<()>(&Ok(()));
        assert_eq!(tally.exit_code(), 0);

        tally.record::<()>(&Err(LabError::degenerate(3, "test", f64::NAN)));
        assert_eq!(tally.exit_code(), 3);

        tally.record::<()>(&Err(LabError::NonConvergence {
            iterations: 10,
            last: vec![1.0],
            trace: Vec::new(),
        }));
        assert_eq!(tally.exit_code(), 2);
        assert_eq!(tally.runs, 3);
    }

    #[test]
    fn failure_lines_name_the_variable_and_keep_the_trace() {
        let error =
            LabError::degenerate(2, "Picard update", f64::NAN).with_trace(vec![vec![0.816]]);

        let line = failure_line("Picard pair", Some("y"), 3, &error);
        assert!(line.starts_with("Picard pair, variable y, with 3 significant"));
        assert!(!failure_line("Picard", None, 3, &error).contains("variable"));

        assert_eq!(
            partial_trace_lines(&["y"], 3, &error),
            vec!["Iter #1: y = 0.816".to_string()]
        );
        assert!(partial_trace_lines(&["y"], 3, &LabError::invalid_config("bad")).is_empty());
    }
}

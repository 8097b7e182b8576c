use std::process::ExitCode;

use log::error;

use numlab::config::LabConfig;
use numlab::report::{self, Tally};
use numlab::rules::{DecoupledPair, Iterate, UpdateRule};
use numlab::sweep::{self, PairEntry, SweepEntry};
use numlab::{problems, LabError, Precision, Result, SimpsonLoop};

fn main() -> ExitCode {
    env_logger::init();

    match run() {
        Ok(tally) => ExitCode::from(tally.exit_code()),
        Err(err) => {
            error!("aborting: {err}");
            eprintln!("numlab: {err}");
            ExitCode::from(1)
        }
    }
}

/// Reads the optional JSON configuration named by the first argument.
fn load_config() -> Result<LabConfig> {
    let config = match std::env::args().nth(1) {
        Some(path) => LabConfig::load(path)?,
        None => LabConfig::default(),
    };
    config.validate()?;
    Ok(config)
}

fn run() -> Result<Tally> {
    let config = load_config()?;
    let mut tally = Tally::default();

    run_gauss_seidel(&config, &mut tally)?;
    run_newton(&config, &mut tally);
    run_pair(
        "Newton method | Simultaneous Equations",
        &problems::newton_pair(),
        &config.newton_pair.initial,
        &config.newton_pair.precisions,
        &config,
        &mut tally,
    );
    run_picard(&config, &mut tally);
    run_pair(
        "Picard method | Simultaneous equations",
        &problems::picard_pair(),
        &config.picard_pair.initial,
        &config.picard_pair.precisions,
        &config,
        &mut tally,
    );
    run_power(&config, &mut tally)?;
    run_simpson(&config, &mut tally)?;

    Ok(tally)
}

fn run_sweep<R>(
    config: &LabConfig,
    rule: &R,
    initial: &R::Iterate,
    precisions: &[Precision],
) -> Vec<SweepEntry<R::Iterate>>
where
    R: UpdateRule + Sync,
    R::Iterate: Send + Sync,
{
    let base = config.engine.options(0);
    if config.engine.parallel {
        sweep::par_sweep(rule, initial, precisions, &base)
    } else {
        sweep::sweep(rule, initial, precisions, &base)
    }
}

fn print_entries<I: Iterate>(
    problem: &str,
    names: &[&str],
    label: &str,
    entries: &[SweepEntry<I>],
    tally: &mut Tally,
) {
    for entry in entries {
        tally.record(&entry.outcome);
        match &entry.outcome {
            Ok(record) => {
                for line in report::trace_lines(names, record) {
                    println!("{line}");
                }
                println!("-------------------");
                println!("{}", report::summary_line(label, record));
            }
            Err(err) => print_failure(problem, None, names, entry.precision, err),
        }
        println!();
    }
}

/// Prints whatever a failed run recorded, then the failure itself.
fn print_failure(
    problem: &str,
    variable: Option<&str>,
    names: &[&str],
    precision: Precision,
    err: &LabError,
) {
    for line in report::partial_trace_lines(names, precision, err) {
        println!("{line}");
    }
    println!("{}", report::failure_line(problem, variable, precision, err));
}

fn run_gauss_seidel(config: &LabConfig, tally: &mut Tally) -> Result<()> {
    let section = &config.gauss_seidel;
    let rule = problems::gauss_seidel(section)?;
    let [x0, y0, z0] = section.initial;

    println!("{}", report::title("Gauss-Seidel method"));
    println!("x0 = {x0},\ty0 = {y0},\tz0 = {z0}\n");
    let entries = run_sweep(config, &rule, &section.initial, &section.precisions);
    print_entries("Gauss-Seidel", &["x", "y", "z"], "(x,y,z)", &entries, tally);
    Ok(())
}

fn run_newton(config: &LabConfig, tally: &mut Tally) {
    let rule = problems::newton();
    println!("{}", report::title("Newton-Raphson method"));
    for &initial in &config.newton.initials {
        println!("x_0 = {initial}\n");
        let entries = run_sweep(config, &rule, &initial, &config.newton.precisions);
        print_entries("Newton-Raphson", &["x"], "x", &entries, tally);
    }
}

fn run_picard(config: &LabConfig, tally: &mut Tally) {
    let rule = problems::picard();
    let initial = config.picard.initial;
    println!("{}", report::title("Picard method"));
    println!("x_0 = {initial}\n");
    let entries = run_sweep(config, &rule, &initial, &config.picard.precisions);
    print_entries("Picard", &["x"], "x", &entries, tally);
}

fn run_pair<X, Y>(
    title: &str,
    pair: &DecoupledPair<X, Y>,
    initial: &[f64; 2],
    precisions: &[Precision],
    config: &LabConfig,
    tally: &mut Tally,
) where
    X: UpdateRule<Iterate = f64>,
    Y: UpdateRule<Iterate = f64>,
{
    println!("{}", report::title(title));
    println!("x_0 = {}\ty_0 = {}\n", initial[0], initial[1]);

    let base = config.engine.options(0);
    let entries = sweep::sweep_pair(pair, (initial[0], initial[1]), precisions, &base);
    for PairEntry { precision, x, y } in &entries {
        tally.record(x);
        tally.record(y);
        for (name, outcome) in [("x", x), ("y", y)] {
            match outcome {
                Ok(record) => {
                    for line in report::trace_lines(&[name], record) {
                        println!("{line}");
                    }
                }
                Err(err) => print_failure(title, Some(name), &[name], *precision, err),
            }
        }
        if let (Ok(x), Ok(y)) = (x, y) {
            println!("{}", report::pair_summary_line(x, y));
        }
        println!();
    }
}

fn run_power(config: &LabConfig, tally: &mut Tally) -> Result<()> {
    let section = &config.power;
    let method = problems::power_method(section)?;
    println!("{}", report::title("Power Method"));

    for &precision in &section.precisions {
        let options = section.options(&config.engine, precision);
        let outcome = method.estimate(&options);
        tally.record(&outcome);
        match &outcome {
            Ok(estimate) => {
                for line in report::trace_lines(&["l"], &estimate.record) {
                    println!("{line}");
                }
                println!("-------------------");
                println!("{}", report::summary_line("greatest eigenvalue", &estimate.record));
                println!(
                    "Eigenvector estimate: {}",
                    report::format_tuple(estimate.eigenvector.as_slice(), precision)
                );
            }
            Err(err) => print_failure("Power Method", None, &["l"], precision, err),
        }
        println!();
    }
    Ok(())
}

fn run_simpson(config: &LabConfig, tally: &mut Tally) -> Result<()> {
    let options = config.simpson.clone();
    let precision = options.estimate_precision;
    let integrator = SimpsonLoop::new(problems::damped_oscillation, options)?;

    println!("{}", report::title("Numerical Integration using the Simpson method"));
    println!("{}", report::simpson_header());
    let outcome = integrator.run_with(|row| {
        for line in report::simpson_lines(row, precision) {
            println!("{line}");
        }
        None
    });
    tally.record(&outcome);
    if let Err(err) = &outcome {
        println!("{}", report::failure_line("Simpson", None, precision, err));
    }
    Ok(())
}

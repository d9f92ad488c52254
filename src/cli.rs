//! Command-line surface for the harness runner binary.
//!
//! Thin glue: argument parsing, executor selection, report printing, and
//! exit-code wiring. Stdout carries only the aggregate TAP summary so it
//! can be piped into another TAP consumer; the per-unit report goes to
//! stderr.

use crate::exec::{CommandExecutor, TapFileExecutor};
use crate::harness::{Harness, UnitExecutor};
use crate::session::{Entry, SessionConfig, Verbosity};
use clap::Parser;

/// The main CLI argument structure.
#[derive(Debug, Parser)]
#[command(
    name = "tapkit",
    version,
    about = "Run a directory of TAP test units and aggregate the results."
)]
pub struct Args {
    /// Directory containing the test units.
    #[arg(default_value = "t")]
    pub dir: String,

    /// Extension filter for unit files. Separate alternatives with '|'.
    #[arg(long, default_value = "tap")]
    pub ext: String,

    /// Run each unit through this interpreter and read TAP from its stdout.
    /// Without --run or --exec, unit files are read as pre-recorded TAP text.
    #[arg(long, value_name = "PROGRAM")]
    pub run: Option<String>,

    /// Execute unit files directly as programs.
    #[arg(long, conflicts_with = "run")]
    pub exec: bool,

    /// Do not plan the aggregate session up front.
    #[arg(long)]
    pub no_plan: bool,

    /// Print a per-unit PASS/FAIL report to stderr before the TAP summary.
    #[arg(short, long)]
    pub verbose: bool,
}

const RESET: &str = "\x1b[0m";
const RED: &str = "\x1b[31m";
const GREEN: &str = "\x1b[32m";

fn colorize(use_colors: bool, text: &str, color: &str) -> String {
    if use_colors {
        format!("{}{}{}", color, text, RESET)
    } else {
        text.to_string()
    }
}

/// Runs the harness per the parsed arguments and returns the process exit
/// code: 0 when every unit passed and the plan was met, 1 otherwise.
pub fn run(args: Args) -> i32 {
    let executor: Box<dyn UnitExecutor> = if let Some(program) = &args.run {
        Box::new(CommandExecutor::with_interpreter(program))
    } else if args.exec {
        Box::new(CommandExecutor::new())
    } else {
        Box::new(TapFileExecutor::new())
    };

    let verbosity = if args.verbose {
        Verbosity::Details
    } else {
        Verbosity::Summary
    };
    let config = SessionConfig {
        verbosity,
        ..SessionConfig::default()
    };

    let mut harness = Harness::with_config(executor, config);
    harness.add_dir(&args.dir, &args.ext);
    harness.run(!args.no_plan);

    if verbosity >= Verbosity::Details {
        report_units(&harness);
    }
    print!("{}", harness.summary());

    if harness.success() {
        0
    } else {
        1
    }
}

/// Per-unit PASS/FAIL lines, colorized when stderr is a terminal.
fn report_units(harness: &Harness) {
    let use_colors = atty::is(atty::Stream::Stderr);
    for entry in harness.suite().entries() {
        let Entry::Log(log) = entry else { continue };
        let unit = log.desc.as_deref().unwrap_or("<unnamed unit>");
        if log.ok {
            eprintln!("{}: {}", colorize(use_colors, "PASS", GREEN), unit);
        } else {
            eprintln!("{}: {}", colorize(use_colors, "FAIL", RED), unit);
        }
    }
    eprintln!(
        "\nUnit summary: total {}, failed {}, planned {}",
        harness.ran(),
        harness.failed(true),
        harness.planned(),
    );
}

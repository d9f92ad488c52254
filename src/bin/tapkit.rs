// Harness runner: aggregates a directory of TAP test units.
// Usage: cargo run --bin tapkit [dir] [--ext tap] [--run PROGRAM | --exec]

use clap::Parser;
use tapkit::cli::{run, Args};

fn main() {
    let args = Args::parse();
    std::process::exit(run(args));
}

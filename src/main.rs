use std::env::args;
use std::io::{self, BufWriter};
use std::process::ExitCode;
use std::str::FromStr;

use tracing_subscriber::EnvFilter;

use counter_contention::config::BenchConfig;
use counter_contention::error::Result;
use counter_contention::harness::Harness;
use counter_contention::strategy::Section;

/// Logs go to stderr, stdout is reserved for the report.
fn setup_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

/// No arguments - the whole suite.
/// One argument - just that section, e.g. `single` or `mutex_aligned`.
fn run() -> Result<()> {
    let sections = match args().nth(1) {
        None => Section::all(),
        Some(selector) => vec![Section::from_str(&selector)?],
    };

    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());

    Harness::new(BenchConfig::default()).run(&mut out, &sections)
}

/// Any error is fatal: its message goes to stderr as is and the exit code is 1.
fn main() -> ExitCode {
    setup_logging();

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{e}");
            ExitCode::FAILURE
        }
    }
}

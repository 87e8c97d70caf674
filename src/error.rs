//! Error types for the benchmark harness

use std::io;
use thiserror::Error;

/// Everything that can stop a benchmark run.
/// None of these are retried: a single-shot measurement can't proceed without a clock or its workers.
#[derive(Error, Debug)]
pub enum BenchError {
    #[error("clock_gettime() failed: {0}")]
    Clock(io::Error),

    #[error("failed to spawn worker {index}: {source}")]
    Spawn { index: usize, source: io::Error },

    #[error("worker {0} panicked")]
    Worker(usize),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("unknown section {0:?}, use one of {1}")]
    UnknownSection(String, String),

    #[error("failed to write the report: {0}")]
    Io(#[from] io::Error),
}

pub type Result<T> = std::result::Result<T, BenchError>;

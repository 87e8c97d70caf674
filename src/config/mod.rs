//! # Benchmark configuration
//!
//! The shipped binary always runs with [BenchConfig::default]: 10^8 increments split across 2 threads,
//! each measurement repeated 5 times. Smaller configurations exist for the unit tests.

use crate::error::{BenchError, Result};

/// total increments per measurement, whatever the number of threads
pub const COUNTER_HIGH: u64 = 100_000_000;
pub const THREAD_COUNT: usize = 2;
/// repetitions per section
pub const MEASURE_COUNT: usize = 5;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BenchConfig {
    counter_high: u64,
    thread_count: usize,
    measure_count: usize,
}

impl BenchConfig {
    /// Rejects the configurations where a worker would get no work at all.
    pub fn new(counter_high: u64, thread_count: usize, measure_count: usize) -> Result<Self> {
        if thread_count == 0 {
            return Err(BenchError::Config("at least one worker thread is required".into()));
        }
        if measure_count == 0 {
            return Err(BenchError::Config("at least one repetition is required".into()));
        }
        if counter_high < thread_count as u64 {
            return Err(BenchError::Config(format!(
                "counter high {counter_high} leaves some of {thread_count} threads without iterations"
            )));
        }
        Ok(Self {
            counter_high,
            thread_count,
            measure_count,
        })
    }

    pub fn counter_high(&self) -> u64 {
        self.counter_high
    }

    pub fn thread_count(&self) -> usize {
        self.thread_count
    }

    pub fn measure_count(&self) -> usize {
        self.measure_count
    }

    /// Increments done by every worker.
    /// Integer division => the remainder is dropped when threads don't divide the counter evenly.
    pub fn per_thread(&self) -> u64 {
        self.counter_high / self.thread_count as u64
    }

    /// what the counter reaches when no update is lost
    pub fn expected_total(&self) -> u64 {
        self.per_thread() * self.thread_count as u64
    }
}

impl Default for BenchConfig {
    fn default() -> Self {
        Self {
            counter_high: COUNTER_HIGH,
            thread_count: THREAD_COUNT,
            measure_count: MEASURE_COUNT,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_default_matches_constants() {
        let config = BenchConfig::default();
        assert_eq!(config.counter_high(), 100_000_000);
        assert_eq!(config.thread_count(), 2);
        assert_eq!(config.measure_count(), 5);
        assert_eq!(config.per_thread(), 50_000_000);
        assert_eq!(config.expected_total(), COUNTER_HIGH);
        assert_eq!(BenchConfig::new(COUNTER_HIGH, THREAD_COUNT, MEASURE_COUNT).unwrap(), config);
    }

    #[test]
    fn test_uneven_split_drops_remainder() {
        let config = BenchConfig::new(1001, 2, 1).unwrap();
        assert_eq!(config.per_thread(), 500);
        assert_eq!(config.expected_total(), 1000);

        let config = BenchConfig::new(10, 3, 1).unwrap();
        assert_eq!(config.per_thread(), 3);
        assert_eq!(config.expected_total(), 9);
    }

    #[test]
    fn test_every_thread_gets_work() {
        // counter_high == thread_count is the smallest accepted split
        let config = BenchConfig::new(4, 4, 1).unwrap();
        assert_eq!(config.per_thread(), 1);

        assert!(matches!(BenchConfig::new(3, 4, 1), Err(BenchError::Config(_))));
        assert!(matches!(BenchConfig::new(1000, 0, 1), Err(BenchError::Config(_))));
        assert!(matches!(BenchConfig::new(1000, 2, 0), Err(BenchError::Config(_))));
    }
}

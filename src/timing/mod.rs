//! # Timing
//!
//! Every measurement is bracketed by two reads of the monotonic clock.
//! The monotonic clock never goes backwards, unlike the wall clock that NTP or a user may adjust.
//!
//! The clock hides behind the [Clock] trait, so a failing or scripted clock can replace
//! [MonotonicClock] where needed.

use std::fmt;
use std::io;

use crate::context::SharedCounter;
use crate::error::{BenchError, Result};

pub const NANOS_PER_SEC: i64 = 1_000_000_000;
pub const NANOS_PER_MILLI: u64 = 1_000_000;

/// A `timespec`-like point in time: whole seconds plus the nanoseconds within that second.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Timestamp {
    pub sec: i64,
    pub nsec: i64,
}

impl Timestamp {
    pub const fn new(sec: i64, nsec: i64) -> Self {
        Self { sec, nsec }
    }
}

/// Source of timestamps for [measure_once].
pub trait Clock {
    fn now(&self) -> Result<Timestamp>;
}

/// `clock_gettime(CLOCK_MONOTONIC)`
#[derive(Clone, Copy, Debug, Default)]
pub struct MonotonicClock;

impl Clock for MonotonicClock {
    fn now(&self) -> Result<Timestamp> {
        let mut ts = libc::timespec {
            tv_sec: 0,
            tv_nsec: 0,
        };
        // SAFETY: ts is a valid, exclusively borrowed timespec for the call's duration
        let err = unsafe { libc::clock_gettime(libc::CLOCK_MONOTONIC, &mut ts) };
        if err != 0 {
            return Err(BenchError::Clock(io::Error::last_os_error()));
        }
        // time_t and c_long are narrower on some targets
        #[allow(clippy::unnecessary_cast)]
        let now = Timestamp::new(ts.tv_sec as i64, ts.tv_nsec as i64);
        Ok(now)
    }
}

/// Nanoseconds between two timestamps.
///
/// If the end's nanoseconds are below the start's, one second is borrowed,
/// the same way one would subtract two `timespec`s by hand.
/// An end before the start (impossible for a monotonic clock) gives 0.
pub fn elapsed_nanos(start: Timestamp, end: Timestamp) -> u64 {
    let (sec, nsec) = if end.nsec < start.nsec {
        (end.sec - start.sec - 1, end.nsec + NANOS_PER_SEC - start.nsec)
    } else {
        (end.sec - start.sec, end.nsec - start.nsec)
    };
    u64::try_from(sec * NANOS_PER_SEC + nsec).unwrap_or(0)
}

/// One report line: what the counter ended at and how long it took to get there
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Measurement {
    pub counter: u64,
    pub elapsed_ms: u64,
}

impl fmt::Display for Measurement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "counter {}\t\tdiff, ms {}", self.counter, self.elapsed_ms)
    }
}

/// Runs the workload between two clock reads and captures the counter right after.
/// The elapsed time is truncated to whole milliseconds.
///
/// A clock failure before the workload means it never runs.
pub fn measure_once<C, F>(clock: &C, counter: &SharedCounter, workload: F) -> Result<Measurement>
where
    C: Clock + ?Sized,
    F: FnOnce(),
{
    let start = clock.now()?;
    workload();
    let end = clock.now()?;

    Ok(Measurement {
        counter: counter.get(),
        elapsed_ms: elapsed_nanos(start, end) / NANOS_PER_MILLI,
    })
}

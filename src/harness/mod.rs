//! # Driver
//!
//! Runs the sections and writes the raw report, no aggregation:
//! ```text
//! sizeof(pthread_mutex_t) 40
//! sizeof(pthread_rwlock_t) 56
//!
//! single thread:
//! counter 100000000		diff, ms 61
//! ...
//!
//! threads naive:
//! counter 56117530		diff, ms 154
//! ...
//! ```
//! The context is created once, so the locks live through the whole suite.

use std::io::Write;

use tracing::{debug, info};

use crate::config::BenchConfig;
use crate::context::BenchContext;
use crate::error::Result;
use crate::pool::{run_threaded, Launcher, OsLauncher};
use crate::posix;
use crate::strategy::{Section, Strategy};
use crate::timing::{measure_once, Clock, Measurement, MonotonicClock};

pub struct Harness<C = MonotonicClock, L = OsLauncher> {
    ctx: BenchContext,
    clock: C,
    launcher: L,
}

impl Harness {
    /// the real clock and real threads
    pub fn new(config: BenchConfig) -> Self {
        Self::with_parts(config, MonotonicClock, OsLauncher)
    }
}

impl<C: Clock, L: Launcher> Harness<C, L> {
    pub fn with_parts(config: BenchConfig, clock: C, launcher: L) -> Self {
        Self {
            ctx: BenchContext::new(config),
            clock,
            launcher,
        }
    }

    /// One uncontended run: reset, then count to the target on the calling thread.
    pub fn measure_single(&self) -> Result<Measurement> {
        let counter = self.ctx.counter();
        let target = self.ctx.config().counter_high();
        measure_once(&self.clock, counter, || {
            counter.reset();
            for _ in 0..target {
                counter.bump_unsynchronized();
            }
        })
    }

    /// One repetition of a threaded strategy.
    pub fn measure_threaded(&self, strategy: Strategy) -> Result<Measurement> {
        run_threaded(&self.ctx, &self.clock, &self.launcher, strategy.entry())
    }

    /// Header plus one line per repetition.
    /// A failed repetition ends the section with the error, nothing is written for it.
    pub fn run_section<W: Write>(&self, out: &mut W, section: Section) -> Result<()> {
        info!(%section, "measuring");
        match section {
            Section::Single => writeln!(out, "\nsingle thread:")?,
            Section::Threads(strategy) => writeln!(out, "\nthreads {strategy}:")?,
        }

        for i in 0..self.ctx.config().measure_count() {
            debug!(%section, repetition = i, "start");
            let measurement = match section {
                Section::Single => self.measure_single()?,
                Section::Threads(strategy) => self.measure_threaded(strategy)?,
            };
            writeln!(out, "{measurement}")?;
            out.flush()?;
        }
        Ok(())
    }

    /// The native lock sizes, then the sections in order.
    pub fn run<W: Write>(&self, out: &mut W, sections: &[Section]) -> Result<()> {
        writeln!(out, "sizeof(pthread_mutex_t) {}", posix::mutex_size())?;
        writeln!(out, "sizeof(pthread_rwlock_t) {}", posix::rwlock_size())?;

        for &section in sections {
            self.run_section(out, section)?;
        }
        Ok(())
    }
}

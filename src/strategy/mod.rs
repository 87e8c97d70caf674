//! # Increment strategies
//!
//! Every worker goes through the same states:
//! spawned -> started -> spinning at the start barrier -> incrementing -> done -> exit
//!
//! Only the increment differs:
//! - naive - `counter += 1` with no synchronization at all. Two threads read the same value and
//!   both write value+1 => updates get lost. The result is below the target more often than not
//!   and it's expected, that's the point of the baseline.
//! - atomic - a SeqCst fetch_add, exact. The cost is the cache line bouncing between the cores.
//! - mutex - `pthread_mutex_t` around a plain increment
//! - rwlock - `pthread_rwlock_t` write-locked around a plain increment.
//!   Same exclusion as the mutex, heavier bookkeeping for readers that never come.
//! - `_aligned` - the same lock on its own cache line
//!
//! Each worker does `counter_high / N` increments => N workers do the same total work as the single thread.

use std::fmt;
use std::str::FromStr;

use strum::IntoEnumIterator;
use strum_macros::{Display, EnumIter, EnumString};

use crate::context::BenchContext;
use crate::error::BenchError;
use crate::pool::spin_until;

#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumIter, EnumString, Display)]
#[strum(serialize_all = "snake_case")]
pub enum Strategy {
    Naive,
    Atomic,
    Mutex,
    MutexAligned,
    Rwlock,
    RwlockAligned,
}

impl Strategy {
    /// The per-thread body handed to [crate::pool::run_threaded].
    pub fn entry(self) -> fn(&BenchContext, usize) {
        match self {
            Strategy::Naive => naive,
            Strategy::Atomic => atomic,
            Strategy::Mutex => mutex,
            Strategy::MutexAligned => mutex_aligned,
            Strategy::Rwlock => rwlock,
            Strategy::RwlockAligned => rwlock_aligned,
        }
    }

    /// Whether the final counter is guaranteed to hit the target.
    pub fn is_exact(self) -> bool {
        self != Strategy::Naive
    }
}

/// The worker's state machine around the strategy-specific `increment`.
///
/// An aborted run (see [BenchContext::abort]) skips the increments but still reports done.
#[inline]
pub fn run_worker(ctx: &BenchContext, t: usize, increment: impl Fn(&BenchContext)) {
    ctx.signal_started(t);

    spin_until(|| ctx.is_released() || ctx.is_aborted());

    if !ctx.is_aborted() {
        for _ in 0..ctx.config().per_thread() {
            increment(ctx);
        }
    }

    ctx.signal_done(t);
}

fn naive(ctx: &BenchContext, t: usize) {
    run_worker(ctx, t, |ctx| ctx.counter().bump_unsynchronized());
}

fn atomic(ctx: &BenchContext, t: usize) {
    run_worker(ctx, t, |ctx| ctx.counter().bump_atomic());
}

fn mutex(ctx: &BenchContext, t: usize) {
    run_worker(ctx, t, |ctx| {
        let _guard = ctx.locks().mutex.lock();
        ctx.counter().bump_unsynchronized();
    });
}

fn mutex_aligned(ctx: &BenchContext, t: usize) {
    run_worker(ctx, t, |ctx| {
        let _guard = ctx.locks().mutex_aligned.lock();
        ctx.counter().bump_unsynchronized();
    });
}

fn rwlock(ctx: &BenchContext, t: usize) {
    run_worker(ctx, t, |ctx| {
        let _guard = ctx.locks().rwlock.write();
        ctx.counter().bump_unsynchronized();
    });
}

fn rwlock_aligned(ctx: &BenchContext, t: usize) {
    run_worker(ctx, t, |ctx| {
        let _guard = ctx.locks().rwlock_aligned.write();
        ctx.counter().bump_unsynchronized();
    });
}

/// One block of the report: the single-thread baseline or one of the threaded strategies.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Section {
    Single,
    Threads(Strategy),
}

impl Section {
    /// the whole suite in report order
    pub fn all() -> Vec<Section> {
        std::iter::once(Section::Single)
            .chain(Strategy::iter().map(Section::Threads))
            .collect()
    }

    /// every accepted selector, comma-separated
    pub fn names() -> String {
        Section::all()
            .iter()
            .map(|s| s.to_string())
            .collect::<Vec<String>>()
            .join(",")
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Section::Single => f.write_str("single"),
            Section::Threads(strategy) => write!(f, "{strategy}"),
        }
    }
}

impl FromStr for Section {
    type Err = BenchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "single" {
            return Ok(Section::Single);
        }
        Strategy::from_str(s)
            .map(Section::Threads)
            .map_err(|_| BenchError::UnknownSection(s.to_string(), Section::names()))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::config::BenchConfig;
    use crate::pool::{run_threaded, OsLauncher};
    use crate::timing::MonotonicClock;

    fn run(strategy: Strategy, counter_high: u64, threads: usize) -> u64 {
        let ctx = BenchContext::new(BenchConfig::new(counter_high, threads, 1).unwrap());
        run_threaded(&ctx, &MonotonicClock, &OsLauncher, strategy.entry())
            .unwrap()
            .counter
    }

    #[test]
    fn test_names() {
        let names: Vec<String> = Strategy::iter().map(|s| s.to_string()).collect();
        assert_eq!(
            names,
            ["naive", "atomic", "mutex", "mutex_aligned", "rwlock", "rwlock_aligned"]
        );
        assert_eq!(Strategy::from_str("rwlock_aligned").unwrap(), Strategy::RwlockAligned);
        assert!(Strategy::from_str("spinlock").is_err());
    }

    #[test]
    fn test_synchronized_strategies_are_exact() {
        for strategy in Strategy::iter().filter(|s| s.is_exact()) {
            assert_eq!(run(strategy, 1000, 2), 1000, "{strategy}");
        }
    }

    #[test]
    fn test_naive_stays_in_range() {
        // lost updates are fine, inventing increments isn't
        let counter = run(Strategy::Naive, 1000, 2);
        assert!((1..=1000).contains(&counter), "naive counted {counter}");
    }

    #[test]
    fn test_repeated_runs_keep_the_outcome() {
        let ctx = BenchContext::new(BenchConfig::new(1000, 2, 1).unwrap());
        for strategy in Strategy::iter() {
            for _ in 0..3 {
                let counter = run_threaded(&ctx, &MonotonicClock, &OsLauncher, strategy.entry())
                    .unwrap()
                    .counter;
                if strategy.is_exact() {
                    assert_eq!(counter, 1000, "{strategy}");
                } else {
                    assert!(counter <= 1000, "{strategy} counted {counter}");
                }
            }
        }
    }

    #[test]
    fn test_uneven_split() {
        assert_eq!(run(Strategy::Atomic, 1001, 2), 1000);
        assert_eq!(run(Strategy::Mutex, 10, 3), 9);
        // one increment each, none idle
        assert_eq!(run(Strategy::RwlockAligned, 4, 4), 4);
    }

    #[test]
    fn test_more_threads() {
        assert_eq!(run(Strategy::MutexAligned, 4000, 4), 4000);
        assert_eq!(run(Strategy::Rwlock, 4000, 8), 4000);
    }

    #[test]
    fn test_aborted_worker_skips_increments() {
        let ctx = BenchContext::new(BenchConfig::new(1000, 1, 1).unwrap());
        ctx.abort();
        atomic(&ctx, 0);
        assert!(ctx.is_started(0));
        assert!(ctx.is_done(0));
        assert_eq!(ctx.counter().get(), 0);
    }

    #[test]
    fn test_sections() {
        let all = Section::all();
        assert_eq!(all.len(), 7);
        assert_eq!(all[0], Section::Single);
        assert_eq!(all[1], Section::Threads(Strategy::Naive));
        assert_eq!(Section::from_str("single").unwrap(), Section::Single);
        assert_eq!(
            Section::from_str("mutex").unwrap(),
            Section::Threads(Strategy::Mutex)
        );
        assert_eq!(Section::Threads(Strategy::RwlockAligned).to_string(), "rwlock_aligned");

        let err = Section::from_str("threads").unwrap_err();
        assert_eq!(
            err.to_string(),
            "unknown section \"threads\", use one of single,naive,atomic,mutex,mutex_aligned,rwlock,rwlock_aligned"
        );
    }
}

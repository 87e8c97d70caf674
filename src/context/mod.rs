//! # Benchmark-run context
//!
//! Everything the workers share during one suite: the counter, the barrier flags and the locks.
//! The counter and the locks sit together in [SharedData], so their relative placement is fixed.
//! Workers borrow the context from scoped threads, so there are no process-wide globals and
//! several contexts may run side by side (the unit tests do).
//!
//! All flags use SeqCst: the spin-waits should see a change as soon as the hardware lets them,
//! and ordering mistakes in the harness shouldn't become a second source of timing noise.

use std::sync::atomic::{
    AtomicBool, AtomicU64,
    Ordering::{Relaxed, SeqCst},
};

use crate::config::BenchConfig;
use crate::posix::{CacheAligned, Mutex, RwLock};

/// The shared 64-bit counter.
///
/// It's an atomic for every strategy, what differs is the increment:
/// - [SharedCounter::bump_unsynchronized] is a relaxed load then a relaxed store.
///   It compiles to the same `mov`s as a plain `+= 1` but two of them racing lose updates without UB.
/// - [SharedCounter::bump_atomic] is a single `lock xadd` (or an LL/SC loop on ARM)
#[derive(Debug, Default)]
pub struct SharedCounter {
    value: AtomicU64,
}

impl SharedCounter {
    pub fn get(&self) -> u64 {
        self.value.load(SeqCst)
    }

    pub fn reset(&self) {
        self.value.store(0, SeqCst);
    }

    /// read-modify-write in 2 steps, correct only when something else excludes other writers
    #[inline]
    pub fn bump_unsynchronized(&self) {
        let v = self.value.load(Relaxed);
        self.value.store(v.wrapping_add(1), Relaxed);
    }

    #[inline]
    pub fn bump_atomic(&self) {
        self.value.fetch_add(1, SeqCst);
    }
}

/// The counter and the locks under test, laid out the way plain globals would be.
///
/// `repr(C)` keeps the declaration order: the counter opens a cache line and the default locks
/// come right behind it with their natural alignment => they share the counter's line,
/// which is written on every increment. The `_aligned` locks each get a line of their own.
#[repr(C, align(64))]
#[derive(Default)]
pub struct SharedData {
    pub counter: SharedCounter,
    pub mutex: Mutex,
    pub rwlock: RwLock,
    pub mutex_aligned: CacheAligned<Mutex>,
    pub rwlock_aligned: CacheAligned<RwLock>,
}

pub struct BenchContext {
    config: BenchConfig,
    run: AtomicBool,
    abort: AtomicBool,
    started: Box<[AtomicBool]>,
    done: Box<[AtomicBool]>,
    /// boxed so the pthread objects keep their address when the context moves
    shared: Box<SharedData>,
}

impl BenchContext {
    pub fn new(config: BenchConfig) -> Self {
        let flags = || -> Box<[AtomicBool]> {
            (0..config.thread_count())
                .map(|_| AtomicBool::new(false))
                .collect()
        };
        Self {
            config,
            run: AtomicBool::new(false),
            abort: AtomicBool::new(false),
            started: flags(),
            done: flags(),
            shared: Box::default(),
        }
    }

    pub fn config(&self) -> &BenchConfig {
        &self.config
    }

    pub fn thread_count(&self) -> usize {
        self.config.thread_count()
    }

    pub fn counter(&self) -> &SharedCounter {
        &self.shared.counter
    }

    pub fn locks(&self) -> &SharedData {
        &self.shared
    }

    /// Back to the pre-run state before every repetition.
    /// The locks are left alone, they carry over from run to run.
    pub fn reset(&self) {
        self.run.store(false, SeqCst);
        self.abort.store(false, SeqCst);
        self.shared.counter.reset();
        for flag in self.started.iter().chain(self.done.iter()) {
            flag.store(false, SeqCst);
        }
    }

    pub fn signal_started(&self, t: usize) {
        self.started[t].store(true, SeqCst);
    }

    pub fn is_started(&self, t: usize) -> bool {
        self.started[t].load(SeqCst)
    }

    pub fn signal_done(&self, t: usize) {
        self.done[t].store(true, SeqCst);
    }

    pub fn is_done(&self, t: usize) -> bool {
        self.done[t].load(SeqCst)
    }

    /// opens the start barrier
    pub fn release(&self) {
        self.run.store(true, SeqCst);
    }

    pub fn is_released(&self) -> bool {
        self.run.load(SeqCst)
    }

    /// Tells the workers still at the start barrier to leave without incrementing.
    pub fn abort(&self) {
        self.abort.store(true, SeqCst);
    }

    pub fn is_aborted(&self) -> bool {
        self.abort.load(SeqCst)
    }
}

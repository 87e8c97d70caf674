//! # Worker pool
//!
//! One repetition of a threaded measurement:
//! 1. reset the context
//! 2. spawn N workers one by one, spinning after each until it reports itself started
//! 3. start the clock, open the start barrier, spin until every worker is done, stop the clock
//! 4. join the workers
//!
//! Only step 3 is timed => thread creation and teardown don't leak into the numbers.
//!
//! The waits are busy loops on purpose. Parking or a condvar would add a wake-up latency
//! that has nothing to do with the primitive under test. The price is a burning core while waiting.
//!
//! Threads are scoped, so the workers borrow the context instead of sharing an `Arc` or globals,
//! and they're created anew on every repetition.

use std::{
    hint, io,
    thread::{self, Scope, ScopedJoinHandle},
};

use tracing::{debug, warn};

use crate::context::BenchContext;
use crate::error::{BenchError, Result};
use crate::timing::{measure_once, Clock, Measurement};

/// Busy-waits until the predicate holds, no yielding and no back-off.
#[inline]
pub fn spin_until(mut predicate: impl FnMut() -> bool) {
    while !predicate() {
        hint::spin_loop(); // pause on x86, yield on ARM: still spinning, just kinder to the sibling hyper-thread
    }
}

/// Creates the worker threads.
/// It's a seam to make thread creation fail on demand, [OsLauncher] is the real one.
pub trait Launcher {
    fn launch<'scope, 'env, F>(
        &self,
        scope: &'scope Scope<'scope, 'env>,
        index: usize,
        worker: F,
    ) -> io::Result<ScopedJoinHandle<'scope, ()>>
    where
        F: FnOnce() + Send + 'scope;
}

/// Plain OS threads, named after their index to be recognizable in `top -H` and panic messages
#[derive(Clone, Copy, Debug, Default)]
pub struct OsLauncher;

impl Launcher for OsLauncher {
    fn launch<'scope, 'env, F>(
        &self,
        scope: &'scope Scope<'scope, 'env>,
        index: usize,
        worker: F,
    ) -> io::Result<ScopedJoinHandle<'scope, ()>>
    where
        F: FnOnce() + Send + 'scope,
    {
        thread::Builder::new()
            .name(format!("counter-worker-{index}"))
            .spawn_scoped(scope, worker)
    }
}

/// The timed part: open the start barrier and wait for every worker to finish.
fn release_and_wait(ctx: &BenchContext) {
    ctx.release();
    for t in 0..ctx.thread_count() {
        spin_until(|| ctx.is_done(t));
    }
}

/// Joins every handle, reporting the first worker that panicked.
fn join_all(handles: Vec<ScopedJoinHandle<'_, ()>>) -> Result<()> {
    let mut first_panic = None;
    for (t, handle) in handles.into_iter().enumerate() {
        if handle.join().is_err() && first_panic.is_none() {
            first_panic = Some(t);
        }
    }
    match first_panic {
        Some(t) => Err(BenchError::Worker(t)),
        None => Ok(()),
    }
}

/// Runs one repetition with `entry` as every worker's body and returns what the clock saw.
///
/// `entry` gets the context and the worker's index in `0..N`. It must report started first thing,
/// wait for the start barrier, and report done at the end (see [crate::strategy::run_worker]).
///
/// A failed spawn or clock read aborts the run: workers still at the start barrier leave without
/// incrementing, all live workers are joined, and the error comes back without a measurement.
pub fn run_threaded<C, L, F>(ctx: &BenchContext, clock: &C, launcher: &L, entry: F) -> Result<Measurement>
where
    C: Clock + ?Sized,
    L: Launcher,
    F: Fn(&BenchContext, usize) + Sync,
{
    ctx.reset();
    let entry = &entry;

    thread::scope(|s| {
        let mut handles = Vec::with_capacity(ctx.thread_count());

        for t in 0..ctx.thread_count() {
            match launcher.launch(s, t, move || entry(ctx, t)) {
                Ok(handle) => handles.push(handle),
                Err(source) => {
                    warn!(worker = t, live = handles.len(), "spawn failed, aborting the run");
                    ctx.abort();
                    join_all(handles)?;
                    return Err(BenchError::Spawn { index: t, source });
                }
            }
            spin_until(|| ctx.is_started(t));
            debug!(worker = t, "worker started");
        }

        let measurement = measure_once(clock, ctx.counter(), || release_and_wait(ctx));
        if measurement.is_err() {
            warn!("clock failed, aborting the run");
            ctx.abort();
        }
        join_all(handles)?;
        measurement
    })
}

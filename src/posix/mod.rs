//! # POSIX primitives under test
//! The locked strategies measure the operating system's own locks, not a Rust re-implementation:
//! - `pthread_mutex_t` - see [Mutex]
//! - `pthread_rwlock_t` - see [RwLock], only ever write-locked here
//!
//! Both come from the `libc` crate. Rust program -> libc crate -> OS lib (e.g. glibc) -> futex syscall when contended.
//!
//! ## Wrapping in Rust
//! The C objects are mutated through shared references from several threads => [std::cell::UnsafeCell] inside.
//! They also rely on a stable memory address once used, so they mustn't move after the first lock.
//! Guards borrow the lock => nothing can move it while it's locked,
//! and the [crate::context::BenchContext] keeps the whole lock set behind a single `Box`.
//!
//! Unlike `std::sync::Mutex` they guard no data on their own. The counter lives elsewhere and
//! the guard is only a proof that the critical section is entered.
//!
//! ## Cache lines
//! A lock that shares a cache line with other written data gets its line invalidated on every unrelated write.
//! [CacheAligned] pins a value to its own 64-byte line, that's the experimental variable of the `_aligned` strategies.

mod mutex;
mod rwlock;

use std::ops::{Deref, DerefMut};

pub use mutex::{Mutex, MutexGuard};
pub use rwlock::{RwLock, WriteGuard};

pub const CACHE_LINE_SIZE: usize = 64;

/// Starts the value at a cache line boundary and pads it up to a whole line.
/// The literal in `align` has to match [CACHE_LINE_SIZE], attributes don't take constants.
#[repr(C, align(64))]
#[derive(Debug, Default)]
pub struct CacheAligned<Y>(pub Y);

impl<Y> Deref for CacheAligned<Y> {
    type Target = Y;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<Y> DerefMut for CacheAligned<Y> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

/// size of the native mutex object in bytes, printed before the suite
pub fn mutex_size() -> usize {
    std::mem::size_of::<libc::pthread_mutex_t>()
}

/// size of the native read-write lock object in bytes
pub fn rwlock_size() -> usize {
    std::mem::size_of::<libc::pthread_rwlock_t>()
}

#[cfg(test)]
mod test {
    use std::mem::{align_of, size_of};

    use super::*;

    #[test]
    fn test_cache_aligned_layout() {
        assert_eq!(align_of::<CacheAligned<u64>>(), CACHE_LINE_SIZE);
        assert_eq!(size_of::<CacheAligned<u64>>(), CACHE_LINE_SIZE);
        assert_eq!(align_of::<CacheAligned<Mutex>>(), CACHE_LINE_SIZE);
        assert_eq!(size_of::<CacheAligned<Mutex>>() % CACHE_LINE_SIZE, 0);

        let pair = [CacheAligned(1u8), CacheAligned(2u8)];
        let a = &pair[0] as *const _ as usize;
        let b = &pair[1] as *const _ as usize;
        assert_eq!(a % CACHE_LINE_SIZE, 0);
        assert_eq!(b - a, CACHE_LINE_SIZE);
        assert_eq!(*pair[1], 2);
    }

    #[test]
    fn test_native_sizes() {
        assert!(mutex_size() > 0);
        assert!(rwlock_size() > 0);
        // the wrappers add nothing to the native object
        assert_eq!(size_of::<Mutex>(), mutex_size());
        assert_eq!(size_of::<RwLock>(), rwlock_size());
    }
}

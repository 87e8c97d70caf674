use std::cell::UnsafeCell;

/// `pthread_rwlock_t` with the default attributes.
///
/// It allows N readers or 1 writer, but the benchmark never reads => there's only the write side.
/// Double write-locking from one thread deadlocks, the guard keeps that from happening by accident.
pub struct RwLock {
    raw: UnsafeCell<libc::pthread_rwlock_t>,
}

/// SAFETY: the pthread functions synchronize all access to the inner object
unsafe impl Send for RwLock {}
unsafe impl Sync for RwLock {}

impl RwLock {
    pub const fn new() -> Self {
        Self {
            raw: UnsafeCell::new(libc::PTHREAD_RWLOCK_INITIALIZER),
        }
    }

    /// exclusive lock, released when the guard drops
    #[inline]
    pub fn write(&self) -> WriteGuard<'_> {
        // SAFETY: raw is initialized and doesn't move while borrowed
        let err = unsafe { libc::pthread_rwlock_wrlock(self.raw.get()) };
        debug_assert_eq!(err, 0, "pthread_rwlock_wrlock");
        WriteGuard { lock: self }
    }
}

impl Default for RwLock {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for RwLock {
    fn drop(&mut self) {
        // SAFETY: exclusive access and no guard alive
        unsafe { libc::pthread_rwlock_destroy(self.raw.get_mut()) };
    }
}

pub struct WriteGuard<'a> {
    lock: &'a RwLock,
}

impl Drop for WriteGuard<'_> {
    #[inline]
    fn drop(&mut self) {
        // SAFETY: the guard exists only while this thread holds the write lock
        let err = unsafe { libc::pthread_rwlock_unlock(self.lock.raw.get()) };
        debug_assert_eq!(err, 0, "pthread_rwlock_unlock");
    }
}

#[cfg(test)]
mod test {
    use std::cell::UnsafeCell;
    use std::thread::scope;

    use super::*;

    struct Unprotected(UnsafeCell<Vec<usize>>);
    unsafe impl Sync for Unprotected {}

    #[test]
    fn test_writers_exclude_each_other() {
        let lock = RwLock::new();
        let log = Unprotected(UnsafeCell::new(Vec::new()));

        scope(|s| {
            for t in 0..3 {
                let (lock, log) = (&lock, &log);
                s.spawn(move || {
                    for _ in 0..500 {
                        let _g = lock.write();
                        // SAFETY: writers are serialized by the guard
                        unsafe { (*log.0.get()).push(t) };
                    }
                });
            }
        });

        let log = log.0.into_inner();
        assert_eq!(log.len(), 1500);
        for t in 0..3 {
            assert_eq!(log.iter().filter(|&&x| x == t).count(), 500);
        }
    }
}

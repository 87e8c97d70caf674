use std::cell::UnsafeCell;

/// `pthread_mutex_t` with the default attributes.
/// Relocking from the owning thread is undefined for the default kind => only [Mutex::lock] through a guard.
pub struct Mutex {
    raw: UnsafeCell<libc::pthread_mutex_t>,
}

/// SAFETY: the pthread functions synchronize all access to the inner object
unsafe impl Send for Mutex {}
unsafe impl Sync for Mutex {}

impl Mutex {
    pub const fn new() -> Self {
        Self {
            raw: UnsafeCell::new(libc::PTHREAD_MUTEX_INITIALIZER),
        }
    }

    /// Blocks until the mutex is ours; the guard unlocks it on drop.
    /// The return code isn't checked in release builds, locking an initialized default mutex can't fail.
    #[inline]
    pub fn lock(&self) -> MutexGuard<'_> {
        // SAFETY: raw is initialized and doesn't move while borrowed
        let err = unsafe { libc::pthread_mutex_lock(self.raw.get()) };
        debug_assert_eq!(err, 0, "pthread_mutex_lock");
        MutexGuard { mutex: self }
    }
}

impl Default for Mutex {
    fn default() -> Self {
        Self::new()
    }
}

/// Destroying a locked mutex is UB, but a guard borrows the mutex => it's always unlocked here.
impl Drop for Mutex {
    fn drop(&mut self) {
        // SAFETY: exclusive access and no guard alive
        unsafe { libc::pthread_mutex_destroy(self.raw.get_mut()) };
    }
}

pub struct MutexGuard<'a> {
    mutex: &'a Mutex,
}

impl Drop for MutexGuard<'_> {
    #[inline]
    fn drop(&mut self) {
        // SAFETY: the guard exists only while this thread holds the lock
        let err = unsafe { libc::pthread_mutex_unlock(self.mutex.raw.get()) };
        debug_assert_eq!(err, 0, "pthread_mutex_unlock");
    }
}

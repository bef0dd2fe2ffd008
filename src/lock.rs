//! Mutual exclusion used to guard signal state.
//!
//! A [`Lock`] is injected into every [`SignalValue`](crate::SignalValue) so the
//! real mutex can be swapped for [`MockLock`] when verifying that each operation
//! enters its critical section.

use parking_lot::{Condvar, Mutex};
use std::any::Any;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};

/// A lock with explicit `lock`/`unlock` calls.
///
/// Every `lock()` must be paired with one `unlock()`; use [`LockGuard`] rather
/// than calling them by hand.
pub trait Lock: Send + Sync + fmt::Debug + 'static {
    /// Block until the lock is acquired.
    fn lock(&self);

    /// Release the lock.
    fn unlock(&self);

    /// Access the concrete lock type, mainly for tests.
    fn as_any(&self) -> &dyn Any;
}

/// The default lock, a binary lock built on a `parking_lot` mutex and condvar.
///
/// It is not tied to a thread and not re-entrant: locking twice from the
/// same thread blocks.
#[derive(Default)]
pub struct MutexLock {
    locked: Mutex<bool>,
    released: Condvar,
}

impl MutexLock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_locked(&self) -> bool {
        *self.locked.lock()
    }
}

impl fmt::Debug for MutexLock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MutexLock")
            .field("locked", &self.is_locked())
            .finish()
    }
}

impl Lock for MutexLock {
    fn lock(&self) {
        let mut locked = self.locked.lock();
        while *locked {
            self.released.wait(&mut locked);
        }
        *locked = true;
    }

    fn unlock(&self) {
        let mut locked = self.locked.lock();
        if !*locked {
            tracing::warn!("unlock called on a lock that is not held");
            return;
        }
        *locked = false;
        self.released.notify_one();
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// A lock that records how often it was taken and released.
///
/// It still excludes for real, so it can be used anywhere a [`MutexLock`] can.
#[derive(Default)]
pub struct MockLock {
    inner: MutexLock,
    locks: AtomicUsize,
    unlocks: AtomicUsize,
}

impl MockLock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lock_called(&self) -> bool {
        self.lock_count() > 0
    }

    pub fn unlock_called(&self) -> bool {
        self.unlock_count() > 0
    }

    pub fn lock_count(&self) -> usize {
        self.locks.load(Ordering::SeqCst)
    }

    pub fn unlock_count(&self) -> usize {
        self.unlocks.load(Ordering::SeqCst)
    }

    /// Clear both counters.
    pub fn reset(&self) {
        self.locks.store(0, Ordering::SeqCst);
        self.unlocks.store(0, Ordering::SeqCst);
    }
}

impl fmt::Debug for MockLock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MockLock")
            .field("locks", &self.lock_count())
            .field("unlocks", &self.unlock_count())
            .finish()
    }
}

impl Lock for MockLock {
    fn lock(&self) {
        self.inner.lock();
        self.locks.fetch_add(1, Ordering::SeqCst);
    }

    fn unlock(&self) {
        self.unlocks.fetch_add(1, Ordering::SeqCst);
        self.inner.unlock();
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Scoped acquisition of a [`Lock`]. The lock is released when the guard is
/// dropped, including while unwinding.
#[must_use = "the lock is released as soon as the guard is dropped"]
pub struct LockGuard<'a> {
    lock: &'a dyn Lock,
}

impl<'a> LockGuard<'a> {
    pub fn acquire(lock: &'a dyn Lock) -> Self {
        lock.lock();
        Self { lock }
    }
}

impl Drop for LockGuard<'_> {
    fn drop(&mut self) {
        self.lock.unlock();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::panic::{catch_unwind, AssertUnwindSafe};
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_guard_pairs_lock_and_unlock() {
        let lock = MockLock::new();
        {
            let _guard = LockGuard::acquire(&lock);
            assert_eq!(lock.lock_count(), 1);
            assert_eq!(lock.unlock_count(), 0);
        }
        assert_eq!(lock.unlock_count(), 1);
    }

    #[test]
    fn test_guard_unlocks_on_panic() {
        let lock = MockLock::new();
        let result = catch_unwind(AssertUnwindSafe(|| {
            let _guard = LockGuard::acquire(&lock);
            panic!("boom");
        }));
        assert!(result.is_err());
        assert_eq!(lock.lock_count(), 1);
        assert_eq!(lock.unlock_count(), 1);

        // Still usable afterwards.
        drop(LockGuard::acquire(&lock));
        assert_eq!(lock.lock_count(), 2);
    }

    #[test]
    fn test_mock_lock_reset() {
        let lock = MockLock::new();
        drop(LockGuard::acquire(&lock));
        assert!(lock.lock_called());
        assert!(lock.unlock_called());
        lock.reset();
        assert!(!lock.lock_called());
        assert!(!lock.unlock_called());
    }

    #[test]
    fn test_mutex_lock_excludes() {
        let lock = Arc::new(MutexLock::new());
        let counter = Arc::new(AtomicUsize::new(0));
        let max_inside = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let lock = lock.clone();
                let counter = counter.clone();
                let max_inside = max_inside.clone();
                thread::spawn(move || {
                    for _ in 0..500 {
                        let _guard = LockGuard::acquire(&*lock);
                        let inside = counter.fetch_add(1, Ordering::SeqCst) + 1;
                        max_inside.fetch_max(inside, Ordering::SeqCst);
                        counter.fetch_sub(1, Ordering::SeqCst);
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(max_inside.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_as_any_downcast() {
        let lock: Arc<dyn Lock> = Arc::new(MutexLock::new());
        assert!(lock.as_any().is::<MutexLock>());
        assert!(!lock.as_any().is::<MockLock>());
    }

    #[test]
    fn test_unlock_without_lock_is_harmless() {
        let lock = MutexLock::new();
        lock.unlock();
        assert!(!lock.is_locked());
        drop(LockGuard::acquire(&lock));
        assert!(!lock.is_locked());
    }

    #[test]
    fn test_mutex_lock_released_from_another_thread() {
        let lock = Arc::new(MutexLock::new());
        lock.lock();
        let releaser = lock.clone();
        thread::spawn(move || releaser.unlock()).join().unwrap();
        drop(LockGuard::acquire(&*lock));
        assert!(!lock.is_locked());
    }
}

//! Lock-guarded storage for signal state and observers.
//!
//! Observers live in a slot map with generational keys, so a disposed
//! observer's token can never remove a newer observer that reuses its slot.

use crate::lock::{Lock, LockGuard};
use parking_lot::Mutex;
use slotmap::{new_key_type, SlotMap};
use std::sync::Arc;

new_key_type! {
    /// Token identifying a registered observer.
    pub struct ObserverId;
}

/// Observer callback for signal values.
pub(crate) type Observer<T> = Arc<dyn Fn(&T) + Send + Sync + 'static>;

/// Registered observers of one signal.
pub(crate) struct ObserverSet<T> {
    observers: SlotMap<ObserverId, Observer<T>>,
}

impl<T> ObserverSet<T> {
    pub fn new() -> Self {
        Self {
            observers: SlotMap::with_key(),
        }
    }

    pub fn insert(&mut self, observer: Observer<T>) -> ObserverId {
        self.observers.insert(observer)
    }

    /// Remove an observer. Stale tokens are ignored.
    pub fn remove(&mut self, id: ObserverId) -> bool {
        self.observers.remove(id).is_some()
    }

    /// Clone out the current observers so they can be called without the lock.
    pub fn snapshot(&self) -> Vec<Observer<T>> {
        self.observers.values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.observers.len()
    }
}

/// State that may only be touched while its [`Lock`] is held.
///
/// The injected lock defines the critical section. The inner mutex is never
/// contended behind a well-behaved lock.
pub(crate) struct Guarded<S> {
    lock: Arc<dyn Lock>,
    state: Mutex<S>,
}

impl<S> Guarded<S> {
    pub fn new(state: S, lock: Arc<dyn Lock>) -> Self {
        Self {
            lock,
            state: Mutex::new(state),
        }
    }

    pub fn lock(&self) -> &dyn Lock {
        &*self.lock
    }

    /// Run `f` with exclusive access to the state.
    ///
    /// `f` must not call back into this `Guarded`; user callbacks belong
    /// outside of it.
    pub fn with<R>(&self, f: impl FnOnce(&mut S) -> R) -> R {
        let _guard = LockGuard::acquire(&*self.lock);
        f(&mut self.state.lock())
    }
}

/// Notify observers outside of any lock.
pub(crate) fn notify_observers<T>(observers: Vec<Observer<T>>, value: &T) {
    for observer in observers {
        observer(value);
    }
}

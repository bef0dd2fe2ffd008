//! Core signal types.
//!
//! [`SignalValue`] is a stateful, readable and writable cell that replays its
//! current value to new observers. [`Signal`] is a stateless stream that only
//! forwards values sent after an observer registers.

use crate::disposable::Disposable;
use crate::lock::{Lock, MutexLock};
use crate::observable::Observable;
use crate::storage::{notify_observers, Guarded, Observer, ObserverSet};
use std::fmt;
use std::sync::{Arc, Weak};

struct ValueState<T> {
    value: T,
    observers: ObserverSet<T>,
}

/// A thread-safe value that notifies observers whenever it changes.
///
/// `SignalValue` is a cheap handle: clones share the same value and observers.
/// Every operation takes the injected [`Lock`] exactly once, and observers are
/// always called after the lock has been released, so an observer may freely
/// read, send to, or subscribe to the signal that is notifying it.
///
/// # Examples
///
/// ```rust,no_run
/// use signal_kit::prelude::*;
///
/// let bag = DisposableBag::new();
/// let name = SignalValue::new(String::from("John"));
///
/// name.next(|name| println!("hello {name}")).dispose_with(&bag);
/// name.send(String::from("Jane"));
/// ```
pub struct SignalValue<T> {
    inner: Arc<Guarded<ValueState<T>>>,
}

/// Non-owning handle to a [`SignalValue`].
pub struct WeakSignalValue<T> {
    inner: Weak<Guarded<ValueState<T>>>,
}

impl<T> Clone for SignalValue<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T> Clone for WeakSignalValue<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T> PartialEq for SignalValue<T> {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl<T> Eq for SignalValue<T> {}

impl<T: Clone + Send + 'static> SignalValue<T> {
    /// Create a signal guarded by a [`MutexLock`].
    pub fn new(value: T) -> Self {
        Self::with_lock(value, Arc::new(MutexLock::new()))
    }

    /// Create a signal guarded by a real mutex. Same as [`SignalValue::new`],
    /// spelled out for call sites that rely on thread safety.
    pub fn atomic(value: T) -> Self {
        Self::new(value)
    }

    /// Create a signal guarded by `lock`.
    pub fn with_lock(value: T, lock: Arc<dyn Lock>) -> Self {
        let state = ValueState {
            value,
            observers: ObserverSet::new(),
        };
        Self {
            inner: Arc::new(Guarded::new(state, lock)),
        }
    }

    /// Get a clone of the current value.
    pub fn value(&self) -> T {
        self.inner.with(|state| state.value.clone())
    }

    /// Replace the value and notify observers.
    pub fn set_value(&self, value: T) {
        self.send(value);
    }

    /// Read the value with a closure.
    ///
    /// The lock is held while `f` runs, so `f` must not use this signal.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        self.inner.with(|state| f(&state.value))
    }

    /// Update the value in place and notify observers.
    pub fn update(&self, f: impl FnOnce(&mut T)) {
        let (value, observers) = self.inner.with(|state| {
            f(&mut state.value);
            (state.value.clone(), state.observers.snapshot())
        });
        notify_observers(observers, &value);
    }

    /// Set the value only if it differs from the current one.
    ///
    /// Returns true if the value was updated.
    pub fn set_if_changed(&self, value: T) -> bool
    where
        T: PartialEq,
    {
        let observers = self.inner.with(|state| {
            if state.value == value {
                None
            } else {
                state.value = value.clone();
                Some(state.observers.snapshot())
            }
        });
        match observers {
            Some(observers) => {
                notify_observers(observers, &value);
                true
            }
            None => false,
        }
    }

    /// The lock guarding this signal.
    pub fn raw_lock(&self) -> &dyn Lock {
        self.inner.lock()
    }

    pub fn observer_count(&self) -> usize {
        self.inner.with(|state| state.observers.len())
    }
}

impl SignalValue<bool> {
    /// Toggle the boolean value of the signal.
    pub fn toggle(&self) {
        self.update(|value| *value = !*value);
    }
}

impl<T: Clone + Send + 'static> Observable for SignalValue<T> {
    type Value = T;
    type Weak = WeakSignalValue<T>;

    fn add_observer<F>(&self, observer: F) -> Disposable
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        let observer: Observer<T> = Arc::new(observer);
        let (id, current) = self.inner.with(|state| {
            (state.observers.insert(observer.clone()), state.value.clone())
        });
        tracing::trace!(?id, "observer added");

        observer(&current);

        let weak = Arc::downgrade(&self.inner);
        Disposable::new(move || {
            if let Some(inner) = weak.upgrade() {
                if inner.with(|state| state.observers.remove(id)) {
                    tracing::trace!(?id, "observer removed");
                }
            }
        })
    }

    fn send(&self, value: T) {
        let observers = self.inner.with(|state| {
            state.value = value.clone();
            state.observers.snapshot()
        });
        tracing::trace!(observers = observers.len(), "sending value");
        notify_observers(observers, &value);
    }

    fn downgrade(&self) -> WeakSignalValue<T> {
        WeakSignalValue {
            inner: Arc::downgrade(&self.inner),
        }
    }

    fn upgrade(weak: &WeakSignalValue<T>) -> Option<Self> {
        weak.inner.upgrade().map(|inner| Self { inner })
    }
}

impl<T: Clone + Send + Default + 'static> Default for SignalValue<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: Clone + Send + fmt::Debug + 'static> fmt::Debug for SignalValue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.with(|value| f.debug_struct("SignalValue").field("value", value).finish())
    }
}

impl<T: Clone + Send + std::ops::AddAssign<T> + 'static> std::ops::AddAssign<T>
    for SignalValue<T>
{
    fn add_assign(&mut self, rhs: T) {
        self.update(|v| *v += rhs);
    }
}

impl<T: Clone + Send + std::ops::SubAssign<T> + 'static> std::ops::SubAssign<T>
    for SignalValue<T>
{
    fn sub_assign(&mut self, rhs: T) {
        self.update(|v| *v -= rhs);
    }
}

/// A stateless stream of values.
///
/// Unlike [`SignalValue`], observers only see values sent after they were
/// added. UI event sources feed these.
pub struct Signal<T> {
    inner: Arc<Guarded<ObserverSet<T>>>,
}

/// Non-owning handle to a [`Signal`].
pub struct WeakSignal<T> {
    inner: Weak<Guarded<ObserverSet<T>>>,
}

impl<T> Clone for Signal<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T> Clone for WeakSignal<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T> PartialEq for Signal<T> {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl<T> Eq for Signal<T> {}

impl<T: Clone + Send + 'static> Signal<T> {
    pub fn new() -> Self {
        Self::with_lock(Arc::new(MutexLock::new()))
    }

    pub fn with_lock(lock: Arc<dyn Lock>) -> Self {
        Self {
            inner: Arc::new(Guarded::new(ObserverSet::new(), lock)),
        }
    }

    pub fn observer_count(&self) -> usize {
        self.inner.with(|observers| observers.len())
    }
}

impl<T: Clone + Send + 'static> Default for Signal<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for Signal<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signal").finish_non_exhaustive()
    }
}

impl<T: Clone + Send + 'static> Observable for Signal<T> {
    type Value = T;
    type Weak = WeakSignal<T>;

    fn add_observer<F>(&self, observer: F) -> Disposable
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        let id = self.inner.with(|observers| observers.insert(Arc::new(observer)));
        tracing::trace!(?id, "observer added");

        let weak = Arc::downgrade(&self.inner);
        Disposable::new(move || {
            if let Some(inner) = weak.upgrade() {
                if inner.with(|observers| observers.remove(id)) {
                    tracing::trace!(?id, "observer removed");
                }
            }
        })
    }

    fn send(&self, value: T) {
        let observers = self.inner.with(|observers| observers.snapshot());
        tracing::trace!(observers = observers.len(), "sending value");
        notify_observers(observers, &value);
    }

    fn downgrade(&self) -> WeakSignal<T> {
        WeakSignal {
            inner: Arc::downgrade(&self.inner),
        }
    }

    fn upgrade(weak: &WeakSignal<T>) -> Option<Self> {
        weak.inner.upgrade().map(|inner| Self { inner })
    }
}

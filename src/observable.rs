//! The push-based stream contract shared by all signal types.

use crate::disposable::Disposable;
use crate::scheduler::{Scheduler, SchedulerQueue};

/// A source of values that observers can subscribe to.
pub trait Observable: Sized + Send + Sync + 'static {
    type Value: Clone + Send + 'static;

    /// Non-owning handle used by deferred work.
    type Weak: Send + 'static;

    /// Register `observer` for future values. Stateful observables also call it
    /// once with the current value before returning.
    ///
    /// Dropping the returned [`Disposable`] keeps the observer registered.
    fn add_observer<F>(&self, observer: F) -> Disposable
    where
        F: Fn(&Self::Value) + Send + Sync + 'static;

    /// Deliver `value` synchronously to every registered observer.
    fn send(&self, value: Self::Value);

    fn downgrade(&self) -> Self::Weak;

    fn upgrade(weak: &Self::Weak) -> Option<Self>;

    /// Same as [`add_observer`](Self::add_observer), for call chains such as
    /// `signal.next(..).dispose_with(&bag)`.
    fn next<F>(&self, observer: F) -> Disposable
    where
        F: Fn(&Self::Value) + Send + Sync + 'static,
    {
        self.add_observer(observer)
    }

    /// Send `value` later, on `queue`.
    ///
    /// The scheduled work holds only a weak handle. If the observable is gone
    /// by the time it runs, nothing happens.
    fn send_on(&self, value: Self::Value, queue: &SchedulerQueue) {
        let weak = self.downgrade();
        Scheduler::new(queue.clone()).dispatch_async(move || match Self::upgrade(&weak) {
            Some(observable) => observable.send(value),
            None => tracing::trace!("observable dropped before scheduled send"),
        });
    }
}

//! Cancellable subscriptions and bags that tear them down together.

use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;

type DisposeAction = Box<dyn FnOnce() + Send + 'static>;

/// A handle to a cancellable registration.
///
/// Clones share the same teardown action, which runs at most once no matter
/// how many clones call [`dispose`](Self::dispose). Dropping a `Disposable`
/// does not dispose it.
#[derive(Clone)]
pub struct Disposable {
    action: Arc<Mutex<Option<DisposeAction>>>,
}

impl Disposable {
    /// Create a disposable that runs `action` on first disposal.
    pub fn new(action: impl FnOnce() + Send + 'static) -> Self {
        Self {
            action: Arc::new(Mutex::new(Some(Box::new(action)))),
        }
    }

    /// A disposable with nothing to release.
    pub fn empty() -> Self {
        Self {
            action: Arc::new(Mutex::new(None)),
        }
    }

    /// Release the registration. Subsequent calls do nothing.
    pub fn dispose(&self) {
        // Take the action first so it runs without our mutex held.
        let action = self.action.lock().take();
        if let Some(action) = action {
            action();
        }
    }

    pub fn is_disposed(&self) -> bool {
        self.action.lock().is_none()
    }

    /// Hand this disposable to `bag`, returning a clone for further chaining.
    pub fn dispose_with(self, bag: &DisposableBag) -> Disposable {
        bag.add(self)
    }
}

impl fmt::Debug for Disposable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Disposable")
            .field("disposed", &self.is_disposed())
            .finish()
    }
}

/// Owns a set of disposables and disposes them together, either explicitly
/// or when the bag is dropped.
#[derive(Default)]
pub struct DisposableBag {
    members: Mutex<Vec<Disposable>>,
}

impl DisposableBag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a disposable to the bag, returning it for chaining.
    pub fn add(&self, disposable: Disposable) -> Disposable {
        self.members.lock().push(disposable.clone());
        disposable
    }

    /// Dispose every member once and empty the bag.
    pub fn dispose(&self) {
        let members = std::mem::take(&mut *self.members.lock());
        if !members.is_empty() {
            tracing::debug!(count = members.len(), "disposing bag");
        }
        for member in members {
            member.dispose();
        }
    }

    pub fn len(&self) -> usize {
        self.members.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.lock().is_empty()
    }
}

impl Drop for DisposableBag {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl fmt::Debug for DisposableBag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DisposableBag")
            .field("len", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counting() -> (Disposable, Arc<AtomicUsize>) {
        let count = Arc::new(AtomicUsize::new(0));
        let count_clone = count.clone();
        let disposable = Disposable::new(move || {
            count_clone.fetch_add(1, Ordering::SeqCst);
        });
        (disposable, count)
    }

    #[test]
    fn test_dispose_is_idempotent() {
        let (disposable, count) = counting();
        assert!(!disposable.is_disposed());
        disposable.dispose();
        disposable.dispose();
        assert!(disposable.is_disposed());
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_clones_share_action() {
        let (disposable, count) = counting();
        let clone = disposable.clone();
        clone.dispose();
        disposable.dispose();
        assert!(disposable.is_disposed());
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_drop_does_not_dispose() {
        let (disposable, count) = counting();
        drop(disposable);
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_empty_disposable() {
        let disposable = Disposable::empty();
        assert!(disposable.is_disposed());
        disposable.dispose();
    }

    #[test]
    fn test_dispose_from_inside_action() {
        let slot: Arc<Mutex<Option<Disposable>>> = Arc::new(Mutex::new(None));
        let slot_clone = slot.clone();
        let disposable = Disposable::new(move || {
            if let Some(me) = slot_clone.lock().as_ref() {
                me.dispose();
            }
        });
        *slot.lock() = Some(disposable.clone());
        disposable.dispose();
        assert!(disposable.is_disposed());
    }

    #[test]
    fn test_bag_disposes_members_once() {
        let bag = DisposableBag::new();
        let (first, first_count) = counting();
        let (second, second_count) = counting();
        let returned = first.dispose_with(&bag);
        bag.add(second);
        assert_eq!(bag.len(), 2);
        assert!(!returned.is_disposed());

        bag.dispose();
        bag.dispose();

        assert!(bag.is_empty());
        assert!(returned.is_disposed());
        assert_eq!(first_count.load(Ordering::SeqCst), 1);
        assert_eq!(second_count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_bag_disposes_on_drop() {
        let (disposable, count) = counting();
        {
            let bag = DisposableBag::new();
            bag.add(disposable);
        }
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_member_disposed_early_is_not_disposed_again() {
        let bag = DisposableBag::new();
        let (disposable, count) = counting();
        let handle = bag.add(disposable);
        handle.dispose();
        bag.dispose();
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }
}

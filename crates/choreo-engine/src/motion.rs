//! Reduced-motion preference.
//!
//! A single boolean snapshot of the user's preference plus an explicit
//! observer list. The host pushes platform changes in through
//! [`MotionPolicy::set_preference`]; every component reads the snapshot at the
//! moment it executes, never only at registration.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

/// Handle returned by [`MotionPolicy::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Observer = Rc<dyn Fn(bool)>;

/// Process-scoped motion preference with change notification.
pub struct MotionPolicy {
    reduced: Cell<bool>,
    observers: RefCell<Vec<(SubscriptionId, Observer)>>,
    next_subscription: Cell<u64>,
}

impl MotionPolicy {
    pub fn new(prefers_reduced_motion: bool) -> Self {
        Self {
            reduced: Cell::new(prefers_reduced_motion),
            observers: RefCell::new(Vec::new()),
            next_subscription: Cell::new(1),
        }
    }

    /// Current snapshot of the preference.
    pub fn prefers_reduced_motion(&self) -> bool {
        self.reduced.get()
    }

    /// Update the preference. Observers are notified only when the value
    /// actually changes. Returns whether it changed.
    pub fn set_preference(&self, reduced: bool) -> bool {
        if self.reduced.replace(reduced) == reduced {
            return false;
        }

        tracing::debug!(reduced, "motion preference changed");

        // Observers may subscribe or unsubscribe while being notified.
        let observers: Vec<Observer> = self
            .observers
            .borrow()
            .iter()
            .map(|(_, observer)| Rc::clone(observer))
            .collect();
        for observer in observers {
            observer(reduced);
        }
        true
    }

    /// Register a callback invoked with the new value on every change.
    pub fn subscribe(&self, observer: impl Fn(bool) + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription.get());
        self.next_subscription.set(id.0 + 1);
        self.observers.borrow_mut().push((id, Rc::new(observer)));
        id
    }

    /// Remove a callback. Returns false if it was not subscribed.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut observers = self.observers.borrow_mut();
        let before = observers.len();
        observers.retain(|(sub, _)| *sub != id);
        observers.len() != before
    }

    pub fn observer_count(&self) -> usize {
        self.observers.borrow().len()
    }
}

impl Default for MotionPolicy {
    fn default() -> Self {
        Self::new(false)
    }
}

impl fmt::Debug for MotionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MotionPolicy")
            .field("reduced", &self.reduced.get())
            .field("observers", &self.observer_count())
            .finish()
    }
}

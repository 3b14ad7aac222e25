//! Store - a versioned value cell with typed event subscriptions.
//!
//! # Example
//!
//! ```ignore
//! use spark_dom::{Store, EventKind};
//!
//! let count = Store::new(0);
//! let id = count.on(EventKind::Change, |event| {
//!     let spark_dom::StoreEvent::Change { value } = event;
//!     println!("count is now {value}");
//! });
//!
//! count.update(1);
//! count.update_with(|n| n + 1);
//! count.unsubscribe(EventKind::Change, id);
//! ```

use std::rc::{Rc, Weak};

use super::core::StoreCore;
use crate::types::{AnySubscription, Event, EventKind, EventKinds, StoreId, SubscriptionId};

/// Event emitted by [`Store`].
#[derive(Debug, Clone, PartialEq)]
pub enum StoreEvent<T> {
    /// The value was replaced.
    Change { value: T },
}

impl<T> Event for StoreEvent<T> {
    fn kind(&self) -> EventKind {
        EventKind::Change
    }
}

/// Observable value cell.
///
/// Cloning the handle shares the same store.
pub struct Store<T> {
    pub(crate) core: Rc<StoreCore<T, StoreEvent<T>>>,
}

impl<T> Clone for Store<T> {
    fn clone(&self) -> Self {
        Self {
            core: self.core.clone(),
        }
    }
}

impl<T: Default + 'static> Default for Store<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: 'static> Store<T> {
    /// Kinds a plain store ever emits.
    pub const EMITS: EventKinds = EventKinds::CHANGE;

    /// Create a store holding `value`.
    pub fn new(value: T) -> Self {
        Self {
            core: StoreCore::new(value),
        }
    }

    /// This store's identity token.
    pub fn id(&self) -> StoreId {
        self.core.id()
    }

    /// Whether `dispose()` has been called.
    pub fn is_disposed(&self) -> bool {
        !self.core.is_alive()
    }

    /// Read the value without cloning it.
    ///
    /// The store stays borrowed while `f` runs; mutating it from `f` panics.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.core.borrow())
    }

    /// Register `callback` for `kind`. Returns immediately with the id.
    pub fn on(&self, kind: EventKind, callback: impl Fn(&StoreEvent<T>) + 'static) -> SubscriptionId {
        self.core.on(kind, Rc::new(callback))
    }

    /// Register `callback` under every event kind (four registrations).
    pub fn any(&self, callback: impl Fn(&StoreEvent<T>) + 'static) -> AnySubscription {
        self.core.any(Rc::new(callback))
    }

    /// Remove a registration. No-op if absent.
    pub fn unsubscribe(&self, kind: EventKind, id: SubscriptionId) {
        self.core.unsubscribe(kind, id);
    }

    /// Remove all four registrations made by [`any`](Self::any).
    pub fn unsubscribe_any(&self, subscription: &AnySubscription) {
        self.core.unsubscribe_any(subscription);
    }

    /// Number of live subscribers for `kind`.
    pub fn subscriber_count(&self, kind: EventKind) -> usize {
        self.core.subscriber_count(kind)
    }

    /// Drop every subscriber and stop all further mutation. Idempotent.
    pub fn dispose(&self) {
        self.core.dispose();
    }

    /// A handle that does not keep the store alive.
    pub fn downgrade(&self) -> WeakStore<T> {
        WeakStore {
            core: Rc::downgrade(&self.core),
        }
    }
}

impl<T: Clone + 'static> Store<T> {
    /// Current value (cloned).
    pub fn get(&self) -> T {
        self.core.borrow().clone()
    }

    /// Replace the value and deliver a `change` event.
    pub fn update(&self, value: T) {
        self.core.mutate(|current| {
            *current = value;
            ((), Some(StoreEvent::Change { value: current.clone() }))
        });
    }

    /// Replace the value with `f(current)` and deliver a `change` event.
    ///
    /// `f` sees a copy of the value, so it may read the store freely.
    pub fn update_with(&self, f: impl FnOnce(&T) -> T) {
        let Some(current) = self.core.snapshot() else {
            return;
        };
        self.update(f(&current));
    }
}

/// Weak counterpart of [`Store`].
pub struct WeakStore<T> {
    core: Weak<StoreCore<T, StoreEvent<T>>>,
}

impl<T> Clone for WeakStore<T> {
    fn clone(&self) -> Self {
        Self {
            core: self.core.clone(),
        }
    }
}

impl<T> WeakStore<T> {
    /// The store, if any strong handle is still around.
    pub fn upgrade(&self) -> Option<Store<T>> {
        self.core.upgrade().map(|core| Store { core })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::{Cell, RefCell};

    #[test]
    fn test_update_delivers_change_in_order() {
        let store = Store::new(0);
        let log = Rc::new(RefCell::new(Vec::new()));

        let log_a = log.clone();
        store.on(EventKind::Change, move |StoreEvent::Change { value }| {
            log_a.borrow_mut().push(("a", *value));
        });
        let log_b = log.clone();
        store.on(EventKind::Change, move |StoreEvent::Change { value }| {
            log_b.borrow_mut().push(("b", *value));
        });

        store.update(5);
        assert_eq!(*log.borrow(), vec![("a", 5), ("b", 5)]);
    }

    #[test]
    fn test_update_with() {
        let store = Store::new(10);
        store.update_with(|n| n * 2);
        assert_eq!(store.get(), 20);
    }

    #[test]
    fn test_unsubscribe_stops_delivery() {
        let store = Store::new(0);
        let hits = Rc::new(RefCell::new(0));
        let hits_cb = hits.clone();
        let id = store.on(EventKind::Change, move |_| *hits_cb.borrow_mut() += 1);

        store.update(1);
        store.unsubscribe(EventKind::Change, id);
        store.unsubscribe(EventKind::Change, id);
        store.update(2);

        assert_eq!(*hits.borrow(), 1);
    }

    #[test]
    fn test_unsubscribe_during_delivery_skips_later_subscriber() {
        let store = Store::new(0);
        let log = Rc::new(RefCell::new(Vec::new()));
        let b_id = Rc::new(Cell::new(SubscriptionId::DETACHED));

        let (log_a, handle, b_slot) = (log.clone(), store.clone(), b_id.clone());
        store.on(EventKind::Change, move |_| {
            log_a.borrow_mut().push("a");
            handle.unsubscribe(EventKind::Change, b_slot.get());
        });
        let log_b = log.clone();
        b_id.set(store.on(EventKind::Change, move |_| log_b.borrow_mut().push("b")));

        store.update(1);
        assert_eq!(*log.borrow(), vec!["a"]);
    }

    #[test]
    fn test_subscribe_during_delivery_waits_for_next_event() {
        let store = Store::new(0);
        let hits = Rc::new(Cell::new(0));
        let (handle, hits_outer) = (store.clone(), hits.clone());
        store.on(EventKind::Change, move |_| {
            let hits_inner = hits_outer.clone();
            handle.on(EventKind::Change, move |_| hits_inner.set(hits_inner.get() + 1));
        });

        store.update(1);
        assert_eq!(hits.get(), 0);
        store.update(2);
        assert_eq!(hits.get(), 1);
    }

    #[test]
    fn test_update_with_may_read_store() {
        let store = Store::new(2);
        let reader = store.clone();
        store.update_with(|n| n + reader.get());
        assert_eq!(store.get(), 4);
    }

    #[test]
    fn test_any_registers_four_times() {
        let store = Store::new(0);
        let sub = store.any(|_| {});
        for kind in EventKind::ALL {
            assert_eq!(store.subscriber_count(kind), 1);
        }
        store.unsubscribe_any(&sub);
        for kind in EventKind::ALL {
            assert_eq!(store.subscriber_count(kind), 0);
        }
    }

    #[test]
    fn test_dispose_freezes_store() {
        let store = Store::new(String::from("before"));
        let hits = Rc::new(RefCell::new(0));
        let hits_cb = hits.clone();
        store.on(EventKind::Change, move |_| *hits_cb.borrow_mut() += 1);

        store.dispose();
        store.dispose();
        store.update("after".to_string());
        store.update_with(|s| format!("{s}!"));

        assert!(store.is_disposed());
        assert_eq!(store.get(), "before");
        assert_eq!(*hits.borrow(), 0);
        assert_eq!(store.subscriber_count(EventKind::Change), 0);
        assert_eq!(store.on(EventKind::Change, |_| {}), SubscriptionId::DETACHED);
        assert!(!store.id().is_live());
    }

    #[test]
    fn test_callback_can_read_store() {
        let store = Store::new(1);
        let seen = Rc::new(RefCell::new(0));
        let reader = store.clone();
        let seen_cb = seen.clone();
        store.on(EventKind::Change, move |_| *seen_cb.borrow_mut() = reader.get());

        store.update(7);
        assert_eq!(*seen.borrow(), 7);
    }

    #[test]
    fn test_weak_does_not_keep_alive() {
        let store = Store::new(3);
        let weak = store.downgrade();
        assert_eq!(weak.upgrade().map(|s| s.get()), Some(3));
        let id = store.id();
        drop(store);
        assert!(weak.upgrade().is_none());
        assert!(!id.is_live());
    }
}

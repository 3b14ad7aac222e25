//! Shared machinery behind every store flavor.
//!
//! A `StoreCore` owns the value, the subscriber table and the live flag.
//! Flavors wrap it in an `Rc` and add their own mutation primitives.
//!
//! Delivery snapshots the subscriber list before calling out, so callbacks
//! may read the store, subscribe, unsubscribe or even mutate it again
//! (reentrant mutation is the caller's problem, not a borrow panic).
//! A subscriber removed mid-pass is skipped for the rest of that pass;
//! one added mid-pass first hears the next event.

use std::cell::{Cell, Ref, RefCell};
use std::rc::Rc;

use super::subscribers::{Callback, Subscribers};
use crate::types::{AnySubscription, Event, EventKind, StoreId, SubscriptionId};

pub(crate) struct StoreCore<T, E> {
    id: StoreId,
    value: RefCell<T>,
    subscribers: RefCell<Subscribers<E>>,
    alive: Cell<bool>,
}

impl<T, E: Event> StoreCore<T, E> {
    pub(crate) fn new(value: T) -> Rc<Self> {
        Rc::new(Self {
            id: StoreId::allocate(),
            value: RefCell::new(value),
            subscribers: RefCell::new(Subscribers::new()),
            alive: Cell::new(true),
        })
    }

    pub(crate) fn id(&self) -> StoreId {
        self.id
    }

    pub(crate) fn is_alive(&self) -> bool {
        self.alive.get()
    }

    pub(crate) fn borrow(&self) -> Ref<'_, T> {
        self.value.borrow()
    }

    /// Clone of the value, or `None` once disposed. No borrow outlives the call.
    pub(crate) fn snapshot(&self) -> Option<T>
    where
        T: Clone,
    {
        self.is_alive().then(|| self.value.borrow().clone())
    }

    pub(crate) fn on(&self, kind: EventKind, callback: Callback<E>) -> SubscriptionId {
        if !self.is_alive() {
            return SubscriptionId::DETACHED;
        }
        self.subscribers.borrow_mut().add(kind, callback)
    }

    pub(crate) fn any(&self, callback: Callback<E>) -> AnySubscription {
        AnySubscription {
            append: self.on(EventKind::Append, callback.clone()),
            change: self.on(EventKind::Change, callback.clone()),
            clear: self.on(EventKind::Clear, callback.clone()),
            deletion: self.on(EventKind::Deletion, callback),
        }
    }

    pub(crate) fn unsubscribe(&self, kind: EventKind, id: SubscriptionId) {
        self.subscribers.borrow_mut().remove(kind, id);
    }

    pub(crate) fn unsubscribe_any(&self, subscription: &AnySubscription) {
        let mut subs = self.subscribers.borrow_mut();
        for kind in EventKind::ALL {
            subs.remove(kind, subscription.id_for(kind));
        }
    }

    pub(crate) fn subscriber_count(&self, kind: EventKind) -> usize {
        self.subscribers.borrow().count(kind)
    }

    /// Apply `mutate` to the value and deliver whatever event it returns.
    ///
    /// Returns `None` without touching anything when the store is disposed.
    /// `mutate` runs under the exclusive borrow, so it must not call back
    /// into user code; the value borrow is released before delivery.
    pub(crate) fn mutate<R>(&self, mutate: impl FnOnce(&mut T) -> (R, Option<E>)) -> Option<R> {
        if !self.is_alive() {
            return None;
        }
        let (result, event) = {
            let mut value = self.value.borrow_mut();
            mutate(&mut value)
        };
        if let Some(event) = event {
            self.emit(&event);
        }
        Some(result)
    }

    /// Deliver `event` to every subscriber of its kind, in order.
    pub(crate) fn emit(&self, event: &E) {
        if !self.is_alive() {
            return;
        }
        let kind = event.kind();
        let entries = self.subscribers.borrow().snapshot(kind);
        for (id, callback) in entries {
            // A callback earlier in this pass may have disposed the store.
            if !self.is_alive() {
                break;
            }
            if !self.subscribers.borrow().contains(kind, id) {
                continue;
            }
            callback(event);
        }
    }

    pub(crate) fn dispose(&self) {
        if !self.alive.replace(false) {
            return;
        }
        self.subscribers.borrow_mut().clear();
        self.id.release();
        tracing::debug!(store = %self.id, "store disposed");
    }
}

impl<T, E> Drop for StoreCore<T, E> {
    fn drop(&mut self) {
        if self.alive.get() {
            self.id.release();
        }
    }
}

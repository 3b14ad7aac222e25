//! Dependency seam between stores and the element builder.
//!
//! The builder does not know store flavors. It sees a [`Dependency`]:
//! something it can watch (through `any()`) and read a type-erased
//! snapshot from. Builders keep only the weak [`DependencyRef`] half, so a
//! bound node never keeps an otherwise-dropped store alive.

use std::any::Any;
use std::rc::Rc;

use super::list::{ListStore, WeakListStore};
use super::map::{MapStore, WeakMapStore};
use super::value::{Store, WeakStore};
use crate::types::{AnySubscription, Event, EventKind, StoreId};

/// Callback handed to [`Dependency::watch`]: event kind plus a type-erased
/// copy of the event (`StoreEvent<T>`, `ListEvent<T>` or `MapEvent<T>`).
pub type WatchFn = Rc<dyn Fn(EventKind, Rc<dyn Any>)>;

/// A store a builder can depend on.
pub trait Dependency {
    fn store_id(&self) -> StoreId;

    /// Subscribe `on_event` to every event kind.
    fn watch(&self, on_event: WatchFn) -> AnySubscription;

    /// Weak handle used for snapshots and unsubscribing.
    fn weak(&self) -> Box<dyn DependencyRef>;
}

/// Weak half of a [`Dependency`].
pub trait DependencyRef {
    /// Current value, type-erased: `T`, `Vec<T>` or `IndexMap<String, T>`.
    /// `None` once the store has been dropped.
    fn snapshot(&self) -> Option<Rc<dyn Any>>;

    /// [`Dependency::watch`] through the weak handle; `None` once dropped.
    fn watch(&self, on_event: WatchFn) -> Option<AnySubscription>;

    fn unwatch(&self, subscription: &AnySubscription);
}

fn erase<E: Event + Clone + 'static>(on_event: WatchFn) -> impl Fn(&E) + 'static {
    move |event: &E| on_event(event.kind(), Rc::new(event.clone()))
}

macro_rules! impl_dependency {
    ($store:ident, $weak:ident) => {
        impl<T: Clone + 'static> Dependency for $store<T> {
            fn store_id(&self) -> StoreId {
                self.id()
            }

            fn watch(&self, on_event: WatchFn) -> AnySubscription {
                self.any(erase(on_event))
            }

            fn weak(&self) -> Box<dyn DependencyRef> {
                Box::new(self.downgrade())
            }
        }

        impl<T: Clone + 'static> DependencyRef for $weak<T> {
            fn snapshot(&self) -> Option<Rc<dyn Any>> {
                self.upgrade().map(|store| Rc::new(store.values_for_render()) as Rc<dyn Any>)
            }

            fn watch(&self, on_event: WatchFn) -> Option<AnySubscription> {
                self.upgrade().map(|store| Dependency::watch(&store, on_event))
            }

            fn unwatch(&self, subscription: &AnySubscription) {
                if let Some(store) = self.upgrade() {
                    store.unsubscribe_any(subscription);
                }
            }
        }
    };
}

impl_dependency!(Store, WeakStore);
impl_dependency!(ListStore, WeakListStore);
impl_dependency!(MapStore, WeakMapStore);

// Uniform name for "the whole current value" across flavors.
trait RenderValue {
    type Value: 'static;
    fn values_for_render(&self) -> Self::Value;
}

impl<T: Clone + 'static> RenderValue for Store<T> {
    type Value = T;
    fn values_for_render(&self) -> T {
        self.get()
    }
}

impl<T: Clone + 'static> RenderValue for ListStore<T> {
    type Value = Vec<T>;
    fn values_for_render(&self) -> Vec<T> {
        self.values()
    }
}

impl<T: Clone + 'static> RenderValue for MapStore<T> {
    type Value = indexmap::IndexMap<String, T>;
    fn values_for_render(&self) -> Self::Value {
        self.values()
    }
}

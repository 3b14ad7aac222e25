//! ListStore - an ordered, index-addressed store with granular events.
//!
//! Indices are `isize`. `get`/`set` are strict about `[0, len)`, while a
//! negative index passed to `remove` is a silent no-op so a "not found"
//! result from [`ListStore::find_index`] can be fed straight in:
//!
//! ```ignore
//! let todos = ListStore::new(vec!["a", "b", "c"]);
//! todos.remove(todos.find_index(|t| *t == "zzz"))?; // nothing happens
//! todos.remove(todos.find_index(|t| *t == "b"))?;   // deletion event for idx 1
//! ```

use std::rc::{Rc, Weak};

use super::core::StoreCore;
use crate::error::{Error, Result};
use crate::types::{AnySubscription, Event, EventKind, EventKinds, StoreId, SubscriptionId};

/// Event emitted by [`ListStore`].
#[derive(Debug, Clone, PartialEq)]
pub enum ListEvent<T> {
    /// The whole sequence was replaced through `update`.
    Reset { values: Vec<T> },
    /// One element was overwritten through `set`.
    Change { index: usize, value: T },
    /// One element was removed.
    Deletion { index: usize, value: T },
    /// The sequence was emptied.
    Clear,
    /// One element was pushed.
    Append { index: usize, value: T },
}

impl<T> Event for ListEvent<T> {
    fn kind(&self) -> EventKind {
        match self {
            ListEvent::Reset { .. } | ListEvent::Change { .. } => EventKind::Change,
            ListEvent::Deletion { .. } => EventKind::Deletion,
            ListEvent::Clear => EventKind::Clear,
            ListEvent::Append { .. } => EventKind::Append,
        }
    }
}

/// Observable sequence.
pub struct ListStore<T> {
    pub(crate) core: Rc<StoreCore<Vec<T>, ListEvent<T>>>,
}

impl<T> Clone for ListStore<T> {
    fn clone(&self) -> Self {
        Self {
            core: self.core.clone(),
        }
    }
}

impl<T: 'static> Default for ListStore<T> {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

fn check_index(index: isize, len: usize) -> Result<usize> {
    usize::try_from(index)
        .ok()
        .filter(|&idx| idx < len)
        .ok_or(Error::IndexOutOfRange { index, len })
}

impl<T: 'static> ListStore<T> {
    /// Kinds a list store can emit.
    pub const EMITS: EventKinds = EventKinds::all();

    pub fn new(values: Vec<T>) -> Self {
        Self {
            core: StoreCore::new(values),
        }
    }

    pub fn id(&self) -> StoreId {
        self.core.id()
    }

    pub fn is_disposed(&self) -> bool {
        !self.core.is_alive()
    }

    /// Live length.
    pub fn len(&self) -> usize {
        self.core.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.core.borrow().is_empty()
    }

    /// Read the whole sequence without cloning it.
    ///
    /// The store stays borrowed while `f` runs; mutating it from `f` panics.
    pub fn with<R>(&self, f: impl FnOnce(&[T]) -> R) -> R {
        f(&self.core.borrow())
    }

    pub fn on(&self, kind: EventKind, callback: impl Fn(&ListEvent<T>) + 'static) -> SubscriptionId {
        self.core.on(kind, Rc::new(callback))
    }

    pub fn any(&self, callback: impl Fn(&ListEvent<T>) + 'static) -> AnySubscription {
        self.core.any(Rc::new(callback))
    }

    pub fn unsubscribe(&self, kind: EventKind, id: SubscriptionId) {
        self.core.unsubscribe(kind, id);
    }

    pub fn unsubscribe_any(&self, subscription: &AnySubscription) {
        self.core.unsubscribe_any(subscription);
    }

    pub fn subscriber_count(&self, kind: EventKind) -> usize {
        self.core.subscriber_count(kind)
    }

    pub fn dispose(&self) {
        self.core.dispose();
    }

    pub fn downgrade(&self) -> WeakListStore<T> {
        WeakListStore {
            core: Rc::downgrade(&self.core),
        }
    }
}

impl<T: Clone + 'static> ListStore<T> {
    /// Snapshot of the sequence.
    pub fn values(&self) -> Vec<T> {
        self.core.borrow().clone()
    }

    /// Apply `f` to every element, in order.
    ///
    /// `map`, `for_each`, `find_index` and `position` walk a snapshot
    /// taken at the call, so the closure may mutate the store.
    pub fn map<U>(&self, f: impl FnMut(&T) -> U) -> Vec<U> {
        self.values().iter().map(f).collect()
    }

    pub fn for_each(&self, f: impl FnMut(&T)) {
        self.values().iter().for_each(f);
    }

    /// Index of the first match, or `-1`.
    pub fn find_index(&self, predicate: impl FnMut(&T) -> bool) -> isize {
        self.position(predicate)
            .and_then(|idx| isize::try_from(idx).ok())
            .unwrap_or(-1)
    }

    /// Index of the first match.
    pub fn position(&self, predicate: impl FnMut(&T) -> bool) -> Option<usize> {
        self.values().iter().position(predicate)
    }

    /// Element at `index`. Callers must treat it as read-only.
    pub fn get(&self, index: isize) -> Result<T> {
        let values = self.core.borrow();
        let idx = check_index(index, values.len())?;
        Ok(values[idx].clone())
    }

    /// Overwrite the element at `index` and deliver `change`.
    pub fn set(&self, index: isize, value: T) -> Result<()> {
        self.core
            .mutate(|values| match check_index(index, values.len()) {
                Ok(idx) => {
                    values[idx] = value;
                    let event = ListEvent::Change {
                        index: idx,
                        value: values[idx].clone(),
                    };
                    (Ok(()), Some(event))
                }
                Err(err) => (Err(err), None),
            })
            .unwrap_or(Ok(()))
    }

    /// Append `value` and deliver `append`. Returns the new length.
    pub fn push(&self, value: T) -> usize {
        self.core
            .mutate(|values| {
                values.push(value);
                let index = values.len() - 1;
                let event = ListEvent::Append {
                    index,
                    value: values[index].clone(),
                };
                (values.len(), Some(event))
            })
            .unwrap_or_else(|| self.len())
    }

    /// Remove the element at `index` and deliver `deletion`.
    ///
    /// Negative indices are ignored; `index >= len` is an error.
    pub fn remove(&self, index: isize) -> Result<()> {
        if index < 0 {
            return Ok(());
        }
        self.core
            .mutate(|values| match check_index(index, values.len()) {
                Ok(idx) => {
                    let value = values.remove(idx);
                    (Ok(()), Some(ListEvent::Deletion { index: idx, value }))
                }
                Err(err) => (Err(err), None),
            })
            .unwrap_or(Ok(()))
    }

    /// Empty the sequence and deliver `clear`.
    pub fn clear(&self) {
        self.core.mutate(|values| {
            values.clear();
            ((), Some(ListEvent::Clear))
        });
    }

    /// Replace the whole sequence and deliver `change`.
    pub fn update(&self, values: Vec<T>) {
        self.core.mutate(|current| {
            *current = values;
            ((), Some(ListEvent::Reset { values: current.clone() }))
        });
    }

    /// Replace the whole sequence with `f(current)` and deliver `change`.
    ///
    /// `f` sees a copy of the sequence, so it may read the store freely.
    pub fn update_with(&self, f: impl FnOnce(&[T]) -> Vec<T>) {
        let Some(current) = self.core.snapshot() else {
            return;
        };
        self.update(f(&current));
    }

    /// Lazy iterator over the live sequence.
    ///
    /// Each step reads the current contents, so elements pushed while
    /// iterating are visible. Call again to restart.
    pub fn iter(&self) -> ListIter<T> {
        ListIter {
            store: self.clone(),
            position: 0,
        }
    }
}

impl<T: Clone + 'static> IntoIterator for &ListStore<T> {
    type Item = T;
    type IntoIter = ListIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator returned by [`ListStore::iter`].
pub struct ListIter<T> {
    store: ListStore<T>,
    position: usize,
}

impl<T: Clone + 'static> Iterator for ListIter<T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        let item = self.store.core.borrow().get(self.position).cloned();
        if item.is_some() {
            self.position += 1;
        }
        item
    }
}

/// Weak counterpart of [`ListStore`].
pub struct WeakListStore<T> {
    core: Weak<StoreCore<Vec<T>, ListEvent<T>>>,
}

impl<T> Clone for WeakListStore<T> {
    fn clone(&self) -> Self {
        Self {
            core: self.core.clone(),
        }
    }
}

impl<T> WeakListStore<T> {
    pub fn upgrade(&self) -> Option<ListStore<T>> {
        self.core.upgrade().map(|core| ListStore { core })
    }
}

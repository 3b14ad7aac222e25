//! MapStore - a keyed store with granular events.
//!
//! Iteration follows insertion order (backed by `IndexMap`); removing a
//! key keeps the relative order of the remaining entries.

use std::rc::{Rc, Weak};

use indexmap::IndexMap;

use super::core::StoreCore;
use crate::error::{Error, Result};
use crate::types::{AnySubscription, Event, EventKind, EventKinds, StoreId, SubscriptionId};

/// Event emitted by [`MapStore`].
#[derive(Debug, Clone, PartialEq)]
pub enum MapEvent<T> {
    /// The whole mapping was replaced through `update`.
    Reset { values: IndexMap<String, T> },
    /// A key was inserted or overwritten (`set`, `transform`).
    Change { key: String, value: T },
    /// A key was removed; carries the removed value.
    Deletion { key: String, value: T },
    /// The mapping was emptied.
    Clear,
}

impl<T> Event for MapEvent<T> {
    fn kind(&self) -> EventKind {
        match self {
            MapEvent::Reset { .. } | MapEvent::Change { .. } => EventKind::Change,
            MapEvent::Deletion { .. } => EventKind::Deletion,
            MapEvent::Clear => EventKind::Clear,
        }
    }
}

/// Observable string-keyed mapping.
pub struct MapStore<T> {
    pub(crate) core: Rc<StoreCore<IndexMap<String, T>, MapEvent<T>>>,
}

impl<T> Clone for MapStore<T> {
    fn clone(&self) -> Self {
        Self {
            core: self.core.clone(),
        }
    }
}

impl<T: 'static> Default for MapStore<T> {
    fn default() -> Self {
        Self::new(IndexMap::new())
    }
}

impl<T: 'static> MapStore<T> {
    /// Kinds a map store can emit.
    pub const EMITS: EventKinds = EventKinds::CHANGE
        .union(EventKinds::DELETION)
        .union(EventKinds::CLEAR);

    pub fn new(values: IndexMap<String, T>) -> Self {
        Self {
            core: StoreCore::new(values),
        }
    }

    /// Build from any iterator of pairs.
    pub fn from_entries<K: Into<String>>(entries: impl IntoIterator<Item = (K, T)>) -> Self {
        Self::new(entries.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    pub fn id(&self) -> StoreId {
        self.core.id()
    }

    pub fn is_disposed(&self) -> bool {
        !self.core.is_alive()
    }

    /// Live number of entries.
    pub fn len(&self) -> usize {
        self.core.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.core.borrow().is_empty()
    }

    pub fn has(&self, key: &str) -> bool {
        self.core.borrow().contains_key(key)
    }

    pub fn keys(&self) -> Vec<String> {
        self.core.borrow().keys().cloned().collect()
    }

    /// Read the mapping without cloning it.
    ///
    /// The store stays borrowed while `f` runs; mutating it from `f` panics.
    pub fn with<R>(&self, f: impl FnOnce(&IndexMap<String, T>) -> R) -> R {
        f(&self.core.borrow())
    }

    pub fn on(&self, kind: EventKind, callback: impl Fn(&MapEvent<T>) + 'static) -> SubscriptionId {
        self.core.on(kind, Rc::new(callback))
    }

    pub fn any(&self, callback: impl Fn(&MapEvent<T>) + 'static) -> AnySubscription {
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

    pub fn downgrade(&self) -> WeakMapStore<T> {
        WeakMapStore {
            core: Rc::downgrade(&self.core),
        }
    }
}

impl<T: Clone + 'static> MapStore<T> {
    /// Value for `key`, or `None`.
    pub fn get(&self, key: &str) -> Option<T> {
        self.core.borrow().get(key).cloned()
    }

    /// Snapshot of the mapping.
    pub fn values(&self) -> IndexMap<String, T> {
        self.core.borrow().clone()
    }

    /// Snapshot of the entries, in iteration order.
    pub fn entries(&self) -> Vec<(String, T)> {
        self.core
            .borrow()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    /// Insert or overwrite `key` and deliver `change`.
    pub fn set(&self, key: impl Into<String>, value: T) {
        let key = key.into();
        self.core.mutate(|map| {
            let event = MapEvent::Change {
                key: key.clone(),
                value: value.clone(),
            };
            map.insert(key, value);
            ((), Some(event))
        });
    }

    /// Remove `key` and deliver `deletion`. No-op when absent.
    pub fn remove(&self, key: &str) {
        self.core.mutate(|map| match map.shift_remove(key) {
            Some(value) => (
                (),
                Some(MapEvent::Deletion {
                    key: key.to_string(),
                    value,
                }),
            ),
            None => ((), None),
        });
    }

    /// Empty the mapping and deliver `clear`.
    pub fn clear(&self) {
        self.core.mutate(|map| {
            map.clear();
            ((), Some(MapEvent::Clear))
        });
    }

    /// Replace the value at an existing `key` with `f(old)`.
    ///
    /// Delivers exactly one `change`. Fails when the key is absent, before
    /// `f` runs or after it when `f` removed the key itself.
    pub fn transform(&self, key: &str, f: impl FnOnce(&T) -> T) -> Result<()> {
        if self.is_disposed() {
            return Ok(());
        }
        let Some(old) = self.get(key) else {
            return Err(Error::MissingKey(key.to_string()));
        };
        // `f` may read or even edit the store; it runs with no borrow held.
        let next = f(&old);
        self.core
            .mutate(|map| match map.get_mut(key) {
                Some(slot) => {
                    *slot = next;
                    let event = MapEvent::Change {
                        key: key.to_string(),
                        value: slot.clone(),
                    };
                    (Ok(()), Some(event))
                }
                None => (Err(Error::MissingKey(key.to_string())), None),
            })
            .unwrap_or(Ok(()))
    }

    /// Replace the whole mapping and deliver `change`.
    pub fn update(&self, values: IndexMap<String, T>) {
        self.core.mutate(|current| {
            *current = values;
            ((), Some(MapEvent::Reset { values: current.clone() }))
        });
    }
}

/// Weak counterpart of [`MapStore`].
pub struct WeakMapStore<T> {
    core: Weak<StoreCore<IndexMap<String, T>, MapEvent<T>>>,
}

impl<T> Clone for WeakMapStore<T> {
    fn clone(&self) -> Self {
        Self {
            core: self.core.clone(),
        }
    }
}

impl<T> WeakMapStore<T> {
    pub fn upgrade(&self) -> Option<MapStore<T>> {
        self.core.upgrade().map(|core| MapStore { core })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    fn recorder<T: Clone + 'static>(map: &MapStore<T>) -> Rc<RefCell<Vec<MapEvent<T>>>> {
        let log = Rc::new(RefCell::new(Vec::new()));
        let log_cb = log.clone();
        map.any(move |event| log_cb.borrow_mut().push(event.clone()));
        log
    }

    #[test]
    fn test_set_then_remove() {
        let map = MapStore::from_entries([("x", 1)]);
        let log = recorder(&map);

        map.set("y", 2);
        map.remove("x");

        assert_eq!(map.entries(), vec![("y".to_string(), 2)]);
        assert_eq!(map.len(), 1);
        assert_eq!(
            *log.borrow(),
            vec![
                MapEvent::Change { key: "y".into(), value: 2 },
                MapEvent::Deletion { key: "x".into(), value: 1 },
            ]
        );
    }

    #[test]
    fn test_remove_absent_is_silent() {
        let map = MapStore::from_entries([("a", 1)]);
        let log = recorder(&map);
        map.remove("zzz");
        assert!(log.borrow().is_empty());
        assert_eq!(map.get("zzz"), None);
        assert!(!map.has("zzz"));
    }

    #[test]
    fn test_transform_missing_fails_unchanged() {
        let map = MapStore::from_entries([("a", 1)]);
        let log = recorder(&map);

        let result = map.transform("missing", |v| *v);

        assert_eq!(result, Err(Error::MissingKey("missing".into())));
        assert_eq!(map.values(), MapStore::from_entries([("a", 1)]).values());
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn test_transform_emits_once() {
        let map = MapStore::from_entries([("n", 20)]);
        let log = recorder(&map);

        map.transform("n", |v| v + 1).unwrap();

        assert_eq!(map.get("n"), Some(21));
        assert_eq!(*log.borrow(), vec![MapEvent::Change { key: "n".into(), value: 21 }]);
    }

    #[test]
    fn test_transform_may_read_store() {
        let map = MapStore::from_entries([("a", 1), ("b", 2)]);
        let reader = map.clone();
        map.transform("a", |v| v + reader.get("b").unwrap_or_default() + reader.len() as i32)
            .unwrap();
        assert_eq!(map.get("a"), Some(5));
    }

    #[test]
    fn test_transform_fails_when_updater_removes_key() {
        let map = MapStore::from_entries([("a", 1)]);
        let log = recorder(&map);
        let writer = map.clone();

        let result = map.transform("a", |v| {
            writer.remove("a");
            v + 1
        });

        assert_eq!(result, Err(Error::MissingKey("a".into())));
        assert!(!map.has("a"));
        assert_eq!(*log.borrow(), vec![MapEvent::Deletion { key: "a".into(), value: 1 }]);
    }

    #[test]
    fn test_clear_and_keys() {
        let map = MapStore::from_entries([("b", 2), ("a", 1)]);
        assert_eq!(map.keys(), vec!["b".to_string(), "a".to_string()]);

        let log = recorder(&map);
        map.clear();
        assert!(map.is_empty());
        assert_eq!(*log.borrow(), vec![MapEvent::Clear]);
    }

    #[test]
    fn test_emits_no_append() {
        assert!(!MapStore::<i32>::EMITS.has(EventKind::Append));
        assert!(MapStore::<i32>::EMITS.has(EventKind::Deletion));
    }

    #[test]
    fn test_disposed_map_ignores_mutation() {
        let map = MapStore::from_entries([("k", 1)]);
        let log = recorder(&map);
        map.dispose();

        map.set("j", 2);
        map.remove("k");
        map.clear();
        assert_eq!(map.transform("k", |v| v + 1), Ok(()));

        assert_eq!(map.entries(), vec![("k".to_string(), 1)]);
        assert!(log.borrow().is_empty());
    }
}

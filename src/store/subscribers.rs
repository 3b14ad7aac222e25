//! Per-store subscriber table.
//!
//! Each event kind has its own ordered list and its own id counter, so
//! ids are unique within a kind only. The table is owned by its store and
//! dropped wholesale on `dispose()`.

use std::collections::HashMap;
use std::rc::Rc;

use crate::types::{EventKind, SubscriptionId};

/// Subscriber callback. `Rc` so delivery can snapshot the list and release
/// the borrow before calling out.
pub type Callback<E> = Rc<dyn Fn(&E)>;

struct KindSubscribers<E> {
    next_id: u64,
    entries: Vec<(SubscriptionId, Callback<E>)>,
}

impl<E> KindSubscribers<E> {
    fn new() -> Self {
        Self {
            next_id: 1,
            entries: Vec::new(),
        }
    }
}

pub(crate) struct Subscribers<E> {
    kinds: HashMap<EventKind, KindSubscribers<E>>,
}

impl<E> Subscribers<E> {
    pub(crate) fn new() -> Self {
        Self {
            kinds: HashMap::new(),
        }
    }

    pub(crate) fn add(&mut self, kind: EventKind, callback: Callback<E>) -> SubscriptionId {
        let slot = self.kinds.entry(kind).or_insert_with(KindSubscribers::new);
        let id = SubscriptionId(slot.next_id);
        slot.next_id += 1;
        slot.entries.push((id, callback));
        id
    }

    pub(crate) fn remove(&mut self, kind: EventKind, id: SubscriptionId) {
        if let Some(slot) = self.kinds.get_mut(&kind) {
            slot.entries.retain(|(entry_id, _)| *entry_id != id);
        }
    }

    /// Entries for `kind` in subscription order.
    pub(crate) fn snapshot(&self, kind: EventKind) -> Vec<(SubscriptionId, Callback<E>)> {
        self.kinds
            .get(&kind)
            .map(|slot| slot.entries.clone())
            .unwrap_or_default()
    }

    pub(crate) fn contains(&self, kind: EventKind, id: SubscriptionId) -> bool {
        self.kinds
            .get(&kind)
            .is_some_and(|slot| slot.entries.iter().any(|(entry_id, _)| *entry_id == id))
    }

    pub(crate) fn count(&self, kind: EventKind) -> usize {
        self.kinds.get(&kind).map_or(0, |slot| slot.entries.len())
    }

    pub(crate) fn clear(&mut self) {
        self.kinds.clear();
    }
}

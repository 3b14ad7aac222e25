//! Core types for spark-dom.
//!
//! These types are shared by the stores and the element builder:
//! event kinds, subscription ids, store identity, and truthiness.

use std::cell::RefCell;
use std::collections::HashSet;
use std::fmt;

use uuid::Uuid;

// =============================================================================
// Event Kinds
// =============================================================================

/// The kind of a store event. Subscriptions are keyed by kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// A value (or the whole collection) was replaced.
    Change,
    /// An entry was removed.
    Deletion,
    /// The collection was emptied.
    Clear,
    /// An entry was appended to a sequence.
    Append,
}

impl EventKind {
    /// Every kind, in the order `any()` registers them.
    pub const ALL: [EventKind; 4] = [
        EventKind::Append,
        EventKind::Change,
        EventKind::Clear,
        EventKind::Deletion,
    ];

    /// The single-bit set for this kind.
    pub const fn bit(self) -> EventKinds {
        match self {
            EventKind::Change => EventKinds::CHANGE,
            EventKind::Deletion => EventKinds::DELETION,
            EventKind::Clear => EventKinds::CLEAR,
            EventKind::Append => EventKinds::APPEND,
        }
    }

    /// Lowercase name, as used in log output.
    pub const fn as_str(self) -> &'static str {
        match self {
            EventKind::Change => "change",
            EventKind::Deletion => "deletion",
            EventKind::Clear => "clear",
            EventKind::Append => "append",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

bitflags::bitflags! {
    /// A set of event kinds.
    ///
    /// Each store flavor has a fixed set it can emit, e.g.
    /// `EventKinds::CHANGE | EventKinds::DELETION | EventKinds::CLEAR` for maps.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct EventKinds: u8 {
        const CHANGE = 1 << 0;
        const DELETION = 1 << 1;
        const CLEAR = 1 << 2;
        const APPEND = 1 << 3;
    }
}

impl EventKinds {
    /// Whether this set contains `kind`.
    pub const fn has(self, kind: EventKind) -> bool {
        self.contains(kind.bit())
    }
}

/// Implemented by every store event enum.
pub trait Event {
    /// The subscription kind this event is delivered under.
    fn kind(&self) -> EventKind;
}

// =============================================================================
// Subscriptions
// =============================================================================

/// Id returned by `on()`. Unique within one store and one event kind only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(pub(crate) u64);

impl SubscriptionId {
    /// Returned when subscribing to a disposed store. Never matches a live entry.
    pub const DETACHED: SubscriptionId = SubscriptionId(0);

    /// Raw counter value.
    pub const fn get(self) -> u64 {
        self.0
    }
}

/// The four registrations made by `any()`, one per event kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnySubscription {
    pub append: SubscriptionId,
    pub change: SubscriptionId,
    pub clear: SubscriptionId,
    pub deletion: SubscriptionId,
}

impl AnySubscription {
    /// The id registered for `kind`.
    pub const fn id_for(&self, kind: EventKind) -> SubscriptionId {
        match kind {
            EventKind::Append => self.append,
            EventKind::Change => self.change,
            EventKind::Clear => self.clear,
            EventKind::Deletion => self.deletion,
        }
    }
}

// =============================================================================
// Store Identity
// =============================================================================

thread_local! {
    /// Ids of stores that are alive on this thread.
    static LIVE_IDS: RefCell<HashSet<Uuid>> = RefCell::new(HashSet::new());
}

/// Opaque store identity token.
///
/// Generated at creation and checked against every live store on the
/// current thread, so two live stores never share an id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StoreId(Uuid);

impl StoreId {
    pub(crate) fn allocate() -> Self {
        LIVE_IDS.with(|ids| {
            let mut ids = ids.borrow_mut();
            loop {
                let candidate = Uuid::new_v4();
                if ids.insert(candidate) {
                    return StoreId(candidate);
                }
                tracing::debug!(id = %candidate, "store id collision, regenerating");
            }
        })
    }

    pub(crate) fn release(self) {
        LIVE_IDS.with(|ids| {
            ids.borrow_mut().remove(&self.0);
        });
    }

    /// Whether a store with this id is still alive on this thread.
    pub fn is_live(self) -> bool {
        LIVE_IDS.with(|ids| ids.borrow().contains(&self.0))
    }
}

impl fmt::Display for StoreId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.simple())
    }
}

// =============================================================================
// Truthiness
// =============================================================================

/// Truthiness used by class conditions.
///
/// Zero, empty and absent values are false; everything else is true.
pub trait Truthy {
    fn truthy(&self) -> bool;
}

impl Truthy for bool {
    fn truthy(&self) -> bool {
        *self
    }
}

macro_rules! impl_truthy_int {
    ($($t:ty),*) => {
        $(impl Truthy for $t {
            fn truthy(&self) -> bool {
                *self != 0
            }
        })*
    };
}

impl_truthy_int!(i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize);

impl Truthy for f32 {
    fn truthy(&self) -> bool {
        *self != 0.0 && !self.is_nan()
    }
}

impl Truthy for f64 {
    fn truthy(&self) -> bool {
        *self != 0.0 && !self.is_nan()
    }
}

impl Truthy for String {
    fn truthy(&self) -> bool {
        !self.is_empty()
    }
}

impl Truthy for &str {
    fn truthy(&self) -> bool {
        !self.is_empty()
    }
}

impl<T: Truthy> Truthy for Option<T> {
    fn truthy(&self) -> bool {
        self.as_ref().is_some_and(Truthy::truthy)
    }
}

impl<T> Truthy for Vec<T> {
    fn truthy(&self) -> bool {
        !self.is_empty()
    }
}

//! Stores - observable values with typed, synchronous events.
//!
//! Three flavors share one core:
//! - [`Store`] - a single value; emits `change`
//! - [`ListStore`] - an ordered sequence; emits `change`, `deletion`, `clear`, `append`
//! - [`MapStore`] - a string-keyed mapping; emits `change`, `deletion`, `clear`
//!
//! # Delivery
//!
//! Every mutation delivers exactly one event, synchronously, to every
//! subscriber of that event's kind in registration order, before the
//! mutating call returns. There is no batching or coalescing.
//!
//! # Lifecycle
//!
//! `dispose()` drops every subscriber and turns all later mutation into a
//! no-op. The value itself stays readable through remaining handles.

mod core;
mod dependency;
mod list;
mod map;
mod subscribers;
mod value;

pub use dependency::{Dependency, DependencyRef, WatchFn};
pub use list::{ListEvent, ListIter, ListStore, WeakListStore};
pub use map::{MapEvent, MapStore, WeakMapStore};
pub use subscribers::Callback;
pub use value::{Store, StoreEvent, WeakStore};

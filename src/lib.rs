//! # spark-dom
//!
//! Reactive stores and a store-bound DOM element builder, without a
//! virtual DOM.
//!
//! ## Architecture
//!
//! Stores emit typed events synchronously to explicit subscribers. A
//! [`Builder`] declares stores as named dependencies, subscribes to each
//! one, and on every event re-runs its render function against the same
//! live node:
//!
//! ```text
//! Store::update → event fan-out → Binding::rerender → content → slots → classes → attrs/misc/styles
//! ```
//!
//! The document is never global. Builders reach it through an injected
//! [`Env`] wrapping any [`Document`] implementation; [`MemoryDocument`] is
//! the headless one used in tests.
//!
//! ## Modules
//!
//! - [`types`] - Event kinds, subscription and store ids, truthiness
//! - [`store`] - `Store`, `ListStore`, `MapStore` and the dependency seam
//! - [`builder`] - Element builder, render context, slots
//! - [`dom`] - Document capability and the in-memory document
//! - [`config`] - Marker names and the injected environment
//! - [`html`] - Escaping helpers

pub mod builder;
pub mod config;
pub mod dom;
pub mod error;
pub mod html;
pub mod store;
pub mod types;

// Re-export commonly used items
pub use types::*;

pub use error::{Error, Result};

pub use store::{
    Dependency, DependencyRef, ListEvent, ListStore, MapEvent, MapStore, Store, StoreEvent,
    WeakListStore, WeakMapStore, WeakStore,
};

pub use builder::{
    Builder, Built, Cleanup, Condition, Deps, Prop, RenderContext, Rendered, Trigger,
};

pub use config::{Config, Env};

pub use dom::{Document, DomEvent, MemoryDocument, Mutation, NodeId};

pub use html::{escape, unescape};

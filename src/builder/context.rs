//! What a render function sees: dependency values and the render context.

use std::any::Any;
use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;

use super::element::Builder;
use crate::config::Env;
use crate::dom::NodeId;
use crate::types::EventKind;

// =============================================================================
// Deps
// =============================================================================

/// Current values of every declared dependency, keyed by name.
///
/// A `Store<T>` appears as `T`, a `ListStore<T>` as `Vec<T>` and a
/// `MapStore<T>` as `IndexMap<String, T>`.
#[derive(Clone, Default)]
pub struct Deps {
    values: IndexMap<String, Rc<dyn Any>>,
}

impl Deps {
    /// Owned copy of dependency `name`, if declared and of type `T`.
    pub fn get<T: Clone + 'static>(&self, name: &str) -> Option<T> {
        self.value::<T>(name).cloned()
    }

    pub fn value<T: 'static>(&self, name: &str) -> Option<&T> {
        self.values.get(name)?.downcast_ref::<T>()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub(crate) fn insert(&mut self, name: impl Into<String>, value: Rc<dyn Any>) {
        self.values.insert(name.into(), value);
    }
}

impl fmt::Debug for Deps {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.names()).finish()
    }
}

// =============================================================================
// Trigger
// =============================================================================

/// The dependency event that caused a re-render.
#[derive(Clone)]
pub struct Trigger {
    /// Name the dependency was declared under.
    pub name: String,
    pub kind: EventKind,
    event: Rc<dyn Any>,
}

impl Trigger {
    pub(crate) fn new(name: impl Into<String>, kind: EventKind, event: Rc<dyn Any>) -> Self {
        Self {
            name: name.into(),
            kind,
            event,
        }
    }

    /// The triggering event, e.g. `trigger.event::<ListEvent<String>>()`.
    pub fn event<E: 'static>(&self) -> Option<&E> {
        self.event.downcast_ref::<E>()
    }
}

impl fmt::Debug for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Trigger")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .finish_non_exhaustive()
    }
}

// =============================================================================
// RenderContext
// =============================================================================

/// Second argument of a render function.
pub struct RenderContext<'a> {
    env: &'a Env,
    node: NodeId,
    trigger: Option<&'a Trigger>,
}

impl<'a> RenderContext<'a> {
    pub(crate) fn new(env: &'a Env, node: NodeId, trigger: Option<&'a Trigger>) -> Self {
        Self { env, node, trigger }
    }

    /// The live node being rendered.
    pub fn node(&self) -> NodeId {
        self.node
    }

    pub fn env(&self) -> &Env {
        self.env
    }

    /// `None` for the finalize-time render.
    pub fn trigger(&self) -> Option<&Trigger> {
        self.trigger
    }

    /// Fresh builder over the live node, for incremental updates.
    ///
    /// Return `()` from the render function after using it so the builder
    /// treats the pass as self-managed.
    pub fn builder(&self) -> Builder {
        Builder::adopt(self.env, self.node)
    }
}

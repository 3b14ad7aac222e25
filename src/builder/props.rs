//! Property values a builder can bind: static or derived from dependencies.

use std::fmt;
use std::rc::Rc;

use super::context::Deps;
use crate::store::Store;
use crate::types::Truthy;

// =============================================================================
// Prop
// =============================================================================

/// Attribute, style or property value.
///
/// Evaluated on finalize and on every dependency event. An empty string
/// removes the attribute/style/property instead of setting it.
#[derive(Clone)]
pub enum Prop {
    Static(String),
    Getter(Rc<dyn Fn(&Deps) -> String>),
}

impl Prop {
    /// Value computed from the current dependency values.
    pub fn getter(f: impl Fn(&Deps) -> String + 'static) -> Self {
        Prop::Getter(Rc::new(f))
    }

    pub(crate) fn resolve(&self, deps: &Deps) -> String {
        match self {
            Prop::Static(value) => value.clone(),
            Prop::Getter(f) => f(deps),
        }
    }
}

impl fmt::Debug for Prop {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Prop::Static(value) => f.debug_tuple("Static").field(value).finish(),
            Prop::Getter(_) => f.write_str("Getter(..)"),
        }
    }
}

impl From<&str> for Prop {
    fn from(value: &str) -> Self {
        Prop::Static(value.to_string())
    }
}

impl From<String> for Prop {
    fn from(value: String) -> Self {
        Prop::Static(value)
    }
}

impl From<&String> for Prop {
    fn from(value: &String) -> Self {
        Prop::Static(value.clone())
    }
}

// =============================================================================
// Condition
// =============================================================================

/// Class condition. The class is present exactly while this is truthy.
#[derive(Clone)]
pub enum Condition {
    Static(bool),
    Getter(Rc<dyn Fn(&Deps) -> bool>),
}

impl Condition {
    pub fn getter(f: impl Fn(&Deps) -> bool + 'static) -> Self {
        Condition::Getter(Rc::new(f))
    }

    /// Truthiness of the declared dependency `name`, read as `T`.
    ///
    /// False when the dependency is missing or holds another type.
    pub fn dep<T: Truthy + 'static>(name: impl Into<String>) -> Self {
        let name = name.into();
        Condition::getter(move |deps| deps.value::<T>(&name).is_some_and(Truthy::truthy))
    }

    pub(crate) fn evaluate(&self, deps: &Deps) -> bool {
        match self {
            Condition::Static(value) => *value,
            Condition::Getter(f) => f(deps),
        }
    }
}

impl fmt::Debug for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Condition::Static(value) => f.debug_tuple("Static").field(value).finish(),
            Condition::Getter(_) => f.write_str("Getter(..)"),
        }
    }
}

impl From<bool> for Condition {
    fn from(value: bool) -> Self {
        Condition::Static(value)
    }
}

/// Reads the store directly. Holds it weakly; a dropped store reads false.
impl<T: Truthy + 'static> From<&Store<T>> for Condition {
    fn from(store: &Store<T>) -> Self {
        let weak = store.downgrade();
        Condition::getter(move |_| {
            weak.upgrade()
                .is_some_and(|store| store.with(Truthy::truthy))
        })
    }
}

// =============================================================================
// Rendered
// =============================================================================

/// Result of a render function.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rendered {
    /// Replace the node's content (escaped unless the builder is `raw`).
    Html(String),
    /// The function already updated the node itself; leave content alone.
    SelfManaged,
}

impl From<String> for Rendered {
    fn from(html: String) -> Self {
        Rendered::Html(html)
    }
}

impl From<&str> for Rendered {
    fn from(html: &str) -> Self {
        Rendered::Html(html.to_string())
    }
}

impl From<()> for Rendered {
    fn from(_: ()) -> Self {
        Rendered::SelfManaged
    }
}

impl From<Option<String>> for Rendered {
    fn from(html: Option<String>) -> Self {
        html.map_or(Rendered::SelfManaged, Rendered::Html)
    }
}

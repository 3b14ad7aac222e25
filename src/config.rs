//! Builder configuration and the injected environment.
//!
//! [`Env`] is the only way a builder reaches a document. It bundles the
//! [`Document`] capability, the [`Config`], and the insertion guard used by
//! the reactive-insertion safety net.
//!
//! ```ignore
//! let doc = Rc::new(MemoryDocument::new());
//! let env = Env::new(doc.clone(), Config::default().with_slot_tag("x-hole"));
//! let node = Builder::new(&env, "p.note").content("hi").build()?;
//! ```

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

use crate::dom::{Document, Mutation};

// =============================================================================
// CONFIGURATION
// =============================================================================

/// Marker attribute names and safety-net settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Set on dependency-bound nodes; value is the comma-joined dependency names (default: `data-deps`).
    pub bound_attr: String,
    /// Set on nodes whose last render was self-managed (default: `data-self-managed`).
    pub self_managed_attr: String,
    /// Reserved placeholder tag for child slots (default: `x-slot`).
    pub slot_tag: String,
    /// Attribute naming a slot placeholder (default: `name`).
    pub slot_name_attr: String,
    /// Warn when something inserts into a bound, non-self-managed node (default: true).
    pub warn_on_unmanaged_insert: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bound_attr: "data-deps".to_string(),
            self_managed_attr: "data-self-managed".to_string(),
            slot_tag: "x-slot".to_string(),
            slot_name_attr: "name".to_string(),
            warn_on_unmanaged_insert: true,
        }
    }
}

impl Config {
    pub fn with_bound_attr(mut self, name: impl Into<String>) -> Self {
        self.bound_attr = name.into();
        self
    }

    pub fn with_self_managed_attr(mut self, name: impl Into<String>) -> Self {
        self.self_managed_attr = name.into();
        self
    }

    pub fn with_slot_tag(mut self, tag: impl Into<String>) -> Self {
        self.slot_tag = tag.into();
        self
    }

    pub fn with_slot_name_attr(mut self, name: impl Into<String>) -> Self {
        self.slot_name_attr = name.into();
        self
    }

    pub fn with_unmanaged_insert_warning(mut self, enabled: bool) -> Self {
        self.warn_on_unmanaged_insert = enabled;
        self
    }

    /// Selector for the placeholder of slot `name`.
    pub(crate) fn slot_selector(&self, name: &str) -> String {
        format!("{}[{}=\"{}\"]", self.slot_tag, self.slot_name_attr, name)
    }
}

// =============================================================================
// INSERTION GUARD
// =============================================================================

/// Depth counter for builder-driven DOM work.
///
/// Insertions made while the depth is non-zero come from the builder
/// itself (render passes, slot splicing) and are never reported.
#[derive(Debug, Default)]
struct InsertionGuard {
    depth: Cell<u32>,
}

struct Suppression<'a>(&'a InsertionGuard);

impl Drop for Suppression<'_> {
    fn drop(&mut self) {
        self.0.depth.set(self.0.depth.get() - 1);
    }
}

impl InsertionGuard {
    fn enter(&self) -> Suppression<'_> {
        self.depth.set(self.depth.get() + 1);
        Suppression(self)
    }

    fn is_suppressed(&self) -> bool {
        self.depth.get() > 0
    }
}

// =============================================================================
// ENVIRONMENT
// =============================================================================

/// Injected document capability plus configuration.
///
/// Cheap to clone; clones share the document, config and guard.
#[derive(Clone)]
pub struct Env {
    document: Rc<dyn Document>,
    config: Rc<Config>,
    guard: Rc<InsertionGuard>,
}

impl fmt::Debug for Env {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Env")
            .field("root", &self.document.root())
            .field("config", &self.config)
            .finish()
    }
}

impl Env {
    /// Wrap `document` and install the reactive-insertion safety net on it.
    pub fn new(document: Rc<dyn Document>, config: Config) -> Self {
        let env = Self {
            document,
            config: Rc::new(config),
            guard: Rc::new(InsertionGuard::default()),
        };
        env.install_safety_net();
        env
    }

    pub fn document(&self) -> &dyn Document {
        &*self.document
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Run `f` with safety-net reporting suppressed.
    pub fn suppressed<R>(&self, f: impl FnOnce() -> R) -> R {
        let _suppression = self.guard.enter();
        f()
    }

    fn install_safety_net(&self) {
        if !self.config.warn_on_unmanaged_insert {
            return;
        }
        let config = self.config.clone();
        let guard = self.guard.clone();
        self.document
            .observe(Rc::new(move |doc: &dyn Document, mutation: &Mutation| {
                if guard.is_suppressed() {
                    return;
                }
                let Mutation::ChildInserted { parent, child } = *mutation;
                let Some(deps) = doc.attribute(parent, &config.bound_attr) else {
                    return;
                };
                if doc.has_attribute(parent, &config.self_managed_attr) {
                    return;
                }
                tracing::warn!(
                    ?parent,
                    ?child,
                    deps = %deps,
                    "node inserted into a dependency-bound element; the next re-render may discard it"
                );
            }));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::MemoryDocument;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.bound_attr, "data-deps");
        assert_eq!(config.self_managed_attr, "data-self-managed");
        assert_eq!(config.slot_selector("main"), r#"x-slot[name="main"]"#);
        assert!(config.warn_on_unmanaged_insert);
    }

    #[test]
    fn test_setters() {
        let config = Config::default()
            .with_slot_tag("x-hole")
            .with_slot_name_attr("slot")
            .with_unmanaged_insert_warning(false);
        assert_eq!(config.slot_selector("a"), r#"x-hole[slot="a"]"#);
        assert!(!config.warn_on_unmanaged_insert);
    }

    #[test]
    fn test_suppression_nests() {
        let env = Env::new(Rc::new(MemoryDocument::new()), Config::default());
        assert!(!env.guard.is_suppressed());
        env.suppressed(|| {
            env.suppressed(|| assert!(env.guard.is_suppressed()));
            assert!(env.guard.is_suppressed());
        });
        assert!(!env.guard.is_suppressed());
    }
}

//! The fluent element builder.
//!
//! Each chain step records intent into an owned [`ElementConfig`]; nothing
//! touches the document until [`Builder::done`] commits it.

use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;

use super::binding::{Binding, RenderFn, Subscriptions};
use super::context::{Deps, RenderContext};
use super::descriptor;
use super::props::{Condition, Prop, Rendered};
use super::Cleanup;
use crate::config::Env;
use crate::dom::{DomEvent, Listener, NodeId};
use crate::error::Result;
use crate::store::{Dependency, DependencyRef};

// =============================================================================
// Accumulated Configuration
// =============================================================================

enum Content {
    Literal(String),
    Render(RenderFn),
}

enum Target {
    Describe(String),
    Adopt(NodeId),
}

#[derive(Default)]
struct ElementConfig {
    content: Option<Content>,
    raw: bool,
    attrs: IndexMap<String, Prop>,
    misc: IndexMap<String, Prop>,
    styles: IndexMap<String, Prop>,
    classes: IndexMap<String, Condition>,
    handlers: Vec<(String, Listener)>,
    slots: Vec<(String, NodeId)>,
    deps: IndexMap<String, Box<dyn DependencyRef>>,
    queries: Vec<String>,
}

// =============================================================================
// Builder
// =============================================================================

/// Fluent construction of a live node bound to stores.
///
/// # Example
///
/// ```ignore
/// let count = Store::new(0);
///
/// let built = Builder::new(&env, "button#inc.btn")
///     .dep("count", &count)
///     .render(|deps, _| format!("clicked {}", deps.get::<i32>("count").unwrap_or(0)))
///     .cls("many", Condition::getter(|deps| deps.get::<i32>("count").unwrap_or(0) > 9))
///     .on("click", {
///         let count = count.clone();
///         move |_| count.update_with(|n| n + 1)
///     })
///     .done()?;
/// ```
pub struct Builder {
    env: Env,
    target: Target,
    config: ElementConfig,
}

impl fmt::Debug for Builder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let target = match &self.target {
            Target::Describe(descriptor) => descriptor.clone(),
            Target::Adopt(node) => format!("{node:?}"),
        };
        f.debug_struct("Builder")
            .field("target", &target)
            .field("deps", &self.config.deps.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

impl Builder {
    /// Builder for a new element described as `tag#id.class.class`.
    ///
    /// The descriptor is parsed by [`done`](Self::done).
    pub fn new(env: &Env, descriptor: impl Into<String>) -> Self {
        Self {
            env: env.clone(),
            target: Target::Describe(descriptor.into()),
            config: ElementConfig::default(),
        }
    }

    /// Builder over an existing node.
    pub fn adopt(env: &Env, node: NodeId) -> Self {
        Self {
            env: env.clone(),
            target: Target::Adopt(node),
            config: ElementConfig::default(),
        }
    }

    /// Literal content, applied once at finalize. Replaces any render function.
    pub fn content(mut self, content: impl Into<String>) -> Self {
        self.config.content = Some(Content::Literal(content.into()));
        self
    }

    /// Insert content as HTML instead of escaping it.
    pub fn raw(mut self) -> Self {
        self.config.raw = true;
        self
    }

    /// Render function, run at finalize and on every dependency event.
    /// Replaces any literal content.
    ///
    /// Return a `String` to replace the content, or `()` after updating the
    /// node yourself through [`RenderContext::builder`].
    pub fn render<F, R>(mut self, render: F) -> Self
    where
        F: Fn(&Deps, &RenderContext<'_>) -> R + 'static,
        R: Into<Rendered>,
    {
        let render: RenderFn = Rc::new(move |deps: &Deps, ctx: &RenderContext<'_>| -> Rendered {
            render(deps, ctx).into()
        });
        self.config.content = Some(Content::Render(render));
        self
    }

    pub fn attr(mut self, name: impl Into<String>, value: impl Into<Prop>) -> Self {
        self.config.attrs.insert(name.into(), value.into());
        self
    }

    pub fn attrs<I, K, V>(mut self, attrs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Prop>,
    {
        self.config
            .attrs
            .extend(attrs.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    pub fn style(mut self, name: impl Into<String>, value: impl Into<Prop>) -> Self {
        self.config.styles.insert(name.into(), value.into());
        self
    }

    pub fn styles<I, K, V>(mut self, styles: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Prop>,
    {
        self.config
            .styles
            .extend(styles.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    /// Script-visible property such as `value` or `checked`.
    pub fn misc(mut self, name: impl Into<String>, value: impl Into<Prop>) -> Self {
        self.config.misc.insert(name.into(), value.into());
        self
    }

    /// Class `name` is present exactly while `condition` is truthy.
    pub fn cls(mut self, name: impl Into<String>, condition: impl Into<Condition>) -> Self {
        self.config.classes.insert(name.into(), condition.into());
        self
    }

    /// Event handler, registered once at finalize.
    pub fn on(mut self, event: impl Into<String>, handler: impl Fn(&DomEvent) + 'static) -> Self {
        self.config.handlers.push((event.into(), Rc::new(handler)));
        self
    }

    /// Selectors queried against the built subtree by [`done`](Self::done).
    pub fn gimme<I, S>(mut self, selectors: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config
            .queries
            .extend(selectors.into_iter().map(Into::into));
        self
    }

    /// Mount `node` into the slot placeholder called `name`.
    pub fn child(mut self, name: impl Into<String>, node: NodeId) -> Self {
        self.config.slots.push((name.into(), node));
        self
    }

    pub fn children<I, N>(mut self, children: I) -> Self
    where
        I: IntoIterator<Item = (N, NodeId)>,
        N: Into<String>,
    {
        self.config
            .slots
            .extend(children.into_iter().map(|(name, node)| (name.into(), node)));
        self
    }

    /// Declare dependency `name`. Only a weak handle is kept.
    pub fn dep(mut self, name: impl Into<String>, store: &impl Dependency) -> Self {
        self.config.deps.insert(name.into(), store.weak());
        self
    }

    pub fn deps<'a, I, N>(mut self, deps: I) -> Self
    where
        I: IntoIterator<Item = (N, &'a dyn Dependency)>,
        N: Into<String>,
    {
        self.config
            .deps
            .extend(deps.into_iter().map(|(name, store)| (name.into(), store.weak())));
        self
    }

    /// Finalize: create or adopt the node, apply everything, subscribe.
    ///
    /// Order: content → classes → attributes/misc/styles → event handlers →
    /// dependency subscriptions → `gimme` queries.
    pub fn done(self) -> Result<Built> {
        let Builder {
            env,
            target,
            config,
        } = self;
        let doc = env.document();

        let node = match target {
            Target::Describe(descriptor) => {
                let parsed = descriptor::parse(&descriptor)?;
                let node = doc.create_element(&parsed.tag);
                if let Some(id) = &parsed.id {
                    doc.set_attribute(node, "id", id);
                }
                for class in &parsed.classes {
                    doc.add_class(node, class);
                }
                node
            }
            Target::Adopt(node) => node,
        };

        let ElementConfig {
            content,
            raw,
            attrs,
            misc,
            styles,
            classes,
            handlers,
            slots,
            deps,
            queries,
        } = config;

        let (render, literal) = match content {
            Some(Content::Render(render)) => (Some(render), None),
            Some(Content::Literal(text)) => (None, Some(text)),
            None => (None, None),
        };

        let binding = Rc::new(Binding {
            env: env.clone(),
            node,
            raw,
            render,
            classes,
            attrs,
            misc,
            styles,
            slots,
            deps,
        });

        env.suppressed(|| {
            let deps = binding.snapshot();
            match &literal {
                Some(text) => binding.write_content(text),
                None => binding.run_render(&deps, None),
            }
            binding.apply_classes(&deps);
            binding.apply_props(&deps);
        });

        for (event, handler) in handlers {
            doc.add_event_listener(node, &event, handler);
        }

        let subscriptions = binding.subscribe();

        let found = queries
            .iter()
            .map(|selector| doc.query_selector(node, selector))
            .collect();

        tracing::debug!(
            ?node,
            deps = binding.deps.len(),
            bound = subscriptions.is_some(),
            "element finalized"
        );

        Ok(Built {
            node,
            found,
            subscriptions,
        })
    }

    /// Finalize and return only the node; `gimme` selectors are skipped.
    pub fn build(mut self) -> Result<NodeId> {
        self.config.queries.clear();
        self.done().map(|built| built.node)
    }
}

// =============================================================================
// Built
// =============================================================================

/// Result of [`Builder::done`].
#[derive(Clone)]
pub struct Built {
    /// The built (or adopted) node.
    pub node: NodeId,
    /// One entry per `gimme` selector, in order; `None` where nothing matched.
    pub found: Vec<Option<NodeId>>,
    subscriptions: Option<Rc<Subscriptions>>,
}

impl fmt::Debug for Built {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Built")
            .field("node", &self.node)
            .field("found", &self.found)
            .field("bound", &self.is_bound())
            .finish()
    }
}

impl Built {
    /// Whether dependency events still re-render this node.
    pub fn is_bound(&self) -> bool {
        self.subscriptions.as_ref().is_some_and(|s| s.is_active())
    }

    /// Stop re-rendering: drop every dependency subscription. Idempotent.
    pub fn unbind(&self) {
        if let Some(subscriptions) = &self.subscriptions {
            subscriptions.release();
        }
    }

    /// [`unbind`](Self::unbind) as a cleanup closure.
    pub fn cleanup(&self) -> Cleanup {
        let subscriptions = self.subscriptions.clone();
        Box::new(move || {
            if let Some(subscriptions) = subscriptions {
                subscriptions.release();
            }
        })
    }
}

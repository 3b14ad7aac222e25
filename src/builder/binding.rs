//! Live binding between a finalized node and its dependencies.
//!
//! A [`Binding`] owns everything a re-render pass needs. Each dependency
//! subscription closure holds the binding strongly, while the binding only
//! holds weak dependency handles, so a store owns the bindings that watch
//! it and never the other way round.
//!
//! Pass order: render function (content, then slot re-splice) → classes →
//! attributes, misc properties and styles. Every pass runs with the
//! insertion safety net suppressed.

use std::any::Any;
use std::cell::RefCell;
use std::rc::Rc;

use indexmap::IndexMap;

use super::context::{Deps, RenderContext, Trigger};
use super::props::{Condition, Prop, Rendered};
use super::slots;
use crate::config::Env;
use crate::dom::NodeId;
use crate::html::escape;
use crate::store::{DependencyRef, WatchFn};
use crate::types::{AnySubscription, EventKind};

/// Render function stored by a builder.
pub(crate) type RenderFn = Rc<dyn Fn(&Deps, &RenderContext<'_>) -> Rendered>;

pub(crate) struct Binding {
    pub(crate) env: Env,
    pub(crate) node: NodeId,
    pub(crate) raw: bool,
    pub(crate) render: Option<RenderFn>,
    pub(crate) classes: IndexMap<String, Condition>,
    pub(crate) attrs: IndexMap<String, Prop>,
    pub(crate) misc: IndexMap<String, Prop>,
    pub(crate) styles: IndexMap<String, Prop>,
    pub(crate) slots: Vec<(String, NodeId)>,
    pub(crate) deps: IndexMap<String, Box<dyn DependencyRef>>,
}

impl Binding {
    /// Current values of every dependency that is still alive.
    pub(crate) fn snapshot(&self) -> Deps {
        let mut deps = Deps::default();
        for (name, dep) in &self.deps {
            if let Some(value) = dep.snapshot() {
                deps.insert(name.clone(), value);
            }
        }
        deps
    }

    /// Overwrite content and re-splice mounted children.
    pub(crate) fn write_content(&self, html: &str) {
        let doc = self.env.document();
        slots::park(&self.env, &self.slots);
        if self.raw {
            doc.set_inner_html(self.node, html);
        } else {
            doc.set_inner_html(self.node, &escape(html));
        }
        slots::splice(&self.env, self.node, &self.slots);
    }

    pub(crate) fn run_render(&self, deps: &Deps, trigger: Option<&Trigger>) {
        let Some(render) = &self.render else {
            return;
        };
        let doc = self.env.document();
        let marker = &self.env.config().self_managed_attr;
        let context = RenderContext::new(&self.env, self.node, trigger);

        match render(deps, &context) {
            Rendered::Html(html) => {
                doc.remove_attribute(self.node, marker);
                self.write_content(&html);
            }
            Rendered::SelfManaged => {
                doc.set_attribute(self.node, marker, "");
                slots::splice(&self.env, self.node, &self.slots);
            }
        }
    }

    /// Add or remove every declared class to match its condition.
    pub(crate) fn apply_classes(&self, deps: &Deps) {
        let doc = self.env.document();
        for (name, condition) in &self.classes {
            if condition.evaluate(deps) {
                doc.add_class(self.node, name);
            } else {
                doc.remove_class(self.node, name);
            }
        }
    }

    /// Attributes, then misc properties, then styles. Empty values remove.
    pub(crate) fn apply_props(&self, deps: &Deps) {
        let doc = self.env.document();
        for (name, prop) in &self.attrs {
            match prop.resolve(deps) {
                value if value.is_empty() => doc.remove_attribute(self.node, name),
                value => doc.set_attribute(self.node, name, &value),
            }
        }
        for (name, prop) in &self.misc {
            match prop.resolve(deps) {
                value if value.is_empty() => doc.remove_property(self.node, name),
                value => doc.set_property(self.node, name, &value),
            }
        }
        for (name, prop) in &self.styles {
            match prop.resolve(deps) {
                value if value.is_empty() => doc.remove_style_property(self.node, name),
                value => doc.set_style_property(self.node, name, &value),
            }
        }
    }

    /// Dependency-triggered pass.
    pub(crate) fn rerender(&self, trigger: &Trigger) {
        tracing::trace!(node = ?self.node, dep = %trigger.name, kind = %trigger.kind, "re-render");
        self.env.suppressed(|| {
            let deps = self.snapshot();
            self.run_render(&deps, Some(trigger));
            self.apply_classes(&deps);
            self.apply_props(&deps);
        });
    }

    /// Watch every dependency and mark the node as bound.
    pub(crate) fn subscribe(self: &Rc<Self>) -> Option<Rc<Subscriptions>> {
        let mut active = Vec::new();
        for (name, dep) in &self.deps {
            let binding = Rc::clone(self);
            let dep_name = name.clone();
            let on_event: WatchFn = Rc::new(move |kind: EventKind, event: Rc<dyn Any>| {
                binding.rerender(&Trigger::new(dep_name.as_str(), kind, event));
            });
            if let Some(subscription) = dep.watch(on_event) {
                active.push((name.clone(), subscription));
            }
        }
        if active.is_empty() {
            return None;
        }

        let names: Vec<&str> = active.iter().map(|(name, _)| name.as_str()).collect();
        self.env
            .document()
            .set_attribute(self.node, &self.env.config().bound_attr, &names.join(","));

        Some(Rc::new(Subscriptions {
            binding: Rc::clone(self),
            active: RefCell::new(active),
        }))
    }
}

/// Live dependency subscriptions of one finalized builder.
pub(crate) struct Subscriptions {
    binding: Rc<Binding>,
    active: RefCell<Vec<(String, AnySubscription)>>,
}

impl Subscriptions {
    pub(crate) fn is_active(&self) -> bool {
        !self.active.borrow().is_empty()
    }

    /// Unsubscribe everything and drop the bound marker. Idempotent.
    pub(crate) fn release(&self) {
        let active = std::mem::take(&mut *self.active.borrow_mut());
        if active.is_empty() {
            return;
        }
        for (name, subscription) in &active {
            if let Some(dep) = self.binding.deps.get(name) {
                dep.unwatch(subscription);
            }
        }
        let env = &self.binding.env;
        env.document()
            .remove_attribute(self.binding.node, &env.config().bound_attr);
        tracing::debug!(node = ?self.binding.node, "element unbound");
    }
}

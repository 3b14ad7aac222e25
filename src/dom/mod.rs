//! DOM capability layer.
//!
//! The builder never touches a global document. It talks to a
//! [`Document`] trait object injected through [`Env`](crate::Env), so the
//! same core runs against a browser adapter or the headless
//! [`MemoryDocument`] used in tests.
//!
//! Nodes are addressed by opaque [`NodeId`] handles. Identity is the
//! handle: a node that keeps its `NodeId` across a re-render was moved,
//! not recreated. Handles are generational, so one that outlives its node
//! never aliases a newer node.

mod memory;
mod parse;

use std::fmt;
use std::rc::Rc;

pub use memory::MemoryDocument;

// =============================================================================
// Handles and Events
// =============================================================================

/// Handle to a node owned by a [`Document`].
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId {
    pub(crate) key: usize,
    pub(crate) generation: u32,
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}v{}", self.key, self.generation)
    }
}

/// A UI event delivered to listeners.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomEvent {
    /// Event name, e.g. `"click"`.
    pub name: String,
    /// Node the event was dispatched on.
    pub target: NodeId,
    /// Node whose listener is running (differs from `target` while bubbling).
    pub current: NodeId,
}

/// Listener registered with [`Document::add_event_listener`].
pub type Listener = Rc<dyn Fn(&DomEvent)>;

/// Structural change reported to observers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mutation {
    /// `child` was inserted under `parent` by an append, insert, replace,
    /// or as a top-level node of `set_inner_html` markup.
    ChildInserted { parent: NodeId, child: NodeId },
}

/// Observer registered with [`Document::observe`]. Receives the document
/// so it can inspect nodes without holding a handle to it.
pub type Observer = Rc<dyn Fn(&dyn Document, &Mutation)>;

// =============================================================================
// Document Capability
// =============================================================================

/// Minimal document capability set consumed by the builder.
///
/// All methods take `&self`; implementations use interior mutability.
/// Observers and listeners are invoked with no internal borrow held, so
/// they may call back into the document.
///
/// Class and style helpers have default implementations on top of the
/// `class` and `style` attributes.
pub trait Document {
    /// Root container (`<body>` for the memory document).
    fn root(&self) -> NodeId;

    fn create_element(&self, tag: &str) -> NodeId;

    /// A parentless container whose children move out when it is appended.
    fn create_fragment(&self) -> NodeId;

    /// First descendant of `scope` matching `selector`, in document order.
    fn query_selector(&self, scope: NodeId, selector: &str) -> Option<NodeId> {
        self.query_selector_all(scope, selector).into_iter().next()
    }

    /// Every descendant of `scope` matching `selector`, in document order.
    fn query_selector_all(&self, scope: NodeId, selector: &str) -> Vec<NodeId>;

    /// Lowercase tag name, `None` for text and fragment nodes.
    fn tag_name(&self, node: NodeId) -> Option<String>;

    fn inner_html(&self, node: NodeId) -> String;

    /// Replace all children of `node` with the parsed `html`.
    ///
    /// Previous children the caller created are detached and stay valid.
    /// Implementations may free children that earlier markup produced.
    /// Each new top-level node is reported to observers.
    fn set_inner_html(&self, node: NodeId, html: &str);

    fn text_content(&self, node: NodeId) -> String;

    fn attribute(&self, node: NodeId, name: &str) -> Option<String>;
    fn set_attribute(&self, node: NodeId, name: &str, value: &str);
    fn remove_attribute(&self, node: NodeId, name: &str);

    fn has_attribute(&self, node: NodeId, name: &str) -> bool {
        self.attribute(node, name).is_some()
    }

    /// Script-visible property (`value`, `checked`, ...), distinct from attributes.
    fn property(&self, node: NodeId, name: &str) -> Option<String>;
    fn set_property(&self, node: NodeId, name: &str, value: &str);
    fn remove_property(&self, node: NodeId, name: &str);

    fn has_class(&self, node: NodeId, class: &str) -> bool {
        self.attribute(node, "class")
            .is_some_and(|list| list.split_whitespace().any(|c| c == class))
    }

    fn add_class(&self, node: NodeId, class: &str) {
        if self.has_class(node, class) {
            return;
        }
        let list = match self.attribute(node, "class") {
            Some(list) if !list.trim().is_empty() => format!("{} {class}", list.trim()),
            _ => class.to_string(),
        };
        self.set_attribute(node, "class", &list);
    }

    fn remove_class(&self, node: NodeId, class: &str) {
        let Some(list) = self.attribute(node, "class") else {
            return;
        };
        let kept: Vec<&str> = list.split_whitespace().filter(|c| *c != class).collect();
        self.set_attribute(node, "class", &kept.join(" "));
    }

    fn style_property(&self, node: NodeId, name: &str) -> Option<String> {
        let style = self.attribute(node, "style")?;
        parse_style(&style)
            .into_iter()
            .find(|(prop, _)| prop == name)
            .map(|(_, value)| value)
    }

    fn set_style_property(&self, node: NodeId, name: &str, value: &str) {
        let mut decls = self
            .attribute(node, "style")
            .map(|s| parse_style(&s))
            .unwrap_or_default();
        match decls.iter_mut().find(|(prop, _)| prop == name) {
            Some(decl) => decl.1 = value.to_string(),
            None => decls.push((name.to_string(), value.to_string())),
        }
        self.set_attribute(node, "style", &format_style(&decls));
    }

    fn remove_style_property(&self, node: NodeId, name: &str) {
        let Some(style) = self.attribute(node, "style") else {
            return;
        };
        let decls: Vec<_> = parse_style(&style)
            .into_iter()
            .filter(|(prop, _)| prop != name)
            .collect();
        if decls.is_empty() {
            self.remove_attribute(node, "style");
        } else {
            self.set_attribute(node, "style", &format_style(&decls));
        }
    }

    fn parent(&self, node: NodeId) -> Option<NodeId>;
    fn children(&self, node: NodeId) -> Vec<NodeId>;

    /// Append `child` to `parent`, detaching it from any previous parent.
    fn append_child(&self, parent: NodeId, child: NodeId);

    /// Insert `child` before `reference` (append when `None` or not a child).
    fn insert_before(&self, parent: NodeId, child: NodeId, reference: Option<NodeId>);

    /// Put `replacement` where `old` is and detach `old`.
    fn replace_with(&self, old: NodeId, replacement: NodeId);

    /// Detach `node` from its parent.
    fn remove(&self, node: NodeId);

    /// Hint that the detached `node` will not be used again, so its
    /// storage may be reclaimed. Attached nodes are left alone.
    fn release(&self, _node: NodeId) {}

    fn add_event_listener(&self, node: NodeId, event: &str, listener: Listener);

    /// Register a structural-change observer.
    fn observe(&self, observer: Observer);

    /// Whether `ancestor` contains `node` (inclusive).
    fn contains(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(n) = current {
            if n == ancestor {
                return true;
            }
            current = self.parent(n);
        }
        false
    }
}

fn parse_style(style: &str) -> Vec<(String, String)> {
    style
        .split(';')
        .filter_map(|decl| {
            let (prop, value) = decl.split_once(':')?;
            let prop = prop.trim();
            (!prop.is_empty()).then(|| (prop.to_string(), value.trim().to_string()))
        })
        .collect()
}

fn format_style(decls: &[(String, String)]) -> String {
    decls
        .iter()
        .map(|(prop, value)| format!("{prop}: {value};"))
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_style_round_trip() {
        let decls = parse_style("color: red; margin-top:4px;;");
        assert_eq!(
            decls,
            vec![
                ("color".to_string(), "red".to_string()),
                ("margin-top".to_string(), "4px".to_string()),
            ]
        );
        assert_eq!(format_style(&decls), "color: red; margin-top: 4px;");
    }
}

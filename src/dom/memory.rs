//! Headless [`Document`] implementation.
//!
//! Nodes live in a `slab` arena addressed by generational [`NodeId`]s.
//! Nodes the document parsed out of markup belong to that markup: when
//! `set_inner_html` discards them, or a detached node is
//! [released](Document::release), their slots are freed and every handle
//! to them goes stale. Nodes made with `create_element` or
//! `create_fragment` belong to the caller and are only ever detached.
//!
//! Selector queries run through `scraper` against a marked copy of the
//! queried tree, so matching follows real CSS semantics. The copy is
//! re-parsed as HTML: nodes a parser would refuse to nest (a `<tr>`
//! outside a table, say) are not found.

use std::cell::RefCell;

use indexmap::IndexMap;
use scraper::{Html, Selector};
use slab::Slab;

use super::parse::{parse_fragment, Parsed};
use super::{Document, DomEvent, Listener, Mutation, NodeId, Observer};

/// Attribute carrying the arena handle on the query copy.
const NODE_MARK: &str = "data-memory-node";

const VOID: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source",
    "track", "wbr",
];

fn is_raw_text(tag: &str) -> bool {
    matches!(tag, "script" | "style")
}

// =============================================================================
// Arena
// =============================================================================

enum NodeKind {
    Element {
        tag: String,
        attrs: IndexMap<String, String>,
        props: IndexMap<String, String>,
    },
    Text(String),
    Fragment,
}

struct Node {
    generation: u32,
    from_markup: bool,
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    listeners: Vec<(String, Listener)>,
}

struct Arena {
    slots: Slab<Node>,
    next_generation: u32,
}

impl Arena {
    fn alloc(&mut self, kind: NodeKind, from_markup: bool) -> NodeId {
        let generation = self.next_generation;
        self.next_generation = self.next_generation.wrapping_add(1);
        let key = self.slots.insert(Node {
            generation,
            from_markup,
            kind,
            parent: None,
            children: Vec::new(),
            listeners: Vec::new(),
        });
        NodeId { key, generation }
    }

    fn get(&self, id: NodeId) -> Option<&Node> {
        self.slots.get(id.key).filter(|n| n.generation == id.generation)
    }

    fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.slots
            .get_mut(id.key)
            .filter(|n| n.generation == id.generation)
    }

    // Links between live nodes always point at live nodes, so the
    // accessors below index directly.

    fn node(&self, id: NodeId) -> &Node {
        &self.slots[id.key]
    }

    fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.slots[id.key]
    }

    fn detach(&mut self, child: NodeId) {
        let Some(parent) = self.node_mut(child).parent.take() else {
            return;
        };
        self.node_mut(parent).children.retain(|c| *c != child);
    }

    fn is_inclusive_ancestor(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(n) = current {
            if n == ancestor {
                return true;
            }
            current = self.node(n).parent;
        }
        false
    }

    /// Free `id` and its markup-owned descendants. Caller-owned descendants
    /// are detached and survive. `id` must already be detached.
    fn free(&mut self, id: NodeId) -> usize {
        let node = self.slots.remove(id.key);
        let mut freed = 1;
        for child in node.children {
            if self.node(child).from_markup {
                freed += self.free(child);
            } else {
                self.node_mut(child).parent = None;
            }
        }
        freed
    }

    fn materialize(&mut self, parent: NodeId, parsed: Vec<Parsed>) -> Vec<NodeId> {
        let mut created = Vec::with_capacity(parsed.len());
        for item in parsed {
            let (kind, children) = match item {
                Parsed::Text(text) => (NodeKind::Text(text), Vec::new()),
                Parsed::Element {
                    tag,
                    attrs,
                    children,
                } => (
                    NodeKind::Element {
                        tag,
                        attrs: attrs.into_iter().collect(),
                        props: IndexMap::new(),
                    },
                    children,
                ),
            };
            let id = self.alloc(kind, true);
            self.node_mut(id).parent = Some(parent);
            self.node_mut(parent).children.push(id);
            self.materialize(id, children);
            created.push(id);
        }
        created
    }

    fn top(&self, id: NodeId) -> NodeId {
        let mut current = id;
        while let Some(parent) = self.node(current).parent {
            current = parent;
        }
        current
    }

    fn serialize(&self, id: NodeId, raw_text: bool, marked: bool, out: &mut String) {
        match &self.node(id).kind {
            NodeKind::Text(text) if raw_text => out.push_str(text),
            NodeKind::Text(text) => escape_serialized(text, false, out),
            NodeKind::Fragment => self.serialize_children(id, false, marked, out),
            NodeKind::Element { tag, attrs, .. } => {
                out.push('<');
                out.push_str(tag);
                if marked {
                    out.push_str(&format!(" {NODE_MARK}=\"{}\"", mark(id)));
                }
                for (name, value) in attrs {
                    out.push(' ');
                    out.push_str(name);
                    out.push_str("=\"");
                    escape_serialized(value, true, out);
                    out.push('"');
                }
                out.push('>');
                if VOID.contains(&tag.as_str()) {
                    return;
                }
                self.serialize_children(id, is_raw_text(tag), marked, out);
                out.push_str("</");
                out.push_str(tag);
                out.push('>');
            }
        }
    }

    fn serialize_children(&self, id: NodeId, raw_text: bool, marked: bool, out: &mut String) {
        for child in &self.node(id).children {
            self.serialize(*child, raw_text, marked, out);
        }
    }

    fn collect_text(&self, id: NodeId, out: &mut String) {
        match &self.node(id).kind {
            NodeKind::Text(text) => out.push_str(text),
            _ => {
                for child in &self.node(id).children {
                    self.collect_text(*child, out);
                }
            }
        }
    }
}

/// Escaping of the HTML serialization algorithm: `&`, no-break space and
/// `"` in attribute values, `&`, no-break space, `<` and `>` in text.
fn escape_serialized(input: &str, attribute: bool, out: &mut String) {
    for ch in input.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '\u{a0}' => out.push_str("&nbsp;"),
            '"' if attribute => out.push_str("&quot;"),
            '<' if !attribute => out.push_str("&lt;"),
            '>' if !attribute => out.push_str("&gt;"),
            other => out.push(other),
        }
    }
}

fn mark(id: NodeId) -> String {
    format!("{}.{}", id.key, id.generation)
}

fn unmark(mark: &str) -> Option<NodeId> {
    let (key, generation) = mark.split_once('.')?;
    Some(NodeId {
        key: key.parse().ok()?,
        generation: generation.parse().ok()?,
    })
}

// =============================================================================
// MemoryDocument
// =============================================================================

/// In-memory document rooted at a `<body>` element.
///
/// ```ignore
/// let doc = MemoryDocument::new();
/// let div = doc.create_element("div");
/// doc.set_inner_html(div, "<b>hi</b>");
/// doc.append_child(doc.root(), div);
/// assert_eq!(doc.inner_html(doc.root()), "<div><b>hi</b></div>");
/// ```
pub struct MemoryDocument {
    arena: RefCell<Arena>,
    root: NodeId,
    observers: RefCell<Vec<Observer>>,
}

impl Default for MemoryDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryDocument {
    pub fn new() -> Self {
        let mut arena = Arena {
            slots: Slab::new(),
            next_generation: 0,
        };
        let root = arena.alloc(
            NodeKind::Element {
                tag: "body".to_string(),
                attrs: IndexMap::new(),
                props: IndexMap::new(),
            },
            false,
        );
        Self {
            arena: RefCell::new(arena),
            root,
            observers: RefCell::new(Vec::new()),
        }
    }

    /// Number of live nodes, attached or not.
    pub fn node_count(&self) -> usize {
        self.arena.borrow().slots.len()
    }

    /// Whether `node` still refers to a live node.
    pub fn is_live(&self, node: NodeId) -> bool {
        self.arena.borrow().get(node).is_some()
    }

    /// Fire `event` at `target`, bubbling through its ancestors.
    pub fn dispatch_event(&self, target: NodeId, event: &str) {
        let mut path = Vec::new();
        {
            let arena = self.arena.borrow();
            let mut current = arena.get(target).map(|_| target);
            while let Some(node) = current {
                path.push(node);
                current = arena.node(node).parent;
            }
        }

        for current in path {
            // A listener lower down may have freed this node.
            let listeners: Vec<Listener> = match self.arena.borrow().get(current) {
                Some(node) => node
                    .listeners
                    .iter()
                    .filter(|(name, _)| name == event)
                    .map(|(_, listener)| listener.clone())
                    .collect(),
                None => continue,
            };
            let dom_event = DomEvent {
                name: event.to_string(),
                target,
                current,
            };
            for listener in listeners {
                listener(&dom_event);
            }
        }
    }

    fn notify(&self, parent: NodeId, inserted: Vec<NodeId>) {
        if inserted.is_empty() {
            return;
        }
        let observers: Vec<Observer> = self.observers.borrow().clone();
        for child in inserted {
            let mutation = Mutation::ChildInserted { parent, child };
            for observer in &observers {
                observer(self, &mutation);
            }
        }
    }

    /// Move `child` (or a fragment's children) under `parent`.
    /// Returns the nodes actually inserted.
    fn insert(&self, parent: NodeId, child: NodeId, reference: Option<NodeId>) -> Vec<NodeId> {
        let mut arena = self.arena.borrow_mut();
        if Some(child) == reference || arena.get(child).is_none() {
            return Vec::new();
        }
        match arena.get(parent).map(|n| &n.kind) {
            None | Some(NodeKind::Text(_)) => return Vec::new(),
            Some(_) => {}
        }

        let moving = if matches!(arena.node(child).kind, NodeKind::Fragment) {
            std::mem::take(&mut arena.node_mut(child).children)
        } else {
            vec![child]
        };

        let mut inserted = Vec::with_capacity(moving.len());
        for node in moving {
            if arena.is_inclusive_ancestor(node, parent) {
                continue;
            }
            arena.detach(node);
            let siblings = &arena.node(parent).children;
            let position = reference
                .and_then(|r| siblings.iter().position(|c| *c == r))
                .unwrap_or(siblings.len());
            arena.node_mut(parent).children.insert(position, node);
            arena.node_mut(node).parent = Some(parent);
            inserted.push(node);
        }
        inserted
    }

    fn with_element<R>(
        &self,
        node: NodeId,
        f: impl FnOnce(&mut IndexMap<String, String>, &mut IndexMap<String, String>) -> R,
    ) -> Option<R> {
        let mut arena = self.arena.borrow_mut();
        match &mut arena.get_mut(node)?.kind {
            NodeKind::Element { attrs, props, .. } => Some(f(attrs, props)),
            _ => None,
        }
    }

    fn record_freed(&self, count: usize) {
        if count > 0 {
            tracing::trace!(count, live = self.node_count(), "released nodes");
        }
    }
}

impl Document for MemoryDocument {
    fn root(&self) -> NodeId {
        self.root
    }

    fn create_element(&self, tag: &str) -> NodeId {
        self.arena.borrow_mut().alloc(
            NodeKind::Element {
                tag: tag.to_ascii_lowercase(),
                attrs: IndexMap::new(),
                props: IndexMap::new(),
            },
            false,
        )
    }

    fn create_fragment(&self) -> NodeId {
        self.arena.borrow_mut().alloc(NodeKind::Fragment, false)
    }

    fn query_selector_all(&self, scope: NodeId, selector: &str) -> Vec<NodeId> {
        let Ok(selector) = Selector::parse(selector) else {
            return Vec::new();
        };

        let (markup, whole_document) = {
            let arena = self.arena.borrow();
            if arena.get(scope).is_none() {
                return Vec::new();
            }
            let top = arena.top(scope);
            let mut markup = String::new();
            arena.serialize(top, false, true, &mut markup);
            (markup, top == self.root)
        };

        // The root is a `<body>`, which only a full document parse keeps.
        let copy = if whole_document {
            Html::parse_document(&markup)
        } else {
            Html::parse_fragment(&markup)
        };

        let arena = self.arena.borrow();
        copy.select(&selector)
            .filter_map(|el| el.value().attr(NODE_MARK).and_then(unmark))
            .filter(|id| *id != scope && arena.get(*id).is_some())
            .filter(|id| arena.is_inclusive_ancestor(scope, *id))
            .collect()
    }

    fn tag_name(&self, node: NodeId) -> Option<String> {
        match &self.arena.borrow().get(node)?.kind {
            NodeKind::Element { tag, .. } => Some(tag.clone()),
            _ => None,
        }
    }

    fn inner_html(&self, node: NodeId) -> String {
        let arena = self.arena.borrow();
        let mut out = String::new();
        let raw = match arena.get(node).map(|n| &n.kind) {
            None => return out,
            Some(NodeKind::Element { tag, .. }) => is_raw_text(tag),
            Some(_) => false,
        };
        arena.serialize_children(node, raw, false, &mut out);
        out
    }

    fn set_inner_html(&self, node: NodeId, html: &str) {
        let parsed = parse_fragment(html);
        let (inserted, freed) = {
            let mut arena = self.arena.borrow_mut();
            match arena.get_mut(node) {
                Some(Node {
                    kind: NodeKind::Text(text),
                    ..
                }) => {
                    *text = html.to_string();
                    return;
                }
                None => return,
                Some(_) => {}
            }

            let mut freed = 0;
            for child in std::mem::take(&mut arena.node_mut(node).children) {
                arena.node_mut(child).parent = None;
                if arena.node(child).from_markup {
                    freed += arena.free(child);
                }
            }
            (arena.materialize(node, parsed), freed)
        };
        self.record_freed(freed);
        self.notify(node, inserted);
    }

    fn text_content(&self, node: NodeId) -> String {
        let arena = self.arena.borrow();
        let mut out = String::new();
        if arena.get(node).is_some() {
            arena.collect_text(node, &mut out);
        }
        out
    }

    fn attribute(&self, node: NodeId, name: &str) -> Option<String> {
        self.with_element(node, |attrs, _| attrs.get(name).cloned())
            .flatten()
    }

    fn set_attribute(&self, node: NodeId, name: &str, value: &str) {
        self.with_element(node, |attrs, _| {
            attrs.insert(name.to_ascii_lowercase(), value.to_string());
        });
    }

    fn remove_attribute(&self, node: NodeId, name: &str) {
        self.with_element(node, |attrs, _| {
            attrs.shift_remove(name);
        });
    }

    fn property(&self, node: NodeId, name: &str) -> Option<String> {
        self.with_element(node, |_, props| props.get(name).cloned())
            .flatten()
    }

    fn set_property(&self, node: NodeId, name: &str, value: &str) {
        self.with_element(node, |_, props| {
            props.insert(name.to_string(), value.to_string());
        });
    }

    fn remove_property(&self, node: NodeId, name: &str) {
        self.with_element(node, |_, props| {
            props.shift_remove(name);
        });
    }

    fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.arena.borrow().get(node)?.parent
    }

    fn children(&self, node: NodeId) -> Vec<NodeId> {
        self.arena
            .borrow()
            .get(node)
            .map(|n| n.children.clone())
            .unwrap_or_default()
    }

    fn append_child(&self, parent: NodeId, child: NodeId) {
        self.insert_before(parent, child, None);
    }

    fn insert_before(&self, parent: NodeId, child: NodeId, reference: Option<NodeId>) {
        let inserted = self.insert(parent, child, reference);
        self.notify(parent, inserted);
    }

    fn replace_with(&self, old: NodeId, replacement: NodeId) {
        if old == replacement || !self.is_live(replacement) {
            return;
        }
        let Some(parent) = self.parent(old) else {
            return;
        };
        self.insert_before(parent, replacement, Some(old));
        self.remove(old);
    }

    fn remove(&self, node: NodeId) {
        let mut arena = self.arena.borrow_mut();
        if arena.get(node).is_some() {
            arena.detach(node);
        }
    }

    fn release(&self, node: NodeId) {
        let freed = {
            let mut arena = self.arena.borrow_mut();
            let detached = arena.get(node).is_some_and(|n| n.parent.is_none());
            if detached && node != self.root {
                arena.free(node)
            } else {
                0
            }
        };
        self.record_freed(freed);
    }

    fn add_event_listener(&self, node: NodeId, event: &str, listener: Listener) {
        if let Some(n) = self.arena.borrow_mut().get_mut(node) {
            n.listeners.push((event.to_string(), listener));
        }
    }

    fn observe(&self, observer: Observer) {
        self.observers.borrow_mut().push(observer);
    }
}

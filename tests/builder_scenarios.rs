//! End-to-end builder scenarios against the in-memory document.
//!
//! Each test builds a node bound to one or more stores, mutates the stores
//! and checks that the same live node was reconciled in place.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use indexmap::IndexMap;
use spark_dom::{
    escape, Builder, Condition, Config, Dependency, Document, Env, Error, EventKind, ListEvent,
    ListStore, MapStore, MemoryDocument, NodeId, Prop, Store,
};

// =============================================================================
// Helpers
// =============================================================================

fn setup() -> (Env, Rc<MemoryDocument>) {
    let doc = Rc::new(MemoryDocument::new());
    let env = Env::new(doc.clone(), Config::default());
    (env, doc)
}

fn classes(doc: &MemoryDocument, node: NodeId) -> Vec<String> {
    doc.attribute(node, "class")
        .unwrap_or_default()
        .split_whitespace()
        .map(str::to_string)
        .collect()
}

// =============================================================================
// Content
// =============================================================================

#[test]
fn test_render_follows_dependency_and_keeps_node() {
    let (env, doc) = setup();
    let n = Store::new(0);

    let node = Builder::new(&env, "span")
        .dep("n", &n)
        .render(|deps, _| format!("v{}", deps.get::<i32>("n").unwrap_or_default()))
        .build()
        .unwrap();
    doc.append_child(doc.root(), node);

    assert_eq!(doc.text_content(node), "v0");

    n.update(2);

    assert_eq!(doc.text_content(node), "v2");
    assert_eq!(doc.children(doc.root()), vec![node]);
}

#[test]
fn test_every_event_rerenders_synchronously() {
    let (env, doc) = setup();
    let n = Store::new(0);
    let runs = Rc::new(Cell::new(0));
    let runs_render = runs.clone();

    let node = Builder::new(&env, "b")
        .dep("n", &n)
        .render(move |deps, _| {
            runs_render.set(runs_render.get() + 1);
            deps.get::<i32>("n").unwrap_or_default().to_string()
        })
        .build()
        .unwrap();

    for i in 1..=3 {
        n.update(i);
        assert_eq!(doc.text_content(node), i.to_string());
    }
    assert_eq!(runs.get(), 4);
}

#[test]
fn test_render_sees_trigger_and_event() {
    let (env, doc) = setup();
    let todos = ListStore::new(vec!["a".to_string()]);
    let seen = Rc::new(RefCell::new(Vec::new()));
    let seen_render = seen.clone();

    let node = Builder::new(&env, "ul")
        .dep("todos", &todos)
        .render(move |deps, ctx| {
            if let Some(trigger) = ctx.trigger() {
                let event = trigger.event::<ListEvent<String>>().cloned();
                seen_render
                    .borrow_mut()
                    .push((trigger.name.clone(), trigger.kind, event));
            }
            deps.get::<Vec<String>>("todos")
                .unwrap_or_default()
                .join(",")
        })
        .build()
        .unwrap();

    todos.push("b".to_string());
    todos.remove(0).unwrap();

    assert_eq!(doc.text_content(node), "b");
    assert_eq!(
        *seen.borrow(),
        vec![
            (
                "todos".to_string(),
                EventKind::Append,
                Some(ListEvent::Append { index: 1, value: "b".to_string() })
            ),
            (
                "todos".to_string(),
                EventKind::Deletion,
                Some(ListEvent::Deletion { index: 0, value: "a".to_string() })
            ),
        ]
    );
}

#[test]
fn test_multiple_deps_keyed_by_name() {
    let (env, doc) = setup();
    let first = Store::new("Ada".to_string());
    let scores = MapStore::new(IndexMap::from([("ada".to_string(), 3)]));

    let node = Builder::new(&env, "p")
        .deps([
            ("first", &first as &dyn Dependency),
            ("scores", &scores as &dyn Dependency),
        ])
        .render(|deps, _| {
            let name = deps.get::<String>("first").unwrap_or_default();
            let scores = deps.get::<IndexMap<String, i32>>("scores").unwrap_or_default();
            let score = scores.get(&name.to_lowercase()).copied().unwrap_or(0);
            format!("{name}: {score}")
        })
        .build()
        .unwrap();

    assert_eq!(doc.text_content(node), "Ada: 3");
    scores.transform("ada", |s| s + 1).unwrap();
    assert_eq!(doc.text_content(node), "Ada: 4");
    first.update("Bob".to_string());
    assert_eq!(doc.text_content(node), "Bob: 0");
    assert_eq!(doc.attribute(node, "data-deps").as_deref(), Some("first,scores"));
}

#[test]
fn test_render_output_escaped_unless_raw() {
    let (env, doc) = setup();
    let label = Store::new("<i>x</i>".to_string());

    let escaped = Builder::new(&env, "div")
        .dep("label", &label)
        .render(|deps, _| deps.get::<String>("label").unwrap_or_default())
        .build()
        .unwrap();
    let raw = Builder::new(&env, "div")
        .raw()
        .dep("label", &label)
        .render(|deps, _| deps.get::<String>("label").unwrap_or_default())
        .build()
        .unwrap();

    assert!(doc.query_selector(escaped, "i").is_none());
    assert!(doc.query_selector(raw, "i").is_some());
}

// =============================================================================
// Classes and Properties
// =============================================================================

#[test]
fn test_cls_toggles_with_dependency() {
    let (env, doc) = setup();
    let on = Store::new(false);

    let node = Builder::new(&env, "div.card")
        .dep("on", &on)
        .cls("on", Condition::dep::<bool>("on"))
        .cls("fixed", true)
        .build()
        .unwrap();

    assert_eq!(classes(&doc, node), vec!["card", "fixed"]);

    on.update(true);
    assert!(doc.has_class(node, "on"));
    assert!(doc.has_class(node, "card"));

    on.update(false);
    assert!(!doc.has_class(node, "on"));
    assert_eq!(classes(&doc, node), vec!["card", "fixed"]);
}

#[test]
fn test_cls_from_store_reference() {
    let (env, doc) = setup();
    let count = Store::new(0_u32);

    let node = Builder::new(&env, "span")
        .dep("count", &count)
        .cls("nonzero", &count)
        .build()
        .unwrap();

    assert!(!doc.has_class(node, "nonzero"));
    count.update(3);
    assert!(doc.has_class(node, "nonzero"));
    count.update(0);
    assert!(!doc.has_class(node, "nonzero"));
}

#[test]
fn test_reactive_attr_and_style_removal() {
    let (env, doc) = setup();
    let title = Store::new("hello".to_string());

    let node = Builder::new(&env, "a")
        .dep("title", &title)
        .attr("title", Prop::getter(|d| d.get::<String>("title").unwrap_or_default()))
        .style(
            "color",
            Prop::getter(|d| {
                if d.get::<String>("title").unwrap_or_default().is_empty() {
                    String::new()
                } else {
                    "red".to_string()
                }
            }),
        )
        .attr("href", "#")
        .build()
        .unwrap();

    assert_eq!(doc.attribute(node, "title").as_deref(), Some("hello"));
    assert_eq!(doc.style_property(node, "color").as_deref(), Some("red"));

    title.update(String::new());

    assert!(!doc.has_attribute(node, "title"));
    assert_eq!(doc.style_property(node, "color"), None);
    assert_eq!(doc.attribute(node, "href").as_deref(), Some("#"));
}

#[test]
fn test_misc_property_tracks_dependency() {
    let (env, doc) = setup();
    let text = Store::new("a".to_string());

    let input = Builder::new(&env, "input")
        .dep("text", &text)
        .misc("value", Prop::getter(|d| d.get::<String>("text").unwrap_or_default()))
        .build()
        .unwrap();

    text.update("ab".to_string());
    assert_eq!(doc.property(input, "value").as_deref(), Some("ab"));
    assert_eq!(doc.attribute(input, "value"), None);
}

// =============================================================================
// Handlers
// =============================================================================

#[test]
fn test_handlers_survive_rerender() {
    let (env, doc) = setup();
    let count = Store::new(0);
    let handler_count = count.clone();

    let button = Builder::new(&env, "button")
        .dep("count", &count)
        .render(|deps, _| format!("clicked {}", deps.get::<i32>("count").unwrap_or_default()))
        .on("click", move |_| handler_count.update_with(|n| n + 1))
        .build()
        .unwrap();

    doc.dispatch_event(button, "click");
    doc.dispatch_event(button, "click");

    assert_eq!(count.get(), 2);
    assert_eq!(doc.text_content(button), "clicked 2");
}

// =============================================================================
// Slots
// =============================================================================

#[test]
fn test_slot_child_preserved_across_rerender() {
    let (env, doc) = setup();
    let title = Store::new("One".to_string());

    let child = Builder::new(&env, "aside.panel")
        .content("kept")
        .build()
        .unwrap();
    doc.set_property(child, "scroll", "40");

    let parent = Builder::new(&env, "section")
        .raw()
        .dep("title", &title)
        .render(|deps, _| {
            format!(
                "<h1>{}</h1><x-slot name=\"body\"></x-slot>",
                escape(&deps.get::<String>("title").unwrap_or_default())
            )
        })
        .child("body", child)
        .build()
        .unwrap();

    assert_eq!(doc.query_selector(parent, "aside"), Some(child));

    title.update("Two".to_string());

    assert_eq!(doc.query_selector(parent, "h1").map(|h| doc.text_content(h)).as_deref(), Some("Two"));
    assert_eq!(doc.query_selector(parent, "aside"), Some(child));
    assert_eq!(doc.parent(child), Some(parent));
    assert_eq!(doc.property(child, "scroll").as_deref(), Some("40"));
    assert!(doc.query_selector(parent, "x-slot").is_none());
}

#[test]
fn test_slot_dropped_from_render_detaches_child() {
    let (env, doc) = setup();
    let open = Store::new(true);
    let child = doc.create_element("em");

    let parent = Builder::new(&env, "div")
        .raw()
        .dep("open", &open)
        .render(|deps, _| {
            if deps.get::<bool>("open").unwrap_or_default() {
                "<x-slot name=\"c\"></x-slot>".to_string()
            } else {
                "closed".to_string()
            }
        })
        .children([("c", child)])
        .build()
        .unwrap();

    assert_eq!(doc.parent(child), Some(parent));
    open.update(false);
    assert_eq!(doc.parent(child), None);
    open.update(true);
    assert_eq!(doc.parent(child), Some(parent));
}

// =============================================================================
// Node Reclamation
// =============================================================================

#[test]
fn test_rerenders_reuse_node_storage() {
    let (env, doc) = setup();
    let n = Store::new(0);

    let list = Builder::new(&env, "ul")
        .raw()
        .dep("n", &n)
        .render(|deps, _| {
            let n = deps.get::<i32>("n").unwrap_or_default();
            (0..3).map(|i| format!("<li>{n}.{i}</li>")).collect::<String>()
        })
        .build()
        .unwrap();
    let first_item = doc.query_selector(list, "li").unwrap();
    let live = doc.node_count();

    for i in 1..=1000 {
        n.update(i);
    }

    assert_eq!(doc.node_count(), live);
    assert!(!doc.is_live(first_item));
    assert_eq!(doc.text_content(list), "1000.01000.11000.2");
    assert_ne!(doc.query_selector(list, "li"), Some(first_item));
}

#[test]
fn test_slot_rerenders_reuse_node_storage() {
    let (env, doc) = setup();
    let n = Store::new(0);
    let child = doc.create_element("aside");

    let parent = Builder::new(&env, "section")
        .raw()
        .dep("n", &n)
        .render(|deps, _| {
            format!(
                "<h2>{}</h2><x-slot name=\"s\"></x-slot>",
                deps.get::<i32>("n").unwrap_or_default()
            )
        })
        .child("s", child)
        .build()
        .unwrap();
    let live = doc.node_count();

    for i in 1..=200 {
        n.update(i);
    }

    assert_eq!(doc.node_count(), live);
    assert_eq!(doc.parent(child), Some(parent));
    assert!(doc.is_live(child));
}

// =============================================================================
// Self-managed Renders
// =============================================================================

#[test]
fn test_self_managed_render_keeps_content() {
    let (env, doc) = setup();
    let items = ListStore::new(vec!["a".to_string()]);

    let list = Builder::new(&env, "ul")
        .dep("items", &items)
        .render(|_, ctx| {
            let doc = ctx.env().document();
            let Some(trigger) = ctx.trigger() else {
                let initial = ctx.builder().raw().content("<li>a</li>").build();
                assert!(initial.is_ok());
                return;
            };
            if let Some(ListEvent::Append { value, .. }) = trigger.event::<ListEvent<String>>() {
                let li = doc.create_element("li");
                doc.set_inner_html(li, &escape(value));
                doc.append_child(ctx.node(), li);
            }
        })
        .build()
        .unwrap();

    let first = doc.query_selector(list, "li");
    items.push("b".to_string());

    assert_eq!(doc.inner_html(list), "<li>a</li><li>b</li>");
    assert_eq!(doc.query_selector(list, "li"), first);
    assert!(doc.has_attribute(list, "data-self-managed"));
}

#[test]
fn test_switching_back_to_html_clears_marker() {
    let (env, doc) = setup();
    let manual = Store::new(true);

    let node = Builder::new(&env, "div")
        .dep("manual", &manual)
        .render(|deps, _| {
            if deps.get::<bool>("manual").unwrap_or_default() {
                None
            } else {
                Some("generated".to_string())
            }
        })
        .build()
        .unwrap();

    assert!(doc.has_attribute(node, "data-self-managed"));
    manual.update(false);
    assert!(!doc.has_attribute(node, "data-self-managed"));
    assert_eq!(doc.text_content(node), "generated");
}

// =============================================================================
// Finalize
// =============================================================================

#[test]
fn test_gimme_null_slot_keeps_positions() {
    let (env, _doc) = setup();

    let built = Builder::new(&env, "form")
        .raw()
        .content("<input name=\"q\"><button>go</button>")
        .gimme(["input", "select", "button"])
        .done()
        .unwrap();

    let [input, select, button] = built.found[..] else {
        panic!("expected three slots, got {:?}", built.found);
    };
    assert!(input.is_some());
    assert_eq!(select, None);
    assert!(button.is_some());
    assert_ne!(input, button);
}

#[test]
fn test_malformed_descriptor_is_an_error() {
    let (env, doc) = setup();
    let before = doc.children(doc.root()).len();

    let err = Builder::new(&env, "div.card#main").done().unwrap_err();

    assert!(matches!(err, Error::MalformedDescriptor { .. }));
    assert_eq!(doc.children(doc.root()).len(), before);
}

#[test]
fn test_disposed_dependency_stops_rerender() {
    let (env, doc) = setup();
    let n = Store::new(1);

    let node = Builder::new(&env, "span")
        .dep("n", &n)
        .render(|deps, _| deps.get::<i32>("n").unwrap_or_default().to_string())
        .build()
        .unwrap();

    n.dispose();
    n.update(9);

    assert_eq!(doc.text_content(node), "1");
}

#[test]
fn test_dropped_store_releases_binding() {
    let (env, doc) = setup();
    let n = Store::new(1);
    let weak = n.downgrade();

    let built = Builder::new(&env, "span")
        .dep("n", &n)
        .render(|deps, _| deps.get::<i32>("n").unwrap_or(-1).to_string())
        .done()
        .unwrap();

    drop(n);

    assert!(weak.upgrade().is_none());
    assert_eq!(doc.text_content(built.node), "1");
}

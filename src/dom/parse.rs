//! HTML fragment parsing for the memory document.
//!
//! Markup goes through `scraper` (html5ever), so implied end tags, raw-text
//! elements, entities and error recovery follow the HTML parsing algorithm.
//! The result is a plain tree the arena materializes node by node.

use scraper::{ElementRef, Html, Node};

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Parsed {
    Element {
        tag: String,
        attrs: Vec<(String, String)>,
        children: Vec<Parsed>,
    },
    Text(String),
}

/// Parse `html` as the children of a `<body>` element.
pub(crate) fn parse_fragment(html: &str) -> Vec<Parsed> {
    let fragment = Html::parse_fragment(html);
    convert(fragment.root_element())
}

fn convert(element: ElementRef<'_>) -> Vec<Parsed> {
    let mut out: Vec<Parsed> = Vec::new();
    for child in element.children() {
        match child.value() {
            Node::Text(text) => match out.last_mut() {
                // html5ever never splits a run, but a dropped comment can.
                Some(Parsed::Text(previous)) => previous.push_str(&**text),
                _ => out.push(Parsed::Text((**text).to_owned())),
            },
            Node::Element(el) => {
                let Some(child_ref) = ElementRef::wrap(child) else {
                    continue;
                };
                out.push(Parsed::Element {
                    tag: el.name().to_string(),
                    attrs: el
                        .attrs()
                        .map(|(name, value)| (name.to_string(), value.to_string()))
                        .collect(),
                    children: convert(child_ref),
                });
            }
            _ => {}
        }
    }
    out
}

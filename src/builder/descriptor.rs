//! Element descriptor parsing: `tag#id.class-a.class-b`.

use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Descriptor {
    pub tag: String,
    pub id: Option<String>,
    pub classes: Vec<String>,
}

fn malformed(descriptor: &str, reason: impl Into<String>) -> Error {
    Error::MalformedDescriptor {
        descriptor: descriptor.to_string(),
        reason: reason.into(),
    }
}

fn is_name(s: &str) -> bool {
    s.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

/// Parse a descriptor. An empty tag means `div`.
///
/// The id must come before the classes; an id marker inside a class
/// segment (`div.a#b`) is rejected.
pub(crate) fn parse(descriptor: &str) -> Result<Descriptor> {
    let (head, class_part) = match descriptor.split_once('.') {
        Some((head, rest)) => (head, Some(rest)),
        None => (descriptor, None),
    };

    let (tag, id) = match head.split_once('#') {
        Some((tag, id)) => {
            if id.is_empty() {
                return Err(malformed(descriptor, "empty id"));
            }
            if id.contains('#') {
                return Err(malformed(descriptor, "more than one id marker"));
            }
            (tag, Some(id.to_string()))
        }
        None => (head, None),
    };

    let tag = if tag.is_empty() { "div" } else { tag };
    if !tag.starts_with(|c: char| c.is_ascii_alphabetic()) || !is_name(tag) {
        return Err(malformed(descriptor, format!("invalid tag `{tag}`")));
    }
    if let Some(id) = &id {
        if !is_name(id) {
            return Err(malformed(descriptor, format!("invalid id `{id}`")));
        }
    }

    let mut classes = Vec::new();
    for segment in class_part.into_iter().flat_map(|rest| rest.split('.')) {
        if segment.contains('#') {
            return Err(malformed(
                descriptor,
                format!("class segment `{segment}` contains an id marker; put the id before the classes"),
            ));
        }
        if segment.is_empty() {
            continue;
        }
        if !is_name(segment) {
            return Err(malformed(descriptor, format!("invalid class `{segment}`")));
        }
        classes.push(segment.to_string());
    }

    Ok(Descriptor {
        tag: tag.to_ascii_lowercase(),
        id,
        classes,
    })
}

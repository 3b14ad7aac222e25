//! Child-slot mounting.
//!
//! A slot is a placeholder element (`<x-slot name="...">` by default) in the
//! rendered content. Mounting replaces the placeholder with the external
//! child node. Before content is overwritten the mounted children are
//! detached, and after it is regenerated they are spliced back into the
//! fresh placeholders, so the same nodes survive every re-render.

use crate::config::Env;
use crate::dom::NodeId;

/// Detach every mounted child so an overwrite of `node` cannot strand it.
pub(crate) fn park(env: &Env, slots: &[(String, NodeId)]) {
    let doc = env.document();
    for (_, child) in slots {
        doc.remove(*child);
    }
}

/// Move each child into its placeholder under `node`; the spent
/// placeholder is released.
///
/// A child whose placeholder is missing is left where it is, unless it is
/// already inside `node` (a self-managed render may have kept it).
pub(crate) fn splice(env: &Env, node: NodeId, slots: &[(String, NodeId)]) {
    let doc = env.document();
    let config = env.config();
    for (name, child) in slots {
        match doc.query_selector(node, &config.slot_selector(name)) {
            Some(placeholder) => {
                doc.replace_with(placeholder, *child);
                doc.release(placeholder);
            }
            None if doc.contains(node, *child) => {}
            None => tracing::debug!(?node, slot = %name, "slot placeholder not found"),
        }
    }
}

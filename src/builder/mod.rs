//! Element builder - fluent construction of store-bound DOM nodes.
//!
//! A [`Builder`] accumulates content, attributes, styles, classes, handlers,
//! dependencies and child slots, then [`Builder::done`] materializes the
//! node. Every event from a declared dependency re-runs the render function
//! and reconciles the same live node in place. The node is never replaced.
//!
//! # Pattern: Explicit Dependencies
//!
//! There is no automatic dependency tracking. A render function sees only
//! what was declared with [`Builder::dep`] / [`Builder::deps`], keyed by the
//! declared name:
//!
//! ```ignore
//! let n = Store::new(0);
//! let node = Builder::new(&env, "span")
//!     .dep("n", &n)
//!     .render(|deps, _| format!("v{}", deps.get::<i32>("n").unwrap_or(0)))
//!     .build()?;
//!
//! n.update(2); // node now reads "v2"
//! ```
//!
//! # Pattern: Slots
//!
//! Externally built nodes are mounted into `<x-slot name="...">`
//! placeholders and survive re-renders of the parent:
//!
//! ```ignore
//! let parent = Builder::new(&env, "section")
//!     .raw()
//!     .dep("title", &title)
//!     .render(|deps, _| format!("<h1>{}</h1><x-slot name=\"body\"></x-slot>",
//!         escape(&deps.get::<String>("title").unwrap_or_default())))
//!     .child("body", body_node)
//!     .build()?;
//! ```

mod binding;
mod context;
mod descriptor;
mod element;
mod props;
mod slots;

pub use context::{Deps, RenderContext, Trigger};
pub use element::{Builder, Built};
pub use props::{Condition, Prop, Rendered};

/// Cleanup function returned by [`Built::cleanup`].
pub type Cleanup = Box<dyn FnOnce()>;

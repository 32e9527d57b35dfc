//! In-memory DOM
//!
//! The binding engine needs a tree to bind against. This module provides a
//! small one with just the surface the engine consumes:
//!
//! - element vs. text discrimination, ordered attributes, child lists
//! - insertion (fragments move their children), removal, replacement
//! - deep cloning for list templates
//! - event listeners with bubbling
//! - a class-list helper and attribute carry-over for `data-replace`
//! - markup parsing (via `tl`) and serialization
//!
//! It is not a browser DOM: there is no layout, no styles and no scripts.

mod classes;
mod event;
mod html;
mod node;

pub use classes::{carry, classes, ClassList};
pub use event::{Event, EventListener};
pub use html::{parse_fragment, parse_html};
pub use node::{ListenerId, Node, NodeKind};

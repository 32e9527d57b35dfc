//! Rebind Core
//!
//! This crate provides the core runtime for the Rebind template binding
//! engine. Given a DOM subtree and a data model, it discovers declarative
//! bindings and keeps the DOM in sync with model changes. There is no
//! virtual DOM and no compile step: every binding re-renders itself, and
//! only itself, when a path it reads changes.
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - `dom`: a small in-memory DOM with an HTML parser
//! - `model`: dynamic values, observable objects and lists, model adapters
//! - `expr`: the `{expr}` interpolation compiler
//! - `reactive`: views, the change bus and the tree walker
//! - `binding`: attribute, text and directive bindings, including `each`
//!
//! # Example
//!
//! ```rust,ignore
//! use rebind_core::{Object, ReactiveOptions, View};
//!
//! let model = Object::new().with("name", "Ann");
//! let view = View::from_html("<p>Hello {name}!</p>", model, ReactiveOptions::new())?;
//! assert_eq!(view.el().text_content(), "Hello Ann!");
//!
//! view.set("name", "Bo")?;
//! assert_eq!(view.el().text_content(), "Hello Bo!");
//! ```

pub mod binding;
pub mod dom;
pub mod error;
pub mod expr;
pub mod model;
pub mod reactive;

pub use binding::{Binding, Directive, Directives};
pub use dom::{Event, Node};
pub use error::{ReactiveError, Result};
pub use expr::{ExpressionError, Template};
pub use model::{Adapter, AdapterFactory, List, Object, Value};
pub use reactive::{Handler, ReactiveOptions, View};

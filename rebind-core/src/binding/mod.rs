//! Bindings
//!
//! A binding is a live link between a DOM location and the property paths it
//! renders. Three kinds exist:
//!
//! - [`AttrBinding`]: an attribute value containing `{expr}` markers
//! - [`TextBinding`]: a text node containing markers
//! - [`Binding`]: a named directive applied to an element
//!
//! Built-in directives live in `builtins`; the list directive, `each`, has a
//! module of its own.

mod attr;
mod builtins;
mod directive;
mod each;
mod text;

pub use attr::AttrBinding;
pub use builtins::{ATTRIBUTES, EVENTS};
pub use directive::{Binding, Directive, Directives};
pub use text::TextBinding;

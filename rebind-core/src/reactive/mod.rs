//! Reactive core
//!
//! This module connects model changes to DOM updates.
//!
//! # Concepts
//!
//! ## Handlers
//!
//! A [`Handler`] is a change callback with a stable identity. The same
//! handler is registered with a view's bus and (wrapped) with the model
//! adapter, and the shared id lets both registrations be removed together.
//!
//! ## Views
//!
//! A [`View`] owns a DOM root, a model adapter and an [`Emitter`] bus keyed
//! by `"change <path>"`. Construction walks the tree with [`walk`] and
//! installs bindings; each binding subscribes to the paths its template reads.
//!
//! ## The internal-set guard
//!
//! Writes made through [`View::set`] notify the bus directly. The
//! [`InternalSet`] guard stops the model from notifying the same view a
//! second time through the adapter.
//!
//! # Implementation Notes
//!
//! Everything is single-threaded: `Rc`, `RefCell` and `Cell` throughout, and
//! updates run synchronously inside the call that triggered them. There is
//! no batching or scheduling.

mod context;
mod emitter;
mod options;
mod subscriber;
mod view;
mod walk;

pub use context::{InternalSet, InternalSetScope};
pub use emitter::Emitter;
pub use options::ReactiveOptions;
pub use subscriber::{Handler, HandlerId};
pub use view::{View, WeakView};
pub use walk::{walk, Walk};

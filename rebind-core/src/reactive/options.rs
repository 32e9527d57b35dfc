//! View construction options.

use crate::binding::Directives;
use crate::model::{AdapterFactory, Object};

/// Options for [`View::new`](super::View::new).
///
/// ```ignore
/// let options = ReactiveOptions::new()
///     .delegate(handlers)
///     .directives(Directives::builtin().with("data-focus", focus));
/// ```
#[derive(Clone, Default)]
pub struct ReactiveOptions {
    pub(crate) adapter: Option<AdapterFactory>,
    pub(crate) delegate: Option<Object>,
    pub(crate) directives: Option<Directives>,
}

impl ReactiveOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the default [`ObjectAdapter`](crate::model::ObjectAdapter).
    pub fn adapter(mut self, factory: AdapterFactory) -> Self {
        self.adapter = Some(factory);
        self
    }

    /// Object consulted for `on-*` handlers, callables, and as a fallback
    /// for reads the model leaves falsy.
    pub fn delegate(mut self, delegate: Object) -> Self {
        self.delegate = Some(delegate);
        self
    }

    /// Directive registry. Defaults to [`Directives::builtin`]; passing a
    /// registry replaces the built-ins rather than extending them.
    pub fn directives(mut self, directives: Directives) -> Self {
        self.directives = Some(directives);
        self
    }
}

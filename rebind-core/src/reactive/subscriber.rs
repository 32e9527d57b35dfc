//! Change handlers.
//!
//! A Handler is any callback that wants to hear about a path changing: a
//! text or attribute re-render, a directive's render closure, a list
//! binding's refresh. Handlers are compared by id, so the same handler can be
//! registered in several places (the view bus and the model adapter) and
//! removed from each of them later.

use std::fmt;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::error::Result;
use crate::model::Value;

/// Unique identifier for a handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HandlerId(u64);

impl HandlerId {
    /// Generate a new unique handler ID.
    pub fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for HandlerId {
    fn default() -> Self {
        Self::new()
    }
}

/// A change handler.
///
/// Invoked with the new value of the path it is subscribed to. Cloning is
/// cheap and keeps the id.
#[derive(Clone)]
pub struct Handler {
    id: HandlerId,
    notify: Rc<dyn Fn(&Value) -> Result<()>>,
}

impl Handler {
    /// Create a new handler with the given callback.
    pub fn new<F>(notify: F) -> Self
    where
        F: Fn(&Value) -> Result<()> + 'static,
    {
        Self::with_id(HandlerId::new(), notify)
    }

    /// Create a handler that shares identity with another one.
    ///
    /// Used to wrap a handler while keeping it removable through the
    /// original.
    pub fn with_id<F>(id: HandlerId, notify: F) -> Self
    where
        F: Fn(&Value) -> Result<()> + 'static,
    {
        Self {
            id,
            notify: Rc::new(notify),
        }
    }

    pub fn id(&self) -> HandlerId {
        self.id
    }

    /// Run the callback.
    pub fn call(&self, value: &Value) -> Result<()> {
        (self.notify)(value)
    }
}

impl PartialEq for Handler {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Handler {}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Handler").field(&self.id).finish()
    }
}

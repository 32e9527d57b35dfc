//! Named-event emitter.
//!
//! Backs both the per-view bus and observable model objects. Events are plain
//! strings (`"change name"`, `"destroyed"`); handlers are kept per event in
//! registration order.
//!
//! # How It Works
//!
//! `emit` snapshots the handler list before invoking anything, so handlers
//! may freely subscribe or unsubscribe (on this or any other event) while an
//! emission is running. `once` handlers are dropped from the registry before
//! they run.

use std::cell::RefCell;
use std::rc::Rc;

use indexmap::IndexMap;
use tracing::trace;

use super::subscriber::Handler;
use crate::error::Result;
use crate::model::Value;

#[derive(Clone)]
struct Listener {
    handler: Handler,
    once: bool,
}

/// A shared event emitter. Clones share the same registry.
#[derive(Clone, Default)]
pub struct Emitter {
    events: Rc<RefCell<IndexMap<String, Vec<Listener>>>>,
}

impl Emitter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` for `event`.
    pub fn on(&self, event: &str, handler: Handler) {
        self.push(event, handler, false);
    }

    /// Register `handler` for the next emission of `event` only.
    pub fn once(&self, event: &str, handler: Handler) {
        self.push(event, handler, true);
    }

    fn push(&self, event: &str, handler: Handler, once: bool) {
        self.events
            .borrow_mut()
            .entry(event.to_string())
            .or_default()
            .push(Listener { handler, once });
    }

    /// Remove the first registration of `handler` for `event`.
    ///
    /// Returns whether anything was removed.
    pub fn off(&self, event: &str, handler: &Handler) -> bool {
        let mut events = self.events.borrow_mut();
        let Some(listeners) = events.get_mut(event) else {
            return false;
        };
        let Some(pos) = listeners.iter().position(|l| l.handler == *handler) else {
            return false;
        };
        listeners.remove(pos);
        if listeners.is_empty() {
            events.shift_remove(event);
        }
        true
    }

    /// Remove every handler for `event`.
    pub fn off_event(&self, event: &str) {
        self.events.borrow_mut().shift_remove(event);
    }

    /// Remove every handler.
    pub fn clear(&self) {
        self.events.borrow_mut().clear();
    }

    /// Invoke the handlers of `event` with `value`, in registration order.
    ///
    /// Stops at the first handler error and returns it.
    pub fn emit(&self, event: &str, value: &Value) -> Result<()> {
        let snapshot: Vec<Listener> = {
            let mut events = self.events.borrow_mut();
            let Some(listeners) = events.get_mut(event) else {
                return Ok(());
            };
            let snapshot = listeners.clone();
            listeners.retain(|l| !l.once);
            if listeners.is_empty() {
                events.shift_remove(event);
            }
            snapshot
        };

        trace!(target: "rebind", event, handlers = snapshot.len(), "emit");
        for listener in &snapshot {
            listener.handler.call(value)?;
        }
        Ok(())
    }

    /// Handlers currently registered for `event`.
    pub fn listeners(&self, event: &str) -> Vec<Handler> {
        self.events
            .borrow()
            .get(event)
            .map(|ls| ls.iter().map(|l| l.handler.clone()).collect())
            .unwrap_or_default()
    }

    pub fn has_listeners(&self, event: &str) -> bool {
        self.events
            .borrow()
            .get(event)
            .is_some_and(|ls| !ls.is_empty())
    }

    /// Total number of registrations across all events.
    pub fn listener_count(&self) -> usize {
        self.events.borrow().values().map(Vec::len).sum()
    }
}

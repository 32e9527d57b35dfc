//! DOM events.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use super::node::Node;
use crate::error::Result;

/// A listener attached to a node with `Node::add_event_listener`.
pub type EventListener = Rc<dyn Fn(&Event) -> Result<()>>;

/// An event dispatched through the tree.
#[derive(Debug)]
pub struct Event {
    event_type: String,
    default_prevented: Cell<bool>,
    propagation_stopped: Cell<bool>,
    target: RefCell<Option<Node>>,
}

impl Event {
    pub fn new(event_type: impl Into<String>) -> Self {
        Self {
            event_type: event_type.into(),
            default_prevented: Cell::new(false),
            propagation_stopped: Cell::new(false),
            target: RefCell::new(None),
        }
    }

    pub fn event_type(&self) -> &str {
        &self.event_type
    }

    pub fn prevent_default(&self) {
        self.default_prevented.set(true);
    }

    pub fn default_prevented(&self) -> bool {
        self.default_prevented.get()
    }

    /// Stop bubbling after the current node's listeners have run.
    pub fn stop_propagation(&self) {
        self.propagation_stopped.set(true);
    }

    pub fn propagation_stopped(&self) -> bool {
        self.propagation_stopped.get()
    }

    /// The node the event was dispatched at.
    pub fn target(&self) -> Option<Node> {
        self.target.borrow().clone()
    }

    pub(crate) fn set_target(&self, node: &Node) {
        *self.target.borrow_mut() = Some(node.clone());
    }
}

//! DOM Nodes
//!
//! A `Node` is a cheap, clonable handle to a shared tree node. Parents own their
//! children through strong handles; children point back through a weak link, so
//! dropping the last handle to a detached subtree frees it.
//!
//! Only the operations the binding engine needs are implemented: element/text
//! discrimination, ordered attributes, child-list edits, deep cloning, text
//! data, and event listeners.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};
use std::sync::atomic::{AtomicU64, Ordering};

use indexmap::IndexMap;

use super::event::{Event, EventListener};
use crate::error::Result;

/// The kind of a node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    /// An element with a lower-cased tag name.
    Element(String),
    /// A text node; its character data lives in the node.
    Text,
    /// A fragment. Inserting a fragment moves its children instead.
    Fragment,
}

/// Identifier returned by `add_event_listener`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

impl ListenerId {
    fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

struct NodeInner {
    kind: NodeKind,
    parent: RefCell<Weak<NodeInner>>,
    children: RefCell<Vec<Node>>,
    attributes: RefCell<IndexMap<String, String>>,
    data: RefCell<String>,
    listeners: RefCell<Vec<(ListenerId, String, EventListener)>>,
}

/// Handle to a node in a DOM tree.
///
/// Equality is identity: two handles are equal when they point at the same node.
#[derive(Clone)]
pub struct Node(Rc<NodeInner>);

impl Node {
    fn with_kind(kind: NodeKind) -> Self {
        Self(Rc::new(NodeInner {
            kind,
            parent: RefCell::new(Weak::new()),
            children: RefCell::new(Vec::new()),
            attributes: RefCell::new(IndexMap::new()),
            data: RefCell::new(String::new()),
            listeners: RefCell::new(Vec::new()),
        }))
    }

    /// Create a detached element.
    pub fn element(tag: &str) -> Self {
        Self::with_kind(NodeKind::Element(tag.to_ascii_lowercase()))
    }

    /// Create a detached text node.
    pub fn text(data: impl Into<String>) -> Self {
        let node = Self::with_kind(NodeKind::Text);
        *node.0.data.borrow_mut() = data.into();
        node
    }

    /// Create an empty fragment.
    pub fn fragment() -> Self {
        Self::with_kind(NodeKind::Fragment)
    }

    pub fn kind(&self) -> &NodeKind {
        &self.0.kind
    }

    pub fn is_element(&self) -> bool {
        matches!(self.0.kind, NodeKind::Element(_))
    }

    pub fn is_text(&self) -> bool {
        self.0.kind == NodeKind::Text
    }

    pub fn is_fragment(&self) -> bool {
        self.0.kind == NodeKind::Fragment
    }

    /// The tag name, for elements.
    pub fn tag_name(&self) -> Option<&str> {
        match &self.0.kind {
            NodeKind::Element(tag) => Some(tag),
            _ => None,
        }
    }

    // ------------------------------------------------------------------
    // Tree structure
    // ------------------------------------------------------------------

    pub fn parent(&self) -> Option<Node> {
        self.0.parent.borrow().upgrade().map(Node)
    }

    /// A snapshot of the child list.
    ///
    /// Later edits to the tree do not affect the returned vector.
    pub fn children(&self) -> Vec<Node> {
        self.0.children.borrow().clone()
    }

    pub fn child_count(&self) -> usize {
        self.0.children.borrow().len()
    }

    pub fn first_child(&self) -> Option<Node> {
        self.0.children.borrow().first().cloned()
    }

    fn position_of(&self, child: &Node) -> Option<usize> {
        self.0.children.borrow().iter().position(|c| c == child)
    }

    /// Take the nodes to insert: a fragment gives up its children, anything
    /// else is first detached from its current parent.
    fn take_insertable(node: &Node) -> Vec<Node> {
        if node.is_fragment() {
            let moved: Vec<Node> = node.0.children.borrow_mut().drain(..).collect();
            for child in &moved {
                *child.0.parent.borrow_mut() = Weak::new();
            }
            moved
        } else {
            node.detach();
            vec![node.clone()]
        }
    }

    /// Append `child` (or a fragment's children) at the end of the child list.
    pub fn append_child(&self, child: &Node) {
        self.insert_before(child, None);
    }

    /// Insert `child` before `reference`, or at the end when `reference` is
    /// `None` or not a child of this node.
    pub fn insert_before(&self, child: &Node, reference: Option<&Node>) {
        let nodes = Self::take_insertable(child);
        let index = reference
            .and_then(|r| self.position_of(r))
            .unwrap_or_else(|| self.child_count());

        for node in &nodes {
            *node.0.parent.borrow_mut() = Rc::downgrade(&self.0);
        }
        let mut children = self.0.children.borrow_mut();
        for (offset, node) in nodes.into_iter().enumerate() {
            children.insert(index + offset, node);
        }
    }

    /// Remove `child` from this node. Returns false if it was not a child.
    pub fn remove_child(&self, child: &Node) -> bool {
        let Some(index) = self.position_of(child) else {
            return false;
        };
        self.0.children.borrow_mut().remove(index);
        *child.0.parent.borrow_mut() = Weak::new();
        true
    }

    /// Put `new` where `old` is. Returns false if `old` was not a child.
    pub fn replace_child(&self, new: &Node, old: &Node) -> bool {
        if self.position_of(old).is_none() {
            return false;
        }
        self.insert_before(new, Some(old));
        self.remove_child(old)
    }

    /// Remove this node from its parent, if it has one.
    pub fn detach(&self) {
        if let Some(parent) = self.parent() {
            parent.remove_child(self);
        }
    }

    /// Remove every child.
    pub fn clear_children(&self) {
        let removed: Vec<Node> = self.0.children.borrow_mut().drain(..).collect();
        for child in removed {
            *child.0.parent.borrow_mut() = Weak::new();
        }
    }

    /// Copy this node. Attributes and text are copied, listeners are not.
    pub fn clone_node(&self, deep: bool) -> Node {
        let copy = Node::with_kind(self.0.kind.clone());
        *copy.0.attributes.borrow_mut() = self.0.attributes.borrow().clone();
        *copy.0.data.borrow_mut() = self.0.data.borrow().clone();
        if deep {
            for child in self.children() {
                copy.append_child(&child.clone_node(true));
            }
        }
        copy
    }

    /// Every descendant in document order, excluding this node.
    pub fn descendants(&self) -> Vec<Node> {
        let mut out = Vec::new();
        let mut stack: Vec<Node> = self.children().into_iter().rev().collect();
        while let Some(node) = stack.pop() {
            stack.extend(node.children().into_iter().rev());
            out.push(node);
        }
        out
    }

    /// Descendant elements carrying attribute `name`, in document order.
    pub fn query_all_with_attribute(&self, name: &str) -> Vec<Node> {
        self.descendants()
            .into_iter()
            .filter(|n| n.has_attribute(name))
            .collect()
    }

    // ------------------------------------------------------------------
    // Attributes
    // ------------------------------------------------------------------

    pub fn attribute(&self, name: &str) -> Option<String> {
        self.0.attributes.borrow().get(name).cloned()
    }

    pub fn has_attribute(&self, name: &str) -> bool {
        self.0.attributes.borrow().contains_key(name)
    }

    /// Set an attribute. A new attribute goes last; an existing one keeps its position.
    pub fn set_attribute(&self, name: &str, value: impl Into<String>) {
        if !self.is_element() {
            return;
        }
        self.0
            .attributes
            .borrow_mut()
            .insert(name.to_string(), value.into());
    }

    pub fn remove_attribute(&self, name: &str) -> Option<String> {
        self.0.attributes.borrow_mut().shift_remove(name)
    }

    /// Attributes in insertion order.
    pub fn attributes(&self) -> Vec<(String, String)> {
        self.0
            .attributes
            .borrow()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    pub fn attribute_names(&self) -> Vec<String> {
        self.0.attributes.borrow().keys().cloned().collect()
    }

    // ------------------------------------------------------------------
    // Character data
    // ------------------------------------------------------------------

    /// Character data of a text node (empty for other nodes).
    pub fn data(&self) -> String {
        self.0.data.borrow().clone()
    }

    pub fn set_data(&self, data: impl Into<String>) {
        *self.0.data.borrow_mut() = data.into();
    }

    /// Concatenated text of this node and all its descendants.
    pub fn text_content(&self) -> String {
        if self.is_text() {
            return self.data();
        }
        self.descendants()
            .iter()
            .filter(|n| n.is_text())
            .map(|n| n.data())
            .collect()
    }

    /// Replace the children of an element with a single text node.
    pub fn set_text_content(&self, text: &str) {
        if self.is_text() {
            self.set_data(text);
            return;
        }
        self.clear_children();
        if !text.is_empty() {
            self.append_child(&Node::text(text));
        }
    }

    // ------------------------------------------------------------------
    // Events
    // ------------------------------------------------------------------

    /// Register a listener for events of type `event_type`.
    pub fn add_event_listener(&self, event_type: &str, listener: EventListener) -> ListenerId {
        let id = ListenerId::new();
        self.0
            .listeners
            .borrow_mut()
            .push((id, event_type.to_string(), listener));
        id
    }

    pub fn remove_event_listener(&self, id: ListenerId) {
        self.0.listeners.borrow_mut().retain(|(lid, _, _)| *lid != id);
    }

    pub fn listener_count(&self) -> usize {
        self.0.listeners.borrow().len()
    }

    /// Dispatch `event` at this node and bubble it through the ancestors.
    ///
    /// The first listener error stops dispatch and is returned.
    pub fn dispatch_event(&self, event: &Event) -> Result<()> {
        event.set_target(self);
        let mut current = Some(self.clone());
        while let Some(node) = current {
            let listeners: Vec<EventListener> = node
                .0
                .listeners
                .borrow()
                .iter()
                .filter(|(_, ty, _)| ty == event.event_type())
                .map(|(_, _, l)| Rc::clone(l))
                .collect();
            for listener in listeners {
                listener(event)?;
            }
            if event.propagation_stopped() {
                break;
            }
            current = node.parent();
        }
        Ok(())
    }

    /// Raw pointer identity, for hashing and debugging.
    pub fn as_ptr(&self) -> *const () {
        Rc::as_ptr(&self.0) as *const ()
    }
}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for Node {}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0.kind {
            NodeKind::Element(tag) => f
                .debug_struct("Element")
                .field("tag", tag)
                .field("attributes", &*self.0.attributes.borrow())
                .field("children", &self.child_count())
                .finish(),
            NodeKind::Text => f.debug_tuple("Text").field(&*self.0.data.borrow()).finish(),
            NodeKind::Fragment => f
                .debug_struct("Fragment")
                .field("children", &self.child_count())
                .finish(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn append_and_remove_children() {
        let ul = Node::element("UL");
        let a = Node::element("li");
        let b = Node::element("li");

        ul.append_child(&a);
        ul.append_child(&b);
        assert_eq!(ul.tag_name(), Some("ul"));
        assert_eq!(ul.children(), vec![a.clone(), b.clone()]);
        assert_eq!(a.parent(), Some(ul.clone()));

        assert!(ul.remove_child(&a));
        assert!(a.parent().is_none());
        assert_eq!(ul.children(), vec![b.clone()]);
        assert!(!ul.remove_child(&a));
    }

    #[test]
    fn insert_before_moves_fragment_children() {
        let parent = Node::element("div");
        let anchor = Node::text("");
        parent.append_child(&anchor);

        let frag = Node::fragment();
        let one = Node::text("1");
        let two = Node::text("2");
        frag.append_child(&one);
        frag.append_child(&two);

        parent.insert_before(&frag, Some(&anchor));
        assert_eq!(frag.child_count(), 0);
        assert_eq!(parent.children(), vec![one.clone(), two, anchor]);
        assert_eq!(one.parent(), Some(parent));
    }

    #[test]
    fn insert_moves_node_between_parents() {
        let left = Node::element("div");
        let right = Node::element("div");
        let child = Node::element("span");

        left.append_child(&child);
        right.append_child(&child);
        assert_eq!(left.child_count(), 0);
        assert_eq!(right.children(), vec![child.clone()]);
        assert_eq!(child.parent(), Some(right));
    }

    #[test]
    fn replace_child_keeps_position() {
        let parent = Node::element("div");
        let a = Node::element("a");
        let b = Node::element("b");
        let c = Node::element("i");
        parent.append_child(&a);
        parent.append_child(&b);

        assert!(parent.replace_child(&c, &a));
        assert_eq!(parent.children(), vec![c, b]);
        assert!(a.parent().is_none());
    }

    #[test]
    fn deep_clone_copies_attributes_and_text() {
        let li = Node::element("li");
        li.set_attribute("class", "item");
        li.append_child(&Node::text("{name}"));

        let copy = li.clone_node(true);
        assert_ne!(copy, li);
        assert_eq!(copy.attribute("class").as_deref(), Some("item"));
        assert_eq!(copy.text_content(), "{name}");

        copy.set_attribute("class", "other");
        assert_eq!(li.attribute("class").as_deref(), Some("item"));

        let shallow = li.clone_node(false);
        assert_eq!(shallow.child_count(), 0);
    }

    #[test]
    fn attributes_keep_insertion_order() {
        let el = Node::element("input");
        el.set_attribute("type", "text");
        el.set_attribute("name", "q");
        el.set_attribute("type", "search");
        assert_eq!(
            el.attributes(),
            vec![
                ("type".to_string(), "search".to_string()),
                ("name".to_string(), "q".to_string()),
            ]
        );
        assert_eq!(el.remove_attribute("type").as_deref(), Some("search"));
        assert!(!el.has_attribute("type"));
    }

    #[test]
    fn text_content_round_trip() {
        let p = Node::element("p");
        p.append_child(&Node::text("a"));
        let b = Node::element("b");
        b.append_child(&Node::text("b"));
        p.append_child(&b);
        assert_eq!(p.text_content(), "ab");

        p.set_text_content("plain");
        assert_eq!(p.child_count(), 1);
        assert_eq!(p.text_content(), "plain");

        p.set_text_content("");
        assert_eq!(p.child_count(), 0);
    }

    #[test]
    fn query_by_attribute_excludes_self() {
        let root = Node::element("div");
        root.set_attribute("data-x", "");
        let a = Node::element("span");
        a.set_attribute("data-x", "1");
        let b = Node::element("span");
        let c = Node::element("em");
        c.set_attribute("data-x", "2");
        b.append_child(&c);
        root.append_child(&a);
        root.append_child(&b);

        assert_eq!(root.query_all_with_attribute("data-x"), vec![a, c]);
    }

    #[test]
    fn events_bubble_to_ancestors() {
        let outer = Node::element("div");
        let inner = Node::element("button");
        outer.append_child(&inner);

        let hits = Rc::new(Cell::new(0));
        let hits_outer = hits.clone();
        outer.add_event_listener(
            "click",
            Rc::new(move |_: &Event| {
                hits_outer.set(hits_outer.get() + 10);
                Ok(())
            }),
        );
        let hits_inner = hits.clone();
        let id = inner.add_event_listener(
            "click",
            Rc::new(move |_: &Event| {
                hits_inner.set(hits_inner.get() + 1);
                Ok(())
            }),
        );

        inner.dispatch_event(&Event::new("click")).unwrap();
        assert_eq!(hits.get(), 11);

        inner.remove_event_listener(id);
        inner.dispatch_event(&Event::new("click")).unwrap();
        assert_eq!(hits.get(), 21);

        inner.dispatch_event(&Event::new("keyup")).unwrap();
        assert_eq!(hits.get(), 21);
    }
}

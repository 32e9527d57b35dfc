//! List binding (`each`).
//!
//! The element carrying `each` becomes a template. It is pulled out of the
//! tree and replaced by an empty text node (the placeholder). Every list item
//! gets a deep clone of the template bound to its own child [`View`], with the
//! item as model; clones sit in list order right before the placeholder.
//!
//! # How It Works
//!
//! Two kinds of update keep the clones in line with the list:
//!
//! - **Full replace**, when the list property itself changes: every child view
//!   is destroyed and the clones are rebuilt from scratch.
//! - **Splice**, when the observed [`List`] is mutated in place: only the
//!   inserted items get new views, only the removed ones are destroyed, and
//!   `"<prop>.length"` is notified on the owning view.
//!
//! New child views are always built before anything else changes. If one
//! fails to bind, the views built so far are destroyed and the error
//! propagates: a splice is then cancelled before the list storage changes,
//! and a replace keeps the previous children. Inserted clones are collected
//! in a fragment and inserted in one step.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use tracing::{debug, trace};

use super::directive::Binding;
use crate::dom::Node;
use crate::error::{ReactiveError, Result};
use crate::model::{List, ListObserver, Splice, Value};
use crate::reactive::{Handler, HandlerId, ReactiveOptions, View, WeakView};

/// Parsed `each` attribute: `prop`, `alias in prop` or `alias, index in prop`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct EachExpr {
    pub alias: String,
    pub prop: String,
}

impl EachExpr {
    pub fn parse(value: &str) -> Result<Self> {
        let invalid = || ReactiveError::InvalidEach {
            value: value.to_string(),
        };
        let tokens: Vec<&str> = value.split_whitespace().collect();

        let (alias, prop) = match tokens.as_slice() {
            [prop] => (*prop, *prop),
            [alias, "in", prop] => (*alias, *prop),
            [alias, _, "in", prop] if alias.ends_with(',') => (*alias, *prop),
            _ => return Err(invalid()),
        };

        let alias = alias.split(',').next().unwrap_or_default();
        if alias.is_empty() || prop.contains(',') {
            return Err(invalid());
        }
        Ok(Self {
            alias: alias.to_string(),
            prop: prop.to_string(),
        })
    }
}

struct ListBinding {
    view: WeakView,
    prop: String,
    template: Node,
    parent: Node,
    placeholder: Node,
    children: RefCell<Vec<View>>,
    observed: RefCell<Option<(List, HandlerId)>>,
    /// Views built for a splice that the list has not committed yet.
    pending: RefCell<Option<(Node, Vec<View>)>>,
}

impl ListBinding {
    /// Rebuild from whatever the owning view holds at `prop` now.
    fn refresh(self: &Rc<Self>) -> Result<()> {
        let Some(view) = self.view.upgrade() else {
            return Ok(());
        };
        self.replace(&view, view.get(&self.prop))
    }

    fn replace(self: &Rc<Self>, view: &View, value: Value) -> Result<()> {
        let list = match value {
            Value::List(list) => list,
            _ => List::new(),
        };
        let (fragment, children) = self.build(view, &list.to_vec())?;
        self.teardown()?;

        let id = list.observe(Rc::new(Observer(Rc::downgrade(self))));
        *self.observed.borrow_mut() = Some((list.clone(), id));

        trace!(target: "rebind", prop = %self.prop, len = list.len(), "each replace");
        self.parent.insert_before(&fragment, Some(&self.placeholder));
        *self.children.borrow_mut() = children;
        Ok(())
    }

    fn prepare(&self, change: &Splice) -> Result<()> {
        let Some(view) = self.view.upgrade() else {
            return Ok(());
        };
        let built = self.build(&view, &change.inserted)?;
        if let Some((_, stale)) = self.pending.replace(Some(built)) {
            discard(stale);
        }
        Ok(())
    }

    fn abort(&self) {
        if let Some((_, children)) = self.pending.take() {
            discard(children);
        }
    }

    fn apply(&self, change: &Splice) -> Result<()> {
        let Some(view) = self.view.upgrade() else {
            return Ok(());
        };
        let Some((fragment, inserted)) = self.pending.take() else {
            return Ok(());
        };
        trace!(
            target: "rebind",
            prop = %self.prop,
            index = change.index,
            removed = change.removed.len(),
            inserted = change.inserted.len(),
            "each splice"
        );

        let anchor = self
            .children
            .borrow()
            .get(change.index)
            .map(|child| child.el().clone())
            .unwrap_or_else(|| self.placeholder.clone());

        let removed: Vec<View> = {
            let mut children = self.children.borrow_mut();
            let start = change.index.min(children.len());
            let end = (start + change.removed.len()).min(children.len());
            children.splice(start..end, inserted).collect()
        };
        self.parent.insert_before(&fragment, Some(&anchor));

        let mut result = Ok(());
        for child in removed {
            if let Err(err) = child.destroy() {
                if result.is_ok() {
                    result = Err(err);
                }
            }
        }
        result?;

        let len = self
            .observed
            .borrow()
            .as_ref()
            .map(|(list, _)| list.len())
            .unwrap_or_default();
        view.notify(&format!("{}.length", self.prop), &Value::from(len))
    }

    /// Bind a child view per item, with the clones parked in a fragment.
    ///
    /// On failure the views built so far are destroyed.
    fn build(&self, view: &View, items: &[Value]) -> Result<(Node, Vec<View>)> {
        let fragment = Node::fragment();
        let mut children = Vec::with_capacity(items.len());
        for item in items {
            match self.child(view, item.clone(), &fragment) {
                Ok(child) => children.push(child),
                Err(err) => {
                    discard(children);
                    return Err(err);
                }
            }
        }
        Ok((fragment, children))
    }

    /// Bind a fresh clone of the template to `item` and park it in
    /// `fragment`.
    fn child(&self, view: &View, item: Value, fragment: &Node) -> Result<View> {
        let clone = self.template.clone_node(true);
        let mut options = ReactiveOptions::new()
            .adapter(view.adapter_factory())
            .directives(view.directives());
        if let Some(delegate) = view.delegate() {
            options = options.delegate(delegate.clone());
        }
        let child = View::new(clone.clone(), item, options)?;
        fragment.append_child(&clone);
        Ok(child)
    }

    /// Stop observing the list and destroy every child view.
    fn teardown(&self) -> Result<()> {
        if let Some((list, id)) = self.observed.take() {
            list.unobserve(id);
        }
        self.abort();
        let children = self.children.take();
        for child in children {
            child.destroy()?;
        }
        Ok(())
    }
}

/// Forwards list changes to a [`ListBinding`] without keeping it alive.
struct Observer(Weak<ListBinding>);

impl ListObserver for Observer {
    fn prepare(&self, change: &Splice) -> Result<()> {
        match self.0.upgrade() {
            Some(binding) => binding.prepare(change),
            None => Ok(()),
        }
    }

    fn abort(&self, _: &Splice) {
        if let Some(binding) = self.0.upgrade() {
            binding.abort();
        }
    }

    fn apply(&self, change: &Splice) -> Result<()> {
        match self.0.upgrade() {
            Some(binding) => binding.apply(change),
            None => Ok(()),
        }
    }
}

/// Destroy views that never made it into the tree.
fn discard(children: Vec<View>) {
    for child in children {
        if let Err(err) = child.destroy() {
            debug!(target: "rebind", %err, "discarding child view");
        }
    }
}

/// The `each` directive.
pub(crate) fn each(binding: &mut Binding, el: &Node, value: &str, _: &Value) -> Result<()> {
    let expr = EachExpr::parse(value)?;
    let Some(view) = binding.view() else {
        return Ok(());
    };
    let parent = el.parent().ok_or(ReactiveError::Detached)?;
    debug!(target: "rebind", alias = %expr.alias, prop = %expr.prop, "bind each");

    el.remove_attribute("each");
    let placeholder = Node::text("");
    parent.insert_before(&placeholder, Some(el));
    parent.remove_child(el);
    binding.skip = true;

    let list = Rc::new(ListBinding {
        view: view.downgrade(),
        prop: expr.prop,
        template: el.clone(),
        parent,
        placeholder,
        children: RefCell::new(Vec::new()),
        observed: RefCell::new(None),
        pending: RefCell::new(None),
    });
    list.replace(&view, view.get(&list.prop))?;

    let on_change = Rc::clone(&list);
    view.sub(&list.prop, Handler::new(move |_| on_change.refresh()));
    let on_destroy = Rc::clone(&list);
    view.on("destroyed", Handler::new(move |_| on_destroy.teardown()));
    Ok(())
}

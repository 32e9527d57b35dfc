//! Observable lists.
//!
//! A `List` is a shared, ordered sequence of values. Every mutation goes
//! through [`List::splice`], which describes the change (index, removed and
//! inserted values) to each observer in two phases:
//!
//! - `prepare` runs before storage changes. Any error aborts the splice, the
//!   observers already prepared are told to `abort`, and storage is untouched.
//! - `apply` runs after storage changes.
//!
//! `each` bindings build their child views in `prepare` and patch the DOM in
//! `apply`, so a child that fails to bind leaves list and DOM in step.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use tracing::trace;

use super::value::Value;
use crate::error::Result;
use crate::reactive::HandlerId;

/// A single structural change.
#[derive(Debug, Clone)]
pub struct Splice {
    /// Position of the change, already clamped to the list length.
    pub index: usize,
    pub removed: Vec<Value>,
    pub inserted: Vec<Value>,
}

/// Receives the structural changes of a [`List`].
pub trait ListObserver {
    /// Called before storage changes. An error cancels the splice.
    fn prepare(&self, _change: &Splice) -> Result<()> {
        Ok(())
    }

    /// Called instead of `apply` when a later observer failed to prepare.
    fn abort(&self, _change: &Splice) {}

    /// Called after storage changes.
    fn apply(&self, change: &Splice) -> Result<()>;
}

impl<F> ListObserver for F
where
    F: Fn(&Splice) -> Result<()>,
{
    fn apply(&self, change: &Splice) -> Result<()> {
        self(change)
    }
}

struct ListInner {
    items: RefCell<Vec<Value>>,
    observers: RefCell<Vec<(HandlerId, Rc<dyn ListObserver>)>>,
}

/// A shared observable list.
#[derive(Clone)]
pub struct List(Rc<ListInner>);

impl List {
    pub fn new() -> Self {
        Self::from_vec(Vec::new())
    }

    pub fn from_vec(items: Vec<Value>) -> Self {
        Self(Rc::new(ListInner {
            items: RefCell::new(items),
            observers: RefCell::new(Vec::new()),
        }))
    }

    pub fn len(&self) -> usize {
        self.0.items.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, index: usize) -> Option<Value> {
        self.0.items.borrow().get(index).cloned()
    }

    /// Snapshot of the current items.
    pub fn to_vec(&self) -> Vec<Value> {
        self.0.items.borrow().clone()
    }

    /// Remove `remove` items at `index` and insert `items` in their place.
    ///
    /// `index` is clamped to the length and `remove` to what is available
    /// after it. Returns the removed items. If an observer fails to prepare,
    /// the list is left as it was and that error is returned.
    pub fn splice(&self, index: usize, remove: usize, items: Vec<Value>) -> Result<Vec<Value>> {
        let change = {
            let storage = self.0.items.borrow();
            let index = index.min(storage.len());
            let end = index.saturating_add(remove).min(storage.len());
            Splice {
                index,
                removed: storage[index..end].to_vec(),
                inserted: items,
            }
        };
        let observers: Vec<Rc<dyn ListObserver>> = self
            .0
            .observers
            .borrow()
            .iter()
            .map(|(_, observer)| Rc::clone(observer))
            .collect();

        for (i, observer) in observers.iter().enumerate() {
            if let Err(err) = observer.prepare(&change) {
                trace!(target: "rebind", index = change.index, "list splice cancelled");
                for prepared in observers[..i].iter().rev() {
                    prepared.abort(&change);
                }
                return Err(err);
            }
        }

        {
            let mut storage = self.0.items.borrow_mut();
            let index = change.index.min(storage.len());
            let end = (index + change.removed.len()).min(storage.len());
            storage
                .splice(index..end, change.inserted.iter().cloned())
                .for_each(drop);
        }
        trace!(
            target: "rebind",
            index = change.index,
            removed = change.removed.len(),
            inserted = change.inserted.len(),
            "list splice"
        );

        // Storage is committed; every observer hears about it even if one fails.
        let mut result = Ok(());
        for observer in &observers {
            if let Err(err) = observer.apply(&change) {
                if result.is_ok() {
                    result = Err(err);
                }
            }
        }
        result.map(|()| change.removed)
    }

    /// Insert `items` at `index`.
    pub fn insert(&self, index: usize, items: Vec<Value>) -> Result<()> {
        self.splice(index, 0, items).map(|_| ())
    }

    /// Remove `count` items starting at `index`.
    pub fn remove_range(&self, index: usize, count: usize) -> Result<Vec<Value>> {
        self.splice(index, count, Vec::new())
    }

    /// Append `items`; returns the new length.
    pub fn append(&self, items: Vec<Value>) -> Result<usize> {
        self.splice(self.len(), 0, items)?;
        Ok(self.len())
    }

    /// Append a single item; returns the new length.
    pub fn push(&self, item: impl Into<Value>) -> Result<usize> {
        self.append(vec![item.into()])
    }

    /// Prepend `items`; returns the new length.
    pub fn unshift(&self, items: Vec<Value>) -> Result<usize> {
        self.splice(0, 0, items)?;
        Ok(self.len())
    }

    /// Remove and return the last item.
    pub fn pop(&self) -> Result<Option<Value>> {
        match self.len() {
            0 => Ok(None),
            len => Ok(self.splice(len - 1, 1, Vec::new())?.pop()),
        }
    }

    /// Remove and return the first item.
    pub fn shift(&self) -> Result<Option<Value>> {
        if self.is_empty() {
            return Ok(None);
        }
        Ok(self.splice(0, 1, Vec::new())?.into_iter().next())
    }

    /// Register a structural-change observer.
    pub fn observe(&self, observer: Rc<dyn ListObserver>) -> HandlerId {
        let id = HandlerId::new();
        self.0.observers.borrow_mut().push((id, observer));
        id
    }

    pub fn unobserve(&self, id: HandlerId) -> bool {
        let mut observers = self.0.observers.borrow_mut();
        let before = observers.len();
        observers.retain(|(other, _)| *other != id);
        observers.len() != before
    }

    pub fn observer_count(&self) -> usize {
        self.0.observers.borrow().len()
    }

    pub fn ptr_eq(&self, other: &List) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl Default for List {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for List {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.0.items.borrow().iter()).finish()
    }
}

impl FromIterator<Value> for List {
    fn from_iter<I: IntoIterator<Item = Value>>(iter: I) -> Self {
        Self::from_vec(iter.into_iter().collect())
    }
}

//! Shared model objects.
//!
//! An `Object` is an ordered map of named slots behind a shared handle. Slots
//! hold plain values, accessors (callables that read when called with no
//! arguments and write when called with one), or event handlers used by
//! `on-*` bindings. Observable objects also carry an [`Emitter`] and emit
//! `"change <key>"` whenever a key is written through [`Object::set`].

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use indexmap::IndexMap;

use super::value::Value;
use crate::dom::Event;
use crate::error::Result;
use crate::reactive::{Emitter, Handler, View};

/// A callable stored in a model.
#[derive(Clone)]
pub struct Function(Rc<dyn Fn(&[Value]) -> Value>);

impl Function {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&[Value]) -> Value + 'static,
    {
        Self(Rc::new(f))
    }

    pub fn call(&self, args: &[Value]) -> Value {
        (self.0)(args)
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Function")
    }
}

/// Handler for `on-<event>` bindings. Receives the event and the view.
pub type EventHandler = Rc<dyn Fn(&Event, &View) -> Result<()>>;

/// A named entry in an object.
#[derive(Clone)]
pub enum Slot {
    Value(Value),
    Accessor(Function),
    Handler(EventHandler),
}

impl fmt::Debug for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Slot::Value(v) => f.debug_tuple("Value").field(v).finish(),
            Slot::Accessor(_) => f.write_str("Accessor"),
            Slot::Handler(_) => f.write_str("Handler"),
        }
    }
}

struct ObjectInner {
    slots: RefCell<IndexMap<String, Slot>>,
    emitter: Option<Emitter>,
}

/// A shared, optionally observable, model object.
#[derive(Clone)]
pub struct Object(Rc<ObjectInner>);

impl Object {
    /// A plain object. Writes are not observable.
    pub fn new() -> Self {
        Self(Rc::new(ObjectInner {
            slots: RefCell::new(IndexMap::new()),
            emitter: None,
        }))
    }

    /// An object that emits `"change <key>"` on every `set`.
    pub fn observable() -> Self {
        Self(Rc::new(ObjectInner {
            slots: RefCell::new(IndexMap::new()),
            emitter: Some(Emitter::new()),
        }))
    }

    /// Wrap the entries of `json` (which should be a JSON object) in an
    /// observable object. Nested objects stay plain.
    pub fn observable_from_json(json: serde_json::Value) -> Self {
        let object = Self::observable();
        if let serde_json::Value::Object(map) = json {
            for (k, v) in map {
                object.insert(&k, Value::from(v));
            }
        }
        object
    }

    pub fn is_observable(&self) -> bool {
        self.0.emitter.is_some()
    }

    /// The change emitter, for observable objects.
    pub fn emitter(&self) -> Option<&Emitter> {
        self.0.emitter.as_ref()
    }

    /// Store a value without notifying anyone.
    pub fn insert(&self, key: &str, value: impl Into<Value>) {
        self.0
            .slots
            .borrow_mut()
            .insert(key.to_string(), Slot::Value(value.into()));
    }

    /// Builder form of [`Object::insert`].
    pub fn with(self, key: &str, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    /// Install an accessor under `key`.
    pub fn with_accessor<F>(self, key: &str, f: F) -> Self
    where
        F: Fn(&[Value]) -> Value + 'static,
    {
        self.0
            .slots
            .borrow_mut()
            .insert(key.to_string(), Slot::Accessor(Function::new(f)));
        self
    }

    /// Install an event handler under `key`.
    pub fn with_handler<F>(self, key: &str, f: F) -> Self
    where
        F: Fn(&Event, &View) -> Result<()> + 'static,
    {
        self.0
            .slots
            .borrow_mut()
            .insert(key.to_string(), Slot::Handler(Rc::new(f)));
        self
    }

    pub fn slot(&self, key: &str) -> Option<Slot> {
        self.0.slots.borrow().get(key).cloned()
    }

    /// Read `key`. Accessors are invoked with no arguments; handlers and
    /// missing keys read as `Undefined`.
    pub fn get(&self, key: &str) -> Value {
        match self.slot(key) {
            Some(Slot::Value(v)) => v,
            Some(Slot::Accessor(f)) => f.call(&[]),
            Some(Slot::Handler(_)) | None => Value::Undefined,
        }
    }

    /// The accessor stored under `key`, if any.
    pub fn function(&self, key: &str) -> Option<Function> {
        match self.slot(key) {
            Some(Slot::Accessor(f)) => Some(f),
            _ => None,
        }
    }

    /// The event handler stored under `key`, if any.
    pub fn handler(&self, key: &str) -> Option<EventHandler> {
        match self.slot(key) {
            Some(Slot::Handler(h)) => Some(h),
            _ => None,
        }
    }

    /// Write `key`.
    ///
    /// An accessor under `key` is called with the value instead of being
    /// overwritten. Observable objects then emit `"change <key>"`.
    pub fn set(&self, key: &str, value: Value) -> Result<()> {
        let accessor = self.function(key);
        match accessor {
            Some(f) => {
                f.call(std::slice::from_ref(&value));
            }
            None => {
                self.0
                    .slots
                    .borrow_mut()
                    .insert(key.to_string(), Slot::Value(value.clone()));
            }
        }

        match &self.0.emitter {
            Some(emitter) => emitter.emit(&format!("change {key}"), &value),
            None => Ok(()),
        }
    }

    pub fn remove(&self, key: &str) -> Option<Slot> {
        self.0.slots.borrow_mut().shift_remove(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.slots.borrow().contains_key(key)
    }

    pub fn keys(&self) -> Vec<String> {
        self.0.slots.borrow().keys().cloned().collect()
    }

    /// Plain-value entries in insertion order. Accessors and handlers are
    /// skipped.
    pub fn entries(&self) -> Vec<(String, Value)> {
        self.0
            .slots
            .borrow()
            .iter()
            .filter_map(|(k, slot)| match slot {
                Slot::Value(v) => Some((k.clone(), v.clone())),
                _ => None,
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.0.slots.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Subscribe to an event on an observable object. No-op on plain ones.
    pub fn on(&self, event: &str, handler: Handler) {
        if let Some(emitter) = &self.0.emitter {
            emitter.on(event, handler);
        }
    }

    pub fn off(&self, event: &str, handler: &Handler) -> bool {
        self.0
            .emitter
            .as_ref()
            .is_some_and(|emitter| emitter.off(event, handler))
    }

    pub fn ptr_eq(&self, other: &Object) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    pub fn downgrade(&self) -> WeakObject {
        WeakObject(Rc::downgrade(&self.0))
    }
}

impl Default for Object {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.0.slots.borrow().iter())
            .finish()
    }
}

/// Non-owning handle to an [`Object`], for accessors that refer back to
/// the object they live in.
#[derive(Clone)]
pub struct WeakObject(Weak<ObjectInner>);

impl WeakObject {
    pub fn upgrade(&self) -> Option<Object> {
        self.0.upgrade().map(Object)
    }
}

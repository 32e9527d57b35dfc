//! Model adapters.
//!
//! A view never touches its model directly; it goes through an [`Adapter`].
//! The adapter decides how dotted paths are read and written and how change
//! subscriptions reach the model. Swapping the adapter (via
//! `ReactiveOptions::adapter`) lets a view bind to any model representation.
//!
//! # How It Works
//!
//! [`ObjectAdapter`] is the default. It walks dotted paths segment by
//! segment: object keys (accessors are invoked), list indices and `length`,
//! and string `length`. Writes go to the parent of the last segment through
//! [`Object::set`], which calls accessors or emits on observable objects.
//! Subscriptions are forwarded to the root object's emitter as
//! `"change <path>"` and remembered, so `unsubscribe_all` removes exactly
//! what this adapter added.

use std::cell::RefCell;
use std::rc::Rc;

use tracing::trace;

use super::object::Object;
use super::value::Value;
use crate::error::{ReactiveError, Result};
use crate::reactive::Handler;

/// Mediates every model access made by a view.
pub trait Adapter {
    /// The wrapped model.
    fn model(&self) -> &Value;

    /// Read a dotted path. Missing intermediates read as `Undefined`.
    fn get(&self, path: &str) -> Value;

    /// Write a dotted path.
    fn set(&self, path: &str, value: Value) -> Result<()>;

    /// Call a function stored at `path`. `None` if nothing callable is there.
    fn call(&self, _path: &str, _args: &[Value]) -> Option<Value> {
        None
    }

    /// Forward `handler` to the model's change notifications for `path`.
    fn subscribe(&self, _path: &str, _handler: Handler) {}

    fn unsubscribe(&self, _path: &str, _handler: &Handler) {}

    /// Drop every subscription this adapter made.
    fn unsubscribe_all(&self) {}
}

/// Builds an adapter for a model. Child views of an `each` binding reuse
/// their parent's factory.
pub type AdapterFactory = Rc<dyn Fn(Value) -> Box<dyn Adapter>>;

/// Factory for [`ObjectAdapter`].
pub fn default_adapter() -> AdapterFactory {
    Rc::new(|model: Value| -> Box<dyn Adapter> { Box::new(ObjectAdapter::new(model)) })
}

/// Read one path segment off `base`.
pub fn lookup(base: &Value, segment: &str) -> Value {
    match base {
        Value::Object(object) => object.get(segment),
        Value::List(list) if segment == "length" => Value::from(list.len()),
        Value::List(list) => segment
            .parse::<usize>()
            .ok()
            .and_then(|i| list.get(i))
            .unwrap_or_default(),
        Value::String(s) if segment == "length" => Value::from(s.chars().count()),
        _ => Value::Undefined,
    }
}

/// Read a dotted `path` off `base`. `this` (or an empty path) is `base`.
pub fn resolve(base: &Value, path: &str) -> Value {
    if path.is_empty() || path == "this" {
        return base.clone();
    }
    let mut current = base.clone();
    for segment in path.split('.') {
        if segment == "this" {
            continue;
        }
        current = lookup(&current, segment);
        if current.is_nullish() {
            return Value::Undefined;
        }
    }
    current
}

/// The default adapter: plain and observable [`Object`] models.
pub struct ObjectAdapter {
    model: Value,
    subscriptions: RefCell<Vec<(String, Handler)>>,
}

impl ObjectAdapter {
    pub fn new(model: Value) -> Self {
        Self {
            model,
            subscriptions: RefCell::new(Vec::new()),
        }
    }

    fn root(&self) -> Option<&Object> {
        self.model.as_object()
    }

    pub fn subscription_count(&self) -> usize {
        self.subscriptions.borrow().len()
    }
}

impl Adapter for ObjectAdapter {
    fn model(&self) -> &Value {
        &self.model
    }

    fn get(&self, path: &str) -> Value {
        resolve(&self.model, path)
    }

    fn set(&self, path: &str, value: Value) -> Result<()> {
        let (parent, key) = match path.rsplit_once('.') {
            Some((parent_path, key)) => (resolve(&self.model, parent_path), key),
            None => {
                let Some(root) = self.root() else {
                    return Err(ReactiveError::NotAnObject {
                        path: path.to_string(),
                    });
                };
                (Value::Object(root.clone()), path)
            }
        };

        trace!(target: "rebind", path, "adapter set");
        match parent {
            Value::Object(object) => object.set(key, value),
            Value::List(list) => match key.parse::<usize>() {
                Ok(index) if index < list.len() => list.splice(index, 1, vec![value]).map(|_| ()),
                _ => Err(ReactiveError::InvalidPath {
                    path: path.to_string(),
                }),
            },
            _ => Err(ReactiveError::InvalidPath {
                path: path.to_string(),
            }),
        }
    }

    fn call(&self, path: &str, args: &[Value]) -> Option<Value> {
        let (parent, key) = match path.rsplit_once('.') {
            Some((parent_path, key)) => (resolve(&self.model, parent_path), key),
            None => (self.model.clone(), path),
        };
        let function = parent.as_object()?.function(key)?;
        Some(function.call(args))
    }

    fn subscribe(&self, path: &str, handler: Handler) {
        let Some(root) = self.root() else {
            return;
        };
        if !root.is_observable() {
            return;
        }
        root.on(&format!("change {path}"), handler.clone());
        self.subscriptions
            .borrow_mut()
            .push((path.to_string(), handler));
    }

    fn unsubscribe(&self, path: &str, handler: &Handler) {
        let Some(root) = self.root() else {
            return;
        };
        root.off(&format!("change {path}"), handler);
        let mut subscriptions = self.subscriptions.borrow_mut();
        if let Some(pos) = subscriptions
            .iter()
            .position(|(p, h)| p == path && h == handler)
        {
            subscriptions.remove(pos);
        }
    }

    fn unsubscribe_all(&self) {
        let subscriptions = self.subscriptions.take();
        let Some(root) = self.root() else {
            return;
        };
        for (path, handler) in &subscriptions {
            root.off(&format!("change {path}"), handler);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::List;
    use serde_json::json;
    use std::cell::Cell;

    fn model() -> Value {
        Value::from(json!({
            "name": "Ann",
            "user": { "address": { "city": "Oslo" } },
            "items": ["a", "b"],
            "zero": 0
        }))
    }

    #[test]
    fn get_walks_dotted_paths() {
        let adapter = ObjectAdapter::new(model());
        assert_eq!(adapter.get("name"), Value::from("Ann"));
        assert_eq!(adapter.get("user.address.city"), Value::from("Oslo"));
        assert_eq!(adapter.get("items.length"), Value::from(2));
        assert_eq!(adapter.get("items.1"), Value::from("b"));
        assert_eq!(adapter.get("name.length"), Value::from(3));
        assert_eq!(adapter.get("zero"), Value::from(0));
    }

    #[test]
    fn get_missing_intermediate_is_undefined() {
        let adapter = ObjectAdapter::new(model());
        assert_eq!(adapter.get("missing.deeper.still"), Value::Undefined);
        assert_eq!(adapter.get("name.first"), Value::Undefined);
    }

    #[test]
    fn this_is_the_model() {
        let adapter = ObjectAdapter::new(Value::from("plain"));
        assert_eq!(adapter.get("this"), Value::from("plain"));
    }

    #[test]
    fn set_writes_nested_paths() {
        let adapter = ObjectAdapter::new(model());
        adapter.set("user.address.city", Value::from("Rome")).unwrap();
        assert_eq!(adapter.get("user.address.city"), Value::from("Rome"));

        adapter.set("items.0", Value::from("z")).unwrap();
        assert_eq!(adapter.get("items.0"), Value::from("z"));
    }

    #[test]
    fn set_errors() {
        let adapter = ObjectAdapter::new(model());
        assert!(matches!(
            adapter.set("missing.key", Value::from(1)),
            Err(ReactiveError::InvalidPath { .. })
        ));
        assert!(matches!(
            adapter.set("items.9", Value::from(1)),
            Err(ReactiveError::InvalidPath { .. })
        ));

        let adapter = ObjectAdapter::new(Value::from(List::new()));
        assert!(matches!(
            adapter.set("x", Value::from(1)),
            Err(ReactiveError::NotAnObject { .. })
        ));
    }

    #[test]
    fn call_invokes_functions() {
        let object = Object::new().with_accessor("upper", |args| {
            Value::from(args.first().map(|v| v.to_string().to_uppercase()))
        });
        let adapter = ObjectAdapter::new(Value::from(object));

        assert_eq!(adapter.call("upper", &[Value::from("ab")]), Some(Value::from("AB")));
        assert_eq!(adapter.call("missing", &[]), None);
    }

    #[test]
    fn unsubscribe_all_removes_only_own_handlers() {
        let object = Object::observable();
        let count = Rc::new(Cell::new(0));

        let count_clone = count.clone();
        let foreign = Handler::new(move |_| {
            count_clone.set(count_clone.get() + 10);
            Ok(())
        });
        object.on("change name", foreign);

        let adapter = ObjectAdapter::new(Value::from(object.clone()));
        let count_clone = count.clone();
        adapter.subscribe(
            "name",
            Handler::new(move |_| {
                count_clone.set(count_clone.get() + 1);
                Ok(())
            }),
        );
        assert_eq!(adapter.subscription_count(), 1);

        object.set("name", Value::from("Bo")).unwrap();
        assert_eq!(count.get(), 11);

        adapter.unsubscribe_all();
        object.set("name", Value::from("Cy")).unwrap();
        assert_eq!(count.get(), 21);
        assert_eq!(adapter.subscription_count(), 0);
    }

    #[test]
    fn subscribe_on_plain_model_is_noop() {
        let adapter = ObjectAdapter::new(model());
        adapter.subscribe("name", Handler::new(|_| Ok(())));
        assert_eq!(adapter.subscription_count(), 0);
    }
}

//! Model data
//!
//! Views bind against dynamically typed models: [`Value`]s built from
//! shared [`Object`]s and observable [`List`]s. All model access from a view
//! goes through an [`Adapter`].

mod adapter;
mod list;
mod object;
mod value;

pub use adapter::{default_adapter, lookup, resolve, Adapter, AdapterFactory, ObjectAdapter};
pub use list::{List, ListObserver, Splice};
pub use object::{EventHandler, Function, Object, Slot, WeakObject};
pub use value::Value;

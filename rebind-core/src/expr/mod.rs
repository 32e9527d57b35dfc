//! Interpolation compiler
//!
//! Turns `{expr}` template strings into evaluable templates and reports which
//! property paths they depend on, so bindings know what to subscribe to.
//!
//! # How It Works
//!
//! 1. [`Template::compile`] scans for markers and splits the text into
//!    literal and expression segments.
//! 2. Each marker body is parsed by [`Expr::parse`]. Parsed expressions are
//!    cached per thread, keyed by their source text, so a template that is
//!    cloned a hundred times by a list binding parses its markers once.
//! 3. Rendering evaluates every expression against a [`Scope`] (in practice,
//!    a view) and concatenates.

mod parser;
mod template;

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use smallvec::SmallVec;
use thiserror::Error;
use tracing::debug;

pub use parser::Expr;
pub use template::Template;

use crate::error::{ReactiveError, Result};
use crate::model::{resolve, Object, Value};

/// A marker body outside the supported grammar.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ExpressionError {
    #[error("empty expression")]
    Empty,

    #[error("unexpected `{found}` in expression `{expr}`")]
    UnexpectedToken { expr: String, found: String },

    #[error("unexpected end of expression `{expr}`")]
    UnexpectedEnd { expr: String },

    #[error("unterminated literal in expression `{expr}`")]
    UnterminatedLiteral { expr: String },

    /// Calls are only allowed one level deep.
    #[error("nested call in expression `{expr}`")]
    NestedCall { expr: String },
}

/// Where expressions look up paths and functions.
pub trait Scope {
    fn get(&self, path: &str) -> Value;

    fn call(&self, path: &str, args: &[Value]) -> Result<Value>;
}

/// A bare object is a scope of its own properties.
impl Scope for Object {
    fn get(&self, path: &str) -> Value {
        resolve(&Value::Object(self.clone()), path)
    }

    fn call(&self, path: &str, args: &[Value]) -> Result<Value> {
        let (receiver, key) = match path.rsplit_once('.') {
            Some((receiver, key)) => (Scope::get(self, receiver), key),
            None => (Value::Object(self.clone()), path),
        };
        receiver
            .as_object()
            .and_then(|object| object.function(key))
            .map(|f| f.call(args))
            .ok_or_else(|| ReactiveError::NotCallable {
                path: path.to_string(),
            })
    }
}

thread_local! {
    static CACHE: RefCell<HashMap<String, Rc<Expr>>> = RefCell::new(HashMap::new());
}

/// Parse a marker body, reusing the cached result for identical source.
pub fn compile(src: &str) -> std::result::Result<Rc<Expr>, ExpressionError> {
    let key = src.trim();
    if let Some(hit) = CACHE.with(|cache| cache.borrow().get(key).cloned()) {
        return Ok(hit);
    }

    debug!(target: "rebind", expr = key, "compile");
    let expr = Rc::new(Expr::parse(key)?);
    CACHE.with(|cache| {
        cache.borrow_mut().insert(key.to_string(), expr.clone());
    });
    Ok(expr)
}

/// Number of distinct expressions compiled on this thread.
pub fn cached_expressions() -> usize {
    CACHE.with(|cache| cache.borrow().len())
}

/// Whether `text` may contain markers.
pub fn has_interpolation(text: &str) -> bool {
    text.contains('{')
}

/// Property paths referenced by the markers in `text`.
pub fn interpolation_paths(text: &str) -> std::result::Result<SmallVec<[String; 4]>, ExpressionError> {
    let template = Template::compile(text)?;
    Ok(template.paths().iter().cloned().collect())
}

//! Error types.
//!
//! Rendering is synchronous, so there is no recovery layer: anything that fails
//! inside a directive, an expression, or a DOM operation surfaces here and is
//! propagated to whoever triggered the render (`View::new`, `View::set`, a list
//! mutation, or an event dispatch).

use thiserror::Error;

use crate::expr::ExpressionError;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, ReactiveError>;

/// Errors raised while binding or rendering.
#[derive(Debug, Error)]
pub enum ReactiveError {
    /// An `on-<event>` directive fired but the delegate has no such handler.
    #[error("method .{method}() missing")]
    MissingMethod { method: String },

    /// An expression invoked something that is not callable.
    #[error("`{path}` is not callable")]
    NotCallable { path: String },

    #[error(transparent)]
    Expression(#[from] ExpressionError),

    /// A nested write whose parent path does not resolve to an object.
    #[error("cannot set `{path}`: parent is not an object")]
    InvalidPath { path: String },

    /// A write against a model that is not an object.
    #[error("cannot set `{path}` on a model that is not an object")]
    NotAnObject { path: String },

    #[error("invalid `each` expression `{value}`")]
    InvalidEach { value: String },

    /// `data-append` / `data-replace` pointed at a property holding no node.
    #[error("`{path}` does not hold a DOM node")]
    NotANode { path: String },

    #[error("node is not attached to a parent")]
    Detached,

    #[error("markup parse error: {0}")]
    Parse(String),
}

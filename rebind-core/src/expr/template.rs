//! Interpolated templates.
//!
//! A template is a string with zero or more `{expr}` markers, split into
//! literal and expression segments. Rendering evaluates each expression and
//! concatenates the results; `Undefined` and `Null` contribute nothing.

use std::rc::Rc;

use smallvec::SmallVec;

use super::parser::Expr;
use super::{compile, ExpressionError, Scope};
use crate::error::Result;

#[derive(Debug, Clone)]
enum Segment {
    Literal(String),
    Expr(Rc<Expr>),
}

/// A compiled template string.
#[derive(Debug, Clone)]
pub struct Template {
    source: String,
    segments: Vec<Segment>,
    paths: SmallVec<[String; 4]>,
}

impl Template {
    /// Split `source` into segments and compile every marker.
    ///
    /// A `{` with no closing `}`, an empty or blank marker, and a marker
    /// whose body contains another `{` are kept as literal text.
    pub fn compile(source: &str) -> std::result::Result<Self, ExpressionError> {
        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut paths = SmallVec::new();
        let mut rest = source;

        loop {
            let Some(open) = rest.find('{') else {
                literal.push_str(rest);
                break;
            };
            literal.push_str(&rest[..open]);

            let after = &rest[open + 1..];
            let Some(close) = after.find('}') else {
                literal.push_str(&rest[open..]);
                break;
            };

            let body = &after[..close];
            if body.trim().is_empty() || body.contains('{') {
                literal.push('{');
                rest = after;
                continue;
            }

            if !literal.is_empty() {
                segments.push(Segment::Literal(std::mem::take(&mut literal)));
            }
            let expr = compile(body)?;
            expr.collect_paths(&mut paths);
            segments.push(Segment::Expr(expr));
            rest = &after[close + 1..];
        }

        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }

        Ok(Self {
            source: source.to_string(),
            segments,
            paths,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Unique property paths read by the markers, in order of appearance.
    pub fn paths(&self) -> &[String] {
        &self.paths
    }

    /// True when the template holds no markers.
    pub fn is_static(&self) -> bool {
        self.segments
            .iter()
            .all(|segment| matches!(segment, Segment::Literal(_)))
    }

    /// Substitute every marker with its value in `scope`.
    pub fn render(&self, scope: &dyn Scope) -> Result<String> {
        let mut out = String::with_capacity(self.source.len());
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Expr(expr) => out.push_str(&expr.eval(scope)?.to_string()),
            }
        }
        Ok(out)
    }
}

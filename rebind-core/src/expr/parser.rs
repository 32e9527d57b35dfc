//! Expression parsing and evaluation.
//!
//! Marker bodies are deliberately tiny expressions:
//!
//! ```text
//! expr    := literal | path | path '(' [arg (',' arg)*] ')'
//! arg     := literal | path
//! path    := ident ('.' ident)* | 'this'
//! literal := '…' | "…" | /…/ | number | true | false | null | undefined
//! ```
//!
//! There are no operators, so a `/` always opens a regex literal. Regex
//! literals evaluate to their pattern text.

use smallvec::SmallVec;

use super::{ExpressionError, Scope};
use crate::error::Result;
use crate::model::Value;

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Ident(String),
    Str(String),
    Regex(String),
    Number(f64),
    LParen,
    RParen,
    Comma,
}

impl Token {
    fn describe(&self) -> String {
        match self {
            Token::Ident(s) => s.clone(),
            Token::Str(s) => format!("'{s}'"),
            Token::Regex(s) => format!("/{s}/"),
            Token::Number(n) => n.to_string(),
            Token::LParen => "(".into(),
            Token::RParen => ")".into(),
            Token::Comma => ",".into(),
        }
    }
}

fn is_ident_start(c: char) -> bool {
    c.is_alphabetic() || c == '_' || c == '$'
}

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$' || c == '.'
}

fn tokenize(src: &str) -> std::result::Result<Vec<Token>, ExpressionError> {
    let unexpected = |found: &str| ExpressionError::UnexpectedToken {
        expr: src.to_string(),
        found: found.to_string(),
    };

    let mut tokens = Vec::new();
    let mut chars = src.char_indices().peekable();

    while let Some(&(start, c)) = chars.peek() {
        match c {
            c if c.is_whitespace() => {
                chars.next();
            }
            '(' | ')' | ',' => {
                chars.next();
                tokens.push(match c {
                    '(' => Token::LParen,
                    ')' => Token::RParen,
                    _ => Token::Comma,
                });
            }
            '\'' | '"' | '/' => {
                chars.next();
                let mut body = String::new();
                let mut closed = false;
                for (_, next) in chars.by_ref() {
                    if next == c {
                        closed = true;
                        break;
                    }
                    body.push(next);
                }
                if !closed {
                    return Err(ExpressionError::UnterminatedLiteral {
                        expr: src.to_string(),
                    });
                }
                tokens.push(if c == '/' {
                    Token::Regex(body)
                } else {
                    Token::Str(body)
                });
            }
            c if c.is_ascii_digit() || c == '-' => {
                chars.next();
                let mut end = start + c.len_utf8();
                while let Some(&(i, next)) = chars.peek() {
                    if !(next.is_ascii_digit() || next == '.') {
                        break;
                    }
                    end = i + next.len_utf8();
                    chars.next();
                }
                let text = &src[start..end];
                let n = text.parse::<f64>().map_err(|_| unexpected(text))?;
                tokens.push(Token::Number(n));
            }
            c if is_ident_start(c) => {
                chars.next();
                let mut end = start + c.len_utf8();
                while let Some(&(i, next)) = chars.peek() {
                    if !is_ident_char(next) {
                        break;
                    }
                    end = i + next.len_utf8();
                    chars.next();
                }
                let path = &src[start..end];
                if path.split('.').any(str::is_empty) {
                    return Err(unexpected(path));
                }
                tokens.push(Token::Ident(path.to_string()));
            }
            other => return Err(unexpected(&other.to_string())),
        }
    }

    Ok(tokens)
}

/// A compiled marker expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal(Value),
    Path(String),
    Call { callee: String, args: Vec<Expr> },
}

fn keyword(ident: &str) -> Option<Value> {
    match ident {
        "true" => Some(Value::Bool(true)),
        "false" => Some(Value::Bool(false)),
        "null" => Some(Value::Null),
        "undefined" => Some(Value::Undefined),
        _ => None,
    }
}

fn operand(token: Token) -> Option<Expr> {
    match token {
        Token::Ident(ident) => Some(keyword(&ident).map(Expr::Literal).unwrap_or(Expr::Path(ident))),
        Token::Str(s) | Token::Regex(s) => Some(Expr::Literal(Value::String(s))),
        Token::Number(n) => Some(Expr::Literal(Value::Number(n))),
        _ => None,
    }
}

impl Expr {
    /// Parse a marker body.
    pub fn parse(src: &str) -> std::result::Result<Self, ExpressionError> {
        let src = src.trim();
        let end = || ExpressionError::UnexpectedEnd {
            expr: src.to_string(),
        };
        let unexpected = |token: &Token| ExpressionError::UnexpectedToken {
            expr: src.to_string(),
            found: token.describe(),
        };

        let mut tokens = tokenize(src)?.into_iter().peekable();
        let head = tokens.next().ok_or(ExpressionError::Empty)?;

        let is_call = tokens.peek() == Some(&Token::LParen);
        let expr = match head {
            Token::Ident(callee) if is_call => {
                tokens.next();
                let mut args = Vec::new();
                if tokens.peek() == Some(&Token::RParen) {
                    tokens.next();
                } else {
                    loop {
                        let token = tokens.next().ok_or_else(end)?;
                        let arg = operand(token.clone()).ok_or_else(|| unexpected(&token))?;
                        if tokens.peek() == Some(&Token::LParen) {
                            return Err(ExpressionError::NestedCall {
                                expr: src.to_string(),
                            });
                        }
                        args.push(arg);
                        match tokens.next() {
                            Some(Token::Comma) => continue,
                            Some(Token::RParen) => break,
                            Some(other) => return Err(unexpected(&other)),
                            None => return Err(end()),
                        }
                    }
                }
                Expr::Call { callee, args }
            }
            head => operand(head.clone()).ok_or_else(|| unexpected(&head))?,
        };

        match tokens.next() {
            None => Ok(expr),
            Some(extra) => Err(unexpected(&extra)),
        }
    }

    /// Property paths this expression reads, in order, without duplicates.
    ///
    /// Literals contribute nothing. A call contributes its receiver (the
    /// callee minus its last segment) and its path arguments, never the
    /// callee itself.
    pub fn paths(&self) -> SmallVec<[String; 4]> {
        let mut out = SmallVec::new();
        self.collect_paths(&mut out);
        out
    }

    pub(crate) fn collect_paths(&self, out: &mut SmallVec<[String; 4]>) {
        let mut push = |path: &str| {
            if path != "this" && !out.iter().any(|p| p == path) {
                out.push(path.to_string());
            }
        };
        match self {
            Expr::Literal(_) => {}
            Expr::Path(path) => push(path),
            Expr::Call { callee, args } => {
                if let Some((receiver, _)) = callee.rsplit_once('.') {
                    push(receiver);
                }
                for arg in args {
                    if let Expr::Path(path) = arg {
                        push(path);
                    }
                }
            }
        }
    }

    /// Evaluate against `scope`.
    pub fn eval(&self, scope: &dyn Scope) -> Result<Value> {
        match self {
            Expr::Literal(value) => Ok(value.clone()),
            Expr::Path(path) => Ok(scope.get(path)),
            Expr::Call { callee, args } => {
                let args = args
                    .iter()
                    .map(|arg| arg.eval(scope))
                    .collect::<Result<Vec<_>>>()?;
                scope.call(callee, &args)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Object;

    fn path(p: &str) -> Expr {
        Expr::Path(p.to_string())
    }

    #[test]
    fn parses_paths_and_literals() {
        assert_eq!(Expr::parse("name").unwrap(), path("name"));
        assert_eq!(Expr::parse("  user.address.city ").unwrap(), path("user.address.city"));
        assert_eq!(
            Expr::parse("'hi there'").unwrap(),
            Expr::Literal(Value::from("hi there"))
        );
        assert_eq!(Expr::parse("-2.5").unwrap(), Expr::Literal(Value::from(-2.5)));
        assert_eq!(Expr::parse("true").unwrap(), Expr::Literal(Value::from(true)));
        assert_eq!(Expr::parse("null").unwrap(), Expr::Literal(Value::Null));
    }

    #[test]
    fn parses_calls() {
        let expr = Expr::parse("format(price, 'EUR', /\\d+/)").unwrap();
        assert_eq!(
            expr,
            Expr::Call {
                callee: "format".into(),
                args: vec![
                    path("price"),
                    Expr::Literal(Value::from("EUR")),
                    Expr::Literal(Value::from("\\d+")),
                ],
            }
        );
        assert_eq!(
            Expr::parse("now()").unwrap(),
            Expr::Call {
                callee: "now".into(),
                args: vec![]
            }
        );
    }

    #[test]
    fn rejects_outside_grammar() {
        assert_eq!(Expr::parse("   ").unwrap_err(), ExpressionError::Empty);
        assert!(matches!(
            Expr::parse("a + b"),
            Err(ExpressionError::UnexpectedToken { .. })
        ));
        assert!(matches!(
            Expr::parse("f(g(x))"),
            Err(ExpressionError::NestedCall { .. })
        ));
        assert!(matches!(
            Expr::parse("f(x"),
            Err(ExpressionError::UnexpectedEnd { .. })
        ));
        assert!(matches!(
            Expr::parse("'open"),
            Err(ExpressionError::UnterminatedLiteral { .. })
        ));
        assert!(matches!(
            Expr::parse("a..b"),
            Err(ExpressionError::UnexpectedToken { .. })
        ));
        assert!(matches!(
            Expr::parse("a b"),
            Err(ExpressionError::UnexpectedToken { .. })
        ));
    }

    #[test]
    fn paths_skip_literals_and_callee() {
        let expr = Expr::parse("user.format(name, 'name', /name/, name)").unwrap();
        assert_eq!(expr.paths().as_slice(), ["user", "name"]);

        let expr = Expr::parse("upper(first)").unwrap();
        assert_eq!(expr.paths().as_slice(), ["first"]);

        assert!(Expr::parse("'x'").unwrap().paths().is_empty());
        assert!(Expr::parse("this").unwrap().paths().is_empty());
    }

    #[test]
    fn eval_reads_and_calls() {
        let scope = Object::new()
            .with("name", "ann")
            .with_accessor("upper", |args| {
                Value::from(args.first().map(|v| v.to_string().to_uppercase()))
            });

        assert_eq!(Expr::parse("name").unwrap().eval(&scope).unwrap(), Value::from("ann"));
        assert_eq!(
            Expr::parse("upper(name)").unwrap().eval(&scope).unwrap(),
            Value::from("ANN")
        );
        assert!(Expr::parse("name()").unwrap().eval(&scope).is_err());
    }
}

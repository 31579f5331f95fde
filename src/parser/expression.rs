//! The expression tree produced by the parser.
//!
//! ScraperLang has no statement/expression split: closure bodies are plain
//! sequences of expressions, and the handful of statement-looking forms
//! (`print`, `get`, `return`, assignment) are expression nodes evaluated for
//! their effect. The bodies of closures are shared behind `Arc` so that a
//! closure value, and the worker threads that end up holding one, can
//! reference the tree without cloning it.

use std::sync::Arc;

use crate::scanner::{Token, TokenType};

/// A top level closure identifiable by name. `init` is the entry point;
/// every other tagged closure is a continuation reachable from a tagged
/// `get` expression.
#[derive(Debug, Clone)]
pub struct TaggedClosure {
	pub name: Token,
	pub body: Arc<Vec<Expression>>,
}

/// An expression node in the ScraperLang AST.
#[derive(Debug, Clone)]
pub enum Expression {
	/// A named top-level closure. Only valid at the top level; the
	/// interpreter rejects anything else there at construction.
	Tagged(TaggedClosure),
	/// An untagged closure literal, a first-class value.
	Closure {
		params: Arc<Vec<Token>>,
		body:   Arc<Vec<Expression>>,
	},
	/// An assignment, binding in the innermost scope.
	Assign { name: Token, value: Box<Expression> },
	/// A call of any callee expression with evaluated arguments.
	Call {
		callee: Box<Expression>,
		args:   Vec<Expression>,
	},
	/// Dotted attribute access, e.g. `items.size`.
	Access { target: Box<Expression>, field: Token },
	/// Bracketed access into a map or array, e.g. `m["key"]`.
	MapAccess {
		target: Box<Expression>,
		key:    Box<Expression>,
	},
	/// HTML attribute access, e.g. `node~href`. Reserved.
	HtmlAttr { target: Box<Expression>, attr: Token },
	/// An HTTP get dispatching its response to a tagged closure.
	Get {
		tag:     Option<Token>,
		url:     Box<Expression>,
		headers: Option<Box<Expression>>,
	},
	/// The print builtin; at least one argument.
	Print { args: Vec<Expression> },
	/// An array literal.
	Array { entries: Vec<Expression> },
	/// A map literal. Entries keep their declared order; a duplicate key
	/// replaces the earlier entry.
	Map { entries: Vec<(String, Expression)> },
	/// A return, unwinding the enclosing closure invocation.
	Return { value: Option<Box<Expression>> },
	/// A literal value or identifier reference.
	Literal(Token),
}

impl std::fmt::Display for TaggedClosure {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "{} {}", self.name.lexeme, Body(&self.body))
	}
}

/// Helper rendering a closure body in re-parseable form.
struct Body<'a>(&'a [Expression]);

impl std::fmt::Display for Body<'_> {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		writeln!(f, "{{")?;
		for expr in self.0 {
			writeln!(f, "{expr}")?;
		}
		write!(f, "}}")
	}
}

/// Helper joining expressions with `", "`.
struct List<'a>(&'a [Expression]);

impl std::fmt::Display for List<'_> {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		let items = self.0.iter().map(Expression::to_string).collect::<Vec<_>>();
		write!(f, "{}", items.join(", "))
	}
}

impl std::fmt::Display for Expression {
	/// Renders the expression back into source form. Re-parsing the output
	/// yields a structurally identical tree, which the parser tests rely on.
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		use Expression::*;
		match self {
			Tagged(closure) => write!(f, "{closure}"),
			Closure { params, body } => {
				let params = params.iter().map(|p| p.lexeme.clone()).collect::<Vec<_>>();
				write!(f, "({}) {}", params.join(", "), Body(body))
			}
			Assign { name, value } => write!(f, "{} = {value}", name.lexeme),
			Call { callee, args } => write!(f, "{callee}({})", List(args)),
			Access { target, field } => write!(f, "{target}.{}", field.lexeme),
			MapAccess { target, key } => write!(f, "{target}[{key}]"),
			HtmlAttr { target, attr } => write!(f, "{target}~{}", attr.lexeme),
			Get { tag, url, headers } => {
				if let Some(tag) = tag {
					write!(f, "{} ", tag.lexeme)?;
				}
				write!(f, "get {url}")?;
				if let Some(headers) = headers {
					write!(f, ", {headers}")?;
				}
				Ok(())
			}
			Print { args } => write!(f, "print {}", List(args)),
			Array { entries } => write!(f, "[{}]", List(entries)),
			Map { entries } => {
				let entries =
					entries.iter().map(|(key, value)| format!("{key:?}: {value}")).collect::<Vec<_>>();
				write!(f, "{{{}}}", entries.join(", "))
			}
			Return { value } => match value {
				Some(value) => write!(f, "return {value}"),
				None => write!(f, "return"),
			},
			Literal(token) => match &token.r#type {
				TokenType::StringLiteral(body) => write!(f, "\"{body}\""),
				_ => write!(f, "{}", token.lexeme),
			},
		}
	}
}

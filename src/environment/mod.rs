//! Lexical scope frames.
//!
//! An environment is a name→value table with an optional parent. Reads walk
//! the parent chain; writes always land in the innermost frame, so an inner
//! assignment to an outer name shadows it instead of mutating it. Frames are
//! shared behind `Arc` because closure values capture their defining
//! environment and may outlive it on another worker thread.

use std::{
	collections::HashMap,
	sync::{Arc, Mutex, PoisonError},
};

use crate::{error::interpreter::RuntimeError, interpreter::value::Value, scanner::Token};

/// A shared handle to a scope frame.
pub type Env = Arc<Environment>;

pub struct Environment {
	entries: Mutex<HashMap<String, Value>>,
	parent:  Option<Env>,
}

impl Environment {
	/// Creates a new frame with an initial set of bindings.
	pub fn new(init: HashMap<String, Value>, parent: Option<Env>) -> Env {
		Arc::new(Self { entries: Mutex::new(init), parent })
	}

	/// Checks and returns the given variable from either itself or a parent.
	pub fn get(&self, ident: &Token) -> Result<Value, RuntimeError> {
		if let Some(value) = self.entries().get(&ident.lexeme) {
			return Ok(value.clone());
		}
		if let Some(parent) = &self.parent {
			return parent.get(ident);
		}
		Err(RuntimeError::UndefinedVariable {
			line:   ident.line + 1,
			column: ident.column,
			name:   ident.lexeme.clone(),
		})
	}

	/// Binds in this frame, never in a parent.
	pub fn set(&self, name: &str, value: Value) { self.entries().insert(name.to_string(), value); }

	fn entries(&self) -> std::sync::MutexGuard<'_, HashMap<String, Value>> {
		self.entries.lock().unwrap_or_else(PoisonError::into_inner)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::scanner::TokenType;

	fn ident(name: &str) -> Token { Token::new(TokenType::Ident(name.to_string()), name, 0, 0) }

	#[test]
	fn get_walks_the_parent_chain() {
		let root = Environment::new(HashMap::new(), None);
		root.set("a", Value::Number(1.0));
		let child = Environment::new(HashMap::new(), Some(root));
		assert!(matches!(child.get(&ident("a")), Ok(Value::Number(n)) if n == 1.0));
	}

	#[test]
	fn initial_bindings_take_precedence() {
		let root = Environment::new(HashMap::new(), None);
		root.set("a", Value::Number(1.0));
		let init = HashMap::from([("a".to_string(), Value::Number(2.0))]);
		let child = Environment::new(init, Some(root));
		assert!(matches!(child.get(&ident("a")), Ok(Value::Number(n)) if n == 2.0));
	}

	#[test]
	fn set_shadows_instead_of_mutating() {
		let root = Environment::new(HashMap::new(), None);
		root.set("a", Value::Number(1.0));
		let child = Environment::new(HashMap::new(), Some(root.clone()));
		child.set("a", Value::Number(2.0));
		assert!(matches!(root.get(&ident("a")), Ok(Value::Number(n)) if n == 1.0));
		assert!(matches!(child.get(&ident("a")), Ok(Value::Number(n)) if n == 2.0));
	}

	#[test]
	fn missing_variable_is_an_error() {
		let root = Environment::new(HashMap::new(), None);
		let err = root.get(&ident("ghost")).unwrap_err();
		assert_eq!(err.to_string(), "[1:0] Undefined variable \"ghost\"");
	}
}

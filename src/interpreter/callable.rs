use std::{fmt::Debug, sync::Arc};

use crate::{
	environment::Env,
	error::interpreter::RuntimeError,
	interpreter::{Runtime, value::Value},
	parser::expression::Expression,
	scanner::Token,
};

/// A host-provided callable.
pub type NativeFn = Box<dyn Fn(&Runtime, &[Value]) -> Result<Value, RuntimeError> + Send + Sync>;

/// The runtime instance of a closure literal: its parameter list and body
/// plus the environment captured at the definition site.
///
/// A closure assigned to a name in its own defining scope forms a reference
/// cycle through that environment and is never collected. Scripts are
/// short-lived, so the leak is accepted rather than broken with weak edges.
pub struct ClosureValue {
	pub params: Arc<Vec<Token>>,
	pub body:   Arc<Vec<Expression>>,
	pub env:    Env,
}

impl ClosureValue {
	pub fn new(params: Arc<Vec<Token>>, body: Arc<Vec<Expression>>, env: Env) -> Self {
		Self { params, body, env }
	}

	pub fn arity(&self) -> usize { self.params.len() }
}

impl Debug for ClosureValue {
	// The captured environment can reach the closure itself, so it stays out
	// of the debug output.
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("ClosureValue").field("params", &self.params).finish_non_exhaustive()
	}
}

/// A callable implemented by the host rather than by script code. The
/// language core registers none by default; it is the extension point for
/// embedders.
pub struct BuiltinValue {
	pub name:  &'static str,
	pub arity: usize,
	pub func:  NativeFn,
}

impl BuiltinValue {
	pub fn new(name: &'static str, arity: usize, func: NativeFn) -> Self { Self { name, arity, func } }
}

impl Debug for BuiltinValue {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("BuiltinValue").field("name", &self.name).field("arity", &self.arity).finish()
	}
}

//! Runtime behavior of arrays and maps: attribute access, keyed access and
//! iteration.
//!
//! Containers double as callables. Calling one with a closure loops over its
//! entries: an arity-1 closure receives each value, an arity-2 closure
//! receives the index (or key) and the value. The `loop` attribute returns
//! the container itself, so `items.loop((item) { ... })` reads naturally.

use std::collections::HashMap;

use crate::{
	error::interpreter::RuntimeError,
	interpreter::{Runtime, value::Value},
	scanner::Token,
	utils::ArcLock,
};

/// Resolves `.attr` on a runtime value.
pub fn attr(value: &Value, field: &Token) -> Result<Value, RuntimeError> {
	match value {
		Value::Array(array) => array_attr(array, value, &field.lexeme),
		Value::Map(_) => map_attr(value, &field.lexeme),
		other => Err(RuntimeError::NotAccessor(other.to_string())),
	}
}

/// Resolves `target[key]` on a runtime value.
pub fn index(target: &Value, key: Value) -> Result<Value, RuntimeError> {
	match target {
		Value::Array(array) => array_index(array, key),
		Value::Map(map) => map_index(map, key),
		other => Err(RuntimeError::NotIndexable(other.to_string())),
	}
}

fn array_attr(array: &ArcLock<Vec<Value>>, whole: &Value, attr: &str) -> Result<Value, RuntimeError> {
	let entries = array.lock();
	match attr {
		"loop" => Ok(whole.clone()),
		"size" => Ok(Value::Number(entries.len() as f64)),
		"first" => Ok(entries.first().cloned().unwrap_or(Value::Nil)),
		"last" => Ok(entries.last().cloned().unwrap_or(Value::Nil)),
		_ => Err(RuntimeError::UnknownAttribute { target: "Array", attr: attr.to_string() }),
	}
}

fn map_attr(whole: &Value, attr: &str) -> Result<Value, RuntimeError> {
	match attr {
		"loop" => Ok(whole.clone()),
		_ => Err(RuntimeError::UnknownAttribute { target: "Map", attr: attr.to_string() }),
	}
}

/// Indexes into an array. The key must be a number; it is truncated to an
/// integer and must be within bounds.
fn array_index(array: &ArcLock<Vec<Value>>, key: Value) -> Result<Value, RuntimeError> {
	let Value::Number(n) = key else {
		return Err(RuntimeError::BadArrayIndex);
	};
	let entries = array.lock();
	let index = n as i64;
	if index < 0 || index as usize >= entries.len() {
		return Err(RuntimeError::IndexOutOfRange { index, len: entries.len() });
	}
	Ok(entries[index as usize].clone())
}

/// Indexes into a map. The key must be a string; a missing key yields `Nil`.
fn map_index(map: &ArcLock<HashMap<String, Value>>, key: Value) -> Result<Value, RuntimeError> {
	let Value::Str(key) = key else {
		return Err(RuntimeError::BadMapKey);
	};
	Ok(map.lock().get(&key).cloned().unwrap_or(Value::Nil))
}

/// Calls `fun` once per entry of `container`. The entries are snapshotted
/// up front so the container lock is not held while script code runs.
pub fn iterate(runtime: &Runtime, container: &Value, fun: &Value) -> Result<Value, RuntimeError> {
	let target = container.kind();
	let arity = match fun {
		Value::Closure(closure) => closure.arity(),
		Value::Builtin(builtin) => builtin.arity,
		Value::Array(_) | Value::Map(_) => 1,
		_ => return Err(RuntimeError::BadLoopCallable { target }),
	};

	match container {
		Value::Array(array) => {
			let entries = array.lock().clone();
			match arity {
				1 => {
					for value in entries {
						runtime.call(fun, vec![value])?;
					}
				}
				2 => {
					for (index, value) in entries.into_iter().enumerate() {
						runtime.call(fun, vec![Value::Number(index as f64), value])?;
					}
				}
				got => return Err(RuntimeError::BadLoopArity { target, got }),
			}
		}
		Value::Map(map) => {
			let entries = map.lock().iter().map(|(k, v)| (k.clone(), v.clone())).collect::<Vec<_>>();
			match arity {
				1 => {
					for (_, value) in entries {
						runtime.call(fun, vec![value])?;
					}
				}
				2 => {
					for (key, value) in entries {
						runtime.call(fun, vec![Value::Str(key), value])?;
					}
				}
				got => return Err(RuntimeError::BadLoopArity { target, got }),
			}
		}
		_ => return Err(RuntimeError::NotCallable(container.to_string())),
	}

	Ok(Value::Nil)
}

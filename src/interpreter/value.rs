use std::{collections::HashMap, fmt::Display, sync::Arc};

use crate::{
	interpreter::callable::{BuiltinValue, ClosureValue},
	utils::ArcLock,
};

/// Value represents a runtime value in ScraperLang.
///
/// Numbers, strings, booleans and nil are plain values. Arrays, maps and
/// closures are handles: assigning one binds another name to the same
/// instance, and two workers holding the same handle see each other's
/// changes.
#[derive(Debug, Clone)]
pub enum Value {
	Nil,
	Boolean(bool),
	Number(f64),
	Str(String),
	Array(ArcLock<Vec<Value>>),
	Map(ArcLock<HashMap<String, Value>>),
	Closure(Arc<ClosureValue>),
	Builtin(Arc<BuiltinValue>),
}

impl Value {
	/// A short name for the value's kind, used in error messages.
	pub fn kind(&self) -> &'static str {
		match self {
			Value::Nil => "Nil",
			Value::Boolean(_) => "Boolean",
			Value::Number(_) => "Number",
			Value::Str(_) => "String",
			Value::Array(_) => "Array",
			Value::Map(_) => "Map",
			Value::Closure(_) => "Closure",
			Value::Builtin(_) => "Builtin",
		}
	}
}

impl Display for Value {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Value::Nil => write!(f, "nil"),
			Value::Boolean(b) => write!(f, "{b}"),
			Value::Number(n) => {
				if n.is_finite() && n.fract() == 0.0 {
					write!(f, "{}", *n as i64)
				} else {
					write!(f, "{n}")
				}
			}
			Value::Str(s) => write!(f, "{s}"),
			Value::Array(array) => {
				let entries = array.lock().iter().map(Value::to_string).collect::<Vec<_>>();
				write!(f, "#Array [{}]", entries.join(", "))
			}
			Value::Map(map) => {
				let mut entries =
					map.lock().iter().map(|(k, v)| format!("{k}: {v}")).collect::<Vec<_>>();
				entries.sort();
				write!(f, "#Map {{{}}}", entries.join(", "))
			}
			Value::Closure(_) => write!(f, "#Closure"),
			Value::Builtin(_) => write!(f, "#Builtin"),
		}
	}
}

//! Construction and execution of HTTP work items.
//!
//! Evaluating a `get` expression resolves its arguments on the evaluating
//! thread, then packages them into a [`GetWork`] that a pool worker runs:
//! perform the request, look up the tagged closure for the work item's tag
//! and invoke it with a fresh root environment seeded with the response.

use std::collections::HashMap;

use crate::{
	environment::Environment,
	error::interpreter::RuntimeError,
	interpreter::{Runtime, value::Value},
	utils::ArcLock,
};

/// The tag a bare `get` dispatches to.
pub const DEFAULT_TAG: &str = "default";

/// One HTTP request and the tag of its continuation.
pub struct GetWork {
	pub tag:     String,
	pub url:     String,
	pub headers: Vec<(String, String)>,
}

impl GetWork {
	/// Performs the request and dispatches the tagged closure. A tag with no
	/// registered closure completes silently.
	pub fn run(self, runtime: &Runtime) -> Result<(), RuntimeError> {
		let scheme = self.url.split_once(':').map(|(scheme, _)| scheme);
		if !matches!(scheme, Some("http" | "https")) {
			return Err(RuntimeError::MissingUrlScheme(self.url));
		}

		let response =
			runtime.http().get(&self.url, &self.headers).map_err(|e| RuntimeError::Http(e.to_string()))?;

		let Some(closure) = runtime.tagged(&self.tag) else {
			return Ok(());
		};

		let response_headers = response
			.headers
			.into_iter()
			.map(|(name, value)| (name, Value::Str(value)))
			.collect::<HashMap<_, _>>();
		let init = HashMap::from([
			("status".to_string(), Value::Number(response.status as f64)),
			("body".to_string(), Value::Str(response.body)),
			("headers".to_string(), Value::Map(ArcLock::new(response_headers))),
		]);

		// Tag-dispatched closures start from a fresh, parentless scope.
		let env = Environment::new(init, None);
		runtime.run_body(&closure.body, &env)?;
		Ok(())
	}
}

/// Flattens a header map value into name/value pairs. A string value is one
/// header; an array of strings repeats the header. Entries of any other
/// type are skipped.
pub fn flatten_headers(map: &ArcLock<HashMap<String, Value>>) -> Vec<(String, String)> {
	let mut headers = Vec::new();
	for (name, value) in map.lock().iter() {
		match value {
			Value::Str(value) => headers.push((name.clone(), value.clone())),
			Value::Array(values) => {
				for value in values.lock().iter() {
					if let Value::Str(value) = value {
						headers.push((name.clone(), value.clone()));
					}
				}
			}
			_ => {}
		}
	}
	headers
}

use crate::interpreter::value::Value;

/// Errors that can occur while evaluating a program.
///
/// Worker threads report these to stderr with a `worker:` prefix; on the
/// main thread they abort execution.
#[derive(thiserror::Error, Debug)]
pub enum RuntimeError {
	/// Internal interpreter error, should never happen
	#[error("{0}")]
	InternalError(#[from] anyhow::Error),
	/// Error for a variable not bound anywhere on the scope chain.
	#[error("[{line}:{column}] Undefined variable {name:?}")]
	UndefinedVariable { line: usize, column: usize, name: String },
	/// Error for calling a value that is not callable.
	#[error("{0} is not a callable")]
	NotCallable(String),
	/// Error for calling with the wrong number of arguments.
	#[error("Expect {expected} arguments, got {got}")]
	ArityMismatch { expected: usize, got: usize },
	/// Error for `.` access on a value without attributes.
	#[error("{0} does not support attribute access")]
	NotAccessor(String),
	/// Error for an attribute the target does not define.
	#[error("{target} does not have an attribute {attr:?}")]
	UnknownAttribute { target: &'static str, attr: String },
	/// Error for `[]` access on a value that cannot be indexed.
	#[error("{0} cannot be indexed")]
	NotIndexable(String),
	/// Error for a map key that is not a string.
	#[error("Expected a string as a map key")]
	BadMapKey,
	/// Error for an array index that is not a number.
	#[error("Expected a number as an array index")]
	BadArrayIndex,
	/// Error for an array index outside the array bounds.
	#[error("Index {index} out of range for array of size {len}")]
	IndexOutOfRange { index: i64, len: usize },
	/// Error for iterating with something that is not callable.
	#[error("{target} 'loop' expects a callable as its only argument")]
	BadLoopCallable { target: &'static str },
	/// Error for an iteration callable of unsupported arity.
	#[error("{target} 'loop' accepts a callable with arity 1 or 2, got {got}")]
	BadLoopArity { target: &'static str, got: usize },
	/// Error for a `get` whose URL argument is not a string.
	#[error("'get' expects a URL string as its 1st argument")]
	BadGetUrl,
	/// Error for a `get` whose header argument is not a map.
	#[error("'get' requires a map as its 2nd argument")]
	BadGetHeaders,
	/// Error for a URL without an http or https scheme.
	#[error("Missing a valid URL scheme: {0:?}")]
	MissingUrlScheme(String),
	/// Error from the HTTP client while performing a request.
	#[error("{0}")]
	Http(String),
	/// Error for language surfaces with no collaborator wired in.
	#[error("{0} is not implemented")]
	NotImplemented(&'static str),
	/// Error for a work item the pool could not accept.
	#[error("Failed to submit work item: {0}")]
	Submit(&'static str),
	/// Error for a top-level form that is not a tagged closure.
	#[error("Only tagged closures are allowed as global variables")]
	TopLevelNotTagged,
	/// Error for a program without an entry point.
	#[error("Missing 'init' tagged closure")]
	MissingInit,
	/// Error writing program output.
	#[error("Failed to write output: {0}")]
	Io(#[from] std::io::Error),
	/// Not an error: the control signal produced by a `return` statement,
	/// caught by the enclosing closure invocation.
	#[error("'return' outside a closure body")]
	Return(Value),
}

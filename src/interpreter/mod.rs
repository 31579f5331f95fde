//! The ScraperLang tree-walking evaluator.
//!
//! Execution starts at the `init` tagged closure, which runs synchronously
//! on the calling thread. Every `get` expression it (or anything it calls)
//! evaluates enqueues a work item on a bounded worker pool and immediately
//! returns `nil`. When a response arrives, the worker looks up the tagged
//! closure named by the request's tag and invokes it in a fresh root
//! environment seeded with the response fields; that closure may enqueue
//! further requests. [`Interpreter::exec`] returns once `init` has finished
//! and the pool has drained.
//!
//! Three capability sets drive evaluation: callables (closures, builtins and
//! containers-as-loops), accessors (`.field`) and indexables (`[key]`).
//! Values self-describe which they satisfy; dispatch is a match on the value
//! variant.
//!
//! `return` unwinds by traveling up the evaluation as a dedicated
//! control-signal variant of the error channel; the closure-invocation
//! frame catches it and converts it back into a value.

pub mod callable;
pub mod collections;
pub mod http;
pub mod pool;
pub mod value;
pub mod work;

use std::{
	collections::HashMap,
	io::Write,
	sync::{Arc, Mutex, PoisonError, Weak},
};

use value::Value;

use crate::{
	ScrapeError,
	environment::{Env, Environment},
	error::interpreter::RuntimeError,
	interpreter::{
		callable::ClosureValue,
		http::{HttpClient, UreqClient},
		pool::Pool,
		work::GetWork,
	},
	parser::expression::{Expression, TaggedClosure},
	scanner::{Token, TokenType},
	utils::ArcLock,
};

/// Number of concurrent HTTP workers.
const POOL_SIZE: usize = 10;

/// The required entry-point closure.
const INIT_TAG: &str = "init";

/// Where `print` writes. Shared because workers print too.
pub(crate) type Output = Arc<Mutex<dyn Write + Send>>;

/// Interpreter that executes a parsed ScraperLang program.
pub struct Interpreter {
	tagged: HashMap<String, TaggedClosure>,
	http:   Arc<dyn HttpClient>,
	out:    Output,
}

impl std::fmt::Debug for Interpreter {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Interpreter").field("tagged", &self.tagged).finish_non_exhaustive()
	}
}

impl Interpreter {
	/// Validates the top level of the AST and builds the tagged-closure
	/// table. Only tagged closures may appear there and `init` must be among
	/// them. A repeated name keeps its last definition.
	pub fn new(ast: Vec<Expression>) -> Result<Self, RuntimeError> {
		let mut tagged = HashMap::new();
		for expr in ast {
			match expr {
				Expression::Tagged(closure) => {
					tagged.insert(closure.name.lexeme.clone(), closure);
				}
				_ => return Err(RuntimeError::TopLevelNotTagged),
			}
		}

		if !tagged.contains_key(INIT_TAG) {
			return Err(RuntimeError::MissingInit);
		}

		Ok(Self {
			tagged,
			http: Arc::new(UreqClient::new()),
			out: Arc::new(Mutex::new(std::io::stdout())),
		})
	}

	/// Replaces the HTTP collaborator, e.g. with a canned client in tests.
	pub fn with_http(mut self, http: Arc<dyn HttpClient>) -> Self {
		self.http = http;
		self
	}

	/// Redirects `print` output away from stdout.
	pub fn with_output(mut self, out: impl Write + Send + 'static) -> Self {
		self.out = Arc::new(Mutex::new(out));
		self
	}

	/// Runs the program: evaluates `init`, then blocks until every
	/// dispatched work item has completed.
	pub fn exec(self) -> Result<(), ScrapeError> {
		let runtime = Runtime::new(self.tagged, self.http, self.out);
		let Some(init) = runtime.tagged(INIT_TAG) else {
			return Err(RuntimeError::MissingInit.into());
		};

		let env = Environment::new(HashMap::new(), None);
		runtime.run_body(&init.body, &env)?;

		runtime.pool.wait();
		Ok(())
	}
}

/// The shared execution state: the tagged-closure table, the worker pool
/// and the collaborators. Workers hold an `Arc` of this for the duration of
/// a work item.
pub struct Runtime {
	me:     Weak<Runtime>,
	tagged: HashMap<String, TaggedClosure>,
	pool:   Pool,
	http:   Arc<dyn HttpClient>,
	out:    Output,
}

impl Runtime {
	fn new(tagged: HashMap<String, TaggedClosure>, http: Arc<dyn HttpClient>, out: Output) -> Arc<Self> {
		Arc::new_cyclic(|me| Self { me: me.clone(), tagged, pool: Pool::new(POOL_SIZE), http, out })
	}

	pub(crate) fn http(&self) -> &dyn HttpClient { self.http.as_ref() }

	pub(crate) fn tagged(&self, name: &str) -> Option<&TaggedClosure> { self.tagged.get(name) }

	/// Evaluates the expressions of a closure body in order. A `return`
	/// signal is caught here; otherwise the last expression's value is the
	/// body's value.
	pub(crate) fn run_body(&self, body: &[Expression], env: &Env) -> Result<Value, RuntimeError> {
		let mut last = Value::Nil;
		for expr in body {
			match self.evaluate(expr, env) {
				Ok(value) => last = value,
				Err(RuntimeError::Return(value)) => return Ok(value),
				Err(err) => return Err(err),
			}
		}
		Ok(last)
	}

	/// Evaluate the given expression and return its value.
	fn evaluate(&self, expr: &Expression, env: &Env) -> Result<Value, RuntimeError> {
		match expr {
			Expression::Tagged(closure) => {
				self.run_body(&closure.body, env)?;
				Ok(Value::Nil)
			}
			Expression::Literal(token) => match &token.r#type {
				TokenType::NumberLiteral(n) => Ok(Value::Number(*n)),
				TokenType::StringLiteral(s) => Ok(Value::Str(s.clone())),
				TokenType::True => Ok(Value::Boolean(true)),
				TokenType::False => Ok(Value::Boolean(false)),
				TokenType::Nil => Ok(Value::Nil),
				TokenType::Ident(_) => env.get(token),
				other => Err(anyhow::anyhow!("token {other:?} is not a literal").into()),
			},
			Expression::Assign { name, value } => {
				let value = self.evaluate(value, env)?;
				env.set(&name.lexeme, value.clone());
				Ok(value)
			}
			Expression::Array { entries } => {
				let mut values = Vec::with_capacity(entries.len());
				for entry in entries {
					values.push(self.evaluate(entry, env)?);
				}
				Ok(Value::Array(ArcLock::new(values)))
			}
			Expression::Map { entries } => {
				let mut values = HashMap::with_capacity(entries.len());
				for (key, value) in entries {
					values.insert(key.clone(), self.evaluate(value, env)?);
				}
				Ok(Value::Map(ArcLock::new(values)))
			}
			Expression::Closure { params, body } => {
				let closure = ClosureValue::new(params.clone(), body.clone(), env.clone());
				Ok(Value::Closure(Arc::new(closure)))
			}
			Expression::Call { callee, args } => {
				let callee = self.evaluate(callee, env)?;
				let mut values = Vec::with_capacity(args.len());
				for arg in args {
					values.push(self.evaluate(arg, env)?);
				}
				self.call(&callee, values)
			}
			Expression::Access { target, field } => {
				let target = self.evaluate(target, env)?;
				collections::attr(&target, field)
			}
			Expression::MapAccess { target, key } => {
				let target = self.evaluate(target, env)?;
				let key = self.evaluate(key, env)?;
				collections::index(&target, key)
			}
			Expression::HtmlAttr { .. } => Err(RuntimeError::NotImplemented("HTML attribute access")),
			Expression::Print { args } => {
				let mut values = Vec::with_capacity(args.len());
				for arg in args {
					values.push(self.evaluate(arg, env)?.to_string());
				}
				let mut out = self.out.lock().unwrap_or_else(PoisonError::into_inner);
				writeln!(out, "{}", values.join(" "))?;
				Ok(Value::Nil)
			}
			Expression::Return { value } => {
				let value = match value {
					Some(value) => self.evaluate(value, env)?,
					None => Value::Nil,
				};
				Err(RuntimeError::Return(value))
			}
			Expression::Get { tag, url, headers } => self.dispatch_get(tag, url, headers.as_deref(), env),
		}
	}

	/// Invokes a callable with already-evaluated arguments. Arity must match
	/// exactly.
	pub(crate) fn call(&self, callee: &Value, args: Vec<Value>) -> Result<Value, RuntimeError> {
		match callee {
			Value::Closure(closure) => {
				if closure.arity() != args.len() {
					return Err(RuntimeError::ArityMismatch {
						expected: closure.arity(),
						got:      args.len(),
					});
				}
				let mut init = HashMap::with_capacity(args.len());
				for (param, arg) in closure.params.iter().zip(args) {
					init.insert(param.lexeme.clone(), arg);
				}
				// The new frame's parent is the captured environment, not
				// the caller's.
				let env = Environment::new(init, Some(closure.env.clone()));
				self.run_body(&closure.body, &env)
			}
			Value::Builtin(builtin) => {
				if builtin.arity != args.len() {
					return Err(RuntimeError::ArityMismatch { expected: builtin.arity, got: args.len() });
				}
				(builtin.func)(self, &args)
			}
			Value::Array(_) | Value::Map(_) => {
				if args.len() != 1 {
					return Err(RuntimeError::ArityMismatch { expected: 1, got: args.len() });
				}
				collections::iterate(self, callee, &args[0])
			}
			other => Err(RuntimeError::NotCallable(other.to_string())),
		}
	}

	/// Evaluates the arguments of a `get` expression and enqueues the work
	/// item. Never blocks; the expression's value is `nil`.
	fn dispatch_get(
		&self,
		tag: &Option<Token>,
		url: &Expression,
		headers: Option<&Expression>,
		env: &Env,
	) -> Result<Value, RuntimeError> {
		let url = match self.evaluate(url, env)? {
			Value::Str(url) => url,
			_ => return Err(RuntimeError::BadGetUrl),
		};

		let headers = match headers {
			Some(expr) => match self.evaluate(expr, env)? {
				Value::Map(map) => work::flatten_headers(&map),
				_ => return Err(RuntimeError::BadGetHeaders),
			},
			None => Vec::new(),
		};

		let tag = match tag {
			Some(token) => match &token.r#type {
				TokenType::Tag(name) => name.clone(),
				other => return Err(anyhow::anyhow!("expected a tag token, got {other:?}").into()),
			},
			None => work::DEFAULT_TAG.to_string(),
		};

		let work = GetWork { tag, url, headers };
		let runtime =
			self.me.upgrade().ok_or_else(|| anyhow::anyhow!("worker pool outlived its runtime"))?;
		self.pool.submit(Box::new(move || work.run(&runtime)))?;

		Ok(Value::Nil)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::{interpreter::callable::BuiltinValue, parser::Parser, scanner::Scanner};

	/// Canned HTTP collaborator recording the requests it serves.
	struct StaticHttp {
		status: u16,
		body:   &'static str,
		seen:   Mutex<Vec<(String, Vec<(String, String)>)>>,
	}

	impl StaticHttp {
		fn new(status: u16, body: &'static str) -> Arc<Self> {
			Arc::new(Self { status, body, seen: Mutex::new(Vec::new()) })
		}
	}

	impl HttpClient for StaticHttp {
		fn get(&self, url: &str, headers: &[(String, String)]) -> anyhow::Result<http::HttpResponse> {
			self.seen.lock().unwrap().push((url.to_string(), headers.to_vec()));
			Ok(http::HttpResponse {
				status:  self.status,
				body:    self.body.to_string(),
				headers: vec![("content-type".to_string(), "text/html".to_string())],
			})
		}
	}

	/// Write adapter collecting program output in a shared buffer.
	#[derive(Clone, Default)]
	struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

	impl SharedBuffer {
		fn contents(&self) -> String { String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned() }
	}

	impl Write for SharedBuffer {
		fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
			self.0.lock().unwrap().extend_from_slice(buf);
			Ok(buf.len())
		}

		fn flush(&mut self) -> std::io::Result<()> { Ok(()) }
	}

	fn interpreter(source: &str) -> Result<Interpreter, ScrapeError> {
		let tokens = Scanner::new(source).scan_tokens()?;
		let ast = Parser::new(tokens).parse()?;
		Ok(Interpreter::new(ast)?)
	}

	fn run_with(source: &str, http: Arc<dyn HttpClient>) -> Result<String, ScrapeError> {
		let buffer = SharedBuffer::default();
		interpreter(source)?.with_http(http).with_output(buffer.clone()).exec()?;
		Ok(buffer.contents())
	}

	fn run(source: &str) -> Result<String, ScrapeError> { run_with(source, StaticHttp::new(200, "")) }

	#[test]
	fn print_writes_space_joined_line() {
		assert_eq!(run("init {\n\tprint \"hi\"\n}\n").unwrap(), "hi\n");
		assert_eq!(run("init {\n\tprint 1, \"a\", true, nil\n}\n").unwrap(), "1 a true nil\n");
	}

	#[test]
	fn get_dispatches_to_default_tag() {
		let source = "init {\n\tget \"https://example.com/x\"\n}\n\ndefault {\n\tprint status\n}\n";
		assert_eq!(run(source).unwrap(), "200\n");
	}

	#[test]
	fn tagged_get_dispatches_to_named_closure() {
		let source = "page {\n\tprint \"p\"\n}\n\ninit {\n\t@page get \"https://e/a\"\n}\n";
		assert_eq!(run(source).unwrap(), "p\n");
	}

	#[test]
	fn workers_can_dispatch_further_gets() {
		let source = "init {
	get \"https://e/a\"
}
default {
	@second get \"https://e/b\"
}
second {
	print \"done\"
}
";
		assert_eq!(run(source).unwrap(), "done\n");
	}

	#[test]
	fn response_fields_are_seeded() {
		let source =
			"init {\n\tget \"https://e/a\"\n}\n\ndefault {\n\tprint body, headers[\"content-type\"]\n}\n";
		let output = run_with(source, StaticHttp::new(200, "payload")).unwrap();
		assert_eq!(output, "payload text/html\n");
	}

	#[test]
	fn get_sends_flattened_headers() {
		let http = StaticHttp::new(200, "");
		let source = "init {\n\tget \"https://e/a\", {\"Accept\": \"text/html\"}\n}\n";
		run_with(source, http.clone()).unwrap();
		let seen = http.seen.lock().unwrap();
		assert_eq!(seen.len(), 1);
		assert_eq!(seen[0].0, "https://e/a");
		assert_eq!(seen[0].1, vec![("Accept".to_string(), "text/html".to_string())]);
	}

	#[test]
	fn get_requires_string_url_and_map_headers() {
		assert!(matches!(
			run("init {\n\tget 1\n}\n"),
			Err(ScrapeError::Runtime(RuntimeError::BadGetUrl))
		));
		assert!(matches!(
			run("init {\n\tget \"https://e/a\", 1\n}\n"),
			Err(ScrapeError::Runtime(RuntimeError::BadGetHeaders))
		));
	}

	#[test]
	fn bad_scheme_fails_the_work_item_not_the_interpreter() {
		let source = "init {\n\tget \"ftp://e/a\"\n}\n\ndefault {\n\tprint \"unreachable\"\n}\n";
		assert_eq!(run(source).unwrap(), "");
	}

	#[test]
	fn unknown_tag_completes_silently() {
		let source = "init {\n\t@ghost get \"https://e/a\"\n}\n";
		assert_eq!(run(source).unwrap(), "");
	}

	#[test]
	fn tag_closure_scope_is_parentless() {
		// `greeting` lives in init's scope; the worker must not see it.
		let source =
			"init {\n\tgreeting = \"hello\"\n\tget \"https://e/a\"\n}\n\ndefault {\n\tprint greeting\n}\n";
		assert_eq!(run(source).unwrap(), "");
	}

	#[test]
	fn missing_init_fails_construction() {
		let err = interpreter("page {\n\tprint \"p\"\n}\n").unwrap_err();
		assert_eq!(err.to_string(), "Missing 'init' tagged closure");
	}

	#[test]
	fn array_attributes() {
		assert_eq!(run("init {\n\tx = [1, 2, 3]\n\tprint x.size\n}\n").unwrap(), "3\n");
		assert_eq!(run("init {\n\tx = [1, 2, 3]\n\tprint x.first, x.last\n}\n").unwrap(), "1 3\n");
		assert_eq!(run("init {\n\tx = []\n\tprint x.size, x.first\n}\n").unwrap(), "0 nil\n");
	}

	#[test]
	fn map_access_missing_key_is_nil() {
		let source = "init {\n\tm = {\"a\": 1}\n\tprint m[\"a\"], m[\"b\"]\n}\n";
		assert_eq!(run(source).unwrap(), "1 nil\n");
	}

	#[test]
	fn array_index_out_of_range_is_fatal() {
		let err = run("init {\n\tx = [1]\n\tprint x[3]\n}\n").unwrap_err();
		assert!(matches!(
			err,
			ScrapeError::Runtime(RuntimeError::IndexOutOfRange { index: 3, len: 1 })
		));
		// The index is truncated towards zero before the bounds check.
		assert_eq!(run("init {\n\tx = [1, 2]\n\tprint x[1.9]\n}\n").unwrap(), "2\n");
	}

	#[test]
	fn closures_capture_their_defining_scope() {
		let source = "init {
	base = 10
	add = (n) {
		return base
	}
	base = 20
	print add(1)
}
";
		// Assignment after the closure definition shadows in the same frame,
		// so the closure sees the updated binding of init's frame.
		assert_eq!(run(source).unwrap(), "20\n");
	}

	#[test]
	fn closure_call_returns_last_expression_value() {
		// An assignment evaluates to its right-hand side, so it is the
		// body's value when it comes last.
		let source = "init {\n\tf = (a, b) {\n\t\tc = b\n\t}\n\tprint f(1, 2)\n}\n";
		assert_eq!(run(source).unwrap(), "2\n");
	}

	#[test]
	fn return_unwinds_only_the_enclosing_closure() {
		let source = "init {
	f = (a) {
		return a
		print \"unreachable\"
	}
	print f(7)
	print \"after\"
}
";
		assert_eq!(run(source).unwrap(), "7\nafter\n");
	}

	#[test]
	fn return_stops_a_tagged_body() {
		let source = "init {\n\tprint \"a\"\n\treturn\n\tprint \"b\"\n}\n";
		assert_eq!(run(source).unwrap(), "a\n");
	}

	#[test]
	fn array_loop_with_one_and_two_parameters() {
		let source = "init {
	items = [\"a\", \"b\"]
	items.loop((item) {
		print item
	})
	items.loop((index, item) {
		print index, item
	})
}
";
		assert_eq!(run(source).unwrap(), "a\nb\n0 a\n1 b\n");
	}

	#[test]
	fn map_loop_delivers_key_and_value() {
		let source = "init {
	m = {\"only\": 1}
	m.loop((value) {
		print value
	})
	m.loop((key, value) {
		print key, value
	})
}
";
		assert_eq!(run(source).unwrap(), "1\nonly 1\n");
	}

	#[test]
	fn loop_rejects_non_callables_and_bad_arity() {
		let err = run("init {\n\tx = [1]\n\tx.loop(2)\n}\n").unwrap_err();
		assert!(matches!(err, ScrapeError::Runtime(RuntimeError::BadLoopCallable { target: "Array" })));
		let err = run("init {\n\tx = [1]\n\tx.loop((a, b, c) {\n\t\tprint a\n\t})\n}\n").unwrap_err();
		assert!(matches!(err, ScrapeError::Runtime(RuntimeError::BadLoopArity { got: 3, .. })));
	}

	#[test]
	fn calling_a_non_callable_fails() {
		let err = run("init {\n\tx = 1\n\tx(1)\n}\n").unwrap_err();
		assert_eq!(err.to_string(), "1 is not a callable");
	}

	#[test]
	fn arity_is_checked_exactly() {
		let err = run("init {\n\tf = (a, b) {\n\t\tprint a\n\t}\n\tf(1)\n}\n").unwrap_err();
		assert!(matches!(
			err,
			ScrapeError::Runtime(RuntimeError::ArityMismatch { expected: 2, got: 1 })
		));
	}

	#[test]
	fn undefined_variable_reports_position() {
		let err = run("init {\n\tprint ghost\n}\n").unwrap_err();
		assert_eq!(err.to_string(), "[2:7] Undefined variable \"ghost\"");
	}

	#[test]
	fn unknown_attribute_fails() {
		let err = run("init {\n\tx = [1]\n\tprint x.height\n}\n").unwrap_err();
		assert_eq!(err.to_string(), "Array does not have an attribute \"height\"");
	}

	#[test]
	fn html_attr_accessor_is_reserved() {
		let err = run("init {\n\tx = \"n\"\n\tprint x~href\n}\n").unwrap_err();
		assert_eq!(err.to_string(), "HTML attribute access is not implemented");
	}

	#[test]
	fn top_level_must_be_tagged_closures() {
		// Hand-built AST: the parser cannot produce this shape, but the
		// interpreter still guards against it.
		let expr = Expression::Print { args: Vec::new() };
		let err = Interpreter::new(vec![expr]).unwrap_err();
		assert!(matches!(err, RuntimeError::TopLevelNotTagged));
	}

	#[test]
	fn builtin_values_are_callable() {
		let out: Output = Arc::new(Mutex::new(Vec::<u8>::new()));
		let runtime = Runtime::new(HashMap::new(), StaticHttp::new(200, ""), out);
		let double = BuiltinValue::new(
			"double",
			1,
			Box::new(|_, args| match args {
				[Value::Number(n)] => Ok(Value::Number(n * 2.0)),
				_ => Err(RuntimeError::BadArrayIndex),
			}),
		);
		let builtin = Value::Builtin(Arc::new(double));
		let result = runtime.call(&builtin, vec![Value::Number(21.0)]).unwrap();
		assert!(matches!(result, Value::Number(n) if n == 42.0));
		let err = runtime.call(&builtin, Vec::new()).unwrap_err();
		assert!(matches!(err, RuntimeError::ArityMismatch { expected: 1, got: 0 }));
	}
}

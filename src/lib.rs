//! # ScraperLang
//!
//! A tree-walking interpreter for ScraperLang, a small language for
//! expressing HTTP scraping pipelines as named, dispatchable handlers.
//!
//! A program is a set of *tagged closures*, top-level named blocks, of
//! which `init` is the entry point. From any closure the program can issue
//! an HTTP `get`; when the response arrives, control is dispatched to the
//! tagged closure selected by the request's `@tag` (or to `default`),
//! running on a bounded pool of workers with the response fields in scope:
//!
//! ``` text
//! init {
//!     @page get "https://example.com", {"Accept": "text/html"}
//! }
//!
//! page {
//!     print status
//! }
//! ```
//!
//! ## Pipeline
//!
//! Execution is staged strictly as scanner → parser → interpreter. The
//! scanner turns the source bytes into a flat token stream (newlines are
//! tokens: they terminate statements). The parser builds a list of tagged
//! closures by recursive descent, collecting as many syntax errors as it
//! can before giving up. The interpreter walks the tree: `init` runs
//! synchronously, `get` expressions enqueue work items, and execution
//! finishes when the worker pool drains.
//!
//! Untagged closures are first-class values capturing their defining
//! scope. Arrays and maps are shared by reference and double as callables
//! for iteration. Scope reads walk the parent chain while writes always
//! bind in the innermost frame, so assignment shadows instead of mutating.

pub mod cli;
mod environment;
mod error;
mod interpreter;
mod parser;
mod scanner;
mod scraper;
mod utils;

pub use error::{
	ScrapeError,
	interpreter::RuntimeError,
	parser::{ParseError, ParseErrors},
	scanner::ScanError,
};
pub use interpreter::{
	Interpreter,
	http::{HttpClient, HttpResponse, UreqClient},
	value::Value,
};
pub use parser::{Parser, expression::Expression};
pub use scanner::Scanner;
pub use scraper::Scraper;

use std::path::Path;

use anyhow::Context;

use crate::{ScrapeError, interpreter::Interpreter, parser::Parser, scanner::Scanner};

/// The front door of the interpreter: reads a source file and takes it
/// through scan, parse and execution.
pub struct Scraper;

impl Scraper {
	pub fn run_file(&self, path: &Path) -> Result<(), ScrapeError> {
		let source = std::fs::read_to_string(path).context("Failed to open source file")?;
		self.run(&source)
	}

	pub fn run(&self, source: &str) -> Result<(), ScrapeError> {
		let tokens = Scanner::new(source).scan_tokens()?;
		let ast = Parser::new(tokens).parse()?;
		Interpreter::new(ast)?.exec()
	}
}

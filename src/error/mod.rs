pub mod interpreter;
pub mod parser;
pub mod scanner;

use crate::error::{interpreter::RuntimeError, parser::ParseErrors, scanner::ScanError};

/// ScrapeError is the top-level error type for the ScraperLang interpreter.
#[derive(thiserror::Error, Debug)]
pub enum ScrapeError {
	/// Internal interpreter error, should never happen
	#[error("{0}")]
	InternalError(#[from] anyhow::Error),
	#[error(transparent)]
	Scan(#[from] ScanError),
	#[error("{0}")]
	Parse(ParseErrors),
	#[error(transparent)]
	Runtime(#[from] RuntimeError),
}

impl ScrapeError {
	/// Whether the error is a syntax-stage failure. The CLI exits with code
	/// 1 for these and code 2 for everything else.
	pub fn is_syntax(&self) -> bool { matches!(self, Self::Scan(_) | Self::Parse(_)) }
}

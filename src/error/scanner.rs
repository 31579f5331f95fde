/// A lexical error. The scanner stops at the first one it encounters and
/// discards any tokens produced so far.
#[derive(thiserror::Error, Debug)]
#[error("[{line}:{column}] {r#type}")]
pub struct ScanError {
	/// 1-based line for display. The scanner tracks lines 0-based.
	line:   usize,
	column: usize,
	r#type: ScanErrorType,
}

impl ScanError {
	pub fn new(line: usize, column: usize, r#type: ScanErrorType) -> Self {
		Self { line: line + 1, column, r#type }
	}
}

/// Types of lexical errors.
#[derive(Debug, PartialEq)]
pub enum ScanErrorType {
	/// A byte the lexical grammar has no rule for.
	UnexpectedCharacter(char),
	/// A string literal that is still open at the end of input.
	UnterminatedString,
	/// A string literal containing a raw newline.
	MultilineString,
	/// A decimal point with no digits after it.
	MissingFraction,
	/// A numeric lexeme that does not fit a 64-bit float.
	InvalidNumber(String),
	/// An `@` with no identifier characters after it.
	EmptyTag,
}

impl std::fmt::Display for ScanErrorType {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		use ScanErrorType::*;
		match self {
			UnexpectedCharacter(c) => write!(f, "encountered unexpected character {c:?}"),
			UnterminatedString => write!(f, "unterminated string"),
			MultilineString => write!(f, "multiline strings not supported"),
			MissingFraction => write!(f, "expects a fraction value after period"),
			InvalidNumber(lexeme) => write!(f, "invalid number literal {lexeme:?}"),
			EmptyTag => write!(f, "expected an identifier after '@'"),
		}
	}
}

//! Lexical analysis for ScraperLang source.
//!
//! The scanner walks the raw source bytes in a single forward pass and
//! groups them into tokens. Whitespace is skipped, but unlike most
//! curly-brace languages the newline is not: statements have no terminator
//! character, so `\n` is emitted as a token of its own and the parser treats
//! it the way other grammars treat `;`.
//!
//! Literal-bearing lexemes are decoded here. Since the scanner already has
//! to look at every character of a number or string to find its end, it also
//! converts the text into the payload the interpreter will use later.

mod token;

use TokenType::*;
pub use token::*;

use crate::error::scanner::{ScanError, ScanErrorType};

/// A scanner for ScraperLang source code
pub struct Scanner<'a> {
	/// User input source code
	source:  &'a str,
	/// Raw bytes of `source`; the lexical grammar is ASCII
	src:     &'a [u8],
	/// Points at the first byte of the lexeme being scanned
	start:   usize,
	/// Points at the byte currently being considered
	current: usize,
	/// 0-based line of `current`
	line:    usize,
	/// 0-based column of the start of the current lexeme
	column:  usize,
	/// Lexed tokens
	tokens:  Vec<Token>,
}

impl<'a> Scanner<'a> {
	pub fn new(source: &'a str) -> Self {
		Self { source, src: source.as_bytes(), start: 0, current: 0, line: 0, column: 0, tokens: Vec::new() }
	}

	/// Scan all tokens from the source code. Stops at the first lexical
	/// error; any tokens accumulated so far are discarded.
	pub fn scan_tokens(mut self) -> Result<Vec<Token>, ScanError> {
		while !self.is_at_end() {
			self.start = self.current;
			self.scan_token()?;
		}

		self.tokens.push(Token::new(Eof, "", self.line, self.column));
		Ok(self.tokens)
	}

	/// Scan a single token from the source code
	fn scan_token(&mut self) -> Result<(), ScanError> {
		let char = self.advance();
		match char {
			b'[' => self.add(LeftBracket),
			b']' => self.add(RightBracket),
			b'(' => self.add(LeftParen),
			b')' => self.add(RightParen),
			b'{' => self.add(LeftCurlyBracket),
			b'}' => self.add(RightCurlyBracket),
			b',' => self.add(Comma),
			b'.' => self.add(Period),
			b':' => self.add(Colon),
			b'~' => self.add(Tilde),
			b'=' => self.add(Equal),
			b'-' => {
				if self.peek() == Some(b'>') {
					self.advance();
					self.add(Arrow);
				} else {
					self.add(Minus);
				}
			}
			b'\'' | b'"' => self.string(char)?,
			b'@' => self.identifier()?,
			// Tab is not part of the lexical grammar but is taken as a
			// space for forward compatibility.
			b' ' | b'\t' | b'\r' => self.column += 1,
			b'\n' => {
				self.add(Newline);
				self.line += 1;
				self.column = 0;
			}
			c if c.is_ascii_alphabetic() || c == b'_' => self.identifier()?,
			c if c.is_ascii_digit() => self.number()?,
			c => {
				return Err(ScanError::new(self.line, self.column, ScanErrorType::UnexpectedCharacter(c as char)));
			}
		}
		Ok(())
	}

	/// Add a token spanning `start..current`, then advance the column past it
	fn add(&mut self, r#type: TokenType) {
		let lexeme = &self.source[self.start..self.current];
		self.tokens.push(Token::new(r#type, lexeme, self.line, self.column));
		self.column += lexeme.len();
	}

	/// Scan a string literal delimited by `delimiter`
	fn string(&mut self, delimiter: u8) -> Result<(), ScanError> {
		let mut terminated = false;
		while !self.is_at_end() {
			let char = self.advance();
			if char == b'\n' {
				return Err(ScanError::new(self.line, self.column, ScanErrorType::MultilineString));
			}
			// A delimiter preceded by a backslash does not close the string.
			if char == delimiter && self.src[self.current - 2] != b'\\' {
				terminated = true;
				break;
			}
		}

		if !terminated {
			return Err(ScanError::new(self.line, self.column, ScanErrorType::UnterminatedString));
		}
		let lexeme = &self.source[self.start..self.current];
		let body = lexeme[1..lexeme.len() - 1].to_string();
		self.add(StringLiteral(body));
		Ok(())
	}

	/// Scan an identifier, keyword or tag
	fn identifier(&mut self) -> Result<(), ScanError> {
		while self.peek().is_some_and(|c| c.is_ascii_alphanumeric() || c == b'_') {
			self.advance();
		}

		let lexeme = &self.source[self.start..self.current];
		if let Some(name) = lexeme.strip_prefix('@') {
			if name.is_empty() {
				return Err(ScanError::new(self.line, self.column, ScanErrorType::EmptyTag));
			}
			self.add(Tag(name.to_string()));
		} else {
			self.add(TokenType::keyword_or_ident(lexeme));
		}
		Ok(())
	}

	/// Scan a number literal
	fn number(&mut self) -> Result<(), ScanError> {
		while self.peek().is_some_and(|c| c.is_ascii_digit()) {
			self.advance();
		}

		if self.peek() == Some(b'.') {
			self.advance();
			// We expect at least one digit character after a period
			if !self.peek().is_some_and(|c| c.is_ascii_digit()) {
				return Err(ScanError::new(
					self.line,
					self.column + self.current - self.start,
					ScanErrorType::MissingFraction,
				));
			}
			while self.peek().is_some_and(|c| c.is_ascii_digit()) {
				self.advance();
			}
		}

		let lexeme = &self.source[self.start..self.current];
		let literal = lexeme
			.parse::<f64>()
			.map_err(|e| ScanError::new(self.line, self.column, ScanErrorType::InvalidNumber(e.to_string())))?;
		self.add(NumberLiteral(literal));
		Ok(())
	}

	/// Advance to the next byte
	fn advance(&mut self) -> u8 {
		let char = self.src[self.current];
		self.current += 1;
		char
	}

	/// Peek the current byte
	fn peek(&self) -> Option<u8> { self.src.get(self.current).copied() }

	fn is_at_end(&self) -> bool { self.current >= self.src.len() }
}

#[cfg(test)]
mod tests {
	use super::*;

	fn scan(input: &str) -> Vec<Token> { Scanner::new(input).scan_tokens().unwrap() }

	fn scan_err(input: &str) -> ScanError { Scanner::new(input).scan_tokens().unwrap_err() }

	fn types(input: &str) -> Vec<TokenType> { scan(input).into_iter().map(|t| t.r#type).collect() }

	#[test]
	fn scan_single_chars() {
		assert_eq!(
			types("[](){},.:~=-"),
			vec![
				LeftBracket,
				RightBracket,
				LeftParen,
				RightParen,
				LeftCurlyBracket,
				RightCurlyBracket,
				Comma,
				Period,
				Colon,
				Tilde,
				Equal,
				Minus,
				Eof
			]
		);
	}

	#[test]
	fn scan_always_ends_with_one_eof() {
		for input in ["", "a", "a b c", "init {\n}\n", " \t "] {
			let tokens = scan(input);
			assert_eq!(tokens.last().map(|t| t.r#type.clone()), Some(Eof));
			assert_eq!(tokens.iter().filter(|t| t.r#type == Eof).count(), 1);
		}
	}

	#[test]
	fn scan_arrow_and_minus() {
		assert_eq!(types("->"), vec![Arrow, Eof]);
		assert_eq!(types("-a"), vec![Minus, Ident("a".into()), Eof]);
		assert_eq!(types("- -"), vec![Minus, Minus, Eof]);
	}

	#[test]
	fn scan_strings() {
		assert_eq!(types(r#""hello""#), vec![StringLiteral("hello".into()), Eof]);
		assert_eq!(types("'hello'"), vec![StringLiteral("hello".into()), Eof]);
		assert_eq!(types(r#"'it\'s'"#), vec![StringLiteral(r"it\'s".into()), Eof]);
		assert_eq!(types(r#""""#), vec![StringLiteral("".into()), Eof]);
		// Delimiters match pairwise, the other quote is plain content.
		assert_eq!(types(r#""it's""#), vec![StringLiteral("it's".into()), Eof]);
	}

	#[test]
	fn scan_string_errors() {
		let err = scan_err("\"ab\nc\"");
		assert_eq!(err.to_string(), "[1:0] multiline strings not supported");
		let err = scan_err("'abc");
		assert_eq!(err.to_string(), "[1:0] unterminated string");
	}

	#[test]
	fn scan_numbers() {
		assert_eq!(types("0"), vec![NumberLiteral(0.0), Eof]);
		assert_eq!(types("42"), vec![NumberLiteral(42.0), Eof]);
		assert_eq!(types("3.14"), vec![NumberLiteral(3.14), Eof]);
		assert_eq!(types("123.456"), vec![NumberLiteral(123.456), Eof]);
	}

	#[test]
	fn scan_number_requires_fraction_digits() {
		let err = scan_err("1.");
		assert_eq!(err.to_string(), "[1:2] expects a fraction value after period");
		assert!(Scanner::new("1.x").scan_tokens().is_err());
	}

	#[test]
	fn scan_identifiers_and_keywords() {
		assert_eq!(types("x"), vec![Ident("x".into()), Eof]);
		assert_eq!(types("_name"), vec![Ident("_name".into()), Eof]);
		assert_eq!(types("snake_case9"), vec![Ident("snake_case9".into()), Eof]);
		assert_eq!(types("true"), vec![True, Eof]);
		assert_eq!(types("false"), vec![False, Eof]);
		assert_eq!(types("nil"), vec![Nil, Eof]);
		assert_eq!(types("print"), vec![Print, Eof]);
		assert_eq!(types("get"), vec![Get, Eof]);
		assert_eq!(types("post"), vec![Post, Eof]);
		assert_eq!(types("return"), vec![Return, Eof]);
		// Keywords embedded in longer identifiers stay identifiers.
		assert_eq!(types("getter"), vec![Ident("getter".into()), Eof]);
	}

	#[test]
	fn scan_tags() {
		assert_eq!(types("@page"), vec![Tag("page".into()), Eof]);
		assert_eq!(types("@p2_x"), vec![Tag("p2_x".into()), Eof]);
		let err = scan_err("@ get");
		assert_eq!(err.to_string(), "[1:0] expected an identifier after '@'");
	}

	#[test]
	fn scan_newlines_are_tokens() {
		assert_eq!(types("a\nb"), vec![Ident("a".into()), Newline, Ident("b".into()), Eof]);
		assert_eq!(types("\n\n"), vec![Newline, Newline, Eof]);
	}

	#[test]
	fn scan_rejects_unknown_bytes() {
		assert!(Scanner::new("#").scan_tokens().is_err());
		assert!(Scanner::new(";").scan_tokens().is_err());
		assert!(Scanner::new("héllo").scan_tokens().is_err());
	}

	#[test]
	fn scan_positions() {
		let tokens = scan("ab cd\nef");
		assert_eq!((tokens[0].line, tokens[0].column), (0, 0));
		assert_eq!((tokens[1].line, tokens[1].column), (0, 3));
		// Newline token, then first token of the next line.
		assert_eq!((tokens[3].line, tokens[3].column), (1, 0));
	}

	#[test]
	fn scan_statement() {
		let tokens = scan("init {\n\tprint \"hi\"\n}\n");
		let kinds = tokens.into_iter().map(|t| t.r#type).collect::<Vec<_>>();
		assert_eq!(
			kinds,
			vec![
				Ident("init".into()),
				LeftCurlyBracket,
				Newline,
				Print,
				StringLiteral("hi".into()),
				Newline,
				RightCurlyBracket,
				Newline,
				Eof
			]
		);
	}
}

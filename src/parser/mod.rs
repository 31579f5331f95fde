//! Recursive-descent parsing for ScraperLang.
//!
//! The parser turns the token stream into a list of tagged closures. There
//! is no operator precedence to climb: the grammar is built from statements
//! (each terminated by a `Newline` token) and a small expression language of
//! literals, containers, closures and postfix access/call chains.
//!
//! ``` EBNF
//! program         := ( NEWLINE* tagged_closure )* EOF
//! tagged_closure  := IDENT '{' body '}'
//! body            := NEWLINE+ ( stmt NEWLINE+ )*
//! stmt            := tag_get | get_call | print_call | return_stmt | ident_stmt
//! tag_get         := TAG 'get' expression ( ',' expression )?
//! get_call        := 'get' expression ( ',' expression )?
//! print_call      := 'print' expression ( ',' expression )*
//! return_stmt     := 'return' expression?
//! ident_stmt      := IDENT ( '=' expression
//!                          | '(' arg_list? ')'
//!                          | '.' IDENT ( '(' arg_list? ')' | arg_list )
//!                          | arg_list )
//! expression      := postfix ( '~' IDENT )?
//!                  | postfix arg_list
//! postfix         := primary ( '(' arg_list? ')' | '[' expression ']' | '.' IDENT )*
//!                  | '{' map_body '}'
//!                  | '[' array_body ']'
//!                  | '(' params? ')' '{' body '}'
//! primary         := NUMBER | STRING | TRUE | FALSE | NIL | IDENT
//! ```
//!
//! Statement-level syntax errors are recorded and the parser skips to the
//! next newline and carries on, so a single run reports as many errors as
//! possible. Running out of tokens inside a construct is fatal.

pub mod expression;

use std::sync::Arc;

use TokenType::*;
use expression::{Expression, TaggedClosure};

use crate::{
	ScrapeError,
	error::parser::{ParseError, ParseErrorType, ParseErrors, ParserError},
	scanner::{Token, TokenType},
};

/// Builds an AST from the scanned tokens.
pub struct Parser {
	/// The tokens to parse.
	tokens:  Vec<Token>,
	/// Index of the token currently being considered.
	current: usize,
	/// Recoverable syntax errors collected so far.
	errs:    Vec<ParseError>,
}

impl Parser {
	pub fn new(tokens: Vec<Token>) -> Self { Self { tokens, current: 0, errs: Vec::new() } }

	/// Parse the token stream into a list of top-level expressions. When any
	/// syntax error was recorded the whole parse fails with all of them.
	pub fn parse(mut self) -> Result<Vec<Expression>, ScrapeError> {
		let mut ast = Vec::new();
		loop {
			self.eat_newlines();
			if self.at_eof() {
				break;
			}
			match self.tagged_closure() {
				Ok(closure) => ast.push(closure),
				Err(ParserError::Syntax(err)) => {
					self.errs.push(err);
					self.synchronize();
				}
				Err(ParserError::Fatal(err)) => {
					self.errs.push(err);
					return Err(ScrapeError::Parse(ParseErrors(self.errs)));
				}
			}
		}
		if self.errs.is_empty() { Ok(ast) } else { Err(ScrapeError::Parse(ParseErrors(self.errs))) }
	}

	fn tagged_closure(&mut self) -> Result<Expression, ParserError> {
		let name = self.consume(|t| matches!(t, Ident(_)), ParseErrorType::ExpectTaggedClosure)?;
		self.consume(|t| matches!(t, LeftCurlyBracket), ParseErrorType::ExpectClosureBody)?;
		let body = self.body()?;
		Ok(Expression::Tagged(TaggedClosure { name, body: Arc::new(body) }))
	}

	/// Parse the statements of a `{ ... }` body. The opening bracket has
	/// already been consumed.
	fn body(&mut self) -> Result<Vec<Expression>, ParserError> {
		// We expect at least one newline after the opening curly bracket
		self.consume(|t| matches!(t, Newline), ParseErrorType::ExpectNewline)?;
		self.eat_newlines();

		let mut exprs = Vec::new();
		while !matches!(self.peek()?.r#type, RightCurlyBracket | Eof) {
			let statement = self.statement().and_then(|expr| {
				// Each statement ends at a newline
				self.consume(|t| matches!(t, Newline), ParseErrorType::ExpectNewline)?;
				Ok(expr)
			});
			match statement {
				Ok(expr) => {
					exprs.push(expr);
					self.eat_newlines();
				}
				Err(ParserError::Syntax(err)) => {
					self.errs.push(err);
					self.synchronize();
				}
				Err(fatal) => return Err(fatal),
			}
		}

		self.consume(|t| matches!(t, RightCurlyBracket), ParseErrorType::ExpectRightCurly)?;
		Ok(exprs)
	}

	fn statement(&mut self) -> Result<Expression, ParserError> {
		let token = self.advance()?;
		match token.r#type {
			Tag(_) => {
				self.consume(|t| matches!(t, Get), ParseErrorType::ExpectGetAfterTag)?;
				self.get_expr(Some(token))
			}
			Get => self.get_expr(None),
			Print => self.print_expr(),
			Return => self.return_expr(),
			Ident(_) => self.ident_statement(token),
			_ => Err(ParserError::Syntax(ParseError::expected(&token, ParseErrorType::InvalidStatement))),
		}
	}

	/// Parse a statement starting with an identifier: an assignment, a
	/// parenthesized call, a method-style call or a paren-free call.
	fn ident_statement(&mut self, name: Token) -> Result<Expression, ParserError> {
		if matches!(self.peek()?.r#type, Equal) {
			self.advance()?;
			let value = self.expression()?;
			return Ok(Expression::Assign { name, value: Box::new(value) });
		}

		if matches!(self.peek()?.r#type, LeftParen) {
			self.advance()?;
			let args = self.expression_list(true)?;
			self.consume(|t| matches!(t, RightParen), ParseErrorType::ExpectRightParen)?;
			return Ok(Expression::Call { callee: Box::new(Expression::Literal(name)), args });
		}

		if matches!(self.peek()?.r#type, Period) {
			self.advance()?;
			let field = self.consume(|t| matches!(t, Ident(_)), ParseErrorType::ExpectFieldName)?;
			let args = if matches!(self.peek()?.r#type, LeftParen) {
				self.advance()?;
				let args = self.expression_list(true)?;
				self.consume(|t| matches!(t, RightParen), ParseErrorType::ExpectRightParen)?;
				args
			} else {
				// A free form call which needs at least one argument
				self.expression_list(false)?
			};
			let access = Expression::Access { target: Box::new(Expression::Literal(name)), field };
			return Ok(Expression::Call { callee: Box::new(access), args });
		}

		if matches!(self.peek()?.r#type, Newline) {
			self.errs.push(ParseError::new(&name, ParseErrorType::FreeCallWithoutArgs));
			return Ok(Expression::Call { callee: Box::new(Expression::Literal(name)), args: Vec::new() });
		}

		// A call expression without the parenthesis
		let args = self.expression_list(false)?;
		if args.is_empty() {
			self.errs.push(ParseError::new(&name, ParseErrorType::FreeCallWithoutArgs));
		}
		Ok(Expression::Call { callee: Box::new(Expression::Literal(name)), args })
	}

	fn get_expr(&mut self, tag: Option<Token>) -> Result<Expression, ParserError> {
		// At least a single expression as the URL argument
		let url = self.expression()?;

		// An optional header argument completes the statement
		let headers = if !matches!(self.peek()?.r#type, Newline) {
			self.consume(|t| matches!(t, Comma), ParseErrorType::ExpectComma)?;
			Some(Box::new(self.expression()?))
		} else {
			None
		};

		Ok(Expression::Get { tag, url: Box::new(url), headers })
	}

	fn print_expr(&mut self) -> Result<Expression, ParserError> {
		// We expect at least one expression
		let mut args = vec![self.expression()?];
		while matches!(self.peek()?.r#type, Comma) {
			self.advance()?;
			self.eat_newlines();
			args.push(self.expression()?);
		}
		Ok(Expression::Print { args })
	}

	fn return_expr(&mut self) -> Result<Expression, ParserError> {
		let value = if matches!(self.peek()?.r#type, Newline) {
			None
		} else {
			Some(Box::new(self.expression()?))
		};
		Ok(Expression::Return { value })
	}

	fn expression(&mut self) -> Result<Expression, ParserError> { self.html_attr_accessor() }

	fn html_attr_accessor(&mut self) -> Result<Expression, ParserError> {
		let expr = self.accessor()?;
		if matches!(self.peek()?.r#type, Tilde) {
			self.advance()?;
			let attr = self.consume(|t| matches!(t, Ident(_)), ParseErrorType::ExpectAttrName)?;
			return Ok(Expression::HtmlAttr { target: Box::new(expr), attr });
		}
		if !matches!(self.peek()?.r#type, Newline | Comma | RightBracket | RightCurlyBracket | RightParen | Eof)
		{
			// A free form call continuation
			let args = self.expression_list(false)?;
			return Ok(Expression::Call { callee: Box::new(expr), args });
		}
		Ok(expr)
	}

	/// Parse a primary expression and any chain of postfix call, index and
	/// attribute accesses hanging off it.
	fn accessor(&mut self) -> Result<Expression, ParserError> {
		if matches!(self.peek()?.r#type, LeftParen) {
			self.advance()?;
			return self.closure();
		}
		if matches!(self.peek()?.r#type, LeftBracket) {
			self.advance()?;
			return self.array_expr();
		}
		if matches!(self.peek()?.r#type, LeftCurlyBracket) {
			self.advance()?;
			return self.map_expr();
		}

		let mut expr = self.primary()?;
		loop {
			if matches!(self.peek()?.r#type, LeftParen) {
				self.advance()?;
				let args = self.expression_list(true)?;
				self.consume(|t| matches!(t, RightParen), ParseErrorType::ExpectRightParen)?;
				expr = Expression::Call { callee: Box::new(expr), args };
			} else if matches!(self.peek()?.r#type, LeftBracket) {
				self.advance()?;
				if matches!(self.peek()?.r#type, RightBracket) {
					let bracket = self.advance()?;
					return Err(ParserError::Syntax(ParseError::new(
						&bracket,
						ParseErrorType::MissingIndexKey,
					)));
				}
				let key = self.expression()?;
				self.consume(|t| matches!(t, RightBracket), ParseErrorType::ExpectRightBracket)?;
				expr = Expression::MapAccess { target: Box::new(expr), key: Box::new(key) };
			} else if matches!(self.peek()?.r#type, Period) {
				self.advance()?;
				let field = self.consume(|t| matches!(t, Ident(_)), ParseErrorType::ExpectFieldName)?;
				expr = Expression::Access { target: Box::new(expr), field };
			} else {
				return Ok(expr);
			}
		}
	}

	/// Parse a closure literal. The opening parenthesis has already been
	/// consumed.
	fn closure(&mut self) -> Result<Expression, ParserError> {
		let mut params = Vec::new();
		if !matches!(self.peek()?.r#type, RightParen) {
			params.push(self.consume(|t| matches!(t, Ident(_)), ParseErrorType::ExpectParameter)?);
			while matches!(self.peek()?.r#type, Comma) {
				self.advance()?;
				self.eat_newlines();
				params.push(self.consume(|t| matches!(t, Ident(_)), ParseErrorType::ExpectParameter)?);
			}
		}
		self.consume(|t| matches!(t, RightParen), ParseErrorType::ExpectRightParen)?;
		self.consume(|t| matches!(t, LeftCurlyBracket), ParseErrorType::ExpectClosureBody)?;
		let body = self.body()?;
		Ok(Expression::Closure { params: Arc::new(params), body: Arc::new(body) })
	}

	/// Parse an array literal. The opening bracket has already been consumed.
	fn array_expr(&mut self) -> Result<Expression, ParserError> {
		self.eat_newlines();
		let mut entries = Vec::new();
		if !matches!(self.peek()?.r#type, RightBracket) {
			entries.push(self.expression()?);
			while matches!(self.peek()?.r#type, Comma) {
				self.advance()?;
				self.eat_newlines();
				entries.push(self.expression()?);
			}
			self.eat_newlines();
		}
		self.consume(|t| matches!(t, RightBracket), ParseErrorType::ExpectRightBracket)?;
		Ok(Expression::Array { entries })
	}

	/// Parse a map literal. The opening curly bracket has already been
	/// consumed.
	fn map_expr(&mut self) -> Result<Expression, ParserError> {
		self.eat_newlines();
		let mut entries: Vec<(String, Expression)> = Vec::new();
		if !matches!(self.peek()?.r#type, RightCurlyBracket) {
			let (key, value) = self.map_entry()?;
			Self::insert_entry(&mut entries, key, value);
			while matches!(self.peek()?.r#type, Comma) {
				self.advance()?;
				self.eat_newlines();
				let (key, value) = self.map_entry()?;
				Self::insert_entry(&mut entries, key, value);
			}
			self.eat_newlines();
		}
		self.consume(|t| matches!(t, RightCurlyBracket), ParseErrorType::ExpectRightCurly)?;
		Ok(Expression::Map { entries })
	}

	fn map_entry(&mut self) -> Result<(String, Expression), ParserError> {
		// For now, only keys of type string are allowed
		let key = self.consume(|t| matches!(t, StringLiteral(_)), ParseErrorType::ExpectMapKey)?;
		self.consume(|t| matches!(t, Colon), ParseErrorType::ExpectColon)?;
		let value = self.expression()?;
		match key.r#type {
			StringLiteral(body) => Ok((body, value)),
			_ => Err(ParserError::Fatal(ParseError::new(&key, ParseErrorType::ExpectMapKey))),
		}
	}

	/// A duplicate key replaces the earlier entry; declared order is kept.
	fn insert_entry(entries: &mut Vec<(String, Expression)>, key: String, value: Expression) {
		if let Some(entry) = entries.iter_mut().find(|(existing, _)| *existing == key) {
			entry.1 = value;
		} else {
			entries.push((key, value));
		}
	}

	fn primary(&mut self) -> Result<Expression, ParserError> {
		let token = self.advance()?;
		match token.r#type {
			NumberLiteral(_) | StringLiteral(_) | True | False | Nil | Ident(_) => {
				Ok(Expression::Literal(token))
			}
			Eof => Err(ParserError::Fatal(ParseError::new(&token, ParseErrorType::UnexpectedEof))),
			_ => Err(ParserError::Syntax(ParseError::expected(&token, ParseErrorType::UnexpectedToken))),
		}
	}

	/// Parse zero or more comma-separated expressions. With `closing_paren`
	/// set an immediate `)` yields an empty list; otherwise an immediate
	/// newline records a missing-argument error.
	fn expression_list(&mut self, closing_paren: bool) -> Result<Vec<Expression>, ParserError> {
		if closing_paren && matches!(self.peek()?.r#type, RightParen) {
			return Ok(Vec::new());
		}

		if matches!(self.peek()?.r#type, Newline) {
			let err = ParseError::new(self.peek()?, ParseErrorType::FreeCallWithoutArgs);
			self.errs.push(err);
			return Ok(Vec::new());
		}

		let mut exprs = vec![self.expression()?];
		while matches!(self.peek()?.r#type, Comma) {
			self.advance()?;
			// At most consecutive newlines are allowed after a comma
			self.eat_newlines();
			exprs.push(self.expression()?);
		}
		Ok(exprs)
	}

	/// Peek at the current token.
	fn peek(&self) -> Result<&Token, ParserError> {
		self.tokens.get(self.current).ok_or_else(|| eof_error(self.tokens.last()))
	}

	/// Advance to the next token.
	fn advance(&mut self) -> Result<Token, ParserError> {
		let token = self.peek()?.clone();
		self.current += 1;
		Ok(token)
	}

	/// Consume the current token if `want` accepts it. Finding the end of
	/// input instead is fatal, anything else is a recoverable syntax error.
	fn consume(
		&mut self,
		want: fn(&TokenType) -> bool,
		r#type: ParseErrorType,
	) -> Result<Token, ParserError> {
		let token = self.peek()?;
		if want(&token.r#type) {
			self.advance()
		} else if matches!(token.r#type, Eof) {
			Err(ParserError::Fatal(ParseError::expected(token, r#type)))
		} else {
			Err(ParserError::Syntax(ParseError::expected(token, r#type)))
		}
	}

	/// Consume consecutive newline tokens.
	fn eat_newlines(&mut self) {
		while self.tokens.get(self.current).is_some_and(|t| matches!(t.r#type, Newline)) {
			self.current += 1;
		}
	}

	/// Skip to the next statement boundary after a syntax error.
	fn synchronize(&mut self) {
		while let Some(token) = self.tokens.get(self.current) {
			if matches!(token.r#type, Newline | RightCurlyBracket | Eof) {
				break;
			}
			self.current += 1;
		}
		self.eat_newlines();
	}

	fn at_eof(&self) -> bool { self.tokens.get(self.current).map_or(true, |t| matches!(t.r#type, Eof)) }
}

fn eof_error(last: Option<&Token>) -> ParserError {
	let err = match last {
		Some(token) => ParseError::new(token, ParseErrorType::UnexpectedEof),
		None => ParseError::new(&Token::new(Eof, "", 0, 0), ParseErrorType::UnexpectedEof),
	};
	ParserError::Fatal(err)
}

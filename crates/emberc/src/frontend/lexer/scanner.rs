//! Lexer implementation using logos

use super::token::{Token, TokenKind};
use crate::common::{CompileError, CompileResult, Span};
use logos::Logos;

/// Lexer for script source
pub struct Lexer<'a> {
    inner: logos::Lexer<'a, TokenKind>,
    peeked: Option<Token>,
    at_eof: bool,
}

impl<'a> Lexer<'a> {
    /// Create a new lexer for the given source code
    pub fn new(source: &'a str) -> Self {
        Self {
            inner: TokenKind::lexer(source),
            peeked: None,
            at_eof: false,
        }
    }

    /// Get the next token
    pub fn next_token(&mut self) -> CompileResult<Token> {
        if let Some(token) = self.peeked.take() {
            return Ok(token);
        }

        if self.at_eof {
            let len = self.inner.source().len();
            return Ok(Token::new(TokenKind::Eof, Span::new(len, len)));
        }

        match self.inner.next() {
            Some(Ok(kind)) => {
                let span = self.inner.span();
                Ok(Token::new(kind, Span::new(span.start, span.end)))
            }
            Some(Err(())) => {
                let span = self.inner.span();
                Err(CompileError::lexer(
                    format!("unexpected character '{}'", self.inner.slice()),
                    Span::new(span.start, span.end),
                ))
            }
            None => {
                self.at_eof = true;
                let len = self.inner.source().len();
                Ok(Token::new(TokenKind::Eof, Span::new(len, len)))
            }
        }
    }

    /// Peek at the next token without consuming it
    pub fn peek(&mut self) -> CompileResult<&Token> {
        let token = match self.peeked.take() {
            Some(token) => token,
            None => self.next_token()?,
        };
        Ok(self.peeked.insert(token))
    }

    /// Check if the next token matches the expected kind
    pub fn check(&mut self, expected: &TokenKind) -> CompileResult<bool> {
        Ok(std::mem::discriminant(&self.peek()?.kind) == std::mem::discriminant(expected))
    }

    /// Consume the next token if it matches, return true if consumed
    pub fn match_token(&mut self, expected: &TokenKind) -> CompileResult<bool> {
        if self.check(expected)? {
            self.next_token()?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    /// Tokenize the entire source and return all tokens, ending with `Eof`
    pub fn tokenize_all(mut self) -> CompileResult<Vec<Token>> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token()?;
            let is_eof = matches!(token.kind, TokenKind::Eof);
            tokens.push(token);
            if is_eof {
                break;
            }
        }
        Ok(tokens)
    }
}

//! Lexer module for tokenizing script source

mod token;
mod scanner;

pub use token::{Token, TokenKind};
pub use scanner::Lexer;

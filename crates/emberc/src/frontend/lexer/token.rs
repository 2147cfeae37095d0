//! Token definitions for the script lexer

use crate::common::Span;
use logos::Logos;

/// Token with source location
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

impl Token {
    pub fn new(kind: TokenKind, span: Span) -> Self {
        Self { kind, span }
    }
}

/// All token kinds of the script language
#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\n\r\f]+")]  // Skip whitespace
#[logos(skip r"//[^\n]*")]      // Skip line comments
#[logos(skip r"/\*[^*]*\*+(?:[^/*][^*]*\*+)*/")] // Skip block comments
pub enum TokenKind {
    // === Keywords ===
    #[token("if")]
    If,
    #[token("else")]
    Else,
    #[token("while")]
    While,
    #[token("do")]
    Do,
    #[token("for")]
    For,
    #[token("break")]
    Break,
    #[token("continue")]
    Continue,
    #[token("return")]
    Return,
    #[token("throw")]
    Throw,
    #[token("new")]
    New,
    #[token("instanceof")]
    Instanceof,
    #[token("true")]
    True,
    #[token("false")]
    False,
    #[token("null")]
    Null,

    // === Identifiers ===
    // Type names (`int`, `def`, `String`) are plain identifiers; the
    // analyzer resolves them through the host lookup.
    #[regex(r"[a-zA-Z_$][a-zA-Z0-9_$]*", |lex| lex.slice().to_string())]
    Identifier(String),

    // === Literals ===
    #[regex(r"0[xX][0-9a-fA-F]+[lL]?", |lex| lex.slice().to_string())]
    HexLiteral(String),

    #[regex(r"[0-9]+", |lex| lex.slice().to_string())]
    IntLiteral(String),

    #[regex(r"[0-9]+[lL]", |lex| lex.slice().to_string())]
    LongLiteral(String),

    // 1.5, 1.5e3, 2e-1, 3f, 4.0d
    #[regex(r"[0-9]+\.[0-9]+([eE][+-]?[0-9]+)?[fFdD]?", |lex| lex.slice().to_string())]
    #[regex(r"[0-9]+[eE][+-]?[0-9]+[fFdD]?", |lex| lex.slice().to_string())]
    #[regex(r"[0-9]+[fFdD]", |lex| lex.slice().to_string())]
    DecimalLiteral(String),

    // Either quote style; the raw text is kept and unescaped by the parser
    #[regex(r#""([^"\\]|\\.)*""#, |lex| lex.slice().to_string())]
    #[regex(r"'([^'\\]|\\.)*'", |lex| lex.slice().to_string())]
    StringLiteral(String),

    // === Operators ===
    // Arithmetic
    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("*")]
    Star,
    #[token("/")]
    Slash,
    #[token("%")]
    Percent,

    // Increment/Decrement
    #[token("++")]
    PlusPlus,
    #[token("--")]
    MinusMinus,

    // Comparison
    #[token("==")]
    EqEq,
    #[token("!=")]
    NotEq,
    #[token("<")]
    Lt,
    #[token(">")]
    Gt,
    #[token("<=")]
    LtEq,
    #[token(">=")]
    GtEq,

    // Logical
    #[token("&&")]
    AmpAmp,
    #[token("||")]
    PipePipe,
    #[token("!")]
    Bang,

    // Bitwise
    #[token("&")]
    Amp,
    #[token("|")]
    Pipe,
    #[token("^")]
    Caret,
    #[token("~")]
    Tilde,
    #[token("<<")]
    LtLt,
    #[token(">>")]
    GtGt,

    // Assignment
    #[token("=")]
    Eq,
    #[token("+=")]
    PlusEq,
    #[token("-=")]
    MinusEq,
    #[token("*=")]
    StarEq,
    #[token("/=")]
    SlashEq,
    #[token("%=")]
    PercentEq,
    #[token("&=")]
    AmpEq,
    #[token("|=")]
    PipeEq,
    #[token("^=")]
    CaretEq,
    #[token("<<=")]
    LtLtEq,
    #[token(">>=")]
    GtGtEq,

    // Punctuation
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,
    #[token(";")]
    Semi,
    #[token(",")]
    Comma,
    #[token(".")]
    Dot,
    #[token(":")]
    Colon,
    #[token("?")]
    Question,

    // Special
    Eof,
}

impl TokenKind {
    /// Check if this is an assignment operator
    pub fn is_assignment_op(&self) -> bool {
        matches!(
            self,
            TokenKind::Eq
                | TokenKind::PlusEq
                | TokenKind::MinusEq
                | TokenKind::StarEq
                | TokenKind::SlashEq
                | TokenKind::PercentEq
                | TokenKind::AmpEq
                | TokenKind::PipeEq
                | TokenKind::CaretEq
                | TokenKind::LtLtEq
                | TokenKind::GtGtEq
        )
    }

    pub fn is_numeric_literal(&self) -> bool {
        matches!(
            self,
            TokenKind::IntLiteral(_)
                | TokenKind::LongLiteral(_)
                | TokenKind::HexLiteral(_)
                | TokenKind::DecimalLiteral(_)
        )
    }

    /// Check if this token is a literal
    pub fn is_literal(&self) -> bool {
        self.is_numeric_literal()
            || matches!(
                self,
                TokenKind::StringLiteral(_) | TokenKind::True | TokenKind::False | TokenKind::Null
            )
    }

    /// Tokens that may follow `(Type)` when it is a reference-type cast
    pub fn can_follow_cast(&self) -> bool {
        self.is_literal()
            || matches!(
                self,
                TokenKind::Identifier(_)
                    | TokenKind::LParen
                    | TokenKind::Bang
                    | TokenKind::Tilde
                    | TokenKind::New
            )
    }
}

impl std::fmt::Display for TokenKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TokenKind::If => write!(f, "'if'"),
            TokenKind::Else => write!(f, "'else'"),
            TokenKind::While => write!(f, "'while'"),
            TokenKind::Do => write!(f, "'do'"),
            TokenKind::For => write!(f, "'for'"),
            TokenKind::Break => write!(f, "'break'"),
            TokenKind::Continue => write!(f, "'continue'"),
            TokenKind::Return => write!(f, "'return'"),
            TokenKind::Throw => write!(f, "'throw'"),
            TokenKind::New => write!(f, "'new'"),
            TokenKind::Instanceof => write!(f, "'instanceof'"),
            TokenKind::True => write!(f, "'true'"),
            TokenKind::False => write!(f, "'false'"),
            TokenKind::Null => write!(f, "'null'"),
            TokenKind::Identifier(s) => write!(f, "identifier '{}'", s),
            TokenKind::HexLiteral(s) => write!(f, "hex '{}'", s),
            TokenKind::IntLiteral(s) => write!(f, "integer '{}'", s),
            TokenKind::LongLiteral(s) => write!(f, "long '{}'", s),
            TokenKind::DecimalLiteral(s) => write!(f, "decimal '{}'", s),
            TokenKind::StringLiteral(s) => write!(f, "string {}", s),
            TokenKind::Plus => write!(f, "'+'"),
            TokenKind::Minus => write!(f, "'-'"),
            TokenKind::Star => write!(f, "'*'"),
            TokenKind::Slash => write!(f, "'/'"),
            TokenKind::Percent => write!(f, "'%'"),
            TokenKind::PlusPlus => write!(f, "'++'"),
            TokenKind::MinusMinus => write!(f, "'--'"),
            TokenKind::EqEq => write!(f, "'=='"),
            TokenKind::NotEq => write!(f, "'!='"),
            TokenKind::Lt => write!(f, "'<'"),
            TokenKind::Gt => write!(f, "'>'"),
            TokenKind::LtEq => write!(f, "'<='"),
            TokenKind::GtEq => write!(f, "'>='"),
            TokenKind::AmpAmp => write!(f, "'&&'"),
            TokenKind::PipePipe => write!(f, "'||'"),
            TokenKind::Bang => write!(f, "'!'"),
            TokenKind::Amp => write!(f, "'&'"),
            TokenKind::Pipe => write!(f, "'|'"),
            TokenKind::Caret => write!(f, "'^'"),
            TokenKind::Tilde => write!(f, "'~'"),
            TokenKind::LtLt => write!(f, "'<<'"),
            TokenKind::GtGt => write!(f, "'>>'"),
            TokenKind::Eq => write!(f, "'='"),
            TokenKind::PlusEq => write!(f, "'+='"),
            TokenKind::MinusEq => write!(f, "'-='"),
            TokenKind::StarEq => write!(f, "'*='"),
            TokenKind::SlashEq => write!(f, "'/='"),
            TokenKind::PercentEq => write!(f, "'%='"),
            TokenKind::AmpEq => write!(f, "'&='"),
            TokenKind::PipeEq => write!(f, "'|='"),
            TokenKind::CaretEq => write!(f, "'^='"),
            TokenKind::LtLtEq => write!(f, "'<<='"),
            TokenKind::GtGtEq => write!(f, "'>>='"),
            TokenKind::LParen => write!(f, "'('"),
            TokenKind::RParen => write!(f, "')'"),
            TokenKind::LBrace => write!(f, "'{{'"),
            TokenKind::RBrace => write!(f, "'}}'"),
            TokenKind::Semi => write!(f, "';'"),
            TokenKind::Comma => write!(f, "','"),
            TokenKind::Dot => write!(f, "'.'"),
            TokenKind::Colon => write!(f, "':'"),
            TokenKind::Question => write!(f, "'?'"),
            TokenKind::Eof => write!(f, "end of file"),
        }
    }
}

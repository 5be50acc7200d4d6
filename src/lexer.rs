use logos::Logos;
use std::fmt;
use thiserror::Error;

use crate::Span;

#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\n\r]+")] // Skip whitespace
#[logos(error = LexerErrorKind)]
pub enum TokenKind {
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,
    // Kept as text: the reader owns the integer conversion and its overflow error.
    #[regex(r"-?[0-9]+", |lex| lex.slice().to_string(), priority = 3)]
    Number(String),
    // A symbol never starts where a number could, so `5-3` is `5 -3` and `1a` is `1 a`.
    #[regex(
        r"-|(-[a-zA-Z_+\-*/\\=<>!&%]|[a-zA-Z_+*/\\=<>!&%])[a-zA-Z0-9_+\-*/\\=<>!&%]*",
        |lex| lex.slice().to_string()
    )]
    Symbol(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

// Implement Display for easy printing
impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::LParen => write!(f, "("),
            TokenKind::RParen => write!(f, ")"),
            TokenKind::LBrace => write!(f, "{{"),
            TokenKind::RBrace => write!(f, "}}"),
            TokenKind::Number(n) => write!(f, "{}", n),
            TokenKind::Symbol(s) => write!(f, "{}", s),
        }
    }
}

#[derive(Default, Debug, Clone, PartialEq, Error)]
pub enum LexerErrorKind {
    #[default]
    #[error("Invalid token")]
    InvalidToken,
}

#[derive(Debug, Clone, PartialEq, Error)]
#[error("{error}")]
pub struct LexerError {
    pub error: LexerErrorKind,
    pub span: Span,
}

// Result type alias for convenience
type LexerResult<T> = Result<T, LexerError>;

// Helper function to tokenize a string directly (useful for tests and parser)
pub fn tokenize(input: &str) -> LexerResult<Vec<Token>> {
    TokenKind::lexer(input)
        .spanned() // This yields (Result<TokenKind, LexerErrorKind>, Range<usize>)
        .map(|(result, range)| {
            let span = Span::new(range.start, range.end);
            match result {
                Ok(kind) => Ok(Token { kind, span }),
                Err(error) => Err(LexerError { error, span }),
            }
        })
        .collect()
}

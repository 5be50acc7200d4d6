use crate::Span;
use crate::lexer::{LexerError, Token, TokenKind};
use std::fmt;
use std::vec::IntoIter; // To iterate over Vec<Token>
use thiserror::Error;

pub const ROOT_TAG: &str = ">";
pub const NUMBER_TAG: &str = "expression|number|regex";
pub const SYMBOL_TAG: &str = "expression|symbol|regex";
pub const SEXPRESSION_TAG: &str = "expression|sexpression|>";
pub const QEXPRESSION_TAG: &str = "expression|qexpression|>";
pub const CHAR_TAG: &str = "char";
pub const REGEX_TAG: &str = "regex";

/// A node of the labeled parse tree handed to the reader.
///
/// `tag` names the grammar category (matched by substring), `contents` holds the
/// source text of leaves, and groups carry their delimiters as `char` children.
#[derive(Debug, Clone, PartialEq)]
pub struct TreeNode {
    pub tag: String,
    pub contents: String,
    pub span: Span,
    pub children: Vec<TreeNode>,
}

impl TreeNode {
    pub fn leaf(tag: &str, contents: impl Into<String>, span: Span) -> Self {
        TreeNode {
            tag: tag.to_string(),
            contents: contents.into(),
            span,
            children: Vec::new(),
        }
    }

    pub fn branch(tag: &str, children: Vec<TreeNode>, span: Span) -> Self {
        TreeNode {
            tag: tag.to_string(),
            contents: String::new(),
            span,
            children,
        }
    }
}

impl fmt::Display for TreeNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.children.is_empty() {
            write!(f, "{} '{}'", self.tag, self.contents)
        } else {
            write!(f, "{} [", self.tag)?;
            for (i, child) in self.children.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{}", child)?;
            }
            write!(f, "]")
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    #[error("Parse Error [at {}]: Unexpected token '{}', expected {expected}", .found.span, .found.kind)]
    UnexpectedToken { found: Token, expected: String },
    #[error("Parse Error: Unexpected end of input during parsing. Expected {0}")]
    UnexpectedEof(String),
    #[error("Lexer Error during parse: {0}")]
    LexerError(#[from] LexerError),
}

// Result type alias for convenience
type ParseResult<T> = Result<T, ParseError>;

pub struct Parser {
    tokens: IntoIter<Token>,
    // Byte offset one past the last token, used for the closing root marker.
    end: usize,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        let end = tokens.last().map_or(0, |t| t.span.end);
        Parser {
            tokens: tokens.into_iter(),
            end,
        }
    }

    // Consumes the next token if available.
    fn next_token(&mut self) -> Option<Token> {
        self.tokens.next()
    }

    /// Parses a single expression starting at `token`.
    fn parse_expr_with_token(&mut self, token: Token) -> ParseResult<TreeNode> {
        match token.kind {
            TokenKind::Number(text) => Ok(TreeNode::leaf(NUMBER_TAG, text, token.span)),
            TokenKind::Symbol(text) => Ok(TreeNode::leaf(SYMBOL_TAG, text, token.span)),
            TokenKind::LParen => self.parse_group(SEXPRESSION_TAG, "(", ")", token.span),
            TokenKind::LBrace => self.parse_group(QEXPRESSION_TAG, "{", "}", token.span),
            TokenKind::RParen | TokenKind::RBrace => Err(ParseError::UnexpectedToken {
                found: token,
                expected: "a number, symbol, '(' or '{'".to_string(),
            }),
        }
    }

    /// Parses the members of a `(...)` or `{...}` group up to its closing delimiter.
    fn parse_group(
        &mut self,
        tag: &str,
        open: &str,
        close: &str,
        open_span: Span,
    ) -> ParseResult<TreeNode> {
        let closing = if close == ")" {
            TokenKind::RParen
        } else {
            TokenKind::RBrace
        };
        let mut children = vec![TreeNode::leaf(CHAR_TAG, open, open_span)];
        loop {
            match self.next_token() {
                Some(token) if token.kind == closing => {
                    let span = open_span.merge(token.span);
                    children.push(TreeNode::leaf(CHAR_TAG, close, token.span));
                    return Ok(TreeNode::branch(tag, children, span));
                }
                Some(token) => children.push(self.parse_expr_with_token(token)?),
                None => return Err(ParseError::UnexpectedEof(format!("'{}'", close))),
            }
        }
    }

    /// Parses the whole token stream as `/^/ <expression>* /$/`.
    pub fn parse(mut self) -> ParseResult<TreeNode> {
        let mut children = vec![TreeNode::leaf(REGEX_TAG, "", Span::new(0, 0))];
        while let Some(token) = self.next_token() {
            children.push(self.parse_expr_with_token(token)?);
        }
        children.push(TreeNode::leaf(REGEX_TAG, "", Span::new(self.end, self.end)));
        Ok(TreeNode::branch(ROOT_TAG, children, Span::new(0, self.end)))
    }
}

// Helper function to lex and parse a string directly (useful for tests and REPL)
pub fn parse_str(input: &str) -> ParseResult<TreeNode> {
    let tokens = crate::lexer::tokenize(input)?;
    Parser::new(tokens).parse()
}

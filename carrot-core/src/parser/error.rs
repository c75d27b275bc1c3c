use std::fmt::Display;

use thiserror::Error;

use crate::ast::DataType;
use crate::lexer::{LexError, Token, TokenKind};

#[derive(Debug, PartialEq, Error)]
pub enum ParseError {
    #[error(transparent)]
    Lex(#[from] LexError),
    #[error("expected {expected}, found {} `{}` at line {}", .got.kind, .got.text, .got.line)]
    UnexpectedToken { expected: Expected, got: Token },
    #[error("invalid number literal `{}` at line {}", .token.text, .token.line)]
    InvalidLiteral { token: Token },
    #[error("unknown type `{}` at line {}", .token.text, .token.line)]
    UnknownType { token: Token },
    #[error(
        "variable `{name}` is declared as {} but initialised with a {} literal at line {line}",
        .declared.name(),
        .found.name()
    )]
    TypeMismatch {
        name: std::rc::Rc<str>,
        declared: DataType,
        found: DataType,
        line: usize,
    },
    #[error("function parameters must be plain identifiers, found `{parameter}` at line {line}")]
    InvalidParameter { parameter: String, line: usize },
    #[error("expression nested more than {limit} levels deep at line {line}")]
    NestingTooDeep { limit: usize, line: usize },
}

#[derive(Debug, PartialEq)]
pub enum Expected {
    Token(TokenKind),
    Identifier,
    Expression,
    TypeName,
}

impl Display for Expected {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Expected::Token(kind) => write!(f, "{}", kind),
            Expected::Identifier => write!(f, "an identifier"),
            Expected::Expression => write!(f, "an expression"),
            Expected::TypeName => write!(f, "a type name"),
        }
    }
}

impl ParseError {
    pub fn unexpected_token(expected: TokenKind, got: Token) -> ParseError {
        ParseError::UnexpectedToken {
            expected: Expected::Token(expected),
            got,
        }
    }

    pub fn unexpected_other(expected: Expected, got: Token) -> ParseError {
        ParseError::UnexpectedToken { expected, got }
    }

    /// Source line the error points at.
    pub fn line(&self) -> usize {
        match self {
            ParseError::Lex(error) => error.line(),
            ParseError::UnexpectedToken { got, .. } => got.line,
            ParseError::InvalidLiteral { token } | ParseError::UnknownType { token } => token.line,
            ParseError::TypeMismatch { line, .. }
            | ParseError::InvalidParameter { line, .. }
            | ParseError::NestingTooDeep { line, .. } => *line,
        }
    }
}

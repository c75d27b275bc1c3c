pub mod error;
pub mod expressions;
pub mod statements;

use std::rc::Rc;

use crate::ast::{DataType, Node};
use crate::lexer::{Token, TokenKind};
use crate::stack::ensure_sufficient_stack;
pub use error::{Expected, ParseError};
use statements::parse_statements;

/// Deepest nesting of expressions and blocks a script may use.
pub const MAX_NESTING: usize = 1000;

/// Recursive-descent parser over a token sequence that ends with `Eof`.
pub struct Parser {
    tokens: Vec<Token>,
    position: usize,
    /// Line of the most recently consumed token.
    last_line: usize,
    depth: usize,
}

impl Parser {
    pub fn new(mut tokens: Vec<Token>) -> Self {
        if tokens.last().map(|token| token.kind) != Some(TokenKind::Eof) {
            let line = tokens.last().map(|token| token.line).unwrap_or(1);
            tokens.push(Token {
                kind: TokenKind::Eof,
                text: "EOF".into(),
                line,
            });
        }
        Self {
            tokens,
            position: 0,
            last_line: 1,
            depth: 0,
        }
    }

    /// Peeks at the next token without advancing.
    pub(crate) fn lookahead(&self) -> &Token {
        &self.tokens[self.position]
    }

    /// Advances and returns the token that was current. `Eof` is never
    /// consumed, so repeated calls at the end keep returning it.
    pub(crate) fn consume(&mut self) -> Token {
        let token = self.tokens[self.position].clone();
        if token.kind != TokenKind::Eof {
            self.position += 1;
        }
        self.last_line = token.line;
        token
    }

    pub(crate) fn last_line(&self) -> usize {
        self.last_line
    }

    /// Runs one level of nested parsing, failing once `MAX_NESTING` levels are
    /// open.
    pub(crate) fn nested<T>(
        &mut self,
        parse: impl FnOnce(&mut Parser) -> Result<T, ParseError>,
    ) -> Result<T, ParseError> {
        if self.depth >= MAX_NESTING {
            return Err(ParseError::NestingTooDeep {
                limit: MAX_NESTING,
                line: self.lookahead().line,
            });
        }
        self.depth += 1;
        let result = ensure_sufficient_stack(|| parse(self));
        self.depth -= 1;
        result
    }

    pub(crate) fn consume_if(&mut self, kind: TokenKind) -> Option<Token> {
        if self.lookahead().kind == kind {
            Some(self.consume())
        } else {
            None
        }
    }

    pub(crate) fn parse_ident(&mut self) -> Result<Rc<str>, ParseError> {
        let token = self.consume();
        match token.kind {
            TokenKind::Ident => Ok(token.text),
            _ => Err(ParseError::unexpected_other(Expected::Identifier, token)),
        }
    }

    pub(crate) fn parse_type_name(&mut self) -> Result<DataType, ParseError> {
        let token = self.consume();
        match token.kind {
            TokenKind::Ident | TokenKind::Keyword(crate::lexer::Keyword::Null) => {
                DataType::from_name(&token.text).ok_or(ParseError::UnknownType { token })
            }
            _ => Err(ParseError::unexpected_other(Expected::TypeName, token)),
        }
    }

    pub(crate) fn expect_token(&mut self, token_kind: TokenKind) -> Result<Token, ParseError> {
        let token = self.consume();
        if token.kind == token_kind {
            Ok(token)
        } else {
            Err(ParseError::unexpected_token(token_kind, token))
        }
    }

    /// Parses the whole script into a single `Statements` root. The first
    /// error aborts parsing; no partial tree is produced.
    pub fn parse_program(&mut self) -> Result<Node, ParseError> {
        let statements = parse_statements(self, &[])?;
        self.expect_token(TokenKind::Eof)?;
        tracing::debug!(statements = statements.len(), "parsed script");
        Ok(Node::Statements(statements))
    }
}

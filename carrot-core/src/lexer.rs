use std::fmt::Display;
use std::rc::Rc;

use thiserror::Error;

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Keyword {
    If,
    Elif,
    Else,
    Iter,
    As,
    Return,
    End,
    Null,
}

impl Keyword {
    pub fn as_str(&self) -> &'static str {
        match self {
            Keyword::If => "if",
            Keyword::Elif => "elif",
            Keyword::Else => "else",
            Keyword::Iter => "iter",
            Keyword::As => "as",
            Keyword::Return => "return",
            Keyword::End => "end",
            Keyword::Null => "null",
        }
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum TokenKind {
    Int,
    Float,
    Str,
    Ident,
    Keyword(Keyword),

    // Operators
    Plus,
    Minus,
    Asterisk,
    Slash,
    Caret,
    Assign,

    Equal,
    NotEqual,
    LessThan,
    GreaterThan,
    LessEqual,
    GreaterEqual,

    // Delimiters
    LParen,
    RParen,
    LBracket,
    RBracket,
    Comma,
    Colon,
    Arrow,

    Eof,
    Unknown,
}

impl Display for TokenKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            TokenKind::Int => "integer",
            TokenKind::Float => "float",
            TokenKind::Str => "string",
            TokenKind::Ident => "identifier",
            TokenKind::Keyword(keyword) => return write!(f, "`{}`", keyword.as_str()),
            TokenKind::Plus => "`+`",
            TokenKind::Minus => "`-`",
            TokenKind::Asterisk => "`*`",
            TokenKind::Slash => "`/`",
            TokenKind::Caret => "`^`",
            TokenKind::Assign => "`=`",
            TokenKind::Equal => "`==`",
            TokenKind::NotEqual => "`!=`",
            TokenKind::LessThan => "`<`",
            TokenKind::GreaterThan => "`>`",
            TokenKind::LessEqual => "`<=`",
            TokenKind::GreaterEqual => "`>=`",
            TokenKind::LParen => "`(`",
            TokenKind::RParen => "`)`",
            TokenKind::LBracket => "`[`",
            TokenKind::RBracket => "`]`",
            TokenKind::Comma => "`,`",
            TokenKind::Colon => "`:`",
            TokenKind::Arrow => "`->`",
            TokenKind::Eof => "end of input",
            TokenKind::Unknown => "unknown token",
        };
        write!(f, "{}", text)
    }
}

#[derive(Debug, PartialEq, Clone)]
pub struct Token {
    pub kind: TokenKind,
    pub text: Rc<str>,
    pub line: usize,
}

impl Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:>4}  {:<16} {:?}", self.line, format!("{:?}", self.kind), self.text)
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Error)]
pub enum LexError {
    #[error("invalid number format `{text}` at line {line}")]
    MalformedNumber { text: String, line: usize },
    #[error("illegal escape sequence `{sequence}` at line {line}")]
    IllegalEscape { sequence: String, line: usize },
    #[error("unterminated string starting at line {line}")]
    UnterminatedString { line: usize },
}

impl LexError {
    pub fn line(&self) -> usize {
        match self {
            LexError::MalformedNumber { line, .. }
            | LexError::IllegalEscape { line, .. }
            | LexError::UnterminatedString { line } => *line,
        }
    }
}

fn keywords(ident: &str) -> Option<Keyword> {
    match ident {
        "if" => Some(Keyword::If),
        "elif" => Some(Keyword::Elif),
        "else" => Some(Keyword::Else),
        "iter" => Some(Keyword::Iter),
        "as" => Some(Keyword::As),
        "return" => Some(Keyword::Return),
        "end" => Some(Keyword::End),
        "null" => Some(Keyword::Null),
        _ => None,
    }
}

fn escape(ch: char) -> Option<char> {
    match ch {
        'r' => Some('\r'),
        'n' => Some('\n'),
        '\\' => Some('\\'),
        '\'' => Some('\''),
        '"' => Some('"'),
        't' => Some('\t'),
        _ => None,
    }
}

/// Single forward pass over the source; never backtracks.
#[derive(Clone)]
pub struct Tokenizer<'a> {
    input: &'a str,
    iter: std::iter::Peekable<std::str::CharIndices<'a>>,
    line: usize,
    finished: bool,
}

impl<'a> Tokenizer<'a> {
    pub fn new(input: &'a str) -> Self {
        let iter = input.char_indices().peekable();
        Self {
            input,
            iter,
            line: 1,
            finished: false,
        }
    }

    fn is_letter(ch: char) -> bool {
        ch.is_ascii_alphabetic() || ch == '_'
    }

    fn token(&self, kind: TokenKind, text: &str) -> Token {
        Token {
            kind,
            text: text.into(),
            line: self.line,
        }
    }

    fn read_identifier(&mut self, start: usize) -> Token {
        while self.iter.next_if(|(_, ch)| Self::is_letter(*ch)).is_some() {}

        let end = self.next_idx();
        let ident = &self.input[start..end];
        match keywords(ident) {
            Some(keyword) => self.token(TokenKind::Keyword(keyword), ident),
            None => self.token(TokenKind::Ident, ident),
        }
    }

    fn read_number(&mut self, start: usize) -> Result<Token, LexError> {
        while self
            .iter
            .next_if(|(_, ch)| ch.is_ascii_digit() || *ch == '.')
            .is_some()
        {}

        let end = self.next_idx();
        let number = &self.input[start..end];

        match number.matches('.').count() {
            0 => Ok(self.token(TokenKind::Int, number)),
            1 => Ok(self.token(TokenKind::Float, number)),
            _ => Err(LexError::MalformedNumber {
                text: number.to_owned(),
                line: self.line,
            }),
        }
    }

    fn read_string(&mut self) -> Result<Token, LexError> {
        let start_line = self.line;
        let mut string = String::new();
        loop {
            match self.iter.next() {
                Some((_, '"')) => break,
                Some((_, '\\')) => match self.iter.next() {
                    Some((_, ch)) => match escape(ch) {
                        Some(escaped) => string.push(escaped),
                        None => {
                            return Err(LexError::IllegalEscape {
                                sequence: format!("\\{}", ch),
                                line: self.line,
                            })
                        }
                    },
                    None => return Err(LexError::UnterminatedString { line: start_line }),
                },
                Some((_, ch)) => {
                    if ch == '\n' {
                        self.line += 1;
                    }
                    string.push(ch);
                }
                None => return Err(LexError::UnterminatedString { line: start_line }),
            }
        }

        Ok(Token {
            kind: TokenKind::Str,
            text: string.into(),
            line: start_line,
        })
    }

    fn skip_whitespace(&mut self) {
        while let Some((_, ch)) = self.iter.next_if(|(_, ch)| ch.is_whitespace()) {
            if ch == '\n' {
                self.line += 1;
            }
        }
    }

    // Stops before the newline so that `skip_whitespace` counts it.
    fn skip_comment(&mut self) {
        while self.iter.next_if(|(_, ch)| *ch != '\n').is_some() {}
    }

    fn next_idx(&mut self) -> usize {
        self.iter
            .peek()
            .map(|(idx, _)| *idx)
            .unwrap_or(self.input.len())
    }

    fn either(
        &mut self,
        next: char,
        matched: (TokenKind, &str),
        single: (TokenKind, &str),
    ) -> Token {
        if self.iter.next_if(|(_, ch)| *ch == next).is_some() {
            self.token(matched.0, matched.1)
        } else {
            self.token(single.0, single.1)
        }
    }

    pub fn next_token(&mut self) -> Result<Token, LexError> {
        loop {
            self.skip_whitespace();

            let Some((idx, ch)) = self.iter.next() else {
                return Ok(self.token(TokenKind::Eof, "EOF"));
            };

            let tok = match ch {
                c if Self::is_letter(c) => self.read_identifier(idx),
                c if c.is_ascii_digit() => self.read_number(idx)?,
                '"' => self.read_string()?,
                '+' => self.token(TokenKind::Plus, "+"),
                '*' => self.token(TokenKind::Asterisk, "*"),
                '/' => self.token(TokenKind::Slash, "/"),
                '^' => self.token(TokenKind::Caret, "^"),
                ',' => self.token(TokenKind::Comma, ","),
                ':' => self.token(TokenKind::Colon, ":"),
                '(' => self.token(TokenKind::LParen, "("),
                ')' => self.token(TokenKind::RParen, ")"),
                '[' => self.token(TokenKind::LBracket, "["),
                ']' => self.token(TokenKind::RBracket, "]"),
                '=' => self.either('=', (TokenKind::Equal, "=="), (TokenKind::Assign, "=")),
                '<' => self.either('=', (TokenKind::LessEqual, "<="), (TokenKind::LessThan, "<")),
                '>' => self.either(
                    '=',
                    (TokenKind::GreaterEqual, ">="),
                    (TokenKind::GreaterThan, ">"),
                ),
                '!' => self.either('=', (TokenKind::NotEqual, "!="), (TokenKind::Unknown, "!")),
                '-' => match self.iter.peek() {
                    Some((_, '-')) => {
                        self.skip_comment();
                        continue;
                    }
                    Some((_, '>')) => {
                        self.iter.next();
                        self.token(TokenKind::Arrow, "->")
                    }
                    _ => self.token(TokenKind::Minus, "-"),
                },
                other => {
                    tracing::warn!(
                        line = self.line,
                        character = ?other,
                        "skipping unrecognised character"
                    );
                    continue;
                }
            };

            return Ok(tok);
        }
    }
}

impl<'a> Iterator for Tokenizer<'a> {
    type Item = Result<Token, LexError>;

    /// Yields every token up to and including `Eof`, or the first error.
    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        let token = self.next_token();
        match &token {
            Ok(Token {
                kind: TokenKind::Eof,
                ..
            })
            | Err(_) => self.finished = true,
            _ => {}
        }
        Some(token)
    }
}

/// Tokenizes the whole source. The result always ends with an `Eof` token.
pub fn tokenize(source: &str) -> Result<Vec<Token>, LexError> {
    Tokenizer::new(source).collect()
}

use super::error::{Expected, ParseError};
use crate::ast::{BinaryOperator, LiteralValue, Node, UnaryOperator};
use crate::lexer::{Keyword, TokenKind};
use crate::parser::Parser;

type Operand = fn(&mut Parser) -> Result<Node, ParseError>;

pub fn parse_expression(parser: &mut Parser) -> Result<Node, ParseError> {
    parser.nested(parse_comparison)
}

/// Folds `operand (op operand)*` into a left-leaning tree so operators of
/// equal precedence evaluate left to right.
fn parse_binary_layer(
    parser: &mut Parser,
    operator_of: fn(TokenKind) -> Option<BinaryOperator>,
    operand: Operand,
) -> Result<Node, ParseError> {
    let mut left = operand(parser)?;

    while let Some(operator) = operator_of(parser.lookahead().kind) {
        parser.consume();
        let right = operand(parser)?;
        left = Node::BinaryOp {
            operator,
            left: Box::new(left),
            right: Box::new(right),
        };
    }

    Ok(left)
}

fn comparison_operator(kind: TokenKind) -> Option<BinaryOperator> {
    match kind {
        TokenKind::Equal => Some(BinaryOperator::Equal),
        TokenKind::NotEqual => Some(BinaryOperator::NotEqual),
        TokenKind::LessThan => Some(BinaryOperator::LessThan),
        TokenKind::GreaterThan => Some(BinaryOperator::GreaterThan),
        TokenKind::LessEqual => Some(BinaryOperator::LessEqual),
        TokenKind::GreaterEqual => Some(BinaryOperator::GreaterEqual),
        _ => None,
    }
}

fn arithmetic_operator(kind: TokenKind) -> Option<BinaryOperator> {
    match kind {
        TokenKind::Plus => Some(BinaryOperator::Plus),
        TokenKind::Minus => Some(BinaryOperator::Minus),
        _ => None,
    }
}

fn term_operator(kind: TokenKind) -> Option<BinaryOperator> {
    match kind {
        TokenKind::Asterisk => Some(BinaryOperator::Multiply),
        TokenKind::Slash => Some(BinaryOperator::Divide),
        _ => None,
    }
}

fn power_operator(kind: TokenKind) -> Option<BinaryOperator> {
    match kind {
        TokenKind::Caret => Some(BinaryOperator::Power),
        _ => None,
    }
}

fn parse_comparison(parser: &mut Parser) -> Result<Node, ParseError> {
    parse_binary_layer(parser, comparison_operator, parse_arithmetic)
}

fn parse_arithmetic(parser: &mut Parser) -> Result<Node, ParseError> {
    parse_binary_layer(parser, arithmetic_operator, parse_term)
}

fn parse_term(parser: &mut Parser) -> Result<Node, ParseError> {
    parse_binary_layer(parser, term_operator, parse_power)
}

fn parse_power(parser: &mut Parser) -> Result<Node, ParseError> {
    parse_binary_layer(parser, power_operator, parse_factor)
}

fn parse_factor(parser: &mut Parser) -> Result<Node, ParseError> {
    let operator = match parser.lookahead().kind {
        TokenKind::Plus => UnaryOperator::Plus,
        TokenKind::Minus => UnaryOperator::Minus,
        _ => return parse_call(parser),
    };
    parser.consume();

    Ok(Node::UnaryOp {
        operator,
        operand: Box::new(parser.nested(parse_factor)?),
    })
}

fn parse_call(parser: &mut Parser) -> Result<Node, ParseError> {
    let mut node = parse_atom(parser)?;

    loop {
        // A bracket opening a new line starts the next statement.
        if parser.lookahead().line != parser.last_line() {
            return Ok(node);
        }
        if parser.consume_if(TokenKind::LParen).is_some() {
            let arguments = parse_sequence(
                parser,
                parse_expression,
                TokenKind::Comma,
                TokenKind::RParen,
            )?;
            node = Node::FunctionCall {
                callee: Box::new(node),
                arguments,
            };
        } else if parser.consume_if(TokenKind::LBracket).is_some() {
            let index = parse_expression(parser)?;
            parser.expect_token(TokenKind::RBracket)?;
            node = Node::ItemAccess {
                target: Box::new(node),
                index: Box::new(index),
            };
        } else {
            return Ok(node);
        }
    }
}

fn parse_atom(parser: &mut Parser) -> Result<Node, ParseError> {
    let token = parser.consume();
    match token.kind {
        TokenKind::Int => match token.text.parse() {
            Ok(value) => Ok(Node::Literal(LiteralValue::Int(value))),
            Err(_) => Err(ParseError::InvalidLiteral { token }),
        },
        TokenKind::Float => match token.text.parse() {
            Ok(value) => Ok(Node::Literal(LiteralValue::Float(value))),
            Err(_) => Err(ParseError::InvalidLiteral { token }),
        },
        TokenKind::Str => Ok(Node::Literal(LiteralValue::Str(token.text))),
        TokenKind::Keyword(Keyword::Null) => Ok(Node::Null),
        TokenKind::Ident => Ok(Node::VariableAccess(token.text)),
        TokenKind::LParen => {
            let expression = parse_expression(parser)?;
            parser.expect_token(TokenKind::RParen)?;
            Ok(expression)
        }
        TokenKind::LBracket => {
            let items = parse_sequence(
                parser,
                parse_expression,
                TokenKind::Comma,
                TokenKind::RBracket,
            )?;
            Ok(Node::Literal(LiteralValue::List(items)))
        }
        _ => Err(ParseError::unexpected_other(Expected::Expression, token)),
    }
}

fn parse_sequence<T>(
    parser: &mut Parser,
    parse_element: impl Fn(&mut Parser) -> Result<T, ParseError>,
    separator: TokenKind,
    terminator: TokenKind,
) -> Result<Vec<T>, ParseError> {
    let mut elements = Vec::new();

    loop {
        if parser.consume_if(terminator).is_some() {
            return Ok(elements);
        }
        elements.push(parse_element(parser)?);

        let next = parser.consume();
        match next.kind {
            kind if kind == separator => continue,
            kind if kind == terminator => return Ok(elements),
            _ => return Err(ParseError::unexpected_token(separator, next)),
        }
    }
}

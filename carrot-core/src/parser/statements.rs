use crate::ast::{DataType, FunctionDefinition, IfBranches, Iteration, LiteralValue, Node};
use crate::lexer::{Keyword, TokenKind};
use crate::parser::expressions::parse_expression;
use crate::parser::{ParseError, Parser};

/// Parses statements until `Eof` or one of `terminators`, which is left
/// unconsumed for the caller.
pub fn parse_statements(
    parser: &mut Parser,
    terminators: &[TokenKind],
) -> Result<Vec<Node>, ParseError> {
    let mut statements = Vec::new();
    loop {
        let kind = parser.lookahead().kind;
        if kind == TokenKind::Eof || terminators.contains(&kind) {
            return Ok(statements);
        }
        statements.push(parse_statement(parser)?);
    }
}

pub fn parse_statement(parser: &mut Parser) -> Result<Node, ParseError> {
    parser.nested(parse_statement_at_depth)
}

fn parse_statement_at_depth(parser: &mut Parser) -> Result<Node, ParseError> {
    let (kind, line) = {
        let token = parser.lookahead();
        tracing::debug!(line = token.line, token = %token.text, "parsing statement");
        (token.kind, token.line)
    };
    match kind {
        TokenKind::Keyword(Keyword::Return) => {
            parser.consume();
            Ok(Node::Return(Box::new(parse_expression(parser)?)))
        }
        TokenKind::Keyword(Keyword::If) => parse_if(parser),
        TokenKind::Keyword(Keyword::Iter) => parse_iter(parser),
        _ => {
            let expression = parse_expression(parser)?;
            parse_declaration(parser, expression, line)
        }
    }
}

/// One token after a leading expression decides whether it was the head of
/// a definition or assignment.
fn parse_declaration(parser: &mut Parser, head: Node, line: usize) -> Result<Node, ParseError> {
    match (parser.lookahead().kind, head) {
        (TokenKind::Colon, Node::VariableAccess(name)) => {
            parser.consume();
            let data_type = parser.parse_type_name()?;
            parser.expect_token(TokenKind::Assign)?;
            let value = parse_expression(parser)?;
            type_check(&name, data_type, &value, line)?;

            Ok(Node::VariableDef {
                name,
                data_type,
                value: Box::new(value),
            })
        }
        (TokenKind::Assign, Node::VariableAccess(name)) => {
            parser.consume();
            let value = parse_expression(parser)?;

            Ok(Node::VariableAssign {
                name,
                value: Box::new(value),
            })
        }
        (TokenKind::Arrow, Node::FunctionCall { callee, arguments }) => match *callee {
            Node::VariableAccess(name) => {
                parser.consume();
                parse_function_def(parser, name, arguments, line)
            }
            callee => Ok(Node::FunctionCall {
                callee: Box::new(callee),
                arguments,
            }),
        },
        (_, head) => Ok(head),
    }
}

fn parse_function_def(
    parser: &mut Parser,
    name: std::rc::Rc<str>,
    arguments: Vec<Node>,
    line: usize,
) -> Result<Node, ParseError> {
    let parameters = arguments
        .into_iter()
        .map(|argument| match argument {
            Node::VariableAccess(parameter) => Ok(parameter),
            other => Err(ParseError::InvalidParameter {
                parameter: other.to_string(),
                line,
            }),
        })
        .collect::<Result<Vec<_>, _>>()?;

    let return_type = parser.parse_type_name()?;
    parser.expect_token(TokenKind::Colon)?;
    let body = parse_block(parser)?;

    Ok(Node::FunctionDef(FunctionDefinition {
        name,
        parameters,
        return_type,
        body: body.into(),
    }))
}

fn parse_block(parser: &mut Parser) -> Result<Vec<Node>, ParseError> {
    let statements = parse_statements(parser, &[TokenKind::Keyword(Keyword::End)])?;
    parser.expect_token(TokenKind::Keyword(Keyword::End))?;
    Ok(statements)
}

fn parse_if(parser: &mut Parser) -> Result<Node, ParseError> {
    parser.expect_token(TokenKind::Keyword(Keyword::If))?;

    let mut conditions = Vec::new();
    let mut blocks = Vec::new();
    loop {
        conditions.push(parse_expression(parser)?);
        parser.expect_token(TokenKind::Colon)?;
        blocks.push(parse_statements(
            parser,
            &[
                TokenKind::Keyword(Keyword::Elif),
                TokenKind::Keyword(Keyword::Else),
                TokenKind::Keyword(Keyword::End),
            ],
        )?);
        if parser.consume_if(TokenKind::Keyword(Keyword::Elif)).is_none() {
            break;
        }
    }

    let else_block = if parser.consume_if(TokenKind::Keyword(Keyword::Else)).is_some() {
        parser.expect_token(TokenKind::Colon)?;
        Some(parse_statements(parser, &[TokenKind::Keyword(Keyword::End)])?)
    } else {
        None
    };
    parser.expect_token(TokenKind::Keyword(Keyword::End))?;

    Ok(Node::If(IfBranches {
        conditions,
        blocks,
        else_block,
    }))
}

fn parse_iter(parser: &mut Parser) -> Result<Node, ParseError> {
    parser.expect_token(TokenKind::Keyword(Keyword::Iter))?;
    let iterable = Box::new(parse_expression(parser)?);

    let has_names = parser.consume_if(TokenKind::Keyword(Keyword::As)).is_some();
    let (index_name, item_name) = if has_names {
        let first = parser.parse_ident()?;
        if parser.consume_if(TokenKind::Comma).is_some() {
            (Some(first), Some(parser.parse_ident()?))
        } else {
            (None, Some(first))
        }
    } else {
        (None, None)
    };

    parser.expect_token(TokenKind::Colon)?;
    let body = parse_block(parser)?;

    Ok(Node::Iter(Iteration {
        iterable,
        index_name,
        item_name,
        body,
    }))
}

fn literal_type(node: &Node) -> Option<DataType> {
    match node {
        Node::Literal(value) => Some(value.data_type()),
        Node::Null => Some(DataType::Null),
        Node::UnaryOp { operand, .. } => match operand.as_ref() {
            Node::Literal(value @ (LiteralValue::Int(_) | LiteralValue::Float(_))) => {
                Some(value.data_type())
            }
            _ => None,
        },
        _ => None,
    }
}

/// Only bare literal initialisers are checked; anything else is dynamic.
fn type_check(
    name: &std::rc::Rc<str>,
    declared: DataType,
    value: &Node,
    line: usize,
) -> Result<(), ParseError> {
    let Some(found) = literal_type(value) else {
        return Ok(());
    };
    let compatible = declared == found
        || matches!(
            (declared, found),
            (DataType::Float, DataType::Int) | (DataType::Bool, DataType::Int)
        );
    if compatible {
        Ok(())
    } else {
        Err(ParseError::TypeMismatch {
            name: name.clone(),
            declared,
            found,
            line,
        })
    }
}

pub mod ast;
pub mod lexer;
pub mod parser;
pub mod stack;

/// Tokenizes and parses `source` into a `Statements` root node.
pub fn parse(source: &str) -> Result<ast::Node, parser::ParseError> {
    let tokens = lexer::tokenize(source)?;
    parser::Parser::new(tokens).parse_program()
}

pub mod lexer;
pub mod parser;

use crate::error::ParseError;
use crate::ir::ast;

pub use parser::{DEFAULT_MAX_DEPTH, ParseOptions, Parser};

/// Parses a whole program: source text to AST.
pub fn parse(source: &str) -> Result<ast::Ast, ParseError> {
    parse_with(source, ParseOptions::default())
}

pub fn parse_with(source: &str, options: ParseOptions) -> Result<ast::Ast, ParseError> {
    log::debug!("parsing {} bytes with max depth {}", source.len(), options.max_depth);
    let program = Parser::with_options(source, options).parse_program()?;
    Ok(program)
}

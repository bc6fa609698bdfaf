pub mod diagnostics;
pub mod error;
pub mod ir;
pub mod parser;
pub mod span;

pub use error::ParseError;
pub use ir::ast::Ast;
pub use parser::{ParseOptions, parse, parse_with};

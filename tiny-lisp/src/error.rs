use std::fmt;

use thiserror::Error;

use crate::ir::ast::NodeKind;
use crate::parser::lexer::TokenKind;
use crate::span::Span;

/// What the parser was looking for when it gave up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expected {
    Token(TokenKind),
    Expression,
    Datum,
}

impl fmt::Display for Expected {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Token(kind) => write!(f, "{}", kind),
            Self::Expression => f.write_str("expression"),
            Self::Datum => f.write_str("datum"),
        }
    }
}

/// Kinds of the nodes enclosing an error, innermost first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Trail(pub Vec<NodeKind>);

impl fmt::Display for Trail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return Ok(());
        }
        f.write_str(" (")?;
        for (i, kind) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "in {}", kind)?;
        }
        f.write_str(")")
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("Lexical error at {span}: unexpected character {found:?}")]
    LexicalError { span: Span, found: char },

    #[error("Lexical error at {span}: number literal {text} does not fit in 64 bits")]
    NumberOutOfRange { span: Span, text: String },

    #[error("Syntax error at {span}: expected {expected}, found {found}{within}")]
    SyntaxError {
        span: Span,
        expected: Expected,
        found: TokenKind,
        within: Trail,
    },

    #[error("Syntax error at {span}: forms nested deeper than {limit}")]
    NestingTooDeep { span: Span, limit: usize },
}

impl ParseError {
    pub fn span(&self) -> Span {
        match self {
            Self::LexicalError { span, .. }
            | Self::NumberOutOfRange { span, .. }
            | Self::SyntaxError { span, .. }
            | Self::NestingTooDeep { span, .. } => *span,
        }
    }

    /// Stable short code shown in diagnostics.
    pub fn code(&self) -> &'static str {
        match self {
            Self::LexicalError { .. } => "E_LEX",
            Self::NumberOutOfRange { .. } => "E_NUMBER",
            Self::SyntaxError { .. } => "E_SYNTAX",
            Self::NestingTooDeep { .. } => "E_DEPTH",
        }
    }

    pub fn help(&self) -> Option<&'static str> {
        match self {
            Self::SyntaxError {
                expected: Expected::Token(TokenKind::RParen),
                found: TokenKind::End,
                ..
            } => Some("the input ends before this form is closed; add ')'"),
            Self::SyntaxError {
                expected: Expected::Token(TokenKind::End),
                ..
            } => Some("a program is a single defun form; remove the trailing input"),
            Self::SyntaxError {
                expected: Expected::Expression,
                found: TokenKind::RParen,
                ..
            } => Some("this form is missing an expression before ')'"),
            Self::LexicalError { found: '#', .. } => Some("booleans are written #t or #f"),
            _ => None,
        }
    }
}

use crate::error::{Expected, ParseError, Trail};
use crate::ir::ast::{Ast, NodeId, NodeKind, Value};
use crate::span::Span;
use super::lexer::{Lexer, SpannedToken, Token, TokenKind};

pub const DEFAULT_MAX_DEPTH: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseOptions {
    /// Deepest allowed nesting of parenthesized forms and list datums
    pub max_depth: usize,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

/// Recursive-descent parser with one token of lookahead.
pub struct Parser<'a> {
    lexer: Lexer<'a>,
    lookahead: SpannedToken,
    ast: Ast,
    options: ParseOptions,
    depth: usize,
}

impl<'a> Parser<'a> {
    pub fn new(source: &'a str) -> Self {
        Self::with_options(source, ParseOptions::default())
    }

    pub fn with_options(source: &'a str, options: ParseOptions) -> Self {
        Self {
            lexer: Lexer::new(source),
            lookahead: SpannedToken {
                token: Token::End,
                span: Span::default(),
            },
            ast: Ast::new(),
            options,
            depth: 0,
        }
    }

    /// program = <func> END
    pub fn parse_program(mut self) -> Result<Ast, ParseError> {
        self.advance()?;

        let program = self.ast.push(None, NodeKind::Program, None, self.lookahead.span);
        self.func(program)?;
        self.expect(TokenKind::End, program)?;

        log::debug!("parsed program into {} nodes", self.ast.len());
        Ok(self.ast)
    }

    /// func = ( defun <identifier> ( <identifier>* ) <expression>* )
    fn func(&mut self, program: NodeId) -> Result<NodeId, ParseError> {
        let open = self.expect(TokenKind::LParen, program)?;
        self.expect(TokenKind::Defun, program)?;
        let defun = self.ast.push(Some(program), NodeKind::Defun { arity: 0 }, None, open.span);

        self.identifier(defun)?;

        self.expect(TokenKind::LParen, defun)?;
        let mut arity = 0;
        while self.before_close(defun)? {
            self.identifier(defun)?;
            arity += 1;
        }
        self.expect(TokenKind::RParen, defun)?;
        self.ast.set_kind(defun, NodeKind::Defun { arity });

        while self.before_close(defun)? {
            self.expression(defun)?;
        }
        self.expect(TokenKind::RParen, defun)?;

        log::debug!("parsed defun with {} parameter(s)", arity);
        Ok(defun)
    }

    fn expression(&mut self, parent: NodeId) -> Result<NodeId, ParseError> {
        match &self.lookahead.token {
            Token::Number(n) => {
                let value = Value::Number(*n);
                self.leaf(parent, NodeKind::Constant, value)
            }
            Token::Boolean(b) => {
                let value = Value::Boolean(*b);
                self.leaf(parent, NodeKind::Constant, value)
            }
            Token::Identifier(name) => {
                let value = Value::Text(name.clone());
                self.leaf(parent, NodeKind::Identifier, value)
            }
            Token::Quote { abbreviated: true } => {
                let tick = self.advance()?;
                let quote = self.ast.push(Some(parent), NodeKind::Quote, None, tick.span);
                self.datum(quote)?;
                Ok(quote)
            }
            Token::LParen => self.form(parent),
            _ => Err(self.unexpected(Expected::Expression, parent)),
        }
    }

    /// Any parenthesized expression: `if`, `quote` or an application.
    fn form(&mut self, parent: NodeId) -> Result<NodeId, ParseError> {
        let open = self.expect(TokenKind::LParen, parent)?;
        self.enter(open.span)?;

        let node = match self.lookahead.token {
            Token::If => {
                self.advance()?;
                self.if_form(parent, open.span)?
            }
            Token::Quote { abbreviated: false } => {
                self.advance()?;
                let quote = self.ast.push(Some(parent), NodeKind::Quote, None, open.span);
                self.datum(quote)?;
                quote
            }
            _ => self.application(parent, open.span)?,
        };

        self.expect(TokenKind::RParen, node)?;
        self.leave();
        Ok(node)
    }

    /// if = ( if <expression> <expression> [<expression>] )
    fn if_form(&mut self, parent: NodeId, span: Span) -> Result<NodeId, ParseError> {
        let node = self.ast.push(Some(parent), NodeKind::If, None, span);
        self.expression(node)?;
        self.expression(node)?;
        if self.before_close(node)? {
            self.expression(node)?;
        }
        Ok(node)
    }

    /// application = ( <expression> <expression>* )
    fn application(&mut self, parent: NodeId, span: Span) -> Result<NodeId, ParseError> {
        let node = self.ast.push(Some(parent), NodeKind::Application, None, span);
        self.expression(node)?;
        while self.before_close(node)? {
            self.expression(node)?;
        }
        Ok(node)
    }

    /// datum = <number> | <boolean> | ( <datum>* )
    fn datum(&mut self, parent: NodeId) -> Result<NodeId, ParseError> {
        match &self.lookahead.token {
            Token::Number(n) => {
                let value = Value::Number(*n);
                self.leaf(parent, NodeKind::Constant, value)
            }
            Token::Boolean(b) => {
                let value = Value::Boolean(*b);
                self.leaf(parent, NodeKind::Constant, value)
            }
            Token::LParen => {
                let open = self.advance()?;
                self.enter(open.span)?;
                let list = self.ast.push(Some(parent), NodeKind::List, None, open.span);
                while self.before_close(list)? {
                    self.datum(list)?;
                }
                self.expect(TokenKind::RParen, list)?;
                self.leave();
                Ok(list)
            }
            _ => Err(self.unexpected(Expected::Datum, parent)),
        }
    }

    fn identifier(&mut self, parent: NodeId) -> Result<NodeId, ParseError> {
        match &self.lookahead.token {
            Token::Identifier(name) => {
                let value = Value::Text(name.clone());
                self.leaf(parent, NodeKind::Identifier, value)
            }
            _ => Err(self.unexpected(Expected::Token(TokenKind::Identifier), parent)),
        }
    }

    fn leaf(&mut self, parent: NodeId, kind: NodeKind, value: Value) -> Result<NodeId, ParseError> {
        let token = self.advance()?;
        Ok(self.ast.push(Some(parent), kind, Some(value), token.span))
    }

    /// True while a variable-length sequence has more items before its `)`.
    /// Running out of input here is reported as a missing `)`.
    fn before_close(&self, parent: NodeId) -> Result<bool, ParseError> {
        match self.lookahead.token {
            Token::RParen => Ok(false),
            Token::End => Err(self.unexpected(Expected::Token(TokenKind::RParen), parent)),
            _ => Ok(true),
        }
    }

    fn enter(&mut self, span: Span) -> Result<(), ParseError> {
        self.depth += 1;
        if self.depth > self.options.max_depth {
            return Err(ParseError::NestingTooDeep {
                span,
                limit: self.options.max_depth,
            });
        }
        Ok(())
    }

    fn leave(&mut self) {
        self.depth -= 1;
    }

    // Token helpers

    fn advance(&mut self) -> Result<SpannedToken, ParseError> {
        let next = self.lexer.next_token()?;
        Ok(std::mem::replace(&mut self.lookahead, next))
    }

    fn check(&self, kind: TokenKind) -> bool {
        self.lookahead.token.kind() == kind
    }

    fn accept(&mut self, kind: TokenKind) -> Result<Option<SpannedToken>, ParseError> {
        if self.check(kind) {
            self.advance().map(Some)
        } else {
            Ok(None)
        }
    }

    fn expect(&mut self, kind: TokenKind, context: NodeId) -> Result<SpannedToken, ParseError> {
        match self.accept(kind)? {
            Some(token) => Ok(token),
            None => Err(self.unexpected(Expected::Token(kind), context)),
        }
    }

    fn unexpected(&self, expected: Expected, context: NodeId) -> ParseError {
        let within = std::iter::once(context)
            .chain(self.ast.ancestors(context))
            .map(|id| self.ast.node(id).kind)
            .collect();

        ParseError::SyntaxError {
            span: self.lookahead.span,
            expected,
            found: self.lookahead.token.kind(),
            within: Trail(within),
        }
    }
}

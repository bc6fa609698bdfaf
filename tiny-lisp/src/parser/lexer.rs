use std::fmt;

use crate::error::ParseError;
use crate::span::Span;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    // Brackets
    LParen,
    RParen,
    // Literals
    Number(i64),
    Boolean(bool),
    Identifier(String),
    // Keywords
    If,
    Defun,
    /// `quote`, or its `'` shorthand when `abbreviated`
    Quote { abbreviated: bool },
    End,
}

/// Token tag without payload, as compared by `accept`/`expect`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    LParen,
    RParen,
    Number,
    Boolean,
    Identifier,
    If,
    Defun,
    Quote,
    End,
}

impl TokenKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::LParen => "LPAREN",
            Self::RParen => "RPAREN",
            Self::Number => "NUMBER",
            Self::Boolean => "BOOLEAN",
            Self::Identifier => "IDENTIFIER",
            Self::If => "IF",
            Self::Defun => "DEFUN",
            Self::Quote => "QUOTE",
            Self::End => "END",
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Token {
    pub fn kind(&self) -> TokenKind {
        match self {
            Self::LParen => TokenKind::LParen,
            Self::RParen => TokenKind::RParen,
            Self::Number(_) => TokenKind::Number,
            Self::Boolean(_) => TokenKind::Boolean,
            Self::Identifier(_) => TokenKind::Identifier,
            Self::If => TokenKind::If,
            Self::Defun => TokenKind::Defun,
            Self::Quote { .. } => TokenKind::Quote,
            Self::End => TokenKind::End,
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "NUMBER({})", n),
            Self::Boolean(b) => write!(f, "BOOLEAN({})", if *b { "#t" } else { "#f" }),
            Self::Identifier(name) => write!(f, "IDENTIFIER({})", name),
            Self::Quote { abbreviated: true } => f.write_str("QUOTE(')"),
            other => write!(f, "{}", other.kind()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpannedToken {
    pub token: Token,
    pub span: Span,
}

/// Pull-based scanner: one token per `next_token` call, longest match first.
pub struct Lexer<'a> {
    source: &'a str,
    pos: usize,
    line: usize,
    column: usize,
    finished: bool,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            pos: 0,
            line: 1,
            column: 1,
            finished: false,
        }
    }

    /// Byte offset of the first unconsumed character.
    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn next_token(&mut self) -> Result<SpannedToken, ParseError> {
        self.skip_whitespace();

        let (start, line, column) = (self.pos, self.line, self.column);
        let span_from_start = |end: usize| Span { line, column, start, end };

        let Some(ch) = self.peek() else {
            return Ok(SpannedToken {
                token: Token::End,
                span: span_from_start(start),
            });
        };

        let token = match ch {
            ')' => {
                self.bump();
                Token::RParen
            }
            '(' => {
                self.bump();
                Token::LParen
            }
            '0'..='9' => self.number(start, line, column)?,
            '-' if self.peek_second().is_some_and(|c| c.is_ascii_digit()) => {
                self.number(start, line, column)?
            }
            '#' => match self.peek_second() {
                Some(flag @ ('t' | 'f')) => {
                    self.bump();
                    self.bump();
                    Token::Boolean(flag == 't')
                }
                _ => {
                    return Err(ParseError::LexicalError {
                        span: span_from_start(start + 1),
                        found: '#',
                    });
                }
            },
            '\'' => {
                self.bump();
                Token::Quote { abbreviated: true }
            }
            '+' | '-' => {
                self.bump();
                Token::Identifier(ch.to_string())
            }
            c if is_initial(c) => self.identifier(start),
            _ => {
                return Err(ParseError::LexicalError {
                    span: span_from_start(start + ch.len_utf8()),
                    found: ch,
                });
            }
        };

        let token = SpannedToken {
            token,
            span: span_from_start(self.pos),
        };
        log::trace!("lexed {} at {}", token.token, token.span);
        Ok(token)
    }

    fn number(&mut self, start: usize, line: usize, column: usize) -> Result<Token, ParseError> {
        if self.peek() == Some('-') {
            self.bump();
        }
        self.bump_while(|c| c.is_ascii_digit());

        let text = &self.source[start..self.pos];
        text.parse::<i64>()
            .map(Token::Number)
            .map_err(|_| ParseError::NumberOutOfRange {
                span: Span { line, column, start, end: self.pos },
                text: text.to_string(),
            })
    }

    fn identifier(&mut self, start: usize) -> Token {
        self.bump();
        self.bump_while(is_subsequent);

        match &self.source[start..self.pos] {
            "if" => Token::If,
            "defun" => Token::Defun,
            "quote" => Token::Quote { abbreviated: false },
            text => Token::Identifier(text.to_string()),
        }
    }

    fn skip_whitespace(&mut self) {
        self.bump_while(char::is_whitespace);
    }

    fn peek(&self) -> Option<char> {
        self.source[self.pos..].chars().next()
    }

    fn peek_second(&self) -> Option<char> {
        self.source[self.pos..].chars().nth(1)
    }

    fn bump(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += ch.len_utf8();
        if ch == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(ch)
    }

    fn bump_while(&mut self, pred: impl Fn(char) -> bool) {
        while let Some(ch) = self.peek() {
            if !pred(ch) {
                break;
            }
            self.bump();
        }
    }
}

/// Yields every token up to and including END, or the first lexical error.
impl Iterator for Lexer<'_> {
    type Item = Result<SpannedToken, ParseError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        let result = self.next_token();
        if matches!(&result, Ok(SpannedToken { token: Token::End, .. }) | Err(_)) {
            self.finished = true;
        }
        Some(result)
    }
}

fn is_initial(ch: char) -> bool {
    ch.is_ascii_alphabetic()
        || matches!(ch, '!' | '$' | '&' | '*' | '/' | ':' | '<' | '=' | '>' | '?' | '~' | '_' | '^')
}

fn is_subsequent(ch: char) -> bool {
    is_initial(ch) || ch.is_ascii_digit() || matches!(ch, '.' | '+' | '-')
}

pub fn tokenize(source: &str) -> Result<Vec<SpannedToken>, ParseError> {
    Lexer::new(source).collect()
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use rstest::rstest;

    use super::*;

    fn tokens(source: &str) -> Vec<Token> {
        tokenize(source)
            .unwrap()
            .into_iter()
            .map(|t| t.token)
            .collect()
    }

    fn ident(name: &str) -> Token {
        Token::Identifier(name.to_string())
    }

    #[rstest]
    #[case("")]
    #[case("   ")]
    #[case("\n\t  \r\n")]
    fn whitespace_only_is_end(#[case] source: &str) {
        let mut lexer = Lexer::new(source);
        assert_eq!(lexer.next_token().unwrap().token, Token::End);
    }

    #[test]
    fn number_takes_the_whole_digit_run() {
        assert_eq!(
            tokens("-123abc"),
            vec![Token::Number(-123), ident("abc"), Token::End]
        );
    }

    #[rstest]
    #[case("ifx", ident("ifx"))]
    #[case("defunct", ident("defunct"))]
    #[case("quoted", ident("quoted"))]
    #[case("if", Token::If)]
    #[case("defun", Token::Defun)]
    #[case("quote", Token::Quote { abbreviated: false })]
    #[case("'", Token::Quote { abbreviated: true })]
    fn keywords_match_only_whole_identifiers(#[case] source: &str, #[case] expected: Token) {
        assert_eq!(tokens(source), vec![expected, Token::End]);
    }

    #[rstest]
    #[case("+")]
    #[case("-")]
    #[case("*")]
    #[case("/")]
    #[case("test_function")]
    #[case("x.y+z-")]
    #[case("<=?")]
    #[case("a1")]
    #[case("*star*")]
    #[case("Camel")]
    fn identifiers(#[case] source: &str) {
        assert_eq!(tokens(source), vec![ident(source), Token::End]);
    }

    #[rstest]
    #[case("- 5", vec![ident("-"), Token::Number(5)])]
    #[case("-x", vec![ident("-"), ident("x")])]
    #[case("+5", vec![ident("+"), Token::Number(5)])]
    #[case("5x", vec![Token::Number(5), ident("x")])]
    #[case("#t #f", vec![Token::Boolean(true), Token::Boolean(false)])]
    #[case("#tx", vec![Token::Boolean(true), ident("x")])]
    #[case("'(1)", vec![Token::Quote { abbreviated: true }, Token::LParen, Token::Number(1), Token::RParen])]
    #[case("-0", vec![Token::Number(0)])]
    fn adjacent_classes_split_at_longest_match(#[case] source: &str, #[case] expected: Vec<Token>) {
        assert_eq!(tokens(source), [expected, vec![Token::End]].concat());
    }

    #[test]
    fn lexes_a_whole_program() {
        assert_eq!(
            tokens("(defun test_function (x) (+ 2 x))"),
            vec![
                Token::LParen,
                Token::Defun,
                ident("test_function"),
                Token::LParen,
                ident("x"),
                Token::RParen,
                Token::LParen,
                ident("+"),
                Token::Number(2),
                ident("x"),
                Token::RParen,
                Token::RParen,
                Token::End,
            ]
        );
    }

    #[test]
    fn spans_track_lines_and_columns() {
        let tokens = tokenize("(defun\n  f)").unwrap();
        let f = &tokens[2];
        assert_eq!(f.token, ident("f"));
        assert_eq!(f.span, Span { line: 2, column: 3, start: 9, end: 10 });

        let end = tokens.last().unwrap();
        assert_eq!(end.token, Token::End);
        assert_eq!(end.span, Span { line: 2, column: 5, start: 11, end: 11 });
    }

    #[test]
    fn unknown_character_is_lexical_error() {
        let err = tokenize("(a @)").unwrap_err();
        assert_matches!(
            err,
            ParseError::LexicalError {
                found: '@',
                span: Span { line: 1, column: 4, start: 3, end: 4 },
            }
        );
    }

    #[test]
    fn hash_without_boolean_flag_is_lexical_error() {
        assert_matches!(
            tokenize("#q"),
            Err(ParseError::LexicalError { found: '#', .. })
        );
    }

    #[test]
    fn non_ascii_character_is_reported_whole() {
        let err = tokenize("λ").unwrap_err();
        assert_matches!(err, ParseError::LexicalError { found: 'λ', span } if span.len() == 2);
    }

    #[test]
    fn oversized_number_is_rejected() {
        assert_matches!(
            tokenize("99999999999999999999"),
            Err(ParseError::NumberOutOfRange { text, .. }) if text == "99999999999999999999"
        );
        assert_eq!(tokens("-9223372036854775808"), vec![Token::Number(i64::MIN), Token::End]);
    }

    #[test]
    fn end_is_repeated_after_input_is_exhausted() {
        let mut lexer = Lexer::new("x");
        assert_eq!(lexer.next_token().unwrap().token, ident("x"));
        assert_eq!(lexer.next_token().unwrap().token, Token::End);
        assert_eq!(lexer.next_token().unwrap().token, Token::End);
        assert_eq!(lexer.position(), 1);
    }

    #[test]
    fn iterator_stops_after_end() {
        let mut lexer = Lexer::new("1");
        assert_matches!(lexer.next(), Some(Ok(SpannedToken { token: Token::Number(1), .. })));
        assert_matches!(lexer.next(), Some(Ok(SpannedToken { token: Token::End, .. })));
        assert_matches!(lexer.next(), None);
    }

    #[test]
    fn iterator_stops_after_lexical_error() {
        let mut lexer = Lexer::new("@ x");
        assert_matches!(lexer.next(), Some(Err(ParseError::LexicalError { found: '@', .. })));
        assert_matches!(lexer.next(), None);
        assert_matches!(lexer.next(), None);
    }

    #[test]
    fn token_display() {
        assert_eq!(Token::Number(-4).to_string(), "NUMBER(-4)");
        assert_eq!(Token::Boolean(false).to_string(), "BOOLEAN(#f)");
        assert_eq!(ident("x").to_string(), "IDENTIFIER(x)");
        assert_eq!(Token::LParen.to_string(), "LPAREN");
        assert_eq!(Token::Quote { abbreviated: false }.to_string(), "QUOTE");
    }
}

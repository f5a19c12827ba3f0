// minnow-parser - Lexer for Minnow
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Lexer (tokeniser) for Minnow source code.
//!
//! Converts a source string into a stream of [`Token`]s, tracking 1-based
//! line numbers as it goes. The lexer is owned by a single compilation and
//! carries no state between compilations.

use std::fmt;
use std::iter::Peekable;
use std::str::Chars;

use crate::token::Token;

/// Longest accepted identifier, number, or string literal.
pub const MAX_TOKEN_LEN: usize = 256;

/// Lexer error with the line it occurred on.
#[derive(Debug, Clone)]
pub struct LexError {
    pub message: String,
    pub line: u32,
}

impl fmt::Display for LexError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}: {}", self.line, self.message)
    }
}

impl std::error::Error for LexError {}

/// The lexer converts source code into tokens.
pub struct Lexer<'a> {
    chars: Peekable<Chars<'a>>,
    line: u32,
}

impl<'a> Lexer<'a> {
    /// Create a new lexer for the given source code.
    pub fn new(source: &'a str) -> Self {
        Lexer {
            chars: source.chars().peekable(),
            line: 1,
        }
    }

    /// The line the lexer is currently reading (1-based).
    pub fn line(&self) -> u32 {
        self.line
    }

    fn peek(&mut self) -> Option<char> {
        self.chars.peek().copied()
    }

    fn advance(&mut self) -> Option<char> {
        let c = self.chars.next();
        if c == Some('\n') {
            self.line += 1;
        }
        c
    }

    fn error(&self, message: impl Into<String>) -> LexError {
        LexError {
            message: message.into(),
            line: self.line,
        }
    }

    /// Get the next token from the source.
    pub fn next_token(&mut self) -> Result<Token, LexError> {
        self.skip_whitespace_and_comments()?;

        let c = match self.peek() {
            Some(c) => c,
            None => return Ok(Token::Eof),
        };

        match c {
            _ if c.is_ascii_alphabetic() => self.read_ident(),
            _ if c.is_ascii_digit() => self.read_number(),
            '\'' => self.read_char_literal(),
            '"' => self.read_string(),

            '(' => self.single(Token::LParen),
            ')' => self.single(Token::RParen),
            '{' => self.single(Token::LBrace),
            '}' => self.single(Token::RBrace),
            ',' => self.single(Token::Comma),
            ';' => self.single(Token::Semi),

            '=' => self.with_equals(Token::Assign, Token::Equals),
            '<' => self.with_equals(Token::Lt, Token::Lte),
            '>' => self.with_equals(Token::Gt, Token::Gte),
            '+' => self.with_equals(Token::Plus, Token::PlusEqual),
            '-' => self.with_equals(Token::Minus, Token::MinusEqual),
            '*' => self.with_equals(Token::Star, Token::StarEqual),
            '/' => self.with_equals(Token::Slash, Token::SlashEqual),
            '%' => self.with_equals(Token::Percent, Token::PercentEqual),
            '&' => self.with_equals(Token::Amp, Token::AmpEqual),
            '|' => self.with_equals(Token::Pipe, Token::PipeEqual),

            '!' => {
                self.advance();
                if self.peek() == Some('=') {
                    self.advance();
                    Ok(Token::NotEquals)
                } else {
                    Err(self.error("Unexpected character '!'"))
                }
            }
            ':' => {
                self.advance();
                match self.peek() {
                    Some('=') => {
                        self.advance();
                        Ok(Token::Declare)
                    }
                    Some(':') => {
                        self.advance();
                        Ok(Token::DeclareConst)
                    }
                    _ => Err(self.error("Unexpected character ':'")),
                }
            }

            _ => Err(self.error(format!("Unexpected character '{}'", c))),
        }
    }

    fn single(&mut self, token: Token) -> Result<Token, LexError> {
        self.advance();
        Ok(token)
    }

    /// Read a one-character operator, or its `=`-suffixed form.
    fn with_equals(&mut self, plain: Token, with_eq: Token) -> Result<Token, LexError> {
        self.advance();
        if self.peek() == Some('=') {
            self.advance();
            Ok(with_eq)
        } else {
            Ok(plain)
        }
    }

    fn skip_whitespace_and_comments(&mut self) -> Result<(), LexError> {
        loop {
            match self.peek() {
                Some(c) if c.is_whitespace() => {
                    self.advance();
                }
                Some('/') => {
                    // Line comment or a '/' operator; only consume comments here.
                    let mut lookahead = self.chars.clone();
                    lookahead.next();
                    if lookahead.peek() == Some(&'/') {
                        while let Some(c) = self.peek() {
                            if c == '\n' {
                                break;
                            }
                            self.advance();
                        }
                    } else {
                        return Ok(());
                    }
                }
                _ => return Ok(()),
            }
        }
    }

    fn read_ident(&mut self) -> Result<Token, LexError> {
        let mut ident = String::new();
        while let Some(c) = self.peek() {
            if c.is_ascii_alphanumeric() || c == '_' {
                if ident.len() >= MAX_TOKEN_LEN {
                    return Err(self.error("Identifier is too long"));
                }
                ident.push(c);
                self.advance();
            } else {
                break;
            }
        }

        Ok(Token::keyword(&ident).unwrap_or(Token::Ident(ident)))
    }

    fn read_number(&mut self) -> Result<Token, LexError> {
        let mut text = String::new();
        while let Some(c) = self.peek() {
            if c.is_ascii_digit() || c == '.' {
                if text.len() >= MAX_TOKEN_LEN {
                    return Err(self.error("Number literal is too long"));
                }
                text.push(c);
                self.advance();
            } else {
                break;
            }
        }

        text.parse::<f64>()
            .map(Token::Number)
            .map_err(|_| self.error(format!("Malformed number literal '{}'", text)))
    }

    /// A char literal produces a number token holding the character's code.
    fn read_char_literal(&mut self) -> Result<Token, LexError> {
        self.advance();

        let c = match self.advance() {
            Some('\\') => self.read_char_escape()?,
            Some('\n') | None => return Err(self.error("Unterminated character literal")),
            Some(c) => c,
        };

        if self.advance() != Some('\'') {
            return Err(self.error("Expected ' to close character literal"));
        }

        Ok(Token::Number(c as u32 as f64))
    }

    /// Char-literal escapes: the string set minus octal, plus `\'`.
    fn read_char_escape(&mut self) -> Result<char, LexError> {
        match self.advance() {
            Some('n') => Ok('\n'),
            Some('r') => Ok('\r'),
            Some('t') => Ok('\t'),
            Some('b') => Ok('\x08'),
            Some('a') => Ok('\x07'),
            Some('v') => Ok('\x0B'),
            Some('f') => Ok('\x0C'),
            Some('\\') => Ok('\\'),
            Some('"') => Ok('"'),
            Some('\'') => Ok('\''),
            Some(c) => Err(self.error(format!("Unsupported escape sequence '\\{}'", c))),
            None => Err(self.error("Unterminated character literal")),
        }
    }

    fn read_string(&mut self) -> Result<Token, LexError> {
        self.advance();

        let mut string = String::new();
        loop {
            match self.advance() {
                Some('"') => return Ok(Token::Str(string)),
                Some('\\') => {
                    let c = match self.advance() {
                        Some('n') => '\n',
                        Some('r') => '\r',
                        Some('t') => '\t',
                        Some('b') => '\x08',
                        Some('a') => '\x07',
                        Some('v') => '\x0B',
                        Some('f') => '\x0C',
                        Some('\\') => '\\',
                        Some('"') => '"',
                        Some(d) if d.is_ascii_digit() => self.read_octal_escape(d)?,
                        Some(c) => {
                            return Err(
                                self.error(format!("Unsupported escape sequence '\\{}'", c))
                            );
                        }
                        None => return Err(self.error("Unterminated string literal")),
                    };
                    string.push(c);
                }
                Some(c) => {
                    if string.len() >= MAX_TOKEN_LEN {
                        return Err(self.error("String literal is too long"));
                    }
                    string.push(c);
                }
                None => return Err(self.error("Unterminated string literal")),
            }
        }
    }

    /// Three-digit octal escape, first digit already consumed.
    fn read_octal_escape(&mut self, first: char) -> Result<char, LexError> {
        let mut value = first as u32 - '0' as u32;
        for got in 2..=3 {
            match self.advance() {
                Some(d) if d.is_ascii_digit() => {
                    value = value * 8 + (d as u32 - '0' as u32);
                }
                _ => {
                    return Err(self.error(format!(
                        "Expected three digits in octal escape sequence but only got {}",
                        got - 1
                    )));
                }
            }
        }

        char::from_u32(value)
            .ok_or_else(|| self.error(format!("Octal escape \\{:o} is out of range", value)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokenize(source: &str) -> Result<Vec<Token>, LexError> {
        let mut lexer = Lexer::new(source);
        let mut tokens = Vec::new();
        loop {
            let token = lexer.next_token()?;
            if token == Token::Eof {
                return Ok(tokens);
            }
            tokens.push(token);
        }
    }

    #[test]
    fn keywords_and_identifiers() {
        assert_eq!(
            tokenize("func froth while x_1").unwrap(),
            vec![
                Token::Func,
                Token::Ident("froth".into()),
                Token::While,
                Token::Ident("x_1".into()),
            ]
        );
    }

    #[test]
    fn identifiers_cannot_start_with_underscore() {
        assert!(tokenize("_x").is_err());
    }

    #[test]
    fn numbers() {
        assert_eq!(
            tokenize("0 42 3.5").unwrap(),
            vec![
                Token::Number(0.0),
                Token::Number(42.0),
                Token::Number(3.5),
            ]
        );
        assert!(tokenize("1.2.3").is_err());
    }

    #[test]
    fn char_literals_are_numbers() {
        assert_eq!(tokenize("'a'").unwrap(), vec![Token::Number(97.0)]);
        assert_eq!(tokenize("'\\n'").unwrap(), vec![Token::Number(10.0)]);
        assert_eq!(tokenize("'\\''").unwrap(), vec![Token::Number(39.0)]);
    }

    #[test]
    fn char_literal_rejects_octal() {
        assert!(tokenize("'\\101'").is_err());
    }

    #[test]
    fn strings_with_escapes() {
        assert_eq!(
            tokenize(r#""a\tb\n""#).unwrap(),
            vec![Token::Str("a\tb\n".into())]
        );
        assert_eq!(
            tokenize(r#""\101""#).unwrap(),
            vec![Token::Str("A".into())]
        );
    }

    #[test]
    fn string_errors() {
        assert!(tokenize("\"abc").is_err());
        assert!(tokenize(r#""\q""#).is_err());
        assert!(tokenize(r#""\10""#).is_err());
    }

    #[test]
    fn operators() {
        assert_eq!(
            tokenize(":= :: == != <= >= += -= *= /= %= &= |= + - * / % & | < > = ( ) { } , ;")
                .unwrap(),
            vec![
                Token::Declare,
                Token::DeclareConst,
                Token::Equals,
                Token::NotEquals,
                Token::Lte,
                Token::Gte,
                Token::PlusEqual,
                Token::MinusEqual,
                Token::StarEqual,
                Token::SlashEqual,
                Token::PercentEqual,
                Token::AmpEqual,
                Token::PipeEqual,
                Token::Plus,
                Token::Minus,
                Token::Star,
                Token::Slash,
                Token::Percent,
                Token::Amp,
                Token::Pipe,
                Token::Lt,
                Token::Gt,
                Token::Assign,
                Token::LParen,
                Token::RParen,
                Token::LBrace,
                Token::RBrace,
                Token::Comma,
                Token::Semi,
            ]
        );
    }

    #[test]
    fn comments_run_to_end_of_line() {
        assert_eq!(
            tokenize("1 // ignored ':' tokens\n2").unwrap(),
            vec![Token::Number(1.0), Token::Number(2.0)]
        );
    }

    #[test]
    fn division_is_not_a_comment() {
        assert_eq!(
            tokenize("6 / 2").unwrap(),
            vec![Token::Number(6.0), Token::Slash, Token::Number(2.0)]
        );
    }

    #[test]
    fn line_numbers_advance() {
        let mut lexer = Lexer::new("a\nb\n\nc");
        assert_eq!(lexer.next_token().unwrap(), Token::Ident("a".into()));
        assert_eq!(lexer.line(), 1);
        assert_eq!(lexer.next_token().unwrap(), Token::Ident("b".into()));
        assert_eq!(lexer.line(), 2);
        assert_eq!(lexer.next_token().unwrap(), Token::Ident("c".into()));
        assert_eq!(lexer.line(), 4);
    }

    #[test]
    fn bare_colon_and_bang_are_errors() {
        assert!(tokenize(":").is_err());
        assert!(tokenize("!").is_err());
    }
}

use std::iter::FusedIterator;

use log::debug;
use phf::phf_map;

use crate::error::{Result, SalixError};
use crate::token::{Token, TokenType};

static KEYWORDS: phf::Map<&'static str, TokenType> = phf_map! {
    "and" => TokenType::AND,
    "class" => TokenType::CLASS,
    "else" => TokenType::ELSE,
    "false" => TokenType::FALSE,
    "fun" => TokenType::FUN,
    "for" => TokenType::FOR,
    "if" => TokenType::IF,
    "nil" => TokenType::NIL,
    "or" => TokenType::OR,
    "print" => TokenType::PRINT,
    "return" => TokenType::RETURN,
    "true" => TokenType::TRUE,
    "var" => TokenType::VAR,
    "while" => TokenType::WHILE,
};

/// Streaming lexer over a source string.
///
/// Yields `Ok(Token)` for every recognised token and `Err` for every
/// lexical error, always runs to the end of the input, and finishes with
/// a single synthetic `EOF` token carrying the final line number.
#[derive(Debug, Clone)]
pub struct Scanner<'a> {
    source: &'a str,
    start: usize,
    current: usize,
    line: usize,
    eof_emitted: bool,
}

impl<'a> Scanner<'a> {
    pub fn new(source: &'a str) -> Self {
        debug!("scanner over {} bytes", source.len());

        Self {
            source,
            start: 0,
            current: 0,
            line: 1,
            eof_emitted: false,
        }
    }

    /// Scan one token starting at `self.start`.  `Ok(None)` means the
    /// bytes were trivia (whitespace or a comment) and scanning should
    /// continue with the next lexeme.
    fn scan_token(&mut self) -> Result<Option<TokenType>> {
        let byte: u8 = self.advance();

        let token_type = match byte {
            b'(' => TokenType::LEFT_PAREN,

            b')' => TokenType::RIGHT_PAREN,

            b'{' => TokenType::LEFT_BRACE,

            b'}' => TokenType::RIGHT_BRACE,

            b',' => TokenType::COMMA,

            b'.' => TokenType::DOT,

            b'-' => TokenType::MINUS,

            b'+' => TokenType::PLUS,

            b';' => TokenType::SEMICOLON,

            b'*' => TokenType::STAR,

            b'!' => {
                if self.match_byte(b'=') {
                    TokenType::BANG_EQUAL
                } else {
                    TokenType::BANG
                }
            }

            b'=' => {
                if self.match_byte(b'=') {
                    TokenType::EQUAL_EQUAL
                } else {
                    TokenType::EQUAL
                }
            }

            b'<' => {
                if self.match_byte(b'=') {
                    TokenType::LESS_EQUAL
                } else {
                    TokenType::LESS
                }
            }

            b'>' => {
                if self.match_byte(b'=') {
                    TokenType::GREATER_EQUAL
                } else {
                    TokenType::GREATER
                }
            }

            b'/' => {
                if self.match_byte(b'/') {
                    // Comment runs to the end of the line; the newline
                    // itself is left for the next scan.
                    while self.peek() != b'\n' && !self.is_at_end() {
                        self.advance();
                    }

                    return Ok(None);
                }

                TokenType::SLASH
            }

            b' ' | b'\r' | b'\t' => return Ok(None),

            b'\n' => {
                self.line += 1;

                return Ok(None);
            }

            b'"' => return self.string().map(Some),

            b'0'..=b'9' => self.number(),

            b'a'..=b'z' | b'A'..=b'Z' | b'_' => self.identifier(),

            _ => {
                // Decode the whole character so multi-byte input is
                // reported (and skipped) as one unit.
                let ch: char = self.source[self.start..]
                    .chars()
                    .next()
                    .unwrap_or(byte as char);

                self.current = self.start + ch.len_utf8();

                return Err(SalixError::lex(
                    self.line,
                    format!("Unexpected character: {}", ch),
                ));
            }
        };

        Ok(Some(token_type))
    }

    fn string(&mut self) -> Result<TokenType> {
        let opening_line: usize = self.line;

        while !self.is_at_end() && self.peek() != b'"' {
            if self.peek() == b'\n' {
                self.line += 1;
            }

            self.advance();
        }

        if self.is_at_end() {
            return Err(SalixError::lex(opening_line, "Unterminated string."));
        }

        // Closing quote.
        self.advance();

        let contents: String = self.source[self.start + 1..self.current - 1].to_string();

        Ok(TokenType::STRING(contents))
    }

    fn number(&mut self) -> TokenType {
        while self.peek().is_ascii_digit() {
            self.advance();
        }

        if self.peek() == b'.' && self.peek_next().is_ascii_digit() {
            self.advance();

            while self.peek().is_ascii_digit() {
                self.advance();
            }
        }

        let literal: f64 = self.source[self.start..self.current].parse().unwrap_or(0.0);

        TokenType::NUMBER(literal)
    }

    fn identifier(&mut self) -> TokenType {
        while self.peek().is_ascii_alphanumeric() || self.peek() == b'_' {
            self.advance();
        }

        let text: &str = &self.source[self.start..self.current];

        match KEYWORDS.get(text) {
            Some(token_type) => token_type.clone(),

            None => TokenType::IDENTIFIER,
        }
    }

    #[inline]
    fn advance(&mut self) -> u8 {
        let byte: u8 = self.source.as_bytes()[self.current];

        self.current += 1;

        byte
    }

    #[inline]
    fn match_byte(&mut self, expected: u8) -> bool {
        if self.is_at_end() || self.source.as_bytes()[self.current] != expected {
            false
        } else {
            self.current += 1;

            true
        }
    }

    #[inline]
    fn peek(&self) -> u8 {
        if self.is_at_end() {
            0
        } else {
            self.source.as_bytes()[self.current]
        }
    }

    #[inline]
    fn peek_next(&self) -> u8 {
        if self.current + 1 >= self.source.len() {
            0
        } else {
            self.source.as_bytes()[self.current + 1]
        }
    }

    #[inline]
    fn is_at_end(&self) -> bool {
        self.current >= self.source.len()
    }
}

impl Iterator for Scanner<'_> {
    type Item = Result<Token>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.is_at_end() {
                if self.eof_emitted {
                    return None;
                }

                self.eof_emitted = true;

                return Some(Ok(Token::new(TokenType::EOF, String::new(), self.line)));
            }

            self.start = self.current;

            match self.scan_token() {
                Ok(Some(token_type)) => {
                    let lexeme: String = self.source[self.start..self.current].to_string();

                    return Some(Ok(Token::new(token_type, lexeme, self.line)));
                }

                Ok(None) => continue,

                Err(error) => return Some(Err(error)),
            }
        }
    }
}

impl FusedIterator for Scanner<'_> {}

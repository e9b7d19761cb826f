//! Lexer for terminal command lines
//!
//! Splits a line into words and the operators the terminal knows
//! (`|`, `;`, `>`, `>>`). Quotes group words and are removed:
//! - single quotes keep everything literally
//! - double quotes keep everything except `\"` and `\\`
//! - outside quotes a backslash escapes whitespace, quotes and operators

use super::tokens::Token;
use crate::error::{Error, Result};

/// Message for an unclosed `'` or `"`.
pub const UNTERMINATED_QUOTE: &str = "syntax error: unterminated quoted string";

/// Lexer for command lines.
pub struct Lexer<'a> {
    chars: std::iter::Peekable<std::str::Chars<'a>>,
}

impl<'a> Lexer<'a> {
    /// Create a new lexer for the given input.
    pub fn new(input: &'a str) -> Self {
        Self {
            chars: input.chars().peekable(),
        }
    }

    /// Tokenize the whole input.
    pub fn tokenize(mut self) -> Result<Vec<Token>> {
        let mut tokens = Vec::new();
        while let Some(token) = self.next_token()? {
            tokens.push(token);
        }
        Ok(tokens)
    }

    /// Get the next token from the input.
    pub fn next_token(&mut self) -> Result<Option<Token>> {
        self.skip_whitespace();

        let Some(ch) = self.peek_char() else {
            return Ok(None);
        };

        match ch {
            '|' => {
                self.advance();
                Ok(Some(Token::Pipe))
            }
            ';' => {
                self.advance();
                Ok(Some(Token::Semicolon))
            }
            '>' => {
                self.advance();
                if self.peek_char() == Some('>') {
                    self.advance();
                    Ok(Some(Token::RedirectAppend))
                } else {
                    Ok(Some(Token::RedirectOut))
                }
            }
            _ => self.read_word().map(|w| Some(Token::Word(w))),
        }
    }

    fn peek_char(&mut self) -> Option<char> {
        self.chars.peek().copied()
    }

    fn advance(&mut self) -> Option<char> {
        self.chars.next()
    }

    fn skip_whitespace(&mut self) {
        while let Some(ch) = self.peek_char() {
            if ch.is_whitespace() {
                self.advance();
            } else {
                break;
            }
        }
    }

    fn read_word(&mut self) -> Result<String> {
        let mut word = String::new();

        while let Some(ch) = self.peek_char() {
            match ch {
                c if c.is_whitespace() => break,
                '|' | ';' | '>' => break,
                '\'' => {
                    self.advance();
                    self.read_single_quoted(&mut word)?;
                }
                '"' => {
                    self.advance();
                    self.read_double_quoted(&mut word)?;
                }
                '\\' => {
                    self.advance();
                    match self.peek_char() {
                        Some(next)
                            if next.is_whitespace() || matches!(next, '\'' | '"' | '|' | ';' | '>' | '\\') =>
                        {
                            word.push(next);
                            self.advance();
                        }
                        _ => word.push('\\'),
                    }
                }
                c => {
                    word.push(c);
                    self.advance();
                }
            }
        }

        Ok(word)
    }

    fn read_single_quoted(&mut self, word: &mut String) -> Result<()> {
        loop {
            match self.advance() {
                Some('\'') => return Ok(()),
                Some(c) => word.push(c),
                None => return Err(Error::Parse(UNTERMINATED_QUOTE.to_string())),
            }
        }
    }

    fn read_double_quoted(&mut self, word: &mut String) -> Result<()> {
        loop {
            match self.advance() {
                Some('"') => return Ok(()),
                Some('\\') => match self.peek_char() {
                    Some(next @ ('"' | '\\')) => {
                        word.push(next);
                        self.advance();
                    }
                    _ => word.push('\\'),
                },
                Some(c) => word.push(c),
                None => return Err(Error::Parse(UNTERMINATED_QUOTE.to_string())),
            }
        }
    }
}

/// Quote `word` so that lexing the result yields `word` again.
///
/// Words without whitespace, quotes, backslashes or operators are
/// returned unchanged.
pub fn quote(word: &str) -> String {
    let plain = !word.is_empty()
        && !word
            .chars()
            .any(|c| c.is_whitespace() || matches!(c, '\'' | '"' | '\\' | '|' | ';' | '>'));
    if plain {
        return word.to_string();
    }

    let mut quoted = String::with_capacity(word.len() + 2);
    quoted.push('"');
    for c in word.chars() {
        if matches!(c, '"' | '\\') {
            quoted.push('\\');
        }
        quoted.push(c);
    }
    quoted.push('"');
    quoted
}

//! Parser module for termquest
//!
//! Turns one input line into a [`Script`]. There is no control flow and no
//! expansion: a line is a `;`-separated list of pipelines, each a list of
//! simple commands joined by `|` with at most one output redirection each.

mod ast;
mod lexer;
mod tokens;

pub use ast::{Pipeline, Redirect, Script, SimpleCommand};
pub use lexer::quote;
use lexer::Lexer;
use tokens::Token;

use crate::error::{Error, Result};

type Tokens = std::iter::Peekable<std::vec::IntoIter<Token>>;

/// Parser for command lines.
pub struct Parser<'a> {
    input: &'a str,
}

impl<'a> Parser<'a> {
    /// Create a new parser for the given input.
    pub fn new(input: &'a str) -> Self {
        Self { input }
    }

    /// Parse the input into pipelines.
    ///
    /// An input without any words yields an empty script.
    pub fn parse(self) -> Result<Script> {
        let tokens = Lexer::new(self.input).tokenize()?;
        let mut iter = tokens.into_iter().peekable();
        let mut pipelines = Vec::new();

        while iter.peek().is_some() {
            pipelines.push(Self::parse_pipeline(&mut iter)?);
            match iter.next() {
                None => break,
                Some(Token::Semicolon) => {}
                Some(other) => return Err(unexpected(other.display())),
            }
        }

        Ok(Script { pipelines })
    }

    fn parse_pipeline(iter: &mut Tokens) -> Result<Pipeline> {
        let mut stages = vec![Self::parse_stage(iter)?];

        while let Some(Token::Pipe) = iter.peek() {
            iter.next();
            if iter.peek().is_none() {
                return Err(unexpected("newline"));
            }
            stages.push(Self::parse_stage(iter)?);
        }

        Ok(Pipeline { stages })
    }

    fn parse_stage(iter: &mut Tokens) -> Result<SimpleCommand> {
        let mut words = Vec::new();
        let mut redirect = None;

        while let Some(token) = iter.peek() {
            match token {
                Token::Pipe | Token::Semicolon => break,
                Token::Word(_) => {
                    if let Some(Token::Word(w)) = iter.next() {
                        words.push(w);
                    }
                }
                Token::RedirectOut | Token::RedirectAppend => {
                    let append = matches!(token, Token::RedirectAppend);
                    iter.next();
                    match iter.next() {
                        Some(Token::Word(target)) => {
                            redirect = Some(Redirect { append, target });
                        }
                        Some(other) => return Err(unexpected(other.display())),
                        None => return Err(unexpected("newline")),
                    }
                }
            }
        }

        let mut words = words.into_iter();
        let Some(name) = words.next() else {
            let near = match iter.peek() {
                Some(token) => token.display().to_string(),
                None => "newline".to_string(),
            };
            return Err(unexpected(&near));
        };

        Ok(SimpleCommand {
            name,
            args: words.collect(),
            redirect,
        })
    }
}

fn unexpected(token: &str) -> Error {
    Error::Parse(format!("syntax error near unexpected token `{token}'"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(input: &str) -> Pipeline {
        let mut script = Parser::new(input).parse().unwrap();
        assert_eq!(script.pipelines.len(), 1, "expected one pipeline");
        script.pipelines.remove(0)
    }

    fn parse_err(input: &str) -> String {
        Parser::new(input).parse().unwrap_err().to_string()
    }

    #[test]
    fn test_single_command() {
        let p = parse("ls -la");
        assert_eq!(p.stages.len(), 1);
        assert_eq!(p.stages[0].name, "ls");
        assert_eq!(p.stages[0].args, vec!["-la"]);
        assert!(p.stages[0].redirect.is_none());
    }

    #[test]
    fn test_pipeline() {
        let p = parse("cat commands.txt | grep sudo | head 2");
        let names: Vec<_> = p.stages.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["cat", "grep", "head"]);
        assert_eq!(p.stages[2].args, vec!["2"]);
    }

    #[test]
    fn test_redirect() {
        let p = parse("echo Top Secret > secret.txt");
        let stage = &p.stages[0];
        assert_eq!(stage.args, vec!["Top", "Secret"]);
        assert_eq!(
            stage.redirect,
            Some(Redirect {
                append: false,
                target: "secret.txt".to_string()
            })
        );

        let p = parse("echo more >> log");
        assert!(p.stages[0].redirect.as_ref().unwrap().append);
    }

    #[test]
    fn test_redirect_before_args() {
        let p = parse("echo > out hello");
        assert_eq!(p.stages[0].args, vec!["hello"]);
        assert_eq!(p.stages[0].redirect.as_ref().unwrap().target, "out");
    }

    #[test]
    fn test_empty_line() {
        assert!(Parser::new("").parse().unwrap().pipelines.is_empty());
        assert!(Parser::new("   ").parse().unwrap().pipelines.is_empty());
    }

    #[test]
    fn test_sequence() {
        let script = Parser::new("cd level1; cat editme.txt").parse().unwrap();
        assert_eq!(script.pipelines.len(), 2);
        assert_eq!(script.pipelines[0].stages[0].name, "cd");
        assert_eq!(script.pipelines[1].stages[0].args, vec!["editme.txt"]);

        // trailing separator is allowed
        let script = Parser::new("pwd;").parse().unwrap();
        assert_eq!(script.pipelines.len(), 1);
    }

    #[test]
    fn test_quoted_pipe_is_literal() {
        let p = parse("echo 'a|b'");
        assert_eq!(p.stages.len(), 1);
        assert_eq!(p.stages[0].args, vec!["a|b"]);
    }

    #[test]
    fn test_syntax_errors() {
        assert_eq!(
            parse_err("| ls"),
            "syntax error near unexpected token `|'"
        );
        assert_eq!(
            parse_err("ls |"),
            "syntax error near unexpected token `newline'"
        );
        assert_eq!(
            parse_err("ls | | wc"),
            "syntax error near unexpected token `|'"
        );
        assert_eq!(
            parse_err("echo hi >"),
            "syntax error near unexpected token `newline'"
        );
        assert_eq!(
            parse_err("echo hi > | cat"),
            "syntax error near unexpected token `|'"
        );
        assert_eq!(
            parse_err("; ls"),
            "syntax error near unexpected token `;'"
        );
        assert_eq!(
            parse_err("ls ;; pwd"),
            "syntax error near unexpected token `;'"
        );
        assert_eq!(
            parse_err("echo 'open"),
            "syntax error: unterminated quoted string"
        );
    }
}

//! Token types for the lexer

/// Token types produced by the lexer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// A word with quotes already removed
    Word(String),

    /// Pipe (|)
    Pipe,

    /// Semicolon (;)
    Semicolon,

    /// Redirect output (>)
    RedirectOut,

    /// Redirect output append (>>)
    RedirectAppend,
}

impl Token {
    /// How the token is shown in `near unexpected token` messages.
    pub fn display(&self) -> &str {
        match self {
            Token::Word(w) => w,
            Token::Pipe => "|",
            Token::Semicolon => ";",
            Token::RedirectOut => ">",
            Token::RedirectAppend => ">>",
        }
    }
}

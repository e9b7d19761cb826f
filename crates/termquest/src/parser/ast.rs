//! Parsed command line

/// A full input line: pipelines separated by `;`, run in order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Script {
    pub pipelines: Vec<Pipeline>,
}

/// One or more stages joined by `|`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pipeline {
    pub stages: Vec<SimpleCommand>,
}

/// One pipeline stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimpleCommand {
    /// Command name (first word)
    pub name: String,
    /// Remaining words
    pub args: Vec<String>,
    /// Output redirection, if any
    pub redirect: Option<Redirect>,
}

/// Output redirection (`> target` or `>> target`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Redirect {
    /// `>>` instead of `>`
    pub append: bool,
    /// Path as typed, resolved against the cwd at execution time
    pub target: String,
}

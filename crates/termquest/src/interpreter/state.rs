//! Interpreter state types

/// Result of executing one command.
///
/// `stdout` and `stderr` hold text without a trailing newline; a stage's
/// text as seen by the next stage (and by the scrollback) is stdout followed
/// by stderr.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecResult {
    /// Standard output
    pub stdout: String,
    /// Standard error
    pub stderr: String,
    /// Exit code
    pub exit_code: i32,
    /// Request for the session, acted on by the dispatcher
    pub signal: Option<Signal>,
}

impl ExecResult {
    /// Create a successful result with the given stdout.
    pub fn ok(stdout: impl Into<String>) -> Self {
        Self {
            stdout: stdout.into(),
            ..Default::default()
        }
    }

    /// Create a failed result with the given stderr.
    pub fn err(stderr: impl Into<String>, exit_code: i32) -> Self {
        Self {
            stderr: stderr.into(),
            exit_code,
            ..Default::default()
        }
    }

    /// Create a result that only carries a signal.
    pub fn signal(signal: Signal) -> Self {
        Self {
            signal: Some(signal),
            ..Default::default()
        }
    }

    /// Check if the result indicates success.
    pub fn is_success(&self) -> bool {
        self.exit_code == 0
    }

    /// The text this command contributes to a pipeline.
    pub fn text(&self) -> String {
        match (self.stdout.is_empty(), self.stderr.is_empty()) {
            (_, true) => self.stdout.clone(),
            (true, false) => self.stderr.clone(),
            (false, false) => format!("{}\n{}", self.stdout, self.stderr),
        }
    }
}

/// Session-level effects a command can request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Signal {
    /// Wipe the scrollback and stop the pipeline.
    Clear,
    /// Ask for the sudo password, then run the command line.
    Sudo(String),
}

/// Blocking sub-prompt that intercepts the next submitted line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubPrompt {
    /// The next line is a sudo password (render it masked).
    Password,
    /// The next line is a choice number between 1 and `count`.
    Choice { count: usize },
}

/// Change to the display, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputEvent {
    /// Append a line.
    Line(String),
    /// Everything shown so far was cleared.
    Clear,
}

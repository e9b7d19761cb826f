//! Error types for termquest
//!
//! Most failures inside a session never become an [`Error`]: a missing file or
//! a permission problem is rendered as a shell-style output line and the
//! session carries on. `Error` is reserved for things the caller may want to
//! act on:
//! - Parse errors (rendered by the dispatcher as `bash: ...` lines)
//! - Filesystem errors returned by [`FileSystem`](crate::FileSystem) methods
//! - Resource limits and persisted-state I/O

use crate::limits::LimitExceeded;
use thiserror::Error;

/// Result type alias using termquest's Error.
pub type Result<T> = std::result::Result<T, Error>;

/// termquest error types.
#[derive(Error, Debug)]
pub enum Error {
    /// The command line could not be parsed.
    ///
    /// The message is complete (`syntax error near unexpected token ...`).
    #[error("{0}")]
    Parse(String),

    /// Execution error occurred while running a command.
    #[error("execution error: {0}")]
    Execution(String),

    /// Virtual filesystem operation failed.
    #[error(transparent)]
    Fs(#[from] FsError),

    /// Resource limit exceeded.
    #[error("resource limit exceeded: {0}")]
    ResourceLimit(#[from] LimitExceeded),

    /// Persisted state could not be read or written.
    #[error("storage error: {0}")]
    Storage(#[from] std::io::Error),

    /// Persisted state could not be (de)serialized.
    #[error("invalid state: {0}")]
    Json(#[from] serde_json::Error),

    /// Internal error for unexpected failures.
    #[error("internal error: {0}")]
    Internal(String),
}

/// Virtual filesystem failures.
///
/// The display strings are the tail of the shell messages builtins print
/// (`rm: cannot remove 'x': Is a directory`).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FsError {
    #[error("No such file or directory")]
    NotFound,

    #[error("Not a directory")]
    NotADirectory,

    #[error("Is a directory")]
    IsADirectory,

    #[error("Directory not empty")]
    DirectoryNotEmpty,

    #[error("File exists")]
    AlreadyExists,

    /// Moving or copying a directory into itself.
    #[error("Invalid argument")]
    InvalidArgument,

    /// Refusing to replace or remove the root directory.
    #[error("Device or resource busy")]
    Busy,
}

impl Error {
    /// The filesystem error behind this error, if any.
    pub fn as_fs(&self) -> Option<&FsError> {
        match self {
            Error::Fs(e) => Some(e),
            _ => None,
        }
    }
}

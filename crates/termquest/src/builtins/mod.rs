//! Built-in terminal commands
//!
//! This module provides the [`Builtin`] trait for implementing commands,
//! the [`Context`] struct handed to them, and the [`Registry`] the
//! dispatcher looks names up in.
//!
//! # Custom Builtins
//!
//! Implement the [`Builtin`] trait to create custom commands:
//!
//! ```rust
//! use termquest::{Builtin, BuiltinContext, ExecResult, async_trait};
//!
//! struct Fortune;
//!
//! #[async_trait]
//! impl Builtin for Fortune {
//!     async fn execute(&self, _ctx: BuiltinContext<'_>) -> termquest::Result<ExecResult> {
//!         Ok(ExecResult::ok("You will find the password."))
//!     }
//!
//!     fn description(&self) -> &str {
//!         "Print a fortune"
//!     }
//! }
//! ```
//!
//! Register via [`TerminalBuilder::builtin`](crate::TerminalBuilder::builtin).

mod base64;
mod cat;
mod echo;
mod fileops;
mod grep;
mod headtail;
mod ls;
mod navigation;
mod system;

pub use base64::Base64;
pub use cat::Cat;
pub use echo::Echo;
pub use fileops::{Chmod, Chown, Cp, Mkdir, Mv, Rm, Rmdir, Touch};
pub use grep::Grep;
pub use headtail::{Head, Tail, parse_count};
pub use ls::Ls;
pub use navigation::{Cd, Pwd};
pub use system::{About, Clear, Date, Help, Sudo, Whoami};

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::Result;
use crate::fs::{DEFAULT_OWNER, FileSystem};
use crate::interpreter::ExecResult;
use crate::path::resolve_path;

/// Execution context for builtin commands.
///
/// Provides access to the session: arguments, working directory,
/// filesystem, pipeline input and the current privilege level.
pub struct Context<'a> {
    /// Command arguments (not including the command name).
    ///
    /// For `chmod 600 secret.txt`, this contains `["600", "secret.txt"]`.
    pub args: &'a [String],

    /// Current working directory (mutable).
    ///
    /// Used by `cd` and path resolution.
    pub cwd: &'a mut PathBuf,

    /// Virtual filesystem of this session.
    pub fs: Arc<dyn FileSystem>,

    /// Text of the previous pipeline stage.
    ///
    /// For `cat flag.b64 | base64 -d`, stdin is `Some("RkxBRy...")`.
    pub stdin: Option<&'a str>,

    /// Whether this invocation runs with sudo privileges.
    pub elevated: bool,

    /// All registered commands, in registration order.
    pub registry: &'a Registry,

    /// The rendered prompt (`user@site:/home/user$`).
    pub prompt: &'a str,
}

impl<'a> Context<'a> {
    /// Resolve a path argument against the working directory.
    pub fn resolve(&self, path: &str) -> PathBuf {
        resolve_path(self.cwd.as_path(), path)
    }

    /// Read a file the session is allowed to read.
    ///
    /// Files owned by anyone but the session user, or with the owner-read
    /// bit cleared, need elevation.
    pub async fn read_permitted(&self, path: &Path) -> std::result::Result<String, Unreadable> {
        let metadata = self.fs.stat(path).await.map_err(|_| Unreadable::Missing)?;
        if metadata.file_type.is_dir() {
            return Err(Unreadable::Directory);
        }
        let readable = metadata.owner == DEFAULT_OWNER && metadata.owner_can_read();
        if !readable && !self.elevated {
            return Err(Unreadable::Denied);
        }
        self.fs.read_file(path).await.map_err(|_| Unreadable::Missing)
    }

    /// Create the parent directories of `path` if they are missing.
    ///
    /// Fails with `NotADirectory` when a file sits in the parent chain.
    pub async fn ensure_parent(&self, path: &Path) -> Result<()> {
        match path.parent() {
            Some(parent) => self.fs.mkdir(parent, true).await,
            None => Ok(()),
        }
    }
}

/// Why a file operand could not be read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unreadable {
    /// Missing, or a parent is not a directory
    Missing,
    /// The path is a directory
    Directory,
    /// Needs elevation
    Denied,
}

/// Minimum number of arguments a command needs.
///
/// The dispatcher checks it before running the command and prints
/// `missing` when too few arguments were given and no piped input is
/// available.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Arity {
    /// Minimum argument count
    pub min: usize,
    /// Message printed when the minimum is not met
    pub missing: &'static str,
}

impl Arity {
    /// No required arguments.
    pub const NONE: Arity = Arity {
        min: 0,
        missing: "",
    };

    /// Require at least `min` arguments.
    pub const fn at_least(min: usize, missing: &'static str) -> Self {
        Self { min, missing }
    }

    /// The missing-operand message if `args` is too short.
    pub fn check(&self, args: &[String]) -> Option<&'static str> {
        (args.len() < self.min).then_some(self.missing)
    }
}

/// Trait for implementing builtin commands.
///
/// All builtins must implement this trait. The trait requires `Send + Sync`
/// for use behind an `Arc` in async contexts.
///
/// # Return Values
///
/// Return [`ExecResult::ok`](crate::ExecResult::ok) for success with output,
/// or [`ExecResult::err`](crate::ExecResult::err) for a shell-style error
/// line. Returning `Err` is reserved for failures the session cannot render.
#[async_trait]
pub trait Builtin: Send + Sync {
    /// Execute the builtin command.
    async fn execute(&self, ctx: Context<'_>) -> Result<ExecResult>;

    /// One-line description shown by `help`.
    fn description(&self) -> &str {
        ""
    }

    /// Argument requirements checked by the dispatcher.
    fn arity(&self) -> Arity {
        Arity::NONE
    }
}

/// Ordered command table.
///
/// Lookup is by exact name; when a name is registered twice the first
/// registration stays in effect.
#[derive(Default)]
pub struct Registry {
    commands: Vec<(String, Box<dyn Builtin>)>,
    index: HashMap<String, usize>,
}

impl Registry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// The terminal's command set, in `help` order.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register("sudo", Box::new(Sudo));
        registry.register("chmod", Box::new(Chmod));
        registry.register("chown", Box::new(Chown));
        registry.register("head", Box::new(Head));
        registry.register("tail", Box::new(Tail));
        registry.register("grep", Box::new(Grep));
        registry.register("touch", Box::new(Touch));
        registry.register("mkdir", Box::new(Mkdir));
        registry.register("rm", Box::new(Rm));
        registry.register("rmdir", Box::new(Rmdir));
        registry.register("echo", Box::new(Echo));
        registry.register("mv", Box::new(Mv));
        registry.register("cp", Box::new(Cp));
        registry.register("base64", Box::new(Base64));
        registry.register("help", Box::new(Help));
        registry.register("about", Box::new(About));
        registry.register("whoami", Box::new(Whoami));
        registry.register("pwd", Box::new(Pwd));
        registry.register("ls", Box::new(Ls));
        registry.register("cd", Box::new(Cd));
        registry.register("cat", Box::new(Cat));
        registry.register("date", Box::new(Date));
        registry.register("clear", Box::new(Clear));
        registry
    }

    /// Register a command.
    ///
    /// Returns `false` (and drops `builtin`) if the name is already taken.
    pub fn register(&mut self, name: impl Into<String>, builtin: Box<dyn Builtin>) -> bool {
        let name = name.into();
        if self.index.contains_key(&name) {
            return false;
        }
        self.index.insert(name.clone(), self.commands.len());
        self.commands.push((name, builtin));
        true
    }

    /// Look up a command by exact name.
    pub fn get(&self, name: &str) -> Option<&dyn Builtin> {
        self.index
            .get(name)
            .map(|&i| self.commands[i].1.as_ref())
    }

    /// Iterate over `(name, command)` in registration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &dyn Builtin)> {
        self.commands.iter().map(|(n, b)| (n.as_str(), b.as_ref()))
    }

    /// Registered names in registration order.
    pub fn names(&self) -> Vec<&str> {
        self.commands.iter().map(|(n, _)| n.as_str()).collect()
    }

    /// Number of registered commands.
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// Whether no commands are registered.
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! Helpers for running a single builtin against a filesystem.

    use super::*;
    use crate::fs::InMemoryFs;

    pub struct Harness {
        pub fs: Arc<dyn FileSystem>,
        pub cwd: PathBuf,
        pub registry: Registry,
        pub elevated: bool,
    }

    impl Harness {
        pub fn seeded() -> Self {
            Self {
                fs: Arc::new(InMemoryFs::seeded()),
                cwd: PathBuf::from("/home/user"),
                registry: Registry::with_defaults(),
                elevated: false,
            }
        }

        pub async fn run(&mut self, builtin: &dyn Builtin, args: &[&str]) -> ExecResult {
            self.run_with_stdin(builtin, args, None).await
        }

        pub async fn run_with_stdin(
            &mut self,
            builtin: &dyn Builtin,
            args: &[&str],
            stdin: Option<&str>,
        ) -> ExecResult {
            let args: Vec<String> = args.iter().map(|s| s.to_string()).collect();
            let ctx = Context {
                args: &args,
                cwd: &mut self.cwd,
                fs: Arc::clone(&self.fs),
                stdin,
                elevated: self.elevated,
                registry: &self.registry,
                prompt: "user@site:/home/user$",
            };
            builtin.execute(ctx).await.unwrap()
        }
    }
}

//! termquest - Simulated bash terminal, text adventure and tile walk
//!
//! Three small interactive programs that share one shape: a session takes a
//! line of input, updates its state and produces display lines.
//!
//! - [`Terminal`]: a bash-like command interpreter over an in-memory
//!   filesystem seeded with three challenge levels, with a timed `sudo`
//! - [`adventure::Monk`]: the CyberMonk text adventure, a location graph
//!   explored with `ls`/`cd`/`cat` and persisted after every command
//! - [`exploration::Game`]: Podvigh, a tile walk over procedurally placed
//!   encounters with a rotating zone
//!
//! # Example
//!
//! ```rust
//! use termquest::Terminal;
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> termquest::Result<()> {
//!     let mut term = Terminal::new();
//!     let result = term.exec("cat level2/flag.b64 | base64 -d").await?;
//!     assert_eq!(result.stdout, "FLAG-LEVE2: You decoded the flag!");
//!     Ok(())
//! }
//! ```
//!
//! Interactive front-ends feed lines through [`Terminal::submit`] and render
//! [`Terminal::take_events`]; while [`Terminal::pending_prompt`] is `Some`,
//! the next line answers the sub-prompt instead of running a command.

pub mod adventure;
mod builtins;
mod error;
pub mod exploration;
mod fs;
mod interpreter;
mod limits;
mod logging_impl;
mod parser;
mod path;

pub use async_trait::async_trait;
pub use builtins::{Arity, Builtin, Context as BuiltinContext, Registry, Unreadable};
pub use error::{Error, FsError, Result};
pub use fs::{
    DEFAULT_DIR_MODE, DEFAULT_FILE_MODE, DEFAULT_OWNER, DirEntry, FileSystem, FileType, InMemoryFs,
    Metadata,
};
pub use interpreter::{
    DEFAULT_ELEVATION_WINDOW, DEFAULT_SUDO_PASSWORD, ExecResult, OutputEvent, SESSION_EXPIRED,
    Signal, SubPrompt,
};
pub use limits::{LimitExceeded, TerminalLimits};
pub use logging_impl::{LogConfig, sanitize_for_log};
pub use parser::{Parser, Pipeline, Redirect, Script, SimpleCommand};
pub use path::{HOME_DIR, display_path, normalize_path, resolve_path};

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use interpreter::{Interpreter, SudoSession};

/// Welcome lines shown when a session starts.
pub fn banner_lines(uptime_hours: u32) -> Vec<String> {
    vec![
        "joe@debian".to_string(),
        "--------------------------".to_string(),
        "OS: Debian GNU/Linux 12 (Bookworm) x86_64".to_string(),
        "Host: BrowserTerminal (React)".to_string(),
        "Kernel: 6.1.0-0-amd64".to_string(),
        format!("Uptime: {uptime_hours} hours"),
        "Packages: 42 (simulated)".to_string(),
        "Shell: bash (simulated)".to_string(),
        "Resolution: 1280x720 (browser)".to_string(),
        "Terminal: BrowserTerminal.jsx".to_string(),
        "Theme: Default".to_string(),
        "--------------------------".to_string(),
        "Welcome to the Browser Terminal!".to_string(),
        "Type 'help' to see available commands.".to_string(),
    ]
}

/// One terminal session.
///
/// Each session owns its filesystem; nothing is shared between two
/// `Terminal` values unless a filesystem is passed to both through
/// [`TerminalBuilder::fs`].
pub struct Terminal {
    interpreter: Interpreter,
}

impl Default for Terminal {
    fn default() -> Self {
        Self::new()
    }
}

impl Terminal {
    /// Create a session over a freshly seeded filesystem, without banner.
    pub fn new() -> Self {
        Self::builder().banner(false).build()
    }

    /// Create a new TerminalBuilder for customized configuration.
    pub fn builder() -> TerminalBuilder {
        TerminalBuilder::default()
    }

    /// Submit one typed line.
    ///
    /// Routes the line to the sudo password check while the password prompt
    /// is open, otherwise dispatches it. Output goes to the scrollback.
    pub async fn submit(&mut self, line: &str) {
        self.interpreter.submit(line).await;
    }

    /// Run a line and return its output without echoing it.
    ///
    /// A `sudo` stage is not prompted for; it comes back as
    /// [`Signal::Sudo`] on the result.
    ///
    /// # Errors
    ///
    /// Syntax errors and exceeded limits.
    pub async fn exec(&mut self, line: &str) -> Result<ExecResult> {
        self.interpreter.tick();
        self.interpreter.execute(line.trim(), false).await
    }

    /// Everything shown so far, oldest first.
    pub fn scrollback(&self) -> &[String] {
        self.interpreter.scrollback()
    }

    /// Display changes since the last call.
    pub fn take_events(&mut self) -> Vec<OutputEvent> {
        self.interpreter.take_events()
    }

    /// The sub-prompt the next line answers, if any.
    pub fn pending_prompt(&self) -> Option<SubPrompt> {
        self.interpreter.pending_prompt()
    }

    /// Prompt for the next command line.
    pub fn prompt(&self) -> String {
        self.interpreter.prompt()
    }

    pub fn cwd(&self) -> &Path {
        self.interpreter.cwd()
    }

    /// Whether a sudo elevation window is open.
    pub fn is_elevated(&self) -> bool {
        self.interpreter.is_elevated()
    }

    /// Let time-based state catch up; logs `[sudo] session expired.` once
    /// when an elevation window has closed.
    pub fn tick(&mut self) {
        self.interpreter.tick();
    }

    /// The session's filesystem.
    pub fn fs(&self) -> Arc<dyn FileSystem> {
        Arc::clone(self.interpreter.fs())
    }

    /// Names of the registered commands, in `help` order.
    pub fn commands(&self) -> Vec<&str> {
        self.interpreter.registry().names()
    }
}

/// Builder for customized Terminal configuration.
///
/// # Example
///
/// ```rust
/// use std::time::Duration;
/// use termquest::{Terminal, TerminalLimits};
///
/// let term = Terminal::builder()
///     .cwd("/home/user/level1")
///     .sudo_password("swordfish")
///     .elevation_window(Duration::from_secs(30))
///     .compact_prompt(true)
///     .limits(TerminalLimits::new().max_scrollback_lines(200))
///     .build();
/// assert_eq!(term.prompt(), "u@s:/home/user/level1$");
/// ```
pub struct TerminalBuilder {
    fs: Option<Arc<dyn FileSystem>>,
    cwd: Option<PathBuf>,
    sudo_password: String,
    elevation_window: Duration,
    compact_prompt: bool,
    banner: bool,
    limits: TerminalLimits,
    log_config: LogConfig,
    custom_builtins: Vec<(String, Box<dyn Builtin>)>,
}

impl Default for TerminalBuilder {
    fn default() -> Self {
        Self {
            fs: None,
            cwd: None,
            sudo_password: DEFAULT_SUDO_PASSWORD.to_string(),
            elevation_window: DEFAULT_ELEVATION_WINDOW,
            compact_prompt: false,
            banner: true,
            limits: TerminalLimits::default(),
            log_config: LogConfig::default(),
            custom_builtins: Vec::new(),
        }
    }
}

impl TerminalBuilder {
    /// Set a custom filesystem. Defaults to [`InMemoryFs::seeded`].
    pub fn fs(mut self, fs: Arc<dyn FileSystem>) -> Self {
        self.fs = Some(fs);
        self
    }

    /// Set the starting directory. Defaults to `/home/user`.
    pub fn cwd(mut self, cwd: impl Into<PathBuf>) -> Self {
        self.cwd = Some(cwd.into());
        self
    }

    /// Set the password `sudo` accepts.
    pub fn sudo_password(mut self, password: impl Into<String>) -> Self {
        self.sudo_password = password.into();
        self
    }

    /// Set how long a granted elevation lasts.
    pub fn elevation_window(mut self, window: Duration) -> Self {
        self.elevation_window = window;
        self
    }

    /// Use the `u@s:` / `r@s:` prompt form for narrow screens.
    pub fn compact_prompt(mut self, compact: bool) -> Self {
        self.compact_prompt = compact;
        self
    }

    /// Show the welcome banner in the scrollback (default: on).
    pub fn banner(mut self, show: bool) -> Self {
        self.banner = show;
        self
    }

    /// Set resource limits.
    pub fn limits(mut self, limits: TerminalLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Set the logging configuration.
    pub fn log_config(mut self, config: LogConfig) -> Self {
        self.log_config = config;
        self
    }

    /// Register an extra command after the built-in ones.
    ///
    /// A name that is already taken keeps its built-in meaning.
    pub fn builtin(mut self, name: impl Into<String>, builtin: Box<dyn Builtin>) -> Self {
        self.custom_builtins.push((name.into(), builtin));
        self
    }

    /// Build the Terminal instance.
    pub fn build(self) -> Terminal {
        let fs = self
            .fs
            .unwrap_or_else(|| Arc::new(InMemoryFs::seeded()));

        let mut registry = Registry::with_defaults();
        for (name, builtin) in self.custom_builtins {
            registry.register(name, builtin);
        }

        let sudo = SudoSession::new(self.sudo_password, self.elevation_window);
        let mut interpreter = Interpreter::new(fs, registry, sudo);
        interpreter.set_limits(self.limits);
        interpreter.set_log_config(self.log_config);
        interpreter.set_compact_prompt(self.compact_prompt);
        if let Some(cwd) = self.cwd {
            interpreter.set_cwd(normalize_path(&cwd));
        }

        if self.banner {
            let uptime = (chrono::Local::now().timestamp() % 10 + 1) as u32;
            for line in banner_lines(uptime) {
                interpreter.emit(line);
            }
        }

        #[cfg(feature = "logging")]
        tracing::info!(cwd = %display_path(interpreter.cwd()), "terminal session started");

        Terminal { interpreter }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fortune;

    #[async_trait]
    impl Builtin for Fortune {
        async fn execute(&self, _ctx: BuiltinContext<'_>) -> Result<ExecResult> {
            Ok(ExecResult::ok("You will find the password."))
        }

        fn description(&self) -> &str {
            "Print a fortune"
        }
    }

    #[tokio::test]
    async fn test_exec_returns_output() {
        let mut term = Terminal::new();
        let result = term.exec("cat readme.txt").await.unwrap();
        assert_eq!(result.stdout, "Welcome to your home directory!");
        assert!(term.scrollback().is_empty());
    }

    #[tokio::test]
    async fn test_exec_parse_error() {
        let mut term = Terminal::new();
        let err = term.exec("| ls").await.unwrap_err();
        assert!(matches!(err, Error::Parse(_)));
        assert_eq!(err.to_string(), "syntax error near unexpected token `|'");
    }

    #[tokio::test]
    async fn test_exec_reports_sudo_signal() {
        let mut term = Terminal::new();
        let result = term.exec("sudo ls").await.unwrap();
        assert_eq!(result.signal, Some(Signal::Sudo("ls".to_string())));
        assert_eq!(term.pending_prompt(), None);
    }

    #[tokio::test]
    async fn test_banner() {
        let term = Terminal::builder().build();
        assert_eq!(term.scrollback()[0], "joe@debian");
        assert_eq!(
            term.scrollback().last().map(String::as_str),
            Some("Type 'help' to see available commands.")
        );
        assert!(term.scrollback()[5].starts_with("Uptime: "));
        assert!(Terminal::new().scrollback().is_empty());
    }

    #[tokio::test]
    async fn test_custom_builtin() {
        let mut term = Terminal::builder()
            .banner(false)
            .builtin("fortune", Box::new(Fortune))
            .builtin("ls", Box::new(Fortune))
            .build();

        assert_eq!(term.commands().last(), Some(&"fortune"));
        let result = term.exec("fortune").await.unwrap();
        assert_eq!(result.stdout, "You will find the password.");

        let result = term.exec("ls").await.unwrap();
        assert_eq!(result.stdout, "commands.txt  level1  level2  level3  readme.txt");

        let help = term.exec("help").await.unwrap();
        assert!(help.stdout.ends_with("fortune - Print a fortune"));
    }

    #[tokio::test]
    async fn test_builder_cwd_and_shared_fs() {
        let fs: Arc<dyn FileSystem> = Arc::new(InMemoryFs::seeded());
        let mut a = Terminal::builder()
            .banner(false)
            .fs(Arc::clone(&fs))
            .cwd("/tmp/")
            .build();
        let mut b = Terminal::builder().banner(false).fs(fs).build();

        assert_eq!(a.cwd(), Path::new("/tmp"));
        a.exec("echo shared > note.txt").await.unwrap();
        let result = b.exec("cat /tmp/note.txt").await.unwrap();
        assert_eq!(result.stdout, "shared");
    }

    #[tokio::test]
    async fn test_sessions_are_isolated() {
        let mut a = Terminal::new();
        let mut b = Terminal::new();
        a.exec("rm readme.txt").await.unwrap();
        let result = b.exec("cat readme.txt").await.unwrap();
        assert_eq!(result.stdout, "Welcome to your home directory!");
    }
}

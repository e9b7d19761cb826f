//! Interpreter for terminal command lines
//!
//! Owns one session: working directory, sudo state and the scrollback.
//! [`Interpreter::submit`] is the entry point for typed lines; it routes
//! to the password check while a sudo prompt is open and to the dispatcher
//! otherwise.

mod state;
mod sudo;

pub use state::{ExecResult, OutputEvent, Signal, SubPrompt};
pub use sudo::{
    DEFAULT_ELEVATION_WINDOW, DEFAULT_SUDO_PASSWORD, MAX_PASSWORD_ATTEMPTS, PASSWORD_PROMPT,
    PasswordOutcome, SudoSession,
};

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::builtins::{self, Registry};
use crate::error::Result;
use crate::fs::FileSystem;
use crate::limits::TerminalLimits;
use crate::logging_impl::LogConfig;
use crate::parser::{Parser, Pipeline, Redirect};
use crate::path::{HOME_DIR, display_path};

/// Line logged when an elevation window closes.
pub const SESSION_EXPIRED: &str = "[sudo] session expired.";

/// Interpreter state.
pub struct Interpreter {
    fs: Arc<dyn FileSystem>,
    cwd: PathBuf,
    registry: Registry,
    sudo: SudoSession,
    limits: TerminalLimits,
    #[cfg_attr(not(feature = "logging"), allow(dead_code))]
    log_config: LogConfig,
    compact_prompt: bool,
    scrollback: Vec<String>,
    events: Vec<OutputEvent>,
}

impl Interpreter {
    /// Create a new interpreter over `fs` with the given command table.
    pub fn new(fs: Arc<dyn FileSystem>, registry: Registry, sudo: SudoSession) -> Self {
        Self {
            fs,
            cwd: PathBuf::from(HOME_DIR),
            registry,
            sudo,
            limits: TerminalLimits::default(),
            log_config: LogConfig::default(),
            compact_prompt: false,
            scrollback: Vec::new(),
            events: Vec::new(),
        }
    }

    /// Set the current working directory.
    pub fn set_cwd(&mut self, cwd: PathBuf) {
        self.cwd = cwd;
    }

    /// Set resource limits.
    pub fn set_limits(&mut self, limits: TerminalLimits) {
        self.limits = limits;
    }

    /// Set the logging configuration.
    pub fn set_log_config(&mut self, config: LogConfig) {
        self.log_config = config;
    }

    /// Use the short `u@s:` prompt form.
    pub fn set_compact_prompt(&mut self, compact: bool) {
        self.compact_prompt = compact;
    }

    pub fn cwd(&self) -> &Path {
        &self.cwd
    }

    pub fn fs(&self) -> &Arc<dyn FileSystem> {
        &self.fs
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn is_elevated(&self) -> bool {
        self.sudo.is_elevated()
    }

    /// The prompt for the next line, e.g. `user@site:/home/user$`.
    pub fn prompt(&self) -> String {
        let (user, host) = match (self.is_elevated(), self.compact_prompt) {
            (false, false) => ("user", "site"),
            (true, false) => ("root", "site"),
            (false, true) => ("u", "s"),
            (true, true) => ("r", "s"),
        };
        format!("{user}@{host}:{}$", display_path(&self.cwd))
    }

    /// The sub-prompt waiting for the next line, if any.
    pub fn pending_prompt(&self) -> Option<SubPrompt> {
        self.sudo
            .is_awaiting_password()
            .then_some(SubPrompt::Password)
    }

    /// Everything shown so far, oldest first.
    pub fn scrollback(&self) -> &[String] {
        &self.scrollback
    }

    /// Display changes since the last call.
    pub fn take_events(&mut self) -> Vec<OutputEvent> {
        std::mem::take(&mut self.events)
    }

    /// Append a line to the scrollback.
    pub fn emit(&mut self, line: impl Into<String>) {
        let line = line.into();
        self.events.push(OutputEvent::Line(line.clone()));
        self.scrollback.push(line);

        let max = self.limits.max_scrollback_lines;
        if self.scrollback.len() > max {
            let excess = self.scrollback.len() - max;
            self.scrollback.drain(..excess);
        }
    }

    fn emit_text(&mut self, text: &str) {
        if !text.is_empty() {
            for line in text.split('\n') {
                self.emit(line);
            }
        }
    }

    fn clear(&mut self) {
        self.scrollback.clear();
        self.events.push(OutputEvent::Clear);
    }

    /// Close an elapsed elevation window, logging it once.
    pub fn tick(&mut self) {
        if self.sudo.expire() {
            #[cfg(feature = "logging")]
            tracing::info!("sudo elevation expired");
            self.emit(SESSION_EXPIRED);
        }
    }

    /// Handle one typed line.
    pub async fn submit(&mut self, line: &str) {
        self.tick();
        let line = line.trim();

        if self.sudo.is_awaiting_password() {
            self.submit_password(line).await;
        } else {
            self.process(line, false).await;
        }
    }

    async fn submit_password(&mut self, attempt: &str) {
        match self.sudo.submit_password(attempt) {
            PasswordOutcome::Granted(command) => {
                #[cfg(feature = "logging")]
                tracing::info!("sudo access granted");
                self.emit(format!("Access granted. Running: sudo {command}"));
                self.process(&command, true).await;
            }
            PasswordOutcome::Retry => {
                #[cfg(feature = "logging")]
                tracing::info!(attempts = self.sudo.attempts(), "sudo password rejected");
                self.emit("Sorry, try again.");
                self.emit(PASSWORD_PROMPT);
            }
            PasswordOutcome::Exhausted => {
                #[cfg(feature = "logging")]
                tracing::warn!("sudo prompt abandoned after failed attempts");
                self.emit(format!(
                    "sudo: {MAX_PASSWORD_ATTEMPTS} incorrect password attempts"
                ));
            }
        }
    }

    /// Dispatch a command line and log it with its output.
    ///
    /// `run_as_root` elevates this one line regardless of the session's
    /// elevation window.
    pub async fn process(&mut self, line: &str, run_as_root: bool) {
        if line.is_empty() {
            return;
        }

        #[cfg(feature = "logging")]
        tracing::debug!(line = %self.log_config.format_line(line), run_as_root, "processing line");

        let echo = format!("{} {}", self.prompt(), line);

        if !self.sudo.is_awaiting_password()
            && let Some(rest) = line.strip_prefix("sudo ")
            && !rest.trim().is_empty()
        {
            self.emit(echo);
            self.request_password(rest.trim());
            return;
        }

        match self.execute(line, run_as_root).await {
            Err(e) => {
                self.emit(echo);
                self.emit(format!("bash: {e}"));
            }
            Ok(result) => {
                let text = result.text();
                match result.signal {
                    Some(Signal::Clear) => self.clear(),
                    Some(Signal::Sudo(command)) => {
                        self.emit(echo);
                        self.emit_text(&text);
                        self.request_password(&command);
                    }
                    None => {
                        self.emit(echo);
                        self.emit_text(&text);
                    }
                }
            }
        }
    }

    fn request_password(&mut self, command: &str) {
        self.sudo.request(command);
        self.emit(PASSWORD_PROMPT);
    }

    /// Run a command line without touching the scrollback.
    ///
    /// Pipelines separated by `;` run in order and their output is joined.
    /// A `clear` or `sudo` stage stops the line and is returned as the
    /// result's signal.
    ///
    /// # Errors
    ///
    /// Syntax errors and exceeded limits.
    pub async fn execute(&mut self, line: &str, run_as_root: bool) -> Result<ExecResult> {
        self.limits.check_input(line)?;
        let script = Parser::new(line).parse()?;
        for pipeline in &script.pipelines {
            self.limits.check_stages(pipeline.stages.len())?;
        }

        #[cfg(feature = "logging")]
        tracing::trace!(pipelines = script.pipelines.len(), "parsed line");

        let mut outputs = Vec::new();
        let mut exit_code = 0;

        for pipeline in &script.pipelines {
            let result = self.run_pipeline(pipeline, run_as_root).await;
            let text = result.text();
            if !text.is_empty() {
                outputs.push(text);
            }
            exit_code = result.exit_code;
            if result.signal.is_some() {
                return Ok(ExecResult {
                    stdout: outputs.join("\n"),
                    exit_code,
                    signal: result.signal,
                    ..Default::default()
                });
            }
        }

        Ok(ExecResult {
            stdout: outputs.join("\n"),
            exit_code,
            ..Default::default()
        })
    }

    async fn run_pipeline(&mut self, pipeline: &Pipeline, run_as_root: bool) -> ExecResult {
        let elevated = self.sudo.is_elevated() || run_as_root;
        let prompt = self.prompt();
        let mut previous: Option<String> = None;
        let mut last = ExecResult::default();

        for (index, stage) in pipeline.stages.iter().enumerate() {
            let Some(builtin) = self.registry.get(&stage.name) else {
                return ExecResult::err(format!("bash: command not found: {}", stage.name), 127);
            };

            #[cfg(feature = "logging")]
            tracing::debug!(command = %stage.name, args = stage.args.len(), elevated, "running stage");

            let filtered = (index > 0)
                .then(|| filter_args(&stage.name, &stage.args))
                .flatten();
            let args = filtered.as_deref().unwrap_or(stage.args.as_slice());
            let stdin = previous.as_deref();

            let mut result = match builtin.arity().check(args) {
                Some(missing) if stdin.is_none() => ExecResult::err(missing, 1),
                _ => {
                    let ctx = builtins::Context {
                        args,
                        cwd: &mut self.cwd,
                        fs: Arc::clone(&self.fs),
                        stdin,
                        elevated,
                        registry: &self.registry,
                        prompt: &prompt,
                    };
                    builtin
                        .execute(ctx)
                        .await
                        .unwrap_or_else(|e| ExecResult::err(format!("{}: {e}", stage.name), 1))
                }
            };

            if result.signal.is_some() {
                return result;
            }

            if let Some(redirect) = &stage.redirect {
                result = self.redirect(redirect, &result).await;
            }

            previous = Some(result.text());
            last = result;
        }

        last
    }

    /// Write a stage's stdout to the redirect target. Only its stderr is
    /// left as output.
    async fn redirect(&self, redirect: &Redirect, result: &ExecResult) -> ExecResult {
        let path = crate::path::resolve_path(&self.cwd, &redirect.target);
        let text = &result.stdout;

        let written = async {
            if let Some(parent) = path.parent() {
                self.fs.mkdir(parent, true).await?;
            }
            if redirect.append {
                let existing = self.fs.read_file(&path).await.unwrap_or_default();
                if existing.is_empty() {
                    self.fs.append_file(&path, text).await
                } else {
                    self.fs.append_file(&path, &format!("\n{text}")).await
                }
            } else {
                self.fs.write_file(&path, text).await
            }
        }
        .await;

        match written {
            Ok(()) => ExecResult {
                stderr: result.stderr.clone(),
                exit_code: result.exit_code,
                ..Default::default()
            },
            Err(e) => ExecResult::err(format!("bash: {}: {e}", redirect.target), 1),
        }
    }
}

/// Arguments for a `grep`, `head` or `tail` stage fed by the previous
/// stage. File operands are dropped so the command filters its input.
fn filter_args(name: &str, args: &[String]) -> Option<Vec<String>> {
    match name {
        "grep" => {
            let mut kept = Vec::with_capacity(args.len());
            let mut has_pattern = false;
            for arg in args {
                if arg.starts_with('-') && arg.len() > 1 {
                    kept.push(arg.clone());
                } else if !has_pattern {
                    kept.push(arg.clone());
                    has_pattern = true;
                }
            }
            Some(kept)
        }
        "head" | "tail" => Some(match builtins::parse_count(args) {
            Ok((count, _)) => vec!["-n".to_string(), count.to_string()],
            Err(_) => args.to_vec(),
        }),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::InMemoryFs;
    use pretty_assertions::assert_eq;
    use std::time::Duration;

    fn session() -> Interpreter {
        Interpreter::new(
            Arc::new(InMemoryFs::seeded()),
            Registry::with_defaults(),
            SudoSession::default(),
        )
    }

    fn strings(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_echo_line_and_output() {
        let mut term = session();
        term.submit("pwd").await;
        assert_eq!(
            term.scrollback(),
            strings(&["user@site:/home/user$ pwd", "/home/user"])
        );
    }

    #[tokio::test]
    async fn test_empty_line_is_ignored() {
        let mut term = session();
        term.submit("   ").await;
        assert!(term.scrollback().is_empty());
        assert!(term.take_events().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_command() {
        let mut term = session();
        term.submit("pwd | frobnicate | cat").await;
        assert_eq!(
            term.scrollback(),
            strings(&[
                "user@site:/home/user$ pwd | frobnicate | cat",
                "bash: command not found: frobnicate",
            ])
        );
    }

    #[tokio::test]
    async fn test_pipeline_filters() {
        let mut term = session();
        let result = term
            .execute("cat commands.txt | grep sudo | head 1", false)
            .await
            .unwrap();
        assert_eq!(result.stdout, "- sudo: Run command as superuser");

        let result = term
            .execute("cat commands.txt | tail -n 2 ignored.txt", false)
            .await
            .unwrap();
        assert_eq!(
            result.stdout,
            "\nEach command is used for different tasks in the challenges."
        );
    }

    #[tokio::test]
    async fn test_pipeline_feeds_base64() {
        let mut term = session();
        let result = term
            .execute("cat level2/flag.b64 | base64 -d", false)
            .await
            .unwrap();
        assert_eq!(result.stdout, "FLAG-LEVE2: You decoded the flag!");
    }

    #[tokio::test]
    async fn test_sequence_runs_in_order() {
        let mut term = session();
        term.submit("cd level1; cat editme.txt").await;
        assert_eq!(
            term.scrollback(),
            strings(&[
                "user@site:/home/user$ cd level1; cat editme.txt",
                "cat: editme.txt: Permission denied",
            ])
        );
        assert_eq!(term.cwd(), Path::new("/home/user/level1"));
        assert_eq!(term.prompt(), "user@site:/home/user/level1$");
    }

    #[tokio::test]
    async fn test_redirect_overwrite_and_append() {
        let mut term = session();
        term.submit("echo Top Secret > level3/secret.txt").await;
        term.submit("echo more >> level3/secret.txt").await;
        let content = term
            .fs()
            .read_file(Path::new("/home/user/level3/secret.txt"))
            .await
            .unwrap();
        assert_eq!(content, "Top Secret\nmore");

        term.submit("echo fresh > /tmp/new/deep.txt").await;
        let content = term
            .fs()
            .read_file(Path::new("/tmp/new/deep.txt"))
            .await
            .unwrap();
        assert_eq!(content, "fresh");
        assert_eq!(
            term.scrollback().last().map(String::as_str),
            Some("user@site:/home/user$ echo fresh > /tmp/new/deep.txt")
        );
    }

    #[tokio::test]
    async fn test_redirect_onto_directory() {
        let mut term = session();
        let result = term.execute("echo x > level1", false).await.unwrap();
        assert_eq!(result.stdout, "bash: level1: Is a directory");
    }

    #[tokio::test]
    async fn test_redirect_any_command() {
        let mut term = session();
        term.submit("ls > /tmp/listing").await;
        let content = term
            .fs()
            .read_file(Path::new("/tmp/listing"))
            .await
            .unwrap();
        assert_eq!(content, "commands.txt  level1  level2  level3  readme.txt");
    }

    #[tokio::test]
    async fn test_redirect_keeps_errors_on_screen() {
        let mut term = session();
        term.submit("cat level1/editme.txt > /tmp/out").await;
        assert_eq!(
            term.scrollback(),
            strings(&[
                "user@site:/home/user$ cat level1/editme.txt > /tmp/out",
                "cat: level1/editme.txt: Permission denied",
            ])
        );
        let content = term.fs().read_file(Path::new("/tmp/out")).await.unwrap();
        assert_eq!(content, "");

        term.submit("cat readme.txt nosuch >> /tmp/out").await;
        assert_eq!(
            term.scrollback().last().map(String::as_str),
            Some("cat: nosuch: No such file or directory")
        );
        let content = term.fs().read_file(Path::new("/tmp/out")).await.unwrap();
        assert_eq!(content, "Welcome to your home directory!");
    }

    #[tokio::test]
    async fn test_clear_wipes_without_echo() {
        let mut term = session();
        term.submit("pwd").await;
        term.take_events();
        term.submit("clear").await;
        assert!(term.scrollback().is_empty());
        assert_eq!(term.take_events(), vec![OutputEvent::Clear]);

        term.submit("ls | clear | pwd").await;
        assert!(term.scrollback().is_empty());
    }

    #[tokio::test]
    async fn test_syntax_errors_are_rendered() {
        let mut term = session();
        term.submit("ls |").await;
        term.submit("echo 'oops").await;
        assert_eq!(
            term.scrollback(),
            strings(&[
                "user@site:/home/user$ ls |",
                "bash: syntax error near unexpected token `newline'",
                "user@site:/home/user$ echo 'oops",
                "bash: syntax error: unterminated quoted string",
            ])
        );
    }

    #[tokio::test]
    async fn test_missing_operand_from_arity() {
        let mut term = session();
        let result = term.execute("chmod 600", false).await.unwrap();
        assert_eq!(result.stdout, "chmod: missing operand");
        let result = term.execute("sudo", false).await.unwrap();
        assert_eq!(result.stdout, "sudo: missing command operand");
    }

    #[tokio::test]
    async fn test_limits() {
        let mut term = session();
        term.set_limits(TerminalLimits::new().max_pipeline_stages(2).max_scrollback_lines(3));
        term.submit("pwd | cat | cat").await;
        assert_eq!(
            term.scrollback().last().map(String::as_str),
            Some("bash: resource limit exceeded: too many pipeline stages (max 2)")
        );

        for _ in 0..5 {
            term.submit("pwd").await;
        }
        assert_eq!(term.scrollback().len(), 3);
        assert_eq!(term.scrollback()[2], "/home/user");
    }

    #[tokio::test]
    async fn test_compact_prompt() {
        let mut term = session();
        term.set_compact_prompt(true);
        assert_eq!(term.prompt(), "u@s:/home/user$");
    }

    #[tokio::test(start_paused = true)]
    async fn test_sudo_flow() {
        let mut term = session();
        term.submit("cd level1").await;
        term.submit("sudo cat editme.txt").await;
        assert_eq!(term.pending_prompt(), Some(SubPrompt::Password));

        term.submit("hunter2").await;
        assert_eq!(term.pending_prompt(), None);
        assert!(term.is_elevated());
        assert_eq!(
            term.scrollback()[1..].to_vec(),
            strings(&[
                "user@site:/home/user/level1$ sudo cat editme.txt",
                "[sudo] password for user:",
                "Access granted. Running: sudo cat editme.txt",
                "root@site:/home/user/level1$ cat editme.txt",
                "Edit me to win!",
            ])
        );
        assert!(!term.scrollback().iter().any(|l| l.contains("hunter2")));

        tokio::time::advance(Duration::from_secs(5)).await;
        term.tick();
        term.tick();
        assert_eq!(
            term.scrollback().iter().filter(|l| *l == SESSION_EXPIRED).count(),
            1
        );
        assert_eq!(term.prompt(), "user@site:/home/user/level1$");
    }

    #[tokio::test(start_paused = true)]
    async fn test_sudo_wrong_passwords() {
        let mut term = session();
        term.submit("sudo ls").await;
        term.submit("a").await;
        term.submit("b").await;
        assert_eq!(term.pending_prompt(), Some(SubPrompt::Password));
        term.submit("c").await;
        assert_eq!(term.pending_prompt(), None);
        assert!(!term.is_elevated());
        assert_eq!(
            term.scrollback(),
            strings(&[
                "user@site:/home/user$ sudo ls",
                "[sudo] password for user:",
                "Sorry, try again.",
                "[sudo] password for user:",
                "Sorry, try again.",
                "[sudo] password for user:",
                "sudo: 3 incorrect password attempts",
            ])
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_sudo_inside_pipeline_requests_password() {
        let mut term = session();
        term.submit("pwd | sudo whoami").await;
        assert_eq!(term.pending_prompt(), Some(SubPrompt::Password));
        term.submit("hunter2").await;
        assert_eq!(
            term.scrollback().last().map(String::as_str),
            Some("user")
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_sudo_inside_pipeline_keeps_quoting() {
        let mut term = session();
        term.submit(r#"pwd | sudo echo "a   b""#).await;
        term.submit("hunter2").await;
        assert!(
            term.scrollback()
                .iter()
                .any(|l| l == r#"Access granted. Running: sudo echo "a   b""#)
        );
        assert_eq!(
            term.scrollback().last().map(String::as_str),
            Some("a   b")
        );
    }

    #[test]
    fn test_filter_args() {
        assert_eq!(
            filter_args("grep", &strings(&["-i", "x", "file"])),
            Some(strings(&["-i", "x"]))
        );
        assert_eq!(
            filter_args("head", &strings(&["file", "3"])),
            Some(strings(&["-n", "3"]))
        );
        assert_eq!(filter_args("tail", &strings(&[])), Some(strings(&["-n", "10"])));
        assert_eq!(filter_args("cat", &strings(&["file"])), None);
    }
}

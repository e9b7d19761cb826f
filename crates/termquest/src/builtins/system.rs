//! Session builtins (sudo, help, about, whoami, date, clear)
//!
//! These return fixed values or hand a [`Signal`] back to the dispatcher;
//! none of them touch the filesystem.

use async_trait::async_trait;
use chrono::format::{Item, StrftimeItems};
use chrono::{Local, Utc};

use super::{Arity, Builtin, Context};
use crate::error::Result;
use crate::interpreter::{ExecResult, Signal};
use crate::parser::quote;

/// The session user.
pub const DEFAULT_USERNAME: &str = "user";

/// Text printed by `about`.
const ABOUT_TEXT: &str =
    "This is a simulated bash terminal in your browser. Type 'help' to see commands.";

/// Default `date` rendering, e.g. `Fri Oct 16 2026 09:30:00 GMT+0200`.
const DATE_FORMAT: &str = "%a %b %d %Y %H:%M:%S GMT%z";

/// The sudo builtin.
///
/// Never runs anything itself: it asks the session for the password and
/// the session re-runs the command line with elevation once it is given.
pub struct Sudo;

#[async_trait]
impl Builtin for Sudo {
    async fn execute(&self, ctx: Context<'_>) -> Result<ExecResult> {
        if ctx.args.is_empty() {
            return Ok(ExecResult::err("sudo: missing command operand", 1));
        }
        let command: Vec<String> = ctx.args.iter().map(|a| quote(a)).collect();
        Ok(ExecResult::signal(Signal::Sudo(command.join(" "))))
    }

    fn description(&self) -> &str {
        "Run command as superuser"
    }

    fn arity(&self) -> Arity {
        Arity::at_least(1, "sudo: missing command operand")
    }
}

/// The help builtin - lists registered commands in registration order.
pub struct Help;

#[async_trait]
impl Builtin for Help {
    async fn execute(&self, ctx: Context<'_>) -> Result<ExecResult> {
        let mut lines = vec!["Available commands:".to_string()];
        lines.extend(
            ctx.registry
                .iter()
                .map(|(name, builtin)| format!("{name} - {}", builtin.description())),
        );
        Ok(ExecResult::ok(lines.join("\n")))
    }

    fn description(&self) -> &str {
        "List available commands"
    }
}

/// The about builtin.
pub struct About;

#[async_trait]
impl Builtin for About {
    async fn execute(&self, _ctx: Context<'_>) -> Result<ExecResult> {
        Ok(ExecResult::ok(ABOUT_TEXT))
    }

    fn description(&self) -> &str {
        "About this terminal"
    }
}

/// The whoami builtin.
///
/// Prints the session user even while elevated; the prompt is what
/// switches to `root`.
pub struct Whoami;

#[async_trait]
impl Builtin for Whoami {
    async fn execute(&self, _ctx: Context<'_>) -> Result<ExecResult> {
        Ok(ExecResult::ok(DEFAULT_USERNAME))
    }

    fn description(&self) -> &str {
        "Show user name"
    }
}

/// The date builtin - display the current date and time.
///
/// Usage: date [-u] [+FORMAT]
///
/// Options:
///   -u       Display UTC time instead of local time
///   +FORMAT  strftime-style format
pub struct Date;

/// Reject formats chrono would fail to render.
fn validate_format(format: &str) -> std::result::Result<(), String> {
    if StrftimeItems::new(format).any(|item| matches!(item, Item::Error)) {
        return Err(format!("date: invalid format string: '{format}'"));
    }
    Ok(())
}

#[async_trait]
impl Builtin for Date {
    async fn execute(&self, ctx: Context<'_>) -> Result<ExecResult> {
        let mut utc = false;
        let mut format = DATE_FORMAT;

        for arg in ctx.args {
            if arg == "-u" {
                utc = true;
            } else if let Some(f) = arg.strip_prefix('+') {
                format = f;
            }
        }

        if let Err(msg) = validate_format(format) {
            return Ok(ExecResult::err(msg, 1));
        }

        let rendered = if utc {
            Utc::now().format(format).to_string()
        } else {
            Local::now().format(format).to_string()
        };
        Ok(ExecResult::ok(rendered))
    }

    fn description(&self) -> &str {
        "Show current date/time"
    }
}

/// The clear builtin.
pub struct Clear;

#[async_trait]
impl Builtin for Clear {
    async fn execute(&self, _ctx: Context<'_>) -> Result<ExecResult> {
        Ok(ExecResult::signal(Signal::Clear))
    }

    fn description(&self) -> &str {
        "Clear the terminal"
    }
}

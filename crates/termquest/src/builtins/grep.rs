//! grep builtin - substring line search
//!
//! Patterns are plain substrings, not regular expressions.
//!
//! Usage: grep [-i] [-v] PATTERN FILE
//!
//! Options:
//!   -i   Ignore case
//!   -v   Select non-matching lines

use async_trait::async_trait;

use super::{Arity, Builtin, Context, Unreadable};
use crate::error::Result;
use crate::interpreter::ExecResult;

/// Lines of `text` that contain `pattern` (or, with `invert`, do not),
/// newline-joined.
fn filter(text: &str, pattern: &str, ignore_case: bool, invert: bool) -> String {
    let needle = if ignore_case {
        pattern.to_lowercase()
    } else {
        pattern.to_string()
    };

    text.split('\n')
        .filter(|line| {
            let hit = if ignore_case {
                line.to_lowercase().contains(&needle)
            } else {
                line.contains(&needle)
            };
            hit != invert
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// The grep builtin command.
pub struct Grep;

#[async_trait]
impl Builtin for Grep {
    async fn execute(&self, ctx: Context<'_>) -> Result<ExecResult> {
        let mut ignore_case = false;
        let mut invert = false;
        let mut operands = Vec::new();

        for arg in ctx.args {
            match arg.as_str() {
                "-i" => ignore_case = true,
                "-v" => invert = true,
                "-iv" | "-vi" => {
                    ignore_case = true;
                    invert = true;
                }
                _ => operands.push(arg.as_str()),
            }
        }

        let (pattern, file) = match (operands.first(), operands.get(1), ctx.stdin) {
            (Some(p), Some(f), _) => (*p, *f),
            (Some(p), None, Some(stdin)) => {
                return Ok(ExecResult::ok(filter(stdin, p, ignore_case, invert)));
            }
            _ => return Ok(ExecResult::err("grep: missing pattern or file", 1)),
        };

        let path = ctx.resolve(file);
        match ctx.read_permitted(&path).await {
            Ok(content) => Ok(ExecResult::ok(filter(&content, pattern, ignore_case, invert))),
            Err(Unreadable::Denied) => Ok(ExecResult::err(
                format!("grep: cannot open '{file}': Permission denied"),
                1,
            )),
            Err(_) => Ok(ExecResult::err(
                format!("grep: cannot open '{file}': No such file"),
                1,
            )),
        }
    }

    fn description(&self) -> &str {
        "Search for a string in a file"
    }

    fn arity(&self) -> Arity {
        Arity::at_least(2, "grep: missing pattern or file")
    }
}

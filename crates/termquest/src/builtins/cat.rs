//! cat builtin command

use async_trait::async_trait;

use super::{Arity, Builtin, Context, Unreadable};
use crate::error::Result;
use crate::interpreter::ExecResult;

/// The cat builtin command.
///
/// Files owned by someone other than the session user, or whose owner-read
/// bit is cleared, can only be read with sudo. Per-file errors go to stderr
/// so a redirect captures only file contents.
pub struct Cat;

#[async_trait]
impl Builtin for Cat {
    async fn execute(&self, ctx: Context<'_>) -> Result<ExecResult> {
        if ctx.args.is_empty() {
            return Ok(match ctx.stdin {
                Some(stdin) => ExecResult::ok(stdin),
                None => ExecResult::err("cat: missing file operand", 1),
            });
        }

        let mut output = Vec::with_capacity(ctx.args.len());
        let mut errors = Vec::new();

        for arg in ctx.args {
            let path = ctx.resolve(arg);
            match ctx.read_permitted(&path).await {
                Ok(content) => output.push(content),
                Err(why) => {
                    let reason = match why {
                        Unreadable::Missing => "No such file or directory",
                        Unreadable::Directory => "Is a directory",
                        Unreadable::Denied => "Permission denied",
                    };
                    errors.push(format!("cat: {arg}: {reason}"));
                }
            }
        }

        Ok(ExecResult {
            stdout: output.join("\n"),
            exit_code: i32::from(!errors.is_empty()),
            stderr: errors.join("\n"),
            ..Default::default()
        })
    }

    fn description(&self) -> &str {
        "Concatenate and print files"
    }

    fn arity(&self) -> Arity {
        Arity::at_least(1, "cat: missing file operand")
    }
}

//! Navigation builtins (cd, pwd)

use async_trait::async_trait;

use super::{Builtin, Context};
use crate::error::Result;
use crate::interpreter::ExecResult;
use crate::path::display_path;

/// The cd builtin - change directory.
///
/// With no argument it returns to `~`.
pub struct Cd;

#[async_trait]
impl Builtin for Cd {
    async fn execute(&self, ctx: Context<'_>) -> Result<ExecResult> {
        let target = ctx.args.first().map(|s| s.as_str()).unwrap_or("~");
        let new_path = ctx.resolve(target);

        match ctx.fs.stat(&new_path).await {
            Ok(metadata) if metadata.file_type.is_dir() => {
                *ctx.cwd = new_path;
                Ok(ExecResult::ok(""))
            }
            Ok(_) => Ok(ExecResult::err(
                format!("cd: not a directory: {target}"),
                1,
            )),
            Err(_) => Ok(ExecResult::err(
                format!("cd: no such file or directory: {target}"),
                1,
            )),
        }
    }

    fn description(&self) -> &str {
        "Change directory"
    }
}

/// The pwd builtin - print working directory.
pub struct Pwd;

#[async_trait]
impl Builtin for Pwd {
    async fn execute(&self, ctx: Context<'_>) -> Result<ExecResult> {
        Ok(ExecResult::ok(display_path(ctx.cwd.as_path())))
    }

    fn description(&self) -> &str {
        "Print working directory"
    }
}

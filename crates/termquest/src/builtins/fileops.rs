//! File operation builtins - chmod, chown, touch, mkdir, rm, rmdir, mv, cp

use async_trait::async_trait;
use std::path::{Path, PathBuf};

use super::{Arity, Builtin, Context};
use crate::error::{Error, FsError, Result};
use crate::fs::{DEFAULT_FILE_MODE, DEFAULT_OWNER, FileType};
use crate::interpreter::ExecResult;

/// Collect per-operand error lines into one result.
fn finish(errors: Vec<String>) -> ExecResult {
    if errors.is_empty() {
        ExecResult::ok("")
    } else {
        ExecResult::err(errors.join("\n"), 1)
    }
}

/// Operands with option flags (`-p`, `-r`, ...) removed.
fn operands(args: &[String]) -> (Vec<&String>, Vec<&String>) {
    args.iter().partition(|a| !(a.starts_with('-') && a.len() > 1))
}

/// Render an error from the filesystem as the tail of a shell message.
fn reason(err: &Error) -> String {
    match err.as_fs() {
        Some(fs) => fs.to_string(),
        None => err.to_string(),
    }
}

fn is_octal_mode(mode: &str) -> bool {
    matches!(mode.len(), 3 | 4) && mode.chars().all(|c| c.is_digit(8))
}

/// The chmod builtin - change the mode string of a file.
///
/// Usage: chmod MODE FILE
///
/// Only the owner (`user`) may change a file's mode unless elevated.
pub struct Chmod;

#[async_trait]
impl Builtin for Chmod {
    async fn execute(&self, ctx: Context<'_>) -> Result<ExecResult> {
        let [mode, target, ..] = ctx.args else {
            return Ok(ExecResult::err("chmod: missing operand", 1));
        };

        if !is_octal_mode(mode) {
            return Ok(ExecResult::err(
                format!("chmod: invalid mode: '{mode}'"),
                1,
            ));
        }

        let path = ctx.resolve(target);
        let metadata = match ctx.fs.stat(&path).await {
            Ok(m) if m.file_type == FileType::File => m,
            _ => {
                return Ok(ExecResult::err(
                    format!("chmod: cannot access '{target}': No such file or directory"),
                    1,
                ));
            }
        };

        if metadata.owner != DEFAULT_OWNER && !ctx.elevated {
            return Ok(ExecResult::err(
                format!("chmod: changing permissions of '{target}': Permission denied"),
                1,
            ));
        }

        ctx.fs.set_mode(&path, mode).await?;
        Ok(ExecResult::ok(""))
    }

    fn description(&self) -> &str {
        "Change file mode bits"
    }

    fn arity(&self) -> Arity {
        Arity::at_least(2, "chmod: missing operand")
    }
}

/// The chown builtin - change the owner of a file.
///
/// Usage: chown OWNER FILE
pub struct Chown;

#[async_trait]
impl Builtin for Chown {
    async fn execute(&self, ctx: Context<'_>) -> Result<ExecResult> {
        let [owner, target, ..] = ctx.args else {
            return Ok(ExecResult::err("chown: missing operand", 1));
        };

        let path = ctx.resolve(target);
        match ctx.fs.stat(&path).await {
            Ok(m) if m.file_type == FileType::File => {
                ctx.fs.set_owner(&path, owner).await?;
                Ok(ExecResult::ok(""))
            }
            _ => Ok(ExecResult::err(
                format!("chown: cannot access '{target}': No such file or directory"),
                1,
            )),
        }
    }

    fn description(&self) -> &str {
        "Change file owner"
    }

    fn arity(&self) -> Arity {
        Arity::at_least(2, "chown: missing operand")
    }
}

/// The touch builtin - create empty files.
///
/// Usage: touch FILE...
///
/// Missing parent directories are created. An existing file is replaced by
/// an empty one owned by `user` with mode `0644`.
pub struct Touch;

#[async_trait]
impl Builtin for Touch {
    async fn execute(&self, ctx: Context<'_>) -> Result<ExecResult> {
        let (files, _) = operands(ctx.args);
        if files.is_empty() {
            return Ok(ExecResult::err("touch: missing file operand", 1));
        }

        let mut errors = Vec::new();
        for file in files {
            let path = ctx.resolve(file);

            if let Ok(m) = ctx.fs.stat(&path).await
                && m.file_type.is_dir()
            {
                errors.push(format!("touch: cannot create file at '{file}': Is a directory"));
                continue;
            }

            let created = match ctx.ensure_parent(&path).await {
                Ok(()) => {
                    ctx.fs
                        .create_file(&path, "", DEFAULT_FILE_MODE, DEFAULT_OWNER)
                        .await
                }
                Err(e) => Err(e),
            };
            if let Err(e) = created {
                errors.push(format!(
                    "touch: cannot create file at '{file}': {}",
                    reason(&e)
                ));
            }
        }

        Ok(finish(errors))
    }

    fn description(&self) -> &str {
        "Create an empty file"
    }

    fn arity(&self) -> Arity {
        Arity::at_least(1, "touch: missing file operand")
    }
}

/// The mkdir builtin - create directories.
///
/// Usage: mkdir [-p] DIRECTORY...
///
/// Parents are always created. An existing path is replaced by an empty
/// directory; `-p` is accepted for familiarity.
pub struct Mkdir;

#[async_trait]
impl Builtin for Mkdir {
    async fn execute(&self, ctx: Context<'_>) -> Result<ExecResult> {
        let (dirs, _) = operands(ctx.args);
        if dirs.is_empty() {
            return Ok(ExecResult::err("mkdir: missing operand", 1));
        }

        let mut errors = Vec::new();
        for dir in dirs {
            let path = ctx.resolve(dir);
            if path == Path::new("/") {
                continue;
            }

            if let Err(e) = ctx.ensure_parent(&path).await {
                errors.push(format!(
                    "mkdir: cannot create directory '{dir}': {}",
                    reason(&e)
                ));
                continue;
            }

            if ctx.fs.exists(&path).await? {
                ctx.fs.remove(&path, true).await?;
            }
            ctx.fs.mkdir(&path, false).await?;
        }

        Ok(finish(errors))
    }

    fn description(&self) -> &str {
        "Create a directory"
    }

    fn arity(&self) -> Arity {
        Arity::at_least(1, "mkdir: missing operand")
    }
}

/// The rm builtin - remove files.
///
/// Usage: rm [-r] FILE...
///
/// Directories are refused unless `-r` (or `-R`, `-rf`) is given.
pub struct Rm;

#[async_trait]
impl Builtin for Rm {
    async fn execute(&self, ctx: Context<'_>) -> Result<ExecResult> {
        let (files, flags) = operands(ctx.args);
        if files.is_empty() {
            return Ok(ExecResult::err("rm: missing operand", 1));
        }
        let recursive = flags.iter().any(|f| f.contains(['r', 'R']));

        let mut errors = Vec::new();
        for file in files {
            let path = ctx.resolve(file);

            match ctx.fs.stat(&path).await {
                Err(_) => {
                    errors.push(format!(
                        "rm: cannot remove '{file}': No such file or directory"
                    ));
                }
                Ok(m) if m.file_type.is_dir() && !recursive => {
                    errors.push(format!("rm: cannot remove '{file}': Is a directory"));
                }
                Ok(_) => {
                    if let Err(e) = ctx.fs.remove(&path, recursive).await {
                        errors.push(format!("rm: cannot remove '{file}': {}", reason(&e)));
                    }
                }
            }
        }

        Ok(finish(errors))
    }

    fn description(&self) -> &str {
        "Remove a file"
    }

    fn arity(&self) -> Arity {
        Arity::at_least(1, "rm: missing operand")
    }
}

/// The rmdir builtin - remove empty directories.
///
/// Usage: rmdir DIRECTORY...
pub struct Rmdir;

#[async_trait]
impl Builtin for Rmdir {
    async fn execute(&self, ctx: Context<'_>) -> Result<ExecResult> {
        let (dirs, _) = operands(ctx.args);
        if dirs.is_empty() {
            return Ok(ExecResult::err("rmdir: missing operand", 1));
        }

        let mut errors = Vec::new();
        for dir in dirs {
            let path = ctx.resolve(dir);

            let failure = match ctx.fs.stat(&path).await {
                Err(_) => Some(FsError::NotFound.to_string()),
                Ok(m) if !m.file_type.is_dir() => Some(FsError::NotADirectory.to_string()),
                Ok(_) => ctx
                    .fs
                    .remove(&path, false)
                    .await
                    .err()
                    .map(|e| reason(&e)),
            };

            if let Some(why) = failure {
                errors.push(format!("rmdir: failed to remove '{dir}': {why}"));
            }
        }

        Ok(finish(errors))
    }

    fn description(&self) -> &str {
        "Remove an empty directory"
    }

    fn arity(&self) -> Arity {
        Arity::at_least(1, "rmdir: missing operand")
    }
}

/// Shared implementation of `mv` and `cp`.
#[derive(Clone, Copy)]
enum Transfer {
    Move,
    Copy,
}

impl Transfer {
    fn name(self) -> &'static str {
        match self {
            Transfer::Move => "mv",
            Transfer::Copy => "cp",
        }
    }

    async fn run(self, ctx: &Context<'_>) -> Result<ExecResult> {
        let name = self.name();
        let [src_arg, dst_arg, ..] = ctx.args else {
            return Ok(ExecResult::err(format!("{name}: missing file operand"), 1));
        };

        let src = ctx.resolve(src_arg);
        if ctx.fs.stat(&src).await.is_err() {
            return Ok(ExecResult::err(
                format!("{name}: cannot stat '{src_arg}': No such file or directory"),
                1,
            ));
        }

        let dst = self.destination(ctx, &src, dst_arg).await;

        let result = match ctx.ensure_parent(&dst).await {
            Ok(()) => match self {
                Transfer::Move => ctx.fs.rename(&src, &dst).await,
                Transfer::Copy => ctx.fs.copy(&src, &dst).await,
            },
            Err(e) => Err(e),
        };

        match result {
            Ok(()) => Ok(ExecResult::ok("")),
            Err(e) => {
                let verb = match self {
                    Transfer::Move => "move",
                    Transfer::Copy => "copy",
                };
                Ok(ExecResult::err(
                    format!(
                        "{name}: cannot {verb} '{src_arg}' to '{dst_arg}': {}",
                        reason(&e)
                    ),
                    1,
                ))
            }
        }
    }

    /// An existing destination directory receives the source under its
    /// own name.
    async fn destination(self, ctx: &Context<'_>, src: &Path, dst_arg: &str) -> PathBuf {
        let dst = ctx.resolve(dst_arg);
        let into_dir = matches!(ctx.fs.stat(&dst).await, Ok(m) if m.file_type.is_dir());
        match (into_dir, src.file_name()) {
            (true, Some(name)) if dst != src => dst.join(name),
            _ => dst,
        }
    }
}

/// The mv builtin - move or rename files and directories.
///
/// Usage: mv SOURCE DEST
pub struct Mv;

#[async_trait]
impl Builtin for Mv {
    async fn execute(&self, ctx: Context<'_>) -> Result<ExecResult> {
        Transfer::Move.run(&ctx).await
    }

    fn description(&self) -> &str {
        "Move or rename a file"
    }

    fn arity(&self) -> Arity {
        Arity::at_least(2, "mv: missing file operand")
    }
}

/// The cp builtin - copy files and directories (always deep).
///
/// Usage: cp SOURCE DEST
pub struct Cp;

#[async_trait]
impl Builtin for Cp {
    async fn execute(&self, ctx: Context<'_>) -> Result<ExecResult> {
        Transfer::Copy.run(&ctx).await
    }

    fn description(&self) -> &str {
        "Copy a file"
    }

    fn arity(&self) -> Arity {
        Arity::at_least(2, "cp: missing file operand")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builtins::testing::Harness;

    async fn read(h: &Harness, path: &str) -> Option<String> {
        h.fs.read_file(Path::new(path)).await.ok()
    }

    #[tokio::test]
    async fn test_chmod_owner_file() {
        let mut h = Harness::seeded();
        let result = h.run(&Chmod, &["600", "readme.txt"]).await;
        assert!(result.is_success());
        let meta = h.fs.stat(Path::new("/home/user/readme.txt")).await.unwrap();
        assert_eq!(meta.mode, "600");
    }

    #[tokio::test]
    async fn test_chmod_errors() {
        let mut h = Harness::seeded();
        assert_eq!(
            h.run(&Chmod, &["600"]).await.stderr,
            "chmod: missing operand"
        );
        assert_eq!(
            h.run(&Chmod, &["600", "nope"]).await.stderr,
            "chmod: cannot access 'nope': No such file or directory"
        );
        assert_eq!(
            h.run(&Chmod, &["600", "level1"]).await.stderr,
            "chmod: cannot access 'level1': No such file or directory"
        );
        assert_eq!(
            h.run(&Chmod, &["600", "level1/editme.txt"]).await.stderr,
            "chmod: changing permissions of 'level1/editme.txt': Permission denied"
        );
        assert_eq!(
            h.run(&Chmod, &["rwx", "readme.txt"]).await.stderr,
            "chmod: invalid mode: 'rwx'"
        );

        h.elevated = true;
        assert!(h.run(&Chmod, &["600", "level1/editme.txt"]).await.is_success());
    }

    #[tokio::test]
    async fn test_chown() {
        let mut h = Harness::seeded();
        let result = h.run(&Chown, &["user", "level1/editme.txt"]).await;
        assert!(result.is_success());
        let meta = h
            .fs
            .stat(Path::new("/home/user/level1/editme.txt"))
            .await
            .unwrap();
        assert_eq!(meta.owner, "user");

        assert_eq!(
            h.run(&Chown, &["user", "ghost"]).await.stderr,
            "chown: cannot access 'ghost': No such file or directory"
        );
    }

    #[tokio::test]
    async fn test_touch_creates_and_truncates() {
        let mut h = Harness::seeded();
        h.run(&Touch, &["new/deep/file.txt"]).await;
        assert_eq!(read(&h, "/home/user/new/deep/file.txt").await.as_deref(), Some(""));

        h.run(&Touch, &["readme.txt"]).await;
        assert_eq!(read(&h, "/home/user/readme.txt").await.as_deref(), Some(""));
    }

    #[tokio::test]
    async fn test_touch_through_file() {
        let mut h = Harness::seeded();
        let result = h.run(&Touch, &["readme.txt/inner"]).await;
        assert_eq!(
            result.stderr,
            "touch: cannot create file at 'readme.txt/inner': Not a directory"
        );

        let result = h.run(&Touch, &["level1"]).await;
        assert_eq!(
            result.stderr,
            "touch: cannot create file at 'level1': Is a directory"
        );
    }

    #[tokio::test]
    async fn test_mkdir_then_rmdir_restores() {
        let mut h = Harness::seeded();
        let before = h.fs.read_dir(Path::new("/home/user")).await.unwrap().len();

        h.run(&Mkdir, &["d"]).await;
        assert!(h.fs.stat(Path::new("/home/user/d")).await.unwrap().file_type.is_dir());

        assert!(h.run(&Rmdir, &["d"]).await.is_success());
        let after = h.fs.read_dir(Path::new("/home/user")).await.unwrap().len();
        assert_eq!(before, after);
    }

    #[tokio::test]
    async fn test_mkdir_replaces_existing() {
        let mut h = Harness::seeded();
        let result = h.run(&Mkdir, &["level2"]).await;
        assert!(result.is_success());
        assert!(
            h.fs.read_dir(Path::new("/home/user/level2"))
                .await
                .unwrap()
                .is_empty()
        );
    }

    #[tokio::test]
    async fn test_mkdir_blocked_by_file() {
        let mut h = Harness::seeded();
        let result = h.run(&Mkdir, &["readme.txt/sub"]).await;
        assert_eq!(
            result.stderr,
            "mkdir: cannot create directory 'readme.txt/sub': Not a directory"
        );
    }

    #[tokio::test]
    async fn test_rm() {
        let mut h = Harness::seeded();
        assert!(h.run(&Rm, &["readme.txt"]).await.is_success());
        assert!(read(&h, "/home/user/readme.txt").await.is_none());

        assert_eq!(
            h.run(&Rm, &["readme.txt"]).await.stderr,
            "rm: cannot remove 'readme.txt': No such file or directory"
        );
        assert_eq!(
            h.run(&Rm, &["level1"]).await.stderr,
            "rm: cannot remove 'level1': Is a directory"
        );

        assert!(h.run(&Rm, &["-r", "level1"]).await.is_success());
        assert!(!h.fs.exists(Path::new("/home/user/level1")).await.unwrap());
    }

    #[tokio::test]
    async fn test_rmdir_errors() {
        let mut h = Harness::seeded();
        assert_eq!(
            h.run(&Rmdir, &["level1"]).await.stderr,
            "rmdir: failed to remove 'level1': Directory not empty"
        );
        assert_eq!(
            h.run(&Rmdir, &["readme.txt"]).await.stderr,
            "rmdir: failed to remove 'readme.txt': Not a directory"
        );
        assert_eq!(
            h.run(&Rmdir, &["ghost"]).await.stderr,
            "rmdir: failed to remove 'ghost': No such file or directory"
        );
    }

    #[tokio::test]
    async fn test_mv_rename_and_into_dir() {
        let mut h = Harness::seeded();
        assert!(h.run(&Mv, &["readme.txt", "notes.txt"]).await.is_success());
        assert!(read(&h, "/home/user/readme.txt").await.is_none());
        assert_eq!(
            read(&h, "/home/user/notes.txt").await.as_deref(),
            Some("Welcome to your home directory!")
        );

        assert!(h.run(&Mv, &["notes.txt", "/tmp"]).await.is_success());
        assert!(read(&h, "/tmp/notes.txt").await.is_some());

        assert_eq!(
            h.run(&Mv, &["ghost", "x"]).await.stderr,
            "mv: cannot stat 'ghost': No such file or directory"
        );
    }

    #[tokio::test]
    async fn test_mv_creates_destination_parents() {
        let mut h = Harness::seeded();
        assert!(h.run(&Mv, &["readme.txt", "a/b/c.txt"]).await.is_success());
        assert!(read(&h, "/home/user/a/b/c.txt").await.is_some());
    }

    #[tokio::test]
    async fn test_cp_is_independent_copy() {
        let mut h = Harness::seeded();
        assert!(h.run(&Cp, &["level2", "backup"]).await.is_success());
        h.fs.write_file(Path::new("/home/user/level2/flag.b64"), "changed")
            .await
            .unwrap();
        assert_eq!(
            read(&h, "/home/user/backup/flag.b64").await.as_deref(),
            Some("RkxBRy1MRVZFMjogWW91IGRlY29kZWQgdGhlIGZsYWch")
        );

        assert_eq!(
            h.run(&Cp, &["only-one"]).await.stderr,
            "cp: missing file operand"
        );
    }
}

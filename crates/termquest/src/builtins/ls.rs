//! Directory listing builtin - ls

use async_trait::async_trait;
use std::path::Path;

use super::{Builtin, Context};
use crate::error::Result;
use crate::fs::DirEntry;
use crate::interpreter::ExecResult;
use crate::path::{display_path, resolve_path};

/// Timestamp shown in every long-format row.
const LISTING_DATE: &str = "Sep 10 12:00";

/// Size reported for directories in long format.
const DIR_SIZE: u64 = 4096;

/// Options for ls command
#[derive(Default)]
struct LsOptions {
    long: bool,
    all: bool,
}

/// The ls builtin - list directory contents.
///
/// Usage: ls [-l] [-a] [PATH]
///
/// Options:
///   -l   Use long listing format
///   -a   Show hidden files (starting with .)
///
/// Entries are sorted by name and joined by two spaces. A relative path
/// that does not exist below the working directory is retried from `/`.
pub struct Ls;

#[async_trait]
impl Builtin for Ls {
    async fn execute(&self, ctx: Context<'_>) -> Result<ExecResult> {
        let mut opts = LsOptions::default();
        let mut target = None;

        for arg in ctx.args {
            if let Some(flags) = arg.strip_prefix('-')
                && !flags.is_empty()
            {
                for c in flags.chars() {
                    match c {
                        'l' => opts.long = true,
                        'a' => opts.all = true,
                        _ => {}
                    }
                }
            } else if target.is_none() {
                target = Some(arg.as_str());
            }
        }

        let shown = target
            .map(str::to_string)
            .unwrap_or_else(|| display_path(ctx.cwd.as_path()));

        let mut path = match target {
            Some(t) => ctx.resolve(t),
            None => ctx.cwd.clone(),
        };
        if let Some(t) = target
            && !ctx.fs.exists(&path).await?
        {
            let fallback = resolve_path(Path::new("/"), t);
            if ctx.fs.exists(&fallback).await? {
                path = fallback;
            }
        }

        let metadata = match ctx.fs.stat(&path).await {
            Ok(m) => m,
            Err(_) => {
                return Ok(ExecResult::err(
                    format!("ls: cannot access '{shown}': No such file or directory"),
                    2,
                ));
            }
        };
        if !metadata.file_type.is_dir() {
            return Ok(ExecResult::err(
                format!("ls: cannot access '{shown}': Not a directory"),
                2,
            ));
        }

        let entries: Vec<DirEntry> = ctx
            .fs
            .read_dir(&path)
            .await?
            .into_iter()
            .filter(|e| opts.all || !e.name.starts_with('.'))
            .collect();

        if opts.long {
            Ok(ExecResult::ok(long_listing(&entries)))
        } else {
            let names: Vec<&str> = entries.iter().map(|e| e.name.as_str()).collect();
            Ok(ExecResult::ok(names.join("  ")))
        }
    }

    fn description(&self) -> &str {
        "List directory contents"
    }
}

fn long_listing(entries: &[DirEntry]) -> String {
    let mut lines = Vec::with_capacity(entries.len() + 1);
    lines.push(format!("total {}", entries.len()));

    for entry in entries {
        let meta = &entry.metadata;
        let size = if meta.file_type.is_dir() {
            DIR_SIZE
        } else {
            meta.size
        };
        lines.push(format!(
            "{} 1 {} {} {} {} {}",
            meta.permission_string(),
            meta.owner,
            meta.owner,
            size,
            LISTING_DATE,
            entry.name
        ));
    }

    lines.join("\n")
}

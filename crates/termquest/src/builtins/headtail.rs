//! Head and tail builtins - output first/last lines of a file

use async_trait::async_trait;

use super::{Arity, Builtin, Context, Unreadable};
use crate::error::Result;
use crate::interpreter::ExecResult;

/// Default number of lines to output
const DEFAULT_LINES: usize = 10;

/// Parse `head`/`tail` operands into a line count and an optional file.
///
/// Accepted shapes: `FILE [N]`, `N FILE`, `-n N FILE`, `-N FILE`. Returns the
/// offending operand when a count is not a number.
pub fn parse_count(args: &[String]) -> std::result::Result<(usize, Option<&str>), String> {
    let mut count = None;
    let mut file = None;
    let mut iter = args.iter();

    while let Some(arg) = iter.next() {
        if arg == "-n" {
            let value = iter.next().ok_or_else(|| arg.clone())?;
            count = Some(value.parse().map_err(|_| value.clone())?);
        } else if let Some(value) = arg.strip_prefix("-n").or_else(|| arg.strip_prefix('-'))
            && !value.is_empty()
        {
            count = Some(value.parse().map_err(|_| arg.clone())?);
        } else if count.is_none()
            && let Ok(n) = arg.parse::<usize>()
        {
            count = Some(n);
        } else if file.is_none() {
            file = Some(arg.as_str());
        }
    }

    Ok((count.unwrap_or(DEFAULT_LINES), file))
}

/// The first `n` lines of `text`.
pub fn head_lines(text: &str, n: usize) -> String {
    text.split('\n').take(n).collect::<Vec<_>>().join("\n")
}

/// The last `n` lines of `text`.
pub fn tail_lines(text: &str, n: usize) -> String {
    let lines: Vec<&str> = text.split('\n').collect();
    let start = lines.len().saturating_sub(n);
    lines[start..].join("\n")
}

#[derive(Clone, Copy)]
enum Side {
    Head,
    Tail,
}

impl Side {
    fn name(self) -> &'static str {
        match self {
            Side::Head => "head",
            Side::Tail => "tail",
        }
    }

    fn take(self, text: &str, n: usize) -> String {
        match self {
            Side::Head => head_lines(text, n),
            Side::Tail => tail_lines(text, n),
        }
    }

    async fn run(self, ctx: &Context<'_>) -> Result<ExecResult> {
        let name = self.name();
        let (count, file) = match parse_count(ctx.args) {
            Ok(parsed) => parsed,
            Err(bad) => {
                return Ok(ExecResult::err(
                    format!("{name}: invalid number of lines: '{bad}'"),
                    1,
                ));
            }
        };

        let Some(file) = file else {
            return Ok(match ctx.stdin {
                Some(stdin) => ExecResult::ok(self.take(stdin, count)),
                None => ExecResult::err(format!("{name}: missing file operand"), 1),
            });
        };

        let path = ctx.resolve(file);
        match ctx.read_permitted(&path).await {
            Ok(content) => Ok(ExecResult::ok(self.take(&content, count))),
            Err(Unreadable::Denied) => Ok(ExecResult::err(
                format!("{name}: cannot open '{file}': Permission denied"),
                1,
            )),
            Err(_) => Ok(ExecResult::err(
                format!("{name}: cannot open '{file}': No such file"),
                1,
            )),
        }
    }
}

/// The head builtin - output the first N lines of a file.
///
/// Usage: head [-n NUM] FILE | head FILE [NUM] | head NUM FILE
pub struct Head;

#[async_trait]
impl Builtin for Head {
    async fn execute(&self, ctx: Context<'_>) -> Result<ExecResult> {
        Side::Head.run(&ctx).await
    }

    fn description(&self) -> &str {
        "Show first lines of a file"
    }

    fn arity(&self) -> Arity {
        Arity::at_least(1, "head: missing file operand")
    }
}

/// The tail builtin - output the last N lines of a file.
///
/// Usage: tail [-n NUM] FILE | tail FILE [NUM] | tail NUM FILE
pub struct Tail;

#[async_trait]
impl Builtin for Tail {
    async fn execute(&self, ctx: Context<'_>) -> Result<ExecResult> {
        Side::Tail.run(&ctx).await
    }

    fn description(&self) -> &str {
        "Show last lines of a file"
    }

    fn arity(&self) -> Arity {
        Arity::at_least(1, "tail: missing file operand")
    }
}

//! echo builtin command
//!
//! Writing to a file is done by the dispatcher's `>`/`>>` handling; echo
//! itself only prints.

use async_trait::async_trait;

use super::{Builtin, Context};
use crate::error::Result;
use crate::interpreter::ExecResult;

/// The echo builtin command.
///
/// Backslash escapes are interpreted unless `-E` is given. `-n` and `-e`
/// are accepted; output never carries a trailing newline anyway.
pub struct Echo;

#[async_trait]
impl Builtin for Echo {
    async fn execute(&self, ctx: Context<'_>) -> Result<ExecResult> {
        let mut interpret_escapes = true;
        let mut args_iter = ctx.args.iter().peekable();

        while let Some(arg) = args_iter.peek() {
            match arg.as_str() {
                "-n" => {}
                "-e" => interpret_escapes = true,
                "-E" => interpret_escapes = false,
                _ => break,
            }
            args_iter.next();
        }

        let text = args_iter
            .map(|s| s.as_str())
            .collect::<Vec<_>>()
            .join(" ");

        if interpret_escapes {
            Ok(ExecResult::ok(interpret_escape_sequences(&text)))
        } else {
            Ok(ExecResult::ok(text))
        }
    }

    fn description(&self) -> &str {
        "Echo arguments or write to file"
    }
}

fn interpret_escape_sequences(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut chars = s.chars();

    while let Some(ch) = chars.next() {
        if ch != '\\' {
            result.push(ch);
            continue;
        }
        match chars.next() {
            Some('n') => result.push('\n'),
            Some('t') => result.push('\t'),
            Some('\\') => result.push('\\'),
            Some(other) => {
                result.push('\\');
                result.push(other);
            }
            None => result.push('\\'),
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builtins::testing::Harness;

    #[tokio::test]
    async fn test_echo_joins_args() {
        let mut h = Harness::seeded();
        assert_eq!(h.run(&Echo, &["Top", "Secret"]).await.stdout, "Top Secret");
        assert_eq!(h.run(&Echo, &[]).await.stdout, "");
    }

    #[tokio::test]
    async fn test_echo_escapes() {
        let mut h = Harness::seeded();
        assert_eq!(h.run(&Echo, &[r"a\nb\tc"]).await.stdout, "a\nb\tc");
        assert_eq!(h.run(&Echo, &["-E", r"a\nb"]).await.stdout, r"a\nb");
        assert_eq!(h.run(&Echo, &[r"keep\q"]).await.stdout, r"keep\q");
        assert_eq!(h.run(&Echo, &[r"x\\n"]).await.stdout, r"x\n");
    }

    #[tokio::test]
    async fn test_echo_flags_consumed() {
        let mut h = Harness::seeded();
        assert_eq!(h.run(&Echo, &["-n", "hi"]).await.stdout, "hi");
        assert_eq!(h.run(&Echo, &["hi", "-n"]).await.stdout, "hi -n");
    }
}

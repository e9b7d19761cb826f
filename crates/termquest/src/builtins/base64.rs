//! base64 builtin command - encode/decode base64

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use super::{Arity, Builtin, Context, Unreadable};
use crate::error::Result;
use crate::interpreter::ExecResult;

/// The base64 builtin command.
///
/// Usage: base64 [-d|--decode] FILE
///
/// Options:
///   -d, --decode    Decode instead of encode
///
/// Uses the standard alphabet with padding. Without a file, piped input is
/// used when available.
pub struct Base64;

#[async_trait]
impl Builtin for Base64 {
    async fn execute(&self, ctx: Context<'_>) -> Result<ExecResult> {
        let mut decode = false;
        let mut file = None;

        for arg in ctx.args {
            match arg.as_str() {
                "-d" | "--decode" => decode = true,
                other if file.is_none() => file = Some(other),
                _ => {}
            }
        }

        let input = match (file, ctx.stdin) {
            (Some(file), _) => {
                let path = ctx.resolve(file);
                match ctx.read_permitted(&path).await {
                    Ok(content) => content,
                    Err(Unreadable::Denied) => {
                        return Ok(ExecResult::err(
                            format!("base64: {file}: Permission denied"),
                            1,
                        ));
                    }
                    Err(_) => {
                        return Ok(ExecResult::err(
                            format!("base64: {file}: No such file"),
                            1,
                        ));
                    }
                }
            }
            (None, Some(stdin)) => stdin.to_string(),
            (None, None) => return Ok(ExecResult::err("base64: missing file operand", 1)),
        };

        if decode {
            Ok(decode_text(&input)
                .map(ExecResult::ok)
                .unwrap_or_else(|| ExecResult::err("base64: decoding failed", 1)))
        } else {
            Ok(ExecResult::ok(STANDARD.encode(input.as_bytes())))
        }
    }

    fn description(&self) -> &str {
        "Encode or decode base64 data"
    }

    fn arity(&self) -> Arity {
        Arity::at_least(1, "base64: missing file operand")
    }
}

/// Decode base64 text into UTF-8. Surrounding whitespace is ignored.
fn decode_text(input: &str) -> Option<String> {
    let cleaned: String = input.chars().filter(|c| !c.is_whitespace()).collect();
    let bytes = STANDARD.decode(cleaned.as_bytes()).ok()?;
    String::from_utf8(bytes).ok()
}

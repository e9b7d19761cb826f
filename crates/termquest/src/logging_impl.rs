//! Logging infrastructure for termquest
//!
//! Sessions log through `tracing` when the `logging` feature is enabled.
//! What ends up in a log is controlled by [`LogConfig`]: submitted lines are
//! summarized unless explicitly enabled, and anything typed at a password
//! prompt never reaches a log at all.
//!
//! # Log Levels
//!
//! - **WARN**: Persisted state that could not be read or written
//! - **INFO**: Session lifecycle, sudo grants and expiry, zone changes
//! - **DEBUG**: Dispatched commands, pipeline stages
//! - **TRACE**: Parser output

use std::borrow::Cow;

/// Configuration for logging behavior
///
/// By default submitted lines are logged as a size summary only. Turn on
/// [`log_input_lines`](Self::log_input_lines) to see the text itself.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Whether to include submitted command lines in logs (default: false)
    pub log_input_lines: bool,

    /// Whether to hide the arguments of `sudo` invocations (default: true)
    pub redact_sudo_arguments: bool,

    /// Maximum length of logged values before truncation (default: 200)
    pub max_value_length: usize,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            log_input_lines: false,
            redact_sudo_arguments: true,
            max_value_length: 200,
        }
    }
}

impl LogConfig {
    /// Create a new log configuration with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Include submitted lines in logs.
    ///
    /// Password submissions are still never logged.
    pub fn log_input_lines(mut self) -> Self {
        self.log_input_lines = true;
        self
    }

    /// Log `sudo` arguments in clear.
    pub fn show_sudo_arguments(mut self) -> Self {
        self.redact_sudo_arguments = false;
        self
    }

    /// Set maximum length for logged values
    pub fn max_value_length(mut self, len: usize) -> Self {
        self.max_value_length = len;
        self
    }

    /// Render a submitted line for a log record.
    pub fn format_line(&self, line: &str) -> String {
        if !self.log_input_lines {
            return format!("[line: {} bytes]", line.len());
        }

        let sanitized = sanitize_for_log(line);
        if self.redact_sudo_arguments && is_sudo_line(&sanitized) {
            return "sudo [REDACTED]".to_string();
        }
        self.truncate(&sanitized).into_owned()
    }

    /// Truncate value if it exceeds max length
    ///
    /// Cuts on a char boundary.
    fn truncate<'a>(&self, value: &'a str) -> Cow<'a, str> {
        if value.len() <= self.max_value_length {
            Cow::Borrowed(value)
        } else {
            let mut end = self.max_value_length;
            while end > 0 && !value.is_char_boundary(end) {
                end -= 1;
            }
            Cow::Owned(format!(
                "{}...[truncated {} bytes]",
                &value[..end],
                value.len() - end
            ))
        }
    }
}

fn is_sudo_line(line: &str) -> bool {
    line.split_whitespace().next() == Some("sudo")
}

/// Sanitize user input for logging.
///
/// Escapes line breaks and drops other control characters so one record
/// stays one line.
pub fn sanitize_for_log(input: &str) -> String {
    input
        .replace('\n', "\\n")
        .replace('\r', "\\r")
        .replace('\t', "\\t")
        .chars()
        .filter(|c| !c.is_control())
        .collect()
}

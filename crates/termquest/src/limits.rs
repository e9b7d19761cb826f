//! Resource limits for a terminal session
//!
//! A session is fed by a human typing into a text box, but the library is also
//! driven by scripts and tests. These limits keep a single submission from
//! growing the scrollback or the pipeline without bound.

/// Resource limits for a terminal session
#[derive(Debug, Clone)]
pub struct TerminalLimits {
    /// Maximum length of one submitted line in bytes
    /// Default: 4096
    pub max_input_length: usize,

    /// Maximum number of `|`-separated stages in one line
    /// Default: 16
    pub max_pipeline_stages: usize,

    /// Maximum number of lines kept in the scrollback (oldest dropped first)
    /// Default: 1000
    pub max_scrollback_lines: usize,
}

impl Default for TerminalLimits {
    fn default() -> Self {
        Self {
            max_input_length: 4096,
            max_pipeline_stages: 16,
            max_scrollback_lines: 1000,
        }
    }
}

impl TerminalLimits {
    /// Create new limits with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Set maximum input line length
    pub fn max_input_length(mut self, len: usize) -> Self {
        self.max_input_length = len;
        self
    }

    /// Set maximum pipeline stages
    pub fn max_pipeline_stages(mut self, count: usize) -> Self {
        self.max_pipeline_stages = count;
        self
    }

    /// Set maximum scrollback length
    pub fn max_scrollback_lines(mut self, count: usize) -> Self {
        self.max_scrollback_lines = count;
        self
    }

    /// Check a submitted line against the input length limit.
    pub fn check_input(&self, line: &str) -> Result<(), LimitExceeded> {
        if line.len() > self.max_input_length {
            return Err(LimitExceeded::InputLength(self.max_input_length));
        }
        Ok(())
    }

    /// Check a parsed pipeline against the stage limit.
    pub fn check_stages(&self, stages: usize) -> Result<(), LimitExceeded> {
        if stages > self.max_pipeline_stages {
            return Err(LimitExceeded::PipelineStages(self.max_pipeline_stages));
        }
        Ok(())
    }
}

/// Error returned when a resource limit is exceeded
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LimitExceeded {
    #[error("input line too long (max {0} bytes)")]
    InputLength(usize),

    #[error("too many pipeline stages (max {0})")]
    PipelineStages(usize),
}

//! Sudo password prompt and elevation window
//!
//! Elevation is a deadline, not a running timer: the session is elevated
//! while `now < expires_at`. [`SudoSession::expire`] notices a passed
//! deadline exactly once so the caller can print the expiry line.

use std::time::Duration;
use tokio::time::Instant;

/// Password accepted when none is configured.
pub const DEFAULT_SUDO_PASSWORD: &str = "hunter2";

/// Length of an elevation.
pub const DEFAULT_ELEVATION_WINDOW: Duration = Duration::from_secs(5);

/// Consecutive failures that end the prompt.
pub const MAX_PASSWORD_ATTEMPTS: u32 = 3;

/// Line shown while waiting for the password.
pub const PASSWORD_PROMPT: &str = "[sudo] password for user:";

/// What happened to a submitted password.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PasswordOutcome {
    /// Correct; run this command line elevated.
    Granted(String),
    /// Wrong, another attempt is allowed.
    Retry,
    /// Wrong for the last time; the pending command was dropped.
    Exhausted,
}

/// Per-session sudo state: `Normal` when nothing is pending, otherwise
/// awaiting a password for the pending command.
#[derive(Debug)]
pub struct SudoSession {
    password: String,
    window: Duration,
    expires_at: Option<Instant>,
    pending: Option<String>,
    attempts: u32,
}

impl Default for SudoSession {
    fn default() -> Self {
        Self::new(DEFAULT_SUDO_PASSWORD, DEFAULT_ELEVATION_WINDOW)
    }
}

impl SudoSession {
    pub fn new(password: impl Into<String>, window: Duration) -> Self {
        Self {
            password: password.into(),
            window,
            expires_at: None,
            pending: None,
            attempts: 0,
        }
    }

    /// Whether an elevation window is open right now.
    pub fn is_elevated(&self) -> bool {
        self.expires_at.is_some_and(|t| Instant::now() < t)
    }

    /// Whether the next submitted line is a password.
    pub fn is_awaiting_password(&self) -> bool {
        self.pending.is_some()
    }

    /// Defer `command` until the password is given.
    pub fn request(&mut self, command: impl Into<String>) {
        self.pending = Some(command.into());
        self.attempts = 0;
    }

    /// Check a password against the pending request.
    ///
    /// Without a pending request the attempt is ignored and `Exhausted`
    /// is returned.
    pub fn submit_password(&mut self, attempt: &str) -> PasswordOutcome {
        let Some(command) = self.pending.take() else {
            return PasswordOutcome::Exhausted;
        };

        if attempt == self.password {
            self.attempts = 0;
            self.grant();
            return PasswordOutcome::Granted(command);
        }

        self.attempts += 1;
        if self.attempts >= MAX_PASSWORD_ATTEMPTS {
            self.attempts = 0;
            PasswordOutcome::Exhausted
        } else {
            self.pending = Some(command);
            PasswordOutcome::Retry
        }
    }

    /// Open the elevation window. An open window is left as is.
    fn grant(&mut self) {
        if !self.is_elevated() {
            self.expires_at = Some(Instant::now() + self.window);
        }
    }

    /// Close a window whose deadline has passed.
    ///
    /// Returns `true` only on the call that closes it.
    pub fn expire(&mut self) -> bool {
        match self.expires_at {
            Some(t) if Instant::now() >= t => {
                self.expires_at = None;
                true
            }
            _ => false,
        }
    }

    /// Time left in the current window.
    #[cfg(test)]
    fn remaining(&self) -> Option<Duration> {
        self.expires_at
            .map(|t| t.saturating_duration_since(Instant::now()))
            .filter(|d| !d.is_zero())
    }

    /// Failed attempts against the pending request.
    pub fn attempts(&self) -> u32 {
        self.attempts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_correct_password_grants_window() {
        let mut sudo = SudoSession::default();
        sudo.request("cat editme.txt");
        assert!(sudo.is_awaiting_password());

        assert_eq!(
            sudo.submit_password("hunter2"),
            PasswordOutcome::Granted("cat editme.txt".to_string())
        );
        assert!(!sudo.is_awaiting_password());
        assert!(sudo.is_elevated());

        tokio::time::advance(Duration::from_millis(4999)).await;
        assert!(sudo.is_elevated());
        assert!(!sudo.expire());

        tokio::time::advance(Duration::from_millis(1)).await;
        assert!(!sudo.is_elevated());
        assert!(sudo.expire());
        assert!(!sudo.expire());
    }

    #[tokio::test(start_paused = true)]
    async fn test_three_failures_drop_command() {
        let mut sudo = SudoSession::default();
        sudo.request("cat editme.txt");

        assert_eq!(sudo.submit_password("a"), PasswordOutcome::Retry);
        assert_eq!(sudo.attempts(), 1);
        assert_eq!(sudo.submit_password("b"), PasswordOutcome::Retry);
        assert_eq!(sudo.submit_password("c"), PasswordOutcome::Exhausted);

        assert!(!sudo.is_awaiting_password());
        assert!(!sudo.is_elevated());
        assert_eq!(sudo.attempts(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_then_success() {
        let mut sudo = SudoSession::default();
        sudo.request("ls");
        assert_eq!(sudo.submit_password("nope"), PasswordOutcome::Retry);
        assert_eq!(
            sudo.submit_password("hunter2"),
            PasswordOutcome::Granted("ls".to_string())
        );
        assert_eq!(sudo.attempts(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_window_not_extended() {
        let mut sudo = SudoSession::new("pw", Duration::from_secs(5));
        sudo.request("ls");
        sudo.submit_password("pw");

        tokio::time::advance(Duration::from_secs(3)).await;
        sudo.request("pwd");
        sudo.submit_password("pw");
        assert_eq!(sudo.remaining(), Some(Duration::from_secs(2)));

        tokio::time::advance(Duration::from_secs(2)).await;
        assert!(!sudo.is_elevated());
        assert_eq!(sudo.remaining(), None);
    }

    #[test]
    fn test_password_without_request() {
        let mut sudo = SudoSession::default();
        assert_eq!(sudo.submit_password("hunter2"), PasswordOutcome::Exhausted);
        assert!(sudo.expires_at.is_none());
    }
}

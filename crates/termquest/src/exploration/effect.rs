//! Effect codes (`faith+2`, `health-1`) and the stats they change

use std::str::FromStr;

/// Highest health a walker can have.
pub const MAX_HEALTH: u32 = 10;

/// Stats at the start of a walk.
pub const START_FAITH: u32 = 5;
pub const START_HEALTH: u32 = 8;

/// A parsed effect code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    Faith(i32),
    Health(i32),
}

impl FromStr for Effect {
    type Err = ();

    fn from_str(code: &str) -> Result<Self, Self::Err> {
        let (stat, rest): (fn(i32) -> Effect, &str) =
            if let Some(rest) = code.strip_prefix("faith") {
                (Effect::Faith, rest)
            } else if let Some(rest) = code.strip_prefix("health") {
                (Effect::Health, rest)
            } else {
                return Err(());
            };

        let magnitude = |n: &str| n.parse::<u16>().map(i32::from).map_err(|_| ());
        let amount = if let Some(n) = rest.strip_prefix('+') {
            magnitude(n)?
        } else if let Some(n) = rest.strip_prefix('-') {
            -magnitude(n)?
        } else {
            return Err(());
        };
        Ok(stat(amount))
    }
}

/// Faith and health of the walker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stats {
    pub faith: u32,
    pub health: u32,
}

impl Default for Stats {
    fn default() -> Self {
        Self {
            faith: START_FAITH,
            health: START_HEALTH,
        }
    }
}

impl Stats {
    /// Apply `effect` and describe it (`Faith +2.`).
    ///
    /// Faith never drops below zero; health stays within `0..=MAX_HEALTH`.
    pub fn apply(&mut self, effect: Effect) -> String {
        match effect {
            Effect::Faith(n) => {
                self.faith = self.faith.saturating_add_signed(n);
                format!("Faith {}.", signed(n))
            }
            Effect::Health(n) => {
                self.health = self.health.saturating_add_signed(n).min(MAX_HEALTH);
                format!("Health {}.", signed(n))
            }
        }
    }

    /// Apply an effect code; unknown codes change nothing.
    pub fn apply_code(&mut self, code: &str) -> Option<String> {
        code.parse().ok().map(|effect| self.apply(effect))
    }
}

fn signed(n: i32) -> String {
    if n < 0 { format!("-{}", n.unsigned_abs()) } else { format!("+{n}") }
}

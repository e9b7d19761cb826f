//! Podvigh, a tile walk through rotating zones
//!
//! The walker moves over a 50×25 grid whose tiles are fixed per zone by a
//! hash of their coordinates. Stepping onto an encounter pauses the walk
//! until it is taken up (`G`) or ignored (`E`); encounters with choices then
//! wait for a number. Effects move faith and health: enough faith reveals
//! the Sanctuary nearby, no health ends the walk. Every 20 seconds the zone
//! is replaced and the walker starts again from the centre.
//!
//! Randomness (zone choice, events, reflections, dialogue) comes from one
//! seeded generator, so a seed replays the same walk.
//!
//! ```rust
//! use termquest::exploration::{Game, Key};
//!
//! # fn main() -> termquest::Result<()> {
//! let mut game = Game::builder().seed(7).zone("Desert").build()?;
//! game.press(Key::Right);
//! assert_eq!(game.zone_name(), "Desert");
//! assert_eq!(game.render().len(), 25);
//! # Ok(())
//! # }
//! ```

mod effect;
mod rng;
mod zone;

pub use effect::{Effect, MAX_HEALTH, START_FAITH, START_HEALTH, Stats};
pub use rng::Rng;
pub use zone::{
    Atlas, Choice, InteractionObject, MAP_HEIGHT, MAP_WIDTH, ObjectKind, Position, RandomEvent,
    Size, Tile, TileKind, Zone,
};

use std::collections::{HashSet, VecDeque};
use std::time::Duration;

use tokio::time::Instant;

use crate::error::{Error, Result};
use crate::interpreter::SubPrompt;

/// How long a zone lasts.
pub const ZONE_DURATION: Duration = Duration::from_secs(20);

/// Faith needed for the Sanctuary to appear.
pub const SANCTUARY_FAITH: u32 = 14;

/// Greatest distance, per axis, between the walker and a new Sanctuary.
pub const SANCTUARY_RADIUS: i32 = 3;

/// Chance of a random event on a plain step.
pub const EVENT_CHANCE: f64 = 0.03;

/// Chance of a reflection on a plain step.
pub const REFLECTION_CHANCE: f64 = 0.09;

/// Messages kept for display.
pub const MAX_MESSAGES: usize = 5;

const SANCTUARY_GLYPH: char = 'C';
const SANCTUARY_COLOR: &str = "#FF4500";
const SANCTUARY_DESCRIPTION: &str = "A place of peace and rest.";
const OPENING_MESSAGE: &str = "You begin your walk in silence.";
const RESTART_HINT: &str = "Press R to restart.";
const WIN_ENDING: &str = "You enter the Sanctuary. You have found peace.";
const LOSS_ENDING: &str = "You have perished in the labyrinth. Game over.";

/// Widest content line of [`Game::message_box`].
const MESSAGE_BOX_WIDTH: usize = 60;

/// A key press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Up,
    Down,
    Left,
    Right,
    Char(char),
}

impl Key {
    /// `w`/`a`/`s`/`d` map to directions; anything else is a plain key.
    pub fn from_char(c: char) -> Self {
        match c {
            'w' => Key::Up,
            's' => Key::Down,
            'a' => Key::Left,
            'd' => Key::Right,
            c => Key::Char(c),
        }
    }

    fn direction(self) -> Option<(i32, i32)> {
        match self {
            Key::Up => Some((0, -1)),
            Key::Down => Some((0, 1)),
            Key::Left => Some((-1, 0)),
            Key::Right => Some((1, 0)),
            Key::Char(_) => None,
        }
    }

    fn is(self, letter: char) -> bool {
        matches!(self, Key::Char(c) if c.eq_ignore_ascii_case(&letter))
    }
}

/// How a walk ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Reached the Sanctuary.
    Peace,
    /// Ran out of health.
    Perished,
}

impl Outcome {
    pub fn ending(self) -> &'static str {
        match self {
            Outcome::Peace => WIN_ENDING,
            Outcome::Perished => LOSS_ENDING,
        }
    }
}

/// Something met on the walk, waiting for `G` or `E`.
#[derive(Debug, Clone)]
enum Encounter {
    Sanctuary,
    Object {
        object: InteractionObject,
        area: Vec<Position>,
    },
}

#[derive(Debug, Clone)]
enum Pending {
    Encounter(Encounter),
    Choice {
        object: InteractionObject,
        area: Vec<Position>,
    },
}

/// Builder for a [`Game`].
#[derive(Debug, Default)]
pub struct GameBuilder {
    seed: Option<u64>,
    zone: Option<String>,
    zone_duration: Option<Duration>,
    atlas: Option<Atlas>,
}

impl GameBuilder {
    /// Seed the generator; unseeded games use the clock.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Start in the named zone instead of a random one.
    pub fn zone(mut self, name: impl Into<String>) -> Self {
        self.zone = Some(name.into());
        self
    }

    pub fn zone_duration(mut self, duration: Duration) -> Self {
        self.zone_duration = Some(duration);
        self
    }

    /// Use other zones than the bundled ones.
    pub fn atlas(mut self, atlas: Atlas) -> Self {
        self.atlas = Some(atlas);
        self
    }

    /// # Errors
    ///
    /// The bundled zone data does not load, or the requested zone does
    /// not exist.
    pub fn build(self) -> Result<Game> {
        let atlas = match self.atlas {
            Some(atlas) => atlas,
            None => Atlas::builtin()?,
        };
        if atlas.zones.is_empty() {
            return Err(Error::Internal("no zones defined".to_string()));
        }
        let seed = self
            .seed
            .unwrap_or_else(|| chrono::Utc::now().timestamp_micros() as u64);
        let mut rng = Rng::from_seed(seed);

        let zone = match &self.zone {
            Some(name) => atlas
                .zone_index(name)
                .ok_or_else(|| Error::Execution(format!("unknown zone: {name}")))?,
            None => rng.index(atlas.zones.len()),
        };

        let rotation = self
            .zone_duration
            .filter(|d| !d.is_zero())
            .unwrap_or(ZONE_DURATION);
        let mut game = Game {
            atlas,
            zone,
            rng,
            player: Position::center(),
            visited: HashSet::new(),
            used: HashSet::new(),
            stats: Stats::default(),
            messages: VecDeque::new(),
            pending: None,
            sanctuary: None,
            outcome: None,
            rotation,
            next_rotation: Instant::now() + rotation,
        };
        game.begin();

        #[cfg(feature = "logging")]
        tracing::info!(seed, zone = %game.zone_name(), "podvigh walk started");
        Ok(game)
    }
}

/// A Podvigh walk.
#[derive(Debug)]
pub struct Game {
    atlas: Atlas,
    zone: usize,
    rng: Rng,
    player: Position,
    visited: HashSet<Position>,
    used: HashSet<Position>,
    stats: Stats,
    messages: VecDeque<String>,
    pending: Option<Pending>,
    sanctuary: Option<Position>,
    outcome: Option<Outcome>,
    rotation: Duration,
    next_rotation: Instant,
}

impl Game {
    /// A walk over the bundled zones, seeded from the clock.
    pub fn new() -> Result<Self> {
        Self::builder().build()
    }

    pub fn builder() -> GameBuilder {
        GameBuilder::default()
    }

    pub fn zone(&self) -> &Zone {
        &self.atlas.zones[self.zone]
    }

    pub fn zone_name(&self) -> &str {
        &self.zone().name
    }

    pub fn player(&self) -> Position {
        self.player
    }

    pub fn stats(&self) -> Stats {
        self.stats
    }

    pub fn outcome(&self) -> Option<Outcome> {
        self.outcome
    }

    pub fn sanctuary(&self) -> Option<Position> {
        self.sanctuary
    }

    /// Kept messages, oldest first.
    pub fn messages(&self) -> impl Iterator<Item = &str> {
        self.messages.iter().map(String::as_str)
    }

    /// Whether an encounter is waiting for `G` or `E`.
    pub fn is_paused(&self) -> bool {
        self.pending.is_some()
    }

    /// The numbered choice the next key answers, if any.
    pub fn pending_prompt(&self) -> Option<SubPrompt> {
        match &self.pending {
            Some(Pending::Choice { object, .. }) => Some(SubPrompt::Choice {
                count: object.choices.len(),
            }),
            _ => None,
        }
    }

    /// Time until the zone is replaced.
    pub fn time_to_rotation(&self) -> Duration {
        self.next_rotation.saturating_duration_since(Instant::now())
    }

    /// `Faith: 5  Health: 8`
    pub fn status_line(&self) -> String {
        format!("Faith: {}  Health: {}", self.stats.faith, self.stats.health)
    }

    /// What stands at `pos` right now.
    pub fn tile_at(&self, pos: Position) -> Tile<'_> {
        if self.sanctuary == Some(pos) {
            return Tile {
                glyph: SANCTUARY_GLYPH,
                color: SANCTUARY_COLOR,
                kind: TileKind::Sanctuary,
            };
        }
        self.zone().tile(pos, &self.used)
    }

    /// Replace the zone if its time is up.
    ///
    /// Several missed periods rotate once. Finished walks do not rotate.
    pub fn tick(&mut self) {
        let now = Instant::now();
        if now < self.next_rotation {
            return;
        }
        while self.next_rotation <= now {
            self.next_rotation += self.rotation;
        }
        if self.outcome.is_none() {
            self.rotate();
        }
    }

    /// Handle one key press.
    pub fn press(&mut self, key: Key) {
        self.tick();

        if self.outcome.is_some() {
            if key.is('r') {
                self.restart();
            }
            return;
        }

        match self.pending.take() {
            Some(Pending::Choice { object, area }) => self.choose(key, object, area),
            Some(Pending::Encounter(encounter)) => {
                if key.is('g') {
                    self.interact(encounter);
                } else if key.is('e') {
                    self.message("You step away.");
                } else {
                    self.pending = Some(Pending::Encounter(encounter));
                }
            }
            None => {
                if let Some((dx, dy)) = key.direction() {
                    self.step(dx, dy);
                }
            }
        }
    }

    /// Start over in a new random zone.
    pub fn restart(&mut self) {
        self.zone = self.rng.index(self.atlas.zones.len());
        self.stats = Stats::default();
        self.messages.clear();
        self.outcome = None;
        self.next_rotation = Instant::now() + self.rotation;
        self.begin();
        #[cfg(feature = "logging")]
        tracing::info!(zone = %self.zone_name(), "podvigh walk restarted");
    }

    fn begin(&mut self) {
        self.reset_zone_state();
        self.message(OPENING_MESSAGE);
    }

    fn reset_zone_state(&mut self) {
        self.player = Position::center();
        self.visited = HashSet::from([self.player]);
        self.used.clear();
        self.sanctuary = None;
        self.pending = None;
    }

    fn rotate(&mut self) {
        self.zone = self.rng.index(self.atlas.zones.len());
        self.reset_zone_state();
        let name = self.zone_name().to_string();
        #[cfg(feature = "logging")]
        tracing::info!(zone = %name, "zone rotated");
        self.message(format!("A new zone appears: {name}"));
    }

    fn step(&mut self, dx: i32, dy: i32) {
        let next = self.player.offset(dx, dy);
        if !next.in_bounds() {
            self.message("The path ends here.");
            return;
        }
        self.visited.insert(self.player);
        self.player = next;

        let tile = self.tile_at(next);
        let encounter = match tile.kind {
            TileKind::Sanctuary => Some((
                format!(
                    "You see a sanctuary.\n{SANCTUARY_DESCRIPTION}\nPress G to interact, E to ignore."
                ),
                Encounter::Sanctuary,
            )),
            TileKind::Object { object, origin } => {
                let intro = if object.kind == ObjectKind::Npc {
                    format!("You meet {}.", object.name)
                } else {
                    format!("You see a {}.", object.name.to_lowercase())
                };
                Some((
                    format!(
                        "{intro}\n{}\nPress G to interact, E to ignore.",
                        object.description
                    ),
                    Encounter::Object {
                        object: object.clone(),
                        area: object.area(origin),
                    },
                ))
            }
            TileKind::Ground => None,
        };

        if let Some((text, encounter)) = encounter {
            self.message(text);
            self.pending = Some(Pending::Encounter(encounter));
            return;
        }

        self.random_event();
        if self.rng.chance(REFLECTION_CHANCE) && !self.zone().reflections.is_empty() {
            let i = self.rng.index(self.zone().reflections.len());
            let reflection = self.zone().reflections[i].clone();
            self.message(reflection);
        }
        self.settle();
    }

    fn random_event(&mut self) {
        let zone = self.zone_name().to_string();
        let events: Vec<RandomEvent> = self
            .atlas
            .events
            .iter()
            .filter(|e| e.allowed_in(&zone))
            .cloned()
            .collect();
        if events.is_empty() || !self.rng.chance(EVENT_CHANCE) {
            return;
        }
        let event = &events[self.rng.index(events.len())];
        self.message(event.msg.clone());
        if let Some(code) = &event.effect {
            self.apply(code);
        }
    }

    fn interact(&mut self, encounter: Encounter) {
        let (object, area) = match encounter {
            Encounter::Sanctuary => {
                self.finish(Outcome::Peace);
                return;
            }
            Encounter::Object { object, area } => (object, area),
        };

        if !object.choices.is_empty() {
            let mut text = vec!["What do you do?".to_string()];
            text.extend(
                object
                    .choices
                    .iter()
                    .enumerate()
                    .map(|(i, choice)| format!("{}. {}", i + 1, choice.label)),
            );
            text.push("(Press 1, 2, 3... to choose)".to_string());
            self.message(text.join("\n"));
            self.pending = Some(Pending::Choice { object, area });
            return;
        }

        if object.kind == ObjectKind::Npc {
            if !object.dialogue.is_empty() {
                let line = &object.dialogue[self.rng.index(object.dialogue.len())];
                self.message(format!("{}: \"{line}\"", object.name));
            }
            if let Some(code) = &object.effect {
                self.apply(code);
            }
        } else {
            if let Some(code) = &object.effect {
                self.apply(code);
            }
            if let Some(message) = &object.message {
                self.message(message.clone());
            }
        }
        self.used.extend(area);
        self.settle();
    }

    fn choose(&mut self, key: Key, object: InteractionObject, area: Vec<Position>) {
        let picked = match key {
            Key::Char(c) => c
                .to_digit(10)
                .and_then(|n| (n as usize).checked_sub(1))
                .and_then(|i| object.choices.get(i)),
            _ => None,
        };
        let Some(choice) = picked.cloned() else {
            self.pending = Some(Pending::Choice { object, area });
            return;
        };

        if let Some(code) = &choice.effect {
            self.apply(code);
        }
        if let Some(message) = choice.message {
            self.message(message);
        }
        self.used.extend(area);
        self.settle();
    }

    fn apply(&mut self, code: &str) {
        if let Some(text) = self.stats.apply_code(code) {
            self.message(text);
        }
    }

    /// React to changed stats: reveal the Sanctuary or end the walk.
    fn settle(&mut self) {
        if self.stats.health == 0 {
            self.finish(Outcome::Perished);
            return;
        }
        if self.sanctuary.is_none() && self.stats.faith >= SANCTUARY_FAITH {
            let dx = self.rng.roll_range(-SANCTUARY_RADIUS, SANCTUARY_RADIUS);
            let dy = self.rng.roll_range(-SANCTUARY_RADIUS, SANCTUARY_RADIUS);
            let pos = self.player.offset(dx, dy);
            self.sanctuary = Some(Position::new(
                pos.x.clamp(0, MAP_WIDTH - 1),
                pos.y.clamp(0, MAP_HEIGHT - 1),
            ));
            #[cfg(feature = "logging")]
            tracing::info!(sanctuary = ?self.sanctuary, "sanctuary revealed");
            self.message("A hidden passage opens nearby. The Sanctuary is revealed!");
        }
    }

    fn finish(&mut self, outcome: Outcome) {
        self.outcome = Some(outcome);
        self.pending = None;
        let line = match outcome {
            Outcome::Peace => "You kneel in the Sanctuary. You have found peace.",
            Outcome::Perished => LOSS_ENDING,
        };
        self.message(line);
        self.message(RESTART_HINT);
        #[cfg(feature = "logging")]
        tracing::info!(?outcome, "podvigh walk ended");
    }

    fn message(&mut self, text: impl Into<String>) {
        self.messages.push_back(text.into());
        while self.messages.len() > MAX_MESSAGES {
            self.messages.pop_front();
        }
    }

    /// The map around the walker, one string per row.
    ///
    /// The viewport is centred on the walker with a `#` border. `@` is the
    /// walker, `.` a visited tile, blank the space beyond the grid.
    pub fn render(&self) -> Vec<String> {
        let half_w = MAP_WIDTH / 2;
        let half_h = MAP_HEIGHT / 2;
        let (min_x, max_x) = (self.player.x - half_w, self.player.x + half_w);
        let (min_y, max_y) = (self.player.y - half_h, self.player.y + half_h);

        (min_y..=max_y)
            .map(|y| {
                (min_x..=max_x)
                    .map(|x| {
                        let pos = Position::new(x, y);
                        if y == min_y || y == max_y || x == min_x || x == max_x {
                            '#'
                        } else if pos == self.player {
                            '@'
                        } else if !pos.in_bounds() {
                            ' '
                        } else if self.visited.contains(&pos) {
                            '.'
                        } else {
                            self.tile_at(pos).glyph
                        }
                    })
                    .collect()
            })
            .collect()
    }

    /// The latest messages, and the ending once the walk is over, framed
    /// in an ASCII box.
    pub fn message_box(&self) -> Vec<String> {
        let skip = self.messages.len().saturating_sub(3);
        let mut recent: Vec<&str> = self.messages.iter().skip(skip).map(String::as_str).collect();
        if let Some(outcome) = self.outcome {
            recent.push(outcome.ending());
        }
        let combined = recent.join("\n\n");
        let parts: Vec<&str> = combined.split('\n').collect();

        let longest = parts.iter().map(|p| p.chars().count()).max().unwrap_or(0);
        let width = longest.clamp(10, MESSAGE_BOX_WIDTH);
        let border = format!("+{}+", "-".repeat(width + 2));

        let mut lines = vec![border.clone()];
        lines.extend(parts.iter().map(|part| {
            let clipped: String = part.chars().take(width).collect();
            format!("| {clipped:<width$} |")
        }));
        lines.push(border);
        lines
    }
}

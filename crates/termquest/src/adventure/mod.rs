//! CyberMonk, a text adventure over a fixed location graph
//!
//! The player walks the graph with `cd`, looks around with `ls` and learns
//! two extra commands (`cat`, `ls -la`) by using items found on the way.
//! Progress is written to a [`Storage`] after every command and picked up
//! again by the next [`Monk`] created over the same storage.
//!
//! # Example
//!
//! ```rust
//! use termquest::adventure::Monk;
//!
//! let mut monk = Monk::new();
//! monk.submit("cd forest_deeper");
//! monk.submit("cd crystal_cavern");
//! monk.submit("bash crystal-lens.sh");
//! monk.submit("cat note.txt");
//! assert!(monk.lines().last().unwrap().starts_with("Welcome, traveler!"));
//! ```

mod storage;
mod world;

pub use storage::{FileStorage, MemoryStorage, Storage};
pub use world::{Capability, LOCATIONS, Location, START_LOCATION, location};

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::interpreter::OutputEvent;
use world::{CAVERN, CAVERN_VOICE};

/// Storage key of the save slot.
pub const STATE_KEY: &str = "cyberMonkState";

const UNKNOWN_COMMAND: &str = "Unknown command. Type 'help' to open your book.";
const NO_SCRIPT: &str = "bash: command not found or script not available here.";
const NO_PATH: &str = "No such path.";

const CRYSTAL_LENS: &str = "crystal-lens.sh";
const CRYSTAL_LENS_TEXT: &str = "You take the crystal lens and learn to read with it.\n\nYou have discovered the secret of the 'cat' command!\nYou can now read notes and books you find.\nUsage: cat <file>\nTry it now with: cat note.txt";

const HOLY_GOGGLES: &str = "holy-goggles.sh";
const HOLY_GOGGLES_TEXT: &str = "You put on the holy goggles. Suddenly, hidden places shimmer into view!\nYou have discovered the secret of the 'ls -la' command!\nYou can now find hidden rooms in shadowy places.\nUsage: ls -la";

/// Persisted progress.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonkState {
    pub location: String,
    /// Locations left through `cd`, oldest first.
    #[serde(default)]
    pub history: Vec<String>,
    #[serde(default)]
    pub unlocked: Vec<Capability>,
    #[serde(default)]
    pub visited: Vec<String>,
}

impl Default for MonkState {
    fn default() -> Self {
        Self {
            location: START_LOCATION.to_string(),
            history: Vec::new(),
            unlocked: Vec::new(),
            visited: vec![START_LOCATION.to_string()],
        }
    }
}

impl MonkState {
    /// Read the save slot. Anything missing, malformed or pointing at an
    /// unknown location gives a fresh game.
    pub fn load(storage: &dyn Storage) -> Self {
        let Some(raw) = storage.load(STATE_KEY) else {
            return Self::default();
        };
        match serde_json::from_str::<MonkState>(&raw) {
            Ok(state) if location(&state.location).is_some() => state,
            Ok(_state) => {
                #[cfg(feature = "logging")]
                tracing::warn!(location = %_state.location, "saved location unknown, starting over");
                Self::default()
            }
            Err(_e) => {
                #[cfg(feature = "logging")]
                tracing::warn!(error = %_e, "saved state unreadable, starting over");
                Self::default()
            }
        }
    }

    pub fn has(&self, capability: Capability) -> bool {
        self.unlocked.contains(&capability)
    }

    fn unlock(&mut self, capability: Capability) {
        if !self.has(capability) {
            self.unlocked.push(capability);
        }
    }

    fn current(&self) -> &'static Location {
        location(&self.location).unwrap_or(&LOCATIONS[0])
    }
}

/// One parsed input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MonkCommand {
    Reset,
    Help,
    /// `ls`, or `ls -la` / `ls -al` with `hidden` set.
    List { hidden: bool },
    Pwd,
    Cd(Option<String>),
    Cat(Option<String>),
    Bash(Option<String>),
    Clear,
    Unknown,
}

impl MonkCommand {
    /// Parse a trimmed, non-empty line. Extra operands are ignored.
    pub fn parse(line: &str) -> Self {
        let mut words = line.split_whitespace();
        let Some(cmd) = words.next() else {
            return MonkCommand::Unknown;
        };
        let arg = words.next().map(str::to_string);

        match cmd {
            "reset" => MonkCommand::Reset,
            "help" => MonkCommand::Help,
            "ls" => MonkCommand::List {
                hidden: matches!(arg.as_deref(), Some("-la" | "-al")),
            },
            "pwd" => MonkCommand::Pwd,
            "cd" => MonkCommand::Cd(arg),
            "cat" => MonkCommand::Cat(arg),
            "bash" => MonkCommand::Bash(arg),
            "clear" => MonkCommand::Clear,
            _ => MonkCommand::Unknown,
        }
    }
}

/// What the side panel shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonkStatus {
    pub location: String,
    pub image: &'static str,
    pub unlocked: Vec<Capability>,
}

impl MonkStatus {
    /// `cat, ls -la`, or `None yet`.
    pub fn unlocked_summary(&self) -> String {
        if self.unlocked.is_empty() {
            return "None yet".to_string();
        }
        self.unlocked
            .iter()
            .map(|c| c.command())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// A CyberMonk session.
pub struct Monk {
    state: MonkState,
    storage: Arc<dyn Storage>,
    lines: Vec<String>,
    events: Vec<OutputEvent>,
    compact_prompt: bool,
}

impl Default for Monk {
    fn default() -> Self {
        Self::new()
    }
}

impl Monk {
    /// A fresh game kept in memory only.
    pub fn new() -> Self {
        Self::with_storage(Arc::new(MemoryStorage::new()))
    }

    /// Resume from `storage`, starting over when it holds no usable save.
    pub fn with_storage(storage: Arc<dyn Storage>) -> Self {
        let state = MonkState::load(storage.as_ref());
        #[cfg(feature = "logging")]
        tracing::info!(location = %state.location, "cybermonk session started");

        let mut monk = Self {
            state,
            storage,
            lines: Vec::new(),
            events: Vec::new(),
            compact_prompt: false,
        };
        monk.intro();
        monk
    }

    /// Use the short `m@f:` prompt.
    pub fn compact_prompt(mut self, compact: bool) -> Self {
        self.compact_prompt = compact;
        self
    }

    pub fn prompt(&self) -> String {
        if self.compact_prompt {
            format!("m@f:{}$", self.state.location)
        } else {
            format!("monk@fantasy:{}$", self.state.location)
        }
    }

    pub fn state(&self) -> &MonkState {
        &self.state
    }

    pub fn status(&self) -> MonkStatus {
        MonkStatus {
            location: self.state.location.clone(),
            image: self.state.current().image,
            unlocked: self.state.unlocked.clone(),
        }
    }

    /// Everything shown since the last clear.
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Display changes since the last call.
    pub fn take_events(&mut self) -> Vec<OutputEvent> {
        std::mem::take(&mut self.events)
    }

    /// Handle one typed line.
    pub fn submit(&mut self, line: &str) {
        let line = line.trim();
        if line.is_empty() {
            return;
        }

        let command = MonkCommand::parse(line);
        #[cfg(feature = "logging")]
        tracing::debug!(?command, "cybermonk command");

        match command {
            MonkCommand::Reset => {
                self.reset();
                return;
            }
            MonkCommand::Clear => {
                self.clear();
                return;
            }
            _ => {}
        }

        let echo = format!("{} {line}", self.prompt());
        self.emit(echo);
        let output = self.run(command);
        for out in output.iter().flat_map(|text| text.split('\n')) {
            self.emit(out);
        }
        self.persist();
    }

    /// Output for everything except `reset` and `clear`.
    fn run(&mut self, command: MonkCommand) -> Vec<String> {
        let here = self.state.current();
        match command {
            MonkCommand::Help => self.help(),
            MonkCommand::List { hidden: false } => non_empty(here.listing(false)),
            MonkCommand::List { hidden: true } => {
                if self.state.has(Capability::ListHidden) {
                    non_empty(here.listing(true))
                } else {
                    vec![UNKNOWN_COMMAND.to_string()]
                }
            }
            MonkCommand::Pwd => vec![self.state.location.clone()],
            MonkCommand::Cd(Some(dir)) if dir == ".." => match here.parent {
                Some(parent) => vec![self.enter(parent)],
                None => vec!["No previous location.".to_string()],
            },
            MonkCommand::Cd(Some(dir)) => match here.exit(&dir) {
                Some(target) => vec![self.enter(target)],
                None => vec![NO_PATH.to_string()],
            },
            MonkCommand::Cd(None) => vec![NO_PATH.to_string()],
            MonkCommand::Cat(_) if !self.state.has(Capability::Cat) => {
                vec![UNKNOWN_COMMAND.to_string()]
            }
            MonkCommand::Cat(None) => vec!["Usage: cat <file>".to_string()],
            MonkCommand::Cat(Some(file)) => match here.item(&file) {
                Some(content) => vec![content.to_string()],
                None => vec![format!("No such file '{file}' here.")],
            },
            MonkCommand::Bash(Some(script))
                if script.ends_with(".sh") && here.item(&script).is_some() =>
            {
                vec![self.use_item(&script, here)]
            }
            MonkCommand::Bash(_) => vec![NO_SCRIPT.to_string()],
            MonkCommand::Unknown | MonkCommand::Reset | MonkCommand::Clear => {
                vec![UNKNOWN_COMMAND.to_string()]
            }
        }
    }

    /// Move to `target` and describe the arrival.
    fn enter(&mut self, target: &'static str) -> String {
        let previous = std::mem::replace(&mut self.state.location, target.to_string());
        self.state.history.push(previous);

        let first_visit = !self.state.visited.iter().any(|v| v == target);
        let dest = self.state.current();
        let mut output = if first_visit {
            self.state.visited.push(target.to_string());
            let mut text = dest.description.to_string();
            if target == CAVERN {
                text.push_str(CAVERN_VOICE);
            }
            text
        } else {
            format!("You move to {target}.")
        };

        if let Some(capability) = dest.unlocks
            && capability != Capability::Cat
            && !self.state.has(capability)
        {
            self.state.unlock(capability);
            output.push_str(&format!(
                "\nYou have discovered the secret of the '{capability}' command!"
            ));
        }

        #[cfg(feature = "logging")]
        tracing::debug!(location = target, first_visit, "cybermonk moved");
        output
    }

    fn use_item(&mut self, script: &str, here: &'static Location) -> String {
        match script {
            CRYSTAL_LENS => {
                self.state.unlock(Capability::Cat);
                CRYSTAL_LENS_TEXT.to_string()
            }
            HOLY_GOGGLES => {
                self.state.unlock(Capability::ListHidden);
                HOLY_GOGGLES_TEXT.to_string()
            }
            _ => here.item(script).unwrap_or_default().to_string(),
        }
    }

    fn help(&self) -> Vec<String> {
        let mut lines = vec![
            "You open your book. Available movements and actions:",
            "- cd <location>: Change to a new location (e.g. cd forest_deeper, cd crystal_cavern).",
            "- cd ..: Go to the previous location.",
            "- ls: List available paths from your location.",
        ];
        if self.state.has(Capability::ListHidden) {
            lines.push("- ls -la: List all paths, including hidden ones.");
        }
        lines.push("- pwd: Show your current location.");
        if self.state.has(Capability::Cat) {
            lines.push("- cat <file>: Read notes and books you find.");
        }
        lines.extend([
            "- bash <item>.sh: Interact with items or NPCs.",
            "- help: Open your book of movements.",
            "- clear: Clear the terminal.",
            "- reset: Reset your progress and start over.",
        ]);
        lines.into_iter().map(str::to_string).collect()
    }

    fn intro(&mut self) {
        let description = self.state.current().description;
        for line in [
            "Welcome, CyberMonk!",
            "You hold a book containing all the movements and actions you know.",
            "Open your book with the 'help' command to see your options.",
            description,
            "Type 'ls' to see available paths, 'cd forest_deeper' to enter the forest, 'cd ..' to go back, or 'help' to open your book.",
        ] {
            self.emit(line);
        }
    }

    fn reset(&mut self) {
        if let Err(_e) = self.storage.remove(STATE_KEY) {
            #[cfg(feature = "logging")]
            tracing::warn!(error = %_e, "failed to remove cybermonk save");
        }
        self.state = MonkState::default();
        self.clear();
        self.intro();
        #[cfg(feature = "logging")]
        tracing::info!("cybermonk progress reset");
    }

    fn clear(&mut self) {
        self.lines.clear();
        self.events.push(OutputEvent::Clear);
    }

    fn emit(&mut self, line: impl Into<String>) {
        let line = line.into();
        self.events.push(OutputEvent::Line(line.clone()));
        self.lines.push(line);
    }

    fn persist(&self) {
        let result = serde_json::to_string(&self.state)
            .map_err(crate::Error::from)
            .and_then(|json| self.storage.save(STATE_KEY, &json));
        if let Err(_e) = result {
            #[cfg(feature = "logging")]
            tracing::warn!(error = %_e, "failed to save cybermonk progress");
        }
    }
}

fn non_empty(text: String) -> Vec<String> {
    if text.is_empty() { Vec::new() } else { vec![text] }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn walk(monk: &mut Monk, lines: &[&str]) {
        for line in lines {
            monk.submit(line);
        }
    }

    fn last(monk: &Monk) -> &str {
        monk.lines().last().map(String::as_str).unwrap_or("")
    }

    #[test]
    fn test_intro() {
        let monk = Monk::new();
        assert_eq!(monk.lines().len(), 5);
        assert_eq!(monk.lines()[0], "Welcome, CyberMonk!");
        assert_eq!(monk.lines()[3], location("forest").unwrap().description);
        assert_eq!(monk.prompt(), "monk@fantasy:forest$");
        assert_eq!(Monk::new().compact_prompt(true).prompt(), "m@f:forest$");
    }

    #[test]
    fn test_parse() {
        assert_eq!(MonkCommand::parse("ls -la"), MonkCommand::List { hidden: true });
        assert_eq!(MonkCommand::parse("ls -al"), MonkCommand::List { hidden: true });
        assert_eq!(MonkCommand::parse("ls foo"), MonkCommand::List { hidden: false });
        assert_eq!(
            MonkCommand::parse("cd  crystal_cavern extra"),
            MonkCommand::Cd(Some("crystal_cavern".to_string()))
        );
        assert_eq!(MonkCommand::parse("cat"), MonkCommand::Cat(None));
        assert_eq!(MonkCommand::parse("dance"), MonkCommand::Unknown);
    }

    #[test]
    fn test_echo_and_listing() {
        let mut monk = Monk::new();
        monk.take_events();
        monk.submit("ls");
        assert_eq!(
            monk.take_events(),
            vec![
                OutputEvent::Line("monk@fantasy:forest$ ls".to_string()),
                OutputEvent::Line("forest_deeper/".to_string()),
            ]
        );

        monk.submit("pwd");
        assert_eq!(last(&monk), "forest");
    }

    #[test]
    fn test_movement_and_revisit() {
        let mut monk = Monk::new();
        monk.submit("cd forest_deeper");
        assert_eq!(last(&monk), location("forest_deeper").unwrap().description);
        assert_eq!(monk.prompt(), "monk@fantasy:forest_deeper$");

        monk.submit("cd ..");
        assert_eq!(last(&monk), "You move to forest.");
        monk.submit("cd ..");
        assert_eq!(last(&monk), "No previous location.");
        monk.submit("cd nowhere");
        assert_eq!(last(&monk), "No such path.");
        monk.submit("cd");
        assert_eq!(last(&monk), "No such path.");

        assert_eq!(monk.state().history, vec!["forest", "forest_deeper"]);
        assert_eq!(monk.state().visited, vec!["forest", "forest_deeper"]);
    }

    #[test]
    fn test_cavern_voice_on_first_visit_only() {
        let mut monk = Monk::new();
        walk(&mut monk, &["cd forest_deeper", "cd crystal_cavern"]);
        assert!(last(&monk).starts_with("A mysterious voice echoes in the cavern"));

        walk(&mut monk, &["cd ..", "cd crystal_cavern"]);
        assert_eq!(last(&monk), "You move to crystal_cavern.");
        // Entering the cavern does not teach cat.
        assert!(!monk.state().has(Capability::Cat));
    }

    #[test]
    fn test_cat_is_learned_from_the_lens() {
        let mut monk = Monk::new();
        walk(&mut monk, &["cd forest_deeper", "cd crystal_cavern", "cat note.txt"]);
        assert_eq!(last(&monk), UNKNOWN_COMMAND);

        monk.submit("bash crystal-lens.sh");
        assert_eq!(last(&monk), "Try it now with: cat note.txt");
        assert_eq!(monk.status().unlocked, vec![Capability::Cat]);

        monk.submit("cat note.txt");
        assert!(last(&monk).starts_with("Welcome, traveler!"));
        monk.submit("cat missing.txt");
        assert_eq!(last(&monk), "No such file 'missing.txt' here.");
        monk.submit("cat");
        assert_eq!(last(&monk), "Usage: cat <file>");

        monk.submit("bash crystal-lens.sh");
        assert_eq!(monk.state().unlocked, vec![Capability::Cat]);
    }

    #[test]
    fn test_hidden_paths_need_goggles() {
        let mut monk = Monk::new();
        walk(&mut monk, &["cd forest_deeper", "cd shadow_grove", "ls -la"]);
        assert_eq!(last(&monk), UNKNOWN_COMMAND);

        monk.submit("bash holy-goggles.sh");
        assert_eq!(last(&monk), "Usage: ls -la");
        monk.submit("ls -la");
        assert_eq!(last(&monk), ".graveyard/  holy-goggles.sh");

        walk(&mut monk, &["cd .graveyard", "cd .crypt", "ls"]);
        assert_eq!(monk.state().location, ".crypt");
        assert_eq!(last(&monk), "monk@fantasy:.crypt$ ls");
        assert_eq!(monk.status().image, "graveyard");
    }

    #[test]
    fn test_bash_errors() {
        let mut monk = Monk::new();
        monk.submit("bash holy-goggles.sh");
        assert_eq!(last(&monk), NO_SCRIPT);
        monk.submit("bash");
        assert_eq!(last(&monk), NO_SCRIPT);
        walk(&mut monk, &["cd forest_deeper", "cd crystal_cavern", "bash note.txt"]);
        assert_eq!(last(&monk), NO_SCRIPT);
    }

    #[test]
    fn test_help_grows_with_capabilities() {
        let mut monk = Monk::new();
        monk.submit("help");
        let lines = &monk.lines()[5..];
        assert_eq!(lines[0], "monk@fantasy:forest$ help");
        assert_eq!(lines.len(), 10);
        assert!(!lines.iter().any(|l| l.starts_with("- cat")));

        walk(&mut monk, &["cd forest_deeper", "cd crystal_cavern", "bash crystal-lens.sh", "clear", "help"]);
        assert!(monk.lines().iter().any(|l| l.starts_with("- cat <file>")));
        assert_eq!(monk.lines().len(), 11);
    }

    #[test]
    fn test_unknown_and_empty() {
        let mut monk = Monk::new();
        monk.submit("   ");
        assert_eq!(monk.lines().len(), 5);
        monk.submit("dance");
        assert_eq!(last(&monk), UNKNOWN_COMMAND);
    }

    #[test]
    fn test_clear() {
        let mut monk = Monk::new();
        monk.take_events();
        monk.submit("clear");
        assert!(monk.lines().is_empty());
        assert_eq!(monk.take_events(), vec![OutputEvent::Clear]);
    }

    #[test]
    fn test_progress_persists() {
        let storage: Arc<dyn Storage> = Arc::new(MemoryStorage::new());
        let mut monk = Monk::with_storage(Arc::clone(&storage));
        walk(&mut monk, &["cd forest_deeper", "cd crystal_cavern", "bash crystal-lens.sh"]);

        let resumed = Monk::with_storage(Arc::clone(&storage));
        assert_eq!(resumed.state(), monk.state());
        assert_eq!(
            resumed.lines()[3],
            location("crystal_cavern").unwrap().description
        );

        let raw = storage.load(STATE_KEY).unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value["unlocked"], serde_json::json!(["cat"]));
    }

    #[test]
    fn test_reset() {
        let storage: Arc<dyn Storage> = Arc::new(MemoryStorage::new());
        let mut monk = Monk::with_storage(Arc::clone(&storage));
        walk(&mut monk, &["cd forest_deeper", "reset"]);

        assert_eq!(monk.state(), &MonkState::default());
        assert_eq!(monk.lines().len(), 5);
        assert_eq!(storage.load(STATE_KEY), None);
    }

    #[test]
    fn test_bad_save_starts_over() {
        let storage = MemoryStorage::new();
        storage.save(STATE_KEY, "{not json").unwrap();
        assert_eq!(MonkState::load(&storage), MonkState::default());

        storage
            .save(STATE_KEY, r#"{"location":"moon","history":[],"unlocked":[],"visited":[]}"#)
            .unwrap();
        assert_eq!(MonkState::load(&storage), MonkState::default());

        storage.save(STATE_KEY, r#"{"location":"sky_bridge"}"#).unwrap();
        assert_eq!(MonkState::load(&storage).location, "sky_bridge");
    }

    #[test]
    fn test_status_summary() {
        let mut monk = Monk::new();
        assert_eq!(monk.status().unlocked_summary(), "None yet");
        walk(&mut monk, &["cd forest_deeper", "cd shadow_grove", "bash holy-goggles.sh"]);
        walk(&mut monk, &["cd ..", "cd crystal_cavern", "bash crystal-lens.sh"]);
        assert_eq!(monk.status().unlocked_summary(), "ls -la, cat");
        assert_eq!(monk.status().image, "crystal-cavern");
    }
}

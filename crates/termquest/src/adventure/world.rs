//! The CyberMonk location graph

use std::fmt;

use serde::{Deserialize, Serialize};

/// A command the monk has to discover before using it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Capability {
    /// `cat <file>`
    #[serde(rename = "cat")]
    Cat,
    /// `ls -la`
    #[serde(rename = "ls -la")]
    ListHidden,
}

impl Capability {
    /// The command as the player types it.
    pub fn command(self) -> &'static str {
        match self {
            Capability::Cat => "cat",
            Capability::ListHidden => "ls -la",
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.command())
    }
}

/// One node of the graph.
#[derive(Debug)]
pub struct Location {
    pub id: &'static str,
    pub description: &'static str,
    /// Picture shown next to the terminal.
    pub image: &'static str,
    /// `(name, target)` in listing order. Names starting with `.` are hidden.
    pub exits: &'static [(&'static str, &'static str)],
    /// Where `cd ..` leads.
    pub parent: Option<&'static str>,
    /// `(file name, content)` in listing order.
    pub items: &'static [(&'static str, &'static str)],
    /// Granted when the location is entered, except [`Capability::Cat`]
    /// which only the crystal lens teaches.
    pub unlocks: Option<Capability>,
}

impl Location {
    pub fn exit(&self, name: &str) -> Option<&'static str> {
        self.exits
            .iter()
            .find(|(exit, _)| *exit == name)
            .map(|(_, target)| *target)
    }

    pub fn item(&self, name: &str) -> Option<&'static str> {
        self.items
            .iter()
            .find(|(item, _)| *item == name)
            .map(|(_, content)| *content)
    }

    /// Exits (as `name/`) followed by items, joined by two spaces.
    pub fn listing(&self, show_hidden: bool) -> String {
        self.exits
            .iter()
            .filter(|(name, _)| show_hidden || !name.starts_with('.'))
            .map(|(name, _)| format!("{name}/"))
            .chain(self.items.iter().map(|(name, _)| name.to_string()))
            .collect::<Vec<_>>()
            .join("  ")
    }
}

/// Where a new game starts.
pub const START_LOCATION: &str = "forest";

/// The location whose first visit adds [`CAVERN_VOICE`].
pub const CAVERN: &str = "crystal_cavern";

/// Appended to the cavern description on the first visit.
pub const CAVERN_VOICE: &str = "\n\nA mysterious voice echoes in the cavern: 'If you wish to interact with items or NPCs, type bash item_name.sh or bash npc_name.sh.'";

pub const LOCATIONS: &[Location] = &[
    Location {
        id: "forest",
        description: "You stand at the entrance to a mysterious forest. The path ahead looks inviting.",
        image: "forest-game",
        exits: &[("forest_deeper", "forest_deeper")],
        parent: None,
        items: &[],
        unlocks: None,
    },
    Location {
        id: "forest_deeper",
        description: "You venture deeper into the forest. The trees grow denser and the air feels magical. Two paths lie ahead: one leads to a shadowy grove, the other to a glittering cavern.",
        image: "fantasy-forest-game",
        exits: &[
            ("shadow_grove", "shadow_grove"),
            ("crystal_cavern", "crystal_cavern"),
        ],
        parent: Some("forest"),
        items: &[],
        unlocks: None,
    },
    Location {
        id: "shadow_grove",
        description: "You enter a grove where the trees are twisted and the shadows seem alive. The path ends here, and you sense you should turn back. In the shadows, you spot a pair of Holy Goggles [holy-goggles.sh].\n\nA whisper in the shadows: 'If you want to interact with objects or NPCs, write bash object-name.sh or npc-name.sh.'",
        image: "shadow-grove",
        exits: &[(".graveyard", ".graveyard")],
        parent: Some("forest_deeper"),
        items: &[(
            "holy-goggles.sh",
            "#!/bin/bash\necho 'You put on the holy goggles. Suddenly, hidden places shimmer into view! You have learned the secret of the ls -la command.'",
        )],
        unlocks: None,
    },
    Location {
        id: ".graveyard",
        description: "A hidden graveyard shrouded in mist. Ancient tombstones line the ground, and the air is thick with mystery.",
        image: "graveyard",
        exits: &[(".crypt", ".crypt")],
        parent: Some("shadow_grove"),
        items: &[],
        unlocks: None,
    },
    Location {
        id: ".crypt",
        description: "A hidden crypt lies beneath the grove, filled with ancient bones and forgotten secrets. The air is cold and heavy.",
        image: "graveyard",
        exits: &[],
        parent: Some(".graveyard"),
        items: &[],
        unlocks: None,
    },
    Location {
        id: "crystal_cavern",
        description: "A cavern glittering with giant crystals. The air hums with magical energy and a faint path leads deeper. On the floor, you spot a shimmering Crystal Lens [crystal-lens.sh], and a dusty Note [note.txt].",
        image: "crystal-cavern",
        exits: &[("ancient_ruins", "ancient_ruins")],
        parent: Some("forest_deeper"),
        items: &[
            (
                "note.txt",
                "Welcome, traveler! If you can read this, you have mastered the art of the cat command. Seek the secrets hidden in the ruins beyond.",
            ),
            (
                "crystal-lens.sh",
                "#!/bin/bash\necho 'You take the crystal lens and learn to read with it.'",
            ),
        ],
        unlocks: Some(Capability::Cat),
    },
    Location {
        id: "ancient_ruins",
        description: "Moss-covered ruins of a forgotten civilization. Strange symbols glow faintly on the stone walls.",
        image: "ancient-ruins",
        exits: &[
            ("sky_bridge", "sky_bridge"),
            (".secret-chamber", ".secret-chamber"),
        ],
        parent: Some("crystal_cavern"),
        items: &[],
        unlocks: None,
    },
    Location {
        id: ".secret-chamber",
        description: "A hidden chamber behind a crumbling wall. Ancient artifacts and mysterious glyphs cover the surfaces, hinting at lost knowledge.",
        image: "ancient-ruins",
        exits: &[],
        parent: Some("ancient_ruins"),
        items: &[],
        unlocks: None,
    },
    Location {
        id: "sky_bridge",
        description: "A narrow bridge of clouds connects two floating islands high above the world. The view is breathtaking.",
        image: "sky-bridge",
        exits: &[],
        parent: Some("ancient_ruins"),
        items: &[],
        unlocks: None,
    },
];

/// Look up a location by id.
pub fn location(id: &str) -> Option<&'static Location> {
    LOCATIONS.iter().find(|loc| loc.id == id)
}

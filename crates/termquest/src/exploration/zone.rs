//! Zones, their encounters and what stands on each tile

use std::collections::HashSet;

use serde::Deserialize;

use super::rng::{tile_fraction, tile_hash, zone_seed};
use crate::error::{Error, Result};

/// Walkable grid size.
pub const MAP_WIDTH: i32 = 50;
pub const MAP_HEIGHT: i32 = 25;

/// Share of tiles holding a special or the origin of a place.
pub const SPECIAL_CHANCE: f64 = 0.01;
/// Share of tiles holding an NPC.
pub const NPC_CHANCE: f64 = 0.01;

const ZONES_JSON: &str = include_str!("../../data/podvigh/zones.json");
const EVENTS_JSON: &str = include_str!("../../data/podvigh/events.json");
const INTERACTIONS_JSON: &[(&str, &str)] = &[
    ("Forest", include_str!("../../data/podvigh/interactions/forest.json")),
    ("Ruins", include_str!("../../data/podvigh/interactions/ruins.json")),
    ("Desert", include_str!("../../data/podvigh/interactions/desert.json")),
];

/// A grid coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Middle of the grid, where every walk starts.
    pub const fn center() -> Self {
        Self::new(MAP_WIDTH / 2, MAP_HEIGHT / 2)
    }

    pub fn in_bounds(self) -> bool {
        (0..MAP_WIDTH).contains(&self.x) && (0..MAP_HEIGHT).contains(&self.y)
    }

    pub fn offset(self, dx: i32, dy: i32) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ObjectKind {
    /// Single tile, used once.
    Special,
    /// Single tile, speaks a line of dialogue.
    Npc,
    /// Spans `size` tiles, used once as a whole.
    Place,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct Size {
    pub w: i32,
    pub h: i32,
}

impl Default for Size {
    fn default() -> Self {
        Self { w: 1, h: 1 }
    }
}

/// One numbered answer to an encounter.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Choice {
    pub label: String,
    #[serde(default)]
    pub effect: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Something to meet on the map.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InteractionObject {
    #[serde(rename = "type")]
    pub kind: ObjectKind,
    pub name: String,
    #[serde(rename = "char")]
    pub glyph: char,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub description: String,
    /// Effect code applied on interaction (`faith+1`).
    #[serde(default)]
    pub effect: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    /// When non-empty, interacting asks for one of these instead.
    #[serde(default)]
    pub choices: Vec<Choice>,
    #[serde(default)]
    pub dialogue: Vec<String>,
    #[serde(default)]
    pub size: Size,
    #[serde(default)]
    pub allowed_zones: Option<Vec<String>>,
}

impl InteractionObject {
    fn allowed_in(&self, zone: &str) -> bool {
        self.allowed_zones
            .as_ref()
            .is_none_or(|zones| zones.iter().any(|z| z == zone))
    }

    /// Tiles covered when the object sits at `origin`.
    pub fn area(&self, origin: Position) -> Vec<Position> {
        let size = if self.kind == ObjectKind::Place {
            self.size
        } else {
            Size::default()
        };
        (origin.y..origin.y + size.h.max(1))
            .flat_map(|y| (origin.x..origin.x + size.w.max(1)).map(move |x| Position::new(x, y)))
            .collect()
    }
}

/// Something that may happen on a plain step.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RandomEvent {
    pub msg: String,
    #[serde(default)]
    pub effect: Option<String>,
    /// `None` means every zone.
    #[serde(default)]
    pub allowed_zones: Option<Vec<String>>,
}

impl RandomEvent {
    pub fn allowed_in(&self, zone: &str) -> bool {
        self.allowed_zones
            .as_ref()
            .is_none_or(|zones| zones.iter().any(|z| z == zone))
    }
}

/// A themed map.
#[derive(Debug, Clone, Deserialize)]
pub struct Zone {
    pub name: String,
    /// Ground glyphs, picked per tile by hash.
    pub tiles: Vec<char>,
    pub color: String,
    pub reflections: Vec<String>,
    #[serde(skip)]
    pub objects: Vec<InteractionObject>,
    #[serde(skip)]
    seed: u32,
}

/// What stands on a tile.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TileKind<'a> {
    Ground,
    /// An unused encounter; `origin` is its top-left tile.
    Object {
        object: &'a InteractionObject,
        origin: Position,
    },
    Sanctuary,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tile<'a> {
    pub glyph: char,
    pub color: &'a str,
    pub kind: TileKind<'a>,
}

impl Zone {
    /// Plain ground at `(x, y)`.
    pub fn ground(&self, pos: Position) -> Tile<'_> {
        let hash = tile_hash(pos.x, pos.y, self.seed);
        let glyph = self
            .tiles
            .get(hash as usize % self.tiles.len().max(1))
            .copied()
            .unwrap_or(' ');
        Tile {
            glyph,
            color: &self.color,
            kind: TileKind::Ground,
        }
    }

    /// What stands at `pos`, treating `used` tiles as ground.
    pub fn tile(&self, pos: Position, used: &HashSet<Position>) -> Tile<'_> {
        if used.contains(&pos) {
            return self.ground(pos);
        }
        if let Some((place, origin)) = self.place_at(pos) {
            return self.object_tile(place, origin);
        }

        let hash = tile_hash(pos.x, pos.y, self.seed);
        let fraction = tile_fraction(hash);
        if fraction < SPECIAL_CHANCE {
            // Places picked here are only shown if they fit, via `place_at`.
            if let Some(special) = pick(&self.specials_and_places(), hash)
                && special.kind == ObjectKind::Special
            {
                return self.object_tile(special, pos);
            }
        } else if fraction < SPECIAL_CHANCE + NPC_CHANCE
            && let Some(npc) = pick(&self.of_kind(ObjectKind::Npc), hash)
        {
            return self.object_tile(npc, pos);
        }
        self.ground(pos)
    }

    /// The place covering `pos`, with its origin.
    ///
    /// A place sits at an origin whose tile rolls a special and whose pick
    /// among specials and places is that place, if it fits in the grid.
    fn place_at(&self, pos: Position) -> Option<(&InteractionObject, Position)> {
        let candidates = self.specials_and_places();
        for place in self.of_kind(ObjectKind::Place) {
            let Size { w, h } = place.size;
            for ox in pos.x - (w - 1)..=pos.x {
                for oy in pos.y - (h - 1)..=pos.y {
                    let origin = Position::new(ox, oy);
                    if !origin.in_bounds() || ox + w > MAP_WIDTH || oy + h > MAP_HEIGHT {
                        continue;
                    }
                    let hash = tile_hash(ox, oy, self.seed);
                    if tile_fraction(hash) >= SPECIAL_CHANCE {
                        continue;
                    }
                    if let Some(selected) = pick(&candidates, hash)
                        && std::ptr::eq(selected, place)
                    {
                        return Some((place, origin));
                    }
                }
            }
        }
        None
    }

    fn object_tile<'a>(&'a self, object: &'a InteractionObject, origin: Position) -> Tile<'a> {
        Tile {
            glyph: object.glyph,
            color: object.color.as_deref().unwrap_or(&self.color),
            kind: TileKind::Object { object, origin },
        }
    }

    fn of_kind(&self, kind: ObjectKind) -> Vec<&InteractionObject> {
        self.objects
            .iter()
            .filter(|o| o.kind == kind && o.allowed_in(&self.name))
            .collect()
    }

    fn specials_and_places(&self) -> Vec<&InteractionObject> {
        self.objects
            .iter()
            .filter(|o| matches!(o.kind, ObjectKind::Special | ObjectKind::Place))
            .collect()
    }
}

fn pick<'a>(objects: &[&'a InteractionObject], hash: u32) -> Option<&'a InteractionObject> {
    if objects.is_empty() {
        return None;
    }
    objects.get(hash as usize % objects.len()).copied()
}

/// Every zone and event a walk can use.
#[derive(Debug, Clone)]
pub struct Atlas {
    pub zones: Vec<Zone>,
    pub events: Vec<RandomEvent>,
}

impl Atlas {
    /// The bundled Forest, Ruins and Desert zones.
    pub fn builtin() -> Result<Self> {
        Self::from_json(ZONES_JSON, EVENTS_JSON, INTERACTIONS_JSON)
    }

    /// Build from JSON documents: a zone list, an event list and one
    /// interaction list per zone name.
    pub fn from_json(zones: &str, events: &str, interactions: &[(&str, &str)]) -> Result<Self> {
        let mut zones: Vec<Zone> = serde_json::from_str(zones)?;
        let events: Vec<RandomEvent> = serde_json::from_str(events)?;

        if zones.is_empty() {
            return Err(Error::Internal("no zones defined".to_string()));
        }
        for zone in &mut zones {
            if zone.tiles.is_empty() {
                return Err(Error::Internal(format!("zone '{}' has no tiles", zone.name)));
            }
            zone.seed = zone_seed(&zone.name);
            if let Some((_, json)) = interactions.iter().find(|(name, _)| *name == zone.name) {
                zone.objects = serde_json::from_str(json)?;
            }
        }
        Ok(Self { zones, events })
    }

    pub fn zone_index(&self, name: &str) -> Option<usize> {
        self.zones.iter().position(|z| z.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn atlas() -> Atlas {
        Atlas::builtin().unwrap()
    }

    fn all_tiles() -> impl Iterator<Item = Position> {
        (0..MAP_HEIGHT).flat_map(|y| (0..MAP_WIDTH).map(move |x| Position::new(x, y)))
    }

    #[test]
    fn test_builtin_atlas() {
        let atlas = atlas();
        let names: Vec<_> = atlas.zones.iter().map(|z| z.name.as_str()).collect();
        assert_eq!(names, ["Forest", "Ruins", "Desert"]);
        assert!(atlas.zones.iter().all(|z| !z.objects.is_empty()));
        assert!(atlas.zones.iter().all(|z| !z.reflections.is_empty()));
        assert!(!atlas.events.is_empty());
        assert_eq!(atlas.zone_index("Ruins"), Some(1));
    }

    #[test]
    fn test_bad_atlas() {
        assert!(Atlas::from_json("[]", "[]", &[]).is_err());
        assert!(Atlas::from_json("not json", "[]", &[]).is_err());
        let no_tiles = r##"[{"name":"Void","tiles":[],"color":"#000","reflections":[]}]"##;
        assert!(Atlas::from_json(no_tiles, "[]", &[]).is_err());
    }

    #[test]
    fn test_tiles_are_stable() {
        let atlas = atlas();
        let used = HashSet::new();
        for zone in &atlas.zones {
            for pos in all_tiles().step_by(7) {
                assert_eq!(zone.tile(pos, &used), zone.tile(pos, &used));
            }
        }
    }

    #[test]
    fn test_zones_hold_encounters() {
        let atlas = atlas();
        let used = HashSet::new();
        for zone in &atlas.zones {
            let encounters = all_tiles()
                .filter(|&p| matches!(zone.tile(p, &used).kind, TileKind::Object { .. }))
                .count();
            assert!(encounters > 0, "{} has no encounters", zone.name);
        }
    }

    #[test]
    fn test_used_tiles_are_ground() {
        let atlas = atlas();
        let zone = &atlas.zones[0];
        let pos = all_tiles()
            .find(|&p| matches!(zone.tile(p, &HashSet::new()).kind, TileKind::Object { .. }))
            .unwrap();
        let used: HashSet<_> = [pos].into_iter().collect();
        assert_eq!(zone.tile(pos, &used), zone.ground(pos));
        assert!(zone.tiles.contains(&zone.ground(pos).glyph));
    }

    #[test]
    fn test_place_covers_its_area() {
        let atlas = atlas();
        let used = HashSet::new();
        for zone in &atlas.zones {
            for pos in all_tiles() {
                if let TileKind::Object { object, origin } = zone.tile(pos, &used).kind
                    && object.kind == ObjectKind::Place
                {
                    let area = object.area(origin);
                    assert!(area.contains(&pos));
                    assert!(area.iter().all(|p| p.in_bounds()));
                    assert_eq!(area.len() as i32, object.size.w * object.size.h);
                }
            }
        }
    }

    #[test]
    fn test_event_zones() {
        let atlas = atlas();
        for event in &atlas.events {
            if let Some(zones) = &event.allowed_zones {
                assert!(event.allowed_in(&zones[0]));
            } else {
                assert!(event.allowed_in("Anywhere"));
            }
        }
        assert!(atlas.events.iter().any(|e| !e.allowed_in("Desert")));
    }
}

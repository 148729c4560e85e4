//! Static level metadata: display names, map regions and chest levels.

use serde::Serialize;

use crate::{MAX_LEVEL, MIN_LEVEL, TOTAL_LEVELS};

/// Display names indexed by `level - 1`.
#[rustfmt::skip]
pub const LEVEL_NAMES: [&str; TOTAL_LEVELS] = [
    // Meadow Fields
    "Dewdrop Gate", "Clover Path", "Sunny Knoll", "Bramble Bend", "Honey Hollow",
    "Windmill Rise", "Daisy Crossing", "Pebble Brook", "Lark Meadow", "Harvest Barn",
    // Whispering Woods
    "Fern Trail", "Mossy Stump", "Owl's Perch", "Acorn Glade", "Lantern Grove",
    "Fox Den", "Willow Ford", "Hidden Spring", "Oak Crown", "Ranger's Lodge",
    // Crystal Caves
    "Echo Tunnel", "Glimmer Pool", "Quartz Steps", "Bat Roost", "Dripstone Hall",
    "Geode Nook", "Miner's Shaft", "Amethyst Vault", "Deep Gallery", "Crystal Heart",
    // Sandy Shores
    "Tide Pools", "Shell Beach", "Driftwood Cove", "Gull Rock", "Lighthouse Point",
    "Coral Steps", "Pirate's Inlet", "Salt Flats", "Sea Arch", "Captain's Wharf",
    // Sunbaked Dunes
    "Mirage Well", "Cactus Garden", "Scorpion Ridge", "Oasis Camp", "Sandstorm Pass",
    "Dune Sea", "Sun Temple", "Caravan Stop", "Buried Gate", "Pharaoh's Tomb",
    // Frost Peaks
    "Snowdrift Trail", "Icicle Bridge", "Penguin Bay", "Frozen Falls", "Yeti Cave",
    "Aurora Field", "Glacier Stair", "Blizzard Hut", "Summit Ledge", "Ice Palace",
    // Volcano Isle
    "Ash Beach", "Lava Tubes", "Ember Grove", "Obsidian Road", "Steam Vents",
    "Magma Bridge", "Cinder Cone", "Fire Lake", "Smoke Crater", "Dragon's Forge",
    // Cloud Kingdom
    "Sky Ladder", "Rainbow Span", "Feather Isle", "Thunder Gate", "Misty Terrace",
    "Kite Tower", "Moonbeam Dock", "Storm Spire", "Starfall Garden", "Cloud Castle",
    // Clockwork City
    "Gear Market", "Cog Bridge", "Steam Plaza", "Spring Alley", "Copper Canal",
    "Piston Yard", "Tick Tower", "Brass Library", "Pendulum Hall", "Grand Clock",
    // Starlight Summit
    "Comet Trail", "Nebula Steps", "Orbit Ring", "Meteor Field", "Galaxy Bridge",
    "Eclipse Gate", "Constellation Hall", "Supernova Peak", "Cosmic Throne", "Star Crown",
];

/// A named group of consecutive levels on the map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Region {
    pub name: &'static str,
    pub first_level: u32,
    pub last_level: u32,
}

impl Region {
    const fn new(name: &'static str, first_level: u32) -> Self {
        Self {
            name,
            first_level,
            last_level: first_level + 9,
        }
    }

    #[must_use]
    pub const fn contains(&self, level: u32) -> bool {
        self.first_level <= level && level <= self.last_level
    }

    pub fn levels(&self) -> impl Iterator<Item = u32> {
        self.first_level..=self.last_level
    }
}

pub const REGIONS: [Region; 10] = [
    Region::new("Meadow Fields", 1),
    Region::new("Whispering Woods", 11),
    Region::new("Crystal Caves", 21),
    Region::new("Sandy Shores", 31),
    Region::new("Sunbaked Dunes", 41),
    Region::new("Frost Peaks", 51),
    Region::new("Volcano Isle", 61),
    Region::new("Cloud Kingdom", 71),
    Region::new("Clockwork City", 81),
    Region::new("Starlight Summit", 91),
];

/// Milestone levels whose first victory opens a treasure chest.
pub const CHEST_LEVELS: [u32; 5] = [10, 25, 50, 75, 100];

#[must_use]
pub fn level_name(level: u32) -> Option<&'static str> {
    if !(MIN_LEVEL..=MAX_LEVEL).contains(&level) {
        return None;
    }
    LEVEL_NAMES.get((level - 1) as usize).copied()
}

#[must_use]
pub fn region(level: u32) -> Option<&'static Region> {
    REGIONS.iter().find(|region| region.contains(level))
}

#[must_use]
pub fn is_chest_level(level: u32) -> bool {
    CHEST_LEVELS.contains(&level)
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn test_names_are_unique() {
        let names: HashSet<_> = LEVEL_NAMES.iter().collect();
        assert_eq!(names.len(), TOTAL_LEVELS);
    }

    #[test]
    fn test_regions_cover_every_level_once() {
        for level in MIN_LEVEL..=MAX_LEVEL {
            let count = REGIONS.iter().filter(|r| r.contains(level)).count();
            assert_eq!(count, 1, "level {level}");
        }
        let total: usize = REGIONS.iter().map(|r| r.levels().count()).sum();
        assert_eq!(total, TOTAL_LEVELS);
    }

    #[test]
    fn test_lookup() {
        assert_eq!(level_name(1), Some("Dewdrop Gate"));
        assert_eq!(level_name(100), Some("Star Crown"));
        assert_eq!(level_name(0), None);
        assert_eq!(level_name(101), None);

        assert_eq!(region(15).map(|r| r.name), Some("Whispering Woods"));
        assert_eq!(region(101), None);
    }

    #[test]
    fn test_chest_levels() {
        assert!(is_chest_level(25));
        assert!(!is_chest_level(26));
        assert!(CHEST_LEVELS.iter().all(|l| (MIN_LEVEL..=MAX_LEVEL).contains(l)));
    }
}

//! Memory map and bit tables for Super Metroid (NTSC, unheadered).
//!
//! Addresses are in RetroArch's SNES core memory map, where WRAM starts at
//! `0x7E0000`.

use serde::{Deserialize, Serialize};

/// One memory range read per poll tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemoryField {
    /// Bulk block: equipment words and every counter.
    Stats,
    /// Current area index.
    Area,
    /// Current room header pointer.
    Room,
    /// Main game-state code.
    GameState,
    /// Avatar x position.
    PosX,
    /// Avatar y position.
    PosY,
    /// Crateria + Brinstar boss bytes.
    BossFlags,
    /// Norfair + Wrecked Ship boss bytes.
    NorfairBosses,
    /// Wrecked Ship + Maridia boss bytes.
    WreckedShipBosses,
    /// Maridia + Tourian boss bytes.
    MaridiaBosses,
    /// Tourian + Ceres boss bytes.
    TourianBosses,
    /// First word of the event bit array.
    EventFlags,
}

impl MemoryField {
    /// Every field, in the order the poll loop reads them.
    pub const ALL: [Self; 12] = [
        Self::Stats,
        Self::Area,
        Self::Room,
        Self::GameState,
        Self::PosX,
        Self::PosY,
        Self::BossFlags,
        Self::NorfairBosses,
        Self::WreckedShipBosses,
        Self::MaridiaBosses,
        Self::TourianBosses,
        Self::EventFlags,
    ];

    /// Start address of the range.
    #[must_use]
    pub const fn address(self) -> u32 {
        match self {
            Self::Stats => STATS_BASE,
            Self::Area => 0x7E_079F,
            Self::Room => 0x7E_079B,
            Self::GameState => 0x7E_0998,
            Self::PosX => 0x7E_0AF6,
            Self::PosY => 0x7E_0AFA,
            Self::BossFlags => 0x7E_D828,
            Self::NorfairBosses => 0x7E_D82A,
            Self::WreckedShipBosses => 0x7E_D82B,
            Self::MaridiaBosses => 0x7E_D82C,
            Self::TourianBosses => 0x7E_D82D,
            Self::EventFlags => 0x7E_D820,
        }
    }

    /// Length of the range in bytes.
    #[must_use]
    pub const fn length(self) -> usize {
        match self {
            Self::Stats => STATS_LEN,
            Self::Area => 1,
            _ => 2,
        }
    }

    /// Stable name used in logs and debug output.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Stats => "stats",
            Self::Area => "area",
            Self::Room => "room",
            Self::GameState => "game_state",
            Self::PosX => "pos_x",
            Self::PosY => "pos_y",
            Self::BossFlags => "boss_flags",
            Self::NorfairBosses => "norfair_bosses",
            Self::WreckedShipBosses => "wrecked_ship_bosses",
            Self::MaridiaBosses => "maridia_bosses",
            Self::TourianBosses => "tourian_bosses",
            Self::EventFlags => "event_flags",
        }
    }
}

/// Start of the bulk stats block (equipped items word).
pub const STATS_BASE: u32 = 0x7E_09A2;

/// Length of the bulk stats block; ends after reserve energy at `0x7E09D6`.
pub const STATS_LEN: usize = 0x36;

/// Word offsets inside the bulk stats block.
pub mod stats_offset {
    /// Collected items bitset (`0x7E09A4`).
    pub const ITEMS: usize = 0x02;
    /// Collected beams bitset (`0x7E09A8`).
    pub const BEAMS: usize = 0x06;
    /// Current energy (`0x7E09C2`).
    pub const HEALTH: usize = 0x20;
    /// Maximum energy (`0x7E09C4`).
    pub const MAX_HEALTH: usize = 0x22;
    /// Missiles (`0x7E09C6`).
    pub const MISSILES: usize = 0x24;
    /// Maximum missiles (`0x7E09C8`).
    pub const MAX_MISSILES: usize = 0x26;
    /// Super missiles (`0x7E09CA`).
    pub const SUPERS: usize = 0x28;
    /// Maximum super missiles (`0x7E09CC`).
    pub const MAX_SUPERS: usize = 0x2A;
    /// Power bombs (`0x7E09CE`).
    pub const POWER_BOMBS: usize = 0x2C;
    /// Maximum power bombs (`0x7E09D0`).
    pub const MAX_POWER_BOMBS: usize = 0x2E;
    /// Maximum reserve energy (`0x7E09D4`).
    pub const MAX_RESERVE: usize = 0x32;
    /// Reserve energy (`0x7E09D6`).
    pub const RESERVE: usize = 0x34;
}

/// Collected-items word bits.
pub const ITEM_BITS: [(&str, u16); 11] = [
    ("varia", 0x0001),
    ("spring_ball", 0x0002),
    ("morph_ball", 0x0004),
    ("screw_attack", 0x0008),
    ("gravity", 0x0020),
    ("hi_jump", 0x0100),
    ("space_jump", 0x0200),
    ("bombs", 0x1000),
    ("speed_booster", 0x2000),
    ("grapple", 0x4000),
    ("xray", 0x8000),
];

/// Collected-beams word bits.
pub const BEAM_BITS: [(&str, u16); 5] = [
    ("wave", 0x0001),
    ("ice", 0x0002),
    ("spazer", 0x0004),
    ("plasma", 0x0008),
    ("charge", 0x1000),
];

/// Area index → display name.
pub const AREA_NAMES: [&str; 8] = [
    "Crateria",
    "Brinstar",
    "Norfair",
    "Wrecked Ship",
    "Maridia",
    "Tourian",
    "Ceres",
    "Debug",
];

/// Area index values referenced by the inference rules.
pub mod area {
    /// Starting surface area.
    pub const CRATERIA: u8 = 0;
    /// First early-game area.
    pub const BRINSTAR: u8 = 1;
    /// Final area holding the final boss.
    pub const TOURIAN: u8 = 5;
}

/// Returns the display name for an area index.
#[must_use]
pub fn area_name(id: u8) -> &'static str {
    AREA_NAMES.get(usize::from(id)).copied().unwrap_or("Unknown")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn stats_block_covers_reserve_energy() {
        assert_eq!(STATS_BASE + u32::try_from(STATS_LEN).unwrap(), 0x7E_09D8);
        assert!(stats_offset::RESERVE + 2 <= STATS_LEN);
    }

    #[test]
    fn equipment_bits_are_distinct_single_bits() {
        for table in [&ITEM_BITS[..], &BEAM_BITS[..]] {
            let mut seen = 0u16;
            for (name, bit) in table {
                assert_eq!(bit.count_ones(), 1, "{name} is not a single bit");
                assert_eq!(seen & bit, 0, "{name} overlaps another entry");
                seen |= bit;
            }
        }
    }

    #[test]
    fn field_names_unique() {
        let names: HashSet<_> = MemoryField::ALL.iter().map(|f| f.name()).collect();
        assert_eq!(names.len(), MemoryField::ALL.len());
    }

    #[test]
    fn area_names_lookup() {
        assert_eq!(area_name(0), "Crateria");
        assert_eq!(area_name(5), "Tourian");
        assert_eq!(area_name(7), "Debug");
        assert_eq!(area_name(8), "Unknown");
        assert_eq!(area_name(255), "Unknown");
    }
}

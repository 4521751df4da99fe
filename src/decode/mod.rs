//! Bit-field decoder.
//!
//! Turns a [`MemorySnapshot`] into [`GameStateAttributes`]. Decoding is
//! total: a missing range decodes to zero/false. The only failure is a
//! sanity-bound rejection of health values, which makes the poll loop keep
//! the previously published attributes.

pub mod snapshot;
pub mod tables;

pub use snapshot::MemorySnapshot;
pub use tables::MemoryField;

use std::collections::BTreeMap;

use serde::Serialize;

use crate::error::DecodeError;
use tables::{BEAM_BITS, ITEM_BITS, area_name, stats_offset};

/// Inclusive upper bound for health and max health.
pub const MAX_SANE_HEALTH: u16 = 1999;

/// Named equipment flags decoded from one bitset word.
pub type Equipment = BTreeMap<&'static str, bool>;

/// Typed game-state attributes for one tick.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GameStateAttributes {
    pub health: u16,
    pub max_health: u16,
    pub reserve_energy: u16,
    pub max_reserve_energy: u16,
    pub missiles: u16,
    pub max_missiles: u16,
    pub supers: u16,
    pub max_supers: u16,
    pub power_bombs: u16,
    pub max_power_bombs: u16,
    pub area_id: u8,
    pub area_name: &'static str,
    pub room_id: u16,
    pub player_x: u16,
    pub player_y: u16,
    pub game_state: u16,
    pub items: Equipment,
    pub beams: Equipment,
}

impl GameStateAttributes {
    /// Current and maximum ammunition summed over missiles, supers and power bombs.
    #[must_use]
    pub fn ammo_totals(&self) -> (u32, u32) {
        let current =
            u32::from(self.missiles) + u32::from(self.supers) + u32::from(self.power_bombs);
        let max = u32::from(self.max_missiles)
            + u32::from(self.max_supers)
            + u32::from(self.max_power_bombs);
        (current, max)
    }

    /// Ammunition spent relative to the maxima. Never negative.
    #[must_use]
    pub fn ammo_consumed(&self) -> u32 {
        let (current, max) = self.ammo_totals();
        max.saturating_sub(current)
    }

    /// Fraction of ammunition remaining, `None` when no ammunition is collected.
    #[must_use]
    pub fn ammo_fraction(&self) -> Option<f64> {
        let (current, max) = self.ammo_totals();
        (max > 0).then(|| f64::from(current.min(max)) / f64::from(max))
    }

    /// Fraction of health remaining, `None` when max health is zero.
    #[must_use]
    pub fn health_fraction(&self) -> Option<f64> {
        (self.max_health > 0)
            .then(|| f64::from(self.health.min(self.max_health)) / f64::from(self.max_health))
    }

    /// Whether any collected ammunition type has been fully spent.
    #[must_use]
    pub const fn any_ammo_type_exhausted(&self) -> bool {
        (self.max_missiles > 0 && self.missiles == 0)
            || (self.max_supers > 0 && self.supers == 0)
            || (self.max_power_bombs > 0 && self.power_bombs == 0)
    }

    /// Whether a named item is collected.
    #[must_use]
    pub fn has_item(&self, name: &str) -> bool {
        self.items.get(name).copied().unwrap_or(false)
    }

    /// Whether a named beam is collected.
    #[must_use]
    pub fn has_beam(&self, name: &str) -> bool {
        self.beams.get(name).copied().unwrap_or(false)
    }
}

/// Interprets `word` against a bit → name table.
#[must_use]
pub fn decode_bits(word: u16, table: &[(&'static str, u16)]) -> Equipment {
    table
        .iter()
        .map(|(name, bit)| (*name, word & bit != 0))
        .collect()
}

/// Decodes one tick's snapshot.
///
/// # Errors
///
/// Returns [`DecodeError::ValidationRejected`] when health or max health
/// lies outside `[0, MAX_SANE_HEALTH]`.
pub fn decode(snapshot: &MemorySnapshot) -> Result<GameStateAttributes, DecodeError> {
    let stat = |offset| {
        snapshot
            .word_at(MemoryField::Stats, offset)
            .unwrap_or_default()
    };
    let word = |field| snapshot.word(field).unwrap_or_default();

    let health = stat(stats_offset::HEALTH);
    let max_health = stat(stats_offset::MAX_HEALTH);
    check_health("health", health)?;
    check_health("max_health", max_health)?;

    let area_id = snapshot.byte(MemoryField::Area).unwrap_or_default();

    Ok(GameStateAttributes {
        health,
        max_health,
        reserve_energy: stat(stats_offset::RESERVE),
        max_reserve_energy: stat(stats_offset::MAX_RESERVE),
        missiles: stat(stats_offset::MISSILES),
        max_missiles: stat(stats_offset::MAX_MISSILES),
        supers: stat(stats_offset::SUPERS),
        max_supers: stat(stats_offset::MAX_SUPERS),
        power_bombs: stat(stats_offset::POWER_BOMBS),
        max_power_bombs: stat(stats_offset::MAX_POWER_BOMBS),
        area_id,
        area_name: area_name(area_id),
        room_id: word(MemoryField::Room),
        player_x: word(MemoryField::PosX),
        player_y: word(MemoryField::PosY),
        game_state: word(MemoryField::GameState),
        items: decode_bits(stat(stats_offset::ITEMS), &ITEM_BITS),
        beams: decode_bits(stat(stats_offset::BEAMS), &BEAM_BITS),
    })
}

const fn check_health(field: &'static str, value: u16) -> Result<(), DecodeError> {
    if value > MAX_SANE_HEALTH {
        return Err(DecodeError::ValidationRejected {
            field,
            value,
            max: MAX_SANE_HEALTH,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tables::STATS_LEN;

    /// Builds a stats block with the given words at their offsets.
    fn stats_block(words: &[(usize, u16)]) -> Vec<u8> {
        let mut block = vec![0u8; STATS_LEN];
        for (offset, value) in words {
            block[*offset..*offset + 2].copy_from_slice(&value.to_le_bytes());
        }
        block
    }

    #[test]
    fn empty_snapshot_decodes_to_defaults() {
        let attrs = decode(&MemorySnapshot::new()).unwrap();
        assert_eq!(attrs.health, 0);
        assert_eq!(attrs.area_name, "Crateria");
        assert_eq!(attrs.items.len(), ITEM_BITS.len());
        assert!(attrs.items.values().all(|v| !v));
        assert!(attrs.beams.values().all(|v| !v));
    }

    #[test]
    fn decodes_counters_and_location() {
        let snap = MemorySnapshot::new()
            .with_bytes(
                MemoryField::Stats,
                stats_block(&[
                    (stats_offset::HEALTH, 299),
                    (stats_offset::MAX_HEALTH, 399),
                    (stats_offset::MISSILES, 91),
                    (stats_offset::MAX_MISSILES, 135),
                    (stats_offset::SUPERS, 10),
                    (stats_offset::MAX_SUPERS, 15),
                    (stats_offset::POWER_BOMBS, 5),
                    (stats_offset::MAX_POWER_BOMBS, 10),
                    (stats_offset::RESERVE, 50),
                    (stats_offset::MAX_RESERVE, 100),
                    (stats_offset::ITEMS, 0x0025),
                    (stats_offset::BEAMS, 0x1003),
                ]),
            )
            .with_bytes(MemoryField::Area, vec![5])
            .with_word(MemoryField::Room, 0xDD58)
            .with_word(MemoryField::PosX, 0x0180)
            .with_word(MemoryField::PosY, 0x00B0)
            .with_word(MemoryField::GameState, 0x0008);

        let attrs = decode(&snap).unwrap();
        assert_eq!((attrs.health, attrs.max_health), (299, 399));
        assert_eq!((attrs.missiles, attrs.max_missiles), (91, 135));
        assert_eq!((attrs.supers, attrs.max_supers), (10, 15));
        assert_eq!((attrs.power_bombs, attrs.max_power_bombs), (5, 10));
        assert_eq!((attrs.reserve_energy, attrs.max_reserve_energy), (50, 100));
        assert_eq!(attrs.area_name, "Tourian");
        assert_eq!(attrs.room_id, 0xDD58);
        assert_eq!((attrs.player_x, attrs.player_y), (0x0180, 0x00B0));
        assert_eq!(attrs.game_state, 8);
        assert!(attrs.has_item("varia"));
        assert!(attrs.has_item("morph_ball"));
        assert!(attrs.has_item("gravity"));
        assert!(!attrs.has_item("space_jump"));
        assert!(attrs.has_beam("wave"));
        assert!(attrs.has_beam("ice"));
        assert!(attrs.has_beam("charge"));
        assert!(!attrs.has_beam("plasma"));
    }

    #[test]
    fn max_sane_health_is_accepted() {
        let snap = MemorySnapshot::new().with_bytes(
            MemoryField::Stats,
            stats_block(&[
                (stats_offset::HEALTH, MAX_SANE_HEALTH),
                (stats_offset::MAX_HEALTH, MAX_SANE_HEALTH),
            ]),
        );
        assert!(decode(&snap).is_ok());
    }

    #[test]
    fn insane_health_is_rejected() {
        let snap = MemorySnapshot::new().with_bytes(
            MemoryField::Stats,
            stats_block(&[(stats_offset::HEALTH, 2000), (stats_offset::MAX_HEALTH, 99)]),
        );
        assert_eq!(
            decode(&snap),
            Err(DecodeError::ValidationRejected {
                field: "health",
                value: 2000,
                max: MAX_SANE_HEALTH
            })
        );
    }

    #[test]
    fn insane_max_health_is_rejected() {
        let snap = MemorySnapshot::new().with_bytes(
            MemoryField::Stats,
            stats_block(&[(stats_offset::MAX_HEALTH, 0xFFFF)]),
        );
        assert!(matches!(
            decode(&snap),
            Err(DecodeError::ValidationRejected {
                field: "max_health",
                ..
            })
        ));
    }

    #[test]
    fn truncated_stats_block_defaults_missing_words() {
        let snap = MemorySnapshot::new().with_bytes(MemoryField::Stats, vec![0x04, 0x00, 0x04]);
        let attrs = decode(&snap).unwrap();
        assert!(attrs.has_item("morph_ball"));
        assert_eq!(attrs.health, 0);
    }

    #[test]
    fn unknown_area_name() {
        let snap = MemorySnapshot::new().with_bytes(MemoryField::Area, vec![42]);
        let attrs = decode(&snap).unwrap();
        assert_eq!(attrs.area_id, 42);
        assert_eq!(attrs.area_name, "Unknown");
    }

    #[test]
    fn ammo_helpers() {
        let attrs = GameStateAttributes {
            missiles: 0,
            max_missiles: 100,
            supers: 20,
            max_supers: 20,
            power_bombs: 0,
            max_power_bombs: 0,
            health: 50,
            max_health: 100,
            ..Default::default()
        };
        assert_eq!(attrs.ammo_totals(), (20, 120));
        assert_eq!(attrs.ammo_consumed(), 100);
        assert!(attrs.any_ammo_type_exhausted());
        assert!((attrs.ammo_fraction().unwrap() - 20.0 / 120.0).abs() < f64::EPSILON);
        assert!((attrs.health_fraction().unwrap() - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn uncollected_ammo_is_not_exhausted() {
        let attrs = GameStateAttributes::default();
        assert!(!attrs.any_ammo_type_exhausted());
        assert_eq!(attrs.ammo_fraction(), None);
        assert_eq!(attrs.health_fraction(), None);
    }

    #[test]
    fn ammo_above_max_is_clamped() {
        let attrs = GameStateAttributes {
            missiles: 200,
            max_missiles: 100,
            ..Default::default()
        };
        assert_eq!(attrs.ammo_consumed(), 0);
        assert_eq!(attrs.ammo_fraction(), Some(1.0));
    }
}

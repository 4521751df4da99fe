//! Final boss phase heuristics.
//!
//! The final fight leaves no clean per-phase flag in memory. Phases are
//! inferred from progress words gated by location and corroborated by how
//! much ammunition the player has spent. Every threshold below was tuned
//! against observed play and is overridable from the config file.

use serde::{Deserialize, Serialize};

use super::rules::{ScanRole, ScanRule, ScanWords};
use crate::decode::GameStateAttributes;
use crate::decode::tables::area;

/// Final boss fight progress.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FinalBossStage {
    #[default]
    NotStarted,
    Phase1Confirmed,
    Phase2Confirmed,
    SequenceComplete,
}

impl FinalBossStage {
    /// Derives the stage from the three ordered facts.
    #[must_use]
    pub const fn from_facts(phase1: bool, phase2: bool, complete: bool) -> Self {
        if complete {
            Self::SequenceComplete
        } else if phase2 {
            Self::Phase2Confirmed
        } else if phase1 {
            Self::Phase1Confirmed
        } else {
            Self::NotStarted
        }
    }
}

/// Supporting evidence a phase rule may require on top of its scan rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Evidence {
    /// The scan rule alone is enough.
    None,
    /// Ammunition spent, avatar inside the fight sub-area, or active gameplay.
    SupportingPlay,
    /// One collected ammunition type is fully spent.
    AmmoTypeExhausted,
    /// Nearly all ammunition spent.
    HeavyConsumption,
}

impl Evidence {
    /// Evaluates the predicate.
    #[must_use]
    pub fn holds(self, attrs: &GameStateAttributes, t: &InferenceThresholds) -> bool {
        match self {
            Self::None => true,
            Self::SupportingPlay => {
                attrs.ammo_consumed() >= t.min_meaningful_ammo_used
                    || (t.fight_zone_x_min..=t.fight_zone_x_max).contains(&attrs.player_x)
                    || attrs.game_state == t.active_gameplay_state
            }
            Self::AmmoTypeExhausted => attrs.any_ammo_type_exhausted(),
            Self::HeavyConsumption => attrs
                .ammo_fraction()
                .is_some_and(|remaining| 1.0 - remaining >= t.heavy_consumption),
        }
    }
}

/// One phase detection rule: a scan rule plus an evidence predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhaseRule {
    pub name: &'static str,
    pub signal: ScanRule,
    pub evidence: Evidence,
}

impl PhaseRule {
    /// Whether both the signal and its evidence hold.
    #[must_use]
    pub fn matches(
        &self,
        attrs: &GameStateAttributes,
        scan: &ScanWords,
        t: &InferenceThresholds,
    ) -> bool {
        self.signal.matches(scan) && self.evidence.holds(attrs, t)
    }
}

/// Approximate area around the escape point on the surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EscapeWindow {
    pub room_id: u16,
    #[serde(default)]
    pub x_min: u16,
    #[serde(default = "max_coord")]
    pub x_max: u16,
    #[serde(default)]
    pub y_min: u16,
    #[serde(default = "max_coord")]
    pub y_max: u16,
}

const fn max_coord() -> u16 {
    u16::MAX
}

impl EscapeWindow {
    /// Window covering a whole room.
    #[must_use]
    pub const fn room(room_id: u16) -> Self {
        Self {
            room_id,
            x_min: 0,
            x_max: u16::MAX,
            y_min: 0,
            y_max: u16::MAX,
        }
    }

    /// Whether the avatar stands inside the window.
    #[must_use]
    pub const fn contains(&self, attrs: &GameStateAttributes) -> bool {
        attrs.room_id == self.room_id
            && attrs.player_x >= self.x_min
            && attrs.player_x <= self.x_max
            && attrs.player_y >= self.y_min
            && attrs.player_y <= self.y_max
    }
}

/// Tunable constants of the final boss heuristics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct InferenceThresholds {
    /// Area index of the fight room.
    pub fight_area: u8,
    /// Room id of the fight room.
    pub fight_room: u16,
    pub fight_zone_x_min: u16,
    pub fight_zone_x_max: u16,
    /// Game-state code of active gameplay.
    pub active_gameplay_state: u16,
    /// Remaining ammunition fraction treated as "at or near max".
    pub ammo_near_max: f64,
    /// Remaining health fraction treated as "high".
    pub health_high: f64,
    pub min_meaningful_ammo_used: u32,
    /// Spent ammunition fraction treated as near-total consumption.
    pub heavy_consumption: f64,
    /// Max health at or below which Crateria reads as a fresh game.
    pub new_game_max_health: u16,
    pub phase1_strong: ScanRule,
    pub phase1_weak: ScanRule,
    pub phase2_strong_alt: ScanRule,
    pub escape_windows: Vec<EscapeWindow>,
}

impl Default for InferenceThresholds {
    fn default() -> Self {
        Self {
            fight_area: area::TOURIAN,
            fight_room: 0xDD58,
            fight_zone_x_min: 0x0100,
            fight_zone_x_max: 0x04FF,
            active_gameplay_state: 0x0008,
            ammo_near_max: 0.95,
            health_high: 0.90,
            min_meaningful_ammo_used: 10,
            heavy_consumption: 0.85,
            new_game_max_health: 99,
            phase1_strong: ScanRule::new(ScanRole::TourianBosses, 0x0200, 0x0703),
            phase1_weak: ScanRule::new(ScanRole::EventFlags, 0x0002, 0x0003),
            phase2_strong_alt: ScanRule::new(ScanRole::EventFlags, 0x0004, 0x0007),
            escape_windows: vec![
                EscapeWindow {
                    room_id: 0x91F8,
                    x_min: 0x0300,
                    x_max: 0x0700,
                    y_min: 0x0000,
                    y_max: 0x04FF,
                },
                EscapeWindow::room(0x92FD),
                EscapeWindow::room(0x96BA),
            ],
        }
    }
}

impl InferenceThresholds {
    /// Ordered Phase1 rules; any match qualifies.
    #[must_use]
    pub const fn phase1_rules(&self) -> [PhaseRule; 2] {
        [
            PhaseRule {
                name: "strong_progress",
                signal: self.phase1_strong,
                evidence: Evidence::None,
            },
            PhaseRule {
                name: "weak_progress_with_support",
                signal: self.phase1_weak,
                evidence: Evidence::SupportingPlay,
            },
        ]
    }

    /// Ordered Phase2 rules; any match qualifies once Phase1 holds.
    #[must_use]
    pub const fn phase2_rules(&self) -> [PhaseRule; 2] {
        [
            PhaseRule {
                name: "alternate_progress_with_exhausted_ammo",
                signal: self.phase2_strong_alt,
                evidence: Evidence::AmmoTypeExhausted,
            },
            PhaseRule {
                name: "heavy_consumption",
                signal: self.phase1_strong,
                evidence: Evidence::HeavyConsumption,
            },
        ]
    }

    /// Whether the avatar is in the final fight room.
    #[must_use]
    pub const fn in_fight_room(&self, attrs: &GameStateAttributes) -> bool {
        attrs.area_id == self.fight_area && attrs.room_id == self.fight_room
    }

    /// Whether ammunition is at or near its maximum.
    #[must_use]
    pub fn ammo_near_max(&self, attrs: &GameStateAttributes) -> bool {
        attrs
            .ammo_fraction()
            .is_some_and(|f| f >= self.ammo_near_max)
    }

    /// Whether health is high relative to its maximum.
    #[must_use]
    pub fn health_high(&self, attrs: &GameStateAttributes) -> bool {
        attrs
            .health_fraction()
            .is_some_and(|f| f >= self.health_high)
    }

    /// Full resources inside the fight room: the snapshot looks like a
    /// save state loaded before the fight, so progress words are stale.
    #[must_use]
    pub fn save_state_contradiction(&self, attrs: &GameStateAttributes) -> bool {
        self.in_fight_room(attrs) && self.ammo_near_max(attrs) && self.health_high(attrs)
    }

    /// Whether the avatar is inside any escape window on the surface.
    #[must_use]
    pub fn in_escape_window(&self, attrs: &GameStateAttributes) -> bool {
        attrs.area_id == area::CRATERIA && self.escape_windows.iter().any(|w| w.contains(attrs))
    }
}

/// Why sticky phase flags were cleared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResetReason {
    /// Starting area with starting resources.
    NewGame,
    /// Starting area with full ammunition after progress was recorded.
    EarlierSaveAtStart,
    /// Early area with full resources after progress was recorded.
    EarlyAreaFullResources,
    /// Fight room with full resources after progress was recorded.
    FightRoomFullResources,
    /// Explicit administrative reset.
    Administrative,
}

impl ResetReason {
    /// Stable label for logs and metrics.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::NewGame => "new_game",
            Self::EarlierSaveAtStart => "earlier_save_at_start",
            Self::EarlyAreaFullResources => "early_area_full_resources",
            Self::FightRoomFullResources => "fight_room_full_resources",
            Self::Administrative => "administrative",
        }
    }
}

/// Returns the first contradiction that should clear sticky flags.
///
/// Only the new-game check applies without sticky flags; it is reported
/// either way so the caller can decide whether anything changes.
#[must_use]
pub fn reset_reason(
    attrs: &GameStateAttributes,
    sticky_set: bool,
    t: &InferenceThresholds,
) -> Option<ResetReason> {
    let full_ammo = t.ammo_near_max(attrs);
    let high_health = t.health_high(attrs);

    if attrs.area_id == area::CRATERIA
        && attrs.max_health <= t.new_game_max_health
        && attrs.max_missiles == 0
    {
        return Some(ResetReason::NewGame);
    }
    if !sticky_set {
        return None;
    }
    if attrs.area_id == area::CRATERIA && full_ammo {
        return Some(ResetReason::EarlierSaveAtStart);
    }
    if attrs.area_id == area::BRINSTAR && full_ammo && high_health {
        return Some(ResetReason::EarlyAreaFullResources);
    }
    if t.in_fight_room(attrs) && full_ammo && high_health {
        return Some(ResetReason::FightRoomFullResources);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn in_fight_room(missiles: u16, health: u16) -> GameStateAttributes {
        GameStateAttributes {
            area_id: area::TOURIAN,
            room_id: 0xDD58,
            missiles,
            max_missiles: 135,
            health,
            max_health: 999,
            ..Default::default()
        }
    }

    #[test]
    fn stage_ordering() {
        assert_eq!(
            FinalBossStage::from_facts(false, false, false),
            FinalBossStage::NotStarted
        );
        assert_eq!(
            FinalBossStage::from_facts(true, false, false),
            FinalBossStage::Phase1Confirmed
        );
        assert_eq!(
            FinalBossStage::from_facts(true, true, false),
            FinalBossStage::Phase2Confirmed
        );
        assert_eq!(
            FinalBossStage::from_facts(false, false, true),
            FinalBossStage::SequenceComplete
        );
        assert!(FinalBossStage::Phase1Confirmed < FinalBossStage::SequenceComplete);
    }

    #[test]
    fn supporting_play_evidence() {
        let t = InferenceThresholds::default();
        let mut attrs = in_fight_room(135, 999);
        assert!(!Evidence::SupportingPlay.holds(&attrs, &t));

        attrs.missiles = 125;
        assert!(Evidence::SupportingPlay.holds(&attrs, &t));

        attrs.missiles = 135;
        attrs.player_x = 0x0200;
        assert!(Evidence::SupportingPlay.holds(&attrs, &t));

        attrs.player_x = 0;
        attrs.game_state = 0x0008;
        assert!(Evidence::SupportingPlay.holds(&attrs, &t));
    }

    #[test]
    fn heavy_consumption_evidence() {
        let t = InferenceThresholds::default();
        assert!(!Evidence::HeavyConsumption.holds(&in_fight_room(91, 500), &t));
        assert!(Evidence::HeavyConsumption.holds(&in_fight_room(20, 500), &t));
        assert!(!Evidence::HeavyConsumption.holds(&GameStateAttributes::default(), &t));
    }

    #[test]
    fn save_state_contradiction_requires_full_resources_in_room() {
        let t = InferenceThresholds::default();
        assert!(t.save_state_contradiction(&in_fight_room(135, 999)));
        assert!(t.save_state_contradiction(&in_fight_room(130, 950)));
        assert!(!t.save_state_contradiction(&in_fight_room(91, 999)));
        assert!(!t.save_state_contradiction(&in_fight_room(135, 300)));

        let mut outside = in_fight_room(135, 999);
        outside.room_id = 0xDAAE;
        assert!(!t.save_state_contradiction(&outside));
    }

    #[test]
    fn new_game_reset_applies_without_sticky() {
        let t = InferenceThresholds::default();
        let attrs = GameStateAttributes {
            area_id: area::CRATERIA,
            health: 99,
            max_health: 99,
            ..Default::default()
        };
        assert_eq!(reset_reason(&attrs, false, &t), Some(ResetReason::NewGame));
    }

    #[test]
    fn contradiction_resets_need_sticky() {
        let t = InferenceThresholds::default();
        let mut attrs = in_fight_room(135, 999);
        assert_eq!(reset_reason(&attrs, false, &t), None);
        assert_eq!(
            reset_reason(&attrs, true, &t),
            Some(ResetReason::FightRoomFullResources)
        );

        attrs.area_id = area::CRATERIA;
        attrs.room_id = 0x91F8;
        attrs.health = 100;
        assert_eq!(
            reset_reason(&attrs, true, &t),
            Some(ResetReason::EarlierSaveAtStart)
        );

        attrs.area_id = area::BRINSTAR;
        assert_eq!(reset_reason(&attrs, true, &t), None);
        attrs.health = 999;
        assert_eq!(
            reset_reason(&attrs, true, &t),
            Some(ResetReason::EarlyAreaFullResources)
        );
    }

    #[test]
    fn spent_resources_do_not_reset() {
        let t = InferenceThresholds::default();
        assert_eq!(reset_reason(&in_fight_room(91, 999), true, &t), None);
    }

    #[test]
    fn escape_windows() {
        let t = InferenceThresholds::default();
        let mut attrs = GameStateAttributes {
            area_id: area::CRATERIA,
            room_id: 0x91F8,
            player_x: 0x0480,
            player_y: 0x0440,
            ..Default::default()
        };
        assert!(t.in_escape_window(&attrs));

        attrs.player_x = 0x0100;
        assert!(!t.in_escape_window(&attrs));

        attrs.room_id = 0x92FD;
        assert!(t.in_escape_window(&attrs));

        attrs.area_id = area::BRINSTAR;
        assert!(!t.in_escape_window(&attrs));
    }

    #[test]
    fn thresholds_partial_yaml_override() {
        let t: InferenceThresholds =
            serde_yaml::from_str("ammo_near_max: 0.9\nfight_room: 56664\n").unwrap();
        assert!((t.ammo_near_max - 0.9).abs() < f64::EPSILON);
        assert_eq!(t.fight_room, 0xDD58);
        assert_eq!(t.escape_windows.len(), 3);
    }

    #[test]
    fn escape_window_yaml_defaults_to_whole_room() {
        let w: EscapeWindow = serde_yaml::from_str("room_id: 1234\n").unwrap();
        assert_eq!(w, EscapeWindow::room(1234));
    }
}

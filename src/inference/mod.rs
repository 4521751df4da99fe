//! Boss and phase inference.
//!
//! Combines decoded attributes with raw scan words and persistent sticky
//! flags into the published [`BossPhaseState`].

pub mod engine;
pub mod final_boss;
pub mod rules;

pub use engine::{InferenceEngine, StickyFlags};
pub use final_boss::{FinalBossStage, InferenceThresholds, ResetReason};
pub use rules::{AdvancedBossRules, Boss, ScanRole, ScanRule, ScanWords, default_advanced_rules};

use serde::Serialize;

/// Derived progress facts published each tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BossPhaseState {
    pub bomb_torizo: bool,
    pub kraid: bool,
    pub spore_spawn: bool,
    pub crocomire: bool,
    pub phantoon: bool,
    pub draygon: bool,
    pub ridley: bool,
    pub golden_torizo: bool,
    pub mother_brain_phase1: bool,
    pub mother_brain_phase2: bool,
    /// Full final boss sequence complete. Implies both phases.
    pub mother_brain: bool,
    pub evacuation_reached: bool,
    pub stage: FinalBossStage,
}

impl BossPhaseState {
    /// Whether a boss reads as defeated.
    #[must_use]
    pub const fn is_defeated(&self, boss: Boss) -> bool {
        match boss {
            Boss::BombTorizo => self.bomb_torizo,
            Boss::Kraid => self.kraid,
            Boss::SporeSpawn => self.spore_spawn,
            Boss::Crocomire => self.crocomire,
            Boss::Phantoon => self.phantoon,
            Boss::Draygon => self.draygon,
            Boss::Ridley => self.ridley,
            Boss::GoldenTorizo => self.golden_torizo,
        }
    }

    /// Sets a boss flag.
    pub const fn set(&mut self, boss: Boss, defeated: bool) {
        let slot = match boss {
            Boss::BombTorizo => &mut self.bomb_torizo,
            Boss::Kraid => &mut self.kraid,
            Boss::SporeSpawn => &mut self.spore_spawn,
            Boss::Crocomire => &mut self.crocomire,
            Boss::Phantoon => &mut self.phantoon,
            Boss::Draygon => &mut self.draygon,
            Boss::Ridley => &mut self.ridley,
            Boss::GoldenTorizo => &mut self.golden_torizo,
        };
        *slot = defeated;
    }

    /// Drops phase facts that came from sticky flags.
    ///
    /// Facts backed by the completion bit stay, since they are re-read
    /// from memory every tick.
    pub const fn clear_phases(&mut self) {
        let complete = self.mother_brain;
        self.mother_brain_phase1 = complete;
        self.mother_brain_phase2 = complete;
        self.stage = FinalBossStage::from_facts(complete, complete, complete);
        self.evacuation_reached &= complete;
    }

    /// Every boss currently reading as defeated.
    pub fn defeated(&self) -> impl Iterator<Item = Boss> + '_ {
        Boss::ALL.into_iter().filter(|b| self.is_defeated(*b))
    }
}

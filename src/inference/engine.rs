//! Stateful inference engine.
//!
//! One [`InferenceEngine`] lives for the whole process next to the cache.
//! It owns the sticky final-boss phase flags and the bootstrap marker; both
//! change only through [`InferenceEngine::infer`] or an explicit reset.

use serde::Serialize;
use tracing::{debug, info};

use super::final_boss::{FinalBossStage, InferenceThresholds, ResetReason, reset_reason};
use super::BossPhaseState;
use super::rules::{
    AdvancedBossRules, BASIC_BOSS_BITS, FINAL_BOSS_COMPLETE_BIT, ScanRole, ScanWords,
    default_advanced_rules,
};
use crate::decode::GameStateAttributes;
use crate::observability::metrics;

/// Persistent final boss phase flags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StickyFlags {
    pub phase1: bool,
    pub phase2: bool,
}

impl StickyFlags {
    /// Whether any phase flag is set.
    #[must_use]
    pub const fn any(self) -> bool {
        self.phase1 || self.phase2
    }
}

/// Boss and phase inference with persistent state.
#[derive(Debug, Clone)]
pub struct InferenceEngine {
    thresholds: InferenceThresholds,
    advanced: Vec<AdvancedBossRules>,
    sticky: StickyFlags,
    bootstrap_attempted: bool,
    last: Option<BossPhaseState>,
}

impl Default for InferenceEngine {
    fn default() -> Self {
        Self::new(InferenceThresholds::default(), default_advanced_rules())
    }
}

impl InferenceEngine {
    /// Creates an engine with the given thresholds and advanced-boss rules.
    #[must_use]
    pub const fn new(thresholds: InferenceThresholds, advanced: Vec<AdvancedBossRules>) -> Self {
        Self {
            thresholds,
            advanced,
            sticky: StickyFlags {
                phase1: false,
                phase2: false,
            },
            bootstrap_attempted: false,
            last: None,
        }
    }

    /// Active thresholds.
    #[must_use]
    pub const fn thresholds(&self) -> &InferenceThresholds {
        &self.thresholds
    }

    /// Current sticky flags.
    #[must_use]
    pub const fn sticky(&self) -> StickyFlags {
        self.sticky
    }

    /// Whether the one-time bootstrap has run.
    #[must_use]
    pub const fn bootstrap_attempted(&self) -> bool {
        self.bootstrap_attempted
    }

    /// Infers boss and phase facts for one successfully decoded tick.
    ///
    /// Order matters: bootstrap, then contradiction resets, then phase
    /// detection, so a reset and a re-detection never happen in the same
    /// tick from the same evidence.
    pub fn infer(&mut self, attrs: &GameStateAttributes, scan: &ScanWords) -> BossPhaseState {
        if !self.bootstrap_attempted {
            self.bootstrap_attempted = true;
            self.sticky = StickyFlags::default();
            info!(
                area = attrs.area_name,
                room = %format!("{:#06x}", attrs.room_id),
                "bootstrapping inference state from first snapshot"
            );
        }

        if self.sticky.any()
            && let Some(reason) = reset_reason(attrs, true, &self.thresholds)
        {
            self.clear_sticky(reason);
        }

        let mut state = BossPhaseState::default();
        let flags = scan.get(ScanRole::BossFlags);
        for (boss, bit) in BASIC_BOSS_BITS {
            state.set(boss, flags & bit != 0);
        }
        for rules in &self.advanced {
            if rules.detected(scan) {
                state.set(rules.boss, true);
            }
        }

        let complete = flags & FINAL_BOSS_COMPLETE_BIT != 0;
        if !complete {
            self.detect_phases(attrs, scan);
        }

        state.mother_brain = complete;
        state.mother_brain_phase1 = self.sticky.phase1 || complete;
        state.mother_brain_phase2 = self.sticky.phase2 || complete;
        state.stage = FinalBossStage::from_facts(
            state.mother_brain_phase1,
            state.mother_brain_phase2,
            complete,
        );
        state.evacuation_reached = (self.sticky.any() || complete)
            && self.thresholds.in_escape_window(attrs);

        self.report_changes(&state);
        self.last = Some(state);
        state
    }

    fn detect_phases(&mut self, attrs: &GameStateAttributes, scan: &ScanWords) {
        let t = &self.thresholds;
        if !t.in_fight_room(attrs) {
            return;
        }
        if !self.sticky.any() && t.save_state_contradiction(attrs) {
            debug!("full resources in fight room, distrusting progress words");
            return;
        }

        if let Some(rule) = t.phase1_rules().iter().find(|r| r.matches(attrs, scan, t)) {
            if !self.sticky.phase1 {
                info!(rule = rule.name, "final boss phase 1 detected");
            }
            self.sticky.phase1 = true;
        }
        if !self.sticky.phase1 {
            return;
        }
        if let Some(rule) = t.phase2_rules().iter().find(|r| r.matches(attrs, scan, t)) {
            if !self.sticky.phase2 {
                info!(rule = rule.name, "final boss phase 2 detected");
            }
            self.sticky.phase2 = true;
        }
    }

    fn clear_sticky(&mut self, reason: ResetReason) {
        info!(
            reason = reason.name(),
            phase1 = self.sticky.phase1,
            phase2 = self.sticky.phase2,
            "clearing sticky final boss flags"
        );
        self.sticky = StickyFlags::default();
        metrics::record_sticky_reset(reason.name());
    }

    fn report_changes(&self, state: &BossPhaseState) {
        let previous = self.last.unwrap_or_default();
        for boss in state.defeated() {
            if !previous.is_defeated(boss) {
                info!(boss = boss.name(), "boss defeated");
                metrics::record_boss_detected(boss.name());
            }
        }
        if state.stage != previous.stage {
            info!(stage = ?state.stage, "final boss stage changed");
        }
        if state.evacuation_reached && !previous.evacuation_reached {
            info!("evacuation reached");
        }
    }

    /// Clears the sticky final boss flags. Idempotent.
    pub fn reset(&mut self) {
        if self.sticky.any() {
            self.clear_sticky(ResetReason::Administrative);
        }
        if let Some(last) = self.last.as_mut() {
            last.clear_phases();
        }
    }

    /// Clears all persistent state so the next tick bootstraps again.
    pub fn rearm_bootstrap(&mut self) {
        self.sticky = StickyFlags::default();
        self.bootstrap_attempted = false;
        self.last = None;
    }
}

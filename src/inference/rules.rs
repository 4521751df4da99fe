//! Boss detection rule tables.
//!
//! Basic bosses are single bits in one flags word. Advanced bosses share
//! bits with unrelated in-progress fights, so each of their rules pairs the
//! bit with a minimum word magnitude. A boss is detected when any one of its
//! rules holds.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::decode::{MemoryField, MemorySnapshot};

/// Memory words consulted by the detection rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScanRole {
    /// Primary defeated-flags word (basic bosses and the completion bit).
    BossFlags,
    NorfairBosses,
    WreckedShipBosses,
    MaridiaBosses,
    /// Final boss primary progress word.
    TourianBosses,
    /// Final boss alternate progress word.
    EventFlags,
}

impl ScanRole {
    /// Every role.
    pub const ALL: [Self; 6] = [
        Self::BossFlags,
        Self::NorfairBosses,
        Self::WreckedShipBosses,
        Self::MaridiaBosses,
        Self::TourianBosses,
        Self::EventFlags,
    ];

    /// Memory range backing this role.
    #[must_use]
    pub const fn field(self) -> MemoryField {
        match self {
            Self::BossFlags => MemoryField::BossFlags,
            Self::NorfairBosses => MemoryField::NorfairBosses,
            Self::WreckedShipBosses => MemoryField::WreckedShipBosses,
            Self::MaridiaBosses => MemoryField::MaridiaBosses,
            Self::TourianBosses => MemoryField::TourianBosses,
            Self::EventFlags => MemoryField::EventFlags,
        }
    }
}

/// Raw scan words for one tick. Unread words count as zero.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScanWords(BTreeMap<ScanRole, u16>);

impl ScanWords {
    /// Extracts every scan word present in a snapshot.
    #[must_use]
    pub fn from_snapshot(snapshot: &MemorySnapshot) -> Self {
        Self(
            ScanRole::ALL
                .iter()
                .filter_map(|role| snapshot.word(role.field()).map(|w| (*role, w)))
                .collect(),
        )
    }

    /// Builder-style setter.
    #[must_use]
    pub fn with(mut self, role: ScanRole, word: u16) -> Self {
        self.0.insert(role, word);
        self
    }

    /// Word for a role, zero when unread.
    #[must_use]
    pub fn get(&self, role: ScanRole) -> u16 {
        self.0.get(&role).copied().unwrap_or_default()
    }
}

/// One conjunction: `word & mask != 0 && word >= minimum`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanRule {
    pub role: ScanRole,
    pub mask: u16,
    pub minimum: u16,
}

impl ScanRule {
    /// Creates a rule.
    #[must_use]
    pub const fn new(role: ScanRole, mask: u16, minimum: u16) -> Self {
        Self {
            role,
            mask,
            minimum,
        }
    }

    /// Evaluates the rule against the tick's scan words.
    #[must_use]
    pub fn matches(&self, scan: &ScanWords) -> bool {
        let word = scan.get(self.role);
        word & self.mask != 0 && word >= self.minimum
    }
}

/// Bosses with a dedicated boolean in the published state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Boss {
    BombTorizo,
    Kraid,
    SporeSpawn,
    Crocomire,
    Phantoon,
    Draygon,
    Ridley,
    GoldenTorizo,
}

impl Boss {
    /// Every boss, in progression order.
    pub const ALL: [Self; 8] = [
        Self::BombTorizo,
        Self::Kraid,
        Self::SporeSpawn,
        Self::Crocomire,
        Self::Phantoon,
        Self::Draygon,
        Self::Ridley,
        Self::GoldenTorizo,
    ];

    /// Stable snake-case name used as JSON key and metric label.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::BombTorizo => "bomb_torizo",
            Self::Kraid => "kraid",
            Self::SporeSpawn => "spore_spawn",
            Self::Crocomire => "crocomire",
            Self::Phantoon => "phantoon",
            Self::Draygon => "draygon",
            Self::Ridley => "ridley",
            Self::GoldenTorizo => "golden_torizo",
        }
    }
}

/// Basic bosses: bit in the [`ScanRole::BossFlags`] word.
pub const BASIC_BOSS_BITS: [(Boss, u16); 3] = [
    (Boss::BombTorizo, 1 << 2),
    (Boss::Kraid, 1 << 8),
    (Boss::SporeSpawn, 1 << 9),
];

/// Final boss "sequence complete" bit in the [`ScanRole::BossFlags`] word.
pub const FINAL_BOSS_COMPLETE_BIT: u16 = 1 << 0;

/// Detection rules for one advanced boss.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdvancedBossRules {
    pub boss: Boss,
    pub rules: Vec<ScanRule>,
}

impl AdvancedBossRules {
    /// Whether any rule holds.
    #[must_use]
    pub fn detected(&self, scan: &ScanWords) -> bool {
        self.rules.iter().any(|r| r.matches(scan))
    }
}

/// Empirically observed advanced-boss rules.
///
/// The minimums separate a finished fight from others that set the same
/// bit mid-fight; Crocomire's word `0x0203` must not read as Ridley.
#[must_use]
pub fn default_advanced_rules() -> Vec<AdvancedBossRules> {
    use ScanRole::{MaridiaBosses, NorfairBosses, TourianBosses, WreckedShipBosses};

    vec![
        AdvancedBossRules {
            boss: Boss::Crocomire,
            rules: vec![ScanRule::new(NorfairBosses, 0x0002, 0x0202)],
        },
        AdvancedBossRules {
            boss: Boss::Phantoon,
            rules: vec![ScanRule::new(WreckedShipBosses, 0x0001, 0x0101)],
        },
        AdvancedBossRules {
            boss: Boss::Draygon,
            rules: vec![ScanRule::new(MaridiaBosses, 0x0001, 0x0301)],
        },
        AdvancedBossRules {
            boss: Boss::Ridley,
            rules: vec![
                ScanRule::new(NorfairBosses, 0x0001, 0x0401),
                ScanRule::new(TourianBosses, 0x0200, 0x0201),
            ],
        },
        AdvancedBossRules {
            boss: Boss::GoldenTorizo,
            rules: vec![ScanRule::new(NorfairBosses, 0x0004, 0x0204)],
        },
    ]
}

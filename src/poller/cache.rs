//! Shared cache published by the poll loop.
//!
//! The cache and the inference engine sit behind one `std::sync::Mutex`.
//! Critical sections are short and synchronous and never span an `.await`.
//! Readers get a structural copy; the poll loop is the only regular writer,
//! and the administrative resets take the same lock.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;

use crate::decode::GameStateAttributes;
use crate::inference::{BossPhaseState, InferenceEngine, ScanWords};
use crate::transport::SessionStatus;

/// Last published state plus link info and poll counters.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Cache {
    /// Last accepted attributes.
    pub stats: Option<GameStateAttributes>,
    /// Last inferred boss and phase facts.
    pub bosses: Option<BossPhaseState>,
    /// Whether the emulator answered the last version query.
    pub connected: bool,
    /// Whether a supported game session is running.
    pub session_active: bool,
    pub emulator_version: Option<String>,
    pub status_line: Option<String>,
    pub game_title: Option<String>,
    /// Ticks that ran to completion.
    pub tick_count: u64,
    /// Ticks that failed and were backed off.
    pub error_count: u64,
    /// Ticks whose attributes were rejected by sanity bounds.
    pub validation_rejected: u64,
    pub last_error: Option<String>,
    pub last_update: Option<DateTime<Utc>>,
    /// Configured poll interval in milliseconds.
    pub poll_interval_ms: u64,
}

impl Cache {
    /// Whether any game data has been published.
    #[must_use]
    pub const fn has_game_data(&self) -> bool {
        self.stats.is_some()
    }
}

/// Link state observed at the start of a tick.
#[derive(Debug, Clone, Default)]
pub struct LinkInfo {
    pub connected: bool,
    pub version: Option<String>,
    pub session: SessionStatus,
}

/// Attribute outcome of one tick.
#[derive(Debug, Clone)]
pub enum TickData {
    /// Nothing read: no session or no stats block.
    Empty,
    /// Attributes failed sanity bounds; previous values stay.
    Rejected,
    /// Attributes accepted, with the scan words for inference.
    Decoded(GameStateAttributes, ScanWords),
}

#[derive(Debug)]
struct Shared {
    cache: Cache,
    engine: InferenceEngine,
}

/// Cloneable handle to the shared cache and engine.
#[derive(Debug, Clone)]
pub struct TrackerHandle {
    inner: Arc<Mutex<Shared>>,
}

impl TrackerHandle {
    /// Creates an empty cache around `engine`.
    #[must_use]
    pub fn new(engine: InferenceEngine, poll_interval: Duration) -> Self {
        let cache = Cache {
            poll_interval_ms: u64::try_from(poll_interval.as_millis()).unwrap_or(u64::MAX),
            ..Cache::default()
        };
        Self {
            inner: Arc::new(Mutex::new(Shared { cache, engine })),
        }
    }

    /// Locks the shared state, recovering from poisoning.
    fn lock(&self) -> MutexGuard<'_, Shared> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Structural copy of the current cache.
    #[must_use]
    pub fn snapshot(&self) -> Cache {
        self.lock().cache.clone()
    }

    /// Publishes one completed tick.
    ///
    /// Inference runs here, under the lock, so resets and publication can
    /// never interleave. Returns the inferred facts when attributes were
    /// accepted.
    pub fn publish(&self, link: LinkInfo, data: TickData) -> Option<BossPhaseState> {
        let mut shared = self.lock();
        let Shared { cache, engine } = &mut *shared;

        cache.connected = link.connected;
        cache.emulator_version = link.version;
        cache.session_active = link.session.active;
        cache.status_line = link.session.status_line;
        cache.game_title = link.session.title;
        cache.tick_count += 1;
        cache.last_update = Some(Utc::now());

        match data {
            TickData::Empty => None,
            TickData::Rejected => {
                cache.validation_rejected += 1;
                None
            }
            TickData::Decoded(attrs, scan) => {
                let bosses = engine.infer(&attrs, &scan);
                cache.stats = Some(attrs);
                cache.bosses = Some(bosses);
                Some(bosses)
            }
        }
    }

    /// Records a failed tick.
    pub fn record_error(&self, message: String) {
        let mut shared = self.lock();
        shared.cache.error_count += 1;
        shared.cache.last_error = Some(message);
    }

    /// Clears the sticky final boss flags. Idempotent.
    pub fn reset_boss_state(&self) {
        let mut shared = self.lock();
        shared.engine.reset();
        if let Some(bosses) = shared.cache.bosses.as_mut() {
            bosses.clear_phases();
        }
        info!("final boss state reset");
    }

    /// Clears cached attributes and boss facts and re-arms bootstrap.
    pub fn reset_cache(&self) {
        let mut shared = self.lock();
        shared.cache.stats = None;
        shared.cache.bosses = None;
        shared.engine.rearm_bootstrap();
        info!("cache reset, inference will bootstrap on next tick");
    }

    /// Whether the engine still has to bootstrap.
    #[must_use]
    pub fn awaiting_bootstrap(&self) -> bool {
        !self.lock().engine.bootstrap_attempted()
    }

    /// Current sticky flags, for diagnostics.
    #[must_use]
    pub fn sticky(&self) -> crate::inference::StickyFlags {
        self.lock().engine.sticky()
    }
}

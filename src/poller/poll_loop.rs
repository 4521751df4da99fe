//! Background poll loop.
//!
//! The single writer of the cache. Each tick connects if needed, checks the
//! session, captures and decodes memory, and publishes through the
//! [`TrackerHandle`]. Errors and panics stop at the tick boundary.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::FutureExt;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::cache::{Cache, LinkInfo, TickData, TrackerHandle};
use super::capture::capture;
use crate::decode::{self, MemorySnapshot};
use crate::error::PollError;
use crate::inference::ScanWords;
use crate::observability::metrics;
use crate::transport::{MemoryTransport, SessionStatus, default_title_keywords};

/// Default pause between tick starts.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Default pause after a failed tick.
pub const DEFAULT_ERROR_BACKOFF: Duration = Duration::from_secs(1);

/// Poll loop settings.
#[derive(Debug, Clone)]
pub struct PollConfig {
    pub interval: Duration,
    pub backoff: Duration,
    /// Title keywords identifying a supported session.
    pub title_keywords: Vec<String>,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            backoff: DEFAULT_ERROR_BACKOFF,
            title_keywords: default_title_keywords(),
        }
    }
}

/// What one successful tick observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// The emulator did not answer.
    Disconnected,
    /// The emulator answered but no supported game is running.
    NoSession,
    /// A session is running but the stats block could not be read.
    NoData,
    /// Attributes failed sanity bounds.
    Rejected,
    /// Attributes and boss facts were published.
    Published,
}

/// The poll loop: one transport, one cache handle.
pub struct PollLoop {
    transport: Arc<dyn MemoryTransport>,
    handle: TrackerHandle,
    config: PollConfig,
}

impl PollLoop {
    /// Creates a poll loop.
    #[must_use]
    pub fn new(
        transport: Arc<dyn MemoryTransport>,
        handle: TrackerHandle,
        config: PollConfig,
    ) -> Self {
        Self {
            transport,
            handle,
            config,
        }
    }

    /// Handle to the cache this loop publishes into.
    #[must_use]
    pub const fn handle(&self) -> &TrackerHandle {
        &self.handle
    }

    /// Runs one tick.
    ///
    /// # Errors
    ///
    /// Returns [`PollError::TransportUnavailable`] when the transport cannot
    /// be connected. Every other failure is absorbed into the outcome.
    pub async fn tick(&self) -> Result<TickOutcome, PollError> {
        if !self.transport.is_connected() {
            self.transport.connect().await?;
        }

        let version = self.transport.version().await;
        let connected = version.is_some();
        let session = if connected {
            self.transport
                .session_status(&self.config.title_keywords)
                .await
        } else {
            SessionStatus::default()
        };
        metrics::set_link_state(connected, session.active);

        let (outcome, data) = if !connected {
            (TickOutcome::Disconnected, TickData::Empty)
        } else if !session.active {
            (TickOutcome::NoSession, TickData::Empty)
        } else {
            interpret(&capture(self.transport.as_ref()).await)
        };

        self.handle.publish(
            LinkInfo {
                connected,
                version,
                session,
            },
            data,
        );
        Ok(outcome)
    }

    /// Runs one tick and returns the resulting cache.
    ///
    /// # Errors
    ///
    /// Propagates the tick's [`PollError`].
    pub async fn probe(&self) -> Result<Cache, PollError> {
        self.tick().await?;
        Ok(self.handle.snapshot())
    }

    /// Runs ticks until `cancel` fires.
    pub async fn run(self, cancel: CancellationToken) {
        info!(
            interval = ?self.config.interval,
            backoff = ?self.config.backoff,
            "poll loop started"
        );

        while !cancel.is_cancelled() {
            let started = Instant::now();
            let result = AssertUnwindSafe(self.tick())
                .catch_unwind()
                .await
                .unwrap_or_else(|panic| Err(PollError::TickPanicked(panic_message(&*panic))));

            let pause = match result {
                Ok(outcome) => {
                    let elapsed = started.elapsed();
                    metrics::record_tick(elapsed);
                    debug!(?outcome, ?elapsed, "tick complete");
                    self.config.interval.saturating_sub(elapsed)
                }
                Err(e) => {
                    warn!(error = %e, "poll tick failed, backing off");
                    metrics::record_tick_error(e.kind());
                    self.handle.record_error(e.to_string());
                    self.config.backoff
                }
            };

            tokio::select! {
                () = cancel.cancelled() => break,
                () = tokio::time::sleep(pause) => {}
            }
        }

        info!("poll loop stopped");
    }

    /// Spawns [`run`](Self::run) on the current runtime.
    #[must_use]
    pub fn spawn(self, cancel: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(self.run(cancel))
    }
}

/// Turns a captured snapshot into publishable tick data.
fn interpret(snapshot: &MemorySnapshot) -> (TickOutcome, TickData) {
    if !snapshot.has_game_data() {
        return (TickOutcome::NoData, TickData::Empty);
    }
    match decode::decode(snapshot) {
        Ok(attrs) => (
            TickOutcome::Published,
            TickData::Decoded(attrs, ScanWords::from_snapshot(snapshot)),
        ),
        Err(e) => {
            warn!(error = %e, "discarding attributes for this tick");
            metrics::record_validation_rejected();
            (TickOutcome::Rejected, TickData::Rejected)
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(ToString::to_string)
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string())
}

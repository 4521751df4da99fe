//! Memory transport abstraction.
//!
//! Provides the [`MemoryTransport`] trait for exchanging text commands with
//! a running emulator and reading/writing its core memory. The transport has
//! no knowledge of game semantics. Every command either yields a reply or
//! `None`; only [`MemoryTransport::connect`] can fail.

pub mod protocol;
pub mod udp;

pub use protocol::{StatusLine, parse_read_reply, read_command, write_command};
pub use udp::{UdpConfig, UdpTransport};

use crate::error::TransportError;

use std::time::Duration;

/// Result type alias for transport operations.
pub type Result<T> = std::result::Result<T, TransportError>;

/// Default RetroArch network command port.
pub const DEFAULT_EMULATOR_PORT: u16 = 55355;

/// Default timeout for a single command exchange.
pub const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_secs(1);

/// Timeout used while draining stale datagrams before a send.
pub const DEFAULT_DRAIN_TIMEOUT: Duration = Duration::from_millis(10);

/// Title keywords accepted as an active session when no override is configured.
///
/// Aliases cover randomizer and ROM-hack titles that still run the same
/// memory layout.
pub const DEFAULT_TITLE_KEYWORDS: [&str; 5] =
    ["super metroid", "metroid", "smrando", "sm rando", "varia"];

/// Outcome of a session status query.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionStatus {
    /// Whether a matching game session is running.
    pub active: bool,
    /// Raw status reply, if the emulator answered.
    pub status_line: Option<String>,
    /// Game title parsed from the status line.
    pub title: Option<String>,
}

/// Async memory transport for talking to an emulator.
///
/// Implementations serialize their exchanges: at most one command is in
/// flight at a time. Provided methods build on [`send_command`](Self::send_command)
/// so alternative transports (and test doubles) only need the raw exchange.
#[async_trait::async_trait]
pub trait MemoryTransport: Send + Sync {
    /// Opens the underlying channel.
    ///
    /// Safe to call repeatedly; reconnects replace the previous channel.
    async fn connect(&self) -> Result<()>;

    /// Returns whether [`connect`](Self::connect) has succeeded.
    fn is_connected(&self) -> bool;

    /// Sends one command and waits for exactly one reply.
    ///
    /// Returns `None` on timeout or any transport error.
    async fn send_command(&self, command: &str) -> Option<String>;

    /// Reads `length` bytes starting at `address`.
    ///
    /// Replies echoing a different address or byte count are absent.
    async fn read_range(&self, address: u32, length: usize) -> Option<Vec<u8>> {
        let reply = self.send_command(&read_command(address, length)).await?;
        parse_read_reply(&reply, address, length)
    }

    /// Writes `bytes` starting at `address`. Returns `true` on acknowledgement.
    async fn write_range(&self, address: u32, bytes: &[u8]) -> bool {
        if bytes.is_empty() {
            return false;
        }
        self.send_command(&write_command(address, bytes))
            .await
            .is_some_and(|reply| reply.contains(protocol::WRITE_COMMAND))
    }

    /// Queries the emulator version string.
    async fn version(&self) -> Option<String> {
        self.send_command(protocol::VERSION_COMMAND)
            .await
            .map(|reply| reply.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    /// Queries the session status and matches it against `keywords`.
    async fn session_status(&self, keywords: &[String]) -> SessionStatus {
        let Some(line) = self.send_command(protocol::STATUS_COMMAND).await else {
            return SessionStatus::default();
        };
        let parsed = StatusLine::parse(&line);
        SessionStatus {
            active: protocol::session_matches(&line, keywords),
            title: parsed.title,
            status_line: Some(line),
        }
    }
}

/// Returns the default title keywords as owned strings.
#[must_use]
pub fn default_title_keywords() -> Vec<String> {
    DEFAULT_TITLE_KEYWORDS
        .iter()
        .map(ToString::to_string)
        .collect()
}

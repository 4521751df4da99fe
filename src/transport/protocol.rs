//! RetroArch network command text protocol.
//!
//! Commands are single-line ASCII datagrams. Memory replies echo the command
//! name and address, followed by space-separated hex bytes, or `-1` on
//! failure.

use std::fmt::Write as _;

/// Version query command.
pub const VERSION_COMMAND: &str = "VERSION";

/// Session status query command.
pub const STATUS_COMMAND: &str = "GET_STATUS";

/// Core memory read command name.
pub const READ_COMMAND: &str = "READ_CORE_MEMORY";

/// Core memory write command name.
pub const WRITE_COMMAND: &str = "WRITE_CORE_MEMORY";

/// Status keyword reported when no content is loaded.
const CONTENTLESS: &str = "CONTENTLESS";

/// Formats a core memory read command.
#[must_use]
pub fn read_command(address: u32, length: usize) -> String {
    format!("{READ_COMMAND} 0x{address:06X} {length}")
}

/// Formats a core memory write command.
#[must_use]
pub fn write_command(address: u32, bytes: &[u8]) -> String {
    let mut cmd = format!("{WRITE_COMMAND} 0x{address:06X}");
    for b in bytes {
        let _ = write!(cmd, " {b:02X}");
    }
    cmd
}

/// Parses a `READ_CORE_MEMORY` reply to a read of `length` bytes at `address`.
///
/// Returns `None` unless the reply starts with the echoed command name and
/// the requested address, followed by exactly `length` valid hex bytes.
/// A reply echoing another address belongs to an earlier exchange.
#[must_use]
pub fn parse_read_reply(reply: &str, address: u32, length: usize) -> Option<Vec<u8>> {
    let mut tokens = reply.split_whitespace();
    if tokens.next()? != READ_COMMAND {
        return None;
    }
    if parse_echoed_address(tokens.next()?)? != address {
        return None;
    }

    let bytes = tokens
        .map(|t| u8::from_str_radix(t, 16).ok())
        .collect::<Option<Vec<u8>>>()?;
    if bytes.is_empty() || bytes.len() != length {
        return None;
    }
    Some(bytes)
}

/// Parses an echoed hex address, with or without a `0x` prefix.
fn parse_echoed_address(token: &str) -> Option<u32> {
    let digits = token
        .strip_prefix("0x")
        .or_else(|| token.strip_prefix("0X"))
        .unwrap_or(token);
    u32::from_str_radix(digits, 16).ok()
}

/// Returns whether a status reply names an active session of a known title.
///
/// Matching is case-insensitive against every keyword.
#[must_use]
pub fn session_matches(status: &str, keywords: &[String]) -> bool {
    if status.contains(CONTENTLESS) {
        return false;
    }
    let lowered = status.to_lowercase();
    keywords
        .iter()
        .filter(|k| !k.is_empty())
        .any(|k| lowered.contains(&k.to_lowercase()))
}

/// Parsed `GET_STATUS` reply.
///
/// Format: `GET_STATUS <STATE> <system>,<title>,crc32=<hex>`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusLine {
    /// Playback state (`PLAYING`, `PAUSED`, `CONTENTLESS`).
    pub state: Option<String>,
    /// Emulated system identifier.
    pub system: Option<String>,
    /// Loaded content title.
    pub title: Option<String>,
}

impl StatusLine {
    /// Parses a status reply; unknown shapes leave fields empty.
    #[must_use]
    pub fn parse(line: &str) -> Self {
        let rest = line.trim().strip_prefix(STATUS_COMMAND).unwrap_or(line).trim();
        let (state, details) = rest.split_once(' ').unwrap_or((rest, ""));
        let mut fields = details.split(',').map(str::trim);
        let non_empty = |s: Option<&str>| s.filter(|s| !s.is_empty()).map(String::from);

        Self {
            state: non_empty(Some(state)),
            system: non_empty(fields.next()),
            title: non_empty(fields.next()),
        }
    }
}

//! UDP transport for the RetroArch network command interface.
//!
//! One connected datagram socket per transport. Exchanges hold an async
//! mutex for their whole duration so replies can never be matched to the
//! wrong command. A reply that arrives after its command timed out stays
//! in the socket buffer; the next exchange drains it before sending.

use std::net::{SocketAddr, ToSocketAddrs};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::net::UdpSocket;
use tokio::sync::Mutex;
use tracing::{debug, trace};

use super::{
    DEFAULT_COMMAND_TIMEOUT, DEFAULT_DRAIN_TIMEOUT, DEFAULT_EMULATOR_PORT, MemoryTransport, Result,
};
use crate::error::TransportError;
use crate::observability::metrics;

/// Largest datagram payload accepted from the emulator.
const MAX_DATAGRAM_SIZE: usize = 65_507;

/// Upper bound on stale datagrams discarded before one send.
const MAX_DRAINED_PER_SEND: usize = 64;

/// Configuration for the UDP transport.
#[derive(Debug, Clone)]
pub struct UdpConfig {
    /// Emulator command socket address.
    pub emulator_addr: SocketAddr,
    /// Timeout waiting for a reply.
    pub command_timeout: Duration,
    /// Timeout while draining stale replies before a send.
    pub drain_timeout: Duration,
}

impl Default for UdpConfig {
    fn default() -> Self {
        Self {
            emulator_addr: SocketAddr::from(([127, 0, 0, 1], DEFAULT_EMULATOR_PORT)),
            command_timeout: DEFAULT_COMMAND_TIMEOUT,
            drain_timeout: DEFAULT_DRAIN_TIMEOUT,
        }
    }
}

/// Connected socket plus the receive buffer reused across exchanges.
struct Link {
    socket: UdpSocket,
    buf: Vec<u8>,
}

/// Datagram transport implementing [`MemoryTransport`].
pub struct UdpTransport {
    config: UdpConfig,
    link: Mutex<Option<Link>>,
    connected: AtomicBool,
}

impl UdpTransport {
    /// Creates an unconnected transport.
    #[must_use]
    pub fn new(config: UdpConfig) -> Self {
        Self {
            config,
            link: Mutex::new(None),
            connected: AtomicBool::new(false),
        }
    }

    /// Returns the configured emulator address.
    #[must_use]
    pub const fn emulator_addr(&self) -> SocketAddr {
        self.config.emulator_addr
    }

    /// Discards datagrams left over from earlier timed-out exchanges.
    async fn drain_stale(&self, socket: &UdpSocket, buf: &mut [u8]) -> usize {
        let mut drained = 0;
        while drained < MAX_DRAINED_PER_SEND {
            match tokio::time::timeout(self.config.drain_timeout, socket.recv(buf)).await {
                Ok(Ok(_)) => drained += 1,
                Ok(Err(_)) | Err(_) => break,
            }
        }
        drained
    }
}

impl std::fmt::Debug for UdpTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UdpTransport")
            .field("emulator_addr", &self.config.emulator_addr)
            .field("connected", &self.is_connected())
            .finish_non_exhaustive()
    }
}

#[async_trait::async_trait]
impl MemoryTransport for UdpTransport {
    async fn connect(&self) -> Result<()> {
        let local: SocketAddr = if self.config.emulator_addr.is_ipv4() {
            SocketAddr::from(([0, 0, 0, 0], 0))
        } else {
            SocketAddr::from(([0u16; 8], 0))
        };

        let socket = UdpSocket::bind(local)
            .await
            .map_err(|e| TransportError::ConnectionFailed(format!("bind failed: {e}")))?;
        socket
            .connect(self.config.emulator_addr)
            .await
            .map_err(|e| TransportError::ConnectionFailed(format!("connect failed: {e}")))?;

        *self.link.lock().await = Some(Link {
            socket,
            buf: vec![0u8; MAX_DATAGRAM_SIZE],
        });
        self.connected.store(true, Ordering::SeqCst);
        debug!(emulator = %self.config.emulator_addr, "UDP transport connected");
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    async fn send_command(&self, command: &str) -> Option<String> {
        let mut guard = self.link.lock().await;
        let Link { socket, buf } = guard.as_mut()?;

        let drained = self.drain_stale(socket, buf).await;
        if drained > 0 {
            trace!(drained, "discarded stale datagrams");
        }

        if let Err(e) = socket.send(command.as_bytes()).await {
            debug!(command, error = %e, "send failed");
            metrics::record_command(command, "error");
            return None;
        }

        match tokio::time::timeout(self.config.command_timeout, socket.recv(buf)).await {
            Ok(Ok(n)) => {
                metrics::record_command(command, "ok");
                Some(String::from_utf8_lossy(&buf[..n]).trim_end().to_string())
            }
            Ok(Err(e)) => {
                debug!(command, error = %e, "receive failed");
                metrics::record_command(command, "error");
                None
            }
            Err(_) => {
                trace!(command, "command timed out");
                metrics::record_command(command, "timeout");
                None
            }
        }
    }
}

/// Parses an emulator address.
///
/// Accepts:
/// - `55355` → `127.0.0.1:55355`
/// - `:55355` → `127.0.0.1:55355`
/// - `host` → `host:55355`
/// - `host:port` → resolved as-is
///
/// # Errors
///
/// Returns [`TransportError::InvalidAddress`] if the input cannot be resolved.
pub fn parse_emulator_addr(input: &str) -> std::result::Result<SocketAddr, TransportError> {
    let candidate = if let Some(port) = input.strip_prefix(':') {
        format!("127.0.0.1:{port}")
    } else if input.parse::<u16>().is_ok() {
        format!("127.0.0.1:{input}")
    } else if input.contains(':') {
        input.to_string()
    } else {
        format!("{input}:{DEFAULT_EMULATOR_PORT}")
    };

    candidate
        .to_socket_addrs()
        .ok()
        .and_then(|mut addrs| addrs.next())
        .ok_or_else(|| TransportError::InvalidAddress(input.to_string()))
}

//! Memory capture for one tick.

use tracing::trace;

use crate::decode::{MemoryField, MemorySnapshot};
use crate::transport::MemoryTransport;

/// Reads every [`MemoryField`] into a snapshot.
///
/// The stats block goes first; when it fails the remaining reads are
/// skipped since nothing can be decoded without it. Individual failures
/// leave their field absent.
pub async fn capture(transport: &dyn MemoryTransport) -> MemorySnapshot {
    let mut snapshot = MemorySnapshot::new();
    for field in MemoryField::ALL {
        let bytes = transport.read_range(field.address(), field.length()).await;
        if bytes.is_none() {
            trace!(field = field.name(), "read failed");
            if field == MemoryField::Stats {
                return snapshot;
            }
        }
        snapshot.insert(field, bytes);
    }
    snapshot
}

mod common;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::UdpSocket;
use tokio_util::sync::CancellationToken;

use common::FakeEmulator;
use retrotrack::inference::InferenceEngine;
use retrotrack::poller::{PollConfig, PollLoop, TickOutcome, TrackerHandle};
use retrotrack::transport::{MemoryTransport, UdpConfig, UdpTransport};

/// Serves `fake` on an ephemeral UDP port until `cancel` fires.
async fn serve_fake(fake: Arc<FakeEmulator>, cancel: CancellationToken) -> SocketAddr {
    let socket = UdpSocket::bind("127.0.0.1:0").await.unwrap();
    let addr = socket.local_addr().unwrap();
    tokio::spawn(async move {
        let mut buf = vec![0u8; 2048];
        loop {
            let (n, peer) = tokio::select! {
                () = cancel.cancelled() => break,
                received = socket.recv_from(&mut buf) => received.unwrap(),
            };
            let command = String::from_utf8_lossy(&buf[..n]).to_string();
            if let Some(reply) = fake.send_command(&command).await {
                socket.send_to(reply.as_bytes(), peer).await.unwrap();
            }
        }
    });
    addr
}

fn udp_transport(addr: SocketAddr) -> Arc<UdpTransport> {
    Arc::new(UdpTransport::new(UdpConfig {
        emulator_addr: addr,
        command_timeout: Duration::from_millis(500),
        ..UdpConfig::default()
    }))
}

#[tokio::test]
async fn tick_over_real_udp_socket() {
    let fake = Arc::new(FakeEmulator::playing());
    fake.load_mid_game();
    let cancel = CancellationToken::new();
    let addr = serve_fake(fake.clone(), cancel.clone()).await;

    let handle = TrackerHandle::new(InferenceEngine::default(), Duration::from_secs(2));
    let pl = PollLoop::new(udp_transport(addr), handle, PollConfig::default());

    assert_eq!(pl.tick().await.unwrap(), TickOutcome::Published);
    let cache = pl.handle().snapshot();
    assert!(cache.connected);
    assert_eq!(cache.emulator_version.as_deref(), Some("1.19.1"));
    let stats = cache.stats.unwrap();
    assert_eq!(stats.health, 450);
    assert_eq!(stats.missiles, 40);
    assert_eq!(stats.area_name, "Brinstar");

    cancel.cancel();
}

#[tokio::test]
async fn silent_emulator_over_udp_reads_as_disconnected() {
    let fake = Arc::new(FakeEmulator::playing());
    fake.set_silent(true);
    let cancel = CancellationToken::new();
    let addr = serve_fake(fake, cancel.clone()).await;

    let handle = TrackerHandle::new(InferenceEngine::default(), Duration::from_secs(2));
    let pl = PollLoop::new(udp_transport(addr), handle, PollConfig::default());

    assert_eq!(pl.tick().await.unwrap(), TickOutcome::Disconnected);
    assert!(!pl.handle().snapshot().connected);

    cancel.cancel();
}

//! `run` command: poll loop plus HTTP front end.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use super::effective_config;
use crate::api::{self, ApiConfig};
use crate::cli::args::RunArgs;
use crate::config::TrackerConfig;
use crate::error::TrackerError;
use crate::inference::InferenceEngine;
use crate::poller::{PollConfig, PollLoop, TrackerHandle};
use crate::transport::udp::parse_emulator_addr;
use crate::transport::{MemoryTransport, UdpConfig, UdpTransport};

/// Polls the emulator and serves progress until cancelled.
///
/// # Errors
///
/// Returns a config error for an unusable configuration, or an I/O error
/// if the HTTP listener or metrics exporter cannot bind.
pub async fn run(args: &RunArgs, cancel: CancellationToken) -> Result<(), TrackerError> {
    let config = effective_config(&args.link, Some(args))?;

    if let Some(port) = args.metrics_port {
        crate::observability::init_metrics(Some(port))?;
        tracing::info!(port, "Prometheus metrics endpoint started");
    }

    let poll_loop = build_poll_loop(&config)?;
    let handle = poll_loop.handle().clone();

    let api_config = ApiConfig {
        bind_addr: config.http.bind.clone(),
        cors_origin: config.http.cors_origin.clone(),
    };
    let (bound_addr, server) = api::serve(&api_config, handle, cancel.clone()).await?;
    tracing::info!(
        %bound_addr,
        emulator = %config.emulator.address,
        interval = ?config.poll.interval,
        "tracker running"
    );

    let poller = poll_loop.spawn(cancel.clone());
    cancel.cancelled().await;

    for (name, task) in [("poll loop", poller), ("HTTP front end", server)] {
        if let Err(e) = task.await {
            tracing::error!(task = name, error = %e, "task ended abnormally");
        }
    }
    tracing::info!("tracker stopped");
    Ok(())
}

/// Wires transport, inference engine and cache into a poll loop.
pub(crate) fn build_poll_loop(config: &TrackerConfig) -> Result<PollLoop, TrackerError> {
    let transport: Arc<dyn MemoryTransport> = Arc::new(UdpTransport::new(UdpConfig {
        emulator_addr: parse_emulator_addr(&config.emulator.address)?,
        command_timeout: config.emulator.command_timeout,
        ..UdpConfig::default()
    }));

    let engine = InferenceEngine::new(
        config.inference.thresholds.clone(),
        config.inference.advanced_rules(),
    );
    let handle = TrackerHandle::new(engine, config.poll.interval);

    Ok(PollLoop::new(
        transport,
        handle,
        PollConfig {
            interval: config.poll.interval,
            backoff: config.poll.backoff,
            title_keywords: config.session.title_keywords.clone(),
        },
    ))
}

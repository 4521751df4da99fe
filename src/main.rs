//! `retrotrack`: live Super Metroid progress tracker for RetroArch

use clap::Parser;
use tokio_util::sync::CancellationToken;

use retrotrack::cli::args::Cli;
use retrotrack::cli::commands;
use retrotrack::error::ExitCode;
use retrotrack::observability::init_logging;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    init_logging(cli.log_format, cli.verbose, cli.quiet, cli.color);

    let cancel = CancellationToken::new();

    // First signal cancels; a second one forces exit.
    let shutdown = cancel.clone();
    tokio::spawn(async move {
        let mut sigterm =
            match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                Ok(signal) => Some(signal),
                Err(e) => {
                    tracing::warn!(error = %e, "failed to register SIGTERM handler");
                    None
                }
            };

        tokio::select! {
            _ = tokio::signal::ctrl_c() => {}
            () = recv_sigterm(sigterm.as_mut()) => {}
        }

        eprintln!("\nShutting down gracefully... (press Ctrl+C again to force)");
        shutdown.cancel();

        tokio::select! {
            _ = tokio::signal::ctrl_c() => std::process::exit(ExitCode::INTERRUPTED),
            () = recv_sigterm(sigterm.as_mut()) => std::process::exit(ExitCode::TERMINATED),
        }
    });

    match commands::dispatch(cli, cancel).await {
        Ok(()) => std::process::exit(ExitCode::SUCCESS),
        Err(e) => {
            eprintln!("error: {e}");
            std::process::exit(e.exit_code());
        }
    }
}

/// Waits for SIGTERM, or forever when the handler could not be registered.
async fn recv_sigterm(signal: Option<&mut tokio::signal::unix::Signal>) {
    match signal {
        Some(signal) => {
            signal.recv().await;
        }
        None => std::future::pending().await,
    }
}

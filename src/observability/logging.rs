//! Tracing subscriber setup for the tracker.
//!
//! Everything goes to stderr so `probe --format json` keeps stdout clean.
//! Poll ticks log at `debug`; boss detections, sticky resets and link
//! changes log at `info`. `RETROTRACK_LOG_LEVEL` replaces the computed
//! filter entirely.

use std::io::IsTerminal;
use tracing_subscriber::EnvFilter;

use crate::cli::args::ColorChoice;

/// Environment variable that overrides the verbosity-derived filter.
pub const LOG_LEVEL_ENV: &str = "RETROTRACK_LOG_LEVEL";

/// Dependencies whose request-level chatter stays at `warn` unless
/// verbosity reaches trace.
const QUIET_DEPENDENCIES: [&str; 3] = ["hyper", "hyper_util", "axum"];

/// Log output format on stderr.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum LogFormat {
    #[default]
    Human,
    /// One JSON object per line, for log shippers.
    Json,
}

/// Level applied to the tracker's own events for a `-v` count.
#[must_use]
pub const fn verbosity_to_directive(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "info",
        1 => "debug",
        _ => "trace",
    }
}

/// Filter directives used when the environment does not override them.
///
/// `quiet` keeps only errors. Below trace, HTTP stack crates are held at
/// `warn` so per-request lines do not bury tick logs.
#[must_use]
pub fn default_directives(verbosity: u8, quiet: bool) -> String {
    if quiet {
        return "error".to_string();
    }
    let level = verbosity_to_directive(verbosity);
    if level == "trace" {
        return level.to_string();
    }
    let mut directives = vec![level.to_string()];
    directives.extend(QUIET_DEPENDENCIES.iter().map(|krate| format!("{krate}=warn")));
    directives.join(",")
}

/// Whether ANSI colors are written for the given terminal facts.
const fn ansi_enabled(color: ColorChoice, stderr_is_tty: bool, no_color_set: bool) -> bool {
    match color {
        ColorChoice::Auto => stderr_is_tty && !no_color_set,
        ColorChoice::Always => true,
        ColorChoice::Never => false,
    }
}

/// Installs the global subscriber.
///
/// Later calls are ignored, so tests may call this freely.
pub fn init_logging(format: LogFormat, verbosity: u8, quiet: bool, color: ColorChoice) {
    let filter = EnvFilter::try_from_env(LOG_LEVEL_ENV)
        .unwrap_or_else(|_| EnvFilter::new(default_directives(verbosity, quiet)));

    // Module paths only help once someone is debugging.
    let show_target = verbosity >= 1;

    match format {
        LogFormat::Human => {
            let ansi = ansi_enabled(
                color,
                std::io::stderr().is_terminal(),
                std::env::var_os("NO_COLOR").is_some(),
            );
            let _ = tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(ansi)
                .with_target(show_target)
                .with_writer(std::io::stderr)
                .try_init();
        }
        LogFormat::Json => {
            let _ = tracing_subscriber::fmt()
                .with_env_filter(filter)
                .json()
                .with_current_span(false)
                .with_target(show_target)
                .with_writer(std::io::stderr)
                .try_init();
        }
    }
}

//! Metrics collection for `retrotrack`.
//!
//! Provides Prometheus-compatible metrics with label cardinality protection
//! and typed convenience functions for recording measurements.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

use crate::error::TrackerError;

/// Guard to prevent double-initialization of the metrics recorder.
static METRICS_INITIALIZED: AtomicBool = AtomicBool::new(false);

/// Command names used as metric labels.
///
/// Full command lines carry addresses and byte payloads; only the leading
/// command word is used as a label, and unknown words are bucketed as
/// `"__unknown__"`.
const KNOWN_COMMANDS: [&str; 4] = [
    "VERSION",
    "GET_STATUS",
    "READ_CORE_MEMORY",
    "WRITE_CORE_MEMORY",
];

/// Reduces a command line to a bounded label.
#[must_use]
pub fn sanitize_command_label(command: &str) -> &'static str {
    let word = command.split_whitespace().next().unwrap_or_default();
    KNOWN_COMMANDS
        .iter()
        .find(|known| **known == word)
        .copied()
        .unwrap_or("__unknown__")
}

/// Initializes the global metrics recorder.
///
/// When `port` is `Some`, a Prometheus HTTP listener is started on
/// `127.0.0.1:<port>`.  When `None`, the recorder is installed without
/// an HTTP endpoint.
///
/// # Errors
///
/// Returns `TrackerError::Io` if the recorder or HTTP listener
/// cannot be installed (e.g. port already in use).
pub fn init_metrics(port: Option<u16>) -> Result<(), TrackerError> {
    if METRICS_INITIALIZED.swap(true, Ordering::SeqCst) {
        tracing::debug!("metrics already initialized, skipping");
        return Ok(());
    }
    port.map_or_else(
        || PrometheusBuilder::new().install_recorder().map(|_| ()),
        |p| {
            PrometheusBuilder::new()
                .with_http_listener(([127, 0, 0, 1], p))
                .install()
        },
    )
    .map_err(|e| TrackerError::Io(std::io::Error::other(e.to_string())))?;

    describe_metrics();
    Ok(())
}

/// Registers metric descriptions with the global recorder.
fn describe_metrics() {
    describe_counter!("retrotrack_ticks_total", "Poll ticks completed");
    describe_counter!(
        "retrotrack_tick_errors_total",
        "Poll ticks that failed and were backed off"
    );
    describe_histogram!(
        "retrotrack_tick_duration_ms",
        "Poll tick duration in milliseconds"
    );
    describe_counter!(
        "retrotrack_validation_rejected_total",
        "Ticks whose decoded attributes failed sanity bounds"
    );
    describe_counter!(
        "retrotrack_commands_total",
        "Emulator commands by command word and outcome"
    );
    describe_gauge!(
        "retrotrack_emulator_connected",
        "Whether the emulator answered the last version query"
    );
    describe_gauge!(
        "retrotrack_session_active",
        "Whether a supported game session is running"
    );
    describe_counter!(
        "retrotrack_boss_detections_total",
        "Bosses or phases newly detected as defeated"
    );
    describe_counter!(
        "retrotrack_sticky_resets_total",
        "Sticky final-boss flag resets by reason"
    );
    describe_counter!("retrotrack_api_requests_total", "HTTP API requests");
}

/// Records one emulator command outcome (`ok`, `timeout`, `error`).
pub fn record_command(command: &str, outcome: &'static str) {
    counter!(
        "retrotrack_commands_total",
        "command" => sanitize_command_label(command),
        "outcome" => outcome,
    )
    .increment(1);
}

/// Records a completed tick and its duration.
pub fn record_tick(duration: Duration) {
    counter!("retrotrack_ticks_total").increment(1);
    histogram!("retrotrack_tick_duration_ms").record(duration.as_secs_f64() * 1000.0);
}

/// Records a tick that failed at the tick boundary.
pub fn record_tick_error(kind: &'static str) {
    counter!("retrotrack_tick_errors_total", "kind" => kind).increment(1);
}

/// Records a tick whose attributes were rejected.
pub fn record_validation_rejected() {
    counter!("retrotrack_validation_rejected_total").increment(1);
}

/// Sets the connection and session gauges.
pub fn set_link_state(connected: bool, session_active: bool) {
    gauge!("retrotrack_emulator_connected").set(f64::from(u8::from(connected)));
    gauge!("retrotrack_session_active").set(f64::from(u8::from(session_active)));
}

/// Records a newly detected boss or phase.
///
/// Boss names come from the fixed detection tables, never from the wire.
pub fn record_boss_detected(boss: &'static str) {
    counter!("retrotrack_boss_detections_total", "boss" => boss).increment(1);
}

/// Records a sticky flag reset.
pub fn record_sticky_reset(reason: &'static str) {
    counter!("retrotrack_sticky_resets_total", "reason" => reason).increment(1);
}

/// Records an HTTP API request.
pub fn record_api_request(endpoint: &'static str) {
    counter!("retrotrack_api_requests_total", "endpoint" => endpoint).increment(1);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_known_commands() {
        for command in &KNOWN_COMMANDS {
            assert_eq!(sanitize_command_label(command), *command);
        }
        assert_eq!(
            sanitize_command_label("READ_CORE_MEMORY 0x7E09A2 54"),
            "READ_CORE_MEMORY"
        );
    }

    #[test]
    fn sanitize_unknown_command() {
        assert_eq!(sanitize_command_label("QUIT"), "__unknown__");
        assert_eq!(sanitize_command_label(""), "__unknown__");
        assert_eq!(sanitize_command_label(&"x".repeat(10_000)), "__unknown__");
    }

    #[test]
    fn record_functions_do_not_panic_without_recorder() {
        // metrics macros silently no-op when no global recorder is installed
        record_command("VERSION", "ok");
        record_tick(Duration::from_millis(42));
        record_tick_error("panic");
        record_validation_rejected();
        set_link_state(true, false);
        record_boss_detected("kraid");
        record_sticky_reset("new_game");
        record_api_request("stats");
    }
}

//! `probe` command: one tick against the emulator, printed to stdout.

use std::fmt::Write as _;

use super::effective_config;
use super::run::build_poll_loop;
use crate::cli::args::{OutputFormat, ProbeArgs};
use crate::error::TrackerError;
use crate::poller::Cache;

/// Runs a single poll tick and prints the resulting cache.
///
/// # Errors
///
/// Returns a config error for an unusable configuration, or a poll error
/// if the transport cannot be opened.
pub async fn run(args: &ProbeArgs) -> Result<(), TrackerError> {
    let config = effective_config(&args.link, None)?;
    let poll_loop = build_poll_loop(&config)?;
    let cache = poll_loop.probe().await?;

    match args.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&cache)?),
        OutputFormat::Human => print!("{}", render_human(&cache)),
    }
    Ok(())
}

/// Plain-text summary of a cache snapshot.
fn render_human(cache: &Cache) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "emulator:  {}",
        if cache.connected {
            cache.emulator_version.as_deref().unwrap_or("connected")
        } else {
            "not responding"
        }
    );
    let _ = writeln!(
        out,
        "session:   {}",
        match (&cache.game_title, cache.session_active) {
            (Some(title), true) => title.as_str(),
            (None, true) => "active",
            (_, false) => "no supported game",
        }
    );

    let Some(stats) = &cache.stats else {
        let _ = writeln!(out, "stats:     none");
        return out;
    };
    let _ = writeln!(out, "health:    {}/{}", stats.health, stats.max_health);
    let _ = writeln!(
        out,
        "missiles:  {}/{}  supers: {}/{}  power bombs: {}/{}",
        stats.missiles,
        stats.max_missiles,
        stats.supers,
        stats.max_supers,
        stats.power_bombs,
        stats.max_power_bombs
    );
    let _ = writeln!(
        out,
        "location:  {} room {:#06X} ({}, {})",
        stats.area_name, stats.room_id, stats.player_x, stats.player_y
    );

    if let Some(bosses) = &cache.bosses {
        let defeated: Vec<&str> = bosses.defeated().map(|b| b.name()).collect();
        let _ = writeln!(
            out,
            "bosses:    {}",
            if defeated.is_empty() {
                "none".to_string()
            } else {
                defeated.join(", ")
            }
        );
        let _ = writeln!(out, "final:     {:?}", bosses.stage);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn human_output_without_link() {
        let text = render_human(&Cache::default());
        assert!(text.contains("not responding"));
        assert!(text.contains("no supported game"));
        assert!(text.contains("stats:     none"));
    }

    #[test]
    fn human_output_with_session() {
        let cache = Cache {
            connected: true,
            session_active: true,
            emulator_version: Some("1.19.1".to_string()),
            game_title: Some("Super Metroid".to_string()),
            ..Cache::default()
        };
        let text = render_human(&cache);
        assert!(text.contains("1.19.1"));
        assert!(text.contains("Super Metroid"));
    }
}

//! Semantic validation of a deserialized [`TrackerConfig`].
//!
//! All issues are collected rather than stopping at the first one.

use std::collections::HashSet;

use axum::http::HeaderValue;

use super::schema::TrackerConfig;
use crate::api::parse_bind_addr;
use crate::error::{Severity, ValidationIssue};
use crate::inference::InferenceThresholds;
use crate::inference::rules::BASIC_BOSS_BITS;
use crate::transport::udp::parse_emulator_addr;

/// Intervals below this put noticeable load on the emulator.
const MIN_RECOMMENDED_INTERVAL_MS: u128 = 250;

/// Result of configuration validation.
#[derive(Debug, Default)]
pub struct ValidationResult {
    /// Issues that prevent the configuration from being used.
    pub errors: Vec<ValidationIssue>,
    pub warnings: Vec<ValidationIssue>,
}

impl ValidationResult {
    /// Returns `true` if there are any errors.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}

/// Configuration validator.
#[derive(Debug, Default)]
pub struct Validator {
    errors: Vec<ValidationIssue>,
    warnings: Vec<ValidationIssue>,
}

impl Validator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Validates a configuration.
    pub fn validate(&mut self, config: &TrackerConfig) -> ValidationResult {
        self.validate_poll(config);
        self.validate_emulator(config);
        self.validate_session(config);
        self.validate_http(config);
        self.validate_thresholds(&config.inference.thresholds);
        self.validate_advanced_rules(config);

        ValidationResult {
            errors: std::mem::take(&mut self.errors),
            warnings: std::mem::take(&mut self.warnings),
        }
    }

    fn validate_poll(&mut self, config: &TrackerConfig) {
        let poll = &config.poll;
        if poll.interval.is_zero() {
            self.add_error("poll.interval", "must be greater than zero");
        } else if poll.interval.as_millis() < MIN_RECOMMENDED_INTERVAL_MS {
            self.add_warning(
                "poll.interval",
                "intervals under 250ms load the emulator heavily",
            );
        }
        if poll.backoff.is_zero() {
            self.add_error("poll.backoff", "must be greater than zero");
        }
    }

    fn validate_emulator(&mut self, config: &TrackerConfig) {
        let emulator = &config.emulator;
        if let Err(e) = parse_emulator_addr(&emulator.address) {
            self.add_error("emulator.address", &e.to_string());
        }
        if emulator.command_timeout.is_zero() {
            self.add_error("emulator.command_timeout", "must be greater than zero");
        } else if emulator.command_timeout >= config.poll.interval {
            self.add_warning(
                "emulator.command_timeout",
                "timeout is not shorter than the poll interval; slow ticks will run back to back",
            );
        }
    }

    fn validate_session(&mut self, config: &TrackerConfig) {
        let keywords = &config.session.title_keywords;
        if keywords.iter().all(|k| k.trim().is_empty()) {
            self.add_error(
                "session.title_keywords",
                "at least one non-empty keyword is required",
            );
        } else if keywords.iter().any(|k| k.trim().is_empty()) {
            self.add_warning("session.title_keywords", "empty keywords are ignored");
        }
    }

    fn validate_http(&mut self, config: &TrackerConfig) {
        if let Err(e) = parse_bind_addr(&config.http.bind) {
            self.add_error("http.bind", &e.to_string());
        }
        if HeaderValue::from_str(&config.http.cors_origin).is_err() {
            self.add_error("http.cors_origin", "not a valid header value");
        }
    }

    fn validate_thresholds(&mut self, t: &InferenceThresholds) {
        for (name, value) in [
            ("ammo_near_max", t.ammo_near_max),
            ("health_high", t.health_high),
            ("heavy_consumption", t.heavy_consumption),
        ] {
            if !(0.0..=1.0).contains(&value) {
                self.add_error(
                    &format!("inference.thresholds.{name}"),
                    "must be a fraction between 0 and 1",
                );
            }
        }
        if t.fight_zone_x_min > t.fight_zone_x_max {
            self.add_error(
                "inference.thresholds.fight_zone_x_min",
                "must not exceed fight_zone_x_max",
            );
        }
        for (name, rule) in [
            ("phase1_strong", t.phase1_strong),
            ("phase1_weak", t.phase1_weak),
            ("phase2_strong_alt", t.phase2_strong_alt),
        ] {
            if rule.mask == 0 {
                self.add_error(
                    &format!("inference.thresholds.{name}.mask"),
                    "a zero mask never matches",
                );
            }
        }
        if t.escape_windows.is_empty() {
            self.add_warning(
                "inference.thresholds.escape_windows",
                "no escape windows; evacuation is never reported",
            );
        }
        for (i, w) in t.escape_windows.iter().enumerate() {
            if w.x_min > w.x_max || w.y_min > w.y_max {
                self.add_error(
                    &format!("inference.thresholds.escape_windows[{i}]"),
                    "minimum exceeds maximum",
                );
            }
        }
    }

    fn validate_advanced_rules(&mut self, config: &TrackerConfig) {
        let Some(table) = &config.inference.advanced_bosses else {
            return;
        };
        let mut seen = HashSet::new();
        for (i, entry) in table.iter().enumerate() {
            let path = format!("inference.advanced_bosses[{i}]");
            if !seen.insert(entry.boss) {
                self.add_error(&path, &format!("duplicate entry for {}", entry.boss.name()));
            }
            if entry.rules.is_empty() {
                self.add_error(&format!("{path}.rules"), "at least one rule is required");
            }
            for (j, rule) in entry.rules.iter().enumerate() {
                if rule.mask == 0 {
                    self.add_error(
                        &format!("{path}.rules[{j}].mask"),
                        "a zero mask never matches",
                    );
                }
            }
            if BASIC_BOSS_BITS.iter().any(|(boss, _)| *boss == entry.boss) {
                self.add_warning(
                    &path,
                    &format!(
                        "{} is also detected from its flag bit; rules only add detections",
                        entry.boss.name()
                    ),
                );
            }
        }
    }

    fn add_error(&mut self, path: &str, message: &str) {
        self.errors.push(ValidationIssue {
            path: path.to_string(),
            message: message.to_string(),
            severity: Severity::Error,
        });
    }

    fn add_warning(&mut self, path: &str, message: &str) {
        self.warnings.push(ValidationIssue {
            path: path.to_string(),
            message: message.to_string(),
            severity: Severity::Warning,
        });
    }
}

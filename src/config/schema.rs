//! Configuration file schema.
//!
//! Every section is optional; missing fields take the built-in defaults.
//! Durations use `humantime` syntax (`"2s"`, `"500ms"`).

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::api::{DEFAULT_BIND_ADDR, DEFAULT_CORS_ORIGIN};
use crate::inference::{AdvancedBossRules, InferenceThresholds, default_advanced_rules};
use crate::poller::{DEFAULT_ERROR_BACKOFF, DEFAULT_POLL_INTERVAL};
use crate::transport::{DEFAULT_COMMAND_TIMEOUT, default_title_keywords};

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TrackerConfig {
    pub poll: PollSettings,
    pub emulator: EmulatorSettings,
    pub session: SessionSettings,
    pub http: HttpSettings,
    pub inference: InferenceSettings,
}

/// `poll:` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PollSettings {
    #[serde(with = "humantime_duration")]
    pub interval: Duration,
    /// Pause after a failed tick.
    #[serde(with = "humantime_duration")]
    pub backoff: Duration,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            backoff: DEFAULT_ERROR_BACKOFF,
        }
    }
}

/// `emulator:` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EmulatorSettings {
    /// `host:port`, `host`, `:port` or `port`.
    pub address: String,
    #[serde(with = "humantime_duration")]
    pub command_timeout: Duration,
}

impl Default for EmulatorSettings {
    fn default() -> Self {
        Self {
            address: "127.0.0.1:55355".to_string(),
            command_timeout: DEFAULT_COMMAND_TIMEOUT,
        }
    }
}

/// `session:` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SessionSettings {
    /// Case-insensitive keywords matched against the status reply.
    pub title_keywords: Vec<String>,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            title_keywords: default_title_keywords(),
        }
    }
}

/// `http:` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HttpSettings {
    pub bind: String,
    pub cors_origin: String,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            bind: DEFAULT_BIND_ADDR.to_string(),
            cors_origin: DEFAULT_CORS_ORIGIN.to_string(),
        }
    }
}

/// `inference:` section.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct InferenceSettings {
    pub thresholds: InferenceThresholds,
    /// Replaces the built-in advanced-boss rule table when present.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub advanced_bosses: Option<Vec<AdvancedBossRules>>,
}

impl InferenceSettings {
    /// Effective advanced-boss rules.
    #[must_use]
    pub fn advanced_rules(&self) -> Vec<AdvancedBossRules> {
        self.advanced_bosses
            .clone()
            .unwrap_or_else(default_advanced_rules)
    }
}

/// Serde adapter for `humantime` durations.
mod humantime_duration {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&humantime::format_duration(*value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let raw = String::deserialize(deserializer)?;
        humantime::parse_duration(&raw).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inference::{Boss, ScanRole, ScanRule};

    #[test]
    fn empty_document_is_all_defaults() {
        let config: TrackerConfig = serde_yaml::from_str("{}").unwrap();
        assert_eq!(config, TrackerConfig::default());
        assert_eq!(config.poll.interval, Duration::from_secs(2));
        assert_eq!(config.inference.advanced_rules().len(), 5);
    }

    #[test]
    fn durations_use_humantime() {
        let config: TrackerConfig =
            serde_yaml::from_str("poll:\n  interval: 500ms\n  backoff: 3s\n").unwrap();
        assert_eq!(config.poll.interval, Duration::from_millis(500));
        assert_eq!(config.poll.backoff, Duration::from_secs(3));
    }

    #[test]
    fn bad_duration_rejected() {
        assert!(serde_yaml::from_str::<TrackerConfig>("poll:\n  interval: soon\n").is_err());
    }

    #[test]
    fn unknown_fields_rejected() {
        assert!(serde_yaml::from_str::<TrackerConfig>("polling: {}\n").is_err());
        assert!(serde_yaml::from_str::<TrackerConfig>("http:\n  port: 80\n").is_err());
    }

    #[test]
    fn advanced_rule_override() {
        let yaml = r"
inference:
  advanced_bosses:
    - boss: phantoon
      rules:
        - { role: wrecked_ship_bosses, mask: 1, minimum: 257 }
";
        let config: TrackerConfig = serde_yaml::from_str(yaml).unwrap();
        let rules = config.inference.advanced_rules();
        assert_eq!(rules.len(), 1);
        assert_eq!(rules[0].boss, Boss::Phantoon);
        assert_eq!(
            rules[0].rules,
            vec![ScanRule::new(ScanRole::WreckedShipBosses, 0x0001, 0x0101)]
        );
    }

    #[test]
    fn round_trips_through_yaml() {
        let config = TrackerConfig::default();
        let text = serde_yaml::to_string(&config).unwrap();
        let back: TrackerConfig = serde_yaml::from_str(&text).unwrap();
        assert_eq!(back, config);
    }
}

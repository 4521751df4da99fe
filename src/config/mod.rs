//! Configuration file support.
//!
//! An optional YAML file tunes polling, the emulator link, session
//! matching, the HTTP front end and the inference thresholds. CLI flags
//! override file values.

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{ConfigLoader, LoadResult, default_config_path};
pub use schema::{
    EmulatorSettings, HttpSettings, InferenceSettings, PollSettings, SessionSettings,
    TrackerConfig,
};
pub use validation::{ValidationResult, Validator};

//! Error types for `retrotrack`
//!
//! Transport failures never escape the transport boundary (they surface as
//! absent values), so most variants here only appear at process start-up or
//! at the poll-tick boundary, where they are counted and logged.

use std::path::PathBuf;
use thiserror::Error;

// ============================================================================
// Exit Codes
// ============================================================================

/// Exit codes for `retrotrack` CLI operations.
///
/// These codes follow Unix conventions.
pub struct ExitCode;

impl ExitCode {
    /// Successful execution
    pub const SUCCESS: i32 = 0;

    /// General error
    pub const ERROR: i32 = 1;

    /// Configuration error (invalid YAML, validation failure)
    pub const CONFIG_ERROR: i32 = 2;

    /// I/O error (file not found, permission denied, bind failure)
    pub const IO_ERROR: i32 = 3;

    /// Transport error (emulator socket could not be opened)
    pub const TRANSPORT_ERROR: i32 = 4;

    /// Usage error (invalid arguments, missing required options)
    pub const USAGE_ERROR: i32 = 64;

    /// Interrupted by SIGINT (Ctrl+C)
    pub const INTERRUPTED: i32 = 130;

    /// Terminated by SIGTERM
    pub const TERMINATED: i32 = 143;
}

// ============================================================================
// Top-Level Error
// ============================================================================

/// Top-level error type for `retrotrack` operations.
#[derive(Debug, Error)]
pub enum TrackerError {
    /// Configuration loading or validation error
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Memory transport error
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Decoded attributes failed sanity bounds
    #[error(transparent)]
    Decode(#[from] DecodeError),

    /// A poll tick failed
    #[error(transparent)]
    Poll(#[from] PollError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML parsing error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl TrackerError {
    /// Returns the appropriate exit code for this error.
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::Config(_) | Self::Json(_) | Self::Yaml(_) => ExitCode::CONFIG_ERROR,
            Self::Transport(_) => ExitCode::TRANSPORT_ERROR,
            Self::Decode(_) | Self::Poll(_) => ExitCode::ERROR,
            Self::Io(_) => ExitCode::IO_ERROR,
        }
    }
}

// ============================================================================
// Configuration Errors
// ============================================================================

/// Configuration loading and validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// YAML parsing failed
    #[error("parse error in {path}: {message}")]
    ParseError {
        /// Path to the configuration file
        path: PathBuf,
        /// Line number where the error occurred (if available)
        line: Option<usize>,
        /// Error message from the parser
        message: String,
    },

    /// Configuration validation failed
    #[error("validation failed for {path}")]
    ValidationError {
        /// Path to the configuration file
        path: String,
        /// List of validation issues found
        errors: Vec<ValidationIssue>,
    },

    /// Referenced configuration file not found
    #[error("file not found: {path}")]
    MissingFile {
        /// Path to the missing file
        path: PathBuf,
    },

    /// Configuration file exceeds the size limit
    #[error("config file {path} is {size} bytes (limit: {limit})")]
    TooLarge {
        /// Path to the configuration file
        path: PathBuf,
        /// Actual size in bytes
        size: usize,
        /// Configured limit in bytes
        limit: usize,
    },

    /// Field has an invalid value
    #[error("invalid value for '{field}': got '{value}', expected {expected}")]
    InvalidValue {
        /// Name of the field with invalid value
        field: String,
        /// The actual value provided
        value: String,
        /// Description of what was expected
        expected: String,
    },

    /// Environment variable referenced in configuration is not set
    #[error("environment variable '{var}' not set (referenced at {location})")]
    EnvVarNotSet {
        /// Name of the environment variable
        var: String,
        /// Location in the configuration where it was referenced
        location: String,
    },
}

// ============================================================================
// Validation Types
// ============================================================================

/// A single validation issue found during configuration validation.
#[derive(Debug, Clone)]
pub struct ValidationIssue {
    /// Path to the problematic field (e.g., "inference.thresholds.ammo_near_max")
    pub path: String,
    /// Description of the validation issue
    pub message: String,
    /// Severity level of the issue
    pub severity: Severity,
}

impl std::fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let prefix = match self.severity {
            Severity::Error => "error",
            Severity::Warning => "warning",
        };
        write!(f, "{}: {} at {}", prefix, self.message, self.path)
    }
}

/// Severity level for validation issues.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Error - validation failure that prevents configuration from being used
    Error,
    /// Warning - potential issue that does not prevent configuration loading
    Warning,
}

// ============================================================================
// Transport Errors
// ============================================================================

/// Memory transport errors.
///
/// Only [`connect`](crate::transport::MemoryTransport::connect) returns these;
/// per-command failures are reported as absent values.
#[derive(Debug, Error)]
pub enum TransportError {
    /// I/O error during socket setup
    #[error("transport I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to establish the datagram socket
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// The emulator address could not be parsed
    #[error("invalid emulator address '{0}'")]
    InvalidAddress(String),
}

// ============================================================================
// Decode Errors
// ============================================================================

/// Bit-field decoder outcomes that reject a tick's attributes.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// Health or max health fell outside the sane range
    #[error("validation rejected: {field} = {value} outside [0, {max}]")]
    ValidationRejected {
        /// Name of the offending field
        field: &'static str,
        /// Decoded value
        value: u16,
        /// Inclusive upper bound
        max: u16,
    },
}

// ============================================================================
// Poll Errors
// ============================================================================

/// Failures caught at the poll-tick boundary.
#[derive(Debug, Error)]
pub enum PollError {
    /// The transport could not be (re)connected
    #[error("transport unavailable: {0}")]
    TransportUnavailable(#[from] TransportError),

    /// A tick panicked; the panic payload is captured as text
    #[error("tick panicked: {0}")]
    TickPanicked(String),
}

impl PollError {
    /// Short label for metrics.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::TransportUnavailable(_) => "transport",
            Self::TickPanicked(_) => "panic",
        }
    }
}

// ============================================================================
// Result Type Alias
// ============================================================================

/// Result type alias for `retrotrack` operations.
pub type Result<T> = std::result::Result<T, TrackerError>;

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes() {
        assert_eq!(ExitCode::SUCCESS, 0);
        assert_eq!(ExitCode::ERROR, 1);
        assert_eq!(ExitCode::CONFIG_ERROR, 2);
        assert_eq!(ExitCode::IO_ERROR, 3);
        assert_eq!(ExitCode::TRANSPORT_ERROR, 4);
        assert_eq!(ExitCode::USAGE_ERROR, 64);
        assert_eq!(ExitCode::INTERRUPTED, 130);
        assert_eq!(ExitCode::TERMINATED, 143);
    }

    #[test]
    fn test_config_error_exit_code() {
        let err: TrackerError = ConfigError::MissingFile {
            path: PathBuf::from("/test"),
        }
        .into();
        assert_eq!(err.exit_code(), ExitCode::CONFIG_ERROR);
    }

    #[test]
    fn test_transport_error_exit_code() {
        let err: TrackerError = TransportError::ConnectionFailed("test".to_string()).into();
        assert_eq!(err.exit_code(), ExitCode::TRANSPORT_ERROR);
    }

    #[test]
    fn test_poll_error_exit_code() {
        let err: TrackerError = PollError::TickPanicked("boom".to_string()).into();
        assert_eq!(err.exit_code(), ExitCode::ERROR);
    }

    #[test]
    fn test_io_error_exit_code() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "not found");
        let err: TrackerError = io_err.into();
        assert_eq!(err.exit_code(), ExitCode::IO_ERROR);
    }

    #[test]
    fn test_validation_rejected_display() {
        let err = DecodeError::ValidationRejected {
            field: "health",
            value: 4000,
            max: 1999,
        };
        assert_eq!(
            err.to_string(),
            "validation rejected: health = 4000 outside [0, 1999]"
        );
    }

    #[test]
    fn test_validation_issue_display() {
        let issue = ValidationIssue {
            path: "poll.interval".to_string(),
            message: "must be greater than zero".to_string(),
            severity: Severity::Error,
        };
        assert_eq!(
            issue.to_string(),
            "error: must be greater than zero at poll.interval"
        );
    }

    #[test]
    fn test_validation_issue_warning_display() {
        let issue = ValidationIssue {
            path: "session.title_keywords".to_string(),
            message: "list is empty".to_string(),
            severity: Severity::Warning,
        };
        assert_eq!(
            issue.to_string(),
            "warning: list is empty at session.title_keywords"
        );
    }

    #[test]
    fn test_config_error_env_var_display() {
        let err = ConfigError::EnvVarNotSet {
            var: "EMU_HOST".to_string(),
            location: "transport.emulator_addr".to_string(),
        };
        assert!(err.to_string().contains("EMU_HOST"));
        assert!(err.to_string().contains("transport.emulator_addr"));
    }
}

//! Configuration file loading.
//!
//! Pipeline: size check, `${VAR}` expansion on the raw text, YAML parsing
//! into [`TrackerConfig`], then semantic validation.

use std::path::{Path, PathBuf};

use crate::config::schema::TrackerConfig;
use crate::config::validation::Validator;
use crate::error::{ConfigError, Severity, ValidationIssue};

/// Default maximum configuration file size in bytes.
pub const DEFAULT_MAX_CONFIG_SIZE: usize = 1024 * 1024;

/// Loaded configuration plus non-fatal issues.
#[derive(Debug)]
pub struct LoadResult {
    pub config: TrackerConfig,
    /// Validation warnings and unset-variable notices.
    pub warnings: Vec<ValidationIssue>,
}

/// Configuration loader.
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    max_size: usize,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self {
            max_size: std::env::var("RETROTRACK_MAX_CONFIG_SIZE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_MAX_CONFIG_SIZE),
        }
    }
}

impl ConfigLoader {
    /// Creates a loader with an explicit size limit.
    #[must_use]
    pub const fn with_max_size(max_size: usize) -> Self {
        Self { max_size }
    }

    /// Loads and validates a configuration file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is missing or too large, a required
    /// environment variable is unset, YAML parsing fails, or validation
    /// reports errors.
    pub fn load(&self, path: &Path) -> Result<LoadResult, ConfigError> {
        let metadata = std::fs::metadata(path).map_err(|_| ConfigError::MissingFile {
            path: path.to_path_buf(),
        })?;
        let size = usize::try_from(metadata.len()).unwrap_or(usize::MAX);
        if size > self.max_size {
            return Err(ConfigError::TooLarge {
                path: path.to_path_buf(),
                size,
                limit: self.max_size,
            });
        }

        let raw = std::fs::read_to_string(path).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            line: None,
            message: e.to_string(),
        })?;
        self.load_str(&raw, path)
    }

    /// Loads and validates configuration text; `origin` names it in errors.
    ///
    /// # Errors
    ///
    /// Same as [`load`](Self::load), minus the file checks.
    pub fn load_str(&self, raw: &str, origin: &Path) -> Result<LoadResult, ConfigError> {
        if raw.len() > self.max_size {
            return Err(ConfigError::TooLarge {
                path: origin.to_path_buf(),
                size: raw.len(),
                limit: self.max_size,
            });
        }
        let raw = raw.strip_prefix('\u{feff}').unwrap_or(raw);

        let mut warnings = Vec::new();
        let expanded = expand_env(raw, origin, &mut warnings)?;

        let config: TrackerConfig = if expanded.trim().is_empty() {
            TrackerConfig::default()
        } else {
            serde_yaml::from_str(&expanded).map_err(|e| ConfigError::ParseError {
                path: origin.to_path_buf(),
                line: e.location().map(|l| l.line()),
                message: e.to_string(),
            })?
        };

        let result = Validator::new().validate(&config);
        if result.has_errors() {
            return Err(ConfigError::ValidationError {
                path: origin.display().to_string(),
                errors: result.errors,
            });
        }
        warnings.extend(result.warnings);

        Ok(LoadResult { config, warnings })
    }
}

/// Expands environment references in raw configuration text.
///
/// - `${VAR}` expands to the value, or to nothing with a warning
/// - `${VAR:-default}` falls back to `default`
/// - `${VAR:?message}` fails when unset
/// - `$$` is a literal `$`
fn expand_env(
    raw: &str,
    origin: &Path,
    warnings: &mut Vec<ValidationIssue>,
) -> Result<String, ConfigError> {
    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;

    while let Some(pos) = rest.find('$') {
        out.push_str(&rest[..pos]);
        let after = &rest[pos + 1..];
        if let Some(tail) = after.strip_prefix('$') {
            out.push('$');
            rest = tail;
        } else if let Some(body) = after.strip_prefix('{') {
            let end = body.find('}').ok_or_else(|| ConfigError::ParseError {
                path: origin.to_path_buf(),
                line: Some(raw[..raw.len() - rest.len() + pos].matches('\n').count() + 1),
                message: "unclosed environment variable reference".to_string(),
            })?;
            out.push_str(&resolve_reference(&body[..end], origin, warnings)?);
            rest = &body[end + 1..];
        } else {
            out.push('$');
            rest = after;
        }
    }
    out.push_str(rest);
    Ok(out)
}

fn resolve_reference(
    reference: &str,
    origin: &Path,
    warnings: &mut Vec<ValidationIssue>,
) -> Result<String, ConfigError> {
    let (name, fallback) = match reference.split_once(':') {
        Some((name, modifier)) => (name, Some(modifier)),
        None => (reference, None),
    };
    if let Ok(value) = std::env::var(name) {
        return Ok(value);
    }
    if let Some(default) = fallback.and_then(|m| m.strip_prefix('-')) {
        return Ok(default.to_string());
    }
    if let Some(message) = fallback.and_then(|m| m.strip_prefix('?')) {
        return Err(ConfigError::EnvVarNotSet {
            var: name.to_string(),
            location: if message.is_empty() {
                origin.display().to_string()
            } else {
                message.to_string()
            },
        });
    }
    warnings.push(ValidationIssue {
        path: origin.display().to_string(),
        message: format!("environment variable '{name}' is not set, using empty string"),
        severity: Severity::Warning,
    });
    Ok(String::new())
}

/// Default config file location, if one exists in the working directory.
#[must_use]
pub fn default_config_path() -> Option<PathBuf> {
    ["retrotrack.yaml", "retrotrack.yml"]
        .iter()
        .map(PathBuf::from)
        .find(|p| p.is_file())
}

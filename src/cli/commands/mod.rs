//! CLI command dispatch and handlers.
//!
//! Routes parsed CLI arguments to the appropriate command handler.

pub mod completions;
pub mod probe;
pub mod run;
pub mod validate;
pub mod version;

use tokio_util::sync::CancellationToken;

use crate::cli::args::{Cli, Commands, LinkArgs, RunArgs};
use crate::config::{ConfigLoader, TrackerConfig, Validator, default_config_path};
use crate::error::{ConfigError, TrackerError};

/// Dispatch a parsed CLI invocation to the appropriate command handler.
///
/// # Errors
///
/// Returns an error if the dispatched command handler fails.
pub async fn dispatch(cli: Cli, cancel: CancellationToken) -> Result<(), TrackerError> {
    match cli.command {
        Commands::Run(args) => run::run(&args, cancel).await,
        Commands::Probe(args) => probe::run(&args).await,
        Commands::Validate(args) => validate::run(&args),
        Commands::Completions(args) => {
            completions::run(&args);
            Ok(())
        }
        Commands::Version(args) => {
            version::run(&args);
            Ok(())
        }
    }
}

/// Loads the effective configuration for a command.
///
/// The file named by `--config` wins; otherwise `retrotrack.yaml` in the
/// working directory is used when present, else the built-in defaults.
/// CLI overrides are applied afterwards and the result is validated again.
///
/// # Errors
///
/// Returns a config error if loading fails or the overridden configuration
/// does not validate.
pub(crate) fn effective_config(
    link: &LinkArgs,
    run: Option<&RunArgs>,
) -> Result<TrackerConfig, ConfigError> {
    let mut config = match link.config.clone().or_else(default_config_path) {
        Some(path) => {
            tracing::info!(config = %path.display(), "loading configuration");
            let load_result = ConfigLoader::default().load(&path)?;
            for warning in &load_result.warnings {
                tracing::warn!(location = %warning.path, "{}", warning.message);
            }
            load_result.config
        }
        None => {
            tracing::debug!("no configuration file, using defaults");
            TrackerConfig::default()
        }
    };

    let mut overridden = false;
    if let Some(ref emulator) = link.emulator {
        config.emulator.address.clone_from(emulator);
        overridden = true;
    }
    if let Some(timeout) = link.command_timeout {
        config.emulator.command_timeout = timeout;
        overridden = true;
    }
    if !link.title_keywords.is_empty() {
        config.session.title_keywords.clone_from(&link.title_keywords);
        overridden = true;
    }
    if let Some(args) = run {
        if let Some(ref bind) = args.http {
            config.http.bind.clone_from(bind);
            overridden = true;
        }
        if let Some(interval) = args.poll_interval {
            config.poll.interval = interval;
            overridden = true;
        }
        if let Some(backoff) = args.backoff {
            config.poll.backoff = backoff;
            overridden = true;
        }
        if let Some(ref origin) = args.cors_origin {
            config.http.cors_origin.clone_from(origin);
            overridden = true;
        }
    }

    if overridden {
        let result = Validator::new().validate(&config);
        if result.has_errors() {
            return Err(ConfigError::ValidationError {
                path: "<command line>".to_string(),
                errors: result.errors,
            });
        }
    }
    Ok(config)
}

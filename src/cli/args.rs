//! CLI argument definitions.
//!
//! All Clap derive structs for `retrotrack` command-line parsing. Every
//! option with a file counterpart overrides the config file value.

use std::path::PathBuf;
use std::time::Duration;

use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};

use crate::observability::LogFormat;

// ============================================================================
// Root CLI
// ============================================================================

/// Live Super Metroid progress tracker for RetroArch.
#[derive(Parser, Debug)]
#[command(name = "retrotrack", author, version, about)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity (-v debug, -vv trace).
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all non-error output.
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Color output control.
    #[arg(long, default_value = "auto", global = true, env = "RETROTRACK_COLOR")]
    pub color: ColorChoice,

    /// Log output format.
    #[arg(
        long,
        default_value = "human",
        global = true,
        env = "RETROTRACK_LOG_FORMAT"
    )]
    pub log_format: LogFormat,
}

/// Top-level subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Poll the emulator and serve progress over HTTP.
    Run(RunArgs),

    /// Run a single poll tick and print the result.
    Probe(ProbeArgs),

    /// Validate configuration files without starting anything.
    Validate(ValidateArgs),

    /// Generate shell completion scripts.
    Completions(CompletionsArgs),

    /// Display version information.
    Version(VersionArgs),
}

// ============================================================================
// Shared Options
// ============================================================================

/// Emulator link options shared by `run` and `probe`.
#[derive(Args, Debug, Clone, Default)]
pub struct LinkArgs {
    /// Path to YAML configuration file.
    #[arg(short, long, env = "RETROTRACK_CONFIG")]
    pub config: Option<PathBuf>,

    /// Emulator command address (`host:port`, `host`, `:port` or `port`).
    #[arg(long, env = "RETROTRACK_EMULATOR")]
    pub emulator: Option<String>,

    /// Timeout for one emulator command, e.g. `750ms`.
    #[arg(long, env = "RETROTRACK_COMMAND_TIMEOUT", value_parser = humantime::parse_duration)]
    pub command_timeout: Option<Duration>,

    /// Title keyword identifying a supported session (repeatable).
    #[arg(long = "title-keyword", value_name = "KEYWORD")]
    pub title_keywords: Vec<String>,
}

// ============================================================================
// Commands
// ============================================================================

/// Arguments for `run`.
#[derive(Args, Debug, Clone, Default)]
pub struct RunArgs {
    #[command(flatten)]
    pub link: LinkArgs,

    /// Bind the HTTP front end on `[host:]port`.
    #[arg(long, env = "RETROTRACK_HTTP")]
    pub http: Option<String>,

    /// Pause between tick starts, e.g. `2s`.
    #[arg(long, env = "RETROTRACK_POLL_INTERVAL", value_parser = humantime::parse_duration)]
    pub poll_interval: Option<Duration>,

    /// Pause after a failed tick, e.g. `1s`.
    #[arg(long, env = "RETROTRACK_BACKOFF", value_parser = humantime::parse_duration)]
    pub backoff: Option<Duration>,

    /// Value of the `Access-Control-Allow-Origin` header.
    #[arg(long, env = "RETROTRACK_CORS_ORIGIN")]
    pub cors_origin: Option<String>,

    /// Serve Prometheus metrics on `127.0.0.1:<port>`.
    #[arg(long, env = "RETROTRACK_METRICS_PORT")]
    pub metrics_port: Option<u16>,
}

/// Arguments for `probe`.
#[derive(Args, Debug, Clone)]
pub struct ProbeArgs {
    #[command(flatten)]
    pub link: LinkArgs,

    /// Output format.
    #[arg(short, long, default_value = "json")]
    pub format: OutputFormat,
}

/// Arguments for `validate`.
#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Configuration files to validate.
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    /// Output format.
    #[arg(short, long, default_value = "human")]
    pub format: OutputFormat,

    /// Treat warnings as errors.
    #[arg(long)]
    pub strict: bool,
}

/// Arguments for `completions`.
#[derive(Args, Debug)]
pub struct CompletionsArgs {
    /// Target shell.
    pub shell: clap_complete::Shell,
}

/// Arguments for `version`.
#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Output format.
    #[arg(short, long, default_value = "human")]
    pub format: OutputFormat,
}

// ============================================================================
// CLI-Local Enums
// ============================================================================

/// Color output choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum ColorChoice {
    /// Auto-detect terminal support.
    #[default]
    Auto,
    Always,
    Never,
}

/// Output format for structured output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable output.
    #[default]
    Human,
    Json,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(args).unwrap()
    }

    #[test]
    fn run_with_overrides() {
        let cli = parse(&[
            "retrotrack",
            "run",
            "--emulator",
            "192.168.1.20",
            "--http",
            ":9000",
            "--poll-interval",
            "500ms",
            "--title-keyword",
            "metroid",
            "--title-keyword",
            "hack",
        ]);
        let Commands::Run(args) = cli.command else {
            panic!("expected run");
        };
        assert_eq!(args.link.emulator.as_deref(), Some("192.168.1.20"));
        assert_eq!(args.http.as_deref(), Some(":9000"));
        assert_eq!(args.poll_interval, Some(Duration::from_millis(500)));
        assert_eq!(args.link.title_keywords, vec!["metroid", "hack"]);
    }

    #[test]
    fn bad_duration_rejected() {
        assert!(Cli::try_parse_from(["retrotrack", "run", "--backoff", "later"]).is_err());
    }

    #[test]
    fn probe_defaults_to_json() {
        let Commands::Probe(args) = parse(&["retrotrack", "probe"]).command else {
            panic!("expected probe");
        };
        assert_eq!(args.format, OutputFormat::Json);
    }

    #[test]
    fn validate_requires_files() {
        assert!(Cli::try_parse_from(["retrotrack", "validate"]).is_err());
        let Commands::Validate(args) =
            parse(&["retrotrack", "validate", "a.yaml", "b.yaml", "--strict"]).command
        else {
            panic!("expected validate");
        };
        assert_eq!(args.files.len(), 2);
        assert!(args.strict);
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = parse(&["retrotrack", "version", "-vv", "--log-format", "json"]);
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.log_format, LogFormat::Json);
    }

    #[test]
    fn completions_shell() {
        let Commands::Completions(args) = parse(&["retrotrack", "completions", "zsh"]).command
        else {
            panic!("expected completions");
        };
        assert_eq!(args.shell, clap_complete::Shell::Zsh);
        assert!(Cli::try_parse_from(["retrotrack", "completions", "cmd"]).is_err());
    }

    #[test]
    fn help_output() {
        let err = Cli::try_parse_from(["retrotrack", "--help"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayHelp);
    }

    #[test]
    fn version_output() {
        let err = Cli::try_parse_from(["retrotrack", "--version"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayVersion);
    }
}

//! `validate` command: check configuration files without starting anything.

use serde::Serialize;

use crate::cli::args::{OutputFormat, ValidateArgs};
use crate::config::ConfigLoader;
use crate::error::{ConfigError, Severity, TrackerError, ValidationIssue};

#[derive(Serialize)]
struct FileReport {
    file: String,
    valid: bool,
    errors: Vec<String>,
    warnings: Vec<String>,
}

/// Validates every file in `args.files`.
///
/// All files are checked before returning. With `--strict`, warnings
/// fail validation too.
///
/// # Errors
///
/// Returns the first file's config error when any file is invalid.
pub fn run(args: &ValidateArgs) -> Result<(), TrackerError> {
    let loader = ConfigLoader::default();
    let mut reports = Vec::with_capacity(args.files.len());
    let mut first_error: Option<ConfigError> = None;

    for path in &args.files {
        tracing::info!(file = %path.display(), "validating configuration");
        let file = path.display().to_string();

        let report = match loader.load(path) {
            Ok(result) if args.strict && !result.warnings.is_empty() => {
                let report = FileReport {
                    file: file.clone(),
                    valid: false,
                    errors: Vec::new(),
                    warnings: render(&result.warnings),
                };
                if first_error.is_none() {
                    first_error = Some(ConfigError::ValidationError {
                        path: file,
                        errors: result
                            .warnings
                            .into_iter()
                            .map(|w| ValidationIssue {
                                severity: Severity::Error,
                                ..w
                            })
                            .collect(),
                    });
                }
                report
            }
            Ok(result) => FileReport {
                file,
                valid: true,
                errors: Vec::new(),
                warnings: render(&result.warnings),
            },
            Err(e) => {
                let errors = match &e {
                    ConfigError::ValidationError { errors, .. } => render(errors),
                    other => vec![other.to_string()],
                };
                if first_error.is_none() {
                    first_error = Some(e);
                }
                FileReport {
                    file,
                    valid: false,
                    errors,
                    warnings: Vec::new(),
                }
            }
        };
        reports.push(report);
    }

    match args.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&reports)?),
        OutputFormat::Human => {
            for report in &reports {
                let verdict = if report.valid { "ok" } else { "invalid" };
                println!("{}: {verdict}", report.file);
                for line in report.errors.iter().chain(&report.warnings) {
                    println!("  {line}");
                }
            }
        }
    }

    first_error.map_or(Ok(()), |e| Err(e.into()))
}

fn render(issues: &[ValidationIssue]) -> Vec<String> {
    issues.iter().map(ToString::to_string).collect()
}

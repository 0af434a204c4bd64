//! Command-line surface: argument parsing and error mapping.

use crate::tracing::{LogLevel, TracingFormat};
use clap::{Parser, Subcommand};
use miette::Diagnostic;
use std::path::PathBuf;
use thiserror::Error;

/// Exit codes for the CLI application
pub const EXIT_OK: i32 = 0;
/// Engine or git failure exit code
pub const EXIT_FAILURE: i32 = 1;
/// CLI usage or configuration error exit code
pub const EXIT_CLI: i32 = 2;

/// CLI-specific error types with proper exit code mapping
#[derive(Error, Debug, Diagnostic)]
pub enum CliError {
    /// Usage or configuration error (exit code 2)
    #[error("CLI/configuration error: {message}")]
    #[diagnostic(code(monover::cli::config))]
    Config {
        /// The error message
        message: String,
        /// Optional help text
        #[help]
        help: Option<String>,
    },
    /// A `git` invocation failed (exit code 1)
    #[error("git error: {message}")]
    #[diagnostic(code(monover::cli::git))]
    Git {
        /// The error message
        message: String,
        /// Optional help text
        #[help]
        help: Option<String>,
    },
    /// Release engine error (exit code 1, or 2 for missing configuration)
    #[error(transparent)]
    #[diagnostic(transparent)]
    Release(#[from] monover_release::Error),
}

impl CliError {
    /// Create a new configuration error
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            help: None,
        }
    }

    /// Create a new configuration error with help text
    #[must_use]
    pub fn config_with_help(message: impl Into<String>, help: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            help: Some(help.into()),
        }
    }

    /// Create a new git error
    #[must_use]
    pub fn git(message: impl Into<String>) -> Self {
        Self::Git {
            message: message.into(),
            help: None,
        }
    }

    /// Create a new git error with help text
    #[must_use]
    pub fn git_with_help(message: impl Into<String>, help: impl Into<String>) -> Self {
        Self::Git {
            message: message.into(),
            help: Some(help.into()),
        }
    }
}

/// Result type for CLI commands.
pub type Result<T> = std::result::Result<T, CliError>;

/// Map an error to the process exit code.
#[must_use]
pub const fn exit_code_for(err: &CliError) -> i32 {
    match err {
        CliError::Config { .. }
        | CliError::Release(
            monover_release::Error::ConfigNotFound { .. } | monover_release::Error::Config { .. },
        ) => EXIT_CLI,
        CliError::Git { .. } | CliError::Release(_) => EXIT_FAILURE,
    }
}

/// Changeset-driven versioning for multi-module Go repositories.
#[derive(Parser, Debug)]
#[command(name = "monover", version, about, long_about = None)]
pub struct Cli {
    /// Repository root.
    #[arg(
        long,
        short = 'C',
        global = true,
        default_value = ".",
        help = "Repository root"
    )]
    pub path: PathBuf,

    /// Log level used when RUST_LOG is unset.
    #[arg(long, global = true, value_enum, default_value = "warn")]
    pub log_level: LogLevel,

    /// Log output format.
    #[arg(long, global = true, value_enum, default_value = "pretty")]
    pub log_format: TracingFormat,

    /// Tracing filter directive, overriding RUST_LOG and --log-level.
    #[arg(
        long,
        global = true,
        help = "Tracing filter directive (e.g. monover_release=debug), overrides RUST_LOG"
    )]
    pub log_filter: Option<String>,

    /// Command to run.
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands.
#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Commands {
    /// Create the .changeset directory, config and authoring guide.
    #[command(about = "Create the .changeset directory, config and authoring guide")]
    Init {
        /// Root module identifier (read from go.mod when omitted).
        #[arg(long, help = "Root module identifier (read from go.mod when omitted)")]
        root: Option<String>,
        /// Branch that changed files are compared against.
        #[arg(long, default_value = "main", help = "Base branch for changed-file analysis")]
        base_branch: String,
    },
    /// Record a new changeset.
    #[command(about = "Record a new changeset")]
    Add {
        /// Module and bump type (format: module:bump).
        #[arg(
            long = "module",
            short = 'm',
            value_name = "MODULE:BUMP",
            help = "Module and bump type (format: module:bump, e.g., libA:minor). Use :bump for the root module."
        )]
        modules: Vec<String>,
        /// Summary used in changelogs.
        #[arg(long, short = 's', help = "Summary used in changelogs")]
        summary: String,
    },
    /// Show pending changesets and the release they would produce.
    #[command(about = "Show pending changesets and the release they would produce")]
    Status {
        /// Output in JSON format for CI consumption.
        #[arg(long, help = "Output in JSON format for CI consumption")]
        json: bool,
        /// Skip comparing changed files against the base branch.
        #[arg(long, help = "Skip comparing changed files against the base branch")]
        no_diff: bool,
    },
    /// Compute versions and apply them to go.mod files and changelogs.
    #[command(about = "Compute versions and apply them to go.mod files and changelogs")]
    Version {
        /// Show what would change without making changes.
        #[arg(long, help = "Show what would change without making changes")]
        dry_run: bool,
    },
    /// Create tags for the recorded release plan.
    #[command(about = "Create tags for the recorded release plan")]
    Publish {
        /// Print the tags without creating them.
        #[arg(long, help = "Print the tags without creating them")]
        dry_run: bool,
    },
}

/// Split a `module:bump` argument. The module may be empty for the root.
///
/// # Errors
///
/// Returns a configuration error if the separator is missing.
pub fn parse_module_bump(raw: &str) -> Result<(String, String)> {
    let Some((module, bump)) = raw.rsplit_once(':') else {
        return Err(CliError::config_with_help(
            format!("Invalid module specification '{raw}'"),
            "Use module:bump, e.g. libA:minor",
        ));
    };
    Ok((module.trim().to_string(), bump.trim().to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(args).unwrap()
    }

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_defaults() {
        let cli = parse(&["monover", "version"]);
        assert_eq!(cli.path, PathBuf::from("."));
        assert_eq!(cli.log_level, LogLevel::Warn);
        assert_eq!(cli.log_format, TracingFormat::Pretty);
        assert_eq!(cli.log_filter, None);
        assert_eq!(cli.command, Commands::Version { dry_run: false });
    }

    #[test]
    fn test_parse_add_with_modules() {
        let cli = parse(&[
            "monover", "-C", "/repo", "add", "-m", "libA:minor", "--module", ":patch", "-s",
            "Fix it",
        ]);
        assert_eq!(cli.path, PathBuf::from("/repo"));
        assert_eq!(
            cli.command,
            Commands::Add {
                modules: vec!["libA:minor".to_string(), ":patch".to_string()],
                summary: "Fix it".to_string(),
            }
        );
    }

    #[test]
    fn test_parse_global_flags_after_subcommand() {
        let cli = parse(&["monover", "status", "--json", "--log-level", "debug"]);
        assert_eq!(cli.log_level, LogLevel::Debug);
        assert_eq!(
            cli.command,
            Commands::Status {
                json: true,
                no_diff: false
            }
        );
    }

    #[test]
    fn test_parse_log_filter() {
        let cli = parse(&["monover", "status", "--log-filter", "monover_release=debug"]);
        assert_eq!(cli.log_filter.as_deref(), Some("monover_release=debug"));
    }

    #[test]
    fn test_add_requires_summary() {
        assert!(Cli::try_parse_from(["monover", "add", "-m", "libA:minor"]).is_err());
    }

    #[test]
    fn test_parse_module_bump() {
        assert_eq!(
            parse_module_bump("libA:minor").unwrap(),
            ("libA".to_string(), "minor".to_string())
        );
        assert_eq!(
            parse_module_bump("a/b:major").unwrap(),
            ("a/b".to_string(), "major".to_string())
        );
        assert_eq!(
            parse_module_bump(":patch").unwrap(),
            (String::new(), "patch".to_string())
        );
        assert!(parse_module_bump("libA").is_err());
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(exit_code_for(&CliError::config("bad")), EXIT_CLI);
        assert_eq!(exit_code_for(&CliError::git("no repo")), EXIT_FAILURE);
        let missing = CliError::from(monover_release::Error::ConfigNotFound {
            path: PathBuf::from(".changeset/config.json"),
        });
        assert_eq!(exit_code_for(&missing), EXIT_CLI);
        let cycle = CliError::from(monover_release::Error::DependencyCycle {
            modules: vec!["a".to_string()],
        });
        assert_eq!(exit_code_for(&cycle), EXIT_FAILURE);
    }
}

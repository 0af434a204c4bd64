//! Error types for release planning operations.

use crate::apply::ApplyStep;
use miette::Diagnostic;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for release planning operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while discovering modules, reading changesets,
/// computing releases or applying a release plan.
#[derive(Error, Debug, Diagnostic)]
pub enum Error {
    /// A module manifest was missing or could not be parsed.
    #[error("Module discovery failed at {}: {message}", path.display())]
    #[diagnostic(
        code(monover::release::discovery),
        help("Every module directory needs a readable go.mod with a `module` directive")
    )]
    Discovery {
        /// The error message
        message: String,
        /// The manifest or directory that caused the error
        path: PathBuf,
    },

    /// Failed to parse a changeset file.
    #[error("Invalid changeset format in {}: {message}", display_path(path.as_ref()))]
    #[diagnostic(
        code(monover::release::changeset_parse),
        help("A changeset starts with a `---` header of \"module\": patch|minor|major lines, closed by `---`")
    )]
    ChangesetParse {
        /// The error message
        message: String,
        /// The path to the invalid file
        path: Option<PathBuf>,
    },

    /// Failed to read, write or delete a changeset file.
    #[error("Changeset I/O error on {}: {message}", display_path(path.as_ref()))]
    #[diagnostic(
        code(monover::release::changeset_io),
        help("Check that the .changeset directory exists and is writable")
    )]
    ChangesetIo {
        /// The error message
        message: String,
        /// The path that caused the error
        path: Option<PathBuf>,
        /// The underlying source error
        #[source]
        source: Option<std::io::Error>,
    },

    /// A version string could not be parsed as a semantic version.
    #[error("Invalid version '{version}' for module '{module}'")]
    #[diagnostic(
        code(monover::release::invalid_version),
        help("Versions must follow semantic versioning with a `v` prefix (e.g., v1.2.3)")
    )]
    InvalidVersion {
        /// The module whose version was invalid (empty for the root module)
        module: String,
        /// The invalid version string
        version: String,
    },

    /// The internal dependency graph contains a cycle.
    #[error("Dependency cycle detected between modules: {}", modules.join(", "))]
    #[diagnostic(
        code(monover::release::dependency_cycle),
        help("Break the cycle in the go.mod require directives of the listed modules")
    )]
    DependencyCycle {
        /// Short names of the modules taking part in the cycle
        modules: Vec<String>,
    },

    /// The configuration file is missing.
    #[error("Configuration not found at {}", path.display())]
    #[diagnostic(
        code(monover::release::config_not_found),
        help("Run 'monover init' to create the .changeset directory and config")
    )]
    ConfigNotFound {
        /// Expected location of the config file
        path: PathBuf,
    },

    /// Configuration error.
    #[error("Release configuration error: {message}")]
    #[diagnostic(code(monover::release::config), help("{help}"))]
    Config {
        /// The error message
        message: String,
        /// Help text for the user
        help: String,
    },

    /// Failed to read or write a file (config, changelog, go.mod, manifest).
    #[error("I/O error on {}: {message}", path.display())]
    #[diagnostic(code(monover::release::persistence))]
    Persistence {
        /// The error message
        message: String,
        /// The file that could not be read or written
        path: PathBuf,
        /// The underlying source error
        #[source]
        source: Option<std::io::Error>,
    },

    /// No release manifest exists yet.
    #[error("No release manifest found at {}", path.display())]
    #[diagnostic(
        code(monover::release::manifest_not_found),
        help("Run 'monover version' to compute a release plan first")
    )]
    ManifestNotFound {
        /// Expected location of the manifest
        path: PathBuf,
    },

    /// The release manifest exists but is unreadable.
    #[error("Release manifest at {} is corrupt: {message}", path.display())]
    #[diagnostic(
        code(monover::release::manifest_corrupt),
        help("A previous run left an unusable manifest; delete it and re-run 'monover version'")
    )]
    ManifestCorrupt {
        /// The parse error message
        message: String,
        /// Location of the manifest
        path: PathBuf,
    },

    /// Applying a release plan stopped partway through.
    #[error("Release apply interrupted during {step} (completed: {})", format_steps(completed))]
    #[diagnostic(
        code(monover::release::apply_interrupted),
        help("Each step is safe to re-run; fix the cause and run 'monover version' again")
    )]
    ApplyInterrupted {
        /// The step that failed
        step: ApplyStep,
        /// Steps that finished before the failure
        completed: Vec<ApplyStep>,
        /// The failure
        #[source]
        source: Box<Error>,
    },

    /// Wrapped I/O error.
    #[error("I/O error: {0}")]
    #[diagnostic(code(monover::release::io))]
    Io(#[from] std::io::Error),

    /// Wrapped JSON error.
    #[error("JSON error: {0}")]
    #[diagnostic(code(monover::release::json))]
    Json(#[from] serde_json::Error),
}

fn display_path(path: Option<&PathBuf>) -> String {
    path.map_or_else(|| "<memory>".to_string(), |p| p.display().to_string())
}

fn format_steps(steps: &[ApplyStep]) -> String {
    if steps.is_empty() {
        return "none".to_string();
    }
    steps
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

impl Error {
    /// Create a new discovery error.
    #[must_use]
    pub fn discovery(message: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self::Discovery {
            message: message.into(),
            path: path.into(),
        }
    }

    /// Create a new changeset parse error.
    #[must_use]
    pub fn changeset_parse(message: impl Into<String>, path: Option<PathBuf>) -> Self {
        Self::ChangesetParse {
            message: message.into(),
            path,
        }
    }

    /// Attach a file path to a changeset parse error that was raised without one.
    #[must_use]
    pub fn with_changeset_path(self, file: PathBuf) -> Self {
        match self {
            Self::ChangesetParse {
                message,
                path: None,
            } => Self::ChangesetParse {
                message,
                path: Some(file),
            },
            other => other,
        }
    }

    /// Create a new changeset I/O error.
    #[must_use]
    pub fn changeset_io(message: impl Into<String>, path: Option<PathBuf>) -> Self {
        Self::ChangesetIo {
            message: message.into(),
            path,
            source: None,
        }
    }

    /// Create a new changeset I/O error with source.
    #[must_use]
    pub fn changeset_io_with_source(
        message: impl Into<String>,
        path: Option<PathBuf>,
        source: std::io::Error,
    ) -> Self {
        Self::ChangesetIo {
            message: message.into(),
            path,
            source: Some(source),
        }
    }

    /// Create a new invalid version error.
    #[must_use]
    pub fn invalid_version(module: impl Into<String>, version: impl Into<String>) -> Self {
        Self::InvalidVersion {
            module: module.into(),
            version: version.into(),
        }
    }

    /// Create a new configuration error.
    #[must_use]
    pub fn config(message: impl Into<String>, help: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            help: help.into(),
        }
    }

    /// Create a new persistence error with source.
    #[must_use]
    pub fn persistence(
        message: impl Into<String>,
        path: impl Into<PathBuf>,
        source: std::io::Error,
    ) -> Self {
        Self::Persistence {
            message: message.into(),
            path: path.into(),
            source: Some(source),
        }
    }
}

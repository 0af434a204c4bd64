//! Release planning for multi-module Go repositories.
//!
//! This crate computes the next versions of every module in a repository
//! from human-authored changesets, cascading bumps to dependents, and applies
//! the resulting plan to `go.mod` files, changelogs and a release manifest.
//!
//! # Features
//!
//! - **Changeset Workflow**: Markdown changesets stored in `.changeset/`
//! - **Module Discovery**: Builds the internal dependency graph from `go.mod` files
//! - **Cascading Bumps**: Dependents of a bumped module are released too
//! - **Changelog Generation**: Per-module `CHANGELOG.md` entries grouped by severity
//! - **Resumable Apply**: Plan application as re-runnable steps
//!
//! # Architecture
//!
//! - [`discovery`] and [`gomod`] - Walking the repository and reading `go.mod`
//! - [`graph`] - Module lookup, dependents and topological ordering
//! - [`changeset`] - Changeset parsing and storage
//! - [`plan`] - Release computation
//! - [`version`] and [`tag`] - Version arithmetic and tag naming
//! - [`changelog`] - Changelog generation and formatting
//! - [`manifest`] - Release manifest persistence
//! - [`apply`] - Applying a plan to the working tree
//! - [`affected`] - Mapping changed files to modules
//! - [`config`] - `.changeset/config.json`
//!
//! # Example
//!
//! ```rust,ignore
//! use monover_release::{ChangesetStore, Config, ReleasePlan, discover, latest_versions};
//! use std::path::Path;
//!
//! let root = Path::new(".");
//! let store = ChangesetStore::new(root);
//! let config = Config::load(store.dir())?;
//! let graph = discover(root)?;
//! let versions = latest_versions(["libA/v0.1.0", "libB/v0.1.0"]);
//!
//! let plan = ReleasePlan::compute(store.read_all()?, &graph, &versions, &config)?;
//! for release in &plan.releases {
//!     println!("{}: {} -> {}", release.module, release.previous_version, release.version);
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod affected;
pub mod apply;
pub mod changelog;
pub mod changeset;
pub mod config;
pub mod discovery;
pub mod error;
pub mod gomod;
pub mod graph;
pub mod manifest;
pub mod plan;
pub mod slug;
pub mod tag;
pub mod version;

// Re-export main types
pub use affected::modules_for_files;
pub use apply::{ApplyReport, ApplyStep, ReleaseApplier};
pub use changelog::{ChangelogEntry, update_changelog};
pub use changeset::{Bump, CHANGESETS_DIR, Changeset, ChangesetStore};
pub use config::Config;
pub use discovery::discover;
pub use error::{Error, Result};
pub use graph::{Module, ModuleGraph};
pub use manifest::ReleaseManifest;
pub use plan::{Release, ReleasePlan, ReleaseReason, compute_releases};
pub use tag::{format_tag, latest_versions, parse_tag};
pub use version::{Version, increment};

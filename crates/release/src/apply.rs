//! Applying a release plan to the working tree.
//!
//! Applying a plan touches many plain files and cannot be made atomic. It is
//! split into ordered steps instead, each safe to run again:
//!
//! 1. [`ApplyStep::RewriteDependencies`] pins dependents to the new versions
//!    in every affected `go.mod`. Rewriting to the same versions is a no-op.
//! 2. [`ApplyStep::UpdateChangelogs`] prepends one entry per released module.
//!    A module whose changelog already has an entry for the new version is
//!    skipped.
//! 3. [`ApplyStep::DeleteChangesets`] removes the consumed changesets. Files
//!    already gone are skipped, so a second run only removes what remains.
//! 4. [`ApplyStep::WriteManifest`] records the plan for `publish`.
//!
//! A failure reports the failing step and the steps that completed; running
//! the whole sequence again is the recovery path.

use crate::changelog::{self, CHANGELOG_FILE, ChangelogEntry};
use crate::changeset::ChangesetStore;
use crate::error::{Error, Result};
use crate::gomod::{self, GO_MOD};
use crate::graph::ModuleGraph;
use crate::manifest::ReleaseManifest;
use crate::plan::{Release, ReleasePlan};
use chrono::NaiveDate;
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::PathBuf;
use tracing::{debug, info, info_span};

/// A step of applying a release plan, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ApplyStep {
    /// Rewrite internal version pins in `go.mod` files.
    RewriteDependencies,
    /// Prepend entries to module changelogs.
    UpdateChangelogs,
    /// Delete consumed changeset files.
    DeleteChangesets,
    /// Write the release manifest.
    WriteManifest,
}

impl ApplyStep {
    /// Every step in execution order.
    pub const ALL: [Self; 4] = [
        Self::RewriteDependencies,
        Self::UpdateChangelogs,
        Self::DeleteChangesets,
        Self::WriteManifest,
    ];
}

impl fmt::Display for ApplyStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RewriteDependencies => write!(f, "rewrite-dependencies"),
            Self::UpdateChangelogs => write!(f, "update-changelogs"),
            Self::DeleteChangesets => write!(f, "delete-changesets"),
            Self::WriteManifest => write!(f, "write-manifest"),
        }
    }
}

/// What applying a plan changed, or would change in dry-run mode.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApplyReport {
    /// `go.mod` files whose pins were rewritten.
    pub rewritten_manifests: Vec<PathBuf>,
    /// Changelogs that received a new entry.
    pub updated_changelogs: Vec<PathBuf>,
    /// Changeset files removed.
    pub deleted_changesets: Vec<PathBuf>,
    /// Location of the written release manifest.
    pub manifest_path: Option<PathBuf>,
    /// Steps that ran to completion.
    pub completed: Vec<ApplyStep>,
    /// Whether nothing was written.
    pub dry_run: bool,
}

/// Applies a [`ReleasePlan`] to the repository.
pub struct ReleaseApplier<'a> {
    graph: &'a ModuleGraph,
    store_dir: PathBuf,
    date: NaiveDate,
    dry_run: bool,
}

impl<'a> ReleaseApplier<'a> {
    /// Create an applier writing the release manifest into `store_dir` and
    /// dating changelog entries today.
    #[must_use]
    pub fn new(graph: &'a ModuleGraph, store_dir: impl Into<PathBuf>) -> Self {
        Self {
            graph,
            store_dir: store_dir.into(),
            date: chrono::Local::now().date_naive(),
            dry_run: false,
        }
    }

    /// Set the date used for changelog headings.
    #[must_use]
    pub const fn with_date(mut self, date: NaiveDate) -> Self {
        self.date = date;
        self
    }

    /// Sets dry-run mode.
    #[must_use]
    pub const fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Run every step in order.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ApplyInterrupted`] naming the failing step and the
    /// steps completed before it.
    pub fn run(&self, plan: &ReleasePlan) -> Result<ApplyReport> {
        let mut report = ApplyReport {
            dry_run: self.dry_run,
            ..ApplyReport::default()
        };

        for step in ApplyStep::ALL {
            let span = info_span!("apply_step", step = %step, dry_run = self.dry_run);
            let _guard = span.enter();

            let outcome = match step {
                ApplyStep::RewriteDependencies => self
                    .rewrite_dependencies(&plan.releases)
                    .map(|paths| report.rewritten_manifests = paths),
                ApplyStep::UpdateChangelogs => self
                    .update_changelogs(plan)
                    .map(|paths| report.updated_changelogs = paths),
                ApplyStep::DeleteChangesets => self
                    .delete_changesets(plan)
                    .map(|paths| report.deleted_changesets = paths),
                ApplyStep::WriteManifest => self
                    .write_manifest(&plan.releases)
                    .map(|path| report.manifest_path = Some(path)),
            };

            if let Err(source) = outcome {
                return Err(Error::ApplyInterrupted {
                    step,
                    completed: report.completed,
                    source: Box::new(source),
                });
            }
            info!("Step complete");
            report.completed.push(step);
        }

        Ok(report)
    }

    /// Pin every in-repository requirement of a released module to its new
    /// version. Returns the manifests that changed.
    ///
    /// # Errors
    ///
    /// Returns an error if a `go.mod` cannot be read or written.
    pub fn rewrite_dependencies(&self, releases: &[Release]) -> Result<Vec<PathBuf>> {
        let versions: BTreeMap<String, String> = releases
            .iter()
            .map(|r| (r.module.clone(), r.version.clone()))
            .collect();
        if versions.is_empty() {
            return Ok(Vec::new());
        }

        let root_identifier = &self.graph.root().name;
        let mut rewritten = Vec::new();
        for module in self.graph.all_modules() {
            let path = module.path.join(GO_MOD);
            let content = fs::read_to_string(&path)
                .map_err(|e| Error::persistence("Failed to read go.mod", &path, e))?;
            let updated = gomod::update_requirements(&content, root_identifier, &versions);
            if updated == content {
                continue;
            }

            if !self.dry_run {
                fs::write(&path, updated)
                    .map_err(|e| Error::persistence("Failed to write go.mod", &path, e))?;
            }
            debug!(module = %module.display_name(), "Rewrote dependency pins");
            rewritten.push(path);
        }

        Ok(rewritten)
    }

    /// Prepend a changelog entry for every release. Returns the changelogs
    /// that were updated.
    ///
    /// # Errors
    ///
    /// Returns an error if a changelog cannot be read or written.
    pub fn update_changelogs(&self, plan: &ReleasePlan) -> Result<Vec<PathBuf>> {
        let mut updated = Vec::new();
        for release in &plan.releases {
            let Some(module) = self.graph.find_module(&release.module) else {
                debug!(module = %release.module, "Release has no module directory");
                continue;
            };

            let path = module.path.join(CHANGELOG_FILE);
            match fs::read_to_string(&path) {
                Ok(content) if changelog::contains_heading(&content, &release.version) => {
                    debug!(
                        module = %release.module,
                        version = %release.version,
                        "Changelog already has this release"
                    );
                    continue;
                }
                Ok(_) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(Error::persistence("Failed to read changelog", &path, e)),
            }

            if !self.dry_run {
                let entry = ChangelogEntry::for_release(release, &plan.changesets, self.date);
                changelog::update_changelog(&path, &entry)?;
            }
            updated.push(path);
        }

        Ok(updated)
    }

    /// Delete the plan's changeset files. Files that no longer exist are
    /// skipped. Returns the files removed.
    ///
    /// # Errors
    ///
    /// Returns an error if a changeset has no backing file or cannot be
    /// removed.
    pub fn delete_changesets(&self, plan: &ReleasePlan) -> Result<Vec<PathBuf>> {
        let mut deleted = Vec::new();
        for changeset in &plan.changesets {
            let Some(path) = changeset.file_path.as_ref() else {
                return Err(Error::changeset_io(
                    format!("Changeset '{}' has no backing file", changeset.id),
                    None,
                ));
            };
            if !path.exists() {
                debug!(id = %changeset.id, "Changeset already removed");
                continue;
            }

            if !self.dry_run {
                ChangesetStore::delete(changeset)?;
            }
            deleted.push(path.clone());
        }

        Ok(deleted)
    }

    /// Write the release manifest. Returns its location.
    ///
    /// # Errors
    ///
    /// Returns an error if the manifest cannot be written.
    pub fn write_manifest(&self, releases: &[Release]) -> Result<PathBuf> {
        if self.dry_run {
            return Ok(ReleaseManifest::path(&self.store_dir));
        }
        ReleaseManifest::new(releases.to_vec()).write(&self.store_dir)
    }
}

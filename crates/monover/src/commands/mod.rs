//! Command implementations.
//!
//! Every command returns the text to print on stdout; errors are rendered by
//! `main`.

pub mod add;
pub mod init;
pub mod publish;
pub mod status;
pub mod version;

use crate::cli::{Commands, Result};
use crate::git;
use monover_release::{ChangesetStore, Config, latest_versions};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// An initialized repository: its root, changeset store and config.
pub struct Workspace {
    /// Repository root.
    pub root: PathBuf,
    /// Changeset store under `.changeset/`.
    pub store: ChangesetStore,
    /// Loaded configuration.
    pub config: Config,
}

impl Workspace {
    /// Load the workspace at `root`.
    ///
    /// # Errors
    ///
    /// Returns an error if the config is missing or invalid.
    pub fn load(root: &Path) -> Result<Self> {
        let store = ChangesetStore::new(root);
        let config = Config::load(store.dir())?;
        Ok(Self {
            root: root.to_path_buf(),
            store,
            config,
        })
    }

    /// Latest tagged version of every module.
    ///
    /// # Errors
    ///
    /// Returns an error if tags cannot be listed.
    pub fn current_versions(&self) -> Result<BTreeMap<String, String>> {
        let tags = git::list_tags(&self.root)?;
        Ok(latest_versions(tags.iter().map(String::as_str)))
    }

    /// User-facing label for a module short name.
    #[must_use]
    pub fn module_label<'a>(&'a self, short_name: &'a str) -> &'a str {
        if short_name.is_empty() {
            &self.config.root
        } else {
            short_name
        }
    }
}

/// Run a parsed command against the repository at `root`.
///
/// # Errors
///
/// Returns the command's error.
pub fn execute(command: &Commands, root: &Path) -> Result<String> {
    match command {
        Commands::Init { root: identifier, base_branch } => {
            init::execute(root, identifier.as_deref(), base_branch)
        }
        Commands::Add { modules, summary } => add::execute(root, modules, summary),
        Commands::Status { json, no_diff } => status::execute(root, *json, *no_diff),
        Commands::Version { dry_run } => version::execute(root, *dry_run),
        Commands::Publish { dry_run } => publish::execute(root, *dry_run),
    }
}

//! `monover init`: bootstrap the changeset store.

use crate::cli::{CliError, Result};
use monover_release::changeset::README_FILE;
use monover_release::gomod::{self, GO_MOD};
use monover_release::{ChangesetStore, Config, Error};
use std::fs;
use std::path::Path;
use tracing::info;

const GUIDE: &str = r#"# Changesets

Each Markdown file in this directory describes a pending change and the
version bump it needs. Create one with:

    monover add --module libA:minor --summary "Add streaming reader"

or write it by hand:

    ---
    "libA": minor
    "libB": patch
    ---

    Add streaming reader.

Keys are module paths relative to the root module (an empty key `""` is the
root module itself); values are `patch`, `minor` or `major`.

`monover version` consumes the changesets, updates go.mod files and
changelogs, and records the plan in `release-manifest.json`.
`monover publish` tags the recorded releases.
"#;

fn root_identifier(root: &Path) -> Result<String> {
    let path = root.join(GO_MOD);
    let content = fs::read_to_string(&path).map_err(|e| {
        CliError::config_with_help(
            format!("Cannot read {}: {e}", path.display()),
            "Run init from the repository root or pass --root",
        )
    })?;
    let parsed = gomod::parse(&content).map_err(|message| Error::discovery(message, &path))?;
    Ok(parsed.module)
}

/// Create `.changeset/` with a config and an authoring guide.
///
/// An existing config is left untouched.
///
/// # Errors
///
/// Returns an error if the root module cannot be determined or the files
/// cannot be written.
pub fn execute(root: &Path, identifier: Option<&str>, base_branch: &str) -> Result<String> {
    let store = ChangesetStore::new(root);
    let config_path = Config::path(store.dir());
    if config_path.exists() {
        let config = Config::load(store.dir())?;
        return Ok(format!(
            "Already initialized for {} ({})",
            config.root,
            config_path.display()
        ));
    }

    let identifier = match identifier {
        Some(id) => id.to_string(),
        None => root_identifier(root)?,
    };

    store.ensure_dir()?;
    let guide = store.dir().join(README_FILE);
    if !guide.exists() {
        fs::write(&guide, GUIDE)
            .map_err(|e| Error::persistence("Failed to write changeset guide", &guide, e))?;
    }

    let mut config = Config::for_root(&identifier);
    config.base_branch = base_branch.to_string();
    config.save(store.dir())?;
    info!(root = %identifier, "Initialized changeset store");

    Ok(format!(
        "Initialized {} for {identifier}",
        store.dir().display()
    ))
}

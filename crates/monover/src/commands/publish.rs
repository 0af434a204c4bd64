//! `monover publish`: tag the releases recorded by `version`.

use crate::cli::Result;
use crate::git;
use monover_release::{ChangesetStore, ReleaseManifest};
use std::collections::BTreeSet;
use std::fmt::Write;
use std::path::Path;
use tracing::{info, warn};

/// Create one tag per release in the manifest, then delete the manifest.
///
/// Tags that already exist are skipped, so an interrupted publish can be run
/// again. With `dry_run` no tag is created and the manifest is kept.
///
/// # Errors
///
/// Returns an error if the manifest is missing or corrupt, or if git fails.
pub fn execute(root: &Path, dry_run: bool) -> Result<String> {
    let store = ChangesetStore::new(root);
    let manifest = ReleaseManifest::read(store.dir())?;
    let existing: BTreeSet<String> = git::list_tags(root)?.into_iter().collect();

    let mut created = Vec::new();
    let mut skipped = Vec::new();
    for release in &manifest.releases {
        let tag = release.tag();
        if existing.contains(&tag) {
            warn!(%tag, "Tag already exists, skipping");
            skipped.push(tag);
            continue;
        }
        if !dry_run {
            git::create_tag(root, &tag)?;
            info!(%tag, "Created tag");
        }
        created.push(tag);
    }

    if !dry_run {
        ReleaseManifest::delete(store.dir())?;
    }

    Ok(render(&created, &skipped, dry_run))
}

fn render(created: &[String], skipped: &[String], dry_run: bool) -> String {
    let mut output = String::new();
    if created.is_empty() {
        output.push_str("No new tags");
    } else {
        output.push_str(if dry_run { "Would create tags:" } else { "Created tags:" });
        for tag in created {
            let _ = write!(output, "\n  {tag}");
        }
    }
    if !skipped.is_empty() {
        output.push_str("\nAlready tagged:");
        for tag in skipped {
            let _ = write!(output, "\n  {tag}");
        }
    }
    output
}

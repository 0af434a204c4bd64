//! `monover version`: consume changesets and prepare the release commit.

use super::Workspace;
use crate::cli::Result;
use monover_release::{ApplyReport, ReleaseApplier, ReleasePlan, discover};
use std::fmt::Write;
use std::path::Path;
use tracing::info;

/// Compute the plan from pending changesets and apply it: rewrite `go.mod`
/// pins, update changelogs, delete the changesets and record the release
/// manifest. With `dry_run` nothing is written.
///
/// # Errors
///
/// Returns an error if tags cannot be read, the plan cannot be computed or a
/// step of the apply fails.
pub fn execute(root: &Path, dry_run: bool) -> Result<String> {
    let workspace = Workspace::load(root)?;
    let graph = discover(root)?;
    let changesets = workspace.store.read_all()?;
    if changesets.is_empty() {
        return Ok("No pending changesets".to_string());
    }

    let versions = workspace.current_versions()?;
    let plan = ReleasePlan::compute(changesets, &graph, &versions, &workspace.config)?;
    info!(
        releases = plan.releases.len(),
        changesets = plan.changesets.len(),
        dry_run,
        "Applying release plan"
    );

    let report = ReleaseApplier::new(&graph, workspace.store.dir())
        .with_dry_run(dry_run)
        .run(&plan)?;

    Ok(render(&workspace, &plan, &report))
}

fn render(workspace: &Workspace, plan: &ReleasePlan, report: &ApplyReport) -> String {
    let mut output = String::new();
    if report.dry_run {
        output.push_str("Dry run, no files written.\n");
    }

    if plan.releases.is_empty() {
        output.push_str("No modules to release\n");
    } else {
        output.push_str("Releases:\n");
        for release in &plan.releases {
            let _ = writeln!(
                output,
                "  {}: {} -> {}",
                workspace.module_label(&release.module),
                release.previous_version,
                release.version
            );
        }
    }

    let _ = write!(
        output,
        "\ngo.mod files rewritten: {}\nChangelogs updated: {}\nChangesets consumed: {}",
        report.rewritten_manifests.len(),
        report.updated_changelogs.len(),
        report.deleted_changesets.len()
    );
    if let Some(path) = &report.manifest_path {
        let _ = write!(output, "\nRelease manifest: {}", path.display());
    }
    output
}

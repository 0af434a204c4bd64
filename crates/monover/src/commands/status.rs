//! `monover status`: pending changesets and the release they would produce.

use super::Workspace;
use crate::cli::Result;
use crate::git;
use monover_release::{Bump, ModuleGraph, Release, ReleasePlan, discover, modules_for_files};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Write;
use std::path::Path;
use tracing::warn;

/// Status output for JSON mode
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusOutput {
    /// Pending changesets
    pub changesets: Vec<ChangesetSummary>,
    /// Releases the pending changesets would produce
    pub releases: Vec<Release>,
    /// Modules with changed files but no changeset, when the diff was checked
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unreleased_changes: Option<Vec<String>>,
}

/// Summary of a single changeset for JSON output
#[derive(Debug, Serialize)]
pub struct ChangesetSummary {
    /// Changeset id
    pub id: String,
    /// Bump per module
    pub modules: BTreeMap<String, Bump>,
    /// First line of the summary
    pub summary: String,
}

fn unreleased_changes(
    workspace: &Workspace,
    graph: &ModuleGraph,
    plan: &ReleasePlan,
) -> Option<Vec<String>> {
    let files = match git::changed_files(&workspace.root, &workspace.config.base_branch) {
        Ok(files) => files,
        Err(e) => {
            warn!(error = %e, "Skipping changed-file analysis");
            return None;
        }
    };

    let covered: BTreeSet<&str> = plan
        .changesets
        .iter()
        .flat_map(|cs| cs.modules.keys().map(String::as_str))
        .collect();

    Some(
        modules_for_files(graph, &workspace.root, &files, &workspace.config.ignore_paths)
            .into_iter()
            .filter(|m| !covered.contains(m.as_str()) && !workspace.config.is_ignored(m))
            .collect(),
    )
}

/// Describe pending changesets, the planned releases and, unless `no_diff`,
/// modules changed since the base branch that no changeset covers.
///
/// # Errors
///
/// Returns an error if the workspace cannot be loaded or the plan cannot be
/// computed.
pub fn execute(root: &Path, json: bool, no_diff: bool) -> Result<String> {
    let workspace = Workspace::load(root)?;
    let graph = discover(root)?;
    let changesets = workspace.store.read_all()?;

    let versions = workspace.current_versions().unwrap_or_else(|e| {
        warn!(error = %e, "Could not read tags; treating every module as untagged");
        BTreeMap::new()
    });
    let plan = ReleasePlan::compute(changesets, &graph, &versions, &workspace.config)?;
    let unreleased = if no_diff {
        None
    } else {
        unreleased_changes(&workspace, &graph, &plan)
    };

    if json {
        let output = StatusOutput {
            changesets: plan
                .changesets
                .iter()
                .map(|cs| ChangesetSummary {
                    id: cs.id.clone(),
                    modules: cs.modules.clone(),
                    summary: cs.summary.lines().next().unwrap_or("").to_string(),
                })
                .collect(),
            releases: plan.releases,
            unreleased_changes: unreleased,
        };
        return serde_json::to_string_pretty(&output)
            .map_err(|e| monover_release::Error::from(e).into());
    }

    Ok(render_text(&workspace, &plan, unreleased.as_deref()))
}

fn render_text(
    workspace: &Workspace,
    plan: &ReleasePlan,
    unreleased: Option<&[String]>,
) -> String {
    let mut output = String::new();

    if plan.changesets.is_empty() {
        output.push_str("No pending changesets.\n");
    } else {
        let _ = writeln!(output, "Pending changesets: {}", plan.changesets.len());
        for cs in &plan.changesets {
            let modules: Vec<String> = cs
                .modules
                .iter()
                .map(|(m, b)| format!("{} ({b})", workspace.module_label(m)))
                .collect();
            let modules = if modules.is_empty() {
                "no modules".to_string()
            } else {
                modules.join(", ")
            };
            let _ = writeln!(output, "  {}: {modules}", cs.id);
        }
    }

    if !plan.releases.is_empty() {
        output.push_str("\nPlanned releases:\n");
        for release in &plan.releases {
            let why = if release.is_explicit() {
                release.bump.to_string()
            } else {
                format!("{}, dependency", release.bump)
            };
            let _ = writeln!(
                output,
                "  {} {} -> {} ({why})",
                workspace.module_label(&release.module),
                release.previous_version,
                release.version
            );
        }
    }

    if let Some(modules) = unreleased
        && !modules.is_empty()
    {
        output.push_str("\nModules changed without a changeset:\n");
        for module in modules {
            let _ = writeln!(output, "  {}", workspace.module_label(module));
        }
    }

    output.trim_end().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use monover_release::{Changeset, ChangesetStore, Config, ReleaseReason};
    use std::fs;
    use tempfile::TempDir;

    fn workspace(root: &Path) -> Workspace {
        Workspace {
            root: root.to_path_buf(),
            store: ChangesetStore::new(root),
            config: Config::for_root("example.com/repo"),
        }
    }

    #[test]
    fn test_render_text() {
        let temp = TempDir::new().unwrap();
        let plan = ReleasePlan {
            releases: vec![
                Release {
                    module: String::new(),
                    version: "v1.1.0".into(),
                    previous_version: "v1.0.0".into(),
                    bump: Bump::Minor,
                    reason: None,
                },
                Release {
                    module: "tools".into(),
                    version: "v0.1.1".into(),
                    previous_version: "v0.1.0".into(),
                    bump: Bump::Patch,
                    reason: Some(ReleaseReason::Dependency),
                },
            ],
            changesets: vec![Changeset::with_id(
                "brave-quiet-otters",
                BTreeMap::from([(String::new(), Bump::Minor)]),
                "Add API",
            )],
        };

        let text = render_text(&workspace(temp.path()), &plan, Some(&["libX".to_string()]));
        assert_eq!(
            text,
            "Pending changesets: 1\n  brave-quiet-otters: example.com/repo (minor)\n\n\
             Planned releases:\n  example.com/repo v1.0.0 -> v1.1.0 (minor)\n  tools v0.1.0 -> v0.1.1 (patch, dependency)\n\n\
             Modules changed without a changeset:\n  libX"
        );
    }

    #[test]
    fn test_status_without_changesets() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("go.mod"), "module example.com/repo\n").unwrap();
        Config::for_root("example.com/repo")
            .save(&temp.path().join(".changeset"))
            .unwrap();

        let out = execute(temp.path(), false, true).unwrap();
        assert_eq!(out, "No pending changesets.");
    }
}

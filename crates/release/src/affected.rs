//! Mapping changed files to the modules that own them.

use crate::graph::ModuleGraph;
use glob::Pattern;
use std::collections::BTreeSet;
use std::path::Path;
use tracing::{debug, warn};

/// Short names of the modules owning `files`.
///
/// `files` are paths relative to `repo_root`, as reported by `git diff
/// --name-only`. A file belongs to the module with the longest directory
/// prefix containing it; files at the top level belong to the root module.
/// Files matching any `ignore_paths` glob are skipped. Invalid patterns are
/// reported and ignored.
#[must_use]
pub fn modules_for_files<S: AsRef<str>>(
    graph: &ModuleGraph,
    repo_root: &Path,
    files: &[S],
    ignore_paths: &[String],
) -> BTreeSet<String> {
    let patterns: Vec<Pattern> = ignore_paths
        .iter()
        .filter_map(|raw| match Pattern::new(raw) {
            Ok(pattern) => Some(pattern),
            Err(e) => {
                warn!(pattern = %raw, error = %e, "Ignoring invalid ignorePaths pattern");
                None
            }
        })
        .collect();

    let mut prefixes: Vec<(&Path, &str)> = graph
        .all_modules()
        .into_iter()
        .filter_map(|module| {
            let rel = module.path.strip_prefix(repo_root).ok()?;
            Some((rel, module.short_name.as_str()))
        })
        .collect();
    // Deepest directories first so the longest prefix wins.
    prefixes.sort_by_key(|(rel, _)| std::cmp::Reverse(rel.components().count()));

    let mut affected = BTreeSet::new();
    for file in files {
        let file = file.as_ref();
        if patterns.iter().any(|p| p.matches(file)) {
            debug!(file, "Changed file matches ignorePaths");
            continue;
        }

        let path = Path::new(file);
        if let Some((_, short_name)) = prefixes.iter().find(|(rel, _)| path.starts_with(rel)) {
            affected.insert((*short_name).to_string());
        }
    }

    affected
}

//! `monover add`: record a changeset from flags.

use super::Workspace;
use crate::cli::{CliError, Result, parse_module_bump};
use monover_release::{Bump, Changeset, discover};
use std::collections::BTreeMap;
use std::fmt::Write;
use std::path::Path;

/// Write a changeset bumping `modules` (each `module:bump`).
///
/// Every module must exist in the repository. No modules at all records a
/// changeset that bumps nothing.
///
/// # Errors
///
/// Returns an error for an empty summary, a malformed or unknown module, an
/// invalid bump, or a failed write.
pub fn execute(root: &Path, modules: &[String], summary: &str) -> Result<String> {
    if summary.trim().is_empty() {
        return Err(CliError::config("Summary must not be empty"));
    }

    let workspace = Workspace::load(root)?;
    let graph = discover(root)?;

    let mut bumps: BTreeMap<String, Bump> = BTreeMap::new();
    for raw in modules {
        let (module, bump_str) = parse_module_bump(raw)?;
        let bump = Bump::parse(&bump_str).map_err(|_| {
            CliError::config_with_help(
                format!("Invalid bump type '{bump_str}' for module '{module}'"),
                "Use patch, minor or major",
            )
        })?;
        if !graph.contains(&module) {
            let known: Vec<&str> = graph
                .all_modules()
                .iter()
                .filter(|m| !m.is_root())
                .map(|m| m.short_name.as_str())
                .collect();
            return Err(CliError::config_with_help(
                format!("Unknown module '{module}'"),
                format!("Known modules: {} (use :bump for the root)", known.join(", ")),
            ));
        }
        bumps
            .entry(module)
            .and_modify(|current| *current = Bump::max(*current, bump))
            .or_insert(bump);
    }

    let mut changeset = Changeset::new(bumps, summary);
    let path = workspace.store.write(&mut changeset)?;

    let mut output = format!("Created changeset {}", path.display());
    for (module, bump) in &changeset.modules {
        let _ = write!(output, "\n  {}: {bump}", workspace.module_label(module));
    }
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use monover_release::{ChangesetStore, Config};
    use std::fs;
    use tempfile::TempDir;

    fn repo() -> TempDir {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("go.mod"), "module example.com/repo\n").unwrap();
        fs::create_dir_all(temp.path().join("libA")).unwrap();
        fs::write(
            temp.path().join("libA/go.mod"),
            "module example.com/repo/libA\n",
        )
        .unwrap();
        Config::for_root("example.com/repo")
            .save(&temp.path().join(".changeset"))
            .unwrap();
        temp
    }

    #[test]
    fn test_add_writes_changeset() {
        let temp = repo();
        let out = execute(
            temp.path(),
            &["libA:minor".to_string(), ":patch".to_string(), "libA:patch".to_string()],
            "Add reader",
        )
        .unwrap();
        assert!(out.contains("libA: minor"));
        assert!(out.contains("example.com/repo: patch"));

        let all = ChangesetStore::new(temp.path()).read_all().unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].modules.get("libA"), Some(&Bump::Minor));
        assert_eq!(all[0].modules.get(""), Some(&Bump::Patch));
        assert_eq!(all[0].summary, "Add reader");
    }

    #[test]
    fn test_add_rejects_unknown_module() {
        let temp = repo();
        let err = execute(temp.path(), &["libZ:minor".to_string()], "x").unwrap_err();
        assert!(err.to_string().contains("libZ"));
    }

    #[test]
    fn test_add_rejects_bad_bump() {
        let temp = repo();
        assert!(execute(temp.path(), &["libA:huge".to_string()], "x").is_err());
    }

    #[test]
    fn test_add_requires_init() {
        let temp = TempDir::new().unwrap();
        let err = execute(temp.path(), &[], "x").unwrap_err();
        assert!(matches!(
            err,
            CliError::Release(monover_release::Error::ConfigNotFound { .. })
        ));
    }
}

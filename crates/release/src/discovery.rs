//! Module discovery.
//!
//! Walks a repository, reads every `go.mod` it finds and builds the
//! [`ModuleGraph`] of in-repository modules.

use crate::error::{Error, Result};
use crate::gomod::{self, GO_MOD};
use crate::graph::{Module, ModuleGraph};
use std::fs;
use std::path::Path;
use tracing::{debug, warn};
use walkdir::{DirEntry, WalkDir};

/// Directory names never searched for modules.
const SKIPPED_DIRS: &[&str] = &["vendor", "testdata", "node_modules"];

fn is_pruned(entry: &DirEntry) -> bool {
    if entry.depth() == 0 || !entry.file_type().is_dir() {
        return false;
    }
    let name = entry.file_name().to_str().unwrap_or("");
    name.starts_with('.') || SKIPPED_DIRS.contains(&name)
}

/// Read and parse the `go.mod` in `dir`.
fn read_manifest(dir: &Path) -> Result<gomod::GoMod> {
    let path = dir.join(GO_MOD);
    let content = fs::read_to_string(&path)
        .map_err(|e| Error::discovery(format!("Failed to read manifest: {e}"), &path))?;
    gomod::parse(&content).map_err(|message| Error::discovery(message, &path))
}

/// Discover every module under `root_dir`.
///
/// `root_dir` must hold the root module's `go.mod`. Hidden directories and
/// `vendor`, `testdata` and `node_modules` trees are not searched. Required
/// modules outside the root module's path are external and dropped; a
/// nested module whose own path lies outside the root is skipped with a
/// warning.
///
/// # Errors
///
/// Returns [`Error::Discovery`] naming the offending path when the root
/// manifest is missing or any manifest cannot be read or parsed.
pub fn discover(root_dir: &Path) -> Result<ModuleGraph> {
    let root_manifest = root_dir.join(GO_MOD);
    if !root_manifest.is_file() {
        return Err(Error::discovery(
            "Root module manifest not found",
            root_manifest,
        ));
    }

    let root_mod = read_manifest(root_dir)?;
    let root_identifier = root_mod.module.clone();
    let root = build_module(&root_identifier, "", root_dir, &root_mod);

    let mut modules = Vec::new();
    for entry in WalkDir::new(root_dir)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| !is_pruned(e))
    {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(root_dir).to_path_buf();
            Error::discovery(format!("Failed to walk directory: {e}"), path)
        })?;

        if entry.depth() == 0 || !entry.file_type().is_dir() {
            continue;
        }
        let dir = entry.path();
        if !dir.join(GO_MOD).is_file() {
            continue;
        }

        let parsed = read_manifest(dir)?;
        let Some(short_name) = gomod::short_name_for(&root_identifier, &parsed.module) else {
            warn!(
                module = %parsed.module,
                path = %dir.display(),
                root = %root_identifier,
                "Skipping module outside the root module path"
            );
            continue;
        };
        if short_name.is_empty() {
            warn!(path = %dir.display(), "Skipping nested copy of the root module");
            continue;
        }

        let module = build_module(&root_identifier, short_name, dir, &parsed);
        debug!(
            module = %module.short_name,
            dependencies = module.dependencies.len(),
            "Discovered module"
        );
        modules.push(module);
    }

    Ok(ModuleGraph::new(root, modules))
}

fn build_module(
    root_identifier: &str,
    short_name: &str,
    dir: &Path,
    parsed: &gomod::GoMod,
) -> Module {
    let internal = parsed
        .requires
        .iter()
        .filter_map(|req| gomod::short_name_for(root_identifier, &req.path))
        .filter(|dep| *dep != short_name)
        .map(str::to_string);

    Module::new(&parsed.module, short_name, dir).with_dependencies(internal)
}

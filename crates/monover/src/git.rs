//! Repository access: tags are read with `gix`, while the merge-base diff
//! and tag creation go through the system `git` binary.

use crate::cli::{CliError, Result};
use std::path::Path;
use std::process::Command;
use tracing::debug;

fn run(repo: &Path, args: &[&str]) -> Result<String> {
    debug!(?args, "Running git");
    let output = Command::new("git")
        .args(args)
        .current_dir(repo)
        .output()
        .map_err(|e| {
            CliError::git_with_help(
                format!("Failed to run git {}: {e}", args.join(" ")),
                "Make sure git is installed and on PATH",
            )
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(CliError::git(format!(
            "git {} failed: {}",
            args.join(" "),
            stderr.trim()
        )));
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

fn lines(stdout: &str) -> Vec<String> {
    stdout
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// All tag names in the repository, without the `refs/tags/` prefix.
///
/// # Errors
///
/// Returns an error if `repo` is not inside a git repository or its
/// references cannot be read.
pub fn list_tags(repo: &Path) -> Result<Vec<String>> {
    let repository = gix::discover(repo).map_err(|e| {
        CliError::git_with_help(
            format!("Failed to open repository at {}: {e}", repo.display()),
            "Run monover inside a git repository",
        )
    })?;
    let references = repository
        .references()
        .map_err(|e| CliError::git(format!("Failed to read references: {e}")))?;
    let tags = references
        .tags()
        .map_err(|e| CliError::git(format!("Failed to list tags: {e}")))?;

    let mut names = Vec::new();
    for tag in tags {
        let tag = tag.map_err(|e| CliError::git(format!("Failed to read tag: {e}")))?;
        names.push(tag.name().shorten().to_string());
    }
    debug!(count = names.len(), "Read tags");
    Ok(names)
}

/// Files changed between the merge base with `base` and the working tree,
/// relative to the repository root.
///
/// # Errors
///
/// Returns an error if `git diff` fails, for example when `base` is unknown.
pub fn changed_files(repo: &Path, base: &str) -> Result<Vec<String>> {
    let merge_base = run(repo, &["merge-base", base, "HEAD"])?;
    let merge_base = merge_base.trim();
    run(
        repo,
        &["diff", "--name-only", "--relative", merge_base],
    )
    .map(|out| lines(&out))
}

/// Create a lightweight tag at `HEAD`.
///
/// # Errors
///
/// Returns an error if the tag already exists or `git tag` fails.
pub fn create_tag(repo: &Path, name: &str) -> Result<()> {
    run(repo, &["tag", name]).map(|_| ())
}

//! Changelog generation and formatting.
//!
//! This module renders changeset summaries into dated `CHANGELOG.md`
//! entries and merges them into a module's existing changelog.

use crate::changeset::{Bump, Changeset};
use crate::error::{Error, Result};
use crate::plan::Release;
use chrono::NaiveDate;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// File name of a module changelog.
pub const CHANGELOG_FILE: &str = "CHANGELOG.md";

/// Preamble written when a changelog is created.
const PREAMBLE: &str = "# Changelog\n";

/// Summary used for releases that only pick up dependency updates.
pub const DEPENDENCY_SUMMARY: &str = "Updated dependencies";

/// A single dated entry in a changelog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangelogEntry {
    /// Heading text, normally the released version.
    pub heading: String,
    /// Release date.
    pub date: NaiveDate,
    /// Distinct summaries grouped by bump severity, in first-seen order.
    pub changes: BTreeMap<Bump, Vec<String>>,
}

impl ChangelogEntry {
    /// Create an entry with no changes.
    #[must_use]
    pub fn new(heading: impl Into<String>, date: NaiveDate) -> Self {
        Self {
            heading: heading.into(),
            date,
            changes: BTreeMap::new(),
        }
    }

    /// Record a summary under `bump`.
    ///
    /// A summary already present under a lower bump moves up; one already
    /// present under the same or a higher bump is left alone.
    pub fn add(&mut self, bump: Bump, summary: &str) {
        let summary = summary.trim();
        if summary.is_empty() {
            return;
        }

        let existing = self
            .changes
            .iter()
            .find(|(_, summaries)| summaries.iter().any(|s| s == summary))
            .map(|(level, _)| *level);

        match existing {
            Some(level) if level >= bump => return,
            Some(level) => {
                if let Some(summaries) = self.changes.get_mut(&level) {
                    summaries.retain(|s| s != summary);
                }
            }
            None => {}
        }

        self.changes
            .entry(bump)
            .or_default()
            .push(summary.to_string());
        self.changes.retain(|_, summaries| !summaries.is_empty());
    }

    /// Build an entry from every changeset, grouping each summary by the
    /// highest bump its changeset declares (`patch` when it declares none).
    #[must_use]
    pub fn from_changesets(
        heading: impl Into<String>,
        date: NaiveDate,
        changesets: &[Changeset],
    ) -> Self {
        let mut entry = Self::new(heading, date);
        for changeset in changesets {
            entry.add(
                changeset.highest_bump().unwrap_or(Bump::Patch),
                &changeset.summary,
            );
        }
        entry
    }

    /// Build the entry for one module release.
    ///
    /// Only changesets naming the released module contribute. A release
    /// caused purely by a dependency gets a single patch-level note.
    #[must_use]
    pub fn for_release(release: &Release, changesets: &[Changeset], date: NaiveDate) -> Self {
        let relevant: Vec<Changeset> = changesets
            .iter()
            .filter(|cs| cs.modules.contains_key(&release.module))
            .cloned()
            .collect();

        let mut entry = Self::from_changesets(&release.version, date, &relevant);
        if entry.is_empty() {
            entry.add(Bump::Patch, DEPENDENCY_SUMMARY);
        }
        entry
    }

    /// Whether no summaries were recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    /// Format this entry as Markdown.
    #[must_use]
    pub fn to_markdown(&self) -> String {
        use std::fmt::Write;
        let mut output = String::new();

        let _ = writeln!(
            output,
            "## {} - {}\n",
            self.heading,
            self.date.format("%Y-%m-%d")
        );

        for bump in Bump::DESCENDING {
            let Some(summaries) = self.changes.get(&bump) else {
                continue;
            };
            let _ = writeln!(output, "### {}\n", section_title(bump));
            for summary in summaries {
                output.push_str(&format_bullet(summary));
            }
            output.push('\n');
        }

        output
    }
}

fn section_title(bump: Bump) -> &'static str {
    match bump {
        Bump::Major => "Major Changes",
        Bump::Minor => "Minor Changes",
        Bump::Patch => "Patch Changes",
    }
}

/// Format a summary as a list item, indenting continuation lines.
fn format_bullet(summary: &str) -> String {
    let mut output = String::new();
    for (idx, line) in summary.lines().enumerate() {
        if idx == 0 {
            output.push_str("- ");
        } else if !line.is_empty() {
            output.push_str("  ");
        }
        output.push_str(line);
        output.push('\n');
    }
    output
}

/// Whether `content` already has an entry headed `heading`.
#[must_use]
pub fn contains_heading(content: &str, heading: &str) -> bool {
    content.lines().any(|line| {
        line.strip_prefix("## ")
            .and_then(|rest| rest.strip_prefix(heading))
            .is_some_and(|rest| rest.is_empty() || rest.starts_with(' '))
    })
}

/// Whether `line` is a release heading such as `## v1.2.0 - 2024-06-01`.
fn is_dated_heading(line: &str) -> bool {
    line.trim_end()
        .strip_prefix("## ")
        .and_then(|rest| rest.rsplit_once(" - "))
        .is_some_and(|(_, date)| NaiveDate::parse_from_str(date, "%Y-%m-%d").is_ok())
}

/// Merge a rendered entry into existing changelog content.
///
/// The entry goes directly above the first dated release heading, so any
/// preamble is kept, including undated `## ` sections in it. Without a
/// release heading the entry is appended.
#[must_use]
pub fn insert_entry(existing: &str, entry: &ChangelogEntry) -> String {
    let rendered = entry.to_markdown();
    let mut offset = 0;
    let mut heading_at = None;
    for line in existing.split_inclusive('\n') {
        if is_dated_heading(line) {
            heading_at = Some(offset);
            break;
        }
        offset += line.len();
    }

    match heading_at {
        Some(idx) => format!("{}{rendered}{}", &existing[..idx], &existing[idx..]),
        None => {
            let preamble = existing.trim_end();
            if preamble.is_empty() {
                rendered
            } else {
                format!("{preamble}\n\n{rendered}")
            }
        }
    }
}

/// Prepend `entry` to the changelog at `path`, creating it if needed.
///
/// # Errors
///
/// Returns an error if the file cannot be read or written.
pub fn update_changelog(path: &Path, entry: &ChangelogEntry) -> Result<()> {
    let existing = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => format!("{PREAMBLE}\n"),
        Err(e) => {
            return Err(Error::persistence("Failed to read changelog", path, e));
        }
    };

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| Error::persistence("Failed to create directory", parent, e))?;
    }

    fs::write(path, insert_entry(&existing, entry))
        .map_err(|e| Error::persistence("Failed to write changelog", path, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::ReleaseReason;
    use tempfile::TempDir;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()
    }

    fn changeset(id: &str, pairs: &[(&str, Bump)], summary: &str) -> Changeset {
        Changeset::with_id(
            id,
            pairs.iter().map(|(m, b)| ((*m).to_string(), *b)).collect(),
            summary,
        )
    }

    fn release(module: &str, reason: Option<ReleaseReason>) -> Release {
        Release {
            module: module.into(),
            version: "v0.2.0".into(),
            previous_version: "v0.1.0".into(),
            bump: Bump::Minor,
            reason,
        }
    }

    #[test]
    fn test_entry_groups_by_highest_bump() {
        let entry = ChangelogEntry::from_changesets(
            "v0.2.0",
            date(),
            &[
                changeset("a", &[("libA", Bump::Patch), ("libB", Bump::Major)], "Drop legacy API"),
                changeset("b", &[("libA", Bump::Minor)], "Add streaming reader"),
                changeset("c", &[("libA", Bump::Patch)], "Fix panic on empty input"),
                changeset("d", &[], "Tidy docs"),
            ],
        );

        assert_eq!(
            entry.to_markdown(),
            "## v0.2.0 - 2024-03-01\n\n\
             ### Major Changes\n\n- Drop legacy API\n\n\
             ### Minor Changes\n\n- Add streaming reader\n\n\
             ### Patch Changes\n\n- Fix panic on empty input\n- Tidy docs\n\n"
        );
    }

    #[test]
    fn test_entry_deduplicates_summaries() {
        let entry = ChangelogEntry::from_changesets(
            "v1.0.0",
            date(),
            &[
                changeset("a", &[("libA", Bump::Patch)], "Same text"),
                changeset("b", &[("libA", Bump::Minor)], "Same text"),
                changeset("c", &[("libA", Bump::Patch)], "Same text"),
            ],
        );
        assert_eq!(entry.changes.len(), 1);
        assert_eq!(entry.changes[&Bump::Minor], vec!["Same text"]);
        assert_eq!(entry.to_markdown().matches("Same text").count(), 1);
    }

    #[test]
    fn test_multiline_summary_is_indented() {
        let entry = ChangelogEntry::from_changesets(
            "v1.0.0",
            date(),
            &[changeset("a", &[("libA", Bump::Patch)], "First line\nsecond line\n\nthird")],
        );
        assert!(
            entry
                .to_markdown()
                .contains("- First line\n  second line\n\n  third\n")
        );
    }

    #[test]
    fn test_for_release_filters_by_module() {
        let changesets = [
            changeset("a", &[("libA", Bump::Minor)], "Only libA"),
            changeset("b", &[("libB", Bump::Patch)], "Only libB"),
        ];
        let entry = ChangelogEntry::for_release(&release("libA", None), &changesets, date());
        let md = entry.to_markdown();
        assert!(md.starts_with("## v0.2.0 - 2024-03-01"));
        assert!(md.contains("Only libA"));
        assert!(!md.contains("Only libB"));
    }

    #[test]
    fn test_for_release_dependency_only() {
        let entry = ChangelogEntry::for_release(
            &release("libC", Some(ReleaseReason::Dependency)),
            &[changeset("a", &[("libA", Bump::Minor)], "Only libA")],
            date(),
        );
        assert_eq!(entry.changes[&Bump::Patch], vec![DEPENDENCY_SUMMARY]);
    }

    #[test]
    fn test_insert_entry_above_first_heading() {
        let existing = "# Changelog\n\nNotes.\n\n## v0.1.0 - 2024-01-01\n\n- Initial\n";
        let entry = ChangelogEntry::from_changesets(
            "v0.2.0",
            date(),
            &[changeset("a", &[("libA", Bump::Minor)], "New")],
        );
        let merged = insert_entry(existing, &entry);
        assert!(merged.starts_with("# Changelog\n\nNotes.\n\n## v0.2.0 - 2024-03-01\n"));
        assert!(merged.ends_with("## v0.1.0 - 2024-01-01\n\n- Initial\n"));
    }

    #[test]
    fn test_insert_entry_heading_on_first_line() {
        let existing = "## v0.1.0 - 2024-01-01\n";
        let entry = ChangelogEntry::new("v0.2.0", date());
        let merged = insert_entry(existing, &entry);
        assert!(merged.starts_with("## v0.2.0"));
        assert!(merged.ends_with("## v0.1.0 - 2024-01-01\n"));
    }

    #[test]
    fn test_insert_entry_skips_undated_sections() {
        let existing = "# Changelog\n\n## Unreleased\n\nNothing yet.\n\n## Notes\n\nSee docs.\n\n\
                        ## v0.1.0 - 2024-01-01\n\n- Initial\n";
        let entry = ChangelogEntry::new("v0.2.0", date());
        let merged = insert_entry(existing, &entry);
        assert!(merged.starts_with(
            "# Changelog\n\n## Unreleased\n\nNothing yet.\n\n## Notes\n\nSee docs.\n\n## v0.2.0 - 2024-03-01\n"
        ));
        assert!(merged.ends_with("## v0.1.0 - 2024-01-01\n\n- Initial\n"));
    }

    #[test]
    fn test_insert_entry_without_dated_heading_appends() {
        let existing = "# Changelog\n\n## Notes\n\nSee docs.\n";
        let entry = ChangelogEntry::new("v0.1.0", date());
        let merged = insert_entry(existing, &entry);
        assert!(merged.starts_with("# Changelog\n\n## Notes\n\nSee docs.\n\n## v0.1.0 - 2024-03-01\n"));
    }

    #[test]
    fn test_is_dated_heading() {
        assert!(is_dated_heading("## v1.2.0 - 2024-06-01\n"));
        assert!(!is_dated_heading("## Unreleased\n"));
        assert!(!is_dated_heading("## Notes - see below\n"));
        assert!(!is_dated_heading("### v1.2.0 - 2024-06-01"));
    }

    #[test]
    fn test_contains_heading() {
        let content = "# Changelog\n\n## v0.10.0 - 2024-01-01\n\n- Initial\n";
        assert!(contains_heading(content, "v0.10.0"));
        assert!(!contains_heading(content, "v0.1.0"));
        assert!(!contains_heading("- v0.10.0\n", "v0.10.0"));
    }

    #[test]
    fn test_update_changelog_creates_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("libA").join(CHANGELOG_FILE);
        let entry = ChangelogEntry::from_changesets(
            "v0.2.0",
            date(),
            &[changeset("a", &[("libA", Bump::Minor)], "New")],
        );

        update_changelog(&path, &entry).unwrap();
        let content = fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("# Changelog\n\n## v0.2.0 - 2024-03-01\n"));
        assert!(content.contains("### Minor Changes\n\n- New\n"));
    }

    #[test]
    fn test_update_changelog_twice_keeps_newest_first() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join(CHANGELOG_FILE);
        let cs = [changeset("a", &[("libA", Bump::Patch)], "Fix")];

        update_changelog(&path, &ChangelogEntry::from_changesets("v0.1.1", date(), &cs)).unwrap();
        update_changelog(&path, &ChangelogEntry::from_changesets("v0.1.2", date(), &cs)).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let newer = content.find("## v0.1.2").unwrap();
        let older = content.find("## v0.1.1").unwrap();
        assert!(newer < older);
        assert_eq!(content.matches("# Changelog").count(), 1);
    }
}

//! Changeset creation, storage, and parsing.
//!
//! Changesets are Markdown files stored in `.changeset/` that declare pending
//! version bumps for one or more modules of the repository.
//!
//! # Changeset Format
//!
//! ```markdown
//! ---
//! "libA": minor
//! "libB": patch
//! ---
//!
//! Summary of the change, used verbatim in changelogs.
//! May span several lines.
//! ```
//!
//! An empty header is valid and describes a change that bumps nothing.

use crate::error::{Error, Result};
use crate::slug;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::debug;

/// The directory name for storing changesets, config and the release manifest.
pub const CHANGESETS_DIR: &str = ".changeset";

/// Authoring guide kept next to the changesets; never parsed as one.
pub const README_FILE: &str = "README.md";

/// Frontmatter delimiter line.
const DELIMITER: &str = "---";

/// How many fresh ids to try before giving up on a collision-free filename.
const MAX_ID_ATTEMPTS: usize = 16;

/// Severity of a version bump.
///
/// Ordered `Patch < Minor < Major`; every conflict between bumps resolves to
/// the maximum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Bump {
    /// Patch version bump (0.0.X).
    Patch,
    /// Minor version bump (0.X.0).
    Minor,
    /// Major version bump (X.0.0).
    Major,
}

impl Bump {
    /// All bump levels from highest to lowest severity.
    pub const DESCENDING: [Self; 3] = [Self::Major, Self::Minor, Self::Patch];

    /// Parse a bump from its lowercase name.
    ///
    /// # Errors
    ///
    /// Returns an error if the string is not `patch`, `minor` or `major`.
    pub fn parse(s: &str) -> Result<Self> {
        match s.trim() {
            "major" => Ok(Self::Major),
            "minor" => Ok(Self::Minor),
            "patch" => Ok(Self::Patch),
            other => Err(Error::changeset_parse(
                format!("Invalid bump type: '{other}'. Expected patch, minor, or major"),
                None,
            )),
        }
    }

    /// Get the higher of two bumps.
    #[must_use]
    pub fn max(self, other: Self) -> Self {
        if self > other { self } else { other }
    }
}

impl fmt::Display for Bump {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Patch => write!(f, "patch"),
            Self::Minor => write!(f, "minor"),
            Self::Major => write!(f, "major"),
        }
    }
}

impl FromStr for Bump {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// A changeset describing pending changes for a release.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Changeset {
    /// Unique human-readable identifier; also the file stem.
    pub id: String,
    /// Bump per affected module, keyed by module short name.
    pub modules: BTreeMap<String, Bump>,
    /// Free-form summary used in changelogs.
    pub summary: String,
    /// Backing file, once persisted or read from disk.
    pub file_path: Option<PathBuf>,
}

impl Changeset {
    /// Create an unsaved changeset without an id; one is assigned on write.
    #[must_use]
    pub fn new(modules: BTreeMap<String, Bump>, summary: impl Into<String>) -> Self {
        Self {
            id: String::new(),
            modules,
            summary: summary.into(),
            file_path: None,
        }
    }

    /// Create a changeset with a specific id.
    #[must_use]
    pub fn with_id(
        id: impl Into<String>,
        modules: BTreeMap<String, Bump>,
        summary: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            modules,
            summary: summary.into(),
            file_path: None,
        }
    }

    /// Highest bump declared by this changeset, if it declares any.
    #[must_use]
    pub fn highest_bump(&self) -> Option<Bump> {
        self.modules.values().copied().max()
    }

    /// Parse a changeset from its Markdown content.
    ///
    /// # Errors
    ///
    /// Returns an error if the delimiters are missing, the header is not a
    /// flat string mapping, or a bump value is unknown.
    pub fn parse(content: &str, id: &str) -> Result<Self> {
        let content = content.trim_start_matches('\u{feff}');
        let mut lines = content.lines();

        match lines.next() {
            Some(first) if first.trim_end() == DELIMITER => {}
            _ => {
                return Err(Error::changeset_parse(
                    "Changeset must start with a '---' header delimiter",
                    None,
                ));
            }
        }

        let mut header = Vec::new();
        let mut closed = false;
        for line in lines.by_ref() {
            if line.trim_end() == DELIMITER {
                closed = true;
                break;
            }
            header.push(line);
        }

        if !closed {
            return Err(Error::changeset_parse(
                "Missing closing '---' header delimiter",
                None,
            ));
        }

        let modules = Self::parse_header(&header.join("\n"))?;
        let summary = lines.collect::<Vec<_>>().join("\n").trim().to_string();

        Ok(Self {
            id: id.to_string(),
            modules,
            summary,
            file_path: None,
        })
    }

    /// Parse the header mapping of module short names to bumps.
    fn parse_header(header: &str) -> Result<BTreeMap<String, Bump>> {
        if header.trim().is_empty() {
            return Ok(BTreeMap::new());
        }

        let raw: BTreeMap<String, String> = serde_yaml::from_str(header)
            .map_err(|e| Error::changeset_parse(format!("Invalid header: {e}"), None))?;

        raw.into_iter()
            .map(|(module, bump)| {
                let bump = Bump::parse(&bump).map_err(|_| {
                    Error::changeset_parse(
                        format!("Invalid bump type '{bump}' for module \"{module}\""),
                        None,
                    )
                })?;
                Ok((module, bump))
            })
            .collect()
    }

    /// Convert the changeset to Markdown format.
    #[must_use]
    pub fn to_markdown(&self) -> String {
        use std::fmt::Write;
        let mut output = String::from("---\n");

        for (module, bump) in &self.modules {
            let _ = writeln!(output, "\"{}\": {bump}", escape_key(module));
        }

        output.push_str("---\n\n");
        output.push_str(self.summary.trim());
        output.push('\n');

        output
    }

    /// Get the filename for this changeset.
    #[must_use]
    pub fn filename(&self) -> String {
        format!("{}.md", self.id)
    }
}

/// Escape a module name for use inside a double-quoted YAML key.
fn escape_key(key: &str) -> String {
    key.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Reads and writes changesets in a store directory.
pub struct ChangesetStore {
    dir: PathBuf,
}

impl ChangesetStore {
    /// Create a store rooted at the repository root (`<root>/.changeset`).
    #[must_use]
    pub fn new(repo_root: &Path) -> Self {
        Self {
            dir: repo_root.join(CHANGESETS_DIR),
        }
    }

    /// Create a store over an explicit directory.
    #[must_use]
    pub fn at(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Get the changesets directory path.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Ensure the changesets directory exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    pub fn ensure_dir(&self) -> Result<()> {
        if !self.dir.exists() {
            fs::create_dir_all(&self.dir).map_err(|e| {
                Error::changeset_io_with_source(
                    "Failed to create changesets directory",
                    Some(self.dir.clone()),
                    e,
                )
            })?;
        }
        Ok(())
    }

    /// Parse a single changeset file; the file stem becomes its id.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not a valid changeset.
    pub fn parse(path: &Path) -> Result<Changeset> {
        let id = path
            .file_stem()
            .and_then(|s| s.to_str())
            .ok_or_else(|| {
                Error::changeset_parse("Changeset file name is not valid UTF-8", Some(path.into()))
            })?;

        let content = fs::read_to_string(path).map_err(|e| {
            Error::changeset_io_with_source(
                "Failed to read changeset file",
                Some(path.to_path_buf()),
                e,
            )
        })?;

        let mut changeset =
            Changeset::parse(&content, id).map_err(|e| e.with_changeset_path(path.into()))?;
        changeset.file_path = Some(path.to_path_buf());
        Ok(changeset)
    }

    /// List all pending changesets, sorted by id.
    ///
    /// The authoring guide and reserved JSON files are skipped. A missing
    /// directory yields an empty list.
    ///
    /// # Errors
    ///
    /// Returns an error naming the offending file if any changeset cannot be
    /// read or parsed.
    pub fn read_all(&self) -> Result<Vec<Changeset>> {
        if !self.dir.exists() {
            return Ok(Vec::new());
        }

        let entries = fs::read_dir(&self.dir).map_err(|e| {
            Error::changeset_io_with_source(
                "Failed to read changesets directory",
                Some(self.dir.clone()),
                e,
            )
        })?;

        let mut changesets = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| {
                Error::changeset_io_with_source(
                    "Failed to read directory entry",
                    Some(self.dir.clone()),
                    e,
                )
            })?;

            let path = entry.path();
            if !path.is_file() || !is_changeset_file(&path) {
                continue;
            }
            changesets.push(Self::parse(&path)?);
        }

        changesets.sort_by(|a, b| a.id.cmp(&b.id));
        debug!(count = changesets.len(), dir = %self.dir.display(), "Read changesets");
        Ok(changesets)
    }

    /// Persist a changeset, assigning a random three-word id if it has none.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory or file cannot be written.
    pub fn write(&self, changeset: &mut Changeset) -> Result<PathBuf> {
        self.write_with_rng(changeset, &mut rand::rng())
    }

    /// Persist a changeset using `rng` for id generation.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory or file cannot be written, or no
    /// unused id could be generated.
    pub fn write_with_rng<R: Rng + ?Sized>(
        &self,
        changeset: &mut Changeset,
        rng: &mut R,
    ) -> Result<PathBuf> {
        self.ensure_dir()?;

        if changeset.id.is_empty() {
            changeset.id = self.unused_id(rng)?;
        }

        let path = self.dir.join(changeset.filename());
        fs::write(&path, changeset.to_markdown()).map_err(|e| {
            Error::changeset_io_with_source("Failed to write changeset", Some(path.clone()), e)
        })?;

        debug!(id = %changeset.id, path = %path.display(), "Wrote changeset");
        changeset.file_path = Some(path.clone());
        Ok(path)
    }

    fn unused_id<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<String> {
        for _ in 0..MAX_ID_ATTEMPTS {
            let id = slug::generate(rng);
            if !self.dir.join(format!("{id}.md")).exists() {
                return Ok(id);
            }
        }
        Err(Error::changeset_io(
            "Could not generate an unused changeset id",
            Some(self.dir.clone()),
        ))
    }

    /// Remove a changeset's backing file.
    ///
    /// # Errors
    ///
    /// Returns an error if the changeset was never persisted or the file
    /// cannot be removed.
    pub fn delete(changeset: &Changeset) -> Result<()> {
        let Some(path) = &changeset.file_path else {
            return Err(Error::changeset_io(
                format!("Changeset '{}' has no backing file", changeset.id),
                None,
            ));
        };

        fs::remove_file(path).map_err(|e| {
            Error::changeset_io_with_source("Failed to remove changeset", Some(path.clone()), e)
        })
    }
}

/// Whether a path in the store directory holds a changeset.
fn is_changeset_file(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "md")
        && path.file_name().is_some_and(|name| name != README_FILE)
}

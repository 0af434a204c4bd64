//! Release manifest persistence.
//!
//! The release manifest records a computed plan so that a later `publish`
//! run can tag exactly what `version` decided, without recomputing it.

use crate::error::{Error, Result};
use crate::plan::Release;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// File name of the release manifest inside the store directory.
pub const MANIFEST_FILE: &str = "release-manifest.json";

/// A persisted release plan.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseManifest {
    /// Planned releases, sorted by module short name.
    pub releases: Vec<Release>,
}

impl ReleaseManifest {
    /// Create a manifest from a computed plan.
    #[must_use]
    pub fn new(releases: Vec<Release>) -> Self {
        Self { releases }
    }

    /// Location of the manifest inside `store_dir`.
    #[must_use]
    pub fn path(store_dir: &Path) -> PathBuf {
        store_dir.join(MANIFEST_FILE)
    }

    /// Read the manifest from `store_dir`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ManifestNotFound`] when no manifest exists and
    /// [`Error::ManifestCorrupt`] when it exists but cannot be parsed.
    pub fn read(store_dir: &Path) -> Result<Self> {
        let path = Self::path(store_dir);
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(Error::ManifestNotFound { path });
            }
            Err(e) => return Err(Error::persistence("Failed to read release manifest", path, e)),
        };

        serde_json::from_str(&content).map_err(|e| Error::ManifestCorrupt {
            message: e.to_string(),
            path,
        })
    }

    /// Write the manifest to `store_dir`, replacing any previous one.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory or file cannot be written.
    pub fn write(&self, store_dir: &Path) -> Result<PathBuf> {
        let path = Self::path(store_dir);
        fs::create_dir_all(store_dir)
            .map_err(|e| Error::persistence("Failed to create directory", store_dir, e))?;

        let mut json = serde_json::to_string_pretty(self)?;
        json.push('\n');
        fs::write(&path, json)
            .map_err(|e| Error::persistence("Failed to write release manifest", &path, e))?;

        debug!(path = %path.display(), releases = self.releases.len(), "Wrote release manifest");
        Ok(path)
    }

    /// Remove the manifest from `store_dir`. Removing an absent manifest is
    /// not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if an existing manifest cannot be removed.
    pub fn delete(store_dir: &Path) -> Result<()> {
        let path = Self::path(store_dir);
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Error::persistence("Failed to remove release manifest", path, e)),
        }
    }
}

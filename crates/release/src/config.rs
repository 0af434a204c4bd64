//! Release configuration.
//!
//! Stored as JSON in `.changeset/config.json` and read at the start of every
//! engine invocation.

use crate::changeset::Bump;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

/// File name of the config inside the store directory.
pub const CONFIG_FILE: &str = "config.json";

/// Complete release configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Config {
    /// Root module identifier, captured at init time.
    pub root: String,
    /// Branch that changed files are compared against.
    pub base_branch: String,
    /// Module short names excluded from every release.
    pub ignore: BTreeSet<String>,
    /// Glob patterns excluded from changed-file analysis.
    pub ignore_paths: Vec<String>,
    /// Bump applied to modules released only because a dependency changed.
    pub dependent_bump: Bump,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            root: String::new(),
            base_branch: "main".to_string(),
            ignore: BTreeSet::new(),
            ignore_paths: Vec::new(),
            dependent_bump: Bump::Patch,
        }
    }
}

impl Config {
    /// Create a default configuration for the given root module.
    #[must_use]
    pub fn for_root(root: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            ..Self::default()
        }
    }

    /// Location of the config file inside `store_dir`.
    #[must_use]
    pub fn path(store_dir: &Path) -> PathBuf {
        store_dir.join(CONFIG_FILE)
    }

    /// Load the configuration from `store_dir`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigNotFound`] when the file is absent, or a
    /// configuration error when it cannot be read or parsed.
    pub fn load(store_dir: &Path) -> Result<Self> {
        let path = Self::path(store_dir);
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(Error::ConfigNotFound { path });
            }
            Err(e) => {
                return Err(Error::config(
                    format!("Failed to read {}: {e}", path.display()),
                    "Check the file permissions of the .changeset directory",
                ));
            }
        };

        serde_json::from_str(&content).map_err(|e| {
            Error::config(
                format!("Failed to parse {}: {e}", path.display()),
                "dependentBump must be one of patch, minor, major; ignore and ignorePaths are string arrays",
            )
        })
    }

    /// Write the configuration to `store_dir`, creating the directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory or file cannot be written.
    pub fn save(&self, store_dir: &Path) -> Result<PathBuf> {
        let path = Self::path(store_dir);
        fs::create_dir_all(store_dir)
            .map_err(|e| Error::persistence("Failed to create directory", store_dir, e))?;

        let mut json = serde_json::to_string_pretty(self)?;
        json.push('\n');
        fs::write(&path, json)
            .map_err(|e| Error::persistence("Failed to write config", &path, e))?;
        Ok(path)
    }

    /// Whether a module is excluded from releases.
    #[must_use]
    pub fn is_ignored(&self, short_name: &str) -> bool {
        self.ignore.contains(short_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.base_branch, "main");
        assert_eq!(config.dependent_bump, Bump::Patch);
        assert!(config.ignore.is_empty());
        assert!(config.ignore_paths.is_empty());
    }

    #[test]
    fn test_config_parses_partial_json() {
        let json = r#"{"root": "example.com/repo", "ignore": ["tools"], "dependentBump": "minor"}"#;
        let config: Config = serde_json::from_str(json).unwrap();
        assert_eq!(config.root, "example.com/repo");
        assert_eq!(config.base_branch, "main");
        assert!(config.is_ignored("tools"));
        assert_eq!(config.dependent_bump, Bump::Minor);
    }

    #[test]
    fn test_config_uses_camel_case_keys() {
        let json = serde_json::to_string(&Config::for_root("r")).unwrap();
        assert!(json.contains("\"baseBranch\""));
        assert!(json.contains("\"ignorePaths\""));
        assert!(json.contains("\"dependentBump\":\"patch\""));
    }

    #[test]
    fn test_config_save_load() {
        let temp = TempDir::new().unwrap();
        let store = temp.path().join(".changeset");
        let mut config = Config::for_root("example.com/repo");
        config.ignore_paths.push("**/*.md".to_string());

        config.save(&store).unwrap();
        assert_eq!(Config::load(&store).unwrap(), config);
    }

    #[test]
    fn test_config_load_missing() {
        let temp = TempDir::new().unwrap();
        let err = Config::load(temp.path()).unwrap_err();
        assert!(matches!(err, Error::ConfigNotFound { .. }));
    }

    #[test]
    fn test_config_load_invalid_bump() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join(CONFIG_FILE), r#"{"dependentBump": "huge"}"#).unwrap();
        let err = Config::load(temp.path()).unwrap_err();
        assert!(matches!(err, Error::Config { .. }));
    }
}

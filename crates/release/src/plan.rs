//! Release computation.
//!
//! Turns pending changesets into the list of module releases: explicit bumps
//! are aggregated, cascaded to dependents, applied to the current versions
//! and filtered by the ignore list.

use crate::changeset::{Bump, Changeset};
use crate::config::Config;
use crate::error::Result;
use crate::graph::ModuleGraph;
use crate::version::{ZERO_VERSION, increment};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

/// Why a module is released without an explicit changeset entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReleaseReason {
    /// A module this one depends on is being released.
    Dependency,
}

/// A single planned module release.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Release {
    /// Module short name; empty for the root module.
    pub module: String,
    /// Next version, `v`-prefixed.
    pub version: String,
    /// Version the bump was applied to.
    pub previous_version: String,
    /// Applied bump.
    pub bump: Bump,
    /// Set when the release exists only because of a cascade.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<ReleaseReason>,
}

impl Release {
    /// Whether this release was requested by a changeset.
    #[must_use]
    pub fn is_explicit(&self) -> bool {
        self.reason.is_none()
    }

    /// Tag name for the new version (`v1.2.3` or `libA/v1.2.3`).
    #[must_use]
    pub fn tag(&self) -> String {
        if self.module.is_empty() {
            self.version.clone()
        } else {
            format!("{}/{}", self.module, self.version)
        }
    }
}

/// Computed releases together with the changesets that produced them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReleasePlan {
    /// Releases sorted by module short name.
    pub releases: Vec<Release>,
    /// Changesets consumed by this plan.
    pub changesets: Vec<Changeset>,
}

impl ReleasePlan {
    /// Compute the plan for `changesets`; see [`compute_releases`].
    ///
    /// # Errors
    ///
    /// Returns the same errors as [`compute_releases`].
    pub fn compute(
        changesets: Vec<Changeset>,
        graph: &ModuleGraph,
        current_versions: &BTreeMap<String, String>,
        config: &Config,
    ) -> Result<Self> {
        let releases = compute_releases(&changesets, graph, current_versions, config)?;
        Ok(Self {
            releases,
            changesets,
        })
    }

    /// Whether there is nothing to release.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.releases.is_empty()
    }
}

/// Maximum bump per module across every changeset, dropping modules that are
/// not part of the graph.
fn aggregate(changesets: &[Changeset], graph: &ModuleGraph) -> BTreeMap<String, Bump> {
    let mut bumps: BTreeMap<String, Bump> = BTreeMap::new();
    for changeset in changesets {
        for (module, bump) in &changeset.modules {
            if !graph.contains(module) {
                debug!(
                    changeset = %changeset.id,
                    module = %module,
                    "Ignoring changeset entry for a module that no longer exists"
                );
                continue;
            }
            bumps
                .entry(module.clone())
                .and_modify(|current| *current = Bump::max(*current, *bump))
                .or_insert(*bump);
        }
    }
    bumps
}

/// Compute the releases implied by `changesets`.
///
/// Dependents of every bumped module receive `config.dependent_bump` unless
/// they already carry a bump of their own; explicit bumps are never raised.
/// Modules in `config.ignore` take part in the cascade and are dropped from
/// the result afterwards. `current_versions` maps short names to their latest
/// `v`-prefixed version; absent modules start from `v0.0.0`.
///
/// The result is sorted by module short name.
///
/// # Errors
///
/// Returns [`crate::Error::DependencyCycle`] if the graph is cyclic and
/// [`crate::Error::InvalidVersion`] naming the module whose current version
/// cannot be parsed. No partial result is returned.
pub fn compute_releases(
    changesets: &[Changeset],
    graph: &ModuleGraph,
    current_versions: &BTreeMap<String, String>,
    config: &Config,
) -> Result<Vec<Release>> {
    let explicit = aggregate(changesets, graph);
    let mut planned: BTreeMap<String, (Bump, Option<ReleaseReason>)> = explicit
        .into_iter()
        .map(|(module, bump)| (module, (bump, None)))
        .collect();

    for module in graph.topological_sort()? {
        if !planned.contains_key(&module.short_name) {
            continue;
        }
        for dependent in graph.dependents(&module.short_name) {
            if planned.contains_key(&dependent.short_name) {
                continue;
            }
            debug!(
                module = %dependent.short_name,
                dependency = %module.short_name,
                bump = %config.dependent_bump,
                "Cascading bump to dependent"
            );
            planned.insert(
                dependent.short_name.clone(),
                (config.dependent_bump, Some(ReleaseReason::Dependency)),
            );
        }
    }

    let mut releases = Vec::with_capacity(planned.len());
    for (module, (bump, reason)) in planned {
        let previous_version = current_versions
            .get(&module)
            .map_or(ZERO_VERSION, String::as_str)
            .to_string();
        let version = increment(&module, &previous_version, bump)?;
        releases.push(Release {
            module,
            version,
            previous_version,
            bump,
            reason,
        });
    }

    releases.retain(|release| {
        let ignored = config.is_ignored(&release.module);
        if ignored {
            debug!(module = %release.module, "Dropping ignored module from release plan");
        }
        !ignored
    });

    Ok(releases)
}

//! Module dependency graph.
//!
//! Holds every discovered module keyed by short name and answers the
//! questions release computation asks of it: lookup, reverse dependencies
//! and a deterministic dependency-first ordering.

use crate::error::{Error, Result};
use petgraph::algo::tarjan_scc;
use petgraph::graphmap::DiGraphMap;
use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;
use tracing::debug;

/// A module of the repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Module {
    /// Fully-qualified module identifier (the `module` directive).
    pub name: String,
    /// Identifier relative to the root module; empty for the root itself.
    pub short_name: String,
    /// Directory containing the module's `go.mod`.
    pub path: PathBuf,
    /// Short names of in-repository modules this module requires.
    pub dependencies: BTreeSet<String>,
}

impl Module {
    /// Create a module with no dependencies.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        short_name: impl Into<String>,
        path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            name: name.into(),
            short_name: short_name.into(),
            path: path.into(),
            dependencies: BTreeSet::new(),
        }
    }

    /// Add dependencies by short name.
    #[must_use]
    pub fn with_dependencies<I, S>(mut self, dependencies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.dependencies
            .extend(dependencies.into_iter().map(Into::into));
        self
    }

    /// Whether this is the repository root module.
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.short_name.is_empty()
    }

    /// Name used in user-facing output; the root is shown by its identifier.
    #[must_use]
    pub fn display_name(&self) -> &str {
        if self.is_root() {
            &self.name
        } else {
            &self.short_name
        }
    }
}

/// All modules of a repository, keyed by short name.
#[derive(Debug, Clone)]
pub struct ModuleGraph {
    root: Module,
    modules: BTreeMap<String, Module>,
}

impl ModuleGraph {
    /// Build a graph from the root module and the remaining modules.
    ///
    /// The root is stored under the empty short name. A later module with the
    /// same short name as an earlier one replaces it.
    #[must_use]
    pub fn new(root: Module, modules: impl IntoIterator<Item = Module>) -> Self {
        let mut map: BTreeMap<String, Module> = modules
            .into_iter()
            .map(|module| (module.short_name.clone(), module))
            .collect();
        map.insert(String::new(), root.clone());
        Self { root, modules: map }
    }

    /// The root module.
    #[must_use]
    pub fn root(&self) -> &Module {
        &self.root
    }

    /// Look up a module by short name; the root is found under `""`.
    #[must_use]
    pub fn find_module(&self, short_name: &str) -> Option<&Module> {
        self.modules.get(short_name)
    }

    /// Whether a module with this short name exists.
    #[must_use]
    pub fn contains(&self, short_name: &str) -> bool {
        self.modules.contains_key(short_name)
    }

    /// Number of modules, root included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.modules.len()
    }

    /// Whether the graph holds no modules. Never true for a discovered graph.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    /// Modules that directly depend on `short_name`, sorted by short name.
    #[must_use]
    pub fn dependents(&self, short_name: &str) -> Vec<&Module> {
        self.modules
            .values()
            .filter(|module| module.dependencies.contains(short_name))
            .collect()
    }

    /// All modules sorted by short name.
    #[must_use]
    pub fn all_modules(&self) -> Vec<&Module> {
        self.modules.values().collect()
    }

    /// Order modules so every dependency precedes its dependents.
    ///
    /// Kahn's algorithm over in-repository edges only; dependencies that are
    /// not modules of this graph do not count towards in-degree. Ready
    /// modules are always taken in ascending short-name order, so identical
    /// graphs produce identical orderings.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DependencyCycle`] naming the modules that take part in
    /// a cycle when the graph is not acyclic.
    pub fn topological_sort(&self) -> Result<Vec<&Module>> {
        let mut in_degree: BTreeMap<&str, usize> = self
            .modules
            .iter()
            .map(|(name, module)| {
                let internal = module
                    .dependencies
                    .iter()
                    .filter(|dep| self.modules.contains_key(dep.as_str()))
                    .count();
                (name.as_str(), internal)
            })
            .collect();

        let mut ready: BTreeSet<&str> = in_degree
            .iter()
            .filter(|(_, degree)| **degree == 0)
            .map(|(name, _)| *name)
            .collect();

        let mut sorted = Vec::with_capacity(self.modules.len());
        while let Some(name) = ready.pop_first() {
            let Some(module) = self.modules.get(name) else {
                continue;
            };
            sorted.push(module);

            for dependent in self.dependents(name) {
                if let Some(degree) = in_degree.get_mut(dependent.short_name.as_str()) {
                    *degree = degree.saturating_sub(1);
                    if *degree == 0 {
                        ready.insert(dependent.short_name.as_str());
                    }
                }
            }
        }

        if sorted.len() < self.modules.len() {
            let modules = self.cycle_members();
            debug!(?modules, "Topological sort stopped on a cycle");
            return Err(Error::DependencyCycle { modules });
        }

        Ok(sorted)
    }

    /// Short names of every module that sits on a dependency cycle, sorted.
    fn cycle_members(&self) -> Vec<String> {
        let mut edges: DiGraphMap<&str, ()> = DiGraphMap::new();
        for (name, module) in &self.modules {
            edges.add_node(name.as_str());
            for dep in &module.dependencies {
                if self.modules.contains_key(dep.as_str()) {
                    edges.add_edge(dep.as_str(), name.as_str(), ());
                }
            }
        }

        let mut members: Vec<String> = tarjan_scc(&edges)
            .into_iter()
            .filter(|component| {
                component.len() > 1 || component.iter().any(|n| edges.contains_edge(n, n))
            })
            .flatten()
            .map(|name| {
                if name.is_empty() {
                    self.root.name.clone()
                } else {
                    name.to_string()
                }
            })
            .collect();
        members.sort();
        members
    }
}

//! Property-based tests for release planning invariants.
//!
//! These tests verify:
//! - Topological sort places every dependency before its dependents
//! - Ready modules are emitted in ascending short-name order
//! - Bump aggregation takes the maximum and ignores duplicates
//! - Cascade reaches every transitive dependent without raising explicit bumps

use monover_release::{
    Bump, Changeset, Config, Module, ModuleGraph, ReleaseReason, compute_releases,
};
use proptest::prelude::*;
use std::collections::{BTreeMap, BTreeSet};

// =============================================================================
// Strategies for generating test data
// =============================================================================

fn bump_strategy() -> impl Strategy<Value = Bump> {
    prop_oneof![Just(Bump::Patch), Just(Bump::Minor), Just(Bump::Major)]
}

/// Generate an acyclic module set as `(short_name, dependencies)` pairs.
///
/// Module `i` may only depend on modules with a lower index, which rules out
/// cycles. Names are shuffled relative to indices so that lexical order and
/// dependency order disagree.
fn dag_strategy(max_modules: usize) -> impl Strategy<Value = Vec<(String, Vec<String>)>> {
    (1..=max_modules).prop_flat_map(|count| {
        let edges =
            proptest::collection::vec(proptest::collection::vec(any::<bool>(), count), count);
        let order = Just((0..count).collect::<Vec<_>>()).prop_shuffle();
        (edges, order).prop_map(move |(edges, order)| {
            let names: Vec<String> = order.iter().map(|n| format!("mod{n:02}")).collect();
            (0..count)
                .map(|i| {
                    let deps = (0..i)
                        .filter(|&j| edges[i][j])
                        .map(|j| names[j].clone())
                        .collect();
                    (names[i].clone(), deps)
                })
                .collect()
        })
    })
}

fn build_graph(layout: &[(String, Vec<String>)]) -> ModuleGraph {
    let modules = layout.iter().map(|(name, deps)| {
        Module::new(format!("example.com/repo/{name}"), name.as_str(), format!("/repo/{name}"))
            .with_dependencies(deps.iter().cloned())
    });
    ModuleGraph::new(Module::new("example.com/repo", "", "/repo"), modules)
}

/// Every module reachable from `start` through reverse dependency edges.
fn transitive_dependents(graph: &ModuleGraph, start: &BTreeSet<String>) -> BTreeSet<String> {
    let mut seen: BTreeSet<String> = start.clone();
    let mut frontier: Vec<String> = start.iter().cloned().collect();
    while let Some(name) = frontier.pop() {
        for dependent in graph.dependents(&name) {
            if seen.insert(dependent.short_name.clone()) {
                frontier.push(dependent.short_name.clone());
            }
        }
    }
    seen
}

// =============================================================================
// Property Tests
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Every dependency appears strictly before its dependent.
    #[test]
    fn topological_sort_respects_dependencies(layout in dag_strategy(12)) {
        let graph = build_graph(&layout);
        let sorted = graph.topological_sort().unwrap();
        prop_assert_eq!(sorted.len(), graph.len());

        let position: BTreeMap<&str, usize> = sorted
            .iter()
            .enumerate()
            .map(|(idx, m)| (m.short_name.as_str(), idx))
            .collect();

        for module in &sorted {
            for dep in &module.dependencies {
                prop_assert!(
                    position[dep.as_str()] < position[module.short_name.as_str()],
                    "{} must precede {}", dep, module.short_name
                );
            }
        }
    }

    /// The sort is a pure function of the graph, and modules without any
    /// dependencies come out in ascending order relative to each other.
    #[test]
    fn topological_sort_is_deterministic(layout in dag_strategy(10)) {
        let first: Vec<String> = build_graph(&layout)
            .topological_sort()
            .unwrap()
            .iter()
            .map(|m| m.short_name.clone())
            .collect();

        let mut reversed = layout.clone();
        reversed.reverse();
        let second: Vec<String> = build_graph(&reversed)
            .topological_sort()
            .unwrap()
            .iter()
            .map(|m| m.short_name.clone())
            .collect();
        prop_assert_eq!(&first, &second);

        let independent: Vec<&String> = first
            .iter()
            .filter(|name| layout.iter().any(|(n, deps)| n == *name && deps.is_empty()))
            .collect();
        let mut sorted = independent.clone();
        sorted.sort();
        prop_assert_eq!(independent, sorted);
    }

    /// Bump ordering is a total order consistent with patch < minor < major.
    #[test]
    fn bump_max_is_commutative_and_ordered(a in bump_strategy(), b in bump_strategy()) {
        prop_assert_eq!(a.max(b), b.max(a));
        prop_assert!(a.max(b) >= a && a.max(b) >= b);
        let rank = |bump: Bump| match bump {
            Bump::Patch => 0,
            Bump::Minor => 1,
            Bump::Major => 2,
        };
        prop_assert_eq!(a.cmp(&b), rank(a).cmp(&rank(b)));
    }

    /// Adding a duplicate changeset never changes the computed plan.
    #[test]
    fn duplicate_changesets_are_idempotent(
        layout in dag_strategy(8),
        picks in proptest::collection::vec((any::<prop::sample::Index>(), bump_strategy()), 1..4),
    ) {
        let graph = build_graph(&layout);
        let names: Vec<&String> = layout.iter().map(|(n, _)| n).collect();
        let modules: BTreeMap<String, Bump> = picks
            .iter()
            .map(|(idx, bump)| (idx.get(&names).to_string(), *bump))
            .collect();

        let one = vec![Changeset::with_id("one", modules.clone(), "change")];
        let mut two = one.clone();
        two.push(Changeset::with_id("two", modules, "change"));

        let config = Config::default();
        let versions = BTreeMap::new();
        prop_assert_eq!(
            compute_releases(&one, &graph, &versions, &config).unwrap(),
            compute_releases(&two, &graph, &versions, &config).unwrap()
        );
    }

    /// Cascade covers exactly the transitive dependents of explicitly bumped
    /// modules, and explicit bumps survive unchanged.
    #[test]
    fn cascade_reaches_transitive_dependents(
        layout in dag_strategy(10),
        picks in proptest::collection::vec((any::<prop::sample::Index>(), bump_strategy()), 1..4),
        dependent_bump in bump_strategy(),
    ) {
        let graph = build_graph(&layout);
        let names: Vec<&String> = layout.iter().map(|(n, _)| n).collect();
        let changesets: Vec<Changeset> = picks
            .iter()
            .enumerate()
            .map(|(i, (idx, bump))| {
                Changeset::with_id(
                    format!("cs-{i}"),
                    BTreeMap::from([(idx.get(&names).to_string(), *bump)]),
                    "change",
                )
            })
            .collect();

        let mut explicit: BTreeMap<String, Bump> = BTreeMap::new();
        for cs in &changesets {
            for (module, bump) in &cs.modules {
                let entry = explicit.entry(module.clone()).or_insert(*bump);
                *entry = Bump::max(*entry, *bump);
            }
        }

        let config = Config { dependent_bump, ..Config::default() };
        let releases = compute_releases(&changesets, &graph, &BTreeMap::new(), &config).unwrap();

        let released: BTreeSet<String> = releases.iter().map(|r| r.module.clone()).collect();
        let expected = transitive_dependents(&graph, &explicit.keys().cloned().collect());
        prop_assert_eq!(&released, &expected);

        for release in &releases {
            match explicit.get(&release.module) {
                Some(bump) => {
                    prop_assert_eq!(release.bump, *bump);
                    prop_assert_eq!(release.reason, None);
                }
                None => {
                    prop_assert_eq!(release.bump, dependent_bump);
                    prop_assert_eq!(release.reason, Some(ReleaseReason::Dependency));
                }
            }
        }

        let order: Vec<&String> = releases.iter().map(|r| &r.module).collect();
        let mut sorted = order.clone();
        sorted.sort();
        prop_assert_eq!(order, sorted);
    }
}

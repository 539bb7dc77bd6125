//! Coupling metrics data structures
//!
//! Package metrics as described by Robert C. Martin
//! (<https://en.wikipedia.org/wiki/Software_package_metrics>):
//!
//! - **Ca** (afferent coupling): modules that depend on this one
//! - **Ce** (efferent coupling): modules this one depends on
//! - **I** (instability): `Ce / (Ce + Ca)`
//! - **A** (abstractness): abstract declarations / all declarations
//! - **D** (distance from the main sequence): `|A + I - 1|`
//!
//! Every map is ordered so two runs over the same tree serialize identically.

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::path::PathBuf;

use serde::Serialize;

use crate::naming::strip_root_segment;

/// Per-module input to the aggregation, merged across all files that map to
/// the same (grouped) identifier
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModuleContribution {
    pub abstract_count: usize,
    pub concrete_count: usize,
    /// Grouped identifiers this module imports from, never itself
    pub dependencies: BTreeSet<String>,
}

impl ModuleContribution {
    pub fn merge(&mut self, other: ModuleContribution) {
        self.abstract_count += other.abstract_count;
        self.concrete_count += other.concrete_count;
        self.dependencies.extend(other.dependencies);
    }
}

/// One line of the dependency diagram, root namespace stripped from both ends
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct DiagramEdge {
    pub from: String,
    pub to: String,
}

/// A file, or a directory the walk could not read, left out of the aggregation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedFile {
    pub path: PathBuf,
    pub reason: String,
}

/// The complete result of one analysis run
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CouplingMetrics {
    /// Root namespace that was analyzed
    pub package_name: String,
    /// Grouping level the identifiers were truncated to
    pub level: i32,

    pub afferent_count: BTreeMap<String, usize>,
    pub efferent_count: BTreeMap<String, usize>,
    /// Only for modules declaring at least one function or class
    pub abstractness: BTreeMap<String, f64>,
    /// Only for modules with at least one incoming or outgoing edge
    pub instability: BTreeMap<String, f64>,
    /// Defined wherever instability is
    pub distance_to_main_seq: BTreeMap<String, f64>,

    pub afferent_set: BTreeMap<String, BTreeSet<String>>,
    pub efferent_set: BTreeMap<String, BTreeSet<String>>,

    pub diagram_edges: BTreeSet<DiagramEdge>,

    /// Source files that contributed to the result
    pub total_files: usize,
    pub skipped_files: Vec<SkippedFile>,
}

impl CouplingMetrics {
    /// Build the aggregate from per-module contributions
    pub fn aggregate(
        package_name: impl Into<String>,
        level: i32,
        modules: BTreeMap<String, ModuleContribution>,
    ) -> Self {
        let mut metrics = CouplingMetrics {
            package_name: package_name.into(),
            level,
            ..Default::default()
        };

        // every module seen as a source or a target gets an entry in both sets
        for (module, contribution) in &modules {
            metrics
                .efferent_set
                .entry(module.clone())
                .or_default()
                .extend(contribution.dependencies.iter().cloned());
            metrics.afferent_set.entry(module.clone()).or_default();
            for dependency in &contribution.dependencies {
                metrics.efferent_set.entry(dependency.clone()).or_default();
                metrics
                    .afferent_set
                    .entry(dependency.clone())
                    .or_default()
                    .insert(module.clone());
            }
        }

        for (module, deps) in &metrics.efferent_set {
            metrics.efferent_count.insert(module.clone(), deps.len());
            for dep in deps {
                metrics.diagram_edges.insert(DiagramEdge {
                    from: strip_root_segment(module),
                    to: strip_root_segment(dep),
                });
            }
        }
        for (module, dependents) in &metrics.afferent_set {
            metrics.afferent_count.insert(module.clone(), dependents.len());
        }

        for (module, contribution) in &modules {
            let total = contribution.abstract_count + contribution.concrete_count;
            if total > 0 {
                metrics.abstractness.insert(
                    module.clone(),
                    contribution.abstract_count as f64 / total as f64,
                );
            }
        }

        for module in metrics.efferent_count.keys() {
            let efferent = metrics.efferent_count.get(module).copied().unwrap_or(0);
            let afferent = metrics.afferent_count.get(module).copied().unwrap_or(0);
            if efferent + afferent == 0 {
                continue;
            }
            let instability = efferent as f64 / (efferent + afferent) as f64;
            let abstractness = metrics.abstractness.get(module).copied().unwrap_or(0.0);

            metrics.instability.insert(module.clone(), instability);
            metrics
                .distance_to_main_seq
                .insert(module.clone(), (abstractness + instability - 1.0).abs());
        }

        metrics
    }

    /// All module identifiers known to the result
    pub fn module_names(&self) -> impl Iterator<Item = &str> {
        self.efferent_set.keys().map(String::as_str)
    }

    pub fn module_count(&self) -> usize {
        self.efferent_set.len()
    }

    /// Number of distinct module-to-module dependencies
    pub fn dependency_count(&self) -> usize {
        self.efferent_set.values().map(BTreeSet::len).sum()
    }

    /// Abstractness, with modules that declare nothing treated as fully concrete
    pub fn abstractness_or_zero(&self, module: &str) -> f64 {
        self.abstractness.get(module).copied().unwrap_or(0.0)
    }

    /// Detect circular dependencies between modules
    ///
    /// Returns a list of cycles, where each cycle is a list of module names
    /// forming the circular dependency chain.
    pub fn detect_circular_dependencies(&self) -> Vec<Vec<String>> {
        let mut cycles: Vec<Vec<String>> = Vec::new();
        let mut visited: HashSet<&str> = HashSet::new();
        let mut rec_stack: HashSet<&str> = HashSet::new();

        for node in self.efferent_set.keys() {
            if !visited.contains(node.as_str()) {
                let mut path = Vec::new();
                self.dfs_find_cycles(node, &mut visited, &mut rec_stack, &mut path, &mut cycles);
            }
        }

        // the same cycle can be detected from different starting points
        let mut seen: HashSet<Vec<String>> = HashSet::new();
        cycles
            .into_iter()
            .map(|cycle| Self::normalize_cycle(&cycle))
            .filter(|cycle| seen.insert(cycle.clone()))
            .collect()
    }

    fn dfs_find_cycles<'a>(
        &'a self,
        node: &'a str,
        visited: &mut HashSet<&'a str>,
        rec_stack: &mut HashSet<&'a str>,
        path: &mut Vec<&'a str>,
        cycles: &mut Vec<Vec<String>>,
    ) {
        visited.insert(node);
        rec_stack.insert(node);
        path.push(node);

        if let Some(neighbors) = self.efferent_set.get(node) {
            for neighbor in neighbors {
                let neighbor = neighbor.as_str();
                if !visited.contains(neighbor) {
                    self.dfs_find_cycles(neighbor, visited, rec_stack, path, cycles);
                } else if rec_stack.contains(neighbor)
                    && let Some(start_idx) = path.iter().position(|n| *n == neighbor)
                {
                    let cycle = &path[start_idx..];
                    if cycle.len() >= 2 {
                        cycles.push(cycle.iter().map(|s| s.to_string()).collect());
                    }
                }
            }
        }

        path.pop();
        rec_stack.remove(node);
    }

    /// Rotates the cycle so the lexicographically smallest element is first
    fn normalize_cycle(cycle: &[String]) -> Vec<String> {
        let min_pos = cycle
            .iter()
            .enumerate()
            .min_by_key(|(_, s)| s.as_str())
            .map(|(i, _)| i)
            .unwrap_or(0);

        let mut normalized: Vec<String> = cycle[min_pos..].to_vec();
        normalized.extend_from_slice(&cycle[..min_pos]);
        normalized
    }
}

//! Internal package dependency graph.
//!
//! Built from each package's resolved internal dependencies. An edge
//! `a -> b` means package `a` imports package `b`.

use std::collections::{BTreeMap, BTreeSet};

use petgraph::algo::{tarjan_scc, toposort};
use petgraph::graph::{DiGraph, NodeIndex};
use rayon::prelude::*;

use crate::core::workspace::Workspace;
use crate::resolver::resolve_imports;
use crate::util::diagnostic::Diagnostic;

/// Dependency graph over the packages of a workspace.
#[derive(Debug)]
pub struct PackageGraph {
    graph: DiGraph<String, ()>,
    nodes: BTreeMap<String, NodeIndex>,
}

impl PackageGraph {
    /// Build the graph from `(package, internal dependency names)` pairs.
    pub fn from_edges<'a>(
        packages: impl IntoIterator<Item = (&'a str, BTreeSet<String>)>,
    ) -> Self {
        let mut graph = DiGraph::new();
        let mut nodes = BTreeMap::new();
        let mut edges = Vec::new();

        for (name, deps) in packages {
            let from = *nodes
                .entry(name.to_string())
                .or_insert_with(|| graph.add_node(name.to_string()));
            for dep in deps {
                edges.push((from, dep));
            }
        }

        for (from, dep) in edges {
            let to = *nodes
                .entry(dep.clone())
                .or_insert_with(|| graph.add_node(dep));
            graph.update_edge(from, to, ());
        }

        PackageGraph { graph, nodes }
    }

    /// Resolve every package of the workspace and connect the results.
    ///
    /// Packages whose configuration fails to load are left without edges.
    pub fn build(ws: &Workspace) -> Self {
        let labels: BTreeMap<String, &str> = ws
            .index()
            .iter()
            .map(|p| (p.dependency_label(), p.name()))
            .collect();

        let packages: Vec<_> = ws.index().iter().collect();
        let resolved: Vec<(&str, BTreeSet<String>)> = packages
            .par_iter()
            .map(|&package| {
                let deps = match ws.effective_config(package) {
                    Ok(config) => {
                        resolve_imports(package, ws.index(), ws.import_map(), &config)
                            .dependencies
                            .internal
                    }
                    Err(err) => {
                        tracing::warn!("{}: {}", package.name(), err);
                        BTreeSet::new()
                    }
                };
                // Labels that are not in-repo packages (hand-written extras) are not nodes
                let names = deps
                    .iter()
                    .filter_map(|label| labels.get(label).map(|n| n.to_string()))
                    .collect();
                (package.name(), names)
            })
            .collect();

        PackageGraph::from_edges(resolved)
    }

    pub fn len(&self) -> usize {
        self.graph.node_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    /// Direct dependencies of `package`, sorted.
    pub fn dependencies(&self, package: &str) -> Vec<&str> {
        let Some(&idx) = self.nodes.get(package) else {
            return Vec::new();
        };
        let mut deps: Vec<&str> = self
            .graph
            .neighbors(idx)
            .map(|n| self.graph[n].as_str())
            .collect();
        deps.sort_unstable();
        deps
    }

    /// Packages ordered so that every package comes after its dependencies.
    ///
    /// Returns `None` if the graph has a cycle.
    pub fn dependency_order(&self) -> Option<Vec<&str>> {
        let mut order = toposort(&self.graph, None).ok()?;
        order.reverse();
        Some(order.into_iter().map(|n| self.graph[n].as_str()).collect())
    }

    /// Every import cycle, each one sorted, in sorted order.
    pub fn cycles(&self) -> Vec<Vec<&str>> {
        let mut cycles: Vec<Vec<&str>> = tarjan_scc(&self.graph)
            .into_iter()
            .filter(|scc| scc.len() > 1 || self.graph.contains_edge(scc[0], scc[0]))
            .map(|scc| {
                let mut names: Vec<&str> = scc.into_iter().map(|n| self.graph[n].as_str()).collect();
                names.sort_unstable();
                names
            })
            .collect();
        cycles.sort();
        cycles
    }

    /// One warning per import cycle.
    pub fn cycle_diagnostics(&self) -> Vec<Diagnostic> {
        self.cycles()
            .into_iter()
            .map(|cycle| {
                Diagnostic::warning(format!("import cycle between packages: {}", cycle.join(", ")))
                    .with_context("Pants cannot build targets that depend on each other")
            })
            .collect()
    }
}

//! Project dependency graph
//!
//! Edges point from a project to the projects it depends on. The move only
//! ever asks the reverse question ("who depends on X"), which is answered from
//! incoming edges.

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;
use std::collections::{BTreeSet, HashMap};

/// Dependency graph for workspace projects
#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    graph: DiGraph<String, ()>,
    node_map: HashMap<String, NodeIndex>,
}

impl DependencyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a graph from `(dependent, dependency)` pairs
    pub fn from_edges<I, S>(edges: I) -> Self
    where
        I: IntoIterator<Item = (S, S)>,
        S: AsRef<str>,
    {
        let mut graph = Self::new();
        for (from, to) in edges {
            graph.add_dependency(from.as_ref(), to.as_ref());
        }
        graph
    }

    /// Add a project node (idempotent)
    pub fn add_project(&mut self, name: &str) -> NodeIndex {
        if let Some(&idx) = self.node_map.get(name) {
            return idx;
        }
        let idx = self.graph.add_node(name.to_string());
        self.node_map.insert(name.to_string(), idx);
        idx
    }

    /// Add a dependency edge: `from` depends on `to`
    pub fn add_dependency(&mut self, from: &str, to: &str) {
        if from == to {
            return;
        }
        let from_idx = self.add_project(from);
        let to_idx = self.add_project(to);
        self.graph.update_edge(from_idx, to_idx, ());
    }

    /// Projects that directly depend on `name`
    pub fn dependents_of(&self, name: &str) -> BTreeSet<String> {
        self.neighbors(name, Direction::Incoming)
    }

    /// Projects that `name` directly depends on
    pub fn dependencies_of(&self, name: &str) -> BTreeSet<String> {
        self.neighbors(name, Direction::Outgoing)
    }

    pub fn project_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn dependency_count(&self) -> usize {
        self.graph.edge_count()
    }

    fn neighbors(&self, name: &str, direction: Direction) -> BTreeSet<String> {
        let Some(&idx) = self.node_map.get(name) else {
            return BTreeSet::new();
        };
        self.graph
            .neighbors_directed(idx, direction)
            .map(|n| self.graph[n].clone())
            .collect()
    }
}

//! Project dependency graph: lazy loading and reverse-dependency memoization
//!
//! Loading the graph is expensive (it may mean scanning every file of the
//! workspace), so the move engine asks for it only on the exported branch and
//! at most once per move. [`DependencyGraphCache`] holds the loaded graph and
//! hands out shared reverse-dependency sets so repeated lookups are free.

use crate::services::import_rewriter::ImportRewriter;
use crate::services::source_index::SourceFileIndex;
use once_cell::unsync::OnceCell;
use reloc_foundation::{DependencyGraph, RelocResult, Workspace};
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use tracing::{debug, info};

/// Where the project dependency graph comes from
pub trait DependencyGraphSource {
    fn load(
        &self,
        workspace: &Workspace,
        index: &mut SourceFileIndex<'_>,
        rewriter: &mut ImportRewriter,
    ) -> RelocResult<DependencyGraph>;
}

/// A graph supplied up front by the caller
impl DependencyGraphSource for DependencyGraph {
    fn load(
        &self,
        _workspace: &Workspace,
        _index: &mut SourceFileIndex<'_>,
        _rewriter: &mut ImportRewriter,
    ) -> RelocResult<DependencyGraph> {
        Ok(self.clone())
    }
}

/// Derives the graph from alias imports found in every project's files
///
/// Project P depends on Q when any source file of P has a specifier equal to
/// Q's alias or starting with `<alias>/`.
#[derive(Debug, Default, Clone, Copy)]
pub struct ImportScanGraphSource;

impl DependencyGraphSource for ImportScanGraphSource {
    fn load(
        &self,
        workspace: &Workspace,
        index: &mut SourceFileIndex<'_>,
        rewriter: &mut ImportRewriter,
    ) -> RelocResult<DependencyGraph> {
        let mut graph = DependencyGraph::new();
        let aliases: Vec<(&str, &str)> = workspace
            .projects()
            .filter_map(|p| workspace.alias_for(&p.name).map(|a| (a, p.name.as_str())))
            .collect();

        for project in workspace.projects() {
            graph.add_project(&project.name);
            let files = index.source_files(&project.root);
            for file in files.iter() {
                for occurrence in rewriter.specifiers(index, file).iter() {
                    if let Some(dependency) = alias_owner(&aliases, &occurrence.value) {
                        graph.add_dependency(&project.name, dependency);
                    }
                }
            }
        }

        info!(
            projects = graph.project_count(),
            dependencies = graph.dependency_count(),
            "Built dependency graph from imports"
        );
        Ok(graph)
    }
}

/// Project publishing the alias that `specifier` imports, if any
fn alias_owner<'a>(aliases: &[(&str, &'a str)], specifier: &str) -> Option<&'a str> {
    aliases
        .iter()
        .filter(|(alias, _)| {
            specifier == *alias
                || (specifier.len() > alias.len()
                    && specifier.starts_with(alias)
                    && specifier.as_bytes()[alias.len()] == b'/')
        })
        .max_by_key(|(alias, _)| alias.len())
        .map(|(_, project)| *project)
}

/// Lazily loaded graph plus memoized reverse lookups
#[derive(Debug, Default)]
pub struct DependencyGraphCache {
    graph: OnceCell<DependencyGraph>,
    dependents: HashMap<String, Arc<BTreeSet<String>>>,
}

impl DependencyGraphCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_loaded(&self) -> bool {
        self.graph.get().is_some()
    }

    /// The graph, loading it on first use
    pub fn graph(
        &self,
        load: impl FnOnce() -> RelocResult<DependencyGraph>,
    ) -> RelocResult<&DependencyGraph> {
        self.graph.get_or_try_init(|| {
            debug!("Loading project dependency graph");
            load()
        })
    }

    /// Projects depending on `project`, shared across repeated calls
    ///
    /// Returns an empty set while the graph is not loaded.
    pub fn dependents(&mut self, project: &str) -> Arc<BTreeSet<String>> {
        let Some(graph) = self.graph.get() else {
            return Arc::new(BTreeSet::new());
        };
        Arc::clone(
            self.dependents
                .entry(project.to_string())
                .or_insert_with(|| Arc::new(graph.dependents_of(project))),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_graph_loads_once() {
        let cache = DependencyGraphCache::new();
        let mut loads = 0;
        for _ in 0..3 {
            cache
                .graph(|| {
                    loads += 1;
                    Ok(DependencyGraph::from_edges([("app", "lib-a")]))
                })
                .unwrap();
        }
        assert_eq!(loads, 1);
        assert!(cache.is_loaded());
    }

    #[test]
    fn test_failed_load_is_retried() {
        let cache = DependencyGraphCache::new();
        assert!(cache
            .graph(|| Err(reloc_foundation::RelocError::graph("unavailable")))
            .is_err());
        assert!(!cache.is_loaded());
        assert!(cache.graph(|| Ok(DependencyGraph::new())).is_ok());
    }

    #[test]
    fn test_dependents_are_shared() {
        let mut cache = DependencyGraphCache::new();
        cache
            .graph(|| {
                Ok(DependencyGraph::from_edges([
                    ("app", "lib-a"),
                    ("lib-b", "lib-a"),
                ]))
            })
            .unwrap();

        let first = cache.dependents("lib-a");
        let second = cache.dependents("lib-a");
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(
            first.iter().cloned().collect::<Vec<_>>(),
            vec!["app".to_string(), "lib-b".to_string()]
        );
        assert!(cache.dependents("app").is_empty());
    }

    #[test]
    fn test_alias_owner_prefers_longest_alias() {
        let aliases = [("@org/ui", "ui"), ("@org/ui/forms", "ui-forms")];
        assert_eq!(alias_owner(&aliases, "@org/ui"), Some("ui"));
        assert_eq!(alias_owner(&aliases, "@org/ui/button"), Some("ui"));
        assert_eq!(alias_owner(&aliases, "@org/ui/forms/input"), Some("ui-forms"));
        assert_eq!(alias_owner(&aliases, "@org/uikit"), None);
    }
}

//! Per-invocation cache arena
//!
//! Everything a move caches lives here and is dropped when the move returns.

use crate::services::dependency_graph::{DependencyGraphCache, DependencyGraphSource};
use crate::services::import_rewriter::ImportRewriter;
use crate::services::parallel_scan::ParallelReferenceScanner;
use crate::services::source_index::SourceFileIndex;
use reloc_config::ScanConfig;
use reloc_foundation::{Project, RelocResult, Tree, Workspace};
use reloc_plugin_api::SpecifierParser;
use std::collections::BTreeSet;
use std::sync::Arc;

pub(crate) struct MoveSession<'t, 'w> {
    pub workspace: &'w Workspace,
    pub index: SourceFileIndex<'t>,
    pub rewriter: ImportRewriter,
    pub scanner: ParallelReferenceScanner,
    graph: DependencyGraphCache,
    graph_source: &'w dyn DependencyGraphSource,
}

impl<'t, 'w> MoveSession<'t, 'w> {
    pub fn new(
        workspace: &'w Workspace,
        tree: &'t mut dyn Tree,
        parser: Arc<dyn SpecifierParser>,
        scan: ScanConfig,
        graph_source: &'w dyn DependencyGraphSource,
    ) -> Self {
        let scanner = ParallelReferenceScanner::new(Arc::clone(&parser), &scan);
        Self {
            workspace,
            index: SourceFileIndex::with_scan_config(tree, scan),
            rewriter: ImportRewriter::new(parser),
            scanner,
            graph: DependencyGraphCache::new(),
            graph_source,
        }
    }

    /// Source files of a project, scanned once per move
    pub fn project_files(&mut self, project: &Project) -> Arc<Vec<String>> {
        self.index.source_files(&project.root)
    }

    /// Projects depending on `project`; loads the graph on first call
    pub fn dependents(&mut self, project: &str) -> RelocResult<Arc<BTreeSet<String>>> {
        let Self {
            workspace,
            index,
            rewriter,
            graph,
            graph_source,
            ..
        } = self;
        graph.graph(|| graph_source.load(workspace, index, rewriter))?;
        Ok(graph.dependents(project))
    }
}

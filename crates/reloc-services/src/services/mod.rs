pub mod dependency_graph;
pub mod import_rewriter;
pub mod move_service;
pub mod parallel_scan;
pub mod source_index;

pub use dependency_graph::{DependencyGraphCache, DependencyGraphSource, ImportScanGraphSource};
pub use import_rewriter::ImportRewriter;
pub use parallel_scan::{ParallelReferenceScanner, SpecifierQuery};
pub use source_index::SourceFileIndex;

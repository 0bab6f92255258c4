//! Foundation Layer - Core types, staging tree and error handling
//!
//! This crate provides the building blocks shared by every reloc crate:
//! - The workspace model (projects, alias table, dependency graph)
//! - The staging tree abstraction that every move reads and writes through
//! - Posix-style path helpers used for specifier math
//! - The error type surfaced by a move

pub mod error;
pub mod graph;
pub mod model;
pub mod paths;
pub mod tree;

// Re-export commonly used types for convenience
pub use error::{RelocError, RelocResult};
pub use graph::DependencyGraph;
pub use model::{Project, ProjectKind, Workspace};
pub use tree::{InMemoryTree, Tree, TreeChange};

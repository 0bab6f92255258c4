//! Staging tree: in-memory view of pending file changes
//!
//! A move never writes to disk directly. It mutates a [`Tree`], and the caller
//! decides whether to commit the recorded changes.

use crate::error::{RelocError, RelocResult};
use std::cell::Cell;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, info};

/// Synchronous, authoritative view of the workspace files
///
/// Paths are workspace-relative and `/`-separated.
pub trait Tree {
    /// True for an existing file or a directory containing files
    fn exists(&self, path: &str) -> bool;
    /// File content, `None` when the file does not exist
    fn read(&self, path: &str) -> Option<String>;
    fn write(&mut self, path: &str, content: &str);
    fn delete(&mut self, path: &str);
    /// Names (not paths) of the immediate children of a directory
    fn children(&self, dir: &str) -> Vec<String>;
    fn is_file(&self, path: &str) -> bool;
}

/// A pending change recorded by [`InMemoryTree`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TreeChange {
    Write(String),
    Delete,
}

/// Call counters, used to observe how much caching saves
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TreeStats {
    pub exists_calls: usize,
    pub read_calls: usize,
    pub children_calls: usize,
}

/// Map-backed staging tree
#[derive(Debug, Default)]
pub struct InMemoryTree {
    files: BTreeMap<String, String>,
    changes: BTreeMap<String, TreeChange>,
    exists_calls: Cell<usize>,
    read_calls: Cell<usize>,
    children_calls: Cell<usize>,
}

impl InMemoryTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a file without recording it as a change
    pub fn with_file(mut self, path: &str, content: &str) -> Self {
        self.insert_base(path, content);
        self
    }

    /// Seed a file without recording it as a change
    pub fn insert_base(&mut self, path: &str, content: &str) {
        self.files.insert(path.to_string(), content.to_string());
    }

    /// Load every non-ignored UTF-8 file below `root` (honours `.gitignore`)
    pub fn load_from_disk(root: &Path) -> RelocResult<Self> {
        let mut tree = Self::new();
        let walker = ignore::WalkBuilder::new(root).hidden(true).build();

        for entry in walker {
            let entry = entry.map_err(|e| {
                RelocError::io(root.display().to_string(), std::io::Error::other(e))
            })?;
            if !entry.file_type().is_some_and(|t| t.is_file()) {
                continue;
            }
            let Ok(relative) = entry.path().strip_prefix(root) else {
                continue;
            };
            let relative = relative.to_string_lossy().replace('\\', "/");
            match std::fs::read_to_string(entry.path()) {
                Ok(content) => tree.insert_base(&relative, &content),
                Err(e) => debug!(path = %relative, error = %e, "Skipping unreadable file"),
            }
        }

        info!(
            root = %root.display(),
            files = tree.files.len(),
            "Loaded staging tree from disk"
        );
        Ok(tree)
    }

    /// Apply recorded changes below `root`, returning how many were applied
    pub fn commit_to_disk(&self, root: &Path) -> RelocResult<usize> {
        for (path, change) in &self.changes {
            let target = root.join(path);
            match change {
                TreeChange::Write(content) => {
                    if let Some(parent) = target.parent() {
                        std::fs::create_dir_all(parent)
                            .map_err(|e| RelocError::io(parent.display().to_string(), e))?;
                    }
                    std::fs::write(&target, content)
                        .map_err(|e| RelocError::io(path.clone(), e))?;
                }
                TreeChange::Delete => {
                    if target.exists() {
                        std::fs::remove_file(&target)
                            .map_err(|e| RelocError::io(path.clone(), e))?;
                    }
                }
            }
        }

        info!(
            root = %root.display(),
            changes = self.changes.len(),
            "Committed staging tree"
        );
        Ok(self.changes.len())
    }

    /// Changes recorded since the tree was seeded, in path order
    pub fn changes(&self) -> &BTreeMap<String, TreeChange> {
        &self.changes
    }

    /// Every file currently in the tree, in path order
    pub fn file_paths(&self) -> impl Iterator<Item = &str> {
        self.files.keys().map(String::as_str)
    }

    pub fn stats(&self) -> TreeStats {
        TreeStats {
            exists_calls: self.exists_calls.get(),
            read_calls: self.read_calls.get(),
            children_calls: self.children_calls.get(),
        }
    }

    /// Files whose path starts with `dir/` (every file when `dir` is empty)
    fn files_below<'a>(&'a self, dir: &'a str) -> impl Iterator<Item = &'a String> + 'a {
        let prefix = if dir.is_empty() {
            String::new()
        } else {
            format!("{dir}/")
        };
        self.files
            .range(prefix.clone()..)
            .map(|(path, _)| path)
            .take_while(move |path| path.starts_with(&prefix))
    }
}

impl Tree for InMemoryTree {
    fn exists(&self, path: &str) -> bool {
        self.exists_calls.set(self.exists_calls.get() + 1);
        self.files.contains_key(path) || self.files_below(path).next().is_some()
    }

    fn read(&self, path: &str) -> Option<String> {
        self.read_calls.set(self.read_calls.get() + 1);
        self.files.get(path).cloned()
    }

    fn write(&mut self, path: &str, content: &str) {
        self.files.insert(path.to_string(), content.to_string());
        self.changes
            .insert(path.to_string(), TreeChange::Write(content.to_string()));
    }

    fn delete(&mut self, path: &str) {
        if self.files.remove(path).is_some() {
            self.changes.insert(path.to_string(), TreeChange::Delete);
        }
    }

    fn children(&self, dir: &str) -> Vec<String> {
        self.children_calls.set(self.children_calls.get() + 1);
        let skip = if dir.is_empty() { 0 } else { dir.len() + 1 };
        let mut names: Vec<String> = self
            .files_below(dir)
            .map(|path| {
                let rest = &path[skip..];
                rest.split('/').next().unwrap_or(rest).to_string()
            })
            .collect();
        names.sort();
        names.dedup();
        names
    }

    fn is_file(&self, path: &str) -> bool {
        self.files.contains_key(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample_tree() -> InMemoryTree {
        InMemoryTree::new()
            .with_file("libs/a/src/index.ts", "export * from './lib/x';\n")
            .with_file("libs/a/src/lib/x.ts", "export const x = 1;\n")
            .with_file("libs/a/src/lib/y.ts", "export const y = 2;\n")
            .with_file("libs/a.ts", "")
    }

    #[test]
    fn test_children_lists_immediate_names() {
        let tree = sample_tree();
        assert_eq!(tree.children("libs/a/src"), vec!["index.ts", "lib"]);
        assert_eq!(tree.children("libs"), vec!["a", "a.ts"]);
        assert_eq!(tree.children(""), vec!["libs"]);
        assert!(tree.children("libs/missing").is_empty());
    }

    #[test]
    fn test_exists_covers_files_and_directories() {
        let tree = sample_tree();
        assert!(tree.exists("libs/a/src/lib"));
        assert!(tree.exists("libs/a/src/lib/x.ts"));
        assert!(!tree.exists("libs/a/src/li"));
        assert!(tree.is_file("libs/a/src/lib/x.ts"));
        assert!(!tree.is_file("libs/a/src/lib"));
    }

    #[test]
    fn test_changes_are_recorded() {
        let mut tree = sample_tree();
        tree.write("libs/b/src/lib/x.ts", "export const x = 1;\n");
        tree.delete("libs/a/src/lib/x.ts");
        tree.delete("libs/never/existed.ts");

        assert_eq!(tree.changes().len(), 2);
        assert_eq!(
            tree.changes().get("libs/a/src/lib/x.ts"),
            Some(&TreeChange::Delete)
        );
        assert!(!tree.exists("libs/a/src/lib/x.ts"));
    }

    #[test]
    fn test_disk_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("libs/a/src")).unwrap();
        std::fs::write(dir.path().join("libs/a/src/x.ts"), "export const x = 1;\n").unwrap();

        let mut tree = InMemoryTree::load_from_disk(dir.path()).unwrap();
        assert!(tree.is_file("libs/a/src/x.ts"));

        tree.write("libs/b/src/x.ts", "export const x = 1;\n");
        tree.delete("libs/a/src/x.ts");
        assert_eq!(tree.commit_to_disk(dir.path()).unwrap(), 2);

        assert!(dir.path().join("libs/b/src/x.ts").exists());
        assert!(!dir.path().join("libs/a/src/x.ts").exists());
    }
}

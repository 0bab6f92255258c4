//! Per-move cache arena over the staging tree
//!
//! `SourceFileIndex` is the only component allowed to touch the [`Tree`]
//! during a move. It memoizes existence checks, file reads and per-project
//! source-file lists, and keeps all three consistent with every write and
//! delete it performs. An index lives for exactly one move invocation.
//!
//! Cached file lists are kept sorted, so a list maintained incrementally is
//! always equal to what a fresh scan of the tree would return.

use reloc_config::ScanConfig;
use reloc_foundation::{paths, Tree};
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use tracing::trace;

/// Cached view of the staging tree for one move
pub struct SourceFileIndex<'t> {
    tree: &'t mut dyn Tree,
    scan: ScanConfig,
    /// Path -> exists
    existence: HashMap<String, bool>,
    /// Path -> content; `None` is the confirmed-missing sentinel
    contents: HashMap<String, Option<Arc<str>>>,
    /// Project root -> sorted source files below it
    file_lists: HashMap<String, Arc<Vec<String>>>,
    /// Paths written or deleted through this index
    touched: BTreeSet<String>,
}

impl<'t> SourceFileIndex<'t> {
    pub fn new(tree: &'t mut dyn Tree) -> Self {
        Self::with_scan_config(tree, ScanConfig::default())
    }

    pub fn with_scan_config(tree: &'t mut dyn Tree, scan: ScanConfig) -> Self {
        Self {
            tree,
            scan,
            existence: HashMap::new(),
            contents: HashMap::new(),
            file_lists: HashMap::new(),
            touched: BTreeSet::new(),
        }
    }

    /// Existence of a file or directory, memoized
    pub fn exists(&mut self, path: &str) -> bool {
        if let Some(known) = self.existence.get(path) {
            return *known;
        }
        let exists = self.tree.exists(path);
        self.existence.insert(path.to_string(), exists);
        exists
    }

    /// File content, memoized; `None` when the file does not exist
    pub fn read(&mut self, path: &str) -> Option<Arc<str>> {
        if let Some(cached) = self.contents.get(path) {
            return cached.clone();
        }
        let content: Option<Arc<str>> = self.tree.read(path).map(Arc::from);
        self.contents.insert(path.to_string(), content.clone());
        content
    }

    /// True for a regular file (directories report false); not memoized
    pub fn is_file(&self, path: &str) -> bool {
        self.tree.is_file(path)
    }

    /// Drop the cached content of one path
    pub fn invalidate(&mut self, path: &str) {
        self.contents.remove(path);
    }

    /// Write through to the tree and update every cache the write affects
    pub fn write(&mut self, path: &str, content: &str) {
        self.tree.write(path, content);
        self.touched.insert(path.to_string());

        self.existence.insert(path.to_string(), true);
        let mut dir = paths::dirname(path);
        while !dir.is_empty() {
            if let Some(known) = self.existence.get_mut(dir) {
                *known = true;
            }
            dir = paths::dirname(dir);
        }
        self.invalidate(path);

        let roots: Vec<String> = self.file_lists.keys().cloned().collect();
        for root in roots {
            self.insert_listed(&root, path);
        }
        trace!(path = %path, "Wrote file");
    }

    /// Delete through the tree and update every cache the delete affects
    pub fn delete(&mut self, path: &str) {
        self.tree.delete(path);
        self.touched.insert(path.to_string());

        self.existence.insert(path.to_string(), false);
        // An ancestor directory may have disappeared with its last file.
        let mut dir = paths::dirname(path);
        while !dir.is_empty() {
            self.existence.remove(dir);
            dir = paths::dirname(dir);
        }
        self.invalidate(path);

        for files in self.file_lists.values_mut() {
            if let Ok(pos) = files.binary_search_by(|f| f.as_str().cmp(path)) {
                Arc::make_mut(files).remove(pos);
            }
        }
        trace!(path = %path, "Deleted file");
    }

    /// Sorted source files below `project_root`, scanned once per root
    pub fn source_files(&mut self, project_root: &str) -> Arc<Vec<String>> {
        if let Some(files) = self.file_lists.get(project_root) {
            return Arc::clone(files);
        }
        let files = Arc::new(self.scan(project_root));
        self.file_lists
            .insert(project_root.to_string(), Arc::clone(&files));
        files
    }

    /// Reflect a move in the cached list of one root without touching the tree
    ///
    /// Removes `old_path` and inserts `new_path` (when given) at its sorted
    /// position. Does nothing for a root whose list has not been scanned yet.
    pub fn update_source_files(&mut self, project_root: &str, old_path: &str, new_path: Option<&str>) {
        if let Some(files) = self.file_lists.get_mut(project_root) {
            if let Ok(pos) = files.binary_search_by(|f| f.as_str().cmp(old_path)) {
                Arc::make_mut(files).remove(pos);
            }
        }
        if let Some(new_path) = new_path {
            self.insert_listed(project_root, new_path);
        }
    }

    /// True when the path carries a configured source extension
    pub fn is_source_file(&self, path: &str) -> bool {
        paths::has_extension(path, &self.scan.source_extensions)
    }

    /// Every path written or deleted so far, sorted
    pub fn touched(&self) -> &BTreeSet<String> {
        &self.touched
    }

    fn insert_listed(&mut self, project_root: &str, path: &str) {
        if !self.belongs_in_list(project_root, path) {
            return;
        }
        if let Some(files) = self.file_lists.get_mut(project_root) {
            if let Err(pos) = files.binary_search_by(|f| f.as_str().cmp(path)) {
                Arc::make_mut(files).insert(pos, path.to_string());
            }
            debug_assert!(files.windows(2).all(|w| w[0] < w[1]), "file list out of order");
        }
    }

    /// Whether a scan of `project_root` would report `path`
    fn belongs_in_list(&self, project_root: &str, path: &str) -> bool {
        if path == project_root || !paths::is_within(path, project_root) || !self.is_source_file(path) {
            return false;
        }
        let relative = if project_root.is_empty() {
            path
        } else {
            &path[project_root.len() + 1..]
        };
        let dir = paths::dirname(relative);
        dir.is_empty() || dir.split('/').all(|segment| !self.skips_directory(segment))
    }

    fn skips_directory(&self, name: &str) -> bool {
        name.starts_with('.') || self.scan.ignored_directories.iter().any(|d| d == name)
    }

    fn scan(&self, project_root: &str) -> Vec<String> {
        let mut files = Vec::new();
        let mut pending = vec![project_root.to_string()];

        while let Some(dir) = pending.pop() {
            for name in self.tree.children(&dir) {
                let path = paths::join(&dir, &name);
                if self.tree.is_file(&path) {
                    if self.is_source_file(&path) {
                        files.push(path);
                    }
                } else if !self.skips_directory(&name) {
                    pending.push(path);
                }
            }
        }

        files.sort();
        trace!(root = %project_root, files = files.len(), "Scanned project files");
        files
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use reloc_foundation::InMemoryTree;

    fn tree() -> InMemoryTree {
        InMemoryTree::new()
            .with_file("libs/a/src/index.ts", "export * from './lib/x';\n")
            .with_file("libs/a/src/lib/x.ts", "export const x = 1;\n")
            .with_file("libs/a/src/lib/y.tsx", "export const y = 2;\n")
            .with_file("libs/a/README.md", "# a\n")
            .with_file("libs/a/node_modules/dep/index.js", "module.exports = 1;\n")
            .with_file("libs/a/.cache/z.ts", "export {};\n")
            .with_file("libs/b/src/index.ts", "export {};\n")
    }

    #[test]
    fn test_source_files_are_sorted_and_filtered() {
        let mut tree = tree();
        let mut index = SourceFileIndex::new(&mut tree);
        assert_eq!(
            *index.source_files("libs/a"),
            vec![
                "libs/a/src/index.ts".to_string(),
                "libs/a/src/lib/x.ts".to_string(),
                "libs/a/src/lib/y.tsx".to_string(),
            ]
        );
    }

    #[test]
    fn test_reads_are_memoized() {
        let mut tree = tree();
        {
            let mut index = SourceFileIndex::new(&mut tree);
            let first = index.read("libs/a/src/lib/x.ts").unwrap();
            let second = index.read("libs/a/src/lib/x.ts").unwrap();
            assert!(Arc::ptr_eq(&first, &second));
            assert!(index.read("libs/a/src/missing.ts").is_none());
            assert!(index.read("libs/a/src/missing.ts").is_none());
            assert!(index.exists("libs/a/src"));
            assert!(index.exists("libs/a/src"));
        }
        let stats = tree.stats();
        assert_eq!(stats.read_calls, 2);
        assert_eq!(stats.exists_calls, 1);
    }

    #[test]
    fn test_write_updates_every_cache() {
        let mut tree = tree();
        let mut index = SourceFileIndex::new(&mut tree);
        index.source_files("libs/a");
        assert!(!index.exists("libs/a/src/lib/new.ts"));
        assert!(!index.exists("libs/a/src/feature"));
        index.read("libs/a/src/lib/x.ts");

        index.write("libs/a/src/feature/new.ts", "export const n = 1;\n");
        index.write("libs/a/src/lib/x.ts", "export const x = 2;\n");

        assert!(index.exists("libs/a/src/feature/new.ts"));
        assert!(index.exists("libs/a/src/feature"));
        assert_eq!(&*index.read("libs/a/src/lib/x.ts").unwrap(), "export const x = 2;\n");
        assert!(index
            .source_files("libs/a")
            .contains(&"libs/a/src/feature/new.ts".to_string()));
        assert_eq!(
            index.touched().iter().cloned().collect::<Vec<_>>(),
            vec!["libs/a/src/feature/new.ts".to_string(), "libs/a/src/lib/x.ts".to_string()]
        );
    }

    #[test]
    fn test_write_into_ignored_directory_is_not_listed() {
        let mut tree = tree();
        let mut index = SourceFileIndex::new(&mut tree);
        index.source_files("libs/a");
        index.write("libs/a/dist/out.js", "1;\n");
        index.write("libs/a/src/notes.md", "x\n");
        assert_eq!(index.source_files("libs/a").len(), 3);
    }

    #[test]
    fn test_delete_updates_every_cache() {
        let mut tree = tree();
        let mut index = SourceFileIndex::new(&mut tree);
        index.source_files("libs/a");
        index.read("libs/a/src/lib/y.tsx");

        index.delete("libs/a/src/lib/y.tsx");

        assert!(!index.exists("libs/a/src/lib/y.tsx"));
        assert!(index.read("libs/a/src/lib/y.tsx").is_none());
        assert!(!index
            .source_files("libs/a")
            .contains(&"libs/a/src/lib/y.tsx".to_string()));
    }

    #[test]
    fn test_update_source_files_does_not_touch_tree() {
        let mut tree = tree();
        let mut index = SourceFileIndex::new(&mut tree);
        index.source_files("libs/a");
        index.source_files("libs/b");

        index.update_source_files("libs/a", "libs/a/src/lib/x.ts", None);
        index.update_source_files("libs/b", "libs/a/src/lib/x.ts", Some("libs/b/src/lib/x.ts"));
        index.update_source_files("libs/b", "libs/a/src/lib/x.ts", Some("libs/b/src/lib/x.ts"));

        assert_eq!(index.source_files("libs/a").len(), 2);
        assert_eq!(
            *index.source_files("libs/b"),
            vec!["libs/b/src/index.ts".to_string(), "libs/b/src/lib/x.ts".to_string()]
        );
        assert!(index.touched().is_empty());
    }

    #[test]
    fn test_held_list_is_not_mutated_by_later_writes() {
        let mut tree = tree();
        let mut index = SourceFileIndex::new(&mut tree);
        let before = index.source_files("libs/b");
        index.write("libs/b/src/lib/z.ts", "export {};\n");
        assert_eq!(before.len(), 1);
        assert_eq!(index.source_files("libs/b").len(), 2);
    }
}

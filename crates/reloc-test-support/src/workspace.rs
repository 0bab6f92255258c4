use std::fs;
use std::path::Path;
use tempfile::{tempdir, TempDir};

/// Manages a temporary on-disk workspace for a test scenario.
/// Cleans up automatically when dropped.
pub struct TestWorkspace {
    pub temp_dir: TempDir,
}

impl Default for TestWorkspace {
    fn default() -> Self {
        Self::new()
    }
}

impl TestWorkspace {
    /// Creates a new empty workspace.
    pub fn new() -> Self {
        Self {
            temp_dir: tempdir().expect("Failed to create temp dir"),
        }
    }

    /// Returns the root path of the workspace.
    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Creates a file with content, creating parent directories.
    pub fn create_file(&self, rel_path: &str, content: &str) {
        let file_path = self.path().join(rel_path);
        if let Some(parent) = file_path.parent() {
            fs::create_dir_all(parent).unwrap_or_else(|e| {
                panic!("Failed to create parent dirs for '{}': {}", rel_path, e)
            });
        }
        fs::write(&file_path, content)
            .unwrap_or_else(|e| panic!("Failed to write file '{}': {}", file_path.display(), e));
    }

    /// Reads a file from the workspace.
    pub fn read_file(&self, rel_path: &str) -> String {
        let file_path = self.path().join(rel_path);
        fs::read_to_string(&file_path)
            .unwrap_or_else(|e| panic!("Failed to read file '{}': {}", file_path.display(), e))
    }

    /// Check if a file exists in the workspace.
    pub fn file_exists(&self, rel_path: &str) -> bool {
        self.path().join(rel_path).exists()
    }

    /// Writes a `tsconfig.base.json` publishing the given `(alias, entry point)` pairs.
    pub fn create_tsconfig_base(&self, aliases: &[(&str, &str)]) {
        let paths: serde_json::Map<String, serde_json::Value> = aliases
            .iter()
            .map(|(alias, entry)| (alias.to_string(), serde_json::json!([entry])))
            .collect();
        let tsconfig = serde_json::json!({
            "compilerOptions": {
                "baseUrl": ".",
                "paths": paths
            }
        });
        let content = serde_json::to_string_pretty(&tsconfig)
            .unwrap_or_else(|e| panic!("Failed to serialize tsconfig: {}", e));
        self.create_file("tsconfig.base.json", &content);
    }
}

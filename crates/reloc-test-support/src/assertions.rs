//! Custom assertions for staging-tree state
//!
//! Failure messages name the path and show the file, which plain
//! `assert!(tree.read(..).contains(..))` would not.

use pretty_assertions::assert_eq;
use reloc_foundation::Tree;

/// Assert that `path` exists with exactly `expected` as content
pub fn assert_file_content(tree: &dyn Tree, path: &str, expected: &str) {
    match tree.read(path) {
        Some(actual) => assert_eq!(actual, expected, "unexpected content in {path}"),
        None => panic!("expected {path} to exist"),
    }
}

/// Assert that `path` exists and contains `needle`
pub fn assert_file_contains(tree: &dyn Tree, path: &str, needle: &str) {
    let Some(actual) = tree.read(path) else {
        panic!("expected {path} to exist");
    };
    assert!(
        actual.contains(needle),
        "expected {path} to contain {needle:?}, got:\n{actual}"
    );
}

/// Assert that `path` exists and does not contain `needle`
pub fn assert_file_lacks(tree: &dyn Tree, path: &str, needle: &str) {
    let Some(actual) = tree.read(path) else {
        panic!("expected {path} to exist");
    };
    assert!(
        !actual.contains(needle),
        "expected {path} not to contain {needle:?}, got:\n{actual}"
    );
}

/// Assert that `path` is gone
pub fn assert_file_missing(tree: &dyn Tree, path: &str) {
    assert!(!tree.exists(path), "expected {path} to be deleted");
}

//! Posix-style path helpers for workspace-relative paths and module specifiers
//!
//! Every path handled by reloc is workspace-relative and `/`-separated, the
//! same shape the staging tree uses. Specifier math (resolving `./a` from an
//! importing file, computing the new relative specifier after a move) lives
//! here so the resolver, the strategies and the rewriter agree on it.

use crate::error::{RelocError, RelocResult};
use std::path::Path;

/// File extensions treated as ECMAScript-like source files.
pub const SOURCE_EXTENSIONS: &[&str] = &["ts", "tsx", "js", "jsx", "mts", "cts", "mjs", "cjs"];

/// Normalize a workspace-relative path.
///
/// Converts `\` to `/`, drops empty and `.` segments and folds `..`. Returns
/// `None` when the path climbs above the workspace root.
pub fn normalize(path: &str) -> Option<String> {
    let mut segments: Vec<&str> = Vec::new();
    let unified = path.replace('\\', "/");
    for segment in unified.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop()?;
            }
            other => segments.push(other),
        }
    }
    Some(segments.join("/"))
}

/// Normalize a path, rejecting one that escapes the workspace root.
pub fn normalize_checked(path: &str) -> RelocResult<String> {
    normalize(path).ok_or_else(|| RelocError::invalid_path(path))
}

/// Directory part of a path (`""` for a top-level entry).
pub fn dirname(path: &str) -> &str {
    match path.rfind('/') {
        Some(idx) => &path[..idx],
        None => "",
    }
}

/// Final segment of a path.
pub fn basename(path: &str) -> &str {
    match path.rfind('/') {
        Some(idx) => &path[idx + 1..],
        None => path,
    }
}

/// Join a directory and a relative path without normalizing.
pub fn join(dir: &str, rel: &str) -> String {
    if dir.is_empty() {
        rel.to_string()
    } else if rel.is_empty() {
        dir.to_string()
    } else {
        format!("{dir}/{rel}")
    }
}

/// True when `path` is `root` itself or lies below it.
pub fn is_within(path: &str, root: &str) -> bool {
    if root.is_empty() {
        return true;
    }
    path == root
        || (path.len() > root.len() && path.starts_with(root) && path.as_bytes()[root.len()] == b'/')
}

/// Source extension of a path or specifier, including the dot (`.ts`).
pub fn source_extension(path: &str) -> Option<&str> {
    let name = basename(path);
    let dot = name.rfind('.')?;
    let ext = &name[dot + 1..];
    if dot > 0 && SOURCE_EXTENSIONS.contains(&ext) {
        Some(&name[dot..])
    } else {
        None
    }
}

/// True when the path carries one of the given extensions (without dots).
pub fn has_extension(path: &str, extensions: &[String]) -> bool {
    let name = basename(path);
    match name.rfind('.') {
        Some(dot) if dot > 0 => extensions.iter().any(|ext| ext == &name[dot + 1..]),
        _ => false,
    }
}

/// Strip a trailing source extension (`lib/a.ts` → `lib/a`).
pub fn strip_source_extension(path: &str) -> &str {
    match source_extension(path) {
        Some(ext) => &path[..path.len() - ext.len()],
        None => path,
    }
}

/// True for `./x`, `../x`, `.` and `..`.
pub fn is_relative_specifier(specifier: &str) -> bool {
    specifier == "."
        || specifier == ".."
        || specifier.starts_with("./")
        || specifier.starts_with("../")
}

/// Resolve a relative specifier against the directory of the importing file.
pub fn resolve_specifier(importer: &str, specifier: &str) -> Option<String> {
    if !is_relative_specifier(specifier) {
        return None;
    }
    normalize(&join(dirname(importer), specifier))
}

/// True when `specifier`, written in `importer`, refers to the module file `target`.
///
/// Accepts an extensionless specifier, an explicit source extension (including
/// the `.js`-for-`.ts` convention) and a directory specifier that resolves
/// through `index.*`.
pub fn specifier_resolves_to(importer: &str, specifier: &str, target: &str) -> bool {
    let Some(resolved) = resolve_specifier(importer, specifier) else {
        return false;
    };
    let target_stem = strip_source_extension(target);
    resolved == target
        || strip_source_extension(&resolved) == target_stem
        || join(&resolved, "index") == target_stem
}

/// Relative path from `from_dir` to `to`, always starting with `./` or `../`.
pub fn relative_path(from_dir: &str, to: &str) -> String {
    let diff = pathdiff::diff_paths(Path::new(to), Path::new(from_dir))
        .map(|p| p.to_string_lossy().replace('\\', "/"))
        .unwrap_or_else(|| to.to_string());

    if diff.is_empty() {
        ".".to_string()
    } else if diff == ".." || diff.starts_with("../") {
        diff
    } else {
        format!("./{diff}")
    }
}

/// Specifier that `importer` should use to reach the module file `target`.
///
/// `original` is the specifier being replaced, if any: an explicit extension
/// on it is carried over, and a directory-style specifier stays
/// directory-style when the target is still an `index` file.
pub fn relative_module_specifier(importer: &str, target: &str, original: Option<&str>) -> String {
    let target_stem = strip_source_extension(target);
    let mut module = target_stem;
    let mut suffix = "";

    if let Some(original) = original {
        if let Some(ext) = source_extension(original) {
            suffix = ext;
        } else if basename(target_stem) == "index" && basename(original) != "index" {
            module = dirname(target_stem);
        }
    }

    format!("{}{}", relative_path(dirname(importer), module), suffix)
}

//! Specifier find/replace over source files
//!
//! The rewriter works on occurrences reported by a [`SpecifierParser`] and
//! splices replacement literals straight into the original text, so
//! everything outside the rewritten literals (formatting, comments, the
//! other quote style) is preserved byte for byte.
//!
//! Parsed occurrences are cached per path and validated against the cached
//! content by pointer identity: a write through the [`SourceFileIndex`]
//! drops the cached content, so a stale parse is never reused.

use crate::services::source_index::SourceFileIndex;
use reloc_plugin_api::{dominant_quote_style, QuoteStyle, SpecifierOccurrence, SpecifierParser};
use std::collections::HashMap;
use std::ops::Range;
use std::sync::Arc;
use tracing::{debug, warn};

struct ParsedFile {
    content: Arc<str>,
    occurrences: Arc<[SpecifierOccurrence]>,
}

/// Finds, replaces and removes module specifiers through a [`SourceFileIndex`]
pub struct ImportRewriter {
    parser: Arc<dyn SpecifierParser>,
    parsed: HashMap<String, ParsedFile>,
}

impl ImportRewriter {
    pub fn new(parser: Arc<dyn SpecifierParser>) -> Self {
        Self {
            parser,
            parsed: HashMap::new(),
        }
    }

    /// Every specifier in `file`; empty when missing or unparsable
    pub fn specifiers(
        &mut self,
        index: &mut SourceFileIndex<'_>,
        file: &str,
    ) -> Arc<[SpecifierOccurrence]> {
        let Some(content) = index.read(file) else {
            return Arc::from(Vec::new());
        };
        if let Some(parsed) = self.parsed.get(file) {
            if Arc::ptr_eq(&parsed.content, &content) {
                return Arc::clone(&parsed.occurrences);
            }
        }

        let occurrences: Arc<[SpecifierOccurrence]> =
            Arc::from(parse_occurrences(self.parser.as_ref(), file, &content));
        self.parsed.insert(
            file.to_string(),
            ParsedFile {
                content,
                occurrences: Arc::clone(&occurrences),
            },
        );
        occurrences
    }

    /// True when some specifier in `file` equals `literal`
    pub fn has_specifier(
        &mut self,
        index: &mut SourceFileIndex<'_>,
        file: &str,
        literal: &str,
    ) -> bool {
        match index.read(file) {
            Some(content) if may_contain_specifier(&content, literal) => {}
            _ => return false,
        }
        self.specifiers(index, file)
            .iter()
            .any(|o| o.value == literal)
    }

    /// True when some specifier in `file` satisfies `predicate`
    pub fn has_specifier_matching(
        &mut self,
        index: &mut SourceFileIndex<'_>,
        file: &str,
        predicate: impl Fn(&str) -> bool,
    ) -> bool {
        self.specifiers(index, file)
            .iter()
            .any(|o| predicate(&o.value))
    }

    /// Replace every specifier equal to `old` with `new`
    ///
    /// Returns false, and leaves the file untouched, when nothing changed.
    pub fn replace_specifier(
        &mut self,
        index: &mut SourceFileIndex<'_>,
        file: &str,
        old: &str,
        new: &str,
    ) -> bool {
        if old == new {
            return false;
        }
        match index.read(file) {
            Some(content) if may_contain_specifier(&content, old) => {}
            _ => return false,
        }
        self.replace_specifier_matching(index, file, |s| s == old, |_| new.to_string())
    }

    /// Replace every specifier satisfying `predicate` with `transform(old)`
    pub fn replace_specifier_matching(
        &mut self,
        index: &mut SourceFileIndex<'_>,
        file: &str,
        predicate: impl Fn(&str) -> bool,
        transform: impl Fn(&str) -> String,
    ) -> bool {
        let Some(content) = index.read(file) else {
            return false;
        };
        let occurrences = self.specifiers(index, file);
        let Some(updated) = rewrite_specifiers(&occurrences, &content, predicate, transform) else {
            return false;
        };
        debug!(file = %file, "Rewrote specifiers");
        index.write(file, &updated);
        true
    }

    /// Delete every re-export statement whose specifier satisfies `predicate`
    pub fn remove_exports_matching(
        &mut self,
        index: &mut SourceFileIndex<'_>,
        file: &str,
        predicate: impl Fn(&str) -> bool,
    ) -> bool {
        let Some(content) = index.read(file) else {
            return false;
        };
        let occurrences = self.specifiers(index, file);
        let Some(updated) = remove_export_statements(&occurrences, &content, predicate) else {
            return false;
        };
        debug!(file = %file, "Removed re-exports");
        index.write(file, &updated);
        true
    }

    /// Append `export * from '<specifier>';` unless an equivalent export exists
    ///
    /// `already_exported` decides whether an existing re-export specifier
    /// names the same module. A missing file is created.
    pub fn ensure_wildcard_export(
        &mut self,
        index: &mut SourceFileIndex<'_>,
        file: &str,
        specifier: &str,
        already_exported: impl Fn(&str) -> bool,
    ) -> bool {
        let content = index.read(file);
        let occurrences = self.specifiers(index, file);
        if occurrences
            .iter()
            .any(|o| o.kind.is_export() && (o.value == specifier || already_exported(&o.value)))
        {
            return false;
        }

        let quote = dominant_quote_style(&occurrences).unwrap_or(QuoteStyle::Single);
        let statement = format!("export * from {};\n", quote.quote(specifier));
        let updated = match content.as_deref() {
            None | Some("") => statement,
            Some(existing) if existing.ends_with('\n') => format!("{existing}{statement}"),
            Some(existing) => format!("{existing}\n{statement}"),
        };
        debug!(file = %file, specifier = %specifier, "Added wildcard re-export");
        index.write(file, &updated);
        true
    }
}

/// Cheap filter before parsing: false only when no literal in `content` can decode to `value`
///
/// Escaped literals (`'\u0040org/a'`, `'@org\/a'`) decode to text that does
/// not appear verbatim, so any backslash sends the file to the parser.
pub fn may_contain_specifier(content: &str, value: &str) -> bool {
    content.contains(value) || content.contains('\\')
}

/// Parse `content`, logging and swallowing failures
pub fn parse_occurrences(
    parser: &dyn SpecifierParser,
    path: &str,
    content: &str,
) -> Vec<SpecifierOccurrence> {
    if !parser.handles(path) {
        return Vec::new();
    }
    match parser.parse_specifiers(path, content) {
        Ok(occurrences) => occurrences,
        Err(e) => {
            warn!(file = %path, error = %e, "Failed to parse file, treating it as having no specifiers");
            Vec::new()
        }
    }
}

/// New content with matching specifiers replaced; `None` when nothing changes
pub fn rewrite_specifiers(
    occurrences: &[SpecifierOccurrence],
    content: &str,
    predicate: impl Fn(&str) -> bool,
    transform: impl Fn(&str) -> String,
) -> Option<String> {
    let preferred = dominant_quote_style(occurrences);
    let edits: Vec<(Range<usize>, String)> = occurrences
        .iter()
        .filter(|o| predicate(&o.value))
        .filter_map(|o| {
            let replacement = transform(&o.value);
            (replacement != o.value)
                .then(|| (o.literal.clone(), preferred.unwrap_or(o.quote).quote(&replacement)))
        })
        .collect();

    (!edits.is_empty()).then(|| splice(content, edits))
}

/// New content without the matching re-export statements
pub fn remove_export_statements(
    occurrences: &[SpecifierOccurrence],
    content: &str,
    predicate: impl Fn(&str) -> bool,
) -> Option<String> {
    let edits: Vec<(Range<usize>, String)> = occurrences
        .iter()
        .filter(|o| o.kind.is_export() && predicate(&o.value))
        .map(|o| (o.statement.start..line_end(content, o.statement.end), String::new()))
        .collect();

    (!edits.is_empty()).then(|| splice(content, edits))
}

/// Extend `end` over a trailing semicolon, blanks and one line break
fn line_end(content: &str, end: usize) -> usize {
    let bytes = content.as_bytes();
    let mut pos = end;
    if pos < bytes.len() && bytes[pos] == b';' {
        pos += 1;
    }
    while pos < bytes.len() && (bytes[pos] == b' ' || bytes[pos] == b'\t') {
        pos += 1;
    }
    if content[pos..].starts_with("\r\n") {
        pos + 2
    } else if content[pos..].starts_with('\n') {
        pos + 1
    } else {
        pos
    }
}

/// Apply non-overlapping edits in one forward pass
fn splice(content: &str, mut edits: Vec<(Range<usize>, String)>) -> String {
    edits.sort_by_key(|(range, _)| range.start);
    let mut out = String::with_capacity(content.len());
    let mut cursor = 0;
    for (range, text) in edits {
        if range.start < cursor || range.end > content.len() {
            continue;
        }
        out.push_str(&content[cursor..range.start]);
        out.push_str(&text);
        cursor = range.end;
    }
    out.push_str(&content[cursor..]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use reloc_foundation::{InMemoryTree, Tree};
    use reloc_lang_typescript::TypeScriptSpecifierParser;
    use reloc_plugin_api::PluginResult;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingParser {
        calls: AtomicUsize,
    }

    impl SpecifierParser for CountingParser {
        fn name(&self) -> &'static str {
            "counting"
        }

        fn handles(&self, path: &str) -> bool {
            TypeScriptSpecifierParser.handles(path)
        }

        fn parse_specifiers(
            &self,
            path: &str,
            content: &str,
        ) -> PluginResult<Vec<SpecifierOccurrence>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            TypeScriptSpecifierParser.parse_specifiers(path, content)
        }
    }

    fn rewriter() -> ImportRewriter {
        ImportRewriter::new(Arc::new(TypeScriptSpecifierParser))
    }

    #[test]
    fn test_replace_preserves_formatting_and_quotes() {
        let mut tree = InMemoryTree::new().with_file(
            "app.ts",
            "import { a } from \"@org/lib-a\";\n// keep me\nimport {b} from \"./b\";\nconst c = require('@org/lib-a');\n",
        );
        let mut index = SourceFileIndex::new(&mut tree);
        let mut rewriter = rewriter();

        assert!(rewriter.replace_specifier(&mut index, "app.ts", "@org/lib-a", "@org/lib-b"));
        assert_eq!(
            &*index.read("app.ts").unwrap(),
            "import { a } from \"@org/lib-b\";\n// keep me\nimport {b} from \"./b\";\nconst c = require(\"@org/lib-b\");\n"
        );
    }

    #[test]
    fn test_tied_quote_styles_keep_each_literal() {
        let mut tree = InMemoryTree::new()
            .with_file("app.ts", "import { a } from '@org/lib-a';\nimport { b } from \"./b\";\n");
        let mut index = SourceFileIndex::new(&mut tree);
        let mut rewriter = rewriter();

        rewriter.replace_specifier(&mut index, "app.ts", "@org/lib-a", "@org/lib-b");
        assert_eq!(
            &*index.read("app.ts").unwrap(),
            "import { a } from '@org/lib-b';\nimport { b } from \"./b\";\n"
        );
    }

    #[test]
    fn test_second_replace_is_a_no_op() {
        let mut tree =
            InMemoryTree::new().with_file("app.ts", "import { a } from '@org/lib-a';\n");
        {
            let mut index = SourceFileIndex::new(&mut tree);
            let mut rewriter = rewriter();
            assert!(rewriter.replace_specifier(&mut index, "app.ts", "@org/lib-a", "@org/lib-b"));
            assert!(!rewriter.replace_specifier(&mut index, "app.ts", "@org/lib-a", "@org/lib-b"));
            assert!(!rewriter.replace_specifier(&mut index, "app.ts", "@org/lib-b", "@org/lib-b"));
            assert!(!rewriter.replace_specifier(&mut index, "missing.ts", "@org/lib-a", "x"));
        }
        assert_eq!(tree.changes().len(), 1);
    }

    #[test]
    fn test_escaped_literal_passes_the_pre_check() {
        let mut tree = InMemoryTree::new().with_file(
            "app.ts",
            "import { a } from '@org\\/lib-a';\nimport { b } from '\\u0040org/lib-a';\n",
        );
        let mut index = SourceFileIndex::new(&mut tree);
        let mut rewriter = rewriter();

        assert!(rewriter.has_specifier_matching(&mut index, "app.ts", |s| s == "@org/lib-a"));
        assert!(rewriter.has_specifier(&mut index, "app.ts", "@org/lib-a"));
        assert!(rewriter.replace_specifier(&mut index, "app.ts", "@org/lib-a", "@org/lib-b"));
        assert_eq!(
            &*index.read("app.ts").unwrap(),
            "import { a } from '@org/lib-b';\nimport { b } from '@org/lib-b';\n"
        );
    }

    #[test]
    fn test_pre_check_only_rejects_impossible_files() {
        assert!(may_contain_specifier("import './a';\n", "./a"));
        assert!(may_contain_specifier("import '.\\/a';\n", "./a"));
        assert!(!may_contain_specifier("import './b';\n", "./a"));
    }

    #[test]
    fn test_substring_is_not_a_specifier() {
        let mut tree = InMemoryTree::new()
            .with_file("app.ts", "// see @org/lib-a docs\nimport { a } from '@org/lib-ab';\n");
        let mut index = SourceFileIndex::new(&mut tree);
        let mut rewriter = rewriter();

        assert!(!rewriter.has_specifier(&mut index, "app.ts", "@org/lib-a"));
        assert!(rewriter.has_specifier(&mut index, "app.ts", "@org/lib-ab"));
        assert!(!rewriter.replace_specifier(&mut index, "app.ts", "@org/lib-a", "@org/lib-b"));
    }

    #[test]
    fn test_matching_transform_sees_old_value() {
        let mut tree = InMemoryTree::new()
            .with_file("a.ts", "import x from './x';\nimport y from './y';\nimport z from 'z';\n");
        let mut index = SourceFileIndex::new(&mut tree);
        let mut rewriter = rewriter();

        let changed = rewriter.replace_specifier_matching(
            &mut index,
            "a.ts",
            |s| s.starts_with("./"),
            |s| format!("../lib/{}", &s[2..]),
        );
        assert!(changed);
        assert_eq!(
            &*index.read("a.ts").unwrap(),
            "import x from '../lib/x';\nimport y from '../lib/y';\nimport z from 'z';\n"
        );
        assert!(rewriter.has_specifier_matching(&mut index, "a.ts", |s| s == "../lib/y"));
    }

    #[test]
    fn test_remove_exports_takes_the_whole_line() {
        let mut tree = InMemoryTree::new().with_file(
            "index.ts",
            "export * from './lib/a';\nexport { b } from './lib/b';\nimport './lib/b';\nexport * from './lib/c';\n",
        );
        let mut index = SourceFileIndex::new(&mut tree);
        let mut rewriter = rewriter();

        assert!(rewriter.remove_exports_matching(&mut index, "index.ts", |s| s == "./lib/b"));
        assert_eq!(
            &*index.read("index.ts").unwrap(),
            "export * from './lib/a';\nimport './lib/b';\nexport * from './lib/c';\n"
        );
        assert!(!rewriter.remove_exports_matching(&mut index, "index.ts", |s| s == "./lib/b"));
    }

    #[test]
    fn test_ensure_wildcard_export_is_idempotent() {
        let mut tree = InMemoryTree::new().with_file("index.ts", "export * from \"./lib/a\";");
        let mut index = SourceFileIndex::new(&mut tree);
        let mut rewriter = rewriter();

        assert!(rewriter.ensure_wildcard_export(&mut index, "index.ts", "./lib/x", |_| false));
        assert!(!rewriter.ensure_wildcard_export(&mut index, "index.ts", "./lib/x", |_| false));
        assert!(!rewriter.ensure_wildcard_export(
            &mut index,
            "index.ts",
            "./lib/x.js",
            |s| s == "./lib/x"
        ));
        assert_eq!(
            &*index.read("index.ts").unwrap(),
            "export * from \"./lib/a\";\nexport * from \"./lib/x\";\n"
        );
    }

    #[test]
    fn test_ensure_wildcard_export_creates_missing_file() {
        let mut tree = InMemoryTree::new();
        let mut index = SourceFileIndex::new(&mut tree);
        let mut rewriter = rewriter();

        assert!(rewriter.ensure_wildcard_export(&mut index, "libs/b/src/index.ts", "./lib/x", |_| false));
        assert_eq!(
            &*index.read("libs/b/src/index.ts").unwrap(),
            "export * from './lib/x';\n"
        );
    }

    #[test]
    fn test_unparsable_file_has_no_specifiers() {
        let mut tree = InMemoryTree::new()
            .with_file("broken.ts", "import { from '@org/lib-a';\nexport const = ;\n");
        let mut index = SourceFileIndex::new(&mut tree);
        let mut rewriter = rewriter();

        assert!(!rewriter.has_specifier(&mut index, "broken.ts", "@org/lib-a"));
        assert!(!rewriter.replace_specifier(&mut index, "broken.ts", "@org/lib-a", "@org/lib-b"));
        assert!(index.touched().is_empty());
    }

    #[test]
    fn test_parse_is_reused_until_content_changes() {
        let parser = Arc::new(CountingParser {
            calls: AtomicUsize::new(0),
        });
        let mut tree = InMemoryTree::new().with_file("a.ts", "import x from './x';\n");
        let mut index = SourceFileIndex::new(&mut tree);
        let mut rewriter = ImportRewriter::new(parser.clone());

        rewriter.specifiers(&mut index, "a.ts");
        rewriter.specifiers(&mut index, "a.ts");
        assert_eq!(parser.calls.load(Ordering::SeqCst), 1);

        rewriter.replace_specifier(&mut index, "a.ts", "./x", "./y");
        let after = rewriter.specifiers(&mut index, "a.ts");
        assert_eq!(parser.calls.load(Ordering::SeqCst), 2);
        assert_eq!(after[0].value, "./y");
    }

    #[test]
    fn test_rewrites_go_through_the_tree() {
        let mut tree = InMemoryTree::new().with_file("a.ts", "import x from './x';\n");
        {
            let mut index = SourceFileIndex::new(&mut tree);
            rewriter().replace_specifier(&mut index, "a.ts", "./x", "./y");
        }
        assert_eq!(tree.read("a.ts").as_deref(), Some("import x from './y';\n"));
    }
}

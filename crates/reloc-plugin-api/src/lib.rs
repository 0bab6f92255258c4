//! Parser adapter API
//!
//! The move engine never looks at a concrete AST. A language crate implements
//! [`SpecifierParser`] to report every module specifier found in a file,
//! together with the byte ranges needed to rewrite or remove it. Everything
//! above this seam (find, replace, export bookkeeping) is language-agnostic.
//!
//! Five syntactic positions carry specifiers:
//! - static imports: `import { a } from './a'`
//! - named re-exports: `export { a } from './a'`
//! - wildcard re-exports: `export * from './a'`
//! - dynamic imports: `import('./a')`
//! - call-style loads: `require('./a')`, `require.resolve('./a')`

use serde::{Deserialize, Serialize};
use std::ops::Range;

// ============================================================================
// Error Types
// ============================================================================

/// Result type for plugin operations
pub type PluginResult<T> = Result<T, PluginApiError>;

/// Errors that can occur inside a parser adapter
#[derive(Debug, Clone, thiserror::Error)]
pub enum PluginApiError {
    /// Failed to parse source code
    #[error("Parse error: {message}")]
    Parse {
        message: String,
        location: Option<SourceLocation>,
    },
}

impl PluginApiError {
    /// Create a parse error with location information
    pub fn parse_at(message: impl Into<String>, line: usize, column: usize) -> Self {
        Self::Parse {
            message: message.into(),
            location: Some(SourceLocation { line, column }),
        }
    }
}

// ============================================================================
// Core Data Types
// ============================================================================

/// Location in source code (1-based line, 0-based column)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceLocation {
    pub line: usize,
    pub column: usize,
}

/// Syntactic position a specifier was found in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SpecifierKind {
    /// `import ... from 'x'` and bare `import 'x'`
    StaticImport,
    /// `export { a } from 'x'`, `export * as ns from 'x'`
    ReExport,
    /// `export * from 'x'`
    WildcardReExport,
    /// `import('x')`
    DynamicImport,
    /// `require('x')`, `require.resolve('x')`, `import x = require('x')`
    RequireCall,
}

impl SpecifierKind {
    /// True for the two re-export positions
    pub fn is_export(self) -> bool {
        matches!(self, Self::ReExport | Self::WildcardReExport)
    }
}

/// Quote character around a string literal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum QuoteStyle {
    Single,
    Double,
}

impl QuoteStyle {
    pub fn from_char(c: char) -> Option<Self> {
        match c {
            '\'' => Some(Self::Single),
            '"' => Some(Self::Double),
            _ => None,
        }
    }

    pub fn as_char(self) -> char {
        match self {
            Self::Single => '\'',
            Self::Double => '"',
        }
    }

    /// Render `value` as a literal in this style
    pub fn quote(self, value: &str) -> String {
        let q = self.as_char();
        let mut out = String::with_capacity(value.len() + 2);
        out.push(q);
        for c in value.chars() {
            if c == q || c == '\\' {
                out.push('\\');
            }
            out.push(c);
        }
        out.push(q);
        out
    }
}

/// One specifier found in a file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecifierOccurrence {
    pub kind: SpecifierKind,
    /// Unquoted specifier text
    pub value: String,
    /// Byte range of the literal, quotes included
    pub literal: Range<usize>,
    /// Byte range of the enclosing declaration or call
    pub statement: Range<usize>,
    pub quote: QuoteStyle,
}

/// Quote style used by most specifiers of a file; `None` on a tie or no specifiers
pub fn dominant_quote_style(occurrences: &[SpecifierOccurrence]) -> Option<QuoteStyle> {
    let single = occurrences
        .iter()
        .filter(|o| o.quote == QuoteStyle::Single)
        .count();
    let double = occurrences.len() - single;
    match single.cmp(&double) {
        std::cmp::Ordering::Greater => Some(QuoteStyle::Single),
        std::cmp::Ordering::Less => Some(QuoteStyle::Double),
        std::cmp::Ordering::Equal => None,
    }
}

// ============================================================================
// Parser Adapter
// ============================================================================

/// Finds specifier-bearing nodes in a source file
///
/// Implementations must be shareable across scan workers.
pub trait SpecifierParser: Send + Sync {
    /// Short adapter name used in logs
    fn name(&self) -> &'static str;

    /// True when this adapter understands the file at `path`
    fn handles(&self, path: &str) -> bool;

    /// Every specifier in `content`, in source order
    fn parse_specifiers(&self, path: &str, content: &str)
        -> PluginResult<Vec<SpecifierOccurrence>>;
}

//! Alias table loading from TypeScript path mappings
//!
//! Monorepos usually publish each library under an alias declared in the root
//! `tsconfig.base.json`:
//!
//! ```json
//! { "compilerOptions": { "paths": { "@org/lib-a": ["libs/lib-a/src/index.ts"] } } }
//! ```
//!
//! Only exact (non-wildcard) keys become aliases; the project owning the
//! first mapped path publishes the alias.

use anyhow::{Context, Result};
use indexmap::IndexMap;
use reloc_foundation::{paths, Workspace};
use serde::Deserialize;
use tracing::{debug, warn};

/// Conventional name of the root TypeScript configuration
pub const TSCONFIG_BASE: &str = "tsconfig.base.json";

#[derive(Debug, Deserialize)]
struct TsConfig {
    #[serde(rename = "compilerOptions")]
    compiler_options: Option<CompilerOptions>,
}

#[derive(Debug, Deserialize)]
struct CompilerOptions {
    #[serde(rename = "baseUrl")]
    base_url: Option<String>,
    /// Insertion order matters: the first matching key wins in TypeScript.
    paths: Option<IndexMap<String, Vec<String>>>,
}

/// `(project name, alias)` pairs declared by a tsconfig document
pub fn aliases_from_tsconfig(content: &str, workspace: &Workspace) -> Result<Vec<(String, String)>> {
    let config: TsConfig = serde_json::from_str(&strip_json_comments(content))
        .context("Failed to parse tsconfig path mappings")?;

    let Some(options) = config.compiler_options else {
        return Ok(Vec::new());
    };
    let base_url = options.base_url.as_deref().unwrap_or(".");
    let mut aliases = Vec::new();

    for (alias, targets) in options.paths.unwrap_or_default() {
        if alias.contains('*') {
            continue;
        }
        let Some(first) = targets.first() else {
            continue;
        };
        let Some(mapped) = paths::normalize(&paths::join(base_url, first)) else {
            warn!(alias = %alias, target = %first, "Path mapping escapes the workspace root");
            continue;
        };

        let owner = workspace
            .projects()
            .filter(|p| p.contains(&mapped))
            .max_by_key(|p| p.root.len());
        match owner {
            Some(project) => aliases.push((project.name.clone(), alias)),
            None => debug!(alias = %alias, target = %mapped, "Path mapping outside every project"),
        }
    }

    Ok(aliases)
}

/// Publish every alias declared by a tsconfig document on the workspace
pub fn apply_tsconfig_aliases(workspace: &mut Workspace, content: &str) -> Result<usize> {
    let aliases = aliases_from_tsconfig(content, workspace)?;
    let count = aliases.len();
    for (project, alias) in aliases {
        workspace.set_alias(project, alias);
    }
    Ok(count)
}

/// Remove `//` and `/* */` comments outside of strings (tsconfig allows them)
pub(crate) fn strip_json_comments(content: &str) -> String {
    let mut result = String::with_capacity(content.len());
    let mut chars = content.chars().peekable();
    let mut in_string = false;
    let mut escaped = false;

    while let Some(ch) = chars.next() {
        if in_string {
            result.push(ch);
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == '"' {
                in_string = false;
            }
            continue;
        }

        let next = chars.peek().copied();
        match (ch, next) {
            ('"', _) => {
                in_string = true;
                result.push(ch);
            }
            ('/', Some('/')) => {
                for skipped in chars.by_ref() {
                    if skipped == '\n' {
                        result.push('\n');
                        break;
                    }
                }
            }
            ('/', Some('*')) => {
                chars.next();
                let mut previous = '\0';
                for skipped in chars.by_ref() {
                    if previous == '*' && skipped == '/' {
                        break;
                    }
                    previous = skipped;
                }
            }
            _ => result.push(ch),
        }
    }

    result
}

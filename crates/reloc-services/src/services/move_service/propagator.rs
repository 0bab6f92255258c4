//! Rewrites alias imports of the moved file in every dependent project
//!
//! Candidates come from the dependency graph (loaded here, lazily). When the
//! graph names no dependents, every other project is scanned for an import of
//! the source alias instead. That fallback cannot see projects that reach the
//! source only through a chain of re-exporting aliases.

use super::context::MoveContext;
use super::session::MoveSession;
use crate::services::parallel_scan::SpecifierQuery;
use reloc_foundation::{paths, Project, RelocResult};
use std::collections::BTreeSet;
use tracing::{debug, info};

pub(crate) fn propagate(
    session: &mut MoveSession<'_, '_>,
    context: &MoveContext,
) -> RelocResult<BTreeSet<String>> {
    let mut updated = BTreeSet::new();
    let Some(source_alias) = context.source_import_alias.as_deref() else {
        debug!("Source project publishes no alias, nothing to propagate");
        return Ok(updated);
    };

    let workspace = session.workspace;
    let dependents = session.dependents(&context.source_project.name)?;
    let candidates: Vec<&Project> = if dependents.is_empty() {
        fallback_candidates(session, context, source_alias)
    } else {
        dependents
            .iter()
            .filter_map(|name| workspace.project(name))
            .collect()
    };
    info!(
        source_alias = %source_alias,
        candidates = candidates.len(),
        from_graph = !dependents.is_empty(),
        "Propagating move to dependent projects"
    );

    for project in &candidates {
        session.project_files(project);
    }

    for project in candidates {
        let files = session.project_files(project);
        let into_target = project.name == context.target_project.name;

        for file in files.iter() {
            if *file == context.target_path
                || !session.rewriter.has_specifier(&mut session.index, file, source_alias)
            {
                continue;
            }
            let changed = match context.target_import_alias.as_deref() {
                Some(target_alias) if !into_target => session.rewriter.replace_specifier(
                    &mut session.index,
                    file,
                    source_alias,
                    target_alias,
                ),
                _ => session.rewriter.replace_specifier_matching(
                    &mut session.index,
                    file,
                    |specifier| specifier == source_alias,
                    |_| paths::relative_module_specifier(file, &context.target_path, None),
                ),
            };
            if changed {
                updated.insert(file.clone());
            }
        }
    }

    Ok(updated)
}

/// Every other project with a file importing the alias or one of its sub-paths
fn fallback_candidates<'w>(
    session: &mut MoveSession<'_, 'w>,
    context: &MoveContext,
    source_alias: &str,
) -> Vec<&'w Project> {
    let workspace = session.workspace;
    let query = SpecifierQuery::AliasOrSubpath(source_alias.to_string());

    workspace
        .projects()
        .filter(|project| project.name != context.source_project.name)
        .filter(|project| {
            let files = session.project_files(project);
            session.scanner.any_reference(&mut session.index, &files, &query)
        })
        .collect()
}

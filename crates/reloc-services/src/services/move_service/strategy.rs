//! The four move scenarios and their reference rewrites

use super::context::MoveContext;
use super::propagator;
use super::session::MoveSession;
use reloc_foundation::{paths, RelocResult};
use serde::Serialize;
use std::collections::BTreeSet;
use tracing::{debug, info};

/// Scenario a move falls into; exactly one runs per move
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum MoveStrategy {
    /// Source and target belong to the same project
    SameProject,
    /// The file is re-exported from a source entry point
    Exported,
    /// Not exported, and the target project publishes an alias
    NonExportedAliased,
    /// Not exported, no target alias
    Default,
}

/// What a strategy changed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StrategyOutcome {
    pub updated_files: BTreeSet<String>,
    /// The strategy left references that need the target entry point to export the file
    pub requires_target_export: bool,
}

/// How a reference to the moved file is rewritten
#[derive(Clone, Copy)]
enum Replacement<'a> {
    /// Relative path from the referencing file to the new location
    Relative,
    /// The target project's alias
    Alias(&'a str),
}

impl MoveStrategy {
    pub fn select(context: &MoveContext) -> Self {
        Self::for_flags(
            context.is_same_project,
            context.is_exported,
            context.target_import_alias.is_some(),
        )
    }

    pub fn for_flags(is_same_project: bool, is_exported: bool, has_target_alias: bool) -> Self {
        match (is_same_project, is_exported, has_target_alias) {
            (true, _, _) => Self::SameProject,
            (false, true, _) => Self::Exported,
            (false, false, true) => Self::NonExportedAliased,
            (false, false, false) => Self::Default,
        }
    }

    pub(crate) fn execute(
        self,
        session: &mut MoveSession<'_, '_>,
        context: &MoveContext,
    ) -> RelocResult<StrategyOutcome> {
        debug!(strategy = ?self, "Dispatching move strategy");
        let outcome = match self {
            Self::SameProject => StrategyOutcome {
                updated_files: rewrite_source_project_references(session, context, Replacement::Relative),
                requires_target_export: false,
            },
            Self::Exported => exported(session, context)?,
            Self::NonExportedAliased => {
                let replacement = target_alias_or_relative(context);
                let updated_files = rewrite_source_project_references(session, context, replacement);
                StrategyOutcome {
                    requires_target_export: !updated_files.is_empty(),
                    updated_files,
                }
            }
            Self::Default => StrategyOutcome {
                updated_files: rewrite_source_project_references(session, context, Replacement::Relative),
                requires_target_export: false,
            },
        };

        info!(
            strategy = ?self,
            updated_files = outcome.updated_files.len(),
            "Move strategy finished"
        );
        Ok(outcome)
    }
}

fn target_alias_or_relative(context: &MoveContext) -> Replacement<'_> {
    match context.target_import_alias.as_deref() {
        Some(alias) => Replacement::Alias(alias),
        None => Replacement::Relative,
    }
}

/// Propagate to dependents, drop the old entry-point export, then fix what is left in the source project
fn exported(session: &mut MoveSession<'_, '_>, context: &MoveContext) -> RelocResult<StrategyOutcome> {
    let mut updated_files = propagator::propagate(session, context)?;

    for entry_point in &context.source_project.entry_points {
        let removed = session.rewriter.remove_exports_matching(
            &mut session.index,
            entry_point,
            |specifier| paths::specifier_resolves_to(entry_point, specifier, &context.source_path),
        );
        if removed {
            debug!(entry_point = %entry_point, "Removed export of moved file");
            updated_files.insert(entry_point.clone());
        }
    }

    let replacement = target_alias_or_relative(context);
    updated_files.extend(rewrite_source_project_references(session, context, replacement));

    Ok(StrategyOutcome {
        updated_files,
        requires_target_export: true,
    })
}

/// Rewrite references to the old path from every other file of the source project
fn rewrite_source_project_references(
    session: &mut MoveSession<'_, '_>,
    context: &MoveContext,
    replacement: Replacement<'_>,
) -> BTreeSet<String> {
    let files = session.project_files(&context.source_project);
    let mut updated = BTreeSet::new();

    for file in files.iter() {
        if *file == context.source_path || *file == context.target_path {
            continue;
        }
        let changed = session.rewriter.replace_specifier_matching(
            &mut session.index,
            file,
            |specifier| paths::specifier_resolves_to(file, specifier, &context.source_path),
            |specifier| match replacement {
                Replacement::Relative => {
                    paths::relative_module_specifier(file, &context.target_path, Some(specifier))
                }
                Replacement::Alias(alias) => alias.to_string(),
            },
        );
        if changed {
            updated.insert(file.clone());
        }
    }
    updated
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_every_flag_combination_selects_one_strategy() {
        let cases = [
            ((true, true, true), MoveStrategy::SameProject),
            ((true, true, false), MoveStrategy::SameProject),
            ((true, false, true), MoveStrategy::SameProject),
            ((true, false, false), MoveStrategy::SameProject),
            ((false, true, true), MoveStrategy::Exported),
            ((false, true, false), MoveStrategy::Exported),
            ((false, false, true), MoveStrategy::NonExportedAliased),
            ((false, false, false), MoveStrategy::Default),
        ];
        for ((same, exported, alias), expected) in cases {
            assert_eq!(
                MoveStrategy::for_flags(same, exported, alias),
                expected,
                "same={same} exported={exported} alias={alias}"
            );
        }
    }

    #[test]
    fn test_strategy_serializes_kebab_case() {
        assert_eq!(
            serde_json::to_string(&MoveStrategy::NonExportedAliased).unwrap(),
            "\"non-exported-aliased\""
        );
    }
}

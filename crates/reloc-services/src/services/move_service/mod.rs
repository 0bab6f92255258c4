//! Move Service - relocate a module file between workspace projects
//!
//! One call to [`MoveService::move_file`] runs the whole operation against a
//! staging [`Tree`]:
//!
//! 1. resolve and validate the request into an immutable [`MoveContext`]
//! 2. write the file at its new path and update the cached file lists
//! 3. fix the moved file's own relative imports
//! 4. run exactly one [`MoveStrategy`]
//! 5. turn target-project alias imports of the file into relative imports
//! 6. make the target entry point export the file when it should
//! 7. delete the old file
//! 8. optionally run a [`Formatter`] over every touched file
//!
//! Nothing touches the tree except through the per-call [`SourceFileIndex`],
//! and no cache survives the call. Steps are not transactional: an error
//! after step 1 leaves the staging tree partially updated, and the caller is
//! expected to discard it.
//!
//! [`SourceFileIndex`]: crate::services::SourceFileIndex

mod context;
mod propagator;
mod session;
mod strategy;

pub use context::{owning_project, MoveContext, MoveRequest, MoveTarget};
pub use strategy::{MoveStrategy, StrategyOutcome};

use crate::services::dependency_graph::DependencyGraphSource;
use reloc_config::{logging, MoveDefaults, RelocConfig, ScanConfig};
use reloc_foundation::{paths, RelocResult, Tree, Workspace};
use reloc_plugin_api::SpecifierParser;
use serde::Serialize;
use session::MoveSession;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Formatting hook run over touched files after a move
pub trait Formatter {
    /// Formatted content, or `None` to leave the file as is
    fn format(&self, path: &str, content: &str) -> Option<String>;
}

/// Per-move switches
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MoveOptions {
    /// Never add the moved file to the target entry point
    pub skip_export: bool,
    /// Run the configured formatter over touched files
    pub format: bool,
}

impl From<&MoveDefaults> for MoveOptions {
    fn from(defaults: &MoveDefaults) -> Self {
        Self {
            skip_export: defaults.skip_export,
            format: defaults.format,
        }
    }
}

/// Result of a completed move
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveReport {
    pub strategy: MoveStrategy,
    pub source_path: String,
    pub target_path: String,
    /// Files rewritten by the move, excluding the moved file itself
    pub updated_files: Vec<String>,
    /// The target entry point gained an export of the moved file
    pub target_export_added: bool,
}

/// Unified move service
pub struct MoveService<'w> {
    workspace: &'w Workspace,
    parser: Arc<dyn SpecifierParser>,
    graph_source: &'w dyn DependencyGraphSource,
    scan: ScanConfig,
    formatter: Option<&'w dyn Formatter>,
}

impl<'w> MoveService<'w> {
    pub fn new(
        workspace: &'w Workspace,
        parser: Arc<dyn SpecifierParser>,
        graph_source: &'w dyn DependencyGraphSource,
    ) -> Self {
        Self {
            workspace,
            parser,
            graph_source,
            scan: ScanConfig::default(),
            formatter: None,
        }
    }

    /// Scan settings from a loaded configuration
    pub fn with_config(mut self, config: &RelocConfig) -> Self {
        self.scan = config.scan.clone();
        self
    }

    pub fn with_scan_config(mut self, scan: ScanConfig) -> Self {
        self.scan = scan;
        self
    }

    pub fn with_formatter(mut self, formatter: &'w dyn Formatter) -> Self {
        self.formatter = Some(formatter);
        self
    }

    /// Move one file and rewrite every reference to it
    pub fn move_file(
        &self,
        tree: &mut dyn Tree,
        request: &MoveRequest,
        options: &MoveOptions,
    ) -> RelocResult<MoveReport> {
        let span = logging::move_span(&request.source, &describe_target(request));
        let _enter = span.enter();

        let mut session = MoveSession::new(
            self.workspace,
            tree,
            Arc::clone(&self.parser),
            self.scan.clone(),
            self.graph_source,
        );
        let context = context::resolve(&mut session, request)?;
        let strategy = MoveStrategy::select(&context);
        info!(
            source = %context.source_path,
            target = %context.target_path,
            strategy = ?strategy,
            "Moving file"
        );

        session.index.write(&context.target_path, &context.content);
        update_file_lists(&mut session, &context);
        rewrite_moved_file_imports(&mut session, &context);

        let outcome = strategy.execute(&mut session, &context)?;

        if !context.is_same_project && context.has_imports_in_target {
            localize_target_imports(&mut session, &context);
        }
        let target_export_added = ensure_target_export(&mut session, &context, &outcome, options);

        session.index.delete(&context.source_path);

        if options.format {
            match self.formatter {
                Some(formatter) => format_touched(&mut session, formatter),
                None => debug!("Formatting requested but no formatter configured"),
            }
        }

        let updated_files: Vec<String> = session
            .index
            .touched()
            .iter()
            .filter(|path| **path != context.source_path && **path != context.target_path)
            .cloned()
            .collect();
        info!(
            strategy = ?strategy,
            updated_files = updated_files.len(),
            target_export_added,
            "Move complete"
        );

        Ok(MoveReport {
            strategy,
            source_path: context.source_path,
            target_path: context.target_path,
            updated_files,
            target_export_added,
        })
    }
}

fn describe_target(request: &MoveRequest) -> String {
    match &request.target {
        MoveTarget::Path(path) => path.clone(),
        MoveTarget::Project { project, directory } => match directory {
            Some(directory) => format!("{project}:{directory}"),
            None => project.clone(),
        },
    }
}

/// Drop the source from its project's list and add the target to its own
fn update_file_lists(session: &mut MoveSession<'_, '_>, context: &MoveContext) {
    let source_root = &context.source_project.root;
    let target_root = &context.target_project.root;
    session.index.source_files(source_root);
    session.index.source_files(target_root);
    session.index.update_source_files(source_root, &context.source_path, None);
    session
        .index
        .update_source_files(target_root, &context.source_path, Some(&context.target_path));
}

/// Re-point the moved file's relative imports from its new location
fn rewrite_moved_file_imports(session: &mut MoveSession<'_, '_>, context: &MoveContext) {
    let changed = session.rewriter.replace_specifier_matching(
        &mut session.index,
        &context.target_path,
        paths::is_relative_specifier,
        |specifier| match paths::resolve_specifier(&context.source_path, specifier) {
            Some(resolved) => {
                paths::relative_module_specifier(&context.target_path, &resolved, Some(specifier))
            }
            None => specifier.to_string(),
        },
    );
    if changed {
        debug!(file = %context.target_path, "Rewrote relative imports of moved file");
    }
}

/// Target-project files importing the source alias now reach the file relatively
fn localize_target_imports(session: &mut MoveSession<'_, '_>, context: &MoveContext) {
    let Some(source_alias) = context.source_import_alias.as_deref() else {
        return;
    };
    let files = session.project_files(&context.target_project);
    for file in files.iter() {
        if *file == context.target_path
            || !session.rewriter.has_specifier(&mut session.index, file, source_alias)
        {
            continue;
        }
        session.rewriter.replace_specifier_matching(
            &mut session.index,
            file,
            |specifier| specifier == source_alias,
            |_| paths::relative_module_specifier(file, &context.target_path, None),
        );
    }
}

/// Export the moved file from the target entry point when it should be public
fn ensure_target_export(
    session: &mut MoveSession<'_, '_>,
    context: &MoveContext,
    outcome: &StrategyOutcome,
    options: &MoveOptions,
) -> bool {
    if context.is_same_project
        || options.skip_export
        || !(context.is_exported || outcome.requires_target_export)
    {
        return false;
    }
    if !context.target_project.is_library() {
        debug!(project = %context.target_project.name, "Target is not a library, not exporting");
        return false;
    }
    let Some(entry_point) = context.target_project.primary_entry_point() else {
        warn!(
            project = %context.target_project.name,
            "Target library declares no entry point, moved file is not exported"
        );
        return false;
    };

    let specifier = paths::relative_module_specifier(entry_point, &context.target_path, None);
    session.rewriter.ensure_wildcard_export(
        &mut session.index,
        entry_point,
        &specifier,
        |existing| paths::specifier_resolves_to(entry_point, existing, &context.target_path),
    )
}

fn format_touched(session: &mut MoveSession<'_, '_>, formatter: &dyn Formatter) {
    let touched: Vec<String> = session.index.touched().iter().cloned().collect();
    for path in touched {
        let Some(content) = session.index.read(&path) else {
            continue;
        };
        if let Some(formatted) = formatter.format(&path, &content) {
            if formatted != *content {
                session.index.write(&path, &formatted);
            }
        }
    }
}

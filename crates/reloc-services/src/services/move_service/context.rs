//! Move request validation and plan resolution

use super::session::MoveSession;
use crate::services::parallel_scan::SpecifierQuery;
use reloc_foundation::{paths, Project, RelocError, RelocResult, Workspace};
use std::sync::Arc;
use tracing::debug;

/// Where the moved file should end up
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MoveTarget {
    /// Explicit workspace-relative file path
    Path(String),
    /// `<sourceRoot>/lib/<directory>/<source basename>` inside a named project
    Project {
        project: String,
        directory: Option<String>,
    },
}

/// A single-file move
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveRequest {
    pub source: String,
    pub target: MoveTarget,
}

impl MoveRequest {
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            target: MoveTarget::Path(target.into()),
        }
    }

    pub fn to_project(
        source: impl Into<String>,
        project: impl Into<String>,
        directory: Option<&str>,
    ) -> Self {
        Self {
            source: source.into(),
            target: MoveTarget::Project {
                project: project.into(),
                directory: directory.map(str::to_string),
            },
        }
    }
}

/// Immutable plan for one move, built once before any mutation
#[derive(Debug, Clone)]
pub struct MoveContext {
    pub source_path: String,
    pub target_path: String,
    pub source_project: Project,
    pub target_project: Project,
    /// Content of the source file when the move started
    pub content: Arc<str>,
    /// Some source entry point re-exports the file
    pub is_exported: bool,
    pub source_import_alias: Option<String>,
    pub target_import_alias: Option<String>,
    /// The file is exported and some target-project file imports the source alias
    pub has_imports_in_target: bool,
    pub is_same_project: bool,
}

/// Validate a request and build its plan; reads only
pub(crate) fn resolve(session: &mut MoveSession<'_, '_>, request: &MoveRequest) -> RelocResult<MoveContext> {
    let workspace = session.workspace;

    let source_path = paths::normalize_checked(&request.source)?;
    if !session.index.is_source_file(&source_path) {
        return Err(RelocError::invalid_request(format!(
            "{source_path} is not a source file"
        )));
    }
    let content = session
        .index
        .read(&source_path)
        .ok_or_else(|| RelocError::not_found(source_path.clone()))?;
    let source_project = owning_project(workspace, &source_path)?;

    let target_path = match &request.target {
        MoveTarget::Path(path) => paths::normalize_checked(path)?,
        MoveTarget::Project { project, directory } => {
            let project = workspace
                .project(project)
                .ok_or_else(|| RelocError::not_found(format!("project {project}")))?;
            derive_target_path(project, directory.as_deref(), &source_path)?
        }
    };
    if target_path == source_path {
        return Err(RelocError::invalid_request(
            "source and target are the same file",
        ));
    }
    if !session.index.is_source_file(&target_path) {
        return Err(RelocError::invalid_request(format!(
            "{target_path} is not a source file"
        )));
    }
    if session.index.exists(&target_path) {
        return Err(RelocError::already_exists(target_path));
    }
    let target_project = owning_project(workspace, &target_path)?;

    let is_same_project = source_project.name == target_project.name;
    let source_import_alias = workspace.alias_for(&source_project.name).map(str::to_string);
    let target_import_alias = workspace.alias_for(&target_project.name).map(str::to_string);

    let is_exported = exported_by_entry_point(session, source_project, &source_path);
    // Only the public surface is reachable through the alias.
    let has_imports_in_target = match (&source_import_alias, is_same_project, is_exported) {
        (Some(alias), false, true) => {
            let files = session.project_files(target_project);
            session
                .scanner
                .any_reference(&mut session.index, &files, &SpecifierQuery::Exact(alias.clone()))
        }
        _ => false,
    };

    let context = MoveContext {
        source_path,
        target_path,
        source_project: source_project.clone(),
        target_project: target_project.clone(),
        content,
        is_exported,
        source_import_alias,
        target_import_alias,
        has_imports_in_target,
        is_same_project,
    };
    debug!(
        source_project = %context.source_project.name,
        target_project = %context.target_project.name,
        is_exported = context.is_exported,
        has_imports_in_target = context.has_imports_in_target,
        "Resolved move context"
    );
    Ok(context)
}

/// Project owning `path`: longest matching root, a source root beating a bare root
pub fn owning_project<'w>(workspace: &'w Workspace, path: &str) -> RelocResult<&'w Project> {
    let mut best: Option<((usize, bool), &Project)> = None;
    let mut tied_with: Option<&Project> = None;

    for project in workspace.projects() {
        let score = match project.source_root.as_deref() {
            Some(source_root) if paths::is_within(path, source_root) => (source_root.len(), true),
            _ if paths::is_within(path, &project.root) => (project.root.len(), false),
            _ => continue,
        };
        match best {
            Some((best_score, _)) if score < best_score => {}
            Some((best_score, _)) if score == best_score => tied_with = Some(project),
            _ => {
                best = Some((score, project));
                tied_with = None;
            }
        }
    }

    match (best, tied_with) {
        (Some((_, project)), None) => Ok(project),
        (Some((_, project)), Some(other)) => Err(RelocError::ambiguous_project(
            path,
            format!("claimed by both {} and {}", project.name, other.name),
        )),
        (None, _) => Err(RelocError::ambiguous_project(path, "no project contains it")),
    }
}

fn derive_target_path(project: &Project, directory: Option<&str>, source_path: &str) -> RelocResult<String> {
    let mut dir = paths::join(project.effective_source_root(), "lib");
    if let Some(directory) = directory {
        dir = paths::join(&dir, &paths::normalize_checked(directory)?);
    }
    paths::normalize_checked(&paths::join(&dir, paths::basename(source_path)))
}

/// True when a declared entry point of `project` re-exports `source_path`
fn exported_by_entry_point(session: &mut MoveSession<'_, '_>, project: &Project, source_path: &str) -> bool {
    project.entry_points.iter().any(|entry_point| {
        session
            .rewriter
            .specifiers(&mut session.index, entry_point)
            .iter()
            .any(|o| o.kind.is_export() && paths::specifier_resolves_to(entry_point, &o.value, source_path))
    })
}

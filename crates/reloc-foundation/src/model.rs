//! Workspace model: projects, their kinds and the alias table

use crate::error::{RelocError, RelocResult};
use crate::paths;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Kind of project
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProjectKind {
    Library,
    Application,
}

/// A named unit of the workspace
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    /// Unique project name
    pub name: String,
    /// Workspace-relative root directory
    pub root: String,
    /// Workspace-relative source directory, when it differs from the root
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_root: Option<String>,
    pub kind: ProjectKind,
    /// Files through which the project re-exports its public surface
    #[serde(default)]
    pub entry_points: Vec<String>,
}

impl Project {
    pub fn new(name: impl Into<String>, root: impl Into<String>, kind: ProjectKind) -> Self {
        Self {
            name: name.into(),
            root: root.into(),
            source_root: None,
            kind,
            entry_points: Vec::new(),
        }
    }

    /// Shorthand for a library project
    pub fn library(name: impl Into<String>, root: impl Into<String>) -> Self {
        Self::new(name, root, ProjectKind::Library)
    }

    /// Shorthand for an application project
    pub fn application(name: impl Into<String>, root: impl Into<String>) -> Self {
        Self::new(name, root, ProjectKind::Application)
    }

    pub fn with_source_root(mut self, source_root: impl Into<String>) -> Self {
        self.source_root = Some(source_root.into());
        self
    }

    pub fn with_entry_point(mut self, entry_point: impl Into<String>) -> Self {
        self.entry_points.push(entry_point.into());
        self
    }

    /// Source root if declared, otherwise the project root
    pub fn effective_source_root(&self) -> &str {
        self.source_root.as_deref().unwrap_or(&self.root)
    }

    pub fn is_library(&self) -> bool {
        self.kind == ProjectKind::Library
    }

    /// First declared entry point, the one new exports are added to
    pub fn primary_entry_point(&self) -> Option<&str> {
        self.entry_points.first().map(String::as_str)
    }

    /// True when `path` lies under the project root
    pub fn contains(&self, path: &str) -> bool {
        paths::is_within(path, &self.root)
    }
}

/// Serialized form of a workspace, used by `Workspace::from_json`
#[derive(Debug, Deserialize)]
struct WorkspaceDocument {
    #[serde(default)]
    projects: Vec<Project>,
    #[serde(default)]
    aliases: BTreeMap<String, String>,
}

/// The project registry plus the alias table
///
/// Immutable for the duration of one move.
#[derive(Debug, Clone, Default)]
pub struct Workspace {
    projects: BTreeMap<String, Project>,
    aliases: BTreeMap<String, String>,
}

impl Workspace {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a project, replacing any project with the same name
    pub fn add_project(&mut self, project: Project) -> &mut Self {
        self.projects.insert(project.name.clone(), project);
        self
    }

    /// Publish an external alias for a project (e.g. `@org/lib-a`)
    pub fn set_alias(&mut self, project: impl Into<String>, alias: impl Into<String>) -> &mut Self {
        self.aliases.insert(project.into(), alias.into());
        self
    }

    pub fn project(&self, name: &str) -> Option<&Project> {
        self.projects.get(name)
    }

    /// Projects in name order
    pub fn projects(&self) -> impl Iterator<Item = &Project> {
        self.projects.values()
    }

    pub fn project_count(&self) -> usize {
        self.projects.len()
    }

    /// Alias published by a project, if any
    pub fn alias_for(&self, project: &str) -> Option<&str> {
        self.aliases.get(project).map(String::as_str)
    }

    /// Project publishing an alias
    pub fn project_for_alias(&self, alias: &str) -> Option<&Project> {
        self.aliases
            .iter()
            .find(|(_, a)| a.as_str() == alias)
            .and_then(|(name, _)| self.projects.get(name))
    }

    /// Parse a workspace description:
    /// `{ "projects": [Project, ...], "aliases": { "name": "@org/name" } }`
    pub fn from_json(content: &str) -> RelocResult<Self> {
        let document: WorkspaceDocument = serde_json::from_str(content)
            .map_err(|e| RelocError::config(format!("Invalid workspace description: {e}")))?;

        let mut workspace = Self::new();
        for project in document.projects {
            workspace.add_project(project);
        }
        for (project, alias) in document.aliases {
            if !workspace.projects.contains_key(&project) {
                return Err(RelocError::config(format!(
                    "Alias '{alias}' refers to unknown project '{project}'"
                )));
            }
            workspace.set_alias(project, alias);
        }
        Ok(workspace)
    }
}

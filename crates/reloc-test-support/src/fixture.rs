//! In-memory multi-project workspace builder

use reloc_foundation::{paths, InMemoryTree, Project, Workspace};

/// Builds a [`Workspace`] and a seeded [`InMemoryTree`] side by side
///
/// Libraries follow the usual monorepo layout: sources under `<root>/src`,
/// public surface re-exported from `<root>/src/index.ts`.
#[derive(Debug, Default)]
pub struct WorkspaceFixture {
    workspace: Workspace,
    tree: InMemoryTree,
}

impl WorkspaceFixture {
    pub fn new() -> Self {
        Self::default()
    }

    /// Library with `src/` source root and `src/index.ts` entry point
    pub fn library(mut self, name: &str, root: &str, alias: Option<&str>) -> Self {
        let source_root = paths::join(root, "src");
        let entry_point = paths::join(&source_root, "index.ts");
        self.workspace.add_project(
            Project::library(name, root)
                .with_source_root(source_root)
                .with_entry_point(entry_point),
        );
        if let Some(alias) = alias {
            self.workspace.set_alias(name, alias);
        }
        self
    }

    /// Application with `src/` source root and no entry point
    pub fn application(mut self, name: &str, root: &str) -> Self {
        self.workspace
            .add_project(Project::application(name, root).with_source_root(paths::join(root, "src")));
        self
    }

    pub fn project(mut self, project: Project) -> Self {
        self.workspace.add_project(project);
        self
    }

    pub fn file(mut self, path: &str, content: &str) -> Self {
        self.tree.insert_base(path, content);
        self
    }

    pub fn workspace(&self) -> &Workspace {
        &self.workspace
    }

    pub fn build(self) -> (Workspace, InMemoryTree) {
        (self.workspace, self.tree)
    }
}

/// Three-project workspace used by most move tests
///
/// - `lib-a` (`@org/lib-a`): exports `exported.ts`; `helper.ts` is internal
///   and imported by its sibling `consumer.ts`
/// - `lib-b` (`@org/lib-b`): imports `@org/lib-a` from `lib/uses-a.ts`
/// - `app`: imports `@org/lib-a` from `main.ts`
pub fn org_workspace() -> WorkspaceFixture {
    WorkspaceFixture::new()
        .library("lib-a", "libs/lib-a", Some("@org/lib-a"))
        .library("lib-b", "libs/lib-b", Some("@org/lib-b"))
        .application("app", "apps/app")
        .file(
            "libs/lib-a/src/index.ts",
            "export * from './lib/exported';\nexport * from './lib/consumer';\n",
        )
        .file(
            "libs/lib-a/src/lib/exported.ts",
            "import { helper } from './helper';\n\nexport const exported = () => helper();\n",
        )
        .file(
            "libs/lib-a/src/lib/helper.ts",
            "export function helper(): string {\n  return 'help';\n}\n",
        )
        .file(
            "libs/lib-a/src/lib/consumer.ts",
            "import { helper } from './helper';\n\nexport const consume = () => helper().length;\n",
        )
        .file("libs/lib-b/src/index.ts", "export * from './lib/uses-a';\n")
        .file(
            "libs/lib-b/src/lib/uses-a.ts",
            "import { exported } from '@org/lib-a';\n\nexport const usesA = exported;\n",
        )
        .file(
            "apps/app/src/main.ts",
            "import { exported } from '@org/lib-a';\n\nconsole.log(exported());\n",
        )
}

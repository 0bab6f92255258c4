//! Test support utilities and fixtures for reloc integration tests

pub mod assertions;
pub mod fixture;
pub mod workspace;

pub use fixture::{org_workspace, WorkspaceFixture};
pub use workspace::TestWorkspace;

use reloc_lang_typescript::TypeScriptSpecifierParser;
use reloc_plugin_api::SpecifierParser;
use std::sync::Arc;

/// Shared TypeScript parser handle, the one every move test runs with
pub fn typescript_parser() -> Arc<dyn SpecifierParser> {
    Arc::new(TypeScriptSpecifierParser::new())
}

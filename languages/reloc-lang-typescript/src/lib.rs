//! TypeScript/JavaScript support for reloc
//!
//! - [`TypeScriptSpecifierParser`]: SWC-backed [`SpecifierParser`] for
//!   `.ts .tsx .mts .cts .js .jsx .mjs .cjs` files
//! - [`tsconfig`]: alias table loading from `tsconfig.base.json` path mappings
//!
//! [`SpecifierParser`]: reloc_plugin_api::SpecifierParser

mod parser;
pub mod tsconfig;

pub use parser::TypeScriptSpecifierParser;

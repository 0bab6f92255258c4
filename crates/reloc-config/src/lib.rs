//! Configuration for reloc
//!
//! Values are layered with figment: built-in defaults, then `reloc.toml`, then
//! `RELOC_*` environment variables (nested keys split on `__`, e.g.
//! `RELOC_SCAN__PARALLEL_THRESHOLD=200`).

pub mod logging;

use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use reloc_foundation::{RelocError, RelocResult};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default configuration file name, looked up in the working directory
pub const CONFIG_FILE_NAME: &str = "reloc.toml";

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Json,
    #[default]
    Pretty,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// trace, debug, info, warn or error
    pub level: String,
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
        }
    }
}

/// How project trees are enumerated and scanned
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Extensions (without the dot) of files treated as source files
    pub source_extensions: Vec<String>,
    /// Directory names never descended into; hidden directories are always skipped
    pub ignored_directories: Vec<String>,
    /// Candidate count above which reference checks fan out to workers
    pub parallel_threshold: usize,
    /// Upper bound on scan workers
    pub max_workers: usize,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            source_extensions: reloc_foundation::paths::SOURCE_EXTENSIONS
                .iter()
                .map(|ext| ext.to_string())
                .collect(),
            ignored_directories: ["node_modules", "dist", "build", "coverage", "tmp", "out"]
                .iter()
                .map(|dir| dir.to_string())
                .collect(),
            parallel_threshold: 100,
            max_workers: std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(4)
                .min(8),
        }
    }
}

/// Defaults applied to every move unless the caller overrides them
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MoveDefaults {
    /// Never add the moved file to the target entry point
    pub skip_export: bool,
    /// Run the caller-supplied formatter over touched files
    pub format: bool,
}

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RelocConfig {
    pub logging: LoggingConfig,
    pub scan: ScanConfig,
    #[serde(rename = "move")]
    pub moves: MoveDefaults,
}

impl RelocConfig {
    /// Load `reloc.toml` from the working directory plus environment overrides
    pub fn load() -> RelocResult<Self> {
        Self::load_from(Path::new(CONFIG_FILE_NAME))
    }

    /// Load a specific configuration file plus environment overrides
    ///
    /// A missing file is not an error; the defaults apply.
    pub fn load_from(path: &Path) -> RelocResult<Self> {
        let config: Self = Self::figment(path)
            .extract()
            .map_err(|e| RelocError::config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    fn figment(path: &Path) -> Figment {
        Figment::from(Serialized::defaults(Self::default()))
            .merge(Toml::file(path))
            .merge(Env::prefixed("RELOC_").split("__"))
    }

    pub fn validate(&self) -> RelocResult<()> {
        if self.scan.source_extensions.is_empty() {
            return Err(RelocError::config("scan.source_extensions must not be empty"));
        }
        if let Some(ext) = self.scan.source_extensions.iter().find(|e| e.starts_with('.')) {
            return Err(RelocError::config(format!(
                "scan.source_extensions entries are written without a dot, got '{ext}'"
            )));
        }
        if self.scan.max_workers == 0 {
            return Err(RelocError::config("scan.max_workers must be at least 1"));
        }
        Ok(())
    }
}

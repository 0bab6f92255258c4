//! Error handling for reloc

use thiserror::Error;

/// Error type surfaced by a move operation
///
/// Validation failures (`NotFound`, `AlreadyExists`, `AmbiguousProject`,
/// `InvalidPath`, `InvalidRequest`) are raised before the staging tree is
/// touched. Everything else is either a configuration problem or a failure of
/// an external collaborator.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum RelocError {
    #[error("Resource not found: {resource}")]
    NotFound { resource: String },

    #[error("Path already exists: {path}")]
    AlreadyExists { path: String },

    #[error("Cannot determine owning project for {path}: {reason}")]
    AmbiguousProject { path: String, reason: String },

    #[error("Invalid path: {path}")]
    InvalidPath { path: String },

    #[error("Invalid request: {message}")]
    InvalidRequest { message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("I/O error at {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Dependency graph error: {message}")]
    Graph { message: String },
}

impl RelocError {
    /// Create a new not found error
    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::NotFound {
            resource: resource.into(),
        }
    }

    /// Create a new already exists error
    pub fn already_exists(path: impl Into<String>) -> Self {
        Self::AlreadyExists { path: path.into() }
    }

    /// Create a new ambiguous project error
    pub fn ambiguous_project(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::AmbiguousProject {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create a new invalid path error
    pub fn invalid_path(path: impl Into<String>) -> Self {
        Self::InvalidPath { path: path.into() }
    }

    /// Create a new invalid request error
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest {
            message: message.into(),
        }
    }

    /// Create a new configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Wrap an I/O error with the path it happened on
    pub fn io(path: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Create a new dependency graph error
    pub fn graph(message: impl Into<String>) -> Self {
        Self::Graph {
            message: message.into(),
        }
    }

    /// True for errors raised while validating a request, before any write.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::NotFound { .. }
                | Self::AlreadyExists { .. }
                | Self::AmbiguousProject { .. }
                | Self::InvalidPath { .. }
                | Self::InvalidRequest { .. }
        )
    }
}

/// Result type alias for convenience
pub type RelocResult<T> = Result<T, RelocError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_helpers() {
        match RelocError::not_found("libs/a/src/x.ts") {
            RelocError::NotFound { resource } => assert_eq!(resource, "libs/a/src/x.ts"),
            other => panic!("Expected not found error, got {other:?}"),
        }

        match RelocError::ambiguous_project("apps/x.ts", "no project contains this path") {
            RelocError::AmbiguousProject { path, reason } => {
                assert_eq!(path, "apps/x.ts");
                assert_eq!(reason, "no project contains this path");
            }
            other => panic!("Expected ambiguous project error, got {other:?}"),
        }
    }

    #[test]
    fn test_validation_classification() {
        assert!(RelocError::not_found("a").is_validation());
        assert!(RelocError::already_exists("a").is_validation());
        assert!(RelocError::invalid_path("../a").is_validation());
        assert!(!RelocError::graph("cycle").is_validation());
        assert!(!RelocError::config("bad").is_validation());
    }

    #[test]
    fn test_io_error_keeps_source() {
        use std::error::Error as _;

        let err = RelocError::io(
            "libs/a/index.ts",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        assert!(err.to_string().contains("libs/a/index.ts"));
        assert!(err.source().is_some());
    }
}

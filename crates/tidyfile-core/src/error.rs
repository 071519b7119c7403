//! Error types and per-file failure records.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that abort an operation (or a single archive plan).
#[derive(Debug, Error)]
pub enum TidyError {
    /// Permission denied for a path.
    #[error("Permission denied: {path}")]
    PermissionDenied { path: PathBuf },

    /// Path not found.
    #[error("Path not found: {path}")]
    NotFound { path: PathBuf },

    /// Generic I/O error.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// An archive bundle could not be created, finalized or verified.
    #[error("Archive write failed for {path}: {message}")]
    ArchiveWrite { path: PathBuf, message: String },

    /// Invalid configuration (unknown strategy, negative age, ...).
    #[error("Invalid configuration: {message}")]
    Configuration { message: String },

    /// Root path is not a directory.
    #[error("Root path is not a directory: {path}")]
    NotADirectory { path: PathBuf },
}

impl TidyError {
    /// Create an I/O error with path context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        match source.kind() {
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied { path },
            std::io::ErrorKind::NotFound => Self::NotFound { path },
            _ => Self::Io { path, source },
        }
    }

    /// Create an archive write error.
    pub fn archive(path: impl Into<PathBuf>, message: impl ToString) -> Self {
        Self::ArchiveWrite {
            path: path.into(),
            message: message.to_string(),
        }
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Whether this error belongs to the I/O family.
    pub fn is_io(&self) -> bool {
        matches!(
            self,
            Self::PermissionDenied { .. } | Self::NotFound { .. } | Self::Io { .. }
        )
    }
}

/// Result alias for tidyfile operations.
pub type Result<T, E = TidyError> = std::result::Result<T, E>;

/// Stage at which a per-file failure happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Reading file content failed (fingerprinting).
    Read,
    /// Reading metadata failed during enumeration.
    Metadata,
    /// Writing the entry into an archive bundle failed.
    ArchiveEntry,
    /// Deleting the file failed.
    Delete,
    /// Moving the file failed.
    Move,
    /// Renaming the file failed.
    Rename,
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Read => write!(f, "read"),
            Self::Metadata => write!(f, "metadata"),
            Self::ArchiveEntry => write!(f, "archive entry"),
            Self::Delete => write!(f, "delete"),
            Self::Move => write!(f, "move"),
            Self::Rename => write!(f, "rename"),
        }
    }
}

/// Non-fatal failure for a single file, reported alongside successes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileFailure {
    /// Path the failure relates to.
    pub path: PathBuf,
    /// Human-readable message.
    pub message: String,
    /// Stage that failed.
    pub kind: FailureKind,
}

impl FileFailure {
    /// Create a new failure record.
    pub fn new(path: impl Into<PathBuf>, message: impl Into<String>, kind: FailureKind) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
            kind,
        }
    }

    /// Create a failure record from an I/O error.
    pub fn from_io(path: impl Into<PathBuf>, error: &std::io::Error, kind: FailureKind) -> Self {
        Self::new(path, error.to_string(), kind)
    }
}

impl std::fmt::Display for FileFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({} failed): {}", self.path.display(), self.kind, self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_refinement() {
        let err = TidyError::io(
            "/test/path",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        assert!(matches!(err, TidyError::PermissionDenied { .. }));
        assert!(err.is_io());

        let err = TidyError::io(
            "/test/path",
            std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        );
        assert!(matches!(err, TidyError::NotFound { .. }));
    }

    #[test]
    fn test_archive_and_config_are_not_io() {
        assert!(!TidyError::archive("/a.zip", "disk full").is_io());
        assert!(!TidyError::config("bad strategy").is_io());
    }

    #[test]
    fn test_failure_display() {
        let failure = FileFailure::new("/x/y.txt", "denied", FailureKind::Delete);
        assert_eq!(failure.to_string(), "/x/y.txt (delete failed): denied");
    }
}

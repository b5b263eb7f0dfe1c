//! Error types for the deduplication pipeline with path and operation context

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors raised while scanning, matching, rewriting or deleting
#[derive(Error, Debug)]
pub enum AbsorbError {
    /// File system I/O errors with file context
    #[error("{operation} '{path}' failed")]
    FileSystem {
        path: PathBuf,
        operation: FileOperation,
        #[source]
        source: std::io::Error,
    },

    /// The archive container could not be opened or one of its entries read
    #[error("Package archive '{path}' could not be read: {reason}")]
    Archive { path: PathBuf, reason: String },

    /// Package filenames must look like `Author.Name.Version.var`
    #[error("Package filename '{filename}' is not of the form Author.Name.Version")]
    InvalidPackageName { filename: String },

    /// The scene text no longer holds the span recorded at scan time
    #[error("Reference at byte {offset} in '{scene}' no longer matches '{expected}'")]
    StaleReference {
        scene: PathBuf,
        offset: usize,
        expected: String,
    },

    /// An exclusion pattern could not be compiled
    #[error("Invalid exclude pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    /// Configuration errors
    #[error("Invalid configuration: {message}")]
    Configuration {
        message: String,
        field: Option<String>,
    },

    /// A worker task panicked or was aborted
    #[error("Worker task failed: {0}")]
    Task(String),
}

/// Types of file operations for error context
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileOperation {
    Read,
    Write,
    Delete,
    DeleteDir,
    List,
}

impl std::fmt::Display for FileOperation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FileOperation::Read => write!(f, "Reading"),
            FileOperation::Write => write!(f, "Writing"),
            FileOperation::Delete => write!(f, "Deleting"),
            FileOperation::DeleteDir => write!(f, "Deleting directory"),
            FileOperation::List => write!(f, "Listing"),
        }
    }
}

pub type Result<T> = std::result::Result<T, AbsorbError>;

impl AbsorbError {
    /// Wrap an I/O error with the path and operation that produced it
    pub fn io(path: impl AsRef<Path>, operation: FileOperation, source: std::io::Error) -> Self {
        AbsorbError::FileSystem {
            path: path.as_ref().to_path_buf(),
            operation,
            source,
        }
    }

    /// Whether the error must stop the run.
    ///
    /// Scan failures, a panicking worker included, only drop the affected
    /// unit; a failed write or delete or a bad configuration stops the run.
    pub fn is_fatal(&self) -> bool {
        match self {
            AbsorbError::FileSystem { operation, .. } => matches!(
                operation,
                FileOperation::Write | FileOperation::Delete | FileOperation::DeleteDir
            ),
            AbsorbError::Archive { .. } => false,
            AbsorbError::InvalidPackageName { .. } => false,
            AbsorbError::StaleReference { .. } => false,
            AbsorbError::InvalidPattern { .. } => true,
            AbsorbError::Configuration { .. } => true,
            AbsorbError::Task(_) => false,
        }
    }

    /// Get error category for logging
    pub fn category(&self) -> &'static str {
        match self {
            AbsorbError::FileSystem { .. } => "file_system",
            AbsorbError::Archive { .. } => "archive",
            AbsorbError::InvalidPackageName { .. } => "invalid_package_name",
            AbsorbError::StaleReference { .. } => "stale_reference",
            AbsorbError::InvalidPattern { .. } => "invalid_pattern",
            AbsorbError::Configuration { .. } => "configuration",
            AbsorbError::Task(_) => "task",
        }
    }
}

impl From<tokio::task::JoinError> for AbsorbError {
    fn from(error: tokio::task::JoinError) -> Self {
        AbsorbError::Task(error.to_string())
    }
}

//! Error types for explorer operations

use crate::keys::NameHash;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for explorer operations.
pub type Result<T> = std::result::Result<T, ExplorerError>;

/// Errors reported by an archive backend.
#[derive(Debug, Error)]
pub enum BackendError {
    /// The requested path or address is unknown to the archive.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The path exists but has no content for the requested locale.
    #[error("No content for locale {locale} at {path}")]
    LocaleMismatch {
        /// Full archive path
        path: String,
        /// Requested locale mask, as displayed
        locale: String,
    },

    /// I/O error while reading archive data.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Backend-specific failure.
    #[error("Backend error: {0}")]
    Other(String),
}

/// Errors that can occur while browsing or extracting.
#[derive(Debug, Error)]
pub enum ExplorerError {
    /// Root entry enumeration failed while building the tree.
    #[error("Failed to build storage tree: {0}")]
    Build(String),

    /// A name hash has no root variants at all (archive inconsistency).
    #[error("Root entry missing for name hash {0}")]
    MissingRootEntry(NameHash),

    /// Root variants exist but none matches the requested locale.
    #[error("No variant of {0} for the active locale")]
    NoLocaleVariant(NameHash),

    /// Backend lookup or stream failure.
    #[error(transparent)]
    Backend(#[from] BackendError),

    /// Destination-level failure that aborts a whole extraction batch.
    #[error("Extraction aborted at {}: {source}", path.display())]
    ExtractionFatal {
        /// Path being written when the failure occurred
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Invalid configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O error outside of extraction (name table loading).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A background task panicked or was aborted.
    #[error("Task failed: {0}")]
    Task(String),
}

impl From<tokio::task::JoinError> for ExplorerError {
    fn from(err: tokio::task::JoinError) -> Self {
        Self::Task(err.to_string())
    }
}

//! Typed error types for the survey store.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur in the survey store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The journal or store directory cannot be created, opened or read.
    #[error("Survey storage unavailable at {}: {source}", path.display())]
    StorageUnavailable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A stored line cannot be decoded. `torn` marks an unterminated final
    /// line left behind by an interrupted append.
    #[error("Corrupt record at line {line} of {}{}: {reason}", path.display(), if *torn { " (torn tail, run 'survey repair')" } else { "" })]
    CorruptRecord {
        path: PathBuf,
        line: usize,
        torn: bool,
        reason: String,
    },

    /// The caller's mutation failed. Nothing was written.
    #[error("Transaction aborted: {0}")]
    TransactionAborted(#[source] anyhow::Error),

    /// Writing or syncing new records failed. Any prefix of the batch may
    /// have reached disk.
    #[error("Append to {} failed, durability of new answers is unknown: {source}", path.display())]
    AppendFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// An answer targets a clone index outside the catalog.
    #[error("Unknown clone index {index} (catalog has {count} clones)")]
    UnknownClone { index: usize, count: usize },

    /// An answer cannot be stored as given.
    #[error("Invalid answer record: {0}")]
    InvalidRecord(String),

    /// The question list is unusable.
    #[error("Invalid question set: {0}")]
    InvalidQuestions(String),

    /// No survey has been created in the directory.
    #[error("No survey at {}. Run 'survey init' first.", path.display())]
    NotInitialized { path: PathBuf },

    /// A survey already exists in the directory.
    #[error("A survey already exists at {}", path.display())]
    AlreadyInitialized { path: PathBuf },
}

impl StoreError {
    pub(crate) fn storage(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::StorageUnavailable {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn append(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::AppendFailed {
            path: path.into(),
            source,
        }
    }

    /// Whether this error leaves the journal's on-disk state uncertain.
    #[must_use]
    pub const fn durability_unknown(&self) -> bool {
        matches!(self, Self::AppendFailed { .. })
    }
}

//! Error types for archive operations

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur while reading or writing a package archive
#[derive(Debug, Error)]
pub enum ArchiveError {
    /// IO error (file not found, permission denied, etc.)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// ZIP archive error
    #[error("ZIP error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// The archive could not be opened
    #[error("Error opening archive '{}': {reason}", path.display())]
    Open { path: PathBuf, reason: String },

    /// An operation needed an open archive
    #[error("Archive is not open")]
    NotOpen,

    /// `open` was called on an archive that is already open
    #[error("Archive already open: {}", .0.display())]
    AlreadyOpen(PathBuf),

    /// Requested entry does not exist
    #[error("Entry not found: {0}")]
    EntryNotFound(String),

    /// Entry content is not valid UTF-8
    #[error("Entry is not valid UTF-8 text: {0}")]
    InvalidText(String),
}

impl ArchiveError {
    /// Create an open error
    pub fn open(path: &Path, reason: impl ToString) -> Self {
        Self::Open {
            path: path.to_path_buf(),
            reason: reason.to_string(),
        }
    }

    /// Create an entry-not-found error
    pub fn entry_not_found(name: impl Into<String>) -> Self {
        Self::EntryNotFound(name.into())
    }
}

/// Result type for archive operations
pub type ArchiveResult<T> = std::result::Result<T, ArchiveError>;

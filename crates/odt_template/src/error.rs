//! Error types for template operations

use odt_archive::ArchiveError;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur while opening, merging or saving a template
#[derive(Debug, Error)]
pub enum OdfError {
    /// Template file does not exist
    #[error("Document not found: {}", .0.display())]
    DocumentNotFound(PathBuf),

    /// Template could not be opened as an archive
    #[error("Error while opening '{}': {reason}", path.display())]
    ArchiveOpen { path: PathBuf, reason: String },

    /// A required payload is absent from the archive
    #[error("Missing archive entry: {0}")]
    MissingArchiveEntry(String),

    /// Bound tag does not occur in any tracked payload
    #[error("var {0} not found in the document")]
    TokenNotDeclared(String),

    /// No BEGIN/END region with this name exists
    #[error("'{0}' segment not found in the document")]
    SegmentNotFound(String),

    /// Segment was merged before being declared
    #[error("{0} cannot be parsed, has it been set yet?")]
    SegmentNotDeclared(String),

    /// Bound tag does not occur in the segment fragment
    #[error("var {key} not found in {segment}")]
    SegmentVariableNotFound { segment: String, key: String },

    /// Child lookup by name failed
    #[error("child {child} does not exist in {segment}")]
    ChildSegmentNotFound { segment: String, child: String },

    /// Segment nesting exceeds the recursion guard
    #[error("Segment '{name}' is nested deeper than {limit} levels")]
    NestingTooDeep { name: String, limit: usize },

    /// Image is unreadable or of an unknown format
    #[error("Invalid image '{}': {reason}", path.display())]
    InvalidImage { path: PathBuf, reason: String },

    /// Writing the result failed
    #[error("Error during file export: {0}")]
    Serialization(String),

    /// No `meta:user-defined` element with this name
    #[error("Custom property '{0}' not found in meta.xml")]
    CustomPropertyNotFound(String),

    /// Configuration is unusable
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Charset label unknown to the decoder
    #[error("Unknown charset: {0}")]
    UnknownCharset(String),

    /// Substitution automaton could not be built
    #[error("Pattern error: {0}")]
    Pattern(#[from] aho_corasick::BuildError),

    /// IO error (file not found, permission denied, etc.)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Archive layer error
    #[error("Archive error: {0}")]
    Archive(#[from] ArchiveError),

    /// XML parsing error
    #[error("XML parsing error: {0}")]
    Xml(#[from] quick_xml::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl OdfError {
    /// Create an archive open error
    pub fn archive_open(path: &Path, reason: impl ToString) -> Self {
        Self::ArchiveOpen {
            path: path.to_path_buf(),
            reason: reason.to_string(),
        }
    }

    /// Create an invalid image error
    pub fn invalid_image(path: &Path, reason: impl Into<String>) -> Self {
        Self::InvalidImage {
            path: path.to_path_buf(),
            reason: reason.into(),
        }
    }

    /// Create a serialization error
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization(message.into())
    }

    /// Create an invalid configuration error
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig(message.into())
    }
}

/// Result type for template operations
pub type Result<T> = std::result::Result<T, OdfError>;

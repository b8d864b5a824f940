//! ODT Package Archives
//!
//! This crate provides the archive layer used by the template engine.
//! An OpenDocument file is a ZIP archive containing:
//! - `mimetype` - Package media type (stored, uncompressed, first entry)
//! - `content.xml` - Document content
//! - `styles.xml` - Style definitions
//! - `meta.xml` - Metadata (title, author, custom properties)
//! - `Pictures/` - Embedded images
//! - `META-INF/manifest.xml` - Package manifest
//!
//! The engine only needs five things from an archive: open it, read an
//! entry as text, put an entry from text, put an entry from a file on
//! disk, and close it. [`Archive`] captures that contract and
//! [`ZipFileArchive`] implements it over a package on disk.
//!
//! # Example
//!
//! ```ignore
//! use odt_archive::{parts, Archive, ZipFileArchive};
//! use std::path::Path;
//!
//! let mut archive = ZipFileArchive::new();
//! archive.open(Path::new("letter.odt"))?;
//! let content = archive.entry_text(parts::CONTENT)?;
//! archive.put_entry_text(parts::CONTENT, &content.replace("{name}", "Alice"))?;
//! archive.close()?;
//! ```

mod archive;
mod error;
mod zip_archive;

pub use archive::Archive;
pub use error::{ArchiveError, ArchiveResult};
pub use zip_archive::ZipFileArchive;

/// Well-known entry names inside an OpenDocument package
pub mod parts {
    /// Package media type entry
    pub const MIMETYPE: &str = "mimetype";
    /// Document body
    pub const CONTENT: &str = "content.xml";
    /// Styles, headers and footers
    pub const STYLES: &str = "styles.xml";
    /// Document metadata
    pub const META: &str = "meta.xml";
    /// Package manifest
    pub const MANIFEST: &str = "META-INF/manifest.xml";
    /// Directory holding embedded pictures
    pub const PICTURES_DIR: &str = "Pictures/";

    /// Entry name of an embedded picture
    pub fn picture(file_name: &str) -> String {
        format!("{}{}", PICTURES_DIR, file_name)
    }
}

/// Media type of OpenDocument text packages
pub const ODT_MIME_TYPE: &str = "application/vnd.oasis.opendocument.text";

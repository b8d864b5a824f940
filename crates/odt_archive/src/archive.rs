//! Archive abstraction used by the template engine.
//!
//! This module defines the `Archive` trait: the open / read entry / write
//! entry / close contract the engine relies on. Compression format,
//! backing store and staging strategy belong to the implementation.

use crate::error::{ArchiveError, ArchiveResult};
use std::path::Path;

/// A package archive that can be opened, edited entry by entry and closed.
///
/// Writes are only guaranteed to reach the backing store on [`close`].
/// Implementations must tolerate being opened and closed many times over
/// the lifetime of one value.
///
/// [`close`]: Archive::close
pub trait Archive {
    /// Open the archive stored at `path`
    fn open(&mut self, path: &Path) -> ArchiveResult<()>;

    /// Whether the archive is currently open
    fn is_open(&self) -> bool;

    /// Whether an entry with this exact name exists
    fn contains(&self, name: &str) -> ArchiveResult<bool>;

    /// Names of all entries, in archive order
    fn entry_names(&self) -> ArchiveResult<Vec<String>>;

    /// Raw bytes of an entry
    fn entry_bytes(&self, name: &str) -> ArchiveResult<Vec<u8>>;

    /// Add or replace an entry from raw bytes
    fn put_entry_bytes(&mut self, name: &str, data: Vec<u8>) -> ArchiveResult<()>;

    /// Flush pending changes and release the archive
    fn close(&mut self) -> ArchiveResult<()>;

    /// Content of an entry decoded as UTF-8 text
    fn entry_text(&self, name: &str) -> ArchiveResult<String> {
        let data = self.entry_bytes(name)?;
        String::from_utf8(data).map_err(|_| ArchiveError::InvalidText(name.to_string()))
    }

    /// Add or replace an entry from text
    fn put_entry_text(&mut self, name: &str, text: &str) -> ArchiveResult<()> {
        self.put_entry_bytes(name, text.as_bytes().to_vec())
    }

    /// Add or replace an entry with the content of a file on disk
    fn put_entry_file(&mut self, source: &Path, name: &str) -> ArchiveResult<()> {
        let data = std::fs::read(source)?;
        self.put_entry_bytes(name, data)
    }
}
